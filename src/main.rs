mod api;
mod cli;
mod config;
mod directory;
mod model;
mod normalize;
mod pages;
mod provision;
mod reconcile;
mod report;
mod rewrite;
mod rules;
#[cfg(test)]
mod testing;

use std::process;

use clap::Parser;
use tracing_subscriber::{EnvFilter, filter::LevelFilter};

use cli::Cli;

fn main() {
    let cli = Cli::parse();

    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let config = match cli.config() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Failed to start runtime: {e}");
            process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(cli::run(&config)) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
