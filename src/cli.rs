//! CLI interface.
//!
//! A single non-interactive command: load configuration, reconcile every
//! monitor, and write a CSV report of what happened.

use std::path::PathBuf;

use clap::Parser;
use jiff::Timestamp;

use crate::api::{DatadogClient, PagerDutyClient, RootlyClient, http_client};
use crate::config::{Config, ConfigError, Settings};
use crate::model::OutcomeStatus;
use crate::reconcile::{self, RunOptions, Services};

/// Add Rootly webhook mentions to Datadog monitors that page PagerDuty.
#[derive(Debug, Parser)]
#[command(name = "rootly-migrate", version, after_long_help = WORKFLOW_HELP)]
pub struct Cli {
    /// TOML config file. Defaults to `~/.rootly-migrate/config.toml` when present.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(flatten)]
    settings: Settings,
}

const WORKFLOW_HELP: &str = r#"Workflow:
  1. rootly-migrate --dry-run
     → writes migration-<timestamp>.csv with the planned edits
  2. review the report (status column: planned / failed / ...)
  3. rootly-migrate
     → creates one webhook per Rootly service and appends
       @webhook-rootly-<service> after each @pagerduty-<service>

Monitors that already mention @webhook-rootly- are left alone,
so re-running is safe."#;

impl Cli {
    /// Resolve the run configuration from flags, env, and the config file.
    pub fn config(&self) -> Result<Config, ConfigError> {
        Config::load(self.settings.clone(), self.config.as_deref())
    }
}

/// Run the migration, returning an error message on failure.
pub async fn run(config: &Config) -> Result<(), String> {
    let http =
        http_client(config.timeout).map_err(|e| format!("failed to build HTTP client: {e}"))?;
    let credentials = &config.credentials;

    let datadog = DatadogClient::new(
        http.clone(),
        &config.datadog_url,
        &credentials.datadog_api_key,
        &credentials.datadog_app_key,
    );
    let pagerduty = PagerDutyClient::new(
        http.clone(),
        &config.pagerduty_url,
        &credentials.pagerduty_token,
    );
    let rootly = RootlyClient::new(http, &config.rootly_url, &credentials.rootly_token);

    let services = Services {
        monitoring: &datadog,
        routing: &pagerduty,
        targets: &rootly,
    };
    let options = RunOptions {
        dry_run: config.dry_run,
        concurrency: config.concurrency,
        page_size: config.page_size,
        webhook_base: config.rootly_webhook_url.clone(),
        webhook_secret: config.webhook_secret.clone(),
        only_rules: config.rules.clone(),
    };

    if config.dry_run {
        tracing::info!("dry run: no webhooks or monitors will be changed");
    }

    let recorder = reconcile::run(&services, &options).await;

    let path = recorder
        .write_file(&config.out_dir, Timestamp::now())
        .map_err(|e| format!("failed to write report: {e}"))?;

    let summary = recorder.summary();
    let succeeded = recorder.outcomes().iter().filter(|o| o.is_success()).count();
    tracing::info!(%summary, succeeded, report = %path.display(), "run complete");
    eprintln!("{summary}");
    eprintln!("Report written to {}", path.display());

    if summary.count(OutcomeStatus::Failed) > 0 {
        eprintln!("Some mentions failed; see the error column in the report.");
    }

    Ok(())
}
