//! Run configuration.
//!
//! Settings come from three layers, highest priority first:
//!
//! 1. Command-line flags, or their environment variables
//! 2. A TOML file: `--config <path>`, else `~/.rootly-migrate/config.toml` if present
//! 3. Built-in defaults
//!
//! The four API credentials have no default. If any is missing the run stops
//! before touching the network.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Args;
use serde::Deserialize;

const DEFAULT_DATADOG_URL: &str = "https://api.datadoghq.com";
const DEFAULT_PAGERDUTY_URL: &str = "https://api.pagerduty.com";
const DEFAULT_ROOTLY_URL: &str = "https://api.rootly.com";
const DEFAULT_ROOTLY_WEBHOOK_URL: &str = "https://webhooks.rootly.com";
const DEFAULT_CONCURRENCY: usize = 4;
const DEFAULT_PAGE_SIZE: u32 = 100;
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Errors that stop a run before it starts.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required settings: {}", .0.join(", "))]
    Missing(Vec<&'static str>),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("failed to read {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("invalid config at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// One layer of settings. Every field is optional so layers can be merged.
///
/// Parsed from flags and environment variables by clap, and from the config
/// file (kebab-case keys) by serde.
#[derive(Debug, Clone, Default, Args, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct Settings {
    /// Datadog API key.
    #[arg(long, env = "DATADOG_API_KEY", hide_env_values = true)]
    pub datadog_api_key: Option<String>,

    /// Datadog application key.
    #[arg(long, env = "DATADOG_APP_KEY", hide_env_values = true)]
    pub datadog_app_key: Option<String>,

    /// PagerDuty REST API token.
    #[arg(long, env = "PAGERDUTY_API_TOKEN", hide_env_values = true)]
    pub pagerduty_token: Option<String>,

    /// Rootly API token.
    #[arg(long, env = "ROOTLY_API_TOKEN", hide_env_values = true)]
    pub rootly_token: Option<String>,

    /// Shared secret Rootly expects on inbound webhook deliveries.
    #[arg(long, env = "ROOTLY_WEBHOOK_SECRET", hide_env_values = true)]
    pub rootly_webhook_secret: Option<String>,

    /// Datadog API base URL, for sites other than US1.
    #[arg(long, env = "DATADOG_API_URL")]
    pub datadog_url: Option<String>,

    /// PagerDuty API base URL.
    #[arg(skip)]
    pub pagerduty_url: Option<String>,

    /// Rootly API base URL.
    #[arg(skip)]
    pub rootly_url: Option<String>,

    /// Base URL of Rootly's inbound webhooks.
    #[arg(skip)]
    pub rootly_webhook_url: Option<String>,

    /// Compute and report changes without writing anything.
    #[arg(
        long,
        env = "DRY_RUN",
        num_args = 0..=1,
        default_missing_value = "true",
        value_parser = clap::builder::BoolishValueParser::new()
    )]
    pub dry_run: Option<bool>,

    /// Monitors processed at once.
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Items requested per page from every listing endpoint.
    #[arg(long)]
    pub page_size: Option<u32>,

    /// Timeout for each HTTP request, in seconds.
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Directory the CSV report is written to.
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// Only process this monitor id. Repeatable.
    #[arg(long = "rule", value_name = "ID")]
    pub rules: Vec<String>,
}

impl Settings {
    /// Fill every unset field of `self` from `lower`.
    #[must_use]
    pub fn or(self, lower: Settings) -> Settings {
        Settings {
            datadog_api_key: self.datadog_api_key.or(lower.datadog_api_key),
            datadog_app_key: self.datadog_app_key.or(lower.datadog_app_key),
            pagerduty_token: self.pagerduty_token.or(lower.pagerduty_token),
            rootly_token: self.rootly_token.or(lower.rootly_token),
            rootly_webhook_secret: self.rootly_webhook_secret.or(lower.rootly_webhook_secret),
            datadog_url: self.datadog_url.or(lower.datadog_url),
            pagerduty_url: self.pagerduty_url.or(lower.pagerduty_url),
            rootly_url: self.rootly_url.or(lower.rootly_url),
            rootly_webhook_url: self.rootly_webhook_url.or(lower.rootly_webhook_url),
            dry_run: self.dry_run.or(lower.dry_run),
            concurrency: self.concurrency.or(lower.concurrency),
            page_size: self.page_size.or(lower.page_size),
            timeout_secs: self.timeout_secs.or(lower.timeout_secs),
            out_dir: self.out_dir.or(lower.out_dir),
            rules: if self.rules.is_empty() {
                lower.rules
            } else {
                self.rules
            },
        }
    }

    /// Read settings from a TOML file.
    pub fn from_file(path: &Path) -> Result<Settings, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// API credentials for the three services.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub datadog_api_key: String,
    pub datadog_app_key: String,
    pub pagerduty_token: String,
    pub rootly_token: String,
}

/// Fully resolved configuration for one run.
#[derive(Debug, Clone)]
pub struct Config {
    pub credentials: Credentials,
    pub webhook_secret: Option<String>,
    pub datadog_url: String,
    pub pagerduty_url: String,
    pub rootly_url: String,
    pub rootly_webhook_url: String,
    pub dry_run: bool,
    pub concurrency: usize,
    pub page_size: u32,
    pub timeout: Duration,
    pub out_dir: PathBuf,
    pub rules: Vec<String>,
}

impl Config {
    /// Layer `cli` over the config file and resolve.
    ///
    /// An explicit `file` must exist. The default file is only read if present.
    pub fn load(cli: Settings, file: Option<&Path>) -> Result<Self, ConfigError> {
        let from_file = match file {
            Some(path) => Settings::from_file(path)?,
            None => match Self::default_path() {
                Some(path) if path.is_file() => Settings::from_file(&path)?,
                _ => Settings::default(),
            },
        };
        Self::resolve(cli.or(from_file))
    }

    /// Apply defaults and check that every required setting is present.
    pub fn resolve(settings: Settings) -> Result<Self, ConfigError> {
        let required = [
            ("DATADOG_API_KEY", &settings.datadog_api_key),
            ("DATADOG_APP_KEY", &settings.datadog_app_key),
            ("PAGERDUTY_API_TOKEN", &settings.pagerduty_token),
            ("ROOTLY_API_TOKEN", &settings.rootly_token),
        ];
        let missing: Vec<&'static str> = required
            .iter()
            .filter(|(_, value)| value.as_deref().is_none_or(str::is_empty))
            .map(|(name, _)| *name)
            .collect();
        if !missing.is_empty() {
            return Err(ConfigError::Missing(missing));
        }

        let concurrency = settings.concurrency.unwrap_or(DEFAULT_CONCURRENCY);
        if concurrency == 0 {
            return Err(ConfigError::Zero("concurrency"));
        }
        let page_size = settings.page_size.unwrap_or(DEFAULT_PAGE_SIZE);
        if page_size == 0 {
            return Err(ConfigError::Zero("page-size"));
        }
        let timeout_secs = settings.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(ConfigError::Zero("timeout-secs"));
        }

        Ok(Self {
            credentials: Credentials {
                datadog_api_key: settings.datadog_api_key.unwrap_or_default(),
                datadog_app_key: settings.datadog_app_key.unwrap_or_default(),
                pagerduty_token: settings.pagerduty_token.unwrap_or_default(),
                rootly_token: settings.rootly_token.unwrap_or_default(),
            },
            webhook_secret: settings.rootly_webhook_secret.filter(|s| !s.is_empty()),
            datadog_url: settings
                .datadog_url
                .unwrap_or_else(|| DEFAULT_DATADOG_URL.to_string()),
            pagerduty_url: settings
                .pagerduty_url
                .unwrap_or_else(|| DEFAULT_PAGERDUTY_URL.to_string()),
            rootly_url: settings
                .rootly_url
                .unwrap_or_else(|| DEFAULT_ROOTLY_URL.to_string()),
            rootly_webhook_url: settings
                .rootly_webhook_url
                .unwrap_or_else(|| DEFAULT_ROOTLY_WEBHOOK_URL.to_string()),
            dry_run: settings.dry_run.unwrap_or(false),
            concurrency,
            page_size,
            timeout: Duration::from_secs(timeout_secs),
            out_dir: settings.out_dir.unwrap_or_else(|| PathBuf::from(".")),
            rules: settings.rules,
        })
    }

    /// The default config file path: `~/.rootly-migrate/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".rootly-migrate").join("config.toml"))
    }
}
