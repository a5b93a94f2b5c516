//! Remote services: Datadog (monitors and webhooks), PagerDuty (routing
//! services), and Rootly (target services).
//!
//! Each service sits behind a trait so the migration workflow can run
//! against in-memory fakes. The reqwest-backed clients live in submodules.

mod datadog;
mod http;
mod pagerduty;
mod rootly;

pub use datadog::DatadogClient;
pub use http::{http_client, join as http_join};
pub use pagerduty::PagerDutyClient;
pub use rootly::RootlyClient;

use async_trait::async_trait;
use serde_json::Value;

use crate::model::{AlertRule, RoutingEntity, TargetEntity};

/// Errors from a remote call.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("unexpected response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Whether the remote reported that the resource already exists.
    pub fn is_already_exists(&self) -> bool {
        match self {
            Self::Status { status, body } => {
                *status == 409 || body.to_lowercase().contains("already exists")
            }
            _ => false,
        }
    }
}

pub type Result<T> = core::result::Result<T, ApiError>;

/// One page of a listing.
///
/// `fetched` counts what the remote returned, malformed entries included, so
/// a page of nothing but bad entries is not mistaken for the end of the list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub fetched: usize,
}

impl<T> From<Vec<T>> for Page<T> {
    fn from(items: Vec<T>) -> Self {
        let fetched = items.len();
        Self { items, fetched }
    }
}

/// A webhook endpoint to create on the monitoring side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Webhook {
    pub name: String,
    pub url: String,
    /// Sent as a bearer token with every delivery when set.
    pub secret: Option<String>,
}

/// The monitoring system: monitors, synthetics tests, and webhooks.
#[async_trait]
pub trait MonitoringApi: Send + Sync {
    /// One page of monitors. `page` counts from 0.
    async fn list_rules(&self, page: u32, page_size: u32) -> Result<Page<AlertRule>>;

    async fn get_rule(&self, id: &str) -> Result<AlertRule>;

    async fn update_monitor_message(&self, id: &str, message: &str) -> Result<()>;

    async fn update_synthetics_message(&self, check_id: &str, message: &str) -> Result<()>;

    async fn create_webhook(&self, webhook: &Webhook) -> Result<()>;
}

/// The routing service.
#[async_trait]
pub trait RoutingApi: Send + Sync {
    async fn list_services(&self, offset: u32, limit: u32) -> Result<Page<RoutingEntity>>;
}

/// The target incident service.
#[async_trait]
pub trait TargetApi: Send + Sync {
    /// One page of services. `page_number` counts from 1.
    async fn list_services(&self, page_number: u32, page_size: u32) -> Result<Page<TargetEntity>>;
}

/// Decode each entry of a page on its own, dropping the malformed ones.
///
/// A bad entry is logged and skipped so it can't poison the rest of the page.
pub(crate) fn decode_entries<T>(
    collection: &str,
    entries: Vec<Value>,
    decode: impl Fn(Value) -> core::result::Result<T, serde_json::Error>,
) -> Page<T> {
    let fetched = entries.len();
    let items = entries
        .into_iter()
        .filter_map(|entry| {
            let summary = entry.get("id").map(ToString::to_string);
            match decode(entry) {
                Ok(item) => Some(item),
                Err(e) => {
                    tracing::warn!(
                        %collection,
                        id = ?summary,
                        error = %e,
                        "skipping malformed entry"
                    );
                    None
                }
            }
        })
        .collect();
    Page { items, fetched }
}
