//! Endpoint provisioning: one Datadog webhook per Rootly service.
//!
//! Creation is idempotent. A webhook that already exists counts as
//! provisioned, and other failures are reported back without stopping the
//! rewrite that depends on them.

use crate::api::{MonitoringApi, Webhook, http_join};
use crate::normalize::normalize;

/// Webhook name for a target service: `rootly-<normalized name>`.
pub fn endpoint_name(service_name: &str) -> String {
    format!("rootly-{}", normalize(service_name))
}

/// The handle that notifies the webhook from a monitor message.
pub fn endpoint_mention(service_name: &str) -> String {
    format!("@webhook-{}", endpoint_name(service_name))
}

/// Rootly's inbound Datadog webhook URL for one service.
pub fn endpoint_url(webhook_base: &str, service_id: &str) -> String {
    http_join(
        webhook_base,
        &format!("/webhooks/incoming/datadog_webhooks/notify/Service/{service_id}"),
    )
}

/// How provisioning went.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Provisioned {
    Created,
    AlreadyExists,
    /// Dry run: nothing was sent.
    Skipped,
    Failed(String),
}

impl Provisioned {
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed(e) => Some(e),
            _ => None,
        }
    }
}

/// Creates webhooks on the monitoring side.
pub struct EndpointProvisioner<'a> {
    api: &'a dyn MonitoringApi,
    webhook_base: String,
    secret: Option<String>,
    dry_run: bool,
}

impl<'a> EndpointProvisioner<'a> {
    pub fn new(
        api: &'a dyn MonitoringApi,
        webhook_base: &str,
        secret: Option<&str>,
        dry_run: bool,
    ) -> Self {
        Self {
            api,
            webhook_base: webhook_base.to_string(),
            secret: secret.map(String::from),
            dry_run,
        }
    }

    /// Make sure a webhook for the service exists.
    pub async fn ensure(&self, service_name: &str, service_id: &str) -> Provisioned {
        let webhook = Webhook {
            name: endpoint_name(service_name),
            url: endpoint_url(&self.webhook_base, service_id),
            secret: self.secret.clone(),
        };

        if self.dry_run {
            tracing::info!(
                webhook = %webhook.name,
                url = %webhook.url,
                "dry run: would create webhook"
            );
            return Provisioned::Skipped;
        }

        match self.api.create_webhook(&webhook).await {
            Ok(()) => {
                tracing::info!(webhook = %webhook.name, url = %webhook.url, "created webhook");
                Provisioned::Created
            }
            Err(e) if e.is_already_exists() => {
                tracing::debug!(webhook = %webhook.name, "webhook already exists");
                Provisioned::AlreadyExists
            }
            Err(e) => {
                tracing::warn!(webhook = %webhook.name, error = %e, "failed to create webhook");
                Provisioned::Failed(format!("failed to create webhook {}: {e}", webhook.name))
            }
        }
    }
}
