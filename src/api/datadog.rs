//! Datadog client: monitors, synthetics tests, and webhook integrations.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};

use super::http::{join, send, send_json};
use super::{ApiError, MonitoringApi, Page, Result, Webhook, decode_entries};
use crate::model::AlertRule;

/// Datadog API client authenticated with an API key and an application key.
#[derive(Clone)]
pub struct DatadogClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    app_key: String,
}

impl DatadogClient {
    pub fn new(http: reqwest::Client, base_url: &str, api_key: &str, app_key: &str) -> Self {
        Self {
            http,
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
            app_key: app_key.to_string(),
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, join(&self.base_url, path))
            .header("DD-API-KEY", &self.api_key)
            .header("DD-APPLICATION-KEY", &self.app_key)
    }
}

#[async_trait]
impl MonitoringApi for DatadogClient {
    async fn list_rules(&self, page: u32, page_size: u32) -> Result<Page<AlertRule>> {
        let entries: Vec<Value> = send_json(
            self.request(reqwest::Method::GET, "/api/v1/monitor")
                .query(&[("page", page), ("page_size", page_size)]),
        )
        .await?;

        Ok(decode_entries("monitors", entries, parse_monitor))
    }

    async fn get_rule(&self, id: &str) -> Result<AlertRule> {
        let raw: Value =
            send_json(self.request(reqwest::Method::GET, &format!("/api/v1/monitor/{id}"))).await?;
        parse_monitor(raw).map_err(|e| ApiError::Decode(format!("monitor {id}: {e}")))
    }

    async fn update_monitor_message(&self, id: &str, message: &str) -> Result<()> {
        send(
            self.request(reqwest::Method::PUT, &format!("/api/v1/monitor/{id}"))
                .json(&json!({ "message": message })),
        )
        .await?;
        Ok(())
    }

    async fn update_synthetics_message(&self, check_id: &str, message: &str) -> Result<()> {
        send(
            self.request(
                reqwest::Method::PATCH,
                &format!("/api/v1/synthetics/tests/{check_id}"),
            )
            .json(&synthetics_message_patch(message)),
        )
        .await?;
        Ok(())
    }

    async fn create_webhook(&self, webhook: &Webhook) -> Result<()> {
        send(
            self.request(
                reqwest::Method::POST,
                "/api/v1/integration/webhooks/configuration/webhooks",
            )
            .json(&webhook_body(webhook)),
        )
        .await?;
        Ok(())
    }
}

// ── Payload shapes ──

/// JSON shape of a monitor in `GET /api/v1/monitor`.
#[derive(Deserialize)]
struct DdMonitor {
    id: DdId,
    name: String,
    #[serde(default)]
    message: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    options: DdOptions,
}

#[derive(Deserialize, Default)]
struct DdOptions {
    synthetics_check_id: Option<DdId>,
}

/// Monitor ids are numbers; check ids are strings. Accept either.
#[derive(Deserialize)]
#[serde(untagged)]
enum DdId {
    Number(u64),
    Text(String),
}

impl DdId {
    fn into_string(self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s,
        }
    }
}

fn parse_monitor(raw: Value) -> serde_json::Result<AlertRule> {
    let monitor = DdMonitor::deserialize(&raw)?;
    Ok(AlertRule {
        id: monitor.id.into_string(),
        name: monitor.name,
        message: monitor.message,
        kind: monitor.kind,
        synthetics_check_id: monitor
            .options
            .synthetics_check_id
            .map(DdId::into_string)
            .filter(|s| !s.is_empty()),
        raw,
    })
}

fn synthetics_message_patch(message: &str) -> Value {
    json!({
        "data": [{ "op": "replace", "path": "/message", "value": message }]
    })
}

fn webhook_body(webhook: &Webhook) -> Value {
    let mut body = json!({
        "name": webhook.name,
        "url": webhook.url,
        "encode_as": "json",
    });
    if let Some(secret) = &webhook.secret {
        // Datadog takes custom headers as a JSON-encoded string.
        body["custom_headers"] =
            Value::String(json!({ "Authorization": format!("Bearer {secret}") }).to_string());
    }
    body
}
