//! PagerDuty client: service listing.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use super::http::{join, send_json};
use super::{Page, Result, RoutingApi, decode_entries};
use crate::model::RoutingEntity;

/// PagerDuty REST API client authenticated with an API token.
#[derive(Clone)]
pub struct PagerDutyClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl PagerDutyClient {
    pub fn new(http: reqwest::Client, base_url: &str, token: &str) -> Self {
        Self {
            http,
            base_url: base_url.to_string(),
            token: token.to_string(),
        }
    }
}

#[async_trait]
impl RoutingApi for PagerDutyClient {
    async fn list_services(&self, offset: u32, limit: u32) -> Result<Page<RoutingEntity>> {
        let page: PdServicePage = send_json(
            self.http
                .get(join(&self.base_url, "/services"))
                .header("Authorization", format!("Token token={}", self.token))
                .header("Accept", "application/vnd.pagerduty+json;version=2")
                .query(&[("offset", offset), ("limit", limit)]),
        )
        .await?;

        Ok(decode_entries(
            "pagerduty services",
            page.services,
            serde_json::from_value,
        ))
    }
}

/// JSON shape of `GET /services`. Entries are decoded one by one.
#[derive(Deserialize)]
struct PdServicePage {
    #[serde(default)]
    services: Vec<Value>,
}
