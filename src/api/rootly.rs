//! Rootly client: service listing (JSON:API).

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use super::http::{join, send_json};
use super::{Page, Result, TargetApi, decode_entries};
use crate::model::TargetEntity;

/// Rootly REST API client authenticated with a bearer token.
#[derive(Clone)]
pub struct RootlyClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl RootlyClient {
    pub fn new(http: reqwest::Client, base_url: &str, token: &str) -> Self {
        Self {
            http,
            base_url: base_url.to_string(),
            token: token.to_string(),
        }
    }
}

#[async_trait]
impl TargetApi for RootlyClient {
    async fn list_services(&self, page_number: u32, page_size: u32) -> Result<Page<TargetEntity>> {
        let page: RootlyPage = send_json(
            self.http
                .get(join(&self.base_url, "/v1/services"))
                .bearer_auth(&self.token)
                .header("Accept", "application/vnd.api+json")
                .query(&[("page[number]", page_number), ("page[size]", page_size)]),
        )
        .await?;

        Ok(decode_entries("rootly services", page.data, parse_service))
    }
}

/// JSON:API document for `GET /v1/services`.
#[derive(Deserialize)]
struct RootlyPage {
    #[serde(default)]
    data: Vec<Value>,
}

#[derive(Deserialize)]
struct RootlyService {
    id: String,
    attributes: RootlyServiceAttributes,
}

#[derive(Deserialize)]
struct RootlyServiceAttributes {
    name: String,
    pagerduty_id: Option<String>,
}

fn parse_service(raw: Value) -> serde_json::Result<TargetEntity> {
    let service: RootlyService = serde_json::from_value(raw)?;
    Ok(TargetEntity {
        id: service.id,
        name: service.attributes.name,
        linked_routing_id: service.attributes.pagerduty_id.filter(|s| !s.is_empty()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn parses_linked_service() {
        let service = parse_service(json!({
            "id": "R1",
            "type": "services",
            "attributes": { "name": "Checkout", "slug": "checkout", "pagerduty_id": "P1" }
        }))
        .unwrap();
        assert_eq!(
            service,
            TargetEntity {
                id: "R1".to_string(),
                name: "Checkout".to_string(),
                linked_routing_id: Some("P1".to_string()),
            }
        );
    }

    #[test]
    fn null_or_empty_link_is_unlinked() {
        let null = parse_service(json!({
            "id": "R2",
            "attributes": { "name": "Search", "pagerduty_id": null }
        }))
        .unwrap();
        let empty = parse_service(json!({
            "id": "R3",
            "attributes": { "name": "Search", "pagerduty_id": "" }
        }))
        .unwrap();
        let missing = parse_service(json!({
            "id": "R4",
            "attributes": { "name": "Search" }
        }))
        .unwrap();
        assert_eq!(null.linked_routing_id, None);
        assert_eq!(empty.linked_routing_id, None);
        assert_eq!(missing.linked_routing_id, None);
    }

    #[test]
    fn service_without_attributes_is_rejected() {
        assert!(parse_service(json!({ "id": "R5" })).is_err());
    }
}
