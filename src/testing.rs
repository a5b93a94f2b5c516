//! In-memory fakes of the remote services for unit tests.
//!
//! Each fake serves fixed data and records every call that would change
//! remote state.

use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::json;

use crate::api::{ApiError, MonitoringApi, Page, Result, RoutingApi, TargetApi, Webhook};
use crate::model::{AlertRule, RoutingEntity, TargetEntity};

pub fn routing(id: &str, name: &str) -> RoutingEntity {
    RoutingEntity {
        id: id.to_string(),
        name: name.to_string(),
    }
}

pub fn target(id: &str, name: &str, linked: Option<&str>) -> TargetEntity {
    TargetEntity {
        id: id.to_string(),
        name: name.to_string(),
        linked_routing_id: linked.map(String::from),
    }
}

pub fn rule(id: &str, message: &str) -> AlertRule {
    AlertRule {
        id: id.to_string(),
        name: format!("monitor {id}"),
        message: message.to_string(),
        kind: "metric alert".to_string(),
        synthetics_check_id: None,
        raw: json!({ "id": id, "message": message, "type": "metric alert" }),
    }
}

fn page<T: Clone>(items: &[T], start: usize, size: usize) -> Page<T> {
    Page::from(items.iter().skip(start).take(size).cloned().collect::<Vec<_>>())
}

fn server_error() -> ApiError {
    ApiError::Status {
        status: 500,
        body: "internal error".to_string(),
    }
}

// ── PagerDuty ──

pub struct FakePagerDuty {
    services: Vec<RoutingEntity>,
    fail_at_offset: Option<u32>,
    offsets: Mutex<Vec<u32>>,
}

impl FakePagerDuty {
    pub fn new(services: Vec<RoutingEntity>) -> Self {
        Self {
            services,
            fail_at_offset: None,
            offsets: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_at_offset(mut self, offset: u32) -> Self {
        self.fail_at_offset = Some(offset);
        self
    }

    pub fn offsets(&self) -> Vec<u32> {
        self.offsets.lock().unwrap().clone()
    }
}

#[async_trait]
impl RoutingApi for FakePagerDuty {
    async fn list_services(&self, offset: u32, limit: u32) -> Result<Page<RoutingEntity>> {
        self.offsets.lock().unwrap().push(offset);
        if self.fail_at_offset == Some(offset) {
            return Err(server_error());
        }
        Ok(page(&self.services, offset as usize, limit as usize))
    }
}

// ── Rootly ──

pub struct FakeRootly {
    services: Vec<TargetEntity>,
    page_numbers: Mutex<Vec<u32>>,
}

impl FakeRootly {
    pub fn new(services: Vec<TargetEntity>) -> Self {
        Self {
            services,
            page_numbers: Mutex::new(Vec::new()),
        }
    }

    pub fn page_numbers(&self) -> Vec<u32> {
        self.page_numbers.lock().unwrap().clone()
    }
}

#[async_trait]
impl TargetApi for FakeRootly {
    async fn list_services(&self, page_number: u32, page_size: u32) -> Result<Page<TargetEntity>> {
        self.page_numbers.lock().unwrap().push(page_number);
        let start = (page_number.saturating_sub(1) * page_size) as usize;
        Ok(page(&self.services, start, page_size as usize))
    }
}

// ── Datadog ──

/// How the fake answers webhook creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookReply {
    Created,
    AlreadyExists,
    Fails,
}

/// A call that would change remote state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Write {
    Monitor { id: String, message: String },
    Synthetics { check_id: String, message: String },
    Webhook(Webhook),
}

pub struct FakeDatadog {
    rules: Mutex<Vec<AlertRule>>,
    fail_list_at_page: Option<u32>,
    webhook_reply: WebhookReply,
    fail_rule_writes: bool,
    panic_on_get: Option<String>,
    writes: Mutex<Vec<Write>>,
    gets: Mutex<Vec<String>>,
}

impl FakeDatadog {
    pub fn new(rules: Vec<AlertRule>) -> Self {
        Self {
            rules: Mutex::new(rules),
            fail_list_at_page: None,
            webhook_reply: WebhookReply::Created,
            fail_rule_writes: false,
            panic_on_get: None,
            writes: Mutex::new(Vec::new()),
            gets: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_list_at_page(mut self, page: u32) -> Self {
        self.fail_list_at_page = Some(page);
        self
    }

    pub fn with_webhook_reply(mut self, reply: WebhookReply) -> Self {
        self.webhook_reply = reply;
        self
    }

    pub fn failing_rule_writes(mut self) -> Self {
        self.fail_rule_writes = true;
        self
    }

    pub fn panicking_on_get(mut self, id: &str) -> Self {
        self.panic_on_get = Some(id.to_string());
        self
    }

    /// Replace a rule's message server-side, as if someone edited it mid-run.
    pub fn edit_message(&self, id: &str, message: &str) {
        self.set_message(|r| r.id == id, message);
    }

    pub fn writes(&self) -> Vec<Write> {
        self.writes.lock().unwrap().clone()
    }

    pub fn rule_writes(&self) -> Vec<Write> {
        self.writes()
            .into_iter()
            .filter(|w| !matches!(w, Write::Webhook(_)))
            .collect()
    }

    pub fn webhooks(&self) -> Vec<Webhook> {
        self.writes()
            .into_iter()
            .filter_map(|w| match w {
                Write::Webhook(h) => Some(h),
                _ => None,
            })
            .collect()
    }

    pub fn gets(&self) -> Vec<String> {
        self.gets.lock().unwrap().clone()
    }

    pub fn message_of(&self, id: &str) -> Option<String> {
        let rules = self.rules.lock().unwrap();
        rules.iter().find(|r| r.id == id).map(|r| r.message.clone())
    }

    fn set_message(&self, matches: impl Fn(&AlertRule) -> bool, message: &str) {
        let mut rules = self.rules.lock().unwrap();
        if let Some(r) = rules.iter_mut().find(|r| matches(r)) {
            r.message = message.to_string();
        }
    }
}

#[async_trait]
impl MonitoringApi for FakeDatadog {
    async fn list_rules(&self, page_index: u32, page_size: u32) -> Result<Page<AlertRule>> {
        if self.fail_list_at_page == Some(page_index) {
            return Err(server_error());
        }
        let rules = self.rules.lock().unwrap();
        Ok(page(
            &rules,
            (page_index * page_size) as usize,
            page_size as usize,
        ))
    }

    async fn get_rule(&self, id: &str) -> Result<AlertRule> {
        self.gets.lock().unwrap().push(id.to_string());
        assert!(
            self.panic_on_get.as_deref() != Some(id),
            "fake panic while fetching rule {id}"
        );
        let rules = self.rules.lock().unwrap();
        rules
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or_else(|| ApiError::Status {
                status: 404,
                body: "Monitor not found".to_string(),
            })
    }

    async fn update_monitor_message(&self, id: &str, message: &str) -> Result<()> {
        if self.fail_rule_writes {
            return Err(server_error());
        }
        self.writes.lock().unwrap().push(Write::Monitor {
            id: id.to_string(),
            message: message.to_string(),
        });
        self.set_message(|r| r.id == id, message);
        Ok(())
    }

    async fn update_synthetics_message(&self, check_id: &str, message: &str) -> Result<()> {
        if self.fail_rule_writes {
            return Err(server_error());
        }
        self.writes.lock().unwrap().push(Write::Synthetics {
            check_id: check_id.to_string(),
            message: message.to_string(),
        });
        self.set_message(
            |r| r.synthetics_check_id.as_deref() == Some(check_id),
            message,
        );
        Ok(())
    }

    async fn create_webhook(&self, webhook: &Webhook) -> Result<()> {
        match self.webhook_reply {
            WebhookReply::Created => {
                self.writes
                    .lock()
                    .unwrap()
                    .push(Write::Webhook(webhook.clone()));
                Ok(())
            }
            WebhookReply::AlreadyExists => Err(ApiError::Status {
                status: 409,
                body: format!("Webhook {} already exists", webhook.name),
            }),
            WebhookReply::Fails => Err(ApiError::Status {
                status: 403,
                body: "Forbidden".to_string(),
            }),
        }
    }
}
