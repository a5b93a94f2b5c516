//! Service directories: every routing and target service, fetched once per run.
//!
//! Lookups are linear scans. Directories are small and each lookup happens
//! once per mention.

use crate::api::{RoutingApi, TargetApi};
use crate::model::{RoutingEntity, TargetEntity};
use crate::normalize::normalize;
use crate::pages::collect_pages;

/// All PagerDuty services, matched by normalized name.
#[derive(Debug, Clone, Default)]
pub struct RoutingDirectory {
    services: Vec<RoutingEntity>,
}

impl RoutingDirectory {
    /// Fetch every page of routing services. May be incomplete if a page failed.
    pub async fn load(api: &dyn RoutingApi, page_size: u32) -> Self {
        let services = collect_pages("pagerduty services", |page| {
            api.list_services(page.saturating_mul(page_size), page_size)
        })
        .await;
        Self::new(services)
    }

    pub fn new(services: Vec<RoutingEntity>) -> Self {
        Self { services }
    }

    /// The first service whose normalized name equals the normalized `name`.
    pub fn lookup_by_name(&self, name: &str) -> Option<&RoutingEntity> {
        let key = normalize(name);
        self.services.iter().find(|s| normalize(&s.name) == key)
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }
}

/// All Rootly services, matched by their linked PagerDuty id.
#[derive(Debug, Clone, Default)]
pub struct TargetDirectory {
    services: Vec<TargetEntity>,
}

impl TargetDirectory {
    /// Fetch every page of target services. May be incomplete if a page failed.
    pub async fn load(api: &dyn TargetApi, page_size: u32) -> Self {
        let services = collect_pages("rootly services", |page| {
            api.list_services(page + 1, page_size)
        })
        .await;
        Self::new(services)
    }

    pub fn new(services: Vec<TargetEntity>) -> Self {
        Self { services }
    }

    /// The first service linked to `routing_id`.
    ///
    /// With duplicates, whichever the service listed first wins.
    pub fn lookup_by_linked_id(&self, routing_id: &str) -> Option<&TargetEntity> {
        self.services
            .iter()
            .find(|s| s.linked_routing_id.as_deref() == Some(routing_id))
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }
}
