//! Service entities from the routing and target services.

use serde::Deserialize;

/// A PagerDuty service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RoutingEntity {
    pub id: String,
    pub name: String,
}

/// A Rootly service, optionally linked to a PagerDuty service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetEntity {
    pub id: String,
    pub name: String,
    /// The PagerDuty service id this service mirrors, if any.
    pub linked_routing_id: Option<String>,
}
