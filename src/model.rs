//! Core data model for the migration.
//!
//! These types represent what a run works with: routing and target
//! services, alert rules, the mentions inside their messages, and the
//! outcome recorded for each of them.

mod entity;
mod mention;
mod outcome;
mod rule;

pub use entity::{RoutingEntity, TargetEntity};
pub use mention::{Mention, Patch, apply_patches, extract_mentions, is_migrated};
pub use outcome::{Outcome, OutcomeStatus};
pub use rule::{AlertRule, RuleWrite, SYNTHETICS_ALERT};
