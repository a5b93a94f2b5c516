//! Outcomes: one record per processed mention, or per rule when a rule
//! is skipped.

use std::fmt;

use super::AlertRule;

/// What happened to a mention (or to a rule with nothing to migrate).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OutcomeStatus {
    /// The rule was rewritten to include the new mention.
    Migrated,
    /// Dry run: the rewrite was computed but not written.
    Planned,
    /// The rule already carries a target-service mention.
    AlreadyMigrated,
    /// The rule has no routing mentions.
    NoMentions,
    /// Resolution or the rewrite failed; see the error text.
    Failed,
}

impl OutcomeStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Migrated => "migrated",
            Self::Planned => "planned",
            Self::AlreadyMigrated => "already-migrated",
            Self::NoMentions => "no-mentions",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single report row. Never mutated once recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub status: OutcomeStatus,
    pub rule: AlertRule,
    pub old_mention: Option<String>,
    pub new_mention: Option<String>,
    pub old_message: String,
    pub new_message: Option<String>,
    pub error: Option<String>,
}

impl Outcome {
    /// A rule-level outcome with no mention attached.
    pub fn for_rule(rule: &AlertRule, status: OutcomeStatus) -> Self {
        Self {
            status,
            rule: rule.clone(),
            old_mention: None,
            new_mention: None,
            old_message: rule.message.clone(),
            new_message: None,
            error: None,
        }
    }

    /// A mention that could not be resolved.
    pub fn unresolved(rule: &AlertRule, old_mention: &str, error: String) -> Self {
        Self {
            status: OutcomeStatus::Failed,
            old_mention: Some(old_mention.to_string()),
            error: Some(error),
            ..Self::for_rule(rule, OutcomeStatus::Failed)
        }
    }

    /// Whether the mention was (or in a dry run would be) migrated.
    pub fn is_success(&self) -> bool {
        matches!(self.status, OutcomeStatus::Migrated | OutcomeStatus::Planned)
    }
}
