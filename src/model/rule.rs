//! Alert rules (Datadog monitors).

use serde_json::Value;

/// Monitor type whose message lives on a synthetics test rather than the monitor.
pub const SYNTHETICS_ALERT: &str = "synthetics alert";

/// A monitor as fetched from Datadog.
///
/// `raw` keeps the payload exactly as received so the report can show it.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertRule {
    pub id: String,
    pub name: String,
    pub message: String,
    pub kind: String,
    pub synthetics_check_id: Option<String>,
    pub raw: Value,
}

/// Where an updated message has to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleWrite<'a> {
    /// The monitor itself, by monitor id.
    Monitor { id: &'a str },

    /// The synthetics test backing the monitor, by check id.
    SyntheticsTest { check_id: &'a str },
}

impl AlertRule {
    /// The write path for this rule.
    ///
    /// Synthetics monitors reject message edits; their message is patched
    /// on the test instead. A synthetics monitor without a check id falls
    /// back to the monitor path.
    pub fn write_path(&self) -> RuleWrite<'_> {
        match &self.synthetics_check_id {
            Some(check_id) if self.kind == SYNTHETICS_ALERT => {
                RuleWrite::SyntheticsTest { check_id }
            }
            _ => RuleWrite::Monitor { id: &self.id },
        }
    }
}
