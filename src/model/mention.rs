//! Mentions: notification handles embedded in a monitor message.
//!
//! A routing mention looks like `@pagerduty-<fragment>`. Once a message also
//! carries a `@webhook-rootly-` handle the monitor counts as migrated.

use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Presence of this prefix means the message was already migrated.
const MIGRATED_MARKER: &str = "@webhook-rootly-";

static ROUTING_MENTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"@pagerduty-([A-Za-z0-9_-]+)").expect("routing mention pattern is valid")
});

/// A routing mention found in a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mention {
    /// The full handle as written, e.g. `@pagerduty-Checkout`.
    pub raw: String,
    /// The service-name part after `@pagerduty-`.
    pub fragment: String,
}

/// A pending edit: `new` is inserted after every occurrence of `old`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patch {
    pub old: String,
    pub new: String,
}

/// Whether a message already carries a target-service mention.
pub fn is_migrated(message: &str) -> bool {
    message.contains(MIGRATED_MARKER)
}

/// Distinct routing mentions in order of first appearance.
pub fn extract_mentions(message: &str) -> Vec<Mention> {
    let mut mentions: Vec<Mention> = Vec::new();
    for caps in ROUTING_MENTION.captures_iter(message) {
        let raw = &caps[0];
        if mentions.iter().any(|m| m.raw == raw) {
            continue;
        }
        mentions.push(Mention {
            raw: raw.to_string(),
            fragment: caps[1].to_string(),
        });
    }
    mentions
}

/// Insert each patch's new mention right after its old mention.
///
/// Matching is by whole mention token, so a patch for `@pagerduty-check`
/// leaves `@pagerduty-checkout` alone.
pub fn apply_patches(message: &str, patches: &[Patch]) -> String {
    ROUTING_MENTION
        .replace_all(message, |caps: &Captures<'_>| {
            let raw = &caps[0];
            match patches.iter().find(|p| p.old == raw) {
                Some(patch) => format!("{raw} {}", patch.new),
                None => raw.to_string(),
            }
        })
        .into_owned()
}
