//! Service-name normalization.
//!
//! Monitor handles, PagerDuty names, and Rootly names spell the same service
//! differently (`[Production] On-Call`, `Production on-call`,
//! `@pagerduty-production_on-call`). Normalizing gives one comparable key.

use std::sync::LazyLock;

use regex::Regex;

static DISALLOWED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9_-]+").expect("normalization pattern is valid"));

/// Map a free-text service name to its matching key.
///
/// Lowercases, collapses each run of characters outside `[a-z0-9_-]` into a
/// single `_`, then strips leading `_` and `-`.
pub fn normalize(name: &str) -> String {
    let lowered = name.to_lowercase();
    let replaced = DISALLOWED.replace_all(&lowered, "_");
    replaced.trim_start_matches(['_', '-']).to_string()
}
