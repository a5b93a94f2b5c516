//! Rule rewriting: one fetch-modify-write per monitor.
//!
//! The monitor is always re-fetched so patches land on its current message,
//! not on the copy from the initial listing. All patches for a monitor go out
//! in a single write.

use crate::api::{ApiError, MonitoringApi};
use crate::model::{Patch, RuleWrite, apply_patches, is_migrated};

/// A message before and after patching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    pub old_message: String,
    pub new_message: String,
}

/// Why a rewrite did not happen.
#[derive(Debug, thiserror::Error)]
pub enum RewriteError {
    #[error("failed to fetch monitor: {0}")]
    Fetch(#[source] ApiError),

    #[error("monitor was migrated since it was listed")]
    AlreadyMigrated { old_message: String },

    #[error("none of the mentions are present in the current message")]
    Unchanged { old_message: String },

    #[error("failed to write monitor: {source}")]
    Write {
        rewrite: Rewrite,
        #[source]
        source: ApiError,
    },
}

impl RewriteError {
    /// The message as fetched, when the fetch succeeded.
    pub fn old_message(&self) -> Option<&str> {
        match self {
            Self::Fetch(_) => None,
            Self::AlreadyMigrated { old_message } | Self::Unchanged { old_message } => {
                Some(old_message)
            }
            Self::Write { rewrite, .. } => Some(&rewrite.old_message),
        }
    }

    /// The message that failed to be written, if it got that far.
    pub fn new_message(&self) -> Option<&str> {
        match self {
            Self::Write { rewrite, .. } => Some(&rewrite.new_message),
            _ => None,
        }
    }
}

/// Applies patches to monitors.
pub struct RuleRewriter<'a> {
    api: &'a dyn MonitoringApi,
    dry_run: bool,
}

impl<'a> RuleRewriter<'a> {
    pub fn new(api: &'a dyn MonitoringApi, dry_run: bool) -> Self {
        Self { api, dry_run }
    }

    /// Fetch the monitor, insert every patch's new mention, and write it back.
    ///
    /// In a dry run the new message is computed but not written.
    pub async fn apply(&self, rule_id: &str, patches: &[Patch]) -> Result<Rewrite, RewriteError> {
        let rule = self
            .api
            .get_rule(rule_id)
            .await
            .map_err(RewriteError::Fetch)?;

        if is_migrated(&rule.message) {
            return Err(RewriteError::AlreadyMigrated {
                old_message: rule.message,
            });
        }

        let new_message = apply_patches(&rule.message, patches);
        if new_message == rule.message {
            return Err(RewriteError::Unchanged {
                old_message: rule.message,
            });
        }

        let rewrite = Rewrite {
            old_message: rule.message.clone(),
            new_message,
        };

        if self.dry_run {
            tracing::info!(
                rule_id,
                new_message = %rewrite.new_message,
                "dry run: would update monitor"
            );
            return Ok(rewrite);
        }

        let written = match rule.write_path() {
            RuleWrite::Monitor { id } => {
                self.api
                    .update_monitor_message(id, &rewrite.new_message)
                    .await
            }
            RuleWrite::SyntheticsTest { check_id } => {
                self.api
                    .update_synthetics_message(check_id, &rewrite.new_message)
                    .await
            }
        };

        match written {
            Ok(()) => {
                tracing::info!(rule_id, patches = patches.len(), "updated monitor");
                Ok(rewrite)
            }
            Err(source) => Err(RewriteError::Write { rewrite, source }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::model::SYNTHETICS_ALERT;
    use crate::testing::{FakeDatadog, Write, rule};

    fn patch(old: &str, new: &str) -> Patch {
        Patch {
            old: old.to_string(),
            new: new.to_string(),
        }
    }

    #[tokio::test]
    async fn batches_patches_into_one_write() {
        let api = FakeDatadog::new(vec![rule("7", "@pagerduty-a and @pagerduty-b")]);
        let rewriter = RuleRewriter::new(&api, false);

        let rewrite = rewriter
            .apply("7", &[
                patch("@pagerduty-a", "@webhook-rootly-a"),
                patch("@pagerduty-b", "@webhook-rootly-b"),
            ])
            .await
            .unwrap();

        let expected = "@pagerduty-a @webhook-rootly-a and @pagerduty-b @webhook-rootly-b";
        assert_eq!(rewrite.new_message, expected);
        assert_eq!(api.rule_writes(), vec![Write::Monitor {
            id: "7".to_string(),
            message: expected.to_string(),
        }]);
    }

    #[tokio::test]
    async fn uses_fresh_message() {
        let api = FakeDatadog::new(vec![rule("7", "old @pagerduty-a")]);
        api.edit_message("7", "edited @pagerduty-a body");
        let rewriter = RuleRewriter::new(&api, false);

        let rewrite = rewriter
            .apply("7", &[patch("@pagerduty-a", "@webhook-rootly-a")])
            .await
            .unwrap();
        assert_eq!(rewrite.old_message, "edited @pagerduty-a body");
        assert_eq!(rewrite.new_message, "edited @pagerduty-a @webhook-rootly-a body");
    }

    #[tokio::test]
    async fn synthetics_monitor_is_patched_on_the_test() {
        let mut synthetic = rule("8", "@pagerduty-web down");
        synthetic.kind = SYNTHETICS_ALERT.to_string();
        synthetic.synthetics_check_id = Some("abc-def-ghi".to_string());
        let api = FakeDatadog::new(vec![synthetic]);
        let rewriter = RuleRewriter::new(&api, false);

        rewriter
            .apply("8", &[patch("@pagerduty-web", "@webhook-rootly-web")])
            .await
            .unwrap();
        assert_eq!(api.rule_writes(), vec![Write::Synthetics {
            check_id: "abc-def-ghi".to_string(),
            message: "@pagerduty-web @webhook-rootly-web down".to_string(),
        }]);
    }

    #[tokio::test]
    async fn dry_run_does_not_write() {
        let api = FakeDatadog::new(vec![rule("7", "@pagerduty-a")]);
        let rewriter = RuleRewriter::new(&api, true);

        let rewrite = rewriter
            .apply("7", &[patch("@pagerduty-a", "@webhook-rootly-a")])
            .await
            .unwrap();
        assert_eq!(rewrite.new_message, "@pagerduty-a @webhook-rootly-a");
        assert!(api.writes().is_empty());
        assert_eq!(api.message_of("7").unwrap(), "@pagerduty-a");
    }

    #[tokio::test]
    async fn missing_monitor_is_a_fetch_error() {
        let api = FakeDatadog::new(vec![]);
        let rewriter = RuleRewriter::new(&api, false);

        let err = rewriter
            .apply("404", &[patch("@pagerduty-a", "@webhook-rootly-a")])
            .await
            .unwrap_err();
        assert!(matches!(err, RewriteError::Fetch(_)));
        assert_eq!(err.old_message(), None);
    }

    #[tokio::test]
    async fn migrated_since_listing_is_left_alone() {
        let api = FakeDatadog::new(vec![rule("7", "@pagerduty-a")]);
        api.edit_message("7", "@pagerduty-a @webhook-rootly-a");
        let rewriter = RuleRewriter::new(&api, false);

        let err = rewriter
            .apply("7", &[patch("@pagerduty-a", "@webhook-rootly-a")])
            .await
            .unwrap_err();
        assert!(matches!(err, RewriteError::AlreadyMigrated { .. }));
        assert!(api.writes().is_empty());
    }

    #[tokio::test]
    async fn removed_mention_is_unchanged() {
        let api = FakeDatadog::new(vec![rule("7", "@pagerduty-a")]);
        api.edit_message("7", "@slack-ops only");
        let rewriter = RuleRewriter::new(&api, false);

        let err = rewriter
            .apply("7", &[patch("@pagerduty-a", "@webhook-rootly-a")])
            .await
            .unwrap_err();
        assert!(matches!(err, RewriteError::Unchanged { .. }));
        assert_eq!(err.old_message(), Some("@slack-ops only"));
        assert!(api.writes().is_empty());
    }

    #[tokio::test]
    async fn write_failure_keeps_computed_message() {
        let api = FakeDatadog::new(vec![rule("7", "@pagerduty-a")]).failing_rule_writes();
        let rewriter = RuleRewriter::new(&api, false);

        let err = rewriter
            .apply("7", &[patch("@pagerduty-a", "@webhook-rootly-a")])
            .await
            .unwrap_err();
        assert_eq!(err.old_message(), Some("@pagerduty-a"));
        assert_eq!(err.new_message(), Some("@pagerduty-a @webhook-rootly-a"));
    }
}
