//! Reconciliation: walk every monitor and add a Rootly webhook mention next
//! to each PagerDuty mention.
//!
//! Per monitor the work is split in two phases. Mentions are resolved, and
//! the webhook of each resolved service is provisioned once, concurrently.
//! Once all of that is done, the collected patches go out in one
//! fetch-modify-write. Monitors run concurrently up to a fixed bound.
//!
//! Failures never leave the monitor they happened on: each turns into an
//! outcome and the run moves on.

use std::panic::AssertUnwindSafe;

use futures::{FutureExt, StreamExt, future::join_all, stream};

use crate::api::{MonitoringApi, RoutingApi, TargetApi};
use crate::directory::{RoutingDirectory, TargetDirectory};
use crate::model::{
    AlertRule, Mention, Outcome, OutcomeStatus, Patch, TargetEntity, extract_mentions,
    is_migrated,
};
use crate::provision::{EndpointProvisioner, Provisioned, endpoint_mention};
use crate::report::Recorder;
use crate::rewrite::{Rewrite, RewriteError, RuleRewriter};
use crate::rules::load_rules;

/// Knobs for one run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub dry_run: bool,
    /// Monitors processed at once.
    pub concurrency: usize,
    pub page_size: u32,
    /// Base URL of Rootly's inbound webhooks.
    pub webhook_base: String,
    pub webhook_secret: Option<String>,
    /// Only process these monitor ids. Empty means all.
    pub only_rules: Vec<String>,
}

/// The remote services a run talks to.
pub struct Services<'a> {
    pub monitoring: &'a dyn MonitoringApi,
    pub routing: &'a dyn RoutingApi,
    pub targets: &'a dyn TargetApi,
}

/// Load both directories and all monitors, then reconcile every monitor.
pub async fn run(services: &Services<'_>, options: &RunOptions) -> Recorder {
    let (routing, targets) = tokio::join!(
        RoutingDirectory::load(services.routing, options.page_size),
        TargetDirectory::load(services.targets, options.page_size),
    );

    let mut rules = load_rules(services.monitoring, options.page_size).await;
    if !options.only_rules.is_empty() {
        rules.retain(|r| options.only_rules.contains(&r.id));
        tracing::info!(selected = rules.len(), "restricted to requested monitors");
    }
    tracing::info!(
        pagerduty_services = routing.len(),
        rootly_services = targets.len(),
        monitors = rules.len(),
        "starting reconciliation"
    );

    let reconciler = Reconciler::new(services.monitoring, routing, targets, options);
    reconciler.reconcile_all(&rules).await
}

/// A mention that resolved to a Rootly service.
struct Resolved {
    patch: Patch,
    /// Set when the webhook could not be provisioned.
    provision_error: Option<String>,
}

/// Reconciles monitors against loaded directories.
pub struct Reconciler<'a> {
    routing: RoutingDirectory,
    targets: TargetDirectory,
    provisioner: EndpointProvisioner<'a>,
    rewriter: RuleRewriter<'a>,
    dry_run: bool,
    concurrency: usize,
}

impl<'a> Reconciler<'a> {
    pub fn new(
        monitoring: &'a dyn MonitoringApi,
        routing: RoutingDirectory,
        targets: TargetDirectory,
        options: &RunOptions,
    ) -> Self {
        Self {
            routing,
            targets,
            provisioner: EndpointProvisioner::new(
                monitoring,
                &options.webhook_base,
                options.webhook_secret.as_deref(),
                options.dry_run,
            ),
            rewriter: RuleRewriter::new(monitoring, options.dry_run),
            dry_run: options.dry_run,
            concurrency: options.concurrency.max(1),
        }
    }

    /// Reconcile every monitor, recording outcomes in monitor order.
    pub async fn reconcile_all(&self, rules: &[AlertRule]) -> Recorder {
        let mut recorder = Recorder::default();
        let mut results = stream::iter(rules.iter().map(|rule| self.reconcile_guarded(rule)))
            .buffered(self.concurrency);

        while let Some(outcomes) = results.next().await {
            recorder.extend(outcomes);
        }
        recorder
    }

    /// Like [`Self::reconcile`], but a panic becomes a failed outcome.
    async fn reconcile_guarded(&self, rule: &AlertRule) -> Vec<Outcome> {
        match AssertUnwindSafe(self.reconcile(rule)).catch_unwind().await {
            Ok(outcomes) => outcomes,
            Err(_) => {
                tracing::error!(rule_id = %rule.id, "unexpected failure while processing monitor");
                vec![Outcome {
                    error: Some("unexpected failure while processing monitor".to_string()),
                    ..Outcome::for_rule(rule, OutcomeStatus::Failed)
                }]
            }
        }
    }

    /// Reconcile one monitor.
    pub async fn reconcile(&self, rule: &AlertRule) -> Vec<Outcome> {
        if is_migrated(&rule.message) {
            tracing::debug!(rule_id = %rule.id, "already migrated");
            return vec![Outcome::for_rule(rule, OutcomeStatus::AlreadyMigrated)];
        }

        let mentions = extract_mentions(&rule.message);
        if mentions.is_empty() {
            tracing::debug!(rule_id = %rule.id, "no pagerduty mentions");
            return vec![Outcome::for_rule(rule, OutcomeStatus::NoMentions)];
        }

        // Read phase: resolve all mentions before touching the monitor.
        let lookups: Vec<_> = mentions.iter().map(|m| self.lookup(m)).collect();
        let provisioned = self.provision_once(&lookups).await;

        let mut outcomes = Vec::new();
        let mut pending = Vec::new();
        for (mention, lookup) in mentions.iter().zip(lookups) {
            match lookup {
                Ok(target) => pending.push(Resolved {
                    patch: Patch {
                        old: mention.raw.clone(),
                        new: endpoint_mention(&target.name),
                    },
                    provision_error: provisioned
                        .iter()
                        .find(|(id, _)| *id == target.id)
                        .and_then(|(_, p)| p.error())
                        .map(String::from),
                }),
                Err(error) => {
                    tracing::warn!(
                        rule_id = %rule.id,
                        mention = %mention.raw,
                        %error,
                        "unresolved mention"
                    );
                    outcomes.push(Outcome::unresolved(rule, &mention.raw, error));
                }
            }
        }

        if pending.is_empty() {
            return outcomes;
        }

        // Write phase: one fetch-modify-write for all patches.
        let patches: Vec<Patch> = pending.iter().map(|r| r.patch.clone()).collect();
        let rewrite = self.rewriter.apply(&rule.id, &patches).await;
        if let Err(e) = &rewrite {
            tracing::warn!(rule_id = %rule.id, error = %e, "monitor not rewritten");
        }

        outcomes.extend(
            pending
                .into_iter()
                .map(|resolved| self.mention_outcome(rule, resolved, &rewrite)),
        );
        outcomes
    }

    /// Resolve a mention to the Rootly service linked to its PagerDuty
    /// service.
    fn lookup(&self, mention: &Mention) -> Result<&TargetEntity, String> {
        let routing = self
            .routing
            .lookup_by_name(&mention.fragment)
            .ok_or_else(|| format!("no PagerDuty service matches '{}'", mention.fragment))?;

        self.targets
            .lookup_by_linked_id(&routing.id)
            .ok_or_else(|| {
                format!(
                    "no Rootly service linked to PagerDuty service '{}' ({})",
                    routing.name, routing.id
                )
            })
    }

    /// Provision the webhook of every resolved service, once per service
    /// even when several mentions point at it.
    async fn provision_once<'t>(
        &self,
        lookups: &[Result<&'t TargetEntity, String>],
    ) -> Vec<(&'t str, Provisioned)> {
        let mut targets: Vec<&'t TargetEntity> = Vec::new();
        for target in lookups.iter().filter_map(|l| l.as_ref().ok().copied()) {
            if !targets.iter().any(|t| t.id == target.id) {
                targets.push(target);
            }
        }

        let results =
            join_all(targets.iter().map(|t| self.provisioner.ensure(&t.name, &t.id))).await;
        targets
            .into_iter()
            .map(|t| t.id.as_str())
            .zip(results)
            .collect()
    }

    fn mention_outcome(
        &self,
        rule: &AlertRule,
        resolved: Resolved,
        rewrite: &Result<Rewrite, RewriteError>,
    ) -> Outcome {
        let Resolved {
            patch,
            provision_error,
        } = resolved;

        let base = Outcome {
            old_mention: Some(patch.old),
            new_mention: Some(patch.new),
            ..Outcome::for_rule(rule, OutcomeStatus::Failed)
        };

        match rewrite {
            Ok(rewrite) => Outcome {
                status: if self.dry_run {
                    OutcomeStatus::Planned
                } else {
                    OutcomeStatus::Migrated
                },
                old_message: rewrite.old_message.clone(),
                new_message: Some(rewrite.new_message.clone()),
                error: provision_error,
                ..base
            },
            Err(RewriteError::AlreadyMigrated { old_message }) => Outcome {
                status: OutcomeStatus::AlreadyMigrated,
                old_message: old_message.clone(),
                error: provision_error,
                ..base
            },
            Err(e) => Outcome {
                old_message: e.old_message().unwrap_or(&rule.message).to_string(),
                new_message: e.new_message().map(String::from),
                error: Some(match provision_error {
                    Some(p) => format!("{e}; {p}"),
                    None => e.to_string(),
                }),
                ..base
            },
        }
    }
}
