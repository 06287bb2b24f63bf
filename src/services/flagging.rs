//! Automated flagging engine.
//!
//! Each sweep evaluates the active rules against the store and files a
//! pending report for every matching user, attributed to the system reporter.
//! A rule failure is logged and does not abort the remaining rules, and a
//! user already flagged by the same rule within the dedup window is skipped.

use chrono::{Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{FlaggingRule, NewReport, ReportReason, RuleKind};
use crate::services::TrustSafetyService;

const OVERDUE_MIN_LOANS: i64 = 3;
const OVERDUE_GRACE_DAYS: i64 = 7;

const ACTIVITY_WINDOW_DAYS: i64 = 30;
const ACTIVITY_MIN_REQUESTS: i64 = 5;
const ACTIVITY_MAX_RETURN_RATIO: f64 = 0.5;

const TRUST_REVIEW_THRESHOLD: i32 = 500;

const REPORT_WINDOW_DAYS: i64 = 30;
const REPORT_MIN_REPORTERS: i64 = 5;

const DEDUP_WINDOW_HOURS: i64 = 24;

/// Outcome of one flagging sweep.
#[derive(Debug, Default, Clone, Serialize)]
pub struct FlaggingSummary {
    pub rules_evaluated: usize,
    pub users_flagged: usize,
    pub duplicates_skipped: usize,
    pub rule_failures: usize,
}

impl TrustSafetyService {
    /// Snapshot of the rule registry, in its fixed order.
    pub fn rules(&self) -> Vec<FlaggingRule> {
        self.rules.read().unwrap().clone()
    }

    /// Toggle a rule's active flag. Unknown rule ids are ignored.
    pub fn set_rule_active(&self, rule_id: &str, is_active: bool) -> Option<FlaggingRule> {
        let mut rules = self.rules.write().unwrap();
        match rules.iter_mut().find(|r| r.kind.id() == rule_id) {
            Some(rule) => {
                rule.is_active = is_active;
                tracing::info!(rule = rule_id, is_active, "Flagging rule toggled");
                Some(rule.clone())
            }
            None => {
                tracing::warn!(rule = rule_id, "Ignoring toggle for unknown flagging rule");
                None
            }
        }
    }

    /// Run all active rules and file reports for matching users.
    pub async fn run_automated_flagging(&self) -> Result<FlaggingSummary> {
        let active: Vec<RuleKind> = self
            .rules
            .read()
            .unwrap()
            .iter()
            .filter(|r| r.is_active)
            .map(|r| r.kind)
            .collect();

        let outcomes =
            futures::future::join_all(active.iter().map(|kind| self.run_rule(*kind))).await;

        let mut summary = FlaggingSummary::default();
        for (kind, outcome) in active.iter().zip(outcomes) {
            summary.rules_evaluated += 1;
            match outcome {
                Ok((flagged, duplicates)) => {
                    summary.users_flagged += flagged;
                    summary.duplicates_skipped += duplicates;
                }
                Err(e) => {
                    summary.rule_failures += 1;
                    tracing::error!(rule = kind.id(), error = %e, "Flagging rule failed");
                }
            }
        }

        tracing::info!(
            rules_evaluated = summary.rules_evaluated,
            users_flagged = summary.users_flagged,
            duplicates_skipped = summary.duplicates_skipped,
            rule_failures = summary.rule_failures,
            "Automated flagging sweep complete"
        );

        Ok(summary)
    }

    async fn run_rule(&self, kind: RuleKind) -> Result<(usize, usize)> {
        let matches = self.evaluate_rule(kind).await?;

        let mut flagged = 0;
        let mut duplicates = 0;
        for user_id in matches {
            if self.flag_user(kind, user_id).await? {
                flagged += 1;
            } else {
                duplicates += 1;
            }
        }

        Ok((flagged, duplicates))
    }

    async fn evaluate_rule(&self, kind: RuleKind) -> Result<Vec<Uuid>> {
        let now = Utc::now();
        match kind {
            RuleKind::MultipleFailedReturns => {
                self.store
                    .users_with_overdue_active_loans(
                        OVERDUE_MIN_LOANS,
                        now - Duration::days(OVERDUE_GRACE_DAYS),
                    )
                    .await
            }
            RuleKind::SuspiciousActivityPattern => {
                self.store
                    .users_with_low_return_rate(
                        now - Duration::days(ACTIVITY_WINDOW_DAYS),
                        ACTIVITY_MIN_REQUESTS,
                        ACTIVITY_MAX_RETURN_RATIO,
                    )
                    .await
            }
            RuleKind::TrustScoreThreshold => {
                self.store
                    .users_below_trust_score(TRUST_REVIEW_THRESHOLD)
                    .await
            }
            RuleKind::MultipleReports => {
                self.store
                    .users_with_pending_reports(
                        REPORT_MIN_REPORTERS,
                        now - Duration::days(REPORT_WINDOW_DAYS),
                    )
                    .await
            }
        }
    }

    /// File a report for `user_id` unless the same rule already flagged them
    /// within the dedup window. Returns whether a report was created.
    async fn flag_user(&self, kind: RuleKind, user_id: Uuid) -> Result<bool> {
        let since = Utc::now() - Duration::hours(DEDUP_WINDOW_HOURS);
        if self
            .store
            .automated_report_exists(user_id, kind.name(), since)
            .await?
        {
            tracing::debug!(
                rule = kind.id(),
                user_id = %user_id,
                "Skipping duplicate automated flag"
            );
            return Ok(false);
        }

        let report = self
            .store
            .create_report(NewReport {
                reporter_id: self.system_reporter_id,
                reported_id: user_id,
                reason: ReportReason::SafetyConcern,
                description: format!("Automated flag: {}. {}", kind.name(), kind.description()),
                priority: kind.priority(),
                evidence: Some(serde_json::json!({
                    "automated_rule": kind.id(),
                    "flagged_at": Utc::now().to_rfc3339(),
                })),
            })
            .await?;

        tracing::warn!(
            rule = kind.id(),
            user_id = %user_id,
            report_id = %report.id,
            "User flagged for review"
        );

        Ok(true)
    }
}
