//! Auto-suspension of very-low-trust users.

use chrono::{Duration, Utc};
use serde::Serialize;

use crate::error::Result;
use crate::models::{AdminActionType, NewAdminAction};
use crate::services::TrustSafetyService;

/// Thresholds for the auto-suspension policy. The trust threshold sits well
/// below the flagging review threshold, so flagging precedes enforcement.
#[derive(Debug, Clone, Copy)]
pub struct SuspensionPolicy {
    pub trust_threshold: i32,
    pub duration_days: i64,
}

impl Default for SuspensionPolicy {
    fn default() -> Self {
        Self {
            trust_threshold: 200,
            duration_days: 30,
        }
    }
}

/// Outcome of one auto-suspension sweep.
#[derive(Debug, Default, Clone, Serialize)]
pub struct SuspensionSummary {
    pub candidates: usize,
    pub suspended: usize,
    pub failures: usize,
}

impl TrustSafetyService {
    /// Suspend users whose trust score has fallen below the policy
    /// threshold. Each suspension mutates the user and records an audit
    /// action as one atomic unit; a failure for one user does not stop the
    /// sweep.
    pub async fn auto_suspend_low_trust_users(&self) -> Result<SuspensionSummary> {
        let candidates = self
            .store
            .users_below_trust_score(self.policy.trust_threshold)
            .await?;

        let mut summary = SuspensionSummary {
            candidates: candidates.len(),
            ..Default::default()
        };

        for user_id in candidates {
            let Some(user) = self.store.find_user(user_id).await? else {
                continue;
            };
            if user.is_suspended {
                continue;
            }

            let ends_at = Utc::now() + Duration::days(self.policy.duration_days);
            let audit = NewAdminAction {
                action_type: AdminActionType::UserSuspension,
                description: "Automatic suspension for low trust score".to_string(),
                reason: format!(
                    "trust score {} is below the suspension threshold {}",
                    user.trust_score, self.policy.trust_threshold
                ),
                admin_id: self.system_reporter_id,
                target_user_id: user_id,
                metadata: Some(serde_json::json!({
                    "trust_score": user.trust_score,
                    "threshold": self.policy.trust_threshold,
                    "suspended_until": ends_at.to_rfc3339(),
                })),
            };

            match self.store.suspend_user(user_id, ends_at, audit).await {
                Ok(action) => {
                    summary.suspended += 1;
                    tracing::warn!(
                        user_id = %user_id,
                        action_id = %action.id,
                        ends_at = %ends_at,
                        trust_score = user.trust_score,
                        "User auto-suspended"
                    );
                }
                Err(e) => {
                    summary.failures += 1;
                    tracing::error!(user_id = %user_id, error = %e, "Auto-suspension failed");
                }
            }
        }

        Ok(summary)
    }
}
