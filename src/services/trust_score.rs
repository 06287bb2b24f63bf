//! Trust score computation.
//!
//! The score is a bounded summary of a user's borrowing and lending history,
//! recomputed from the store on demand. Factors are additive on top of a base
//! score; the final value is clamped to [0, 2000].

use uuid::Uuid;

use crate::error::{Result, ServiceError};
use crate::models::BorrowStatus;
use crate::services::TrustSafetyService;

const BASE_SCORE: f64 = 1000.0;
const MIN_SCORE: f64 = 0.0;
const MAX_SCORE: f64 = 2000.0;

// An 80% on-time return rate is neutral; each point above or below moves the
// score along a 200-point slope.
const ON_TIME_BENCHMARK: f64 = 0.80;
const ON_TIME_WEIGHT: f64 = 200.0;

const LENDING_WEIGHT: f64 = 100.0;

const REPORT_AGAINST_PENALTY: f64 = 50.0;
const WARNING_PENALTY: f64 = 100.0;
const SUSPENSION_PENALTY: f64 = 200.0;

const REPORTING_BONUS: f64 = 10.0;
const REPORTING_BONUS_CAP: f64 = 100.0;

impl TrustSafetyService {
    /// Compute a user's trust score from their history. An unknown user
    /// yields 0 rather than an error.
    pub async fn calculate_trust_score(&self, user_id: Uuid) -> Result<i32> {
        let Some(user) = self.store.find_user(user_id).await? else {
            tracing::debug!(user_id = %user_id, "Trust score requested for unknown user");
            return Ok(0);
        };

        let mut score = BASE_SCORE;

        let borrows = self.store.borrow_requests_by_borrower(user_id).await?;
        if !borrows.is_empty() {
            let total = borrows.len() as f64;
            let on_time = borrows
                .iter()
                .filter(|r| {
                    r.status == BorrowStatus::Returned
                        && r.actual_return_date
                            .map(|actual| actual <= r.requested_return_date)
                            .unwrap_or(false)
                })
                .count() as f64;
            let on_time_rate = on_time / total;
            score += (on_time_rate - ON_TIME_BENCHMARK) * ON_TIME_WEIGHT;
            tracing::debug!(user_id = %user_id, on_time_rate, "Borrow history factored");
        }

        let lends = self.store.borrow_requests_by_lender(user_id).await?;
        if !lends.is_empty() {
            let total = lends.len() as f64;
            let returned = lends
                .iter()
                .filter(|r| r.status == BorrowStatus::Returned)
                .count() as f64;
            let positive_rate = returned / total;
            score += positive_rate * LENDING_WEIGHT;
            tracing::debug!(user_id = %user_id, positive_rate, "Lending history factored");
        }

        let reports_against = self.store.count_reports_against(user_id).await? as f64;
        score -= reports_against * REPORT_AGAINST_PENALTY;
        score -= f64::from(user.warning_count) * WARNING_PENALTY;
        score -= f64::from(user.suspension_count) * SUSPENSION_PENALTY;

        let reports_by = self.store.count_reports_by(user_id).await? as f64;
        score += (reports_by * REPORTING_BONUS).min(REPORTING_BONUS_CAP);

        Ok(score.round().clamp(MIN_SCORE, MAX_SCORE) as i32)
    }

    /// Recompute and persist a user's trust score, returning the new value.
    pub async fn update_user_trust_score(&self, user_id: Uuid) -> Result<i32> {
        if self.store.find_user(user_id).await?.is_none() {
            return Err(ServiceError::NotFound("user".to_string()));
        }

        let score = self.calculate_trust_score(user_id).await?;
        self.store.set_trust_score(user_id, score).await?;

        tracing::info!(user_id = %user_id, trust_score = score, "Trust score updated");

        Ok(score)
    }
}
