//! In-process safety sweep worker.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::services::TrustSafetyService;

/// Run the flagging and auto-suspension sweeps on a fixed cadence. A failed
/// cycle is logged and the loop keeps going.
pub fn spawn_safety_worker(
    service: Arc<TrustSafetyService>,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(interval_secs = interval.as_secs(), "Safety sweep worker started");

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            match service.run_automated_flagging().await {
                Ok(summary) => info!(
                    users_flagged = summary.users_flagged,
                    rule_failures = summary.rule_failures,
                    "Flagging sweep finished"
                ),
                Err(e) => error!(error = %e, "Flagging sweep failed"),
            }

            match service.auto_suspend_low_trust_users().await {
                Ok(summary) => info!(
                    candidates = summary.candidates,
                    suspended = summary.suspended,
                    "Suspension sweep finished"
                ),
                Err(e) => error!(error = %e, "Suspension sweep failed"),
            }
        }
    })
}
