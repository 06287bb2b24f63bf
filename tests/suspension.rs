//! Auto-suspension policy behavior.

mod common;

use chrono::{Duration, Utc};
use std::sync::Arc;

use common::user;
use lending_trust_service::db::MemoryStore;
use lending_trust_service::models::AdminActionType;
use lending_trust_service::services::SuspensionPolicy;

#[tokio::test]
async fn low_trust_users_are_suspended_with_an_audit_record() {
    let store = Arc::new(MemoryStore::new());
    let service = common::safety_service(&store).await;

    let mut low = user("low@example.com");
    low.trust_score = 150;
    store.insert_user(low.clone());

    let mut healthy = user("healthy@example.com");
    healthy.trust_score = 250;
    store.insert_user(healthy.clone());

    let before = Utc::now();
    let summary = service.auto_suspend_low_trust_users().await.unwrap();
    assert_eq!(summary.candidates, 1);
    assert_eq!(summary.suspended, 1);
    assert_eq!(summary.failures, 0);

    let suspended = store.user(low.id).unwrap();
    assert!(suspended.is_suspended);
    assert_eq!(suspended.suspension_count, 1);
    assert!(suspended.last_suspension_at.is_some());
    let ends_at = suspended.suspension_ends_at.unwrap();
    assert!(ends_at > before + Duration::days(29));
    assert!(ends_at < before + Duration::days(31));

    let actions = store.admin_actions();
    assert_eq!(actions.len(), 1);
    let action = &actions[0];
    assert_eq!(action.action_type, AdminActionType::UserSuspension);
    assert_eq!(action.target_user_id, low.id);
    assert_eq!(action.admin_id, service.system_reporter_id());
    let metadata = action.metadata.as_ref().unwrap();
    assert_eq!(metadata["trust_score"], 150);
    assert_eq!(metadata["threshold"], 200);
    assert!(metadata["suspended_until"].is_string());

    // The untouched user stays untouched.
    let untouched = store.user(healthy.id).unwrap();
    assert!(!untouched.is_suspended);
    assert_eq!(untouched.suspension_count, 0);
}

#[tokio::test]
async fn already_suspended_users_are_not_suspended_again() {
    let store = Arc::new(MemoryStore::new());
    let service = common::safety_service(&store).await;

    let mut parked = user("parked@example.com");
    parked.trust_score = 100;
    parked.is_suspended = true;
    parked.suspension_count = 1;
    store.insert_user(parked.clone());

    let summary = service.auto_suspend_low_trust_users().await.unwrap();
    assert_eq!(summary.candidates, 0);
    assert_eq!(summary.suspended, 0);

    assert_eq!(store.user(parked.id).unwrap().suspension_count, 1);
    assert!(store.admin_actions().is_empty());
}

/// When the audit write fails, the user mutation must not be visible either.
#[tokio::test]
async fn failed_audit_write_rolls_back_the_suspension() {
    let store = Arc::new(MemoryStore::new());
    let service = common::safety_service(&store).await;

    let mut low = user("low@example.com");
    low.trust_score = 120;
    store.insert_user(low.clone());

    store.fail_admin_actions(true);
    let summary = service.auto_suspend_low_trust_users().await.unwrap();
    assert_eq!(summary.failures, 1);
    assert_eq!(summary.suspended, 0);

    let untouched = store.user(low.id).unwrap();
    assert!(!untouched.is_suspended);
    assert_eq!(untouched.suspension_count, 0);
    assert!(untouched.suspension_ends_at.is_none());
    assert!(store.admin_actions().is_empty());

    // With the fault cleared the same sweep succeeds.
    store.fail_admin_actions(false);
    let summary = service.auto_suspend_low_trust_users().await.unwrap();
    assert_eq!(summary.suspended, 1);
    assert!(store.user(low.id).unwrap().is_suspended);
    assert_eq!(store.admin_actions().len(), 1);
}

#[tokio::test]
async fn policy_thresholds_are_honored() {
    let store = Arc::new(MemoryStore::new());
    let service = common::safety_service_with_policy(
        &store,
        SuspensionPolicy {
            trust_threshold: 300,
            duration_days: 7,
        },
    )
    .await;

    let mut low = user("low@example.com");
    low.trust_score = 250;
    store.insert_user(low.clone());

    let before = Utc::now();
    let summary = service.auto_suspend_low_trust_users().await.unwrap();
    assert_eq!(summary.suspended, 1);

    let suspended = store.user(low.id).unwrap();
    let ends_at = suspended.suspension_ends_at.unwrap();
    assert!(ends_at > before + Duration::days(6));
    assert!(ends_at < before + Duration::days(8));
}
