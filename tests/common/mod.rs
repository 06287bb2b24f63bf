#![allow(dead_code)]

use chrono::{Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

use lending_trust_service::db::{MemoryStore, Store};
use lending_trust_service::models::{BorrowRequest, BorrowStatus, Item, User};
use lending_trust_service::services::{
    BorrowService, NoopNotifier, SuspensionPolicy, TrustSafetyService,
};

pub const SYSTEM_EMAIL: &str = "system@stufflibrary.org";

pub fn user(email: &str) -> User {
    User {
        id: Uuid::new_v4(),
        email: email.to_string(),
        display_name: None,
        trust_score: 1000,
        warning_count: 0,
        suspension_count: 0,
        is_suspended: false,
        suspension_ends_at: None,
        last_suspension_at: None,
        created_at: Utc::now(),
    }
}

pub fn item(owner_id: Uuid, name: &str) -> Item {
    Item {
        id: Uuid::new_v4(),
        owner_id,
        name: name.to_string(),
        description: None,
        created_at: Utc::now(),
    }
}

pub fn borrow_request(
    item_id: Uuid,
    borrower_id: Uuid,
    lender_id: Uuid,
    status: BorrowStatus,
) -> BorrowRequest {
    BorrowRequest {
        id: Uuid::new_v4(),
        item_id,
        borrower_id,
        lender_id,
        status,
        request_message: None,
        lender_message: None,
        requested_return_date: Utc::now() + Duration::days(7),
        actual_return_date: None,
        approved_at: None,
        returned_at: None,
        created_at: Utc::now(),
    }
}

pub async fn safety_service(store: &Arc<MemoryStore>) -> TrustSafetyService {
    safety_service_with_policy(store, SuspensionPolicy::default()).await
}

pub async fn safety_service_with_policy(
    store: &Arc<MemoryStore>,
    policy: SuspensionPolicy,
) -> TrustSafetyService {
    let store: Arc<dyn Store> = store.clone();
    TrustSafetyService::bootstrap(store, SYSTEM_EMAIL, policy)
        .await
        .expect("bootstrap should succeed against the in-memory store")
}

pub fn borrow_service(store: &Arc<MemoryStore>) -> BorrowService {
    let store: Arc<dyn Store> = store.clone();
    BorrowService::new(store, Arc::new(NoopNotifier))
}
