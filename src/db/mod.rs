//! Entity store abstraction and its backends.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{
    AdminAction, BorrowRequest, BorrowRequestChanges, BorrowStatus, Item, NewAdminAction,
    NewBorrowRequest, NewReport, NewUser, User, UserReport,
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Repository interface over the persisted entities. One production backend
/// (Postgres) and one in-memory backend used by the test suite.
#[async_trait]
pub trait Store: Send + Sync {
    // Users
    async fn find_user(&self, id: Uuid) -> Result<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn create_user(&self, input: NewUser) -> Result<User>;
    async fn set_trust_score(&self, user_id: Uuid, score: i32) -> Result<()>;

    /// Ids of non-suspended users whose trust score is below `threshold`.
    async fn users_below_trust_score(&self, threshold: i32) -> Result<Vec<Uuid>>;

    /// Suspend a user and record the audit action as a single atomic unit:
    /// either both writes are applied or neither is.
    async fn suspend_user(
        &self,
        user_id: Uuid,
        ends_at: DateTime<Utc>,
        audit: NewAdminAction,
    ) -> Result<AdminAction>;

    // Items
    async fn find_item(&self, id: Uuid) -> Result<Option<Item>>;
    async fn item_has_active_loan(&self, item_id: Uuid) -> Result<bool>;

    // Borrow requests
    async fn create_borrow_request(&self, input: NewBorrowRequest) -> Result<BorrowRequest>;
    async fn find_borrow_request(&self, id: Uuid) -> Result<Option<BorrowRequest>>;

    /// Guarded update: applies `changes` only while the request still has
    /// `expected` status, returning the updated row. `None` means the guard
    /// failed (the request changed underneath the caller, or is gone).
    async fn update_borrow_request(
        &self,
        id: Uuid,
        expected: BorrowStatus,
        changes: BorrowRequestChanges,
    ) -> Result<Option<BorrowRequest>>;

    async fn borrow_requests_by_borrower(&self, user_id: Uuid) -> Result<Vec<BorrowRequest>>;
    async fn borrow_requests_by_lender(&self, user_id: Uuid) -> Result<Vec<BorrowRequest>>;

    /// Borrowers holding at least `min_loans` active loans whose requested
    /// return date is before `due_before`.
    async fn users_with_overdue_active_loans(
        &self,
        min_loans: i64,
        due_before: DateTime<Utc>,
    ) -> Result<Vec<Uuid>>;

    /// Borrowers with at least `min_requests` requests created since `since`
    /// whose returned fraction is below `max_ratio`.
    async fn users_with_low_return_rate(
        &self,
        since: DateTime<Utc>,
        min_requests: i64,
        max_ratio: f64,
    ) -> Result<Vec<Uuid>>;

    // Reports
    async fn create_report(&self, input: NewReport) -> Result<UserReport>;
    async fn count_reports_against(&self, user_id: Uuid) -> Result<i64>;
    async fn count_reports_by(&self, user_id: Uuid) -> Result<i64>;

    /// Whether a report against `reported_id` whose description mentions
    /// `rule_name` was created at or after `since`. Used for flag dedup.
    async fn automated_report_exists(
        &self,
        reported_id: Uuid,
        rule_name: &str,
        since: DateTime<Utc>,
    ) -> Result<bool>;

    /// Users with at least `min_reporters` distinct reporters on pending
    /// reports created since `since`.
    async fn users_with_pending_reports(
        &self,
        min_reporters: i64,
        since: DateTime<Utc>,
    ) -> Result<Vec<Uuid>>;

    // Admin actions
    async fn admin_actions_for_user(&self, user_id: Uuid) -> Result<Vec<AdminAction>>;
}
