//! In-memory entity store. Backs the test suite and local experimentation;
//! mirrors the Postgres backend's semantics, including the status guard on
//! borrow-request updates and the both-or-neither suspension write.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use uuid::Uuid;

use crate::db::Store;
use crate::error::{Result, ServiceError};
use crate::models::{
    AdminAction, BorrowRequest, BorrowRequestChanges, BorrowStatus, Item, NewAdminAction,
    NewBorrowRequest, NewReport, NewUser, ReportStatus, User, UserReport,
};

#[derive(Default)]
pub struct MemoryStore {
    users: DashMap<Uuid, User>,
    items: DashMap<Uuid, Item>,
    borrow_requests: DashMap<Uuid, BorrowRequest>,
    reports: DashMap<Uuid, UserReport>,
    admin_actions: DashMap<Uuid, AdminAction>,

    // Fault injection for failure-path tests.
    fail_admin_actions: AtomicBool,
    fail_trust_scan: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_user(&self, user: User) {
        self.users.insert(user.id, user);
    }

    pub fn insert_item(&self, item: Item) {
        self.items.insert(item.id, item);
    }

    pub fn insert_borrow_request(&self, request: BorrowRequest) {
        self.borrow_requests.insert(request.id, request);
    }

    pub fn user(&self, id: Uuid) -> Option<User> {
        self.users.get(&id).map(|u| u.value().clone())
    }

    pub fn reports(&self) -> Vec<UserReport> {
        self.reports.iter().map(|r| r.value().clone()).collect()
    }

    pub fn admin_actions(&self) -> Vec<AdminAction> {
        self.admin_actions.iter().map(|a| a.value().clone()).collect()
    }

    /// Make the next admin-action writes fail, so the suspension transaction
    /// aborts after the point where a user mutation would have been staged.
    pub fn fail_admin_actions(&self, fail: bool) {
        self.fail_admin_actions.store(fail, Ordering::SeqCst);
    }

    /// Make trust-score scans fail, to exercise per-rule failure isolation.
    pub fn fail_trust_scan(&self, fail: bool) {
        self.fail_trust_scan.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_user(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.users.get(&id).map(|u| u.value().clone()))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self
            .users
            .iter()
            .find(|u| u.email == email)
            .map(|u| u.value().clone()))
    }

    async fn create_user(&self, input: NewUser) -> Result<User> {
        let user = User {
            id: Uuid::new_v4(),
            email: input.email,
            display_name: input.display_name,
            trust_score: 1000,
            warning_count: 0,
            suspension_count: 0,
            is_suspended: false,
            suspension_ends_at: None,
            last_suspension_at: None,
            created_at: Utc::now(),
        };
        self.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn set_trust_score(&self, user_id: Uuid, score: i32) -> Result<()> {
        if let Some(mut user) = self.users.get_mut(&user_id) {
            user.trust_score = score;
        }
        Ok(())
    }

    async fn users_below_trust_score(&self, threshold: i32) -> Result<Vec<Uuid>> {
        if self.fail_trust_scan.load(Ordering::SeqCst) {
            return Err(ServiceError::Database(
                "injected failure: trust score scan".to_string(),
            ));
        }

        Ok(self
            .users
            .iter()
            .filter(|u| u.trust_score < threshold && !u.is_suspended)
            .map(|u| u.id)
            .collect())
    }

    async fn suspend_user(
        &self,
        user_id: Uuid,
        ends_at: DateTime<Utc>,
        audit: NewAdminAction,
    ) -> Result<AdminAction> {
        let mut user = self
            .users
            .get_mut(&user_id)
            .ok_or_else(|| ServiceError::NotFound("user".to_string()))?;

        // The audit write is validated before the user mutation becomes
        // visible, so a failed write leaves both records untouched.
        if self.fail_admin_actions.load(Ordering::SeqCst) {
            return Err(ServiceError::Database(
                "injected failure: admin actions".to_string(),
            ));
        }

        user.is_suspended = true;
        user.suspension_ends_at = Some(ends_at);
        user.last_suspension_at = Some(Utc::now());
        user.suspension_count += 1;

        let action = AdminAction {
            id: Uuid::new_v4(),
            action_type: audit.action_type,
            description: audit.description,
            reason: audit.reason,
            admin_id: audit.admin_id,
            target_user_id: audit.target_user_id,
            metadata: audit.metadata,
            created_at: Utc::now(),
        };
        self.admin_actions.insert(action.id, action.clone());

        Ok(action)
    }

    async fn find_item(&self, id: Uuid) -> Result<Option<Item>> {
        Ok(self.items.get(&id).map(|i| i.value().clone()))
    }

    async fn item_has_active_loan(&self, item_id: Uuid) -> Result<bool> {
        Ok(self
            .borrow_requests
            .iter()
            .any(|r| r.item_id == item_id && r.status == BorrowStatus::Active))
    }

    async fn create_borrow_request(&self, input: NewBorrowRequest) -> Result<BorrowRequest> {
        let request = BorrowRequest {
            id: Uuid::new_v4(),
            item_id: input.item_id,
            borrower_id: input.borrower_id,
            lender_id: input.lender_id,
            status: BorrowStatus::Pending,
            request_message: input.request_message,
            lender_message: None,
            requested_return_date: input.requested_return_date,
            actual_return_date: None,
            approved_at: None,
            returned_at: None,
            created_at: Utc::now(),
        };
        self.borrow_requests.insert(request.id, request.clone());
        Ok(request)
    }

    async fn find_borrow_request(&self, id: Uuid) -> Result<Option<BorrowRequest>> {
        Ok(self.borrow_requests.get(&id).map(|r| r.value().clone()))
    }

    async fn update_borrow_request(
        &self,
        id: Uuid,
        expected: BorrowStatus,
        changes: BorrowRequestChanges,
    ) -> Result<Option<BorrowRequest>> {
        match self.borrow_requests.get_mut(&id) {
            Some(mut request) if request.status == expected => {
                changes.apply(&mut request);
                Ok(Some(request.value().clone()))
            }
            _ => Ok(None),
        }
    }

    async fn borrow_requests_by_borrower(&self, user_id: Uuid) -> Result<Vec<BorrowRequest>> {
        Ok(self
            .borrow_requests
            .iter()
            .filter(|r| r.borrower_id == user_id)
            .map(|r| r.value().clone())
            .collect())
    }

    async fn borrow_requests_by_lender(&self, user_id: Uuid) -> Result<Vec<BorrowRequest>> {
        Ok(self
            .borrow_requests
            .iter()
            .filter(|r| r.lender_id == user_id)
            .map(|r| r.value().clone())
            .collect())
    }

    async fn users_with_overdue_active_loans(
        &self,
        min_loans: i64,
        due_before: DateTime<Utc>,
    ) -> Result<Vec<Uuid>> {
        let mut counts: HashMap<Uuid, i64> = HashMap::new();
        for request in self.borrow_requests.iter() {
            if request.status == BorrowStatus::Active
                && request.requested_return_date < due_before
            {
                *counts.entry(request.borrower_id).or_default() += 1;
            }
        }

        Ok(counts
            .into_iter()
            .filter(|(_, count)| *count >= min_loans)
            .map(|(id, _)| id)
            .collect())
    }

    async fn users_with_low_return_rate(
        &self,
        since: DateTime<Utc>,
        min_requests: i64,
        max_ratio: f64,
    ) -> Result<Vec<Uuid>> {
        let mut activity: HashMap<Uuid, (i64, i64)> = HashMap::new();
        for request in self.borrow_requests.iter() {
            if request.created_at >= since {
                let entry = activity.entry(request.borrower_id).or_default();
                entry.0 += 1;
                if request.status == BorrowStatus::Returned {
                    entry.1 += 1;
                }
            }
        }

        Ok(activity
            .into_iter()
            .filter(|(_, (total, returned))| {
                *total >= min_requests && (*returned as f64) / (*total as f64) < max_ratio
            })
            .map(|(id, _)| id)
            .collect())
    }

    async fn create_report(&self, input: NewReport) -> Result<UserReport> {
        let report = UserReport {
            id: Uuid::new_v4(),
            reporter_id: input.reporter_id,
            reported_id: input.reported_id,
            reason: input.reason,
            description: input.description,
            priority: input.priority,
            status: ReportStatus::Pending,
            evidence: input.evidence,
            reviewed_by: None,
            reviewed_at: None,
            resolution: None,
            created_at: Utc::now(),
        };
        self.reports.insert(report.id, report.clone());
        Ok(report)
    }

    async fn count_reports_against(&self, user_id: Uuid) -> Result<i64> {
        Ok(self
            .reports
            .iter()
            .filter(|r| r.reported_id == user_id)
            .count() as i64)
    }

    async fn count_reports_by(&self, user_id: Uuid) -> Result<i64> {
        Ok(self
            .reports
            .iter()
            .filter(|r| r.reporter_id == user_id)
            .count() as i64)
    }

    async fn automated_report_exists(
        &self,
        reported_id: Uuid,
        rule_name: &str,
        since: DateTime<Utc>,
    ) -> Result<bool> {
        Ok(self.reports.iter().any(|r| {
            r.reported_id == reported_id
                && r.created_at >= since
                && r.description.contains(rule_name)
        }))
    }

    async fn users_with_pending_reports(
        &self,
        min_reporters: i64,
        since: DateTime<Utc>,
    ) -> Result<Vec<Uuid>> {
        let mut reporters: HashMap<Uuid, HashSet<Uuid>> = HashMap::new();
        for report in self.reports.iter() {
            if report.status == ReportStatus::Pending && report.created_at >= since {
                reporters
                    .entry(report.reported_id)
                    .or_default()
                    .insert(report.reporter_id);
            }
        }

        Ok(reporters
            .into_iter()
            .filter(|(_, distinct)| distinct.len() as i64 >= min_reporters)
            .map(|(id, _)| id)
            .collect())
    }

    async fn admin_actions_for_user(&self, user_id: Uuid) -> Result<Vec<AdminAction>> {
        Ok(self
            .admin_actions
            .iter()
            .filter(|a| a.target_user_id == user_id)
            .map(|a| a.value().clone())
            .collect())
    }
}
