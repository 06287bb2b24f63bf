//! Postgres-backed entity store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::Store;
use crate::error::{Result, ServiceError};
use crate::models::{
    AdminAction, BorrowRequest, BorrowRequestChanges, BorrowStatus, Item, NewAdminAction,
    NewBorrowRequest, NewReport, NewUser, User, UserReport,
};

const USER_COLUMNS: &str = "id, email, display_name, trust_score, warning_count, \
     suspension_count, is_suspended, suspension_ends_at, last_suspension_at, created_at";

const BORROW_COLUMNS: &str = "id, item_id, borrower_id, lender_id, status, request_message, \
     lender_message, requested_return_date, actual_return_date, approved_at, returned_at, \
     created_at";

const REPORT_COLUMNS: &str = "id, reporter_id, reported_id, reason, description, priority, \
     status, evidence, reviewed_by, reviewed_at, resolution, created_at";

const ADMIN_ACTION_COLUMNS: &str =
    "id, action_type, description, reason, admin_id, target_user_id, metadata, created_at";

pub struct PgStore {
    pool: Arc<PgPool>,
}

impl PgStore {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn find_user(&self, id: Uuid) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&*self.pool)
        .await?;

        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&*self.pool)
        .await?;

        Ok(user)
    }

    async fn create_user(&self, input: NewUser) -> Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (email, display_name)
            VALUES ($1, $2)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&input.email)
        .bind(&input.display_name)
        .fetch_one(&*self.pool)
        .await?;

        tracing::info!(user_id = %user.id, email = %user.email, "User created");

        Ok(user)
    }

    async fn set_trust_score(&self, user_id: Uuid, score: i32) -> Result<()> {
        sqlx::query("UPDATE users SET trust_score = $2 WHERE id = $1")
            .bind(user_id)
            .bind(score)
            .execute(&*self.pool)
            .await?;

        Ok(())
    }

    async fn users_below_trust_score(&self, threshold: i32) -> Result<Vec<Uuid>> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM users WHERE trust_score < $1 AND is_suspended = FALSE",
        )
        .bind(threshold)
        .fetch_all(&*self.pool)
        .await?;

        Ok(ids)
    }

    async fn suspend_user(
        &self,
        user_id: Uuid,
        ends_at: DateTime<Utc>,
        audit: NewAdminAction,
    ) -> Result<AdminAction> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE users
            SET is_suspended = TRUE,
                suspension_ends_at = $2,
                last_suspension_at = NOW(),
                suspension_count = suspension_count + 1
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .bind(ends_at)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(ServiceError::NotFound("user".to_string()));
        }

        let action = sqlx::query_as::<_, AdminAction>(&format!(
            r#"
            INSERT INTO admin_actions (
                action_type,
                description,
                reason,
                admin_id,
                target_user_id,
                metadata
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {ADMIN_ACTION_COLUMNS}
            "#
        ))
        .bind(audit.action_type)
        .bind(&audit.description)
        .bind(&audit.reason)
        .bind(audit.admin_id)
        .bind(audit.target_user_id)
        .bind(&audit.metadata)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::warn!(
            user_id = %user_id,
            ends_at = %ends_at,
            action_id = %action.id,
            "User suspended"
        );

        Ok(action)
    }

    async fn find_item(&self, id: Uuid) -> Result<Option<Item>> {
        let item = sqlx::query_as::<_, Item>(
            "SELECT id, owner_id, name, description, created_at FROM items WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&*self.pool)
        .await?;

        Ok(item)
    }

    async fn item_has_active_loan(&self, item_id: Uuid) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM borrow_requests
                WHERE item_id = $1 AND status = 'active'
            )
            "#,
        )
        .bind(item_id)
        .fetch_one(&*self.pool)
        .await?;

        Ok(exists)
    }

    async fn create_borrow_request(&self, input: NewBorrowRequest) -> Result<BorrowRequest> {
        let request = sqlx::query_as::<_, BorrowRequest>(&format!(
            r#"
            INSERT INTO borrow_requests (
                item_id,
                borrower_id,
                lender_id,
                request_message,
                requested_return_date
            )
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {BORROW_COLUMNS}
            "#
        ))
        .bind(input.item_id)
        .bind(input.borrower_id)
        .bind(input.lender_id)
        .bind(&input.request_message)
        .bind(input.requested_return_date)
        .fetch_one(&*self.pool)
        .await?;

        tracing::info!(
            request_id = %request.id,
            item_id = %input.item_id,
            borrower_id = %input.borrower_id,
            lender_id = %input.lender_id,
            "Borrow request created"
        );

        Ok(request)
    }

    async fn find_borrow_request(&self, id: Uuid) -> Result<Option<BorrowRequest>> {
        let request = sqlx::query_as::<_, BorrowRequest>(&format!(
            "SELECT {BORROW_COLUMNS} FROM borrow_requests WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&*self.pool)
        .await?;

        Ok(request)
    }

    async fn update_borrow_request(
        &self,
        id: Uuid,
        expected: BorrowStatus,
        changes: BorrowRequestChanges,
    ) -> Result<Option<BorrowRequest>> {
        // The status guard makes concurrent transitions race safely: exactly
        // one caller observes the expected status, the rest get no row back.
        let request = sqlx::query_as::<_, BorrowRequest>(&format!(
            r#"
            UPDATE borrow_requests
            SET status = $3,
                lender_message = COALESCE($4, lender_message),
                requested_return_date = COALESCE($5, requested_return_date),
                approved_at = COALESCE($6, approved_at),
                returned_at = COALESCE($7, returned_at),
                actual_return_date = COALESCE($8, actual_return_date)
            WHERE id = $1 AND status = $2
            RETURNING {BORROW_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(expected)
        .bind(changes.status.unwrap_or(expected))
        .bind(&changes.lender_message)
        .bind(changes.requested_return_date)
        .bind(changes.approved_at)
        .bind(changes.returned_at)
        .bind(changes.actual_return_date)
        .fetch_optional(&*self.pool)
        .await?;

        if let Some(ref updated) = request {
            tracing::info!(
                request_id = %id,
                from = %expected.as_str(),
                to = %updated.status.as_str(),
                "Borrow request updated"
            );
        }

        Ok(request)
    }

    async fn borrow_requests_by_borrower(&self, user_id: Uuid) -> Result<Vec<BorrowRequest>> {
        let requests = sqlx::query_as::<_, BorrowRequest>(&format!(
            r#"
            SELECT {BORROW_COLUMNS}
            FROM borrow_requests
            WHERE borrower_id = $1
            ORDER BY created_at DESC
            "#
        ))
        .bind(user_id)
        .fetch_all(&*self.pool)
        .await?;

        Ok(requests)
    }

    async fn borrow_requests_by_lender(&self, user_id: Uuid) -> Result<Vec<BorrowRequest>> {
        let requests = sqlx::query_as::<_, BorrowRequest>(&format!(
            r#"
            SELECT {BORROW_COLUMNS}
            FROM borrow_requests
            WHERE lender_id = $1
            ORDER BY created_at DESC
            "#
        ))
        .bind(user_id)
        .fetch_all(&*self.pool)
        .await?;

        Ok(requests)
    }

    async fn users_with_overdue_active_loans(
        &self,
        min_loans: i64,
        due_before: DateTime<Utc>,
    ) -> Result<Vec<Uuid>> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT borrower_id
            FROM borrow_requests
            WHERE status = 'active' AND requested_return_date < $1
            GROUP BY borrower_id
            HAVING COUNT(*) >= $2
            "#,
        )
        .bind(due_before)
        .bind(min_loans)
        .fetch_all(&*self.pool)
        .await?;

        Ok(ids)
    }

    async fn users_with_low_return_rate(
        &self,
        since: DateTime<Utc>,
        min_requests: i64,
        max_ratio: f64,
    ) -> Result<Vec<Uuid>> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT borrower_id
            FROM borrow_requests
            WHERE created_at >= $1
            GROUP BY borrower_id
            HAVING COUNT(*) >= $2
               AND (COUNT(*) FILTER (WHERE status = 'returned'))::float8
                   / COUNT(*)::float8 < $3
            "#,
        )
        .bind(since)
        .bind(min_requests)
        .bind(max_ratio)
        .fetch_all(&*self.pool)
        .await?;

        Ok(ids)
    }

    async fn create_report(&self, input: NewReport) -> Result<UserReport> {
        let report = sqlx::query_as::<_, UserReport>(&format!(
            r#"
            INSERT INTO user_reports (
                reporter_id,
                reported_id,
                reason,
                description,
                priority,
                evidence
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {REPORT_COLUMNS}
            "#
        ))
        .bind(input.reporter_id)
        .bind(input.reported_id)
        .bind(input.reason)
        .bind(&input.description)
        .bind(input.priority)
        .bind(&input.evidence)
        .fetch_one(&*self.pool)
        .await?;

        tracing::info!(
            report_id = %report.id,
            reporter_id = %input.reporter_id,
            reported_id = %input.reported_id,
            "User report created"
        );

        Ok(report)
    }

    async fn count_reports_against(&self, user_id: Uuid) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM user_reports WHERE reported_id = $1")
                .bind(user_id)
                .fetch_one(&*self.pool)
                .await?;

        Ok(count)
    }

    async fn count_reports_by(&self, user_id: Uuid) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM user_reports WHERE reporter_id = $1")
                .bind(user_id)
                .fetch_one(&*self.pool)
                .await?;

        Ok(count)
    }

    async fn automated_report_exists(
        &self,
        reported_id: Uuid,
        rule_name: &str,
        since: DateTime<Utc>,
    ) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM user_reports
                WHERE reported_id = $1
                  AND created_at >= $2
                  AND description LIKE '%' || $3 || '%'
            )
            "#,
        )
        .bind(reported_id)
        .bind(since)
        .bind(rule_name)
        .fetch_one(&*self.pool)
        .await?;

        Ok(exists)
    }

    async fn users_with_pending_reports(
        &self,
        min_reporters: i64,
        since: DateTime<Utc>,
    ) -> Result<Vec<Uuid>> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT reported_id
            FROM user_reports
            WHERE status = 'pending' AND created_at >= $1
            GROUP BY reported_id
            HAVING COUNT(DISTINCT reporter_id) >= $2
            "#,
        )
        .bind(since)
        .bind(min_reporters)
        .fetch_all(&*self.pool)
        .await?;

        Ok(ids)
    }

    async fn admin_actions_for_user(&self, user_id: Uuid) -> Result<Vec<AdminAction>> {
        let actions = sqlx::query_as::<_, AdminAction>(&format!(
            r#"
            SELECT {ADMIN_ACTION_COLUMNS}
            FROM admin_actions
            WHERE target_user_id = $1
            ORDER BY created_at DESC
            "#
        ))
        .bind(user_id)
        .fetch_all(&*self.pool)
        .await?;

        Ok(actions)
    }
}
