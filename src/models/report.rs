use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "report_reason", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ReportReason {
    SafetyConcern,
    Harassment,
    Spam,
    ItemDamage,
    NoShow,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "report_priority", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ReportPriority {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "report_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Pending,
    UnderReview,
    Resolved,
    Dismissed,
}

/// A flag raised against a user, either by another user or by the automated
/// flagging engine (in which case `evidence` carries the rule id and flag
/// timestamp and the reporter is the system identity).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserReport {
    pub id: Uuid,
    pub reporter_id: Uuid,
    pub reported_id: Uuid,
    pub reason: ReportReason,
    pub description: String,
    pub priority: ReportPriority,
    pub status: ReportStatus,
    pub evidence: Option<serde_json::Value>,
    pub reviewed_by: Option<Uuid>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub resolution: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a new report
#[derive(Debug)]
pub struct NewReport {
    pub reporter_id: Uuid,
    pub reported_id: Uuid,
    pub reason: ReportReason,
    pub description: String,
    pub priority: ReportPriority,
    pub evidence: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "admin_action_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AdminActionType {
    UserSuspension,
    UserReinstatement,
    UserWarning,
}

/// Audit record for an administrative mutation. Written once, never updated.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AdminAction {
    pub id: Uuid,
    pub action_type: AdminActionType,
    pub description: String,
    pub reason: String,
    pub admin_id: Uuid,
    pub target_user_id: Uuid,
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a new admin action
#[derive(Debug)]
pub struct NewAdminAction {
    pub action_type: AdminActionType,
    pub description: String,
    pub reason: String,
    pub admin_id: Uuid,
    pub target_user_id: Uuid,
    pub metadata: Option<serde_json::Value>,
}
