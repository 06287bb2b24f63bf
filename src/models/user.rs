use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// User record with reputation and suspension state.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub display_name: Option<String>,
    pub trust_score: i32,
    pub warning_count: i32,
    pub suspension_count: i32,
    pub is_suspended: bool,
    pub suspension_ends_at: Option<DateTime<Utc>>,
    pub last_suspension_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a new user
#[derive(Debug)]
pub struct NewUser {
    pub email: String,
    pub display_name: Option<String>,
}
