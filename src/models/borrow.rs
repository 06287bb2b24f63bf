use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Lifecycle status of a borrow request.
///
/// `approve` moves a pending request straight to `Active`: lender confirmation
/// is part of approval, so there is no intermediate approved-but-not-picked-up
/// status. `Returned`, `Declined` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "borrow_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BorrowStatus {
    Pending,
    Active,
    Returned,
    Declined,
    Cancelled,
}

impl BorrowStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BorrowStatus::Pending => "pending",
            BorrowStatus::Active => "active",
            BorrowStatus::Returned => "returned",
            BorrowStatus::Declined => "declined",
            BorrowStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BorrowStatus::Returned | BorrowStatus::Declined | BorrowStatus::Cancelled
        )
    }

    /// Status-level transition table. Returns the resulting status when
    /// `action` is legal from `self`, independent of who is asking; role
    /// restrictions are enforced separately and first.
    pub fn transition(&self, action: BorrowAction) -> Option<BorrowStatus> {
        match (self, action) {
            (BorrowStatus::Pending, BorrowAction::Approve) => Some(BorrowStatus::Active),
            (BorrowStatus::Pending, BorrowAction::Decline) => Some(BorrowStatus::Declined),
            (BorrowStatus::Pending, BorrowAction::Cancel) => Some(BorrowStatus::Cancelled),
            (BorrowStatus::Active, BorrowAction::Return) => Some(BorrowStatus::Returned),
            (BorrowStatus::Active, BorrowAction::Cancel) => Some(BorrowStatus::Cancelled),
            // Lender acknowledgment of a completed return; status-preserving.
            (BorrowStatus::Returned, BorrowAction::ConfirmReturn) => Some(BorrowStatus::Returned),
            _ => None,
        }
    }
}

/// The five recognized actions on a borrow request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BorrowAction {
    Approve,
    Decline,
    Return,
    Cancel,
    ConfirmReturn,
}

impl BorrowAction {
    pub const VALID_ACTIONS: [&'static str; 5] =
        ["approve", "decline", "return", "cancel", "confirm-return"];

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "approve" => Some(BorrowAction::Approve),
            "decline" => Some(BorrowAction::Decline),
            "return" => Some(BorrowAction::Return),
            "cancel" => Some(BorrowAction::Cancel),
            "confirm-return" => Some(BorrowAction::ConfirmReturn),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BorrowAction::Approve => "approve",
            BorrowAction::Decline => "decline",
            BorrowAction::Return => "return",
            BorrowAction::Cancel => "cancel",
            BorrowAction::ConfirmReturn => "confirm-return",
        }
    }
}

/// Which side of a borrow request a user is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartyRole {
    Borrower,
    Lender,
}

/// A borrow transaction between a borrower and an item's owner.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BorrowRequest {
    pub id: Uuid,
    pub item_id: Uuid,
    pub borrower_id: Uuid,
    pub lender_id: Uuid,
    pub status: BorrowStatus,
    pub request_message: Option<String>,
    pub lender_message: Option<String>,
    pub requested_return_date: DateTime<Utc>,
    pub actual_return_date: Option<DateTime<Utc>>,
    pub approved_at: Option<DateTime<Utc>>,
    pub returned_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl BorrowRequest {
    /// Role of `user_id` on this request, or None for a non-party.
    pub fn party_role(&self, user_id: Uuid) -> Option<PartyRole> {
        if user_id == self.borrower_id {
            Some(PartyRole::Borrower)
        } else if user_id == self.lender_id {
            Some(PartyRole::Lender)
        } else {
            None
        }
    }
}

/// Input for creating a new borrow request. The lender is always resolved
/// from the item's owner at creation time.
#[derive(Debug)]
pub struct NewBorrowRequest {
    pub item_id: Uuid,
    pub borrower_id: Uuid,
    pub lender_id: Uuid,
    pub request_message: Option<String>,
    pub requested_return_date: DateTime<Utc>,
}

/// Field updates applied by a state transition. `None` leaves a field as is.
#[derive(Debug, Default, Clone)]
pub struct BorrowRequestChanges {
    pub status: Option<BorrowStatus>,
    pub lender_message: Option<String>,
    pub requested_return_date: Option<DateTime<Utc>>,
    pub approved_at: Option<DateTime<Utc>>,
    pub returned_at: Option<DateTime<Utc>>,
    pub actual_return_date: Option<DateTime<Utc>>,
}

impl BorrowRequestChanges {
    pub fn apply(&self, request: &mut BorrowRequest) {
        if let Some(status) = self.status {
            request.status = status;
        }
        if let Some(ref message) = self.lender_message {
            request.lender_message = Some(message.clone());
        }
        if let Some(date) = self.requested_return_date {
            request.requested_return_date = date;
        }
        if let Some(at) = self.approved_at {
            request.approved_at = Some(at);
        }
        if let Some(at) = self.returned_at {
            request.returned_at = Some(at);
        }
        if let Some(at) = self.actual_return_date {
            request.actual_return_date = Some(at);
        }
    }
}
