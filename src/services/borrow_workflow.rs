//! Borrow-request workflow: creation, fetch and state transitions.
//!
//! Mutations validate in a fixed order: the request must exist, the caller
//! must be a party to it, the action must be recognized, the caller's role
//! must permit the action, and the current status must allow the transition.
//! Only then is the guarded update applied and a notification dispatched.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::Store;
use crate::error::{Result, ServiceError};
use crate::models::{
    BorrowAction, BorrowRequest, BorrowRequestChanges, BorrowStatus, NewBorrowRequest, PartyRole,
};
use crate::services::notifier::{BorrowEvent, NotificationDispatcher};

/// Input for a new borrow request.
#[derive(Debug)]
pub struct CreateBorrowInput {
    pub item_id: Uuid,
    pub message: Option<String>,
    pub requested_return_date: DateTime<Utc>,
}

/// Optional parameters carried by a transition action.
#[derive(Debug, Default)]
pub struct ActionParams {
    pub message: Option<String>,
    pub return_date: Option<DateTime<Utc>>,
}

pub struct BorrowService {
    store: Arc<dyn Store>,
    notifier: Arc<dyn NotificationDispatcher>,
}

impl BorrowService {
    pub fn new(store: Arc<dyn Store>, notifier: Arc<dyn NotificationDispatcher>) -> Self {
        Self { store, notifier }
    }

    /// Create a pending request for an item on behalf of `borrower_id`. The
    /// lender is the item's owner at creation time.
    pub async fn create_request(
        &self,
        borrower_id: Uuid,
        input: CreateBorrowInput,
    ) -> Result<BorrowRequest> {
        let item = self
            .store
            .find_item(input.item_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("item".to_string()))?;

        if item.owner_id == borrower_id {
            return Err(ServiceError::Validation(
                "you cannot borrow your own item".to_string(),
            ));
        }
        if input.requested_return_date <= Utc::now() {
            return Err(ServiceError::Validation(
                "return date must be in the future".to_string(),
            ));
        }
        if self.store.item_has_active_loan(item.id).await? {
            return Err(ServiceError::Validation(
                "item is currently on loan".to_string(),
            ));
        }

        let request = self
            .store
            .create_borrow_request(NewBorrowRequest {
                item_id: item.id,
                borrower_id,
                lender_id: item.owner_id,
                request_message: input.message,
                requested_return_date: input.requested_return_date,
            })
            .await?;

        self.notify(BorrowEvent::Requested, &request).await;

        Ok(request)
    }

    /// Fetch a request. Callers who are not a party to it are rejected
    /// before any request data is exposed.
    pub async fn get_request(&self, caller: Uuid, request_id: Uuid) -> Result<BorrowRequest> {
        let request = self
            .store
            .find_borrow_request(request_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("borrow request".to_string()))?;

        request
            .party_role(caller)
            .ok_or_else(|| ServiceError::Forbidden("access denied".to_string()))?;

        Ok(request)
    }

    /// Validate and apply a transition on behalf of `caller`. `action` is
    /// the raw action name as submitted.
    pub async fn apply_action(
        &self,
        caller: Uuid,
        request_id: Uuid,
        action: &str,
        params: ActionParams,
    ) -> Result<BorrowRequest> {
        let request = self
            .store
            .find_borrow_request(request_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("borrow request".to_string()))?;

        let role = request
            .party_role(caller)
            .ok_or_else(|| ServiceError::Forbidden("access denied".to_string()))?;

        let action = BorrowAction::parse(action).ok_or_else(|| ServiceError::InvalidAction {
            action: action.to_string(),
            valid: BorrowAction::VALID_ACTIONS.join(", "),
        })?;

        check_role(role, action, request.status)?;

        let next = request
            .status
            .transition(action)
            .ok_or_else(|| invalid_transition(action, request.status))?;

        let changes = build_changes(action, next, &params);
        let updated = self
            .store
            .update_borrow_request(request.id, request.status, changes)
            .await?;

        let updated = match updated {
            Some(updated) => updated,
            None => {
                // Lost a race with a concurrent transition: report the
                // status that won.
                let current = self
                    .store
                    .find_borrow_request(request.id)
                    .await?
                    .ok_or_else(|| ServiceError::NotFound("borrow request".to_string()))?;
                return Err(invalid_transition(action, current.status));
            }
        };

        tracing::info!(
            request_id = %updated.id,
            action = action.as_str(),
            status = updated.status.as_str(),
            "Borrow request transition applied"
        );

        self.notify(event_for(action), &updated).await;

        Ok(updated)
    }

    /// Best-effort dispatch: a failed or slow notification never changes the
    /// outcome of the operation that triggered it.
    async fn notify(&self, event: BorrowEvent, request: &BorrowRequest) {
        if let Err(e) = self.notifier.dispatch(event, request).await {
            tracing::warn!(
                request_id = %request.id,
                event = event.as_str(),
                error = %e,
                "Notification dispatch failed"
            );
        }
    }
}

fn invalid_transition(action: BorrowAction, status: BorrowStatus) -> ServiceError {
    ServiceError::InvalidTransition {
        action: action.as_str().to_string(),
        status: status.as_str().to_string(),
    }
}

fn check_role(role: PartyRole, action: BorrowAction, status: BorrowStatus) -> Result<()> {
    match action {
        BorrowAction::Approve => require_lender(role, "only the item owner can approve requests"),
        BorrowAction::Decline => require_lender(role, "only the item owner can decline requests"),
        BorrowAction::ConfirmReturn => {
            require_lender(role, "only the item owner can confirm a return")
        }
        BorrowAction::Return => {
            if role == PartyRole::Borrower {
                Ok(())
            } else {
                Err(ServiceError::Forbidden(
                    "only the borrower can mark an item returned".to_string(),
                ))
            }
        }
        BorrowAction::Cancel => {
            if role == PartyRole::Lender && status != BorrowStatus::Pending {
                Err(ServiceError::Forbidden(
                    "lenders can only cancel pending requests".to_string(),
                ))
            } else {
                Ok(())
            }
        }
    }
}

fn require_lender(role: PartyRole, message: &str) -> Result<()> {
    if role == PartyRole::Lender {
        Ok(())
    } else {
        Err(ServiceError::Forbidden(message.to_string()))
    }
}

fn build_changes(
    action: BorrowAction,
    next: BorrowStatus,
    params: &ActionParams,
) -> BorrowRequestChanges {
    let now = Utc::now();
    let mut changes = BorrowRequestChanges {
        status: Some(next),
        ..Default::default()
    };

    match action {
        BorrowAction::Approve => {
            changes.approved_at = Some(now);
            changes.lender_message = params.message.clone();
            changes.requested_return_date = params.return_date;
        }
        BorrowAction::Decline => {
            changes.lender_message = params.message.clone();
        }
        BorrowAction::Return => {
            changes.returned_at = Some(now);
            changes.actual_return_date = Some(now);
        }
        BorrowAction::Cancel | BorrowAction::ConfirmReturn => {}
    }

    changes
}

fn event_for(action: BorrowAction) -> BorrowEvent {
    match action {
        BorrowAction::Approve => BorrowEvent::Approved,
        BorrowAction::Decline => BorrowEvent::Declined,
        BorrowAction::Return => BorrowEvent::Returned,
        BorrowAction::Cancel => BorrowEvent::Cancelled,
        BorrowAction::ConfirmReturn => BorrowEvent::ReturnConfirmed,
    }
}
