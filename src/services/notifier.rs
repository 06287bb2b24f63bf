use async_trait::async_trait;
use serde::Serialize;

use crate::error::{Result, ServiceError};
use crate::models::BorrowRequest;

/// Lifecycle events emitted after a borrow-request transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BorrowEvent {
    Requested,
    Approved,
    Declined,
    Returned,
    Cancelled,
    ReturnConfirmed,
}

impl BorrowEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            BorrowEvent::Requested => "requested",
            BorrowEvent::Approved => "approved",
            BorrowEvent::Declined => "declined",
            BorrowEvent::Returned => "returned",
            BorrowEvent::Cancelled => "cancelled",
            BorrowEvent::ReturnConfirmed => "return_confirmed",
        }
    }
}

/// Delivery of borrow lifecycle events to the involved users. Implementations
/// may fail; callers treat delivery as best-effort and never let a failure
/// change the outcome of the transition that triggered it.
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn dispatch(&self, event: BorrowEvent, request: &BorrowRequest) -> Result<()>;
}

/// Posts events as JSON to the platform notification webhook.
pub struct WebhookNotifier {
    client: reqwest::Client,
    endpoint: String,
}

impl WebhookNotifier {
    pub fn new(endpoint: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
        }
    }
}

#[async_trait]
impl NotificationDispatcher for WebhookNotifier {
    async fn dispatch(&self, event: BorrowEvent, request: &BorrowRequest) -> Result<()> {
        let payload = serde_json::json!({
            "event": event,
            "request_id": request.id,
            "item_id": request.item_id,
            "borrower_id": request.borrower_id,
            "lender_id": request.lender_id,
            "status": request.status,
        });

        let response = self
            .client
            .post(&self.endpoint)
            .json(&payload)
            .send()
            .await
            .map_err(|e| ServiceError::Notification(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ServiceError::Notification(format!(
                "webhook returned {}",
                response.status()
            )));
        }

        tracing::debug!(
            event = event.as_str(),
            request_id = %request.id,
            "Notification delivered"
        );

        Ok(())
    }
}

/// Used when no webhook is configured; events are logged and dropped.
pub struct NoopNotifier;

#[async_trait]
impl NotificationDispatcher for NoopNotifier {
    async fn dispatch(&self, event: BorrowEvent, request: &BorrowRequest) -> Result<()> {
        tracing::debug!(
            event = event.as_str(),
            request_id = %request.id,
            "Notification dropped, no webhook configured"
        );
        Ok(())
    }
}
