use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("authentication required")]
    Unauthenticated,

    #[error("invalid session: {0}")]
    MalformedSession(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("invalid action '{action}', valid actions are: {valid}")]
    InvalidAction { action: String, valid: String },

    #[error("cannot {action} a request with status '{status}'")]
    InvalidTransition { action: String, status: String },

    #[error("{0}")]
    Validation(String),

    #[error("storage error: {0}")]
    Database(String),

    #[error("notification delivery failed: {0}")]
    Notification(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl From<sqlx::Error> for ServiceError {
    fn from(e: sqlx::Error) -> Self {
        ServiceError::Database(e.to_string())
    }
}

impl ServiceError {
    /// Message safe to hand back to a caller. Dependency failures are reported
    /// generically; the detail goes to the log, never over the wire.
    fn public_message(&self) -> String {
        match self {
            ServiceError::Database(_)
            | ServiceError::Notification(_)
            | ServiceError::Config(_) => "internal error".to_string(),
            other => other.to_string(),
        }
    }
}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::Unauthenticated | ServiceError::MalformedSession(_) => {
                StatusCode::UNAUTHORIZED
            }
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Forbidden(_) => StatusCode::FORBIDDEN,
            ServiceError::InvalidAction { .. } | ServiceError::Validation(_) => {
                StatusCode::BAD_REQUEST
            }
            ServiceError::InvalidTransition { .. } => StatusCode::CONFLICT,
            ServiceError::Database(_)
            | ServiceError::Notification(_)
            | ServiceError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            ServiceError::Database(detail) => {
                tracing::error!(error = %detail, "storage failure");
            }
            ServiceError::Notification(detail) => {
                tracing::error!(error = %detail, "notification failure");
            }
            ServiceError::Config(detail) => {
                tracing::error!(error = %detail, "configuration failure");
            }
            _ => {}
        }

        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "success": false,
            "data": null,
            "error": self.public_message(),
        }))
    }
}

pub type Result<T> = std::result::Result<T, ServiceError>;
