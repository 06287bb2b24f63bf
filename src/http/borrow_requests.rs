//! Borrow-request endpoints.

use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::error::ServiceError;
use crate::http::{ApiResponse, AuthenticatedUser};
use crate::services::{ActionParams, BorrowService, CreateBorrowInput};

/// Request to create a borrow request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateBorrowRequestPayload {
    pub item_id: Uuid,
    #[validate(length(max = 1000))]
    pub message: Option<String>,
    pub requested_return_date: DateTime<Utc>,
}

/// Request to act on an existing borrow request
#[derive(Debug, Deserialize, Validate)]
pub struct BorrowActionPayload {
    pub action: String,
    #[validate(length(max = 1000))]
    pub message: Option<String>,
    pub return_date: Option<DateTime<Utc>>,
}

/// POST /api/borrow-requests
pub async fn create_borrow_request(
    user: AuthenticatedUser,
    service: web::Data<Arc<BorrowService>>,
    payload: web::Json<CreateBorrowRequestPayload>,
) -> Result<HttpResponse, ServiceError> {
    payload
        .validate()
        .map_err(|e| ServiceError::Validation(e.to_string()))?;

    let request = service
        .create_request(
            user.0,
            CreateBorrowInput {
                item_id: payload.item_id,
                message: payload.message.clone(),
                requested_return_date: payload.requested_return_date,
            },
        )
        .await?;

    Ok(HttpResponse::Created().json(ApiResponse::ok(request)))
}

/// GET /api/borrow-requests/{id}
pub async fn get_borrow_request(
    user: AuthenticatedUser,
    service: web::Data<Arc<BorrowService>>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ServiceError> {
    let request = service.get_request(user.0, path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(request)))
}

/// PATCH /api/borrow-requests/{id}
pub async fn mutate_borrow_request(
    user: AuthenticatedUser,
    service: web::Data<Arc<BorrowService>>,
    path: web::Path<Uuid>,
    payload: web::Json<BorrowActionPayload>,
) -> Result<HttpResponse, ServiceError> {
    payload
        .validate()
        .map_err(|e| ServiceError::Validation(e.to_string()))?;

    let request = service
        .apply_action(
            user.0,
            path.into_inner(),
            &payload.action,
            ActionParams {
                message: payload.message.clone(),
                return_date: payload.return_date,
            },
        )
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(request)))
}
