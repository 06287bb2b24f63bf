//! Moderation and operations endpoints. Routed behind the platform's admin
//! gateway; callers still authenticate like any other user.

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::ServiceError;
use crate::http::{ApiResponse, AuthenticatedUser};
use crate::services::TrustSafetyService;

#[derive(Debug, Deserialize)]
pub struct ToggleRulePayload {
    pub is_active: bool,
}

/// GET /api/admin/flagging/rules
pub async fn list_rules(
    _user: AuthenticatedUser,
    service: web::Data<Arc<TrustSafetyService>>,
) -> Result<HttpResponse, ServiceError> {
    Ok(HttpResponse::Ok().json(ApiResponse::ok(service.rules())))
}

/// PATCH /api/admin/flagging/rules/{rule_id}
///
/// Toggling an unknown rule id is a no-op and still returns success, with no
/// rule in the body.
pub async fn toggle_rule(
    _user: AuthenticatedUser,
    service: web::Data<Arc<TrustSafetyService>>,
    path: web::Path<String>,
    payload: web::Json<ToggleRulePayload>,
) -> Result<HttpResponse, ServiceError> {
    let rule = service.set_rule_active(&path.into_inner(), payload.is_active);

    Ok(HttpResponse::Ok().json(ApiResponse::ok(rule)))
}

/// POST /api/admin/flagging/run
pub async fn run_flagging(
    _user: AuthenticatedUser,
    service: web::Data<Arc<TrustSafetyService>>,
) -> Result<HttpResponse, ServiceError> {
    let summary = service.run_automated_flagging().await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(summary)))
}

/// POST /api/admin/users/{id}/trust-score
pub async fn recompute_trust_score(
    _user: AuthenticatedUser,
    service: web::Data<Arc<TrustSafetyService>>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ServiceError> {
    let user_id = path.into_inner();
    let trust_score = service.update_user_trust_score(user_id).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(serde_json::json!({
        "user_id": user_id,
        "trust_score": trust_score,
    }))))
}
