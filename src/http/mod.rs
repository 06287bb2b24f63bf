//! REST surface consumed by the web application and the moderation dashboard.

pub mod admin;
pub mod auth;
pub mod borrow_requests;

use actix_web::web;
use serde::Serialize;

pub use auth::AuthenticatedUser;

/// API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(
                web::resource("/borrow-requests")
                    .route(web::post().to(borrow_requests::create_borrow_request)),
            )
            .service(
                web::resource("/borrow-requests/{id}")
                    .route(web::get().to(borrow_requests::get_borrow_request))
                    .route(web::patch().to(borrow_requests::mutate_borrow_request)),
            )
            .service(
                web::resource("/admin/flagging/rules").route(web::get().to(admin::list_rules)),
            )
            .service(
                web::resource("/admin/flagging/rules/{rule_id}")
                    .route(web::patch().to(admin::toggle_rule)),
            )
            .service(web::resource("/admin/flagging/run").route(web::post().to(admin::run_flagging)))
            .service(
                web::resource("/admin/users/{id}/trust-score")
                    .route(web::post().to(admin::recompute_trust_score)),
            ),
    );
}
