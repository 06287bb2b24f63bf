//! Handler-level behavior: identity extraction, status codes and response
//! bodies.

mod common;

use actix_web::{test, web, App};
use chrono::{Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

use common::{borrow_request, item, user};
use lending_trust_service::db::{MemoryStore, Store};
use lending_trust_service::http;
use lending_trust_service::models::BorrowStatus;
use lending_trust_service::services::{BorrowService, NoopNotifier, TrustSafetyService};

struct TestApp {
    store: Arc<MemoryStore>,
    safety: Arc<TrustSafetyService>,
    borrow: Arc<BorrowService>,
}

async fn test_app() -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let safety = Arc::new(common::safety_service(&store).await);
    let borrow = Arc::new(BorrowService::new(
        store.clone() as Arc<dyn Store>,
        Arc::new(NoopNotifier),
    ));
    TestApp {
        store,
        safety,
        borrow,
    }
}

macro_rules! init_service {
    ($app:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($app.safety.clone()))
                .app_data(web::Data::new($app.borrow.clone()))
                .configure(http::configure),
        )
        .await
    };
}

#[actix_rt::test]
async fn missing_identity_is_unauthorized() {
    let app = test_app().await;
    let service = init_service!(app);

    let req = test::TestRequest::get()
        .uri(&format!("/api/borrow-requests/{}", Uuid::new_v4()))
        .to_request();
    let resp = test::call_service(&service, req).await;
    assert_eq!(resp.status(), 401);
}

#[actix_rt::test]
async fn malformed_identity_is_rejected_distinctly() {
    let app = test_app().await;
    let service = init_service!(app);

    let req = test::TestRequest::get()
        .uri(&format!("/api/borrow-requests/{}", Uuid::new_v4()))
        .insert_header(("x-user-id", "not-a-valid-id"))
        .to_request();
    let resp = test::call_service(&service, req).await;
    assert_eq!(resp.status(), 401);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("invalid session"));
}

#[actix_rt::test]
async fn unknown_request_is_not_found() {
    let app = test_app().await;
    let service = init_service!(app);

    let req = test::TestRequest::get()
        .uri(&format!("/api/borrow-requests/{}", Uuid::new_v4()))
        .insert_header(("x-user-id", Uuid::new_v4().to_string()))
        .to_request();
    let resp = test::call_service(&service, req).await;
    assert_eq!(resp.status(), 404);
}

#[actix_rt::test]
async fn non_party_gets_access_denied_without_party_data() {
    let app = test_app().await;

    let borrower = user("borrower@example.com");
    let lender = user("owner@example.com");
    let outsider = user("outsider@example.com");
    app.store.insert_user(borrower.clone());
    app.store.insert_user(lender.clone());
    app.store.insert_user(outsider.clone());
    let tool = item(lender.id, "Wheelbarrow");
    app.store.insert_item(tool.clone());
    let request = borrow_request(tool.id, borrower.id, lender.id, BorrowStatus::Pending);
    app.store.insert_borrow_request(request.clone());

    let service = init_service!(app);

    let req = test::TestRequest::get()
        .uri(&format!("/api/borrow-requests/{}", request.id))
        .insert_header(("x-user-id", outsider.id.to_string()))
        .to_request();
    let resp = test::call_service(&service, req).await;
    assert_eq!(resp.status(), 403);

    let body = test::read_body(resp).await;
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("access denied"));
    // No personal data of either party leaks into the refusal.
    assert!(!text.contains("owner@example.com"));
    assert!(!text.contains("borrower@example.com"));
    assert!(!text.contains(&lender.id.to_string()));
}

#[actix_rt::test]
async fn invalid_action_is_a_bad_request_listing_the_valid_set() {
    let app = test_app().await;

    let borrower = user("borrower@example.com");
    let lender = user("owner@example.com");
    app.store.insert_user(borrower.clone());
    app.store.insert_user(lender.clone());
    let tool = item(lender.id, "Air compressor");
    app.store.insert_item(tool.clone());
    let request = borrow_request(tool.id, borrower.id, lender.id, BorrowStatus::Pending);
    app.store.insert_borrow_request(request.clone());

    let service = init_service!(app);

    let req = test::TestRequest::patch()
        .uri(&format!("/api/borrow-requests/{}", request.id))
        .insert_header(("x-user-id", lender.id.to_string()))
        .set_json(serde_json::json!({ "action": "borrow-forever" }))
        .to_request();
    let resp = test::call_service(&service, req).await;
    assert_eq!(resp.status(), 400);

    let body: serde_json::Value = test::read_body_json(resp).await;
    let error = body["error"].as_str().unwrap();
    assert!(error.contains("confirm-return"));
    assert!(error.contains("approve"));
}

#[actix_rt::test]
async fn invalid_transition_is_a_conflict_naming_the_status() {
    let app = test_app().await;

    let borrower = user("borrower@example.com");
    let lender = user("owner@example.com");
    app.store.insert_user(borrower.clone());
    app.store.insert_user(lender.clone());
    let tool = item(lender.id, "Projector");
    app.store.insert_item(tool.clone());
    let request = borrow_request(tool.id, borrower.id, lender.id, BorrowStatus::Declined);
    app.store.insert_borrow_request(request.clone());

    let service = init_service!(app);

    let req = test::TestRequest::patch()
        .uri(&format!("/api/borrow-requests/{}", request.id))
        .insert_header(("x-user-id", lender.id.to_string()))
        .set_json(serde_json::json!({ "action": "approve" }))
        .to_request();
    let resp = test::call_service(&service, req).await;
    assert_eq!(resp.status(), 409);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert!(body["error"].as_str().unwrap().contains("declined"));
}

#[actix_rt::test]
async fn lender_approves_over_http() {
    let app = test_app().await;

    let borrower = user("borrower@example.com");
    let lender = user("owner@example.com");
    app.store.insert_user(borrower.clone());
    app.store.insert_user(lender.clone());
    let tool = item(lender.id, "Belt sander");
    app.store.insert_item(tool.clone());
    let request = borrow_request(tool.id, borrower.id, lender.id, BorrowStatus::Pending);
    app.store.insert_borrow_request(request.clone());

    let service = init_service!(app);

    let req = test::TestRequest::patch()
        .uri(&format!("/api/borrow-requests/{}", request.id))
        .insert_header(("x-user-id", lender.id.to_string()))
        .set_json(serde_json::json!({ "action": "approve", "message": "Sure!" }))
        .to_request();
    let resp = test::call_service(&service, req).await;
    assert_eq!(resp.status(), 200);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "active");
    assert_eq!(body["data"]["lender_message"], "Sure!");
}

#[actix_rt::test]
async fn borrower_creates_a_request_over_http() {
    let app = test_app().await;

    let borrower = user("borrower@example.com");
    let lender = user("owner@example.com");
    app.store.insert_user(borrower.clone());
    app.store.insert_user(lender.clone());
    let tool = item(lender.id, "Post hole digger");
    app.store.insert_item(tool.clone());

    let service = init_service!(app);

    let req = test::TestRequest::post()
        .uri("/api/borrow-requests")
        .insert_header(("x-user-id", borrower.id.to_string()))
        .set_json(serde_json::json!({
            "item_id": tool.id,
            "message": "Digging fence posts on Saturday",
            "requested_return_date": (Utc::now() + Duration::days(5)).to_rfc3339(),
        }))
        .to_request();
    let resp = test::call_service(&service, req).await;
    assert_eq!(resp.status(), 201);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["status"], "pending");
    assert_eq!(body["data"]["lender_id"], lender.id.to_string());
}

#[actix_rt::test]
async fn admin_can_list_and_toggle_rules() {
    let app = test_app().await;
    let service = init_service!(app);

    let admin_id = Uuid::new_v4().to_string();

    let req = test::TestRequest::get()
        .uri("/api/admin/flagging/rules")
        .insert_header(("x-user-id", admin_id.clone()))
        .to_request();
    let resp = test::call_service(&service, req).await;
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = test::read_body_json(resp).await;
    let rules = body["data"].as_array().unwrap();
    assert_eq!(rules.len(), 4);
    assert_eq!(rules[0]["id"], "multiple_failed_returns");

    let req = test::TestRequest::patch()
        .uri("/api/admin/flagging/rules/trust_score_threshold")
        .insert_header(("x-user-id", admin_id.clone()))
        .set_json(serde_json::json!({ "is_active": false }))
        .to_request();
    let resp = test::call_service(&service, req).await;
    assert_eq!(resp.status(), 200);

    let disabled = app
        .safety
        .rules()
        .into_iter()
        .find(|r| r.kind.id() == "trust_score_threshold")
        .unwrap();
    assert!(!disabled.is_active);

    // Unknown rule ids are ignored rather than erroring.
    let req = test::TestRequest::patch()
        .uri("/api/admin/flagging/rules/no_such_rule")
        .insert_header(("x-user-id", admin_id))
        .set_json(serde_json::json!({ "is_active": false }))
        .to_request();
    let resp = test::call_service(&service, req).await;
    assert_eq!(resp.status(), 200);
}

#[actix_rt::test]
async fn admin_recomputes_a_trust_score() {
    let app = test_app().await;

    let mut member = user("member@example.com");
    member.warning_count = 2;
    app.store.insert_user(member.clone());

    let service = init_service!(app);

    let req = test::TestRequest::post()
        .uri(&format!("/api/admin/users/{}/trust-score", member.id))
        .insert_header(("x-user-id", Uuid::new_v4().to_string()))
        .to_request();
    let resp = test::call_service(&service, req).await;
    assert_eq!(resp.status(), 200);

    let body: serde_json::Value = test::read_body_json(resp).await;
    // 1000 - 2 * 100
    assert_eq!(body["data"]["trust_score"], 800);
    assert_eq!(app.store.user(member.id).unwrap().trust_score, 800);
}
