use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use kekspay_engine::db_types::{OrderId, PaymentStatus, Settlement, SettlementResult};
use serde_json::json;

use super::{
    helpers::{gateway_api, order, send_request, settings, SECRET_KEY, TID},
    mocks::MockStore,
};
use crate::{helpers::calculate_hmac, routes::WebhookRoute, webhook_auth::SIGNATURE_HEADER};

const ACK: &str = r#"{"status":0,"message":"Accepted"}"#;

#[actix_web::test]
async fn approved_notification_settles_the_order() {
    let _ = env_logger::try_init().ok();
    let body = notification("1001", 0, "K-100", TID);
    let mut store = store_with_order();
    store.expect_apply_settlement().times(1).returning(|s: Settlement| {
        assert_eq!(s.order_id, OrderId::from("1001"));
        assert_eq!(s.status, PaymentStatus::Approved);
        assert_eq!(s.keks_id, "K-100");
        assert!(s.note.contains("approved"), "was: {}", s.note);
        Ok(SettlementResult::Applied(order("1001")))
    });
    let (status, res) = post_notification(body, Some(SECRET_KEY), store).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(res, ACK);
}

#[actix_web::test]
async fn failed_payment_declines_the_order() {
    let _ = env_logger::try_init().ok();
    let body = notification("1001", 3, "K-101", TID);
    let mut store = store_with_order();
    store.expect_apply_settlement().times(1).returning(|s: Settlement| {
        assert_eq!(s.status, PaymentStatus::Declined);
        Ok(SettlementResult::Applied(order("1001")))
    });
    let (status, res) = post_notification(body, Some(SECRET_KEY), store).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(res, ACK);
}

#[actix_web::test]
async fn repeated_notification_is_acknowledged() {
    let _ = env_logger::try_init().ok();
    let body = notification("1001", 0, "K-100", TID);
    let mut store = store_with_order();
    store.expect_apply_settlement().times(1).returning(|_| Ok(SettlementResult::Duplicate));
    let (status, res) = post_notification(body, Some(SECRET_KEY), store).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(res, ACK);
}

#[actix_web::test]
async fn forged_notification_is_rejected() {
    let _ = env_logger::try_init().ok();
    // No store expectations: nothing may be read or written
    let body = notification("1001", 0, "K-100", TID);
    let (status, res) = post_notification(body, Some("not-the-secret"), MockStore::new()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(res.contains("could not be authenticated"), "was: {res}");
}

#[actix_web::test]
async fn unsigned_notification_is_rejected() {
    let _ = env_logger::try_init().ok();
    let body = notification("1001", 0, "K-100", TID);
    let (status, _) = post_notification(body, None, MockStore::new()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn notification_for_another_terminal_is_forbidden() {
    let _ = env_logger::try_init().ok();
    let body = notification("1001", 0, "K-100", "P99999");
    let (status, res) = post_notification(body, Some(SECRET_KEY), MockStore::new()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(res.contains("P99999"), "was: {res}");
}

#[actix_web::test]
async fn notification_for_unknown_order_is_not_found() {
    let _ = env_logger::try_init().ok();
    let body = notification("404", 0, "K-100", TID);
    let mut store = MockStore::new();
    store.expect_fetch_order().returning(|_| Ok(None));
    let (status, _) = post_notification(body, Some(SECRET_KEY), store).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn malformed_notification_is_a_bad_request() {
    let _ = env_logger::try_init().ok();
    let body = b"bill_id=1001&status=0".to_vec();
    let (status, _) = post_notification(body, Some(SECRET_KEY), MockStore::new()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

fn notification(bill_id: &str, status: i64, keks_id: &str, tid: &str) -> Vec<u8> {
    let message = if status == 0 { "Success" } else { "Payment failed" };
    json!({
        "bill_id": bill_id,
        "status": status,
        "message": message,
        "keks_id": keks_id,
        "tid": tid,
        "amount": 125.5,
    })
    .to_string()
    .into_bytes()
}

fn store_with_order() -> MockStore {
    let mut store = MockStore::new();
    store.expect_fetch_order().times(1).returning(|id: &OrderId| Ok(Some(order(id.as_str()))));
    store
}

/// Posts the notification, signed with `key` if one is given.
async fn post_notification(body: Vec<u8>, key: Option<&str>, store: MockStore) -> (StatusCode, String) {
    let mut req = TestRequest::post().uri("/webhook").insert_header(("Content-Type", "application/json"));
    if let Some(key) = key {
        req = req.insert_header((SIGNATURE_HEADER, calculate_hmac(key, &body)));
    }
    send_request(req.set_payload(body), configure(store)).await
}

fn configure(store: MockStore) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.service(web::scope("/webhook").service(WebhookRoute::<MockStore>::new()))
            .app_data(web::Data::new(gateway_api(store, settings())));
    }
}
