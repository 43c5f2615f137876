use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use kekspay_engine::{
    db_types::{OrderId, META_PAYMENT_STATUS},
    OrderStoreError,
};
use serde_json::Value;

use super::{
    helpers::{gateway_api, nonce_issuer, order, send_request, settings},
    mocks::MockStore,
};
use crate::{
    data_objects::{StatusCheckForm, STATUS_CHECK_ACTION},
    routes::StatusCheckRoute,
};

#[actix_web::test]
async fn pending_order_has_no_redirect() {
    let _ = env_logger::try_init().ok();
    let (status, body) = check_status("1001", valid_nonce("1001"), store_with_status(Some("pending"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"status":"pending"}"#);
}

#[actix_web::test]
async fn unset_status_reads_as_pending() {
    let _ = env_logger::try_init().ok();
    let (status, body) = check_status("1001", valid_nonce("1001"), store_with_status(None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"status":"pending"}"#);
}

#[actix_web::test]
async fn approved_order_redirects_to_order_received() {
    let _ = env_logger::try_init().ok();
    let (status, body) = check_status("1001", valid_nonce("1001"), store_with_status(Some("approved"))).await;
    assert_eq!(status, StatusCode::OK);
    let res: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(res["status"], "approved");
    assert_eq!(res["redirect"], "https://shop.example/checkout/order-received/1001");
}

#[actix_web::test]
async fn awaiting_approval_redirects_to_order_received() {
    let _ = env_logger::try_init().ok();
    let (_, body) = check_status("1001", valid_nonce("1001"), store_with_status(Some("pending_approval"))).await;
    let res: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(res["status"], "pending_approval");
    assert_eq!(res["redirect"], "https://shop.example/checkout/order-received/1001");
}

#[actix_web::test]
async fn declined_order_redirects_to_cancel_page() {
    let _ = env_logger::try_init().ok();
    let (status, body) = check_status("1001", valid_nonce("1001"), store_with_status(Some("declined"))).await;
    assert_eq!(status, StatusCode::OK);
    let res: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(res["status"], "declined");
    assert_eq!(res["redirect"], "https://shop.example/cart/?cancel_order=1001");
}

#[actix_web::test]
async fn invalid_nonce_is_forbidden() {
    let _ = env_logger::try_init().ok();
    // The store is never consulted
    let (status, body) = check_status("1001", "not-a-nonce".into(), MockStore::new()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let res: Value = serde_json::from_str(&body).unwrap();
    assert!(res.get("status").is_none());
    assert!(res.get("redirect").is_none());
}

#[actix_web::test]
async fn nonce_is_bound_to_its_order() {
    let _ = env_logger::try_init().ok();
    let (status, _) = check_status("1002", valid_nonce("1001"), MockStore::new()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn missing_nonce_is_forbidden() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::post().uri("/ajax").set_form(vec![("action", STATUS_CHECK_ACTION), ("order_id", "1001")]);
    let (status, _) = send_request(req, configure(MockStore::new())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn unknown_action_is_rejected() {
    let _ = env_logger::try_init().ok();
    let form = StatusCheckForm { action: "something_else".into(), nonce: valid_nonce("1001"), order_id: "1001".into() };
    let req = TestRequest::post().uri("/ajax").set_form(form);
    let (status, body) = send_request(req, configure(MockStore::new())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Unknown action"), "was: {body}");
}

#[actix_web::test]
async fn unknown_order_is_not_found() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store.expect_fetch_order().returning(|_| Ok(None));
    let (status, _) = check_status("404", valid_nonce("404"), store).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn backend_failures_are_server_errors() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store.expect_fetch_order().returning(|_| Err(OrderStoreError::DatabaseError("database is locked".into())));
    let (status, _) = check_status("1001", valid_nonce("1001"), store).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

fn valid_nonce(order_id: &str) -> String {
    nonce_issuer().issue(STATUS_CHECK_ACTION, order_id)
}

/// A store holding order 1001 with the given raw status. Only reads are expected; any write panics.
fn store_with_status(value: Option<&'static str>) -> MockStore {
    let mut store = MockStore::new();
    store.expect_fetch_order().times(1).returning(|id: &OrderId| Ok(Some(order(id.as_str()))));
    store.expect_get_meta().times(1).returning(move |_, key| {
        assert_eq!(key, META_PAYMENT_STATUS);
        Ok(value.map(String::from))
    });
    store
}

async fn check_status(order_id: &str, nonce: String, store: MockStore) -> (StatusCode, String) {
    let form = StatusCheckForm { action: STATUS_CHECK_ACTION.into(), nonce, order_id: order_id.into() };
    let req = TestRequest::post().uri("/ajax").set_form(form);
    send_request(req, configure(store)).await
}

fn configure(store: MockStore) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.service(StatusCheckRoute::<MockStore>::new())
            .app_data(web::Data::new(gateway_api(store, settings())))
            .app_data(web::Data::new(nonce_issuer()));
    }
}
