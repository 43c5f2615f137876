use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use kekspay_engine::{
    db_types::{OrderId, PaymentStatus, META_TEST_MODE},
    gateway_api::settings::TEST_MODE_ORDER_NOTE,
    GatewaySettings,
    OrderStoreError,
};
use mockall::predicate::eq;

use super::{
    helpers::{gateway_api, nonce_issuer, order, send_request, settings},
    mocks::MockStore,
};
use crate::{
    data_objects::{ReceiptView, STATUS_CHECK_ACTION},
    routes::{ConfirmationRoute, ReceiptRoute},
};

#[actix_web::test]
async fn receipt_marks_order_as_pending() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store.expect_fetch_order().times(1).returning(|id: &OrderId| Ok(Some(order(id.as_str()))));
    store
        .expect_set_status_unless_terminal()
        .with(eq(OrderId::from("1001")), eq(PaymentStatus::Pending))
        .times(1)
        .returning(|_, _| Ok(true));
    let req = TestRequest::get().uri("/order/1001/receipt");
    let (status, body) = send_request(req, configure(store, settings())).await;
    assert_eq!(status, StatusCode::OK);
    let view: ReceiptView = serde_json::from_str(&body).unwrap();
    assert_eq!(view.order_id, OrderId::from("1001"));
    assert!(!view.test_mode);
    assert!(view.payment_url.starts_with("https://kekspay.hr/pay?"), "was: {}", view.payment_url);
    assert!(view.payment_url.contains("bill_id=1001"));
    assert!(view.qr_svg.contains("<svg"));
    assert_eq!(view.poll_interval_secs, 15);
    assert_eq!(view.poll_timeout_secs, 1800);
    // The poller can use the nonce straight away
    assert!(nonce_issuer().verify(&view.nonce, STATUS_CHECK_ACTION, "1001").is_ok());
}

#[actix_web::test]
async fn receipt_in_test_mode_flags_the_order() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store.expect_fetch_order().returning(|id: &OrderId| Ok(Some(order(id.as_str()))));
    store.expect_set_status_unless_terminal().times(1).returning(|_, _| Ok(true));
    store.expect_add_meta_if_absent().times(1).returning(|_, key, value| {
        assert_eq!(key, META_TEST_MODE);
        assert_eq!(value, "yes");
        Ok(true)
    });
    store.expect_add_order_note().times(1).returning(|_, note| {
        assert_eq!(note, TEST_MODE_ORDER_NOTE);
        Ok(())
    });
    let settings = GatewaySettings { test_mode: true, ..settings() };
    let (status, body) = send_request(TestRequest::get().uri("/order/1001/receipt"), configure(store, settings)).await;
    assert_eq!(status, StatusCode::OK);
    let view: ReceiptView = serde_json::from_str(&body).unwrap();
    assert!(view.test_mode);
    assert!(view.payment_url.starts_with("https://sandbox.kekspay.hr/pay?"), "was: {}", view.payment_url);
}

#[actix_web::test]
async fn refreshed_test_mode_receipt_adds_no_second_note() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store.expect_fetch_order().returning(|id: &OrderId| Ok(Some(order(id.as_str()))));
    store.expect_set_status_unless_terminal().times(1).returning(|_, _| Ok(true));
    // The flag was written when the page was first shown
    store.expect_add_meta_if_absent().times(1).returning(|_, _, _| Ok(false));
    let settings = GatewaySettings { test_mode: true, ..settings() };
    let (status, _) = send_request(TestRequest::get().uri("/order/1001/receipt"), configure(store, settings)).await;
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn receipt_keeps_a_settled_status() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store.expect_fetch_order().returning(|id: &OrderId| Ok(Some(order(id.as_str()))));
    // Already approved, so nothing is written
    store.expect_set_status_unless_terminal().times(1).returning(|_, _| Ok(false));
    let (status, _) = send_request(TestRequest::get().uri("/order/1001/receipt"), configure(store, settings())).await;
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn receipt_for_unknown_order_is_empty() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store.expect_fetch_order().returning(|_| Ok(None));
    let (status, body) = send_request(TestRequest::get().uri("/order/999/receipt"), configure(store, settings())).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_empty());
}

#[actix_web::test]
async fn receipt_is_hidden_when_gateway_is_unavailable() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store.expect_fetch_order().returning(|id: &OrderId| Ok(Some(order(id.as_str()))));
    let settings = GatewaySettings { tid: String::default(), ..settings() };
    let (status, _) = send_request(TestRequest::get().uri("/order/1001/receipt"), configure(store, settings)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[actix_web::test]
async fn confirmation_awaits_approval() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store
        .expect_set_status_unless_terminal()
        .with(eq(OrderId::from("1001")), eq(PaymentStatus::PendingApproval))
        .times(1)
        .returning(|_, _| Ok(true));
    let req = TestRequest::post().uri("/order/1001/confirmation");
    let (status, body) = send_request(req, configure(store, settings())).await;
    assert_eq!(status, StatusCode::OK);
    let expected = format!(r#"{{"order_id":"1001","message":"{}"}}"#, settings().confirmation_msg);
    assert_eq!(body, expected);
}

#[actix_web::test]
async fn confirmation_for_unknown_order_still_shows_message() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store.expect_set_status_unless_terminal().returning(|id, _| Err(OrderStoreError::OrderNotFound(id.clone())));
    let req = TestRequest::post().uri("/order/31337/confirmation");
    let (status, body) = send_request(req, configure(store, settings())).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(&settings().confirmation_msg));
}

fn configure(store: MockStore, settings: GatewaySettings) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.service(ReceiptRoute::<MockStore>::new())
            .service(ConfirmationRoute::<MockStore>::new())
            .app_data(web::Data::new(gateway_api(store, settings)))
            .app_data(web::Data::new(nonce_issuer()));
    }
}
