use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use kekspay_common::{Amount, Secret};
use kekspay_engine::{
    db_types::{NewOrder, Order, OrderId},
    GatewaySettings,
};
use serde_json::Value;

use super::{
    helpers::{gateway_api, order, send_request, server_options, settings, API_KEY},
    mocks::MockStore,
};
use crate::{
    middleware::{ApiKeyMiddlewareFactory, API_KEY_HEADER},
    routes::{CheckoutRoute, SettingsCheckRoute},
};

#[actix_web::test]
async fn checkout_without_api_key() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::post().uri("/api/orders").set_json(new_order("1001", "HRK"));
    let (status, body) = send_request(req, configure(MockStore::new(), settings())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.contains("No API key was provided"), "was: {body}");
}

#[actix_web::test]
async fn checkout_with_wrong_api_key() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::post()
        .uri("/api/orders")
        .insert_header((API_KEY_HEADER, "guessed"))
        .set_json(new_order("1001", "HRK"));
    let (status, body) = send_request(req, configure(MockStore::new(), settings())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.contains("The API key is not valid"), "was: {body}");
}

#[actix_web::test]
async fn checkout_sends_shopper_to_receipt_page() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store.expect_insert_order().times(1).returning(|o: NewOrder| {
        assert_eq!(o.total, Amount::from(12550));
        Ok((stored(o), true))
    });
    let req = authorized(TestRequest::post().uri("/api/orders")).set_json(new_order("1001", "HRK"));
    let (status, body) = send_request(req, configure(store, settings())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"result":"success","redirect":"https://pay.example.com/order/1001/receipt"}"#);
}

#[actix_web::test]
async fn repeated_checkout_resumes_the_order() {
    let _ = env_logger::try_init().ok();
    let mut store = MockStore::new();
    store.expect_insert_order().times(1).returning(|o: NewOrder| Ok((stored(o), false)));
    let req = authorized(TestRequest::post().uri("/api/orders")).set_json(new_order("1001", "HRK"));
    let (status, body) = send_request(req, configure(store, settings())).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("/order/1001/receipt"), "was: {body}");
}

#[actix_web::test]
async fn checkout_in_unsupported_currency() {
    let _ = env_logger::try_init().ok();
    let req = authorized(TestRequest::post().uri("/api/orders")).set_json(new_order("1001", "USD"));
    let (status, body) = send_request(req, configure(MockStore::new(), settings())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Currency USD is not supported"), "was: {body}");
}

#[actix_web::test]
async fn checkout_while_gateway_is_unavailable() {
    let _ = env_logger::try_init().ok();
    let settings = GatewaySettings { enabled: false, ..settings() };
    let req = authorized(TestRequest::post().uri("/api/orders")).set_json(new_order("1001", "HRK"));
    let (status, _) = send_request(req, configure(MockStore::new(), settings)).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[actix_web::test]
async fn settings_check_when_all_is_well() {
    let _ = env_logger::try_init().ok();
    let req = authorized(TestRequest::get().uri("/api/settings/check"));
    let (status, body) = send_request(req, configure(MockStore::new(), settings())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"available":true,"warnings":[],"messages":[]}"#);
}

#[actix_web::test]
async fn settings_check_reports_problems() {
    let _ = env_logger::try_init().ok();
    let settings = GatewaySettings {
        test_mode: true,
        secret_key: Secret::default(),
        shop_currency: "USD".into(),
        ..settings()
    };
    let req = authorized(TestRequest::get().uri("/api/settings/check"));
    let (status, body) = send_request(req, configure(MockStore::new(), settings)).await;
    assert_eq!(status, StatusCode::OK);
    let res: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(res["available"], false);
    let warnings = res["warnings"].as_array().unwrap();
    assert_eq!(warnings.len(), 3);
    assert!(warnings.contains(&serde_json::json!({"warning": "missing_credentials"})));
    assert!(warnings.contains(&serde_json::json!({"warning": "unsupported_currency", "detail": "USD"})));
    assert_eq!(res["messages"].as_array().unwrap().len(), 3);
}

fn new_order(id: &str, currency: &str) -> NewOrder {
    NewOrder::new(OrderId::from(id), Amount::from(12550), currency).with_redirects(
        format!("https://shop.example/checkout/order-received/{id}"),
        format!("https://shop.example/cart/?cancel_order={id}"),
    )
}

fn stored(o: NewOrder) -> Order {
    Order { total: o.total, currency: o.currency, ..order(o.order_id.as_str()) }
}

fn authorized(req: TestRequest) -> TestRequest {
    req.insert_header((API_KEY_HEADER, API_KEY))
}

fn configure(store: MockStore, settings: GatewaySettings) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let api_scope = web::scope("/api")
            .wrap(ApiKeyMiddlewareFactory::new(Secret::new(API_KEY.to_string())))
            .service(CheckoutRoute::<MockStore>::new())
            .service(SettingsCheckRoute::<MockStore>::new());
        cfg.service(api_scope)
            .app_data(web::Data::new(gateway_api(store, settings)))
            .app_data(web::Data::new(server_options()));
    }
}
