use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use kekspay_engine::{gateway_api::settings::TEST_MODE_NOTICE, GatewaySettings};
use serde_json::Value;

use super::{
    helpers::{gateway_api, send_request, settings},
    mocks::MockStore,
};
use crate::routes::{health, GatewayDescriptionRoute};

#[actix_web::test]
async fn health_endpoint() {
    let _ = env_logger::try_init().ok();
    let (status, body) = send_request(TestRequest::get().uri("/health"), |cfg| {
        cfg.service(health);
    })
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "👍️\n");
}

#[actix_web::test]
async fn gateway_description() {
    let _ = env_logger::try_init().ok();
    let (status, body) = send_request(TestRequest::get().uri("/gateway"), configure(false)).await;
    assert_eq!(status, StatusCode::OK);
    let desc: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(desc["id"], "erste-kekspay-woocommerce");
    assert_eq!(desc["title"], "KEKS Pay");
    assert_eq!(desc["available"], true);
    assert!(desc.get("test_mode_notice").is_none());
}

#[actix_web::test]
async fn gateway_description_in_test_mode() {
    let _ = env_logger::try_init().ok();
    let (status, body) = send_request(TestRequest::get().uri("/gateway"), configure(true)).await;
    assert_eq!(status, StatusCode::OK);
    let desc: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(desc["test_mode_notice"], TEST_MODE_NOTICE);
}

fn configure(test_mode: bool) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let api = gateway_api(MockStore::new(), GatewaySettings { test_mode, ..settings() });
        cfg.service(GatewayDescriptionRoute::<MockStore>::new()).app_data(web::Data::new(api));
    }
}
