use std::sync::Arc;

use actix_web::{
    body::to_bytes,
    http::StatusCode,
    test,
    test::TestRequest,
    web::ServiceConfig,
    App,
};
use chrono::Utc;
use kekspay_common::{Amount, Secret};
use kekspay_engine::{
    db_types::{Order, OrderId},
    events::EventProducers,
    helpers::KeksPayLinkBuilder,
    GatewayApi,
    GatewaySettings,
};
use log::debug;

use super::mocks::MockStore;
use crate::{
    auth::NonceIssuer,
    config::{NonceConfig, ServerOptions},
    webhook_auth::HmacSha256Verifier,
};

pub const TID: &str = "P00001";
pub const SECRET_KEY: &str = "s3cr3t";
pub const API_KEY: &str = "shop-api-key-for-tests";

pub fn settings() -> GatewaySettings {
    GatewaySettings {
        tid: TID.to_string(),
        cid: "C00001".to_string(),
        secret_key: Secret::new(SECRET_KEY.to_string()),
        store_name: "Test Shop".to_string(),
        use_logger: false,
        ..GatewaySettings::default()
    }
}

pub fn gateway_api(store: MockStore, settings: GatewaySettings) -> GatewayApi<MockStore> {
    let verifier = HmacSha256Verifier::new(settings.secret_key.clone());
    GatewayApi::new(store, settings, Arc::new(KeksPayLinkBuilder::new()), Arc::new(verifier), EventProducers::default())
}

// A fixed key, so that tests can issue nonces that the app under test accepts. DO NOT re-use it anywhere.
pub fn nonce_issuer() -> NonceIssuer {
    let config = NonceConfig { secret: Secret::new("nonce-secret-for-tests".to_string()), lifetime_secs: 86_400 };
    NonceIssuer::new(&config).expect("Failed to create nonce issuer")
}

pub fn server_options() -> ServerOptions {
    ServerOptions { public_url: "https://pay.example.com".into(), use_x_forwarded_for: false, use_forwarded: false }
}

pub fn order(id: &str) -> Order {
    Order {
        id: 1,
        order_id: OrderId::from(id),
        total: Amount::from(12550),
        currency: "HRK".into(),
        success_url: format!("https://shop.example/checkout/order-received/{id}"),
        cancel_url: format!("https://shop.example/cart/?cancel_order={id}"),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

/// Runs a single request against an app set up by `configure`. Errors raised by middleware are turned into responses
/// the same way the server would.
pub async fn send_request<F>(req: TestRequest, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    let app = test::init_service(App::new().configure(configure)).await;
    debug!("Making request");
    let res = match test::try_call_service(&app, req.to_request()).await {
        Ok(res) => res.into_parts().1.map_into_boxed_body(),
        Err(e) => e.error_response(),
    };
    let status = res.status();
    let body = to_bytes(res.into_body()).await.expect("Failed to read response body");
    (status, String::from_utf8_lossy(&body).into_owned())
}

