#![allow(dead_code)]
use std::sync::Arc;

use kekspay_common::{Amount, Secret};
use kekspay_engine::{
    db_types::{NewOrder, OrderId},
    events::EventProducers,
    helpers::KeksPayLinkBuilder,
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    GatewayApi,
    GatewaySettings,
    NotificationVerifier,
    OrderStore,
    SqliteDatabase,
    VerificationError,
};
use log::*;
use sqlx::{migrate::MigrateDatabase, Sqlite};

pub const GOOD_SIGNATURE: &str = "trusted";

/// Accepts notifications signed with [`GOOD_SIGNATURE`].
pub struct FixedSignature;

impl NotificationVerifier for FixedSignature {
    fn verify(&self, _body: &[u8], signature: Option<&str>) -> Result<(), VerificationError> {
        match signature {
            None => Err(VerificationError::MissingSignature),
            Some(GOOD_SIGNATURE) => Ok(()),
            Some(s) => Err(VerificationError::InvalidSignature(format!("{s} is not the expected signature"))),
        }
    }
}

pub fn settings() -> GatewaySettings {
    GatewaySettings {
        tid: "P00001".into(),
        cid: "C00001".into(),
        secret_key: Secret::new("s3cr3t".into()),
        store_name: "Test store".into(),
        ..Default::default()
    }
}

pub async fn setup(settings: GatewaySettings, producers: EventProducers) -> GatewayApi<SqliteDatabase> {
    let url = random_db_path();
    let db = prepare_test_env(&url).await;
    GatewayApi::new(db, settings, Arc::new(KeksPayLinkBuilder::new()), Arc::new(FixedSignature), producers)
}

pub async fn tear_down(api: GatewayApi<SqliteDatabase>) {
    let mut db = api.db().clone();
    let url = db.url().to_string();
    drop(api);
    if let Err(e) = db.close().await {
        error!("🚀️ Failed to close database: {e}");
    }
    if let Err(e) = Sqlite::drop_database(&url).await {
        warn!("🚀️ Could not remove test database {url}: {e}");
    }
}

pub fn new_order(id: &str) -> NewOrder {
    NewOrder::new(OrderId::from(id), Amount::from(12550), "HRK").with_redirects(
        format!("https://shop.example/checkout/order-received/{id}"),
        format!("https://shop.example/cart/?cancel_order={id}"),
    )
}

pub fn notification(bill_id: &str, status: i64, keks_id: &str) -> Vec<u8> {
    let message = if status == 0 { "Success" } else { "Declined by bank" };
    serde_json::json!({
        "bill_id": bill_id,
        "status": status,
        "message": message,
        "keks_id": keks_id,
        "tid": "P00001",
        "amount": 125.5
    })
    .to_string()
    .into_bytes()
}
