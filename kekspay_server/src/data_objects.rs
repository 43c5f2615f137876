use kekspay_engine::{
    db_types::OrderId,
    gateway_objects::ReceiptData,
    ConfigWarning,
};
use serde::{Deserialize, Serialize};

/// The only action the status endpoint answers to.
pub const STATUS_CHECK_ACTION: &str = "kekspay_status_check";
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 15;
pub const DEFAULT_POLL_TIMEOUT_SECS: u64 = 1800;

/// The form the status poller posts to `/ajax`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusCheckForm {
    pub action: String,
    #[serde(rename = "_ajax_nonce", default)]
    pub nonce: String,
    pub order_id: String,
}

/// Everything the receipt page needs, including what the status poller must send back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiptView {
    pub order_id: OrderId,
    pub message: String,
    pub payment_url: String,
    pub qr_svg: String,
    pub nonce: String,
    pub test_mode: bool,
    pub poll_interval_secs: u64,
    pub poll_timeout_secs: u64,
}

impl ReceiptView {
    pub fn new(receipt: ReceiptData, nonce: String) -> Self {
        let ReceiptData { order_id, message, payment_url, qr_svg, test_mode } = receipt;
        Self {
            order_id,
            message,
            payment_url,
            qr_svg,
            nonce,
            test_mode,
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            poll_timeout_secs: DEFAULT_POLL_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutResult {
    pub result: String,
    pub redirect: String,
}

impl CheckoutResult {
    pub fn success(redirect: String) -> Self {
        Self { result: "success".to_string(), redirect }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsCheckResult {
    pub available: bool,
    pub warnings: Vec<ConfigWarning>,
    pub messages: Vec<String>,
}

impl SettingsCheckResult {
    pub fn new(available: bool, warnings: Vec<ConfigWarning>) -> Self {
        let messages = warnings.iter().map(|w| w.to_string()).collect();
        Self { available, warnings, messages }
    }
}
