use std::fmt::Display;

use kekspay_common::Secret;
use serde::{Deserialize, Serialize};

pub const KEKSPAY_GATEWAY_ID: &str = "erste-kekspay-woocommerce";
pub const DEFAULT_PAYMENT_BASE_URL: &str = "https://kekspay.hr/pay";
pub const DEFAULT_TEST_PAYMENT_BASE_URL: &str = "https://sandbox.kekspay.hr/pay";
pub const DEFAULT_CURRENCY: &str = "HRK";
pub const TEST_MODE_NOTICE: &str = "Kekspay is currently in sandbox/test mode, disable it for live web shops.";
pub const TEST_MODE_ORDER_NOTE: &str = "Order was done in test mode.";

/// Merchant-facing gateway settings: credentials, flags and the messages shown to shoppers.
#[derive(Debug, Clone)]
pub struct GatewaySettings {
    pub enabled: bool,
    /// Sandbox credentials are in use. Orders are flagged and payment links point at the sandbox.
    pub test_mode: bool,
    /// KEKS Pay terminal id
    pub tid: String,
    /// KEKS Pay company id
    pub cid: String,
    /// Shared secret used by KEKS Pay to sign payment notifications
    pub secret_key: Secret<String>,
    /// The currency the shop sells in
    pub shop_currency: String,
    pub supported_currencies: Vec<String>,
    pub store_name: String,
    pub title: String,
    pub description_msg: String,
    pub confirmation_msg: String,
    pub receipt_msg: String,
    pub payment_base_url: String,
    pub test_payment_base_url: String,
    /// When false, gateway-level log messages are suppressed.
    pub use_logger: bool,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            enabled: true,
            test_mode: false,
            tid: String::default(),
            cid: String::default(),
            secret_key: Secret::default(),
            shop_currency: DEFAULT_CURRENCY.to_string(),
            supported_currencies: vec![DEFAULT_CURRENCY.to_string()],
            store_name: String::default(),
            title: "KEKS Pay".to_string(),
            description_msg: "Pay quickly and safely with the KEKS Pay mobile app.".to_string(),
            confirmation_msg: "Thank you! KEKS Pay is confirming your payment.".to_string(),
            receipt_msg: "Open the link below in the KEKS Pay app, or scan the QR code, to complete your payment."
                .to_string(),
            payment_base_url: DEFAULT_PAYMENT_BASE_URL.to_string(),
            test_payment_base_url: DEFAULT_TEST_PAYMENT_BASE_URL.to_string(),
            use_logger: true,
        }
    }
}

/// A configuration problem that merchants should be told about. None of these stop the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "warning", content = "detail", rename_all = "snake_case")]
pub enum ConfigWarning {
    TestMode,
    MissingCredentials,
    UnsupportedCurrency(String),
}

impl Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TestMode => write!(f, "KEKS Pay is in test mode. Remember to switch it off once testing is done."),
            Self::MissingCredentials => {
                write!(f, "KEKS Pay is unavailable. Check that the TID, CID and secret key are set.")
            },
            Self::UnsupportedCurrency(c) => write!(f, "KEKS Pay is unavailable. The shop currency {c} is not supported."),
        }
    }
}

impl GatewaySettings {
    pub fn required_keys_set(&self) -> bool {
        !self.tid.trim().is_empty() && !self.cid.trim().is_empty() && self.secret_key.is_set()
    }

    pub fn currency_supported(&self, currency: &str) -> bool {
        self.supported_currencies.iter().any(|c| c.eq_ignore_ascii_case(currency))
    }

    /// The gateway can take payments: it is enabled, its credentials are set and the shop currency is supported.
    pub fn is_available(&self) -> bool {
        self.enabled && self.required_keys_set() && self.currency_supported(&self.shop_currency)
    }

    pub fn payment_base_url(&self) -> &str {
        if self.test_mode {
            self.test_payment_base_url.as_str()
        } else {
            self.payment_base_url.as_str()
        }
    }

    /// Checks the settings and returns any warnings for the merchant. A disabled gateway has nothing to report.
    pub fn check(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();
        if !self.enabled {
            return warnings;
        }
        if self.test_mode {
            warnings.push(ConfigWarning::TestMode);
        }
        if !self.required_keys_set() {
            warnings.push(ConfigWarning::MissingCredentials);
        }
        if !self.currency_supported(&self.shop_currency) {
            warnings.push(ConfigWarning::UnsupportedCurrency(self.shop_currency.clone()));
        }
        warnings
    }
}
