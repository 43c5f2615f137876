use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use kekspay_common::Amount;
use log::warn;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

/// Order metadata key holding the KEKS Pay payment status.
pub const META_PAYMENT_STATUS: &str = "kekspay_status";
/// Order metadata key that is set to `yes` when the order was placed while the gateway was in test mode.
pub const META_TEST_MODE: &str = "in_test_mode";
/// Order metadata key holding the provider transaction id of the last applied notification.
pub const META_KEKS_ID: &str = "kekspay_id";

//--------------------------------------        OrderId        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderId(pub String);

impl FromStr for OrderId {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            Err(ConversionError("Order id cannot be empty".to_string()))
        } else {
            Ok(Self(s.to_string()))
        }
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for OrderId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl OrderId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------     PaymentStatus     ---------------------------------------------------------
/// The KEKS Pay payment status of an order, as stored in the `kekspay_status` metadata field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// The status field has never been written.
    #[default]
    None,
    /// The receipt page was shown and the shopper has not paid yet.
    Pending,
    /// The shopper returned to the shop, but KEKS Pay has not confirmed the payment yet.
    PendingApproval,
    /// KEKS Pay confirmed the payment.
    Approved,
    /// KEKS Pay declined the payment.
    Declined,
}

/// Where the shopper is sent once the status has been resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectTarget {
    OrderReceived,
    OrderCancelled,
}

impl PaymentStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Approved | Self::Declined)
    }

    /// `None` is reported to shoppers as `Pending`.
    pub fn reported(self) -> Self {
        match self {
            Self::None => Self::Pending,
            s => s,
        }
    }

    /// The redirect destination for this status, or `None` while the shopper should keep waiting.
    ///
    /// `PendingApproval` belongs to the approved family: the shopper has already completed the checkout flow.
    pub fn redirect_target(&self) -> Option<RedirectTarget> {
        match self {
            Self::None | Self::Pending => None,
            Self::PendingApproval | Self::Approved => Some(RedirectTarget::OrderReceived),
            Self::Declined => Some(RedirectTarget::OrderCancelled),
        }
    }

    /// Reads the status from a raw metadata value. Unrecognised values are logged and read as `Pending`.
    pub fn from_meta(value: Option<&str>) -> Self {
        match value {
            None => Self::None,
            Some(v) => v.parse().unwrap_or_else(|e| {
                warn!("🗃️ {e}. Treating the order as pending.");
                Self::Pending
            }),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Pending => "pending",
            Self::PendingApproval => "pending_approval",
            Self::Approved => "approved",
            Self::Declined => "declined",
        }
    }
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Error)]
#[error("Conversion error: {0}")]
pub struct ConversionError(String);

impl FromStr for PaymentStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "pending" => Ok(Self::Pending),
            "pending_approval" => Ok(Self::PendingApproval),
            "approved" => Ok(Self::Approved),
            "declined" => Ok(Self::Declined),
            s => Err(ConversionError(format!("Invalid payment status: {s}"))),
        }
    }
}

//--------------------------------------        Order       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub order_id: OrderId,
    pub total: Amount,
    pub currency: String,
    /// The shop's "order received" page for this order
    pub success_url: String,
    /// The shop's cancellation page for this order
    pub cancel_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn redirect_url(&self, target: RedirectTarget) -> &str {
        match target {
            RedirectTarget::OrderReceived => self.success_url.as_str(),
            RedirectTarget::OrderCancelled => self.cancel_url.as_str(),
        }
    }
}

//--------------------------------------        NewOrder       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    /// The order id as assigned by the shop
    pub order_id: OrderId,
    /// The order total, in minor units
    pub total: Amount,
    pub currency: String,
    pub success_url: String,
    pub cancel_url: String,
}

impl NewOrder {
    pub fn new<S: Into<String>>(order_id: OrderId, total: Amount, currency: S) -> Self {
        Self { order_id, total, currency: currency.into(), success_url: String::default(), cancel_url: String::default() }
    }

    pub fn with_redirects<S: Into<String>>(mut self, success_url: S, cancel_url: S) -> Self {
        self.success_url = success_url.into();
        self.cancel_url = cancel_url.into();
        self
    }
}

//--------------------------------------       OrderNote       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct OrderNote {
    pub id: i64,
    pub order_id: OrderId,
    pub note: String,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------       Settlement       --------------------------------------------------------
/// A terminal payment outcome reported by KEKS Pay, ready to be applied to an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settlement {
    pub order_id: OrderId,
    /// KEKS Pay's transaction id. Together with `status`, it identifies a delivery.
    pub keks_id: String,
    pub status: PaymentStatus,
    /// The audit note recorded against the order
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettlementResult {
    /// The settlement was recorded and the order status updated.
    Applied(Order),
    /// This delivery was seen before. Nothing was changed.
    Duplicate,
}
