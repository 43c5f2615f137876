use kekspay_common::Amount;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::db_types::{Order, OrderId, PaymentStatus};

//--------------------------------------     StatusResponse     --------------------------------------------------------
/// The answer to a status check: the current payment status and, once resolved, where to send the shopper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: PaymentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
}

impl StatusResponse {
    pub fn for_order(order: &Order, status: PaymentStatus) -> Self {
        let status = status.reported();
        let redirect = status.redirect_target().map(|t| order.redirect_url(t).to_string());
        Self { status, redirect }
    }

    pub fn is_pending(&self) -> bool {
        self.status.reported() == PaymentStatus::Pending
    }
}

//--------------------------------------       ReceiptData      --------------------------------------------------------
/// Everything the receipt page needs to let the shopper pay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptData {
    pub order_id: OrderId,
    pub message: String,
    pub payment_url: String,
    pub qr_svg: String,
    pub test_mode: bool,
}

//--------------------------------------    ConfirmationView    --------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmationView {
    pub order_id: OrderId,
    pub message: String,
}

//--------------------------------------   GatewayDescription   --------------------------------------------------------
/// What checkout shows for this payment method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayDescription {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_mode_notice: Option<String>,
    pub available: bool,
}

//--------------------------------------      Notification      --------------------------------------------------------
/// A payment notification (IPN) as sent by KEKS Pay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// The merchant's order id
    pub bill_id: String,
    /// `0` when the payment succeeded. Any other value is a failure.
    pub status: i64,
    #[serde(default)]
    pub message: Option<String>,
    /// KEKS Pay's transaction id
    pub keks_id: String,
    /// The terminal the payment was made on
    #[serde(default)]
    pub tid: Option<String>,
    /// The amount paid, in major units
    #[serde(default)]
    pub amount: Option<f64>,
}

impl Notification {
    pub fn outcome(&self) -> PaymentStatus {
        if self.status == 0 {
            PaymentStatus::Approved
        } else {
            PaymentStatus::Declined
        }
    }

    pub fn amount(&self) -> Option<Amount> {
        self.amount.and_then(|a| {
            Amount::from_major_f64(a)
                .map_err(|e| warn!("🔄️ Ignoring notification amount for bill {}. {e}", self.bill_id))
                .ok()
        })
    }

    /// The audit note recorded when this notification is applied.
    pub fn audit_note(&self) -> String {
        let verb = match self.outcome() {
            PaymentStatus::Approved => "approved",
            _ => "declined",
        };
        let mut note = format!("KEKS Pay payment {verb}. Transaction id: {}.", self.keks_id);
        if let Some(amount) = self.amount() {
            note.push_str(&format!(" Amount: {amount}."));
        }
        if let Some(message) = self.message.as_ref().filter(|m| !m.is_empty()) {
            note.push_str(&format!(" Message: {message}"));
        }
        note
    }
}

//--------------------------------------    NotificationResult     -----------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationResult {
    Applied { order_id: OrderId, status: PaymentStatus },
    Duplicate { order_id: OrderId },
}

/// The acknowledgement KEKS Pay expects in response to a notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationAck {
    pub status: i64,
    pub message: String,
}

impl NotificationAck {
    pub fn accepted() -> Self {
        Self { status: 0, message: "Accepted".to_string() }
    }
}
