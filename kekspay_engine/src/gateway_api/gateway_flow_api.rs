use std::{fmt::Debug, sync::Arc};

use log::*;

use crate::{
    db_types::{
        NewOrder,
        Order,
        OrderId,
        PaymentStatus,
        Settlement,
        SettlementResult,
        META_PAYMENT_STATUS,
        META_TEST_MODE,
    },
    events::{EventProducers, PaymentSettledEvent},
    gateway_api::{
        errors::GatewayError,
        gateway_objects::{
            ConfirmationView,
            GatewayDescription,
            Notification,
            NotificationResult,
            ReceiptData,
            StatusResponse,
        },
        settings::{GatewaySettings, KEKSPAY_GATEWAY_ID, TEST_MODE_NOTICE, TEST_MODE_ORDER_NOTE},
    },
    traits::{LinkBuilder, NotificationVerifier, OrderStore},
};

const GATEWAY_LOG_TARGET: &str = "kekspay::gateway";

/// `GatewayApi` is the KEKS Pay payment method as the shop sees it.
///
/// It wires the order store, the payment link builder and the notification verifier together and drives the payment
/// status of an order:
///
/// ```text
///   receipt view ──► pending ──► (shopper returns) ──► pending_approval
///                       │                                    │
///                       └──────── notification ──────────────┴──► approved | declined
/// ```
///
/// Only notifications are authoritative for the terminal status.
pub struct GatewayApi<B> {
    db: B,
    settings: GatewaySettings,
    links: Arc<dyn LinkBuilder>,
    verifier: Arc<dyn NotificationVerifier>,
    producers: EventProducers,
}

impl<B> Debug for GatewayApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "GatewayApi ({KEKSPAY_GATEWAY_ID})")
    }
}

impl<B> GatewayApi<B> {
    pub fn new(
        db: B,
        settings: GatewaySettings,
        links: Arc<dyn LinkBuilder>,
        verifier: Arc<dyn NotificationVerifier>,
        producers: EventProducers,
    ) -> Self {
        Self { db, settings, links, verifier, producers }
    }

    pub fn settings(&self) -> &GatewaySettings {
        &self.settings
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    /// The checkout description of the payment method.
    pub fn description(&self) -> GatewayDescription {
        GatewayDescription {
            id: KEKSPAY_GATEWAY_ID.to_string(),
            title: self.settings.title.clone(),
            description: self.settings.description_msg.clone(),
            test_mode_notice: self.settings.test_mode.then(|| TEST_MODE_NOTICE.to_string()),
            available: self.settings.is_available(),
        }
    }

    /// Gateway messages can be switched off in the settings.
    fn gateway_log(&self, level: Level, message: &str) {
        if self.settings.use_logger {
            log!(target: GATEWAY_LOG_TARGET, level, "🔄️ {message}");
        }
    }
}

impl<B> GatewayApi<B>
where B: OrderStore
{
    /// Accepts a new order for payment with KEKS Pay.
    ///
    /// The order is stored (idempotently) and returned. The caller sends the shopper to the receipt page next.
    pub async fn checkout(&self, order: NewOrder) -> Result<Order, GatewayError> {
        if !self.settings.is_available() {
            self.gateway_log(Level::Warn, &format!("Checkout for order {} refused. Gateway unavailable.", order.order_id));
            return Err(GatewayError::GatewayUnavailable);
        }
        if !self.settings.currency_supported(&order.currency) {
            return Err(GatewayError::UnsupportedCurrency(order.currency));
        }
        let (order, inserted) = self.db.insert_order(order).await?;
        if inserted {
            debug!("🔄️📦️ Order {} accepted for KEKS Pay checkout", order.order_id);
        } else {
            debug!("🔄️📦️ Order {} was already known. Checkout resumed.", order.order_id);
        }
        Ok(order)
    }

    /// Prepares the receipt page, where the shopper pays in the KEKS Pay app.
    ///
    /// Marks the order as `pending`, including after a visit to the confirmation page, since only KEKS Pay's
    /// notification settles a payment. An `approved` or `declined` order keeps its status. In test mode the order is flagged and a single audit note is added, however often the page is
    /// shown.
    ///
    /// Returns `None` (and logs) when the order does not exist or the gateway cannot take payments. Nothing should be
    /// rendered in that case.
    pub async fn show_receipt(&self, order_id: &OrderId) -> Result<Option<ReceiptData>, GatewayError> {
        let Some(order) = self.db.fetch_order(order_id).await? else {
            self.gateway_log(Level::Warn, &format!("Failed to find order {order_id} while trying to show receipt page."));
            return Ok(None);
        };
        if !self.settings.is_available() {
            self.gateway_log(Level::Warn, &format!("Receipt page for order {order_id} hidden. Gateway unavailable."));
            return Ok(None);
        }
        if self.db.set_status_unless_terminal(order_id, PaymentStatus::Pending).await? {
            debug!("🔄️ Order {order_id} is now awaiting KEKS Pay payment");
        } else {
            debug!("🔄️ Order {order_id} already has a final payment status. Receipt page left it as is.");
        }
        if self.settings.test_mode && self.db.add_meta_if_absent(order_id, META_TEST_MODE, "yes").await? {
            self.db.add_order_note(order_id, TEST_MODE_ORDER_NOTE).await?;
            info!("🔄️ Order {order_id} was placed in test mode");
        }
        let payment_url = self.links.payment_url(&order, &self.settings)?;
        let qr_svg = self.links.payment_qr(&order, &self.settings)?;
        Ok(Some(ReceiptData {
            order_id: order.order_id,
            message: self.settings.receipt_msg.clone(),
            payment_url,
            qr_svg,
            test_mode: self.settings.test_mode,
        }))
    }

    /// The shopper came back to the shop after paying. This is not proof of payment: the status becomes
    /// `pending_approval` until KEKS Pay's notification arrives. A status that is already terminal is left alone.
    pub async fn confirm_order(&self, order_id: &OrderId) -> Result<ConfirmationView, GatewayError> {
        match self.db.set_status_unless_terminal(order_id, PaymentStatus::PendingApproval).await {
            Ok(true) => debug!("🔄️ Order {order_id} is awaiting approval from KEKS Pay"),
            Ok(false) => debug!("🔄️ Order {order_id} already has a final payment status. Confirmation left it as is."),
            Err(crate::traits::OrderStoreError::OrderNotFound(_)) => {
                self.gateway_log(
                    Level::Warn,
                    &format!("Failed to find order with ID {order_id} while displaying order confirmation."),
                );
            },
            Err(e) => return Err(e.into()),
        }
        Ok(ConfirmationView { order_id: order_id.clone(), message: self.settings.confirmation_msg.clone() })
    }

    /// Reports the current payment status of the order and, once it is resolved, where the shopper goes next.
    ///
    /// This is a pure read. An unset status is reported as `pending`.
    pub async fn payment_status(&self, order_id: &OrderId) -> Result<StatusResponse, GatewayError> {
        let order = self.db.fetch_order(order_id).await?.ok_or_else(|| GatewayError::OrderNotFound(order_id.clone()))?;
        let raw = self.db.get_meta(order_id, META_PAYMENT_STATUS).await?;
        let status = PaymentStatus::from_meta(raw.as_deref());
        trace!("🔄️ Status check for order {order_id}: {status}");
        Ok(StatusResponse::for_order(&order, status))
    }

    /// Handles a KEKS Pay payment notification.
    ///
    /// The raw body is verified before it is parsed. Repeated deliveries of the same notification change nothing and
    /// publish no events.
    pub async fn process_notification(
        &self,
        body: &[u8],
        signature: Option<&str>,
    ) -> Result<NotificationResult, GatewayError> {
        self.verifier.verify(body, signature).map_err(|e| {
            warn!("🔄️🔐️ Rejected KEKS Pay notification. {e}");
            GatewayError::from(e)
        })?;
        let notification: Notification = serde_json::from_slice(body).map_err(|e| {
            warn!("🔄️ Could not parse KEKS Pay notification. {e}");
            GatewayError::InvalidPayload(e.to_string())
        })?;
        if let Some(tid) = notification.tid.as_deref() {
            if tid != self.settings.tid {
                warn!("🔄️ Notification for bill {} came from terminal {tid}. Rejected.", notification.bill_id);
                return Err(GatewayError::TerminalMismatch(tid.to_string()));
            }
        }
        let order_id = notification
            .bill_id
            .parse::<OrderId>()
            .map_err(|e| GatewayError::InvalidPayload(e.to_string()))?;
        if self.db.fetch_order(&order_id).await?.is_none() {
            self.gateway_log(Level::Error, &format!("Received a KEKS Pay notification for unknown order {order_id}."));
            return Err(GatewayError::OrderNotFound(order_id));
        }
        let status = notification.outcome();
        info!("🔄️ KEKS Pay reports order {order_id} as {status} [{}]", notification.keks_id);
        let settlement = Settlement {
            order_id: order_id.clone(),
            keks_id: notification.keks_id.clone(),
            status,
            note: notification.audit_note(),
        };
        match self.db.apply_settlement(settlement).await? {
            SettlementResult::Applied(order) => {
                self.call_payment_settled_hook(order, status, notification.keks_id).await;
                Ok(NotificationResult::Applied { order_id, status })
            },
            SettlementResult::Duplicate => {
                info!("🔄️ Notification {} for order {order_id} was already applied", notification.keks_id);
                Ok(NotificationResult::Duplicate { order_id })
            },
        }
    }

    async fn call_payment_settled_hook(&self, order: Order, status: PaymentStatus, keks_id: String) {
        for emitter in &self.producers.payment_settled_producer {
            debug!("🔄️📬️ Notifying payment settled hook subscribers");
            let event = PaymentSettledEvent::new(order.clone(), status, keks_id.clone());
            emitter.publish_event(event).await;
        }
    }
}
