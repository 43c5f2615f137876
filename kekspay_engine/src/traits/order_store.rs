use thiserror::Error;

use crate::db_types::{NewOrder, Order, OrderId, OrderNote, PaymentStatus, Settlement, SettlementResult};

#[derive(Debug, Clone, Error)]
pub enum OrderStoreError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderId),
}

impl From<sqlx::Error> for OrderStoreError {
    fn from(e: sqlx::Error) -> Self {
        Self::DatabaseError(e.to_string())
    }
}

/// The persistent order store.
///
/// Orders are owned by the shop; the gateway only reads them and reads or writes named metadata fields on them.
/// Every method that mutates an order is atomic for that order.
#[allow(async_fn_in_trait)]
pub trait OrderStore: Clone {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Stores a new order. This call is idempotent on `order_id`.
    /// Returns the stored order, and `true` if it was inserted by this call.
    async fn insert_order(&self, order: NewOrder) -> Result<(Order, bool), OrderStoreError>;

    async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, OrderStoreError>;

    async fn get_meta(&self, order_id: &OrderId, key: &str) -> Result<Option<String>, OrderStoreError>;

    /// Writes a metadata field, replacing any previous value (last writer wins).
    async fn set_meta(&self, order_id: &OrderId, key: &str, value: &str) -> Result<(), OrderStoreError>;

    /// Writes a metadata field only if it does not exist yet. Returns `true` if the value was written.
    async fn add_meta_if_absent(&self, order_id: &OrderId, key: &str, value: &str) -> Result<bool, OrderStoreError>;

    /// Sets the payment status unless the order already carries a terminal status (`approved` or `declined`).
    /// Returns `true` if the status was written.
    async fn set_status_unless_terminal(
        &self,
        order_id: &OrderId,
        status: PaymentStatus,
    ) -> Result<bool, OrderStoreError>;

    async fn add_order_note(&self, order_id: &OrderId, note: &str) -> Result<(), OrderStoreError>;

    /// Returns the audit notes for the order, oldest first.
    async fn fetch_order_notes(&self, order_id: &OrderId) -> Result<Vec<OrderNote>, OrderStoreError>;

    /// In a single atomic transaction:
    /// * records the delivery identified by `keks_id` and `status`. If it was recorded before, nothing further is
    ///   done and [`SettlementResult::Duplicate`] is returned.
    /// * sets the payment status and the provider transaction id on the order
    /// * appends the settlement note to the order's audit log.
    async fn apply_settlement(&self, settlement: Settlement) -> Result<SettlementResult, OrderStoreError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), OrderStoreError> {
        Ok(())
    }
}
