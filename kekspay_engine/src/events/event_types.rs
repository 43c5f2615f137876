use serde::{Deserialize, Serialize};

use crate::db_types::{Order, PaymentStatus};

/// Emitted exactly once per applied KEKS Pay notification, i.e. never for duplicate deliveries.
///
/// Side effects that must not be repeated (stock updates, customer emails) belong in handlers of this event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentSettledEvent {
    pub order: Order,
    pub status: PaymentStatus,
    pub keks_id: String,
}

impl PaymentSettledEvent {
    pub fn new(order: Order, status: PaymentStatus, keks_id: String) -> Self {
        Self { order, status, keks_id }
    }
}
