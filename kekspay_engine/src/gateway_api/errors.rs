use thiserror::Error;

use crate::{
    db_types::OrderId,
    traits::{LinkBuilderError, OrderStoreError, VerificationError},
};

#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("Notification rejected. {0}")]
    InvalidSignature(#[from] VerificationError),
    #[error("Invalid notification payload. {0}")]
    InvalidPayload(String),
    #[error("Notification was issued for terminal {0}, which is not this shop's terminal")]
    TerminalMismatch(String),
    #[error("The KEKS Pay gateway is not available. Check the gateway settings.")]
    GatewayUnavailable,
    #[error("Currency {0} is not supported by KEKS Pay")]
    UnsupportedCurrency(String),
    #[error("{0}")]
    LinkError(#[from] LinkBuilderError),
}

impl From<OrderStoreError> for GatewayError {
    fn from(e: OrderStoreError) -> Self {
        match e {
            OrderStoreError::DatabaseError(s) => Self::DatabaseError(s),
            OrderStoreError::OrderNotFound(id) => Self::OrderNotFound(id),
        }
    }
}
