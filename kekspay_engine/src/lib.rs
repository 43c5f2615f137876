//! KEKS Pay Payment Engine
//!
//! This library holds the core logic of the KEKS Pay payment gateway. It knows nothing about HTTP.
//!
//! The library is divided into these sections:
//! 1. The order store ([`OrderStore`]) and its SQLite implementation ([`SqliteDatabase`]). Orders carry named
//!    metadata fields, of which `kekspay_status` is the payment status that everything else revolves around. The data
//!    types live in [`mod@db_types`].
//! 2. The gateway facade ([`GatewayApi`]). It drives the payment status of an order through the receipt view, the
//!    order confirmation, status checks and KEKS Pay's payment notifications.
//! 3. Payment links and QR codes ([`mod@helpers`]).
//!
//! The engine also emits events. When a notification settles a payment, a
//! [`PaymentSettledEvent`](events::PaymentSettledEvent) is published. A simple actor framework is used so that you
//! can easily hook into these events and perform custom actions.
pub mod db_types;
pub mod events;
pub mod gateway_api;
pub mod helpers;
pub mod traits;

#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use gateway_api::{
    errors::GatewayError,
    gateway_flow_api::GatewayApi,
    gateway_objects,
    settings::{ConfigWarning, GatewaySettings},
};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use traits::{LinkBuilder, LinkBuilderError, NotificationVerifier, OrderStore, OrderStoreError, VerificationError};
