//! # Collaborator contracts
//!
//! The gateway never talks to a concrete store, link format or signature scheme. It composes the following contracts:
//!
//! * [`OrderStore`] is the persistent order store. Orders carry arbitrary named metadata and an audit note log.
//!   [`crate::SqliteDatabase`] is the provided backend.
//! * [`LinkBuilder`] turns an order into the payment link (and QR code) that the shopper opens in the KEKS Pay app.
//! * [`NotificationVerifier`] authenticates incoming payment notifications before they are trusted.
mod link_builder;
mod notification_verifier;
mod order_store;

pub use link_builder::{LinkBuilder, LinkBuilderError};
pub use notification_verifier::{NotificationVerifier, VerificationError};
pub use order_store::{OrderStore, OrderStoreError};
