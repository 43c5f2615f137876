//! # KEKS Pay server
//! This module hosts the server code for the KEKS Pay gateway. It is responsible for:
//! Accepting new orders from the shop and sending the shopper to the receipt page.
//! Answering the receipt page's status checks until the payment is resolved.
//! Receiving KEKS Pay's signed payment notifications and settling orders accordingly.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/ajax`: The status check endpoint polled by the receipt page.
//! * `/order/{order_id}/receipt`: The payment initiation data (payment link and QR code) for an order.
//! * `/order/{order_id}/confirmation`: Where shoppers land when they return from the KEKS Pay app.
//! * `/gateway`: The gateway's title and description, for the checkout page.
//! * `/webhook`: KEKS Pay payment notifications.
//! * `/api/orders`, `/api/settings/check`: Routes for the shop itself. These require the API key.

pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;

pub mod helpers;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod webhook_auth;
