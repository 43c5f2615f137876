//! Client side of the KEKS Pay gateway.
//!
//! * [`poller::StatusPoller`] waits for an order's payment to be resolved, checking its status on a fixed interval.
//! * [`client::HttpStatusSource`] is the status source that talks to a running server.
pub mod client;
pub mod poller;
