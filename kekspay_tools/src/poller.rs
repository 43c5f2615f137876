//! # Status poller
//!
//! The receipt page keeps asking the server whether the order has been paid. The poller does the same thing outside
//! the browser: it checks the status once straight away and then once every `interval`, until the server reports a
//! resolved status (and where to send the shopper), or until `timeout` has elapsed.
//!
//! Checks never overlap. If a request is slow, the next one is issued once it has resolved, and the interval restarts
//! from there. No request is issued at or after the timeout instant, but a request that is already in flight is
//! allowed to finish.
use std::time::Duration;

use kekspay_engine::gateway_objects::StatusResponse;
use log::*;
use thiserror::Error;
use tokio::time::{interval, sleep, MissedTickBehavior};

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(15);
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1800);

/// Why a single status check did not produce an answer.
#[derive(Debug, Clone, Error)]
pub enum TransportFailure {
    #[error("The status request could not be sent. {0}")]
    Request(String),
    #[error("The server answered with status {status}. {body}")]
    Status { status: u16, body: String },
    #[error("The status response could not be read. {0}")]
    Decode(String),
}

#[derive(Debug, Clone, Error)]
pub enum PollError {
    #[error("The poll interval must be longer than zero")]
    ZeroInterval,
    #[error("No order id was given")]
    MissingOrderId,
}

/// Where status checks go. The HTTP client is the production source.
#[allow(async_fn_in_trait)]
pub trait StatusSource {
    async fn fetch_status(&self, order_id: &str, nonce: &str) -> Result<StatusResponse, TransportFailure>;
}

#[derive(Debug, Clone, Copy)]
pub struct PollerConfig {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self { interval: DEFAULT_INTERVAL, timeout: DEFAULT_TIMEOUT }
    }
}

impl PollerConfig {
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self { interval, timeout }
    }

    /// Each status request must give up before the next one is due. Divides first, so any interval is safe.
    pub fn request_timeout(&self) -> Duration {
        self.interval / 5 * 4
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// The payment was resolved. The shopper goes to this URL.
    Redirect(String),
    TimedOut,
}

pub struct StatusPoller<S> {
    source: S,
    order_id: String,
    nonce: String,
    config: PollerConfig,
}

impl<S> StatusPoller<S>
where S: StatusSource
{
    pub fn new<T: Into<String>>(source: S, order_id: T, nonce: T, config: PollerConfig) -> Result<Self, PollError> {
        if config.interval.is_zero() {
            return Err(PollError::ZeroInterval);
        }
        let order_id = order_id.into();
        if order_id.trim().is_empty() {
            return Err(PollError::MissingOrderId);
        }
        Ok(Self { source, order_id, nonce: nonce.into(), config })
    }

    pub fn order_id(&self) -> &str {
        self.order_id.as_str()
    }

    /// Polls until the order is resolved or the timeout elapses.
    pub async fn run(&self) -> PollOutcome {
        let deadline = sleep(self.config.timeout);
        tokio::pin!(deadline);
        let mut ticker = interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut attempt = 0u64;
        debug!(
            "🕰️ Polling status of order {} every {:?} for up to {:?}",
            self.order_id, self.config.interval, self.config.timeout
        );
        loop {
            tokio::select! {
                biased;
                _ = &mut deadline => {
                    info!("🕰️ Gave up on order {} after {attempt} status checks", self.order_id);
                    return PollOutcome::TimedOut;
                },
                _ = ticker.tick() => {
                    attempt += 1;
                    if let Some(url) = self.check(attempt).await {
                        return PollOutcome::Redirect(url);
                    }
                },
            }
        }
    }

    async fn check(&self, attempt: u64) -> Option<String> {
        trace!("🕰️ Status check #{attempt} for order {}", self.order_id);
        let response = match self.source.fetch_status(&self.order_id, &self.nonce).await {
            Ok(response) => response,
            Err(e) => {
                warn!("🕰️ Status check #{attempt} for order {} failed. {e}", self.order_id);
                return None;
            },
        };
        if response.is_pending() {
            return None;
        }
        match response.redirect {
            Some(url) => {
                info!("🕰️ Order {} is {}. Redirecting to {url}", self.order_id, response.status);
                Some(url)
            },
            None => {
                warn!(
                    "🕰️ Order {} is {}, but the server sent no redirect. Still waiting.",
                    self.order_id, response.status
                );
                None
            },
        }
    }
}
