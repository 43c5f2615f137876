//! Anti-forgery tokens for the status check endpoint.
//!
//! The receipt page hands the shopper's browser a token that is bound to an action and an order id. The status
//! poller sends it back with every status check. Tokens are an HMAC-SHA256 over
//! `{tick}|{action}|{order_id}`, where `tick` advances every half lifetime. A token is accepted during the tick it
//! was issued in and the one after, so it lives for between one half and one full lifetime.
use std::fmt::Debug;

use chrono::Utc;
use hmac::{Hmac, Mac};
use log::*;
use sha2::Sha256;

use crate::{
    config::NonceConfig,
    errors::{AuthError, ServerError},
};

type HmacSha256 = Hmac<Sha256>;

#[derive(Clone)]
pub struct NonceIssuer {
    keyed_mac: HmacSha256,
    lifetime_secs: u64,
}

impl Debug for NonceIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "NonceIssuer (lifetime: {}s)", self.lifetime_secs)
    }
}

impl NonceIssuer {
    pub fn new(config: &NonceConfig) -> Result<Self, ServerError> {
        let keyed_mac = HmacSha256::new_from_slice(config.secret.reveal().as_bytes())
            .map_err(|e| ServerError::ConfigurationError(format!("Invalid nonce secret. {e}")))?;
        Ok(Self { keyed_mac, lifetime_secs: config.lifetime_secs.max(2) })
    }

    pub fn issue(&self, action: &str, order_id: &str) -> String {
        self.issue_at(action, order_id, Utc::now().timestamp())
    }

    pub fn verify(&self, nonce: &str, action: &str, order_id: &str) -> Result<(), AuthError> {
        self.verify_at(nonce, action, order_id, Utc::now().timestamp())
    }

    pub fn issue_at(&self, action: &str, order_id: &str, now: i64) -> String {
        let mac = self.mac(self.tick(now), action, order_id).finalize().into_bytes();
        base64::encode_config(mac, base64::URL_SAFE_NO_PAD)
    }

    pub fn verify_at(&self, nonce: &str, action: &str, order_id: &str, now: i64) -> Result<(), AuthError> {
        let Ok(bytes) = base64::decode_config(nonce, base64::URL_SAFE_NO_PAD) else {
            debug!("🔐️ Nonce for order {order_id} is not valid base64");
            return Err(AuthError::InvalidNonce);
        };
        let tick = self.tick(now);
        let valid = [tick, tick - 1].into_iter().any(|t| self.mac(t, action, order_id).verify_slice(&bytes).is_ok());
        if valid {
            trace!("🔐️ Nonce for {action} on order {order_id} ✅️");
            Ok(())
        } else {
            debug!("🔐️ Nonce for {action} on order {order_id} is invalid or has expired");
            Err(AuthError::InvalidNonce)
        }
    }

    fn tick(&self, now: i64) -> i64 {
        let half = i64::try_from(self.lifetime_secs / 2).unwrap_or(i64::MAX);
        now.div_euclid(half) + 1
    }

    fn mac(&self, tick: i64, action: &str, order_id: &str) -> HmacSha256 {
        let mut mac = self.keyed_mac.clone();
        mac.update(format!("{tick}|{action}|{order_id}").as_bytes());
        mac
    }
}
