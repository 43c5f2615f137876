//! Signature checks for KEKS Pay payment notifications.
//!
//! KEKS Pay signs the raw request body with the merchant's secret key and sends the base64-encoded HMAC-SHA256 in the
//! `X-Kekspay-Signature` header.
use hmac::{Hmac, Mac};
use kekspay_common::Secret;
use kekspay_engine::{NotificationVerifier, VerificationError};
use log::trace;
use sha2::Sha256;

pub const SIGNATURE_HEADER: &str = "X-Kekspay-Signature";

#[derive(Clone, Debug)]
pub struct HmacSha256Verifier {
    key: Secret<String>,
}

impl HmacSha256Verifier {
    pub fn new(key: Secret<String>) -> Self {
        Self { key }
    }
}

impl NotificationVerifier for HmacSha256Verifier {
    fn verify(&self, body: &[u8], signature: Option<&str>) -> Result<(), VerificationError> {
        let signature = signature.ok_or(VerificationError::MissingSignature)?;
        if !self.key.is_set() {
            return Err(VerificationError::InvalidSignature("No secret key has been configured".into()));
        }
        let expected = base64::decode(signature.trim())
            .map_err(|e| VerificationError::InvalidSignature(format!("Signature is not valid base64. {e}")))?;
        let mut mac = Hmac::<Sha256>::new_from_slice(self.key.reveal().as_bytes())
            .map_err(|e| VerificationError::InvalidSignature(e.to_string()))?;
        mac.update(body);
        mac.verify_slice(&expected)
            .map_err(|_| VerificationError::InvalidSignature("Signature does not match the message".into()))?;
        trace!("🔐️ Notification signature ✅️");
        Ok(())
    }
}
