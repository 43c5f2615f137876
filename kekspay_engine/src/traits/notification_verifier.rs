use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum VerificationError {
    #[error("The notification did not carry a signature")]
    MissingSignature,
    #[error("The notification signature is invalid. {0}")]
    InvalidSignature(String),
}

/// Authenticates the raw body of a payment notification.
pub trait NotificationVerifier: Send + Sync {
    fn verify(&self, body: &[u8], signature: Option<&str>) -> Result<(), VerificationError>;
}
