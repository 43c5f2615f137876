use thiserror::Error;

use crate::{db_types::Order, gateway_api::GatewaySettings};

#[derive(Debug, Clone, Error)]
pub enum LinkBuilderError {
    #[error("Could not build the payment URL. {0}")]
    InvalidUrl(String),
    #[error("Could not render the QR code. {0}")]
    QrCode(String),
}

/// Builds the payment reference the shopper opens in the KEKS Pay app.
///
/// Implementations are pure functions of the order and the gateway settings.
pub trait LinkBuilder: Send + Sync {
    fn payment_url(&self, order: &Order, settings: &GatewaySettings) -> Result<String, LinkBuilderError>;

    /// The payment URL, QR encoded and rendered as an SVG document.
    fn payment_qr(&self, order: &Order, settings: &GatewaySettings) -> Result<String, LinkBuilderError> {
        let url = self.payment_url(order, settings)?;
        crate::helpers::render_qr_svg(&url)
    }
}
