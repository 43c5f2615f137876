use url::Url;

use crate::{
    db_types::Order,
    gateway_api::GatewaySettings,
    traits::{LinkBuilder, LinkBuilderError},
};

/// Builds KEKS Pay "sell" links.
///
/// The link carries the merchant identifiers, the bill (order) id and amount, and the pages the app returns the
/// shopper to. Test mode switches the base URL to the sandbox.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeksPayLinkBuilder;

impl KeksPayLinkBuilder {
    pub fn new() -> Self {
        Self
    }
}

impl LinkBuilder for KeksPayLinkBuilder {
    fn payment_url(&self, order: &Order, settings: &GatewaySettings) -> Result<String, LinkBuilderError> {
        let mut url =
            Url::parse(settings.payment_base_url()).map_err(|e| LinkBuilderError::InvalidUrl(e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("qr_type", "1")
            .append_pair("cid", &settings.cid)
            .append_pair("tid", &settings.tid)
            .append_pair("bill_id", order.order_id.as_str())
            .append_pair("amount", &order.total.to_string())
            .append_pair("currency", &order.currency)
            .append_pair("store", &settings.store_name)
            .append_pair("success_url", &order.success_url)
            .append_pair("fail_url", &order.cancel_url);
        Ok(url.to_string())
    }
}
