use std::time::Duration;

use kekspay_engine::gateway_objects::StatusResponse;
use kekspay_server::data_objects::STATUS_CHECK_ACTION;
use log::trace;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
};
use url::Url;

use crate::poller::{StatusSource, TransportFailure};

/// Asks a KEKS Pay server for the payment status of an order, the same way the receipt page does.
#[derive(Debug, Clone)]
pub struct HttpStatusSource {
    client: Client,
    endpoint: Url,
}

impl HttpStatusSource {
    pub fn new(server: &Url, request_timeout: Duration) -> Result<Self, TransportFailure> {
        let mut headers = HeaderMap::new();
        headers.insert("Accept", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .user_agent("KEKS Pay Status Poller")
            .default_headers(headers)
            .timeout(request_timeout)
            .build()
            .map_err(|e| TransportFailure::Request(format!("Failed to create HTTP client. {e}")))?;
        let endpoint = server.join("/ajax").map_err(|e| TransportFailure::Request(format!("Invalid server URL. {e}")))?;
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

impl StatusSource for HttpStatusSource {
    async fn fetch_status(&self, order_id: &str, nonce: &str) -> Result<StatusResponse, TransportFailure> {
        let form = [("action", STATUS_CHECK_ACTION), ("_ajax_nonce", nonce), ("order_id", order_id)];
        trace!("🕰️ POST {} for order {order_id}", self.endpoint);
        let res = self
            .client
            .post(self.endpoint.clone())
            .form(&form)
            .send()
            .await
            .map_err(|e| TransportFailure::Request(e.to_string()))?;
        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(TransportFailure::Status { status: status.as_u16(), body });
        }
        res.json::<StatusResponse>().await.map_err(|e| TransportFailure::Decode(e.to_string()))
    }
}
