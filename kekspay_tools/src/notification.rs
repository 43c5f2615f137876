//! Builds signed KEKS Pay payment notifications, for exercising a server's webhook by hand.
use anyhow::{anyhow, Result};
use kekspay_engine::gateway_objects::Notification;
use kekspay_server::{helpers::calculate_hmac, webhook_auth::SIGNATURE_HEADER};
use log::info;
use reqwest::Client;
use url::Url;

use crate::NotificationParams;

pub struct SignedNotification {
    pub body: String,
    pub signature: String,
}

impl SignedNotification {
    pub fn new(notification: &Notification, secret: &str) -> Result<Self> {
        let body = serde_json::to_string(notification)?;
        let signature = calculate_hmac(secret, body.as_bytes());
        Ok(Self { body, signature })
    }
}

impl From<&NotificationParams> for Notification {
    fn from(params: &NotificationParams) -> Self {
        let message = params.message.clone().or_else(|| {
            let msg = if params.status == 0 { "Success" } else { "Payment failed" };
            Some(msg.to_string())
        });
        Notification {
            bill_id: params.order_id.clone(),
            status: params.status,
            message,
            keks_id: params.keks_id.clone(),
            tid: params.tid.clone(),
            amount: params.amount,
        }
    }
}

pub async fn handle_notification_command(params: NotificationParams) -> Result<()> {
    let notification = Notification::from(&params);
    let signed = SignedNotification::new(&notification, &params.secret)?;
    println!("----------------------------- Notification -----------------------------");
    println!("{}", signed.body);
    println!("{SIGNATURE_HEADER}: {}", signed.signature);
    println!("------------------------------------------------------------------------");
    if let Some(server) = params.send_to {
        send_notification(&server, signed).await?;
    }
    Ok(())
}

async fn send_notification(server: &Url, signed: SignedNotification) -> Result<()> {
    let url = server.join("/webhook").map_err(|e| anyhow!("Failed to join URL: {e}"))?;
    info!("Sending notification to {url}");
    let res = Client::new()
        .post(url)
        .header("Content-Type", "application/json")
        .header(SIGNATURE_HEADER, signed.signature)
        .body(signed.body)
        .send()
        .await?;
    let status = res.status();
    let reply = res.text().await?;
    println!("Server replied with {status}: {reply}");
    if status.is_success() {
        Ok(())
    } else {
        Err(anyhow!("The notification was not accepted"))
    }
}
