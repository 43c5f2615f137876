use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use dotenvy::dotenv;
use kekspay_tools::{
    client::HttpStatusSource,
    poller::{PollOutcome, PollerConfig, StatusPoller},
};
use url::Url;

mod notification;
mod qr;

use crate::{notification::handle_notification_command, qr::print_qr_code};

#[derive(Parser, Debug)]
#[command(version = "0.1.0", about = "Tools for the KEKS Pay payment gateway")]
pub struct Arguments {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Wait for an order's payment to be resolved, the way the receipt page does. Prints the redirect URL.
    #[clap(name = "poll")]
    Poll(PollParams),
    /// Generate a signed payment notification, and optionally send it to a server's webhook.
    #[clap(name = "notify")]
    Notification(NotificationParams),
    /// Print a payment link as a QR code
    #[clap(name = "qr")]
    QrCode {
        #[arg(required = true, index = 1)]
        link: String,
    },
}

#[derive(Debug, Args)]
pub struct PollParams {
    /// The base URL of the KEKS Pay server
    #[arg(short = 's', long = "server", env = "KPG_PUBLIC_URL")]
    server: Url,
    /// The order to wait for
    #[arg(short = 'o', long = "order")]
    order_id: String,
    /// The nonce from the order's receipt page
    #[arg(short = 'n', long = "nonce")]
    nonce: String,
    /// Seconds between status checks
    #[arg(short = 'i', long = "interval", default_value = "15")]
    interval: u64,
    /// Seconds after which polling stops
    #[arg(short = 't', long = "timeout", default_value = "1800")]
    timeout: u64,
}

#[derive(Debug, Args)]
pub struct NotificationParams {
    /// The merchant's secret key, used to sign the notification
    #[arg(short = 'k', long = "secret", env = "KPG_SECRET_KEY", hide_env_values = true)]
    secret: String,
    /// The order (bill) id
    #[arg(short = 'o', long = "order")]
    order_id: String,
    /// 0 for a successful payment. Anything else is a failure.
    #[arg(short = 's', long = "status", default_value = "0")]
    status: i64,
    /// KEKS Pay's transaction id
    #[arg(short = 'x', long = "keks-id")]
    keks_id: String,
    /// The terminal id
    #[arg(short = 't', long = "tid", env = "KPG_TID")]
    tid: Option<String>,
    /// The amount paid, in major units
    #[arg(short = 'a', long = "amount")]
    amount: Option<f64>,
    #[arg(short = 'm', long = "message")]
    message: Option<String>,
    /// Send the notification to the server at this URL
    #[arg(long = "send")]
    send_to: Option<Url>,
}

#[tokio::main]
async fn main() {
    dotenv().ok();
    env_logger::init();
    let cli = Arguments::parse();
    let result = match cli.command {
        Command::Poll(params) => poll(params).await,
        Command::Notification(params) => handle_notification_command(params).await,
        Command::QrCode { link } => print_qr_code(link),
    };
    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn poll(params: PollParams) -> anyhow::Result<()> {
    let config = PollerConfig::new(Duration::from_secs(params.interval), Duration::from_secs(params.timeout));
    let source = HttpStatusSource::new(&params.server, config.request_timeout())?;
    let poller = StatusPoller::new(source, params.order_id, params.nonce, config)?;
    match poller.run().await {
        PollOutcome::Redirect(url) => {
            println!("{url}");
            Ok(())
        },
        PollOutcome::TimedOut => Err(anyhow::anyhow!("Order {} was not resolved in time", poller.order_id())),
    }
}
