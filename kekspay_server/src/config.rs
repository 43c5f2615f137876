use std::{env, io::Write, net::IpAddr};

use kekspay_common::{
    helpers::{parse_boolean_flag, parse_list},
    Secret,
};
use kekspay_engine::{gateway_api::settings::DEFAULT_CURRENCY, GatewaySettings};
use log::*;
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use tempfile::NamedTempFile;
use url::Url;

use crate::errors::ServerError;

const DEFAULT_KPG_HOST: &str = "127.0.0.1";
const DEFAULT_KPG_PORT: u16 = 8370;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/kekspay.db";
const DEFAULT_NONCE_LIFETIME_SECS: u64 = 86_400;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// The address shoppers use to reach this server. Receipt page links are built from it.
    pub public_url: String,
    /// The key the shop platform presents in the `X-Kekspay-Api-Key` header.
    pub api_key: Secret<String>,
    pub nonce: NonceConfig,
    /// If true, the X-Forwarded-For header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_x_forwarded_for: bool,
    /// If true, the Forwarded header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_forwarded: bool,
    /// If supplied, KEKS Pay notifications are only accepted from these addresses.
    pub webhook_whitelist: Option<Vec<IpAddr>>,
    pub gateway: GatewaySettings,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_KPG_HOST.to_string(),
            port: DEFAULT_KPG_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            public_url: format!("http://{DEFAULT_KPG_HOST}:{DEFAULT_KPG_PORT}"),
            api_key: Secret::default(),
            nonce: NonceConfig::default(),
            use_x_forwarded_for: false,
            use_forwarded: false,
            webhook_whitelist: None,
            gateway: GatewaySettings::default(),
        }
    }
}

impl ServerConfig {
    pub fn from_env_or_default() -> Self {
        let host = env::var("KPG_HOST").ok().unwrap_or_else(|| DEFAULT_KPG_HOST.into());
        let port = env::var("KPG_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for KPG_PORT. {e} Using the default, {DEFAULT_KPG_PORT}, instead."
                    );
                    DEFAULT_KPG_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_KPG_PORT);
        let database_url = env::var("KPG_DATABASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ KPG_DATABASE_URL is not set. Using the default, {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.to_string()
        });
        let public_url = env::var("KPG_PUBLIC_URL")
            .ok()
            .map(|s| s.trim_end_matches('/').to_string())
            .map(|s| {
                if let Err(e) = Url::parse(&s) {
                    error!("🪛️ KPG_PUBLIC_URL ({s}) is not a valid URL. {e} Checkouts will fail.");
                }
                s
            })
            .unwrap_or_else(|| {
                let url = format!("http://{host}:{port}");
                warn!("🪛️ KPG_PUBLIC_URL is not set. Shoppers will be sent to {url}, which is probably not right.");
                url
            });
        let api_key = env::var("KPG_API_KEY").ok().filter(|s| !s.is_empty()).map(Secret::new).unwrap_or_else(|| {
            let key = random_secret();
            warn!("🚨️🚨️🚨️ KPG_API_KEY has not been set. I'm using a random value for this session. 🚨️🚨️🚨️");
            save_session_secret("KPG_API_KEY", key.reveal());
            key
        });
        let nonce = NonceConfig::from_env_or_default();
        let use_x_forwarded_for = parse_boolean_flag(env::var("KPG_USE_X_FORWARDED_FOR").ok(), false);
        let use_forwarded = parse_boolean_flag(env::var("KPG_USE_FORWARDED").ok(), false);
        let webhook_whitelist = configure_webhook_whitelist();
        let gateway = gateway_settings_from_env();
        Self {
            host,
            port,
            database_url,
            public_url,
            api_key,
            nonce,
            use_x_forwarded_for,
            use_forwarded,
            webhook_whitelist,
            gateway,
        }
    }
}

fn configure_webhook_whitelist() -> Option<Vec<IpAddr>> {
    let whitelist = env::var("KPG_WEBHOOK_IP_WHITELIST").ok().and_then(|s| {
        if ["none", "false", "0", ""].contains(&s.trim().to_lowercase().as_str()) {
            info!("🪛️ KEKS Pay IP whitelist is disabled.");
            return None;
        }
        let ip_addrs = parse_list(&s)
            .into_iter()
            .filter_map(|s| {
                s.parse()
                    .map_err(|e| warn!("🪛️ Ignoring invalid IP address ({s}) in KPG_WEBHOOK_IP_WHITELIST: {e}"))
                    .ok()
            })
            .collect::<Vec<IpAddr>>();
        Some(ip_addrs)
    });
    match &whitelist {
        Some(whitelist) if whitelist.is_empty() => {
            warn!(
                "🚨️ The KEKS Pay IP whitelist was configured, but is empty. The server will run, but won't accept any \
                 payment notifications."
            );
        },
        None => {
            info!("🪛️ No KEKS Pay IP whitelist is set. Only signature validation will be used.");
        },
        Some(v) => {
            let addrs = v.iter().map(|a| a.to_string()).collect::<Vec<_>>().join(", ");
            info!("🪛️ KEKS Pay IP whitelist: {addrs}");
        },
    }
    whitelist
}

/// Reads the merchant settings of the KEKS Pay gateway. Anything not set falls back to [`GatewaySettings::default`].
pub fn gateway_settings_from_env() -> GatewaySettings {
    let defaults = GatewaySettings::default();
    let text = |name: &str, default: String| env::var(name).ok().unwrap_or(default);
    let secret_key = env::var("KPG_SECRET_KEY").map(Secret::new).unwrap_or_else(|_| {
        warn!("🪛️ KPG_SECRET_KEY is not set. Payment notifications cannot be verified.");
        Secret::default()
    });
    let shop_currency = text("KPG_SHOP_CURRENCY", DEFAULT_CURRENCY.to_string()).trim().to_uppercase();
    let supported_currencies = env::var("KPG_SUPPORTED_CURRENCIES")
        .map(|s| parse_list(&s).into_iter().map(|c| c.to_uppercase()).collect())
        .unwrap_or(defaults.supported_currencies);
    GatewaySettings {
        enabled: parse_boolean_flag(env::var("KPG_ENABLED").ok(), true),
        test_mode: parse_boolean_flag(env::var("KPG_TEST_MODE").ok(), false),
        tid: text("KPG_TID", String::default()),
        cid: text("KPG_CID", String::default()),
        secret_key,
        shop_currency,
        supported_currencies,
        store_name: text("KPG_STORE_NAME", defaults.store_name),
        title: text("KPG_TITLE", defaults.title),
        description_msg: text("KPG_DESCRIPTION_MSG", defaults.description_msg),
        confirmation_msg: text("KPG_CONFIRMATION_MSG", defaults.confirmation_msg),
        receipt_msg: text("KPG_RECEIPT_MSG", defaults.receipt_msg),
        payment_base_url: text("KPG_PAYMENT_BASE_URL", defaults.payment_base_url),
        test_payment_base_url: text("KPG_TEST_PAYMENT_BASE_URL", defaults.test_payment_base_url),
        use_logger: parse_boolean_flag(env::var("KPG_USE_LOGGER").ok(), true),
    }
}

//-------------------------------------------------  NonceConfig  ------------------------------------------------------
#[derive(Clone, Debug)]
pub struct NonceConfig {
    /// Key for the anti-forgery tokens handed to the status poller.
    pub secret: Secret<String>,
    /// How long a token stays valid, in seconds. Tokens are accepted for at least half of this.
    pub lifetime_secs: u64,
}

impl Default for NonceConfig {
    fn default() -> Self {
        Self { secret: random_secret(), lifetime_secs: DEFAULT_NONCE_LIFETIME_SECS }
    }
}

impl NonceConfig {
    pub fn from_env_or_default() -> Self {
        let secret = env::var("KPG_NONCE_SECRET").ok().filter(|s| !s.is_empty()).map(Secret::new).unwrap_or_else(|| {
            warn!(
                "🚨️🚨️🚨️ KPG_NONCE_SECRET has not been set. I'm using a random value for this session. Status checks \
                 from receipt pages issued before a restart will be rejected. 🚨️🚨️🚨️"
            );
            random_secret()
        });
        let lifetime_secs = env::var("KPG_NONCE_LIFETIME")
            .map_err(|_| {
                info!("🪛️ KPG_NONCE_LIFETIME is not set. Using the default value of {DEFAULT_NONCE_LIFETIME_SECS} s.")
            })
            .and_then(|s| {
                s.parse::<u64>()
                    .map_err(|e| warn!("🪛️ Invalid configuration value for KPG_NONCE_LIFETIME. {e}"))
                    .and_then(|v| if v < 2 { Err(warn!("🪛️ KPG_NONCE_LIFETIME is too short.")) } else { Ok(v) })
            })
            .ok()
            .unwrap_or(DEFAULT_NONCE_LIFETIME_SECS);
        Self { secret, lifetime_secs }
    }
}

fn random_secret() -> Secret<String> {
    let s: String = thread_rng().sample_iter(&Alphanumeric).take(32).map(char::from).collect();
    Secret::new(s)
}

/// Session secrets are never logged. They are written to a temporary file so that the operator can still get hold
/// of them.
fn save_session_secret(name: &str, value: &str) {
    let tmpfile = NamedTempFile::new().ok().and_then(|f| f.keep().ok());
    match tmpfile {
        Some((mut f, p)) => match writeln!(f, "{name}={value}") {
            Ok(()) => warn!(
                "🚨️🚨️🚨️ The {name} value for this session was written to {}. If this is a production instance, you \
                 are doing it wrong! Set {name} in the environment instead. 🚨️🚨️🚨️",
                p.to_str().unwrap_or("???")
            ),
            Err(e) => warn!("🪛️ Could not write {name} to the temporary file. {e}"),
        },
        None => warn!("🪛️ Could not create a temporary file to store {name}."),
    }
}

//-------------------------------------------------  ServerOptions  ----------------------------------------------------
/// A subset of the server configuration that is used to configure the server's behaviour. Generally we try to keep this
/// as small as possible, and exclude secrets to avoid passing sensitive information around the system.
#[derive(Clone, Debug)]
pub struct ServerOptions {
    pub public_url: String,
    pub use_x_forwarded_for: bool,
    pub use_forwarded: bool,
}

impl ServerOptions {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            public_url: config.public_url.clone(),
            use_x_forwarded_for: config.use_x_forwarded_for,
            use_forwarded: config.use_forwarded,
        }
    }

    /// The receipt page for the order, where the shopper is sent after checkout. The order id is percent-encoded as a
    /// single path segment.
    pub fn receipt_page_url(&self, order_id: &str) -> Result<String, ServerError> {
        let mut url = Url::parse(&self.public_url).map_err(|e| {
            ServerError::ConfigurationError(format!("{} is not a valid public URL. {e}", self.public_url))
        })?;
        url.path_segments_mut()
            .map_err(|_| ServerError::ConfigurationError(format!("{} cannot be a base URL", self.public_url)))?
            .pop_if_empty()
            .extend(["order", order_id, "receipt"]);
        Ok(url.to_string())
    }
}
