use std::{future::Future, pin::Pin, sync::Arc, time::Duration};

use actix_web::{
    dev::{Server, Service},
    http::KeepAlive,
    middleware::Logger,
    web,
    App,
    HttpServer,
};
use futures::{future::ok, FutureExt};
use kekspay_engine::{
    events::{EventHandlers, EventHooks, EventProducers},
    helpers::KeksPayLinkBuilder,
    GatewayApi,
    LinkBuilder,
    NotificationVerifier,
    SqliteDatabase,
};
use log::*;

use crate::{
    auth::NonceIssuer,
    config::{ServerConfig, ServerOptions},
    errors::{AuthError, ServerError},
    helpers::{get_remote_ip, peer_is_whitelisted},
    middleware::ApiKeyMiddlewareFactory,
    routes::{
        health,
        CheckoutRoute,
        ConfirmationRoute,
        GatewayDescriptionRoute,
        ReceiptRoute,
        SettingsCheckRoute,
        StatusCheckRoute,
        WebhookRoute,
    },
    webhook_auth::HmacSha256Verifier,
};

const EVENT_BUFFER_SIZE: usize = 100;

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.run_migrations().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    report_settings(&config);
    let handlers = EventHandlers::new(EVENT_BUFFER_SIZE, default_hooks());
    let producers = handlers.producers();
    handlers.start_handlers();
    let srv = create_server_instance(config, db, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

/// Configuration problems are reported, but never stop the server. An unavailable gateway simply refuses payments.
fn report_settings(config: &ServerConfig) {
    let settings = &config.gateway;
    if !settings.enabled {
        info!("🪛️ The KEKS Pay gateway is disabled");
    }
    for warning in settings.check() {
        warn!("🪛️ {warning}");
    }
    if settings.is_available() {
        info!("🪛️ KEKS Pay is available for {} orders (terminal {})", settings.shop_currency, settings.tid);
    }
}

fn default_hooks() -> EventHooks {
    let mut hooks = EventHooks::default();
    hooks.on_payment_settled(|ev| {
        Box::pin(async move {
            info!(
                "📬️ Payment for order {} ({} {}) settled as {} [{}]",
                ev.order.order_id, ev.order.total, ev.order.currency, ev.status, ev.keks_id
            );
        }) as Pin<Box<dyn Future<Output = ()> + Send>>
    });
    hooks
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let nonces = NonceIssuer::new(&config.nonce)?;
    let links: Arc<dyn LinkBuilder> = Arc::new(KeksPayLinkBuilder::new());
    let verifier: Arc<dyn NotificationVerifier> = Arc::new(HmacSha256Verifier::new(config.gateway.secret_key.clone()));
    let host = config.host.clone();
    let port = config.port;
    let srv = HttpServer::new(move || {
        let gateway_api = GatewayApi::new(
            db.clone(),
            config.gateway.clone(),
            Arc::clone(&links),
            Arc::clone(&verifier),
            producers.clone(),
        );
        let options = ServerOptions::from_config(&config);
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("kps::access_log"))
            .app_data(web::Data::new(gateway_api))
            .app_data(web::Data::new(nonces.clone()))
            .app_data(web::Data::new(options));
        // Routes used by the shop platform
        let api_scope = web::scope("/api")
            .wrap(ApiKeyMiddlewareFactory::new(config.api_key.clone()))
            .service(CheckoutRoute::<SqliteDatabase>::new())
            .service(SettingsCheckRoute::<SqliteDatabase>::new());
        let use_x_forwarded_for = config.use_x_forwarded_for;
        let use_forwarded = config.use_forwarded;
        let whitelist = config.webhook_whitelist.clone();
        // KEKS Pay notifications, optionally restricted to known addresses
        let webhook_scope = web::scope("/webhook")
            .wrap_fn(move |req, srv| {
                let peer_ip = get_remote_ip(req.request(), use_x_forwarded_for, use_forwarded);
                if peer_is_whitelisted(peer_ip, whitelist.as_deref()) {
                    srv.call(req)
                } else {
                    let err = ServerError::AuthenticationError(AuthError::ForbiddenPeer);
                    ok(req.error_response(err)).boxed_local()
                }
            })
            .service(WebhookRoute::<SqliteDatabase>::new());
        app.service(health)
            .service(api_scope)
            .service(StatusCheckRoute::<SqliteDatabase>::new())
            .service(ReceiptRoute::<SqliteDatabase>::new())
            .service(ConfirmationRoute::<SqliteDatabase>::new())
            .service(GatewayDescriptionRoute::<SqliteDatabase>::new())
            .service(webhook_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((host.as_str(), port))?
    .run();
    Ok(srv)
}
