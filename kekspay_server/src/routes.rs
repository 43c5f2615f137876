//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests:
//! ```nocompile
//!     fn my_handler() -> impl Responder {
//!         std::thread::sleep(Duration::from_secs(5)); // <-- Bad practice! Will cause the current worker thread to
//! hang!
//!     }
//! ```
//! For this reason, any long, non-cpu-bound operation (e.g. I/O, database operations, etc.) should be expressed as
//! futures or asynchronous functions. Async handlers get executed concurrently by worker threads and thus don’t block
//! execution:
//!
//! ```nocompile
//!     async fn my_handler() -> impl Responder {
//!         tokio::time::sleep(Duration::from_secs(5)).await; // <-- Ok. Worker thread will handle other requests here
//!     }
//! ```
use actix_web::{get, web, HttpRequest, HttpResponse, Responder};
use kekspay_engine::{
    db_types::{NewOrder, OrderId},
    gateway_objects::{NotificationAck, NotificationResult},
    GatewayApi,
    OrderStore,
};
use log::*;

use crate::{
    auth::NonceIssuer,
    config::ServerOptions,
    data_objects::{CheckoutResult, ReceiptView, SettingsCheckResult, StatusCheckForm, STATUS_CHECK_ACTION},
    errors::ServerError,
    webhook_auth::SIGNATURE_HEADER,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Status check  ----------------------------------------------------
route!(status_check => Post "/ajax" impl OrderStore);
/// The endpoint the status poller calls.
///
/// The request is form encoded, `action=kekspay_status_check&_ajax_nonce=...&order_id=...`, and the nonce must be
/// the one issued with the order's receipt page. The response is `{"status": "..."}`, with a `redirect` URL once the
/// payment has been resolved. This call never modifies the order.
pub async fn status_check<B: OrderStore>(
    form: web::Form<StatusCheckForm>,
    api: web::Data<GatewayApi<B>>,
    nonces: web::Data<NonceIssuer>,
) -> Result<HttpResponse, ServerError> {
    let form = form.into_inner();
    trace!("💻️ Received status check for order {}", form.order_id);
    if form.action != STATUS_CHECK_ACTION {
        debug!("💻️ Status endpoint called with unknown action '{}'", form.action);
        return Err(ServerError::UnknownAction(form.action));
    }
    nonces.verify(&form.nonce, STATUS_CHECK_ACTION, &form.order_id)?;
    let order_id = form.order_id.parse::<OrderId>().map_err(|e| ServerError::InvalidRequestBody(e.to_string()))?;
    let status = api.payment_status(&order_id).await?;
    Ok(HttpResponse::Ok().json(status))
}

//----------------------------------------------   Receipt  ----------------------------------------------------
route!(receipt => Get "/order/{order_id}/receipt" impl OrderStore);
/// The receipt (payment initiation) page data for an order.
///
/// Showing the receipt marks the order as awaiting payment. If there is nothing to show (unknown order, or the
/// gateway cannot take payments right now), the response is `204 No Content`.
pub async fn receipt<B: OrderStore>(
    path: web::Path<String>,
    api: web::Data<GatewayApi<B>>,
    nonces: web::Data<NonceIssuer>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner().parse::<OrderId>().map_err(|e| ServerError::InvalidRequestPath(e.to_string()))?;
    trace!("💻️ Received receipt request for order {order_id}");
    match api.show_receipt(&order_id).await? {
        Some(receipt) => {
            let nonce = nonces.issue(STATUS_CHECK_ACTION, order_id.as_str());
            Ok(HttpResponse::Ok().json(ReceiptView::new(receipt, nonce)))
        },
        None => Ok(HttpResponse::NoContent().finish()),
    }
}

//----------------------------------------------   Confirmation  ----------------------------------------------------
route!(confirmation => Post "/order/{order_id}/confirmation" impl OrderStore);
pub async fn confirmation<B: OrderStore>(
    path: web::Path<String>,
    api: web::Data<GatewayApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner().parse::<OrderId>().map_err(|e| ServerError::InvalidRequestPath(e.to_string()))?;
    trace!("💻️ Shopper returned from KEKS Pay for order {order_id}");
    let view = api.confirm_order(&order_id).await?;
    Ok(HttpResponse::Ok().json(view))
}

//----------------------------------------------   Webhook  ----------------------------------------------------
route!(webhook => Post "" impl OrderStore);
/// KEKS Pay's payment notification (IPN). Mounted under the `/webhook` scope, behind the optional IP whitelist.
///
/// The raw body is handed to the gateway as is, since the signature covers the exact bytes that were sent.
/// Repeat deliveries are acknowledged like the first one.
pub async fn webhook<B: OrderStore>(
    req: HttpRequest,
    body: web::Bytes,
    api: web::Data<GatewayApi<B>>,
) -> Result<HttpResponse, ServerError> {
    trace!("💻️ Received KEKS Pay notification ({} bytes)", body.len());
    let signature = req.headers().get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok());
    match api.process_notification(body.as_ref(), signature).await? {
        NotificationResult::Applied { order_id, status } => {
            info!("💻️ Notification for order {order_id} applied. Payment is {status}");
        },
        NotificationResult::Duplicate { order_id } => {
            debug!("💻️ Duplicate notification for order {order_id} acknowledged");
        },
    }
    Ok(HttpResponse::Ok().json(NotificationAck::accepted()))
}

//----------------------------------------------   Gateway description  ---------------------------------------------
route!(gateway_description => Get "/gateway" impl OrderStore);
pub async fn gateway_description<B: OrderStore>(api: web::Data<GatewayApi<B>>) -> impl Responder {
    trace!("💻️ Received gateway description request");
    HttpResponse::Ok().json(api.description())
}

//----------------------------------------------   Checkout  ----------------------------------------------------
route!(checkout => Post "/orders" impl OrderStore);
/// Hands a new order to the gateway. Requires the shop's API key.
///
/// On success, the response tells the shop where to send the shopper: `{"result": "success", "redirect": "..."}`.
pub async fn checkout<B: OrderStore>(
    body: web::Json<NewOrder>,
    api: web::Data<GatewayApi<B>>,
    options: web::Data<ServerOptions>,
) -> Result<HttpResponse, ServerError> {
    let order = body.into_inner();
    debug!("💻️ Received checkout request for order {}", order.order_id);
    let order = api.checkout(order).await?;
    let redirect = options.receipt_page_url(order.order_id.as_str())?;
    Ok(HttpResponse::Ok().json(CheckoutResult::success(redirect)))
}

//----------------------------------------------   Settings check  --------------------------------------------------
route!(settings_check => Get "/settings/check" impl OrderStore);
pub async fn settings_check<B: OrderStore>(api: web::Data<GatewayApi<B>>) -> impl Responder {
    trace!("💻️ Received settings check request");
    let settings = api.settings();
    HttpResponse::Ok().json(SettingsCheckResult::new(settings.is_available(), settings.check()))
}
