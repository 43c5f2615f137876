//! API key middleware for the KEKS Pay server.
//! This middleware can be placed on any route or scope.
//!
//! It checks the `X-Kekspay-Api-Key` header of the incoming request against the configured key. Requests without the
//! correct key never reach the handler and get a 401 Unauthorized response.

use std::{pin::Pin, rc::Rc};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error,
};
use futures::{
    future::{ok, Ready},
    Future,
};
use kekspay_common::Secret;
use log::*;

use crate::errors::{AuthError, ServerError};

pub const API_KEY_HEADER: &str = "X-Kekspay-Api-Key";

pub struct ApiKeyMiddlewareFactory {
    api_key: Secret<String>,
}

impl ApiKeyMiddlewareFactory {
    pub fn new(api_key: Secret<String>) -> Self {
        ApiKeyMiddlewareFactory { api_key }
    }
}

impl<S, B> Transform<S, ServiceRequest> for ApiKeyMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = ApiKeyMiddlewareService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(ApiKeyMiddlewareService { api_key: self.api_key.clone(), service: Rc::new(service) })
    }
}

pub struct ApiKeyMiddlewareService<S> {
    api_key: Secret<String>,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for ApiKeyMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;
    type Response = ServiceResponse<B>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let check = check_api_key(&req, &self.api_key);
        Box::pin(async move {
            match check {
                Ok(()) => service.call(req).await,
                Err(e) => Err(ServerError::AuthenticationError(e).into()),
            }
        })
    }
}

fn check_api_key(req: &ServiceRequest, api_key: &Secret<String>) -> Result<(), AuthError> {
    let presented = req.headers().get(API_KEY_HEADER).and_then(|v| v.to_str().ok()).ok_or_else(|| {
        debug!("🔐️ No API key in request to {}", req.path());
        AuthError::MissingApiKey
    })?;
    if api_key.is_set() && constant_time_eq(presented.as_bytes(), api_key.reveal().as_bytes()) {
        trace!("🔐️ API key for {} ✅️", req.path());
        Ok(())
    } else {
        warn!("🔐️ Invalid API key presented for {}", req.path());
        Err(AuthError::InvalidApiKey)
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
