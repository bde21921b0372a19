//! Stripe webhook signature middleware for Actix Web.
//!
//! Stripe signs every webhook delivery with the endpoint's signing secret. The signature arrives in the
//! `Stripe-Signature` header as a timestamp plus one or more HMAC-SHA256 digests over `"{timestamp}.{body}"`.
//!
//! Wrap the webhook route with this middleware to reject deliveries whose signature is missing, stale or wrong
//! before the handler ever runs. The raw body is consumed for verification and re-injected afterwards, so the
//! handler can deserialize the payload as usual.

use std::{
    future::{ready, Ready},
    rc::Rc,
};

use actix_http::h1;
use actix_web::{
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    error::ErrorBadRequest,
    web,
    Error,
};
use futures::future::LocalBoxFuture;
use log::{trace, warn};
use stripe_tools::verify_webhook_signature;
use troca_common::Secret;

pub const STRIPE_SIGNATURE_HEADER: &str = "Stripe-Signature";

pub struct WebhookSignatureMiddlewareFactory {
    secret: Secret<String>,
}

impl WebhookSignatureMiddlewareFactory {
    pub fn new(secret: Secret<String>) -> Self {
        Self { secret }
    }
}

impl<S, B> Transform<S, ServiceRequest> for WebhookSignatureMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = WebhookSignatureMiddlewareService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(WebhookSignatureMiddlewareService { secret: self.secret.clone(), service: Rc::new(service) }))
    }
}

pub struct WebhookSignatureMiddlewareService<S> {
    secret: Secret<String>,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for WebhookSignatureMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;
    type Response = ServiceResponse<B>;

    forward_ready!(service);

    fn call(&self, mut req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let secret = self.secret.reveal().clone();
        Box::pin(async move {
            trace!("🔐️ Checking webhook signature for request");
            let data = req.extract::<web::Bytes>().await.map_err(|e| {
                warn!("🔐️ Failed to extract request data: {:?}", e);
                ErrorBadRequest("Failed to extract request data.")
            })?;
            let header = req
                .headers()
                .get(STRIPE_SIGNATURE_HEADER)
                .and_then(|v| v.to_str().ok())
                .map(|v| v.to_string())
                .ok_or_else(|| {
                    warn!("🔐️ No webhook signature found in request. denying access.");
                    ErrorBadRequest("No webhook signature found.")
                })?;
            match verify_webhook_signature(&secret, &header, data.as_ref()) {
                Ok(()) => {
                    trace!("🔐️ Webhook signature check for request ✅️");
                    req.set_payload(bytes_to_payload(data));
                    service.call(req).await
                },
                Err(e) => {
                    warn!("🔐️ Invalid webhook signature found in request. denying access. {e}");
                    Err(ErrorBadRequest("Invalid webhook signature."))
                },
            }
        })
    }
}

fn bytes_to_payload(buf: web::Bytes) -> Payload {
    let (_, mut pl) = h1::Payload::create(true);
    pl.unread_data(buf);
    Payload::from(pl)
}
