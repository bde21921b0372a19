mod webhook_sig;

pub use webhook_sig::{WebhookSignatureMiddlewareFactory, WebhookSignatureMiddlewareService, STRIPE_SIGNATURE_HEADER};
