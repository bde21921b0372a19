mod api;
mod config;
mod error;
mod webhook;

mod data_objects;

pub use api::StripeApi;
pub use config::StripeConfig;
pub use data_objects::{
    Balance,
    BalanceFunds,
    BalanceTransaction,
    Customer,
    EventData,
    NewPaymentIntent,
    PaymentIntent,
    WebhookEvent,
    PAYMENT_INTENT_SUCCEEDED,
};
pub use error::StripeApiError;
pub use webhook::{sign_payload, verify_webhook_signature, SignatureHeader, SIGNATURE_TOLERANCE_SECONDS};
