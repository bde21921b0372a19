use thiserror::Error;

#[derive(Debug, Error)]
pub enum StripeApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Invalid REST response: {0}")]
    RestResponseError(String),
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("Stripe rejected the request. Error {status}. {message}")]
    QueryError { status: u16, message: String },
    #[error("Malformed signature header: {0}")]
    MalformedSignature(String),
    #[error("Webhook signature does not match the payload")]
    InvalidSignature,
    #[error("Webhook timestamp is outside the accepted tolerance. Timestamp: {timestamp}, now: {now}")]
    StaleTimestamp { timestamp: i64, now: i64 },
}
