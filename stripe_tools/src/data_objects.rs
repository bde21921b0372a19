use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use troca_common::Centavos;

use crate::StripeApiError;

/// The event type Stripe sends when a payment intent settles. The webhook handler acts on this and ignores
/// everything else.
pub const PAYMENT_INTENT_SUCCEEDED: &str = "payment_intent.succeeded";

/// The metadata key carrying the offer id on payment intents we create.
pub const OFFER_ID_METADATA_KEY: &str = "offer_id";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Customer {
    pub id: String,
    pub name: Option<String>,
    pub email: Option<String>,
}

/// The subset of Stripe's payment intent object that the marketplace cares about.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PaymentIntent {
    pub id: String,
    pub amount: Centavos,
    pub currency: String,
    pub status: String,
    pub client_secret: Option<String>,
    pub customer: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl PaymentIntent {
    pub fn is_succeeded(&self) -> bool {
        self.status == "succeeded"
    }

    /// The offer this intent was created for, if the metadata carries one.
    pub fn offer_id(&self) -> Option<i64> {
        self.metadata.get(OFFER_ID_METADATA_KEY).and_then(|v| v.parse::<i64>().ok())
    }
}

/// Parameters for a new payment intent. The currency comes from the API configuration.
#[derive(Debug, Clone)]
pub struct NewPaymentIntent {
    pub amount: Centavos,
    pub customer_id: String,
    pub offer_id: i64,
}

impl NewPaymentIntent {
    pub fn new(amount: Centavos, customer_id: &str, offer_id: i64) -> Self {
        Self { amount, customer_id: customer_id.to_string(), offer_id }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BalanceFunds {
    pub amount: Centavos,
    pub currency: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Balance {
    #[serde(default)]
    pub available: Vec<BalanceFunds>,
    #[serde(default)]
    pub pending: Vec<BalanceFunds>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BalanceTransaction {
    pub id: String,
    pub amount: Centavos,
    pub fee: Centavos,
    pub net: Centavos,
    pub currency: String,
    pub created: i64,
    pub status: String,
    #[serde(rename = "type")]
    pub transaction_type: String,
    pub description: Option<String>,
}

/// A signed event delivered to the webhook endpoint. `data.object` is kept raw; use [`Self::payment_intent`]
/// to interpret it once the event type has been checked.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WebhookEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: EventData,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EventData {
    pub object: Value,
}

impl WebhookEvent {
    pub fn payment_intent(&self) -> Result<PaymentIntent, StripeApiError> {
        serde_json::from_value(self.data.object.clone()).map_err(|e| StripeApiError::JsonError(e.to_string()))
    }
}
