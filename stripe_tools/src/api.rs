use std::sync::Arc;

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
    Method,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use crate::{
    config::StripeConfig,
    data_objects::{Balance, BalanceTransaction, Customer, NewPaymentIntent, PaymentIntent, OFFER_ID_METADATA_KEY},
    StripeApiError,
};

#[derive(Clone)]
pub struct StripeApi {
    config: StripeConfig,
    client: Arc<Client>,
}

impl StripeApi {
    pub fn new(config: StripeConfig) -> Result<Self, StripeApiError> {
        let mut headers = HeaderMap::with_capacity(2);
        let bearer = format!("Bearer {}", config.secret_key.reveal());
        let mut val = HeaderValue::from_str(&bearer).map_err(|e| StripeApiError::Initialization(e.to_string()))?;
        val.set_sensitive(true);
        headers.insert("Authorization", val);
        let version =
            HeaderValue::from_str(&config.api_version).map_err(|e| StripeApiError::Initialization(e.to_string()))?;
        headers.insert("Stripe-Version", version);
        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| StripeApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    /// Stripe takes form-encoded bodies on writes and returns JSON everywhere.
    pub async fn rest_query<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, &str)],
        form: Option<B>,
    ) -> Result<T, StripeApiError> {
        let url = self.url(path);
        trace!("Sending REST query: {url}");
        let mut req = self.client.request(method, url);
        if !params.is_empty() {
            req = req.query(params);
        }
        if let Some(form) = form {
            req = req.form(&form);
        }
        let response = req.send().await.map_err(|e| StripeApiError::RestResponseError(e.to_string()))?;
        if response.status().is_success() {
            trace!("REST query successful. {}", response.status());
            response.json::<T>().await.map_err(|e| StripeApiError::JsonError(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let text = response.text().await.map_err(|e| StripeApiError::RestResponseError(e.to_string()))?;
            // Stripe wraps failures in an `error` envelope. Fall back to the raw body if it isn't one.
            let message = serde_json::from_str::<Value>(&text)
                .ok()
                .and_then(|v| v["error"]["message"].as_str().map(|s| s.to_string()))
                .unwrap_or(text);
            Err(StripeApiError::QueryError { status, message })
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("https://api.stripe.com/v1{path}")
    }

    pub async fn create_customer(&self, name: &str, email: &str) -> Result<Customer, StripeApiError> {
        debug!("Creating Stripe customer for {email}");
        let form = [("name", name), ("email", email)];
        let customer = self.rest_query::<Customer, _>(Method::POST, "/customers", &[], Some(form)).await?;
        info!("Created Stripe customer {}", customer.id);
        Ok(customer)
    }

    /// Creates a card payment intent for the given amount, tagged with the offer id so that the webhook can
    /// find its way back to the negotiation.
    pub async fn create_payment_intent(&self, new_intent: NewPaymentIntent) -> Result<PaymentIntent, StripeApiError> {
        let amount = new_intent.amount.value().to_string();
        let offer_id = new_intent.offer_id.to_string();
        let metadata_key = format!("metadata[{OFFER_ID_METADATA_KEY}]");
        let form = [
            ("amount", amount.as_str()),
            ("currency", self.config.currency.as_str()),
            ("customer", new_intent.customer_id.as_str()),
            (metadata_key.as_str(), offer_id.as_str()),
            ("automatic_payment_methods[enabled]", "true"),
        ];
        debug!("Creating payment intent of {} for offer #{}", new_intent.amount, new_intent.offer_id);
        let intent = self.rest_query::<PaymentIntent, _>(Method::POST, "/payment_intents", &[], Some(form)).await?;
        info!("Created payment intent {} for offer #{}", intent.id, new_intent.offer_id);
        Ok(intent)
    }

    pub async fn fetch_payment_intent(&self, intent_id: &str) -> Result<PaymentIntent, StripeApiError> {
        let path = format!("/payment_intents/{intent_id}");
        debug!("Fetching payment intent {intent_id}");
        let intent = self.rest_query::<PaymentIntent, ()>(Method::GET, &path, &[], None).await?;
        debug!("Payment intent {intent_id} is '{}'", intent.status);
        Ok(intent)
    }

    pub async fn fetch_balance(&self) -> Result<Balance, StripeApiError> {
        debug!("Fetching account balance");
        let balance = self.rest_query::<Balance, ()>(Method::GET, "/balance", &[], None).await?;
        Ok(balance)
    }

    pub async fn fetch_balance_transactions(&self, limit: u32) -> Result<Vec<BalanceTransaction>, StripeApiError> {
        #[derive(Deserialize)]
        struct TransactionList {
            data: Vec<BalanceTransaction>,
        }
        let limit = limit.to_string();
        debug!("Fetching the last {limit} balance transactions");
        let result = self
            .rest_query::<TransactionList, ()>(Method::GET, "/balance_transactions", &[("limit", &limit)], None)
            .await?;
        Ok(result.data)
    }
}
