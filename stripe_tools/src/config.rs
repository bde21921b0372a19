use log::*;
use troca_common::{Secret, BRL_CURRENCY_CODE_LOWER};

#[derive(Debug, Clone, Default)]
pub struct StripeConfig {
    pub secret_key: Secret<String>,
    pub webhook_secret: Secret<String>,
    pub api_version: String,
    pub currency: String,
}

impl StripeConfig {
    pub fn new_from_env_or_default() -> Self {
        let secret_key = Secret::new(std::env::var("STRIPE_SECRET_KEY").unwrap_or_else(|_| {
            warn!("STRIPE_SECRET_KEY not set, using (probably useless) default");
            "sk_test_00000000000000".to_string()
        }));
        let webhook_secret = Secret::new(std::env::var("STRIPE_WEBHOOK_SECRET").unwrap_or_else(|_| {
            warn!("STRIPE_WEBHOOK_SECRET not set, using (probably useless) default");
            "whsec_00000000000000".to_string()
        }));
        let api_version = std::env::var("STRIPE_API_VERSION").unwrap_or_else(|_| {
            debug!("STRIPE_API_VERSION not set, using 2023-10-16 as default");
            "2023-10-16".to_string()
        });
        let currency = std::env::var("STRIPE_CURRENCY").unwrap_or_else(|_| {
            debug!("STRIPE_CURRENCY not set, using {BRL_CURRENCY_CODE_LOWER} as default");
            BRL_CURRENCY_CODE_LOWER.to_string()
        });
        Self { secret_key, webhook_secret, api_version, currency }
    }
}
