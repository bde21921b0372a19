use std::{env, io::Write};

use chrono::Duration;
use log::*;
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use serde_json::json;
use stripe_tools::StripeConfig;
use tempfile::NamedTempFile;
use troca_common::Secret;

use crate::errors::ServerError;

const DEFAULT_TROCA_HOST: &str = "127.0.0.1";
const DEFAULT_TROCA_PORT: u16 = 8360;
const DEFAULT_JWT_VALIDITY: Duration = Duration::hours(24);

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub auth: AuthConfig,
    /// Stripe API credentials and the webhook signing secret.
    pub stripe: StripeConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_TROCA_HOST.to_string(),
            port: DEFAULT_TROCA_PORT,
            database_url: String::default(),
            auth: AuthConfig::default(),
            stripe: StripeConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("TROCA_HOST").ok().unwrap_or_else(|| DEFAULT_TROCA_HOST.into());
        let port = env::var("TROCA_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for TROCA_PORT. {e} Using the default, {DEFAULT_TROCA_PORT}, \
                         instead."
                    );
                    DEFAULT_TROCA_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_TROCA_PORT);
        let database_url = env::var("TROCA_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ TROCA_DATABASE_URL is not set. Please set it to the URL for the marketplace database.");
            String::default()
        });
        let auth = AuthConfig::try_from_env().unwrap_or_else(|e| {
            warn!(
                "🪛️ Could not load the authentication configuration from environment variables. {e}. Reverting to the \
                 default configuration."
            );
            AuthConfig::default()
        });
        let stripe = StripeConfig::new_from_env_or_default();
        Self { host, port, database_url, auth, stripe }
    }
}

//-------------------------------------------------  AuthConfig  -------------------------------------------------------
#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// The secret used to sign access tokens (HMAC-SHA256).
    pub jwt_secret: Secret<String>,
    /// How long issued access tokens stay valid.
    pub jwt_validity: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        let mut tmpfile = NamedTempFile::new().ok().and_then(|f| f.keep().ok());
        warn!(
            "🚨️🚨️🚨️ The JWT signing secret has not been set. I'm using a random value for this session. DO NOT \
             operate on production like this, since every issued token dies with the process. 🚨️🚨️🚨️"
        );
        let secret =
            thread_rng().sample_iter(&Alphanumeric).take(64).map(char::from).collect::<String>();
        match &mut tmpfile {
            Some((f, p)) => {
                let key_data = json!({ "jwt_secret": secret.as_str() }).to_string();
                match writeln!(f, "{key_data}") {
                    Ok(()) => warn!(
                        "🚨️🚨️🚨️ The JWT signing secret for this session was written to {}. If this is a production \
                         instance, you are doing it wrong! Set the TROCA_JWT_SECRET environment variable instead. \
                         🚨️🚨️🚨️",
                        p.to_str().unwrap_or("???")
                    ),
                    Err(e) => warn!("🪛️ Could not write the JWT signing secret to the temporary file. {e}"),
                }
            },
            None => {
                warn!("🪛️ Could not create a temporary file to store the JWT signing secret. ");
            },
        }
        Self { jwt_secret: Secret::new(secret), jwt_validity: DEFAULT_JWT_VALIDITY }
    }
}

impl AuthConfig {
    pub fn try_from_env() -> Result<Self, ServerError> {
        let secret =
            env::var("TROCA_JWT_SECRET").map_err(|e| ServerError::ConfigurationError(format!("{e} [TROCA_JWT_SECRET]")))?;
        if secret.trim().is_empty() {
            return Err(ServerError::ConfigurationError(
                "TROCA_JWT_SECRET is set but empty. Check your configuration.".to_string(),
            ));
        }
        let jwt_validity = configure_jwt_validity();
        Ok(Self { jwt_secret: Secret::new(secret), jwt_validity })
    }
}

fn configure_jwt_validity() -> Duration {
    env::var("TROCA_JWT_VALIDITY")
        .map_err(|_| {
            info!(
                "🪛️ TROCA_JWT_VALIDITY is not set. Using the default value of {} hrs.",
                DEFAULT_JWT_VALIDITY.num_hours()
            )
        })
        .and_then(|s| {
            s.parse::<i64>()
                .map(Duration::hours)
                .map_err(|e| warn!("🪛️ Invalid configuration value for TROCA_JWT_VALIDITY. {e}"))
        })
        .ok()
        .unwrap_or(DEFAULT_JWT_VALIDITY)
}
