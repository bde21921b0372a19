//! Access tokens.
//!
//! Login produces a signed JWT (HS256) whose claims identify the user. Protected handlers take a [`JwtClaims`]
//! parameter, which actix fills by validating the `Authorization: Bearer` header against the [`TokenIssuer`]
//! registered in app data. There are no sessions to store; possession of a valid token is the whole story.

use std::future::{ready, Ready};

use actix_web::{dev::Payload, http::header, web, FromRequest, HttpRequest};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use troca_engine::db_types::User;

use crate::{
    config::AuthConfig,
    errors::{AuthError, ServerError},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// The user id.
    pub sub: i64,
    pub name: String,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

impl JwtClaims {
    pub fn new(user: &User, validity: Duration) -> Self {
        let now = Utc::now();
        Self {
            sub: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            iat: now.timestamp(),
            exp: (now + validity).timestamp(),
        }
    }
}

impl FromRequest for JwtClaims {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(claims_from_request(req))
    }
}

fn claims_from_request(req: &HttpRequest) -> Result<JwtClaims, ServerError> {
    let issuer = req
        .app_data::<web::Data<TokenIssuer>>()
        .ok_or_else(|| ServerError::InitializeError("No token issuer is registered with the server".to_string()))?;
    let token = bearer_token(req).ok_or(AuthError::MissingToken)?;
    let claims = issuer.decode_token(token)?;
    Ok(claims)
}

pub fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
}

pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validity: Duration,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        let secret = config.jwt_secret.reveal();
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validity: config.jwt_validity,
        }
    }

    /// Issue a new access token for the given user.
    /// This method DOES NOT verify the user's credentials. This must be done prior to calling `issue_token`.
    pub fn issue_token(&self, user: &User) -> Result<String, AuthError> {
        let claims = JwtClaims::new(user, self.validity);
        encode(&Header::default(), &claims, &self.encoding_key).map_err(|e| AuthError::ValidationError(format!("{e}")))
    }

    pub fn decode_token(&self, token: &str) -> Result<JwtClaims, AuthError> {
        let data = decode::<JwtClaims>(token, &self.decoding_key, &Validation::default())
            .map_err(|e| AuthError::ValidationError(format!("{e}")))?;
        Ok(data.claims)
    }
}
