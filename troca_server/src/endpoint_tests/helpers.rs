use actix_web::{
    body::MessageBody,
    http::StatusCode,
    test,
    test::TestRequest,
    web,
    web::ServiceConfig,
    App,
};
use chrono::{DateTime, Duration, Utc};
use log::debug;
use serde_json::Value;
use troca_common::Secret;
use troca_engine::db_types::User;

use crate::{auth::TokenIssuer, config::AuthConfig};

// Creates a test `AuthConfig` for issuing tokens. DO NOT re-use this secret anywhere.
pub fn test_auth_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: Secret::new("an insecure signing secret for endpoint tests".to_string()),
        jwt_validity: Duration::hours(24),
    }
}

/// A bearer token for user #42, Alice. All authenticated endpoint tests make their requests as her.
pub fn valid_token() -> String {
    let ts = DateTime::<Utc>::MIN_UTC;
    let alice = User {
        id: 42,
        name: "Alice".to_string(),
        email: "alice@example.com".to_string(),
        password_hash: String::default(),
        stripe_customer_id: None,
        created_at: ts,
        updated_at: ts,
    };
    TokenIssuer::new(&test_auth_config()).issue_token(&alice).expect("Failed to sign token")
}

pub async fn get_request(
    token: &str,
    path: &str,
    configure: fn(&mut ServiceConfig),
) -> Result<(StatusCode, String), String> {
    let req = TestRequest::get().uri(path);
    send_request(req, token, configure).await
}

pub async fn post_request(
    token: &str,
    path: &str,
    body: Value,
    configure: fn(&mut ServiceConfig),
) -> Result<(StatusCode, String), String> {
    let req = TestRequest::post().uri(path).set_json(&body);
    send_request(req, token, configure).await
}

pub async fn put_request(
    token: &str,
    path: &str,
    body: Value,
    configure: fn(&mut ServiceConfig),
) -> Result<(StatusCode, String), String> {
    let req = TestRequest::put().uri(path).set_json(&body);
    send_request(req, token, configure).await
}

async fn send_request(
    req: TestRequest,
    token: &str,
    configure: fn(&mut ServiceConfig),
) -> Result<(StatusCode, String), String> {
    let mut req = req;
    if !token.is_empty() {
        req = req.insert_header(("Authorization", format!("Bearer {token}")));
    }
    let req = req.to_request();
    let issuer = TokenIssuer::new(&test_auth_config());
    let app = App::new().app_data(web::Data::new(issuer)).configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request");
    let (_, res) = test::try_call_service(&service, req).await.map_err(|e| e.to_string())?.into_parts();
    let status = res.status();
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    Ok((status, body))
}
