use actix_web::{http::StatusCode, web, web::ServiceConfig};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2,
};
use chrono::{TimeZone, Utc};
use serde_json::{json, Value};
use troca_engine::{
    db_types::{NewUser, User},
    traits::UserApiError,
    UserApi,
};

use super::{
    helpers::{post_request, test_auth_config},
    mocks::MockUserManager,
};
use crate::{
    auth::TokenIssuer,
    routes::{LoginRoute, RegisterRoute},
};

#[actix_web::test]
async fn register_creates_an_account() {
    let _ = env_logger::try_init().ok();
    let body = json!({
        "name": "Alice", "email": "alice@example.com", "password": "segredo123", "confirm_password": "segredo123"
    });
    let (status, body) = post_request("", "/auth/register", body, configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, r#"{"id":42}"#);
}

#[actix_web::test]
async fn mismatched_passwords_are_rejected() {
    let _ = env_logger::try_init().ok();
    let body = json!({
        "name": "Alice", "email": "alice@example.com", "password": "segredo123", "confirm_password": "diferente"
    });
    let (status, body) = post_request("", "/auth/register", body, configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"Could not read request body: Passwords do not match"}"#);
}

#[actix_web::test]
async fn blank_fields_are_rejected() {
    let _ = env_logger::try_init().ok();
    let body = json!({ "name": "", "email": "alice@example.com", "password": "s", "confirm_password": "s" });
    let (status, body) = post_request("", "/auth/register", body, configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"Could not read request body: All fields are required"}"#);
}

#[actix_web::test]
async fn duplicate_email_addresses_are_rejected() {
    let _ = env_logger::try_init().ok();
    let body = json!({
        "name": "Bob", "email": "bob@example.com", "password": "segredo123", "confirm_password": "segredo123"
    });
    let (status, body) = post_request("", "/auth/register", body, configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, r#"{"error":"Authentication Error. A user with this email address already exists."}"#);
}

#[actix_web::test]
async fn login_issues_a_decodable_token() {
    let _ = env_logger::try_init().ok();
    let body = json!({ "email": "alice@example.com", "password": "segredo123" });
    let (status, body) = post_request("", "/auth/login", body, configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let response: Value = serde_json::from_str(&body).unwrap();
    let token = response["access_token"].as_str().expect("No access token in response");
    let claims = TokenIssuer::new(&test_auth_config()).decode_token(token).expect("Token did not decode");
    assert_eq!(claims.sub, 42);
    assert_eq!(claims.name, "Alice");
    assert_eq!(claims.email, "alice@example.com");
}

#[actix_web::test]
async fn login_with_a_wrong_password_fails() {
    let _ = env_logger::try_init().ok();
    let body = json!({ "email": "alice@example.com", "password": "senha-errada" });
    let (status, body) = post_request("", "/auth/login", body, configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, r#"{"error":"Authentication Error. Email or password is incorrect."}"#);
}

#[actix_web::test]
async fn login_with_an_unknown_email_fails_identically() {
    let _ = env_logger::try_init().ok();
    let body = json!({ "email": "nobody@example.com", "password": "segredo123" });
    let (status, body) = post_request("", "/auth/login", body, configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, r#"{"error":"Authentication Error. Email or password is incorrect."}"#);
}

fn configure(cfg: &mut ServiceConfig) {
    let mut users = MockUserManager::new();
    users.expect_create_user().returning(|user| match user.email.as_str() {
        "bob@example.com" => Err(UserApiError::EmailAlreadyExists),
        _ => Ok(saved_user(user)),
    });
    users.expect_fetch_user_by_email().returning(|email| match email {
        "alice@example.com" => Ok(Some(alice())),
        _ => Ok(None),
    });
    let api = UserApi::new(users);
    cfg.service(RegisterRoute::<MockUserManager>::new())
        .service(LoginRoute::<MockUserManager>::new())
        .app_data(web::Data::new(api));
}

fn saved_user(user: NewUser) -> User {
    let ts = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
    User {
        id: 42,
        name: user.name,
        email: user.email,
        password_hash: user.password_hash,
        stripe_customer_id: None,
        created_at: ts,
        updated_at: ts,
    }
}

// Alice's stored record, with a real argon2 hash of "segredo123" so that credential checks behave as in
// production.
fn alice() -> User {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(b"segredo123", &salt).unwrap().to_string();
    let ts = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
    User {
        id: 42,
        name: "Alice".to_string(),
        email: "alice@example.com".to_string(),
        password_hash: hash,
        stripe_customer_id: None,
        created_at: ts,
        updated_at: ts,
    }
}
