use actix_web::{
    body::MessageBody,
    http::{header::ContentType, StatusCode},
    test,
    test::TestRequest,
    web,
    web::ServiceConfig,
    App,
};
use chrono::{TimeZone, Utc};
use serde_json::json;
use stripe_tools::{sign_payload, StripeApi, StripeConfig};
use troca_common::{Centavos, Secret};
use troca_engine::{
    db_types::{Offer, OfferStatus},
    events::EventProducers,
    traits::NegotiationError,
    NegotiationApi,
    UserApi,
};

use super::{
    helpers::{post_request, valid_token},
    mocks::{MockNegotiationManager, MockUserManager},
};
use crate::{
    middleware::{WebhookSignatureMiddlewareFactory, STRIPE_SIGNATURE_HEADER},
    stripe_routes::{ConfirmPaymentRoute, PayOfferRoute, StripeWebhookRoute},
};

const WEBHOOK_SECRET: &str = "whsec_endpoint_test_secret";

#[actix_web::test]
async fn paying_requires_an_accepted_offer() {
    let _ = env_logger::try_init().ok();
    let token = valid_token();
    let (status, body) = post_request(&token, "/offers/8/pay", json!({}), configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, r#"{"error":"The data was not found. Offer not found"}"#);
}

#[actix_web::test]
async fn confirming_an_unknown_offer_fails() {
    let _ = env_logger::try_init().ok();
    let token = valid_token();
    let (status, body) =
        post_request(&token, "/offers/8/confirm-payment", json!({}), configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, r#"{"error":"The data was not found. Offer not found"}"#);
}

#[actix_web::test]
async fn a_settlement_event_completes_the_offer() {
    let _ = env_logger::try_init().ok();
    let event = settlement_event(5);
    let header = signed_header(&event);
    let (status, body) = webhook_request(event, Some(header)).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"success":true,"message":"Payment recorded."}"#);
}

#[actix_web::test]
async fn duplicate_deliveries_are_acknowledged() {
    let _ = env_logger::try_init().ok();
    let event = settlement_event(77);
    let header = signed_header(&event);
    let (status, body) = webhook_request(event, Some(header)).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"success":true,"message":"Offer already settled."}"#);
}

#[actix_web::test]
async fn other_event_types_are_ignored() {
    let _ = env_logger::try_init().ok();
    let event = json!({
        "id": "evt_2",
        "type": "payment_intent.created",
        "data": { "object": { "id": "pi_1" } }
    })
    .to_string();
    let header = signed_header(&event);
    let (status, body) = webhook_request(event, Some(header)).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"success":true,"message":"Ignoring event type payment_intent.created"}"#);
}

#[actix_web::test]
async fn malformed_intents_are_reported() {
    let _ = env_logger::try_init().ok();
    let event = json!({
        "id": "evt_3",
        "type": "payment_intent.succeeded",
        "data": { "object": { "id": "pi_9" } }
    })
    .to_string();
    let header = signed_header(&event);
    let (status, body) = webhook_request(event, Some(header)).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"success":false,"message":"Malformed payment intent."}"#);
}

#[actix_web::test]
async fn events_without_an_offer_id_are_reported() {
    let _ = env_logger::try_init().ok();
    let event = json!({
        "id": "evt_4",
        "type": "payment_intent.succeeded",
        "data": { "object": { "id": "pi_2", "amount": 8000, "currency": "brl", "status": "succeeded" } }
    })
    .to_string();
    let header = signed_header(&event);
    let (status, body) = webhook_request(event, Some(header)).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"success":false,"message":"No offer id in payment intent metadata."}"#);
}

#[actix_web::test]
async fn unsigned_deliveries_are_rejected() {
    let _ = env_logger::try_init().ok();
    let err = webhook_request(settlement_event(5), None).await.expect_err("Expected error");
    assert_eq!(err, "No webhook signature found.");
}

#[actix_web::test]
async fn bad_signatures_are_rejected() {
    let _ = env_logger::try_init().ok();
    let header = format!("t={},v1=deadbeef", Utc::now().timestamp());
    let err = webhook_request(settlement_event(5), Some(header)).await.expect_err("Expected error");
    assert_eq!(err, "Invalid webhook signature.");
}

fn configure(cfg: &mut ServiceConfig) {
    let mut db = MockNegotiationManager::new();
    db.expect_offer_for_payment().returning(|_offer_id, _sender_id| Err(NegotiationError::OfferNotFound));
    db.expect_offer_awaiting_confirmation().returning(|_offer_id| Err(NegotiationError::OfferNotFound));
    db.expect_complete_payment().returning(|offer_id| match offer_id {
        5 => Ok(paid_offer()),
        _ => Err(NegotiationError::OfferNotFound),
    });
    let negotiation = NegotiationApi::new(db, EventProducers::default());
    let users = UserApi::new(MockUserManager::new());
    let stripe = StripeApi::new(StripeConfig::default()).expect("Stripe client did not build");
    let webhook_scope = web::scope("/stripe")
        .wrap(WebhookSignatureMiddlewareFactory::new(Secret::new(WEBHOOK_SECRET.to_string())))
        .service(StripeWebhookRoute::<MockNegotiationManager>::new());
    cfg.service(PayOfferRoute::<MockNegotiationManager, MockUserManager>::new())
        .service(ConfirmPaymentRoute::<MockNegotiationManager>::new())
        .service(webhook_scope)
        .app_data(web::Data::new(negotiation))
        .app_data(web::Data::new(users))
        .app_data(web::Data::new(stripe));
}

async fn webhook_request(body: String, signature: Option<String>) -> Result<(StatusCode, String), String> {
    let mut req = TestRequest::post().uri("/stripe/webhooks").insert_header(ContentType::json()).set_payload(body);
    if let Some(sig) = signature {
        req = req.insert_header((STRIPE_SIGNATURE_HEADER, sig));
    }
    let req = req.to_request();
    let app = App::new().configure(configure);
    let service = test::init_service(app).await;
    let (_, res) = test::try_call_service(&service, req).await.map_err(|e| e.to_string())?.into_parts();
    let status = res.status();
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    Ok((status, body))
}

fn settlement_event(offer_id: i64) -> String {
    json!({
        "id": "evt_1",
        "type": "payment_intent.succeeded",
        "data": { "object": {
            "id": "pi_1",
            "amount": 8000,
            "currency": "brl",
            "status": "succeeded",
            "metadata": { "offer_id": offer_id.to_string() }
        }}
    })
    .to_string()
}

fn signed_header(body: &str) -> String {
    let ts = Utc::now().timestamp();
    let sig = sign_payload(WEBHOOK_SECRET, ts, body.as_bytes()).expect("Signing cannot fail");
    format!("t={ts},v1={sig}")
}

fn paid_offer() -> Offer {
    Offer {
        id: 5,
        chat_id: 10,
        product_id: 3,
        sender_id: 42,
        recipient_id: 7,
        amount: Centavos::from(8000),
        status: OfferStatus::Paid,
        payment_intent_id: Some("pi_1".to_string()),
        created_at: Utc.with_ymd_and_hms(2024, 3, 1, 10, 10, 0).unwrap(),
        updated_at: Utc.with_ymd_and_hms(2024, 3, 1, 11, 0, 0).unwrap(),
    }
}
