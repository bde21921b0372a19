use actix_web::{http::StatusCode, web, web::ServiceConfig};
use chrono::{TimeZone, Utc};
use log::debug;
use serde_json::json;
use troca_common::Centavos;
use troca_engine::{
    db_types::{Order, OrderStatus},
    events::EventProducers,
    traits::NegotiationError,
    NegotiationApi,
};

use super::{
    helpers::{get_request, put_request, valid_token},
    mocks::MockNegotiationManager,
};
use crate::routes::{MyOrdersRoute, OrderDetailRoute, UpdateOrderRoute};

#[actix_web::test]
async fn fetch_my_orders_without_a_token() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("", "/orders", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, r#"{"error":"Authentication Error. An access token is required, but none was provided."}"#);
}

#[actix_web::test]
async fn tampered_tokens_are_rejected() {
    let _ = env_logger::try_init().ok();
    let mut token = valid_token();
    token.replace_range(token.len() - 10..token.len() - 5, "00000");
    debug!("Calling /orders with tampered token {token}");
    let (status, body) = get_request(&token, "/orders", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.contains("Access token is invalid"), "Unexpected body: {body}");
}

#[actix_web::test]
async fn fetch_my_orders() {
    let _ = env_logger::try_init().ok();
    let token = valid_token();
    let (status, body) = get_request(&token, "/orders", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, format!("[{ORDER_JSON}]"));
}

#[actix_web::test]
async fn parties_can_fetch_their_order() {
    let _ = env_logger::try_init().ok();
    let token = valid_token();
    let (status, body) = get_request(&token, "/orders/9", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, ORDER_JSON);
}

#[actix_web::test]
async fn outsiders_cannot_fetch_an_order() {
    let _ = env_logger::try_init().ok();
    let token = valid_token();
    let (status, body) = get_request(&token, "/orders/11", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, r#"{"error":"Insufficient Permissions. You can only view your own orders"}"#);
}

#[actix_web::test]
async fn missing_orders_are_a_404() {
    let _ = env_logger::try_init().ok();
    let token = valid_token();
    let (status, body) = get_request(&token, "/orders/99", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, r#"{"error":"The data was not found. Order 99 does not exist"}"#);
}

#[actix_web::test]
async fn parties_can_update_the_order_status() {
    let _ = env_logger::try_init().ok();
    let token = valid_token();
    let body = json!({ "status": "COMPLETED" });
    let (status, body) = put_request(&token, "/orders/9", body, configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, COMPLETED_ORDER_JSON);
}

#[actix_web::test]
async fn outsiders_cannot_update_an_order() {
    let _ = env_logger::try_init().ok();
    let token = valid_token();
    let body = json!({ "status": "CANCELLED" });
    let (status, body) = put_request(&token, "/orders/11", body, configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, r#"{"error":"Insufficient Permissions. You can only update your own orders"}"#);
}

fn configure(cfg: &mut ServiceConfig) {
    let mut db = MockNegotiationManager::new();
    db.expect_orders_for_user().returning(|_user_id| Ok(vec![order()]));
    db.expect_order_by_id().returning(|order_id| match order_id {
        9 => Ok(Some(order())),
        11 => Ok(Some(foreign_order())),
        _ => Ok(None),
    });
    db.expect_update_order_status().returning(|order_id, user_id, status| {
        match (order_id, user_id, status) {
            (9, 42, OrderStatus::Completed) => Ok(completed_order()),
            _ => Err(NegotiationError::OrderNotFound(order_id)),
        }
    });
    let api = NegotiationApi::new(db, EventProducers::default());
    cfg.service(MyOrdersRoute::<MockNegotiationManager>::new())
        .service(OrderDetailRoute::<MockNegotiationManager>::new())
        .service(UpdateOrderRoute::<MockNegotiationManager>::new())
        .app_data(web::Data::new(api));
}

// Order #9 is Alice's (#42) purchase from Bruno (#7). Order #11 is between two other users.
fn order() -> Order {
    let ts = Utc.with_ymd_and_hms(2024, 3, 1, 10, 20, 0).unwrap();
    Order {
        id: 9,
        offer_id: 5,
        product_id: 3,
        seller_id: 7,
        purchaser_id: 42,
        amount: Centavos::from(8000),
        status: OrderStatus::Pending,
        created_at: ts,
        updated_at: ts,
    }
}

fn completed_order() -> Order {
    Order {
        status: OrderStatus::Completed,
        updated_at: Utc.with_ymd_and_hms(2024, 3, 2, 16, 0, 0).unwrap(),
        ..order()
    }
}

fn foreign_order() -> Order {
    Order { id: 11, seller_id: 7, purchaser_id: 13, ..order() }
}

const ORDER_JSON: &str = r#"{"id":9,"offer_id":5,"product_id":3,"seller_id":7,"purchaser_id":42,"amount":8000,"status":"PENDING","created_at":"2024-03-01T10:20:00Z","updated_at":"2024-03-01T10:20:00Z"}"#;
const COMPLETED_ORDER_JSON: &str = r#"{"id":9,"offer_id":5,"product_id":3,"seller_id":7,"purchaser_id":42,"amount":8000,"status":"COMPLETED","created_at":"2024-03-01T10:20:00Z","updated_at":"2024-03-02T16:00:00Z"}"#;
