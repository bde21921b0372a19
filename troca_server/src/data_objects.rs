use std::fmt::Display;

use serde::{Deserialize, Serialize};
use troca_common::Centavos;
use troca_engine::db_types::{OrderStatus, Product, ProductImage};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisteredUserResponse {
    pub id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenResponse {
    pub access_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewChatRequest {
    pub product_id: i64,
    pub seller_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendMessageRequest {
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOfferRequest {
    pub product_id: i64,
    pub amount: Centavos,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateOrderRequest {
    pub status: OrderStatus,
}

/// A product listing with its images, as the product detail endpoint returns it. The listing's own fields
/// are flattened into the top level of the JSON object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductDetailResponse {
    #[serde(flatten)]
    pub product: Product,
    pub images: Vec<ProductImage>,
}

/// What the pay endpoint returns. The client drives the card flow with `client_secret` and then polls
/// confirm-payment (or waits for the webhook) for the result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntentResponse {
    pub payment_intent_id: String,
    pub client_secret: Option<String>,
    pub amount: Centavos,
    pub status: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Pagination {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl Pagination {
    const DEFAULT_LIMIT: i64 = 10;

    /// The 1-based page and page size actually used for the query.
    pub fn sanitized(&self) -> (i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let limit = self.limit.unwrap_or(Self::DEFAULT_LIMIT).clamp(1, 100);
        (page, limit)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

impl<T> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, total: i64, page: i64, limit: i64) -> Self {
        Self { data, total, page, limit }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}
