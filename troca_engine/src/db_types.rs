use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use log::error;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;
use troca_common::Centavos;

//--------------------------------------        User        ----------------------------------------------------------
/// A registered user. The password hash never leaves the engine; use [`UserSummary`] for anything wire-facing.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub stripe_customer_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------      NewUser       ----------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    /// The argon2 hash of the password, not the password itself.
    pub password_hash: String,
}

impl NewUser {
    pub fn new<S1: Into<String>, S2: Into<String>>(name: S1, email: S2, password_hash: String) -> Self {
        Self { name: name.into(), email: email.into(), password_hash }
    }
}

//--------------------------------------    UserSummary     ----------------------------------------------------------
/// The public projection of a user, safe to serialize into responses and events.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: i64,
    pub name: String,
    pub email: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self { id: user.id, name: user.name.clone(), email: user.email.clone() }
    }
}

//--------------------------------------      Category      ----------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub icon_key: String,
}

//--------------------------------------      Product       ----------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub price: Centavos,
    pub category_id: i64,
    pub author_id: i64,
    pub city: Option<String>,
    pub state: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------     NewProduct     ----------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: Centavos,
    pub category_id: i64,
    pub author_id: i64,
    pub city: Option<String>,
    pub state: Option<String>,
    /// Paths of the product images, in display order.
    pub images: Vec<String>,
}

impl NewProduct {
    pub fn new<S1: Into<String>, S2: Into<String>>(
        name: S1,
        description: S2,
        price: Centavos,
        category_id: i64,
        author_id: i64,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            price,
            category_id,
            author_id,
            city: None,
            state: None,
            images: Vec::new(),
        }
    }

    pub fn with_location<S1: Into<String>, S2: Into<String>>(mut self, city: S1, state: S2) -> Self {
        self.city = Some(city.into());
        self.state = Some(state.into());
        self
    }

    pub fn with_images(mut self, images: Vec<String>) -> Self {
        self.images = images;
        self
    }
}

//--------------------------------------    ProductImage    ----------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct ProductImage {
    pub id: i64,
    pub product_id: i64,
    pub path: String,
    pub position: i64,
}

//--------------------------------------        Chat        ----------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
    pub product_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------      Message       ----------------------------------------------------------
/// A single entry in a chat. Carries both user-authored text and the system announcements the offer flow appends.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub chat_id: i64,
    pub from_user_id: i64,
    pub to_user_id: i64,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------     NewMessage     ----------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub chat_id: i64,
    pub from_user_id: i64,
    pub to_user_id: i64,
    pub text: String,
}

impl NewMessage {
    pub fn new<S: Into<String>>(chat_id: i64, from_user_id: i64, to_user_id: i64, text: S) -> Self {
        Self { chat_id, from_user_id, to_user_id, text: text.into() }
    }
}

//--------------------------------------    OfferStatus     ----------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum OfferStatus {
    /// The offer has been made and awaits the recipient's decision.
    Pending,
    /// The recipient accepted the offer. An order exists and payment is awaited.
    Accepted,
    /// The recipient declined the offer. Terminal.
    Declined,
    /// The payment for the accepted offer was confirmed. Terminal.
    Paid,
}

impl Display for OfferStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OfferStatus::Pending => write!(f, "PENDING"),
            OfferStatus::Accepted => write!(f, "ACCEPTED"),
            OfferStatus::Declined => write!(f, "DECLINED"),
            OfferStatus::Paid => write!(f, "PAID"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid status: {0}")]
pub struct ConversionError(String);

impl FromStr for OfferStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "ACCEPTED" => Ok(Self::Accepted),
            "DECLINED" => Ok(Self::Declined),
            "PAID" => Ok(Self::Paid),
            s => Err(ConversionError(format!("Invalid offer status: {s}"))),
        }
    }
}

impl From<String> for OfferStatus {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid offer status: {value}. But this conversion cannot fail. Defaulting to Pending");
            OfferStatus::Pending
        })
    }
}

//--------------------------------------        Offer       ----------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Offer {
    pub id: i64,
    pub chat_id: i64,
    pub product_id: i64,
    pub sender_id: i64,
    pub recipient_id: i64,
    pub amount: Centavos,
    pub status: OfferStatus,
    pub payment_intent_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------      NewOffer      ----------------------------------------------------------
/// A buyer's bid on a product, made inside the chat for that product. The recipient is resolved by the engine as
/// the chat participant who authored the product.
#[derive(Debug, Clone)]
pub struct NewOffer {
    pub chat_id: i64,
    pub product_id: i64,
    pub sender_id: i64,
    pub amount: Centavos,
}

impl NewOffer {
    pub fn new(chat_id: i64, product_id: i64, sender_id: i64, amount: Centavos) -> Self {
        Self { chat_id, product_id, sender_id, amount }
    }
}

//--------------------------------------    OrderStatus     ----------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    /// The order exists and the parties have not wrapped it up yet.
    Pending,
    /// The goods changed hands and both parties are done.
    Completed,
    /// The order was abandoned.
    Cancelled,
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatus::Pending => write!(f, "PENDING"),
            OrderStatus::Completed => write!(f, "COMPLETED"),
            OrderStatus::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

impl FromStr for OrderStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "COMPLETED" => Ok(Self::Completed),
            "CANCELLED" => Ok(Self::Cancelled),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

impl From<String> for OrderStatus {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid order status: {value}. But this conversion cannot fail. Defaulting to Pending");
            OrderStatus::Pending
        })
    }
}

//--------------------------------------        Order       ----------------------------------------------------------
/// The commitment record created when an offer is accepted. Exactly one order exists per accepted offer.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub offer_id: i64,
    pub product_id: i64,
    pub seller_id: i64,
    pub purchaser_id: i64,
    pub amount: Centavos,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
