//! Aggregate views returned by the chat API.
//!
//! These types bundle a chat with the context a client renders it with, so that a single call returns everything
//! a conversation screen needs.

use serde::{Deserialize, Serialize};
use troca_common::Centavos;

use crate::db_types::{Category, Chat, Message, Offer, Product, ProductImage, UserSummary};

/// The slice of a product that chat screens display: enough to identify the item under negotiation without
/// dragging the full listing along.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSummary {
    pub id: i64,
    pub name: String,
    pub price: Centavos,
    pub author_id: i64,
    pub category: String,
    pub images: Vec<String>,
}

impl ProductSummary {
    pub fn new(product: &Product, category: &Category, images: &[ProductImage]) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            price: product.price,
            author_id: product.author_id,
            category: category.name.clone(),
            images: images.iter().map(|i| i.path.clone()).collect(),
        }
    }
}

/// A full conversation: the chat row, the product it is about, both participants, the message history
/// (oldest first) and the offer history (newest first).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatDetail {
    pub chat: Chat,
    pub product: ProductSummary,
    pub participants: Vec<UserSummary>,
    pub messages: Vec<Message>,
    pub offers: Vec<Offer>,
}

/// One row of the chat list: the chat, its product, the participants and the most recent message as a preview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatSummary {
    pub chat: Chat,
    pub product: ProductSummary,
    pub participants: Vec<UserSummary>,
    pub last_message: Option<Message>,
}
