use thiserror::Error;
use troca_common::Centavos;

use crate::db_types::{NewOffer, Offer, Order, OrderStatus};

#[derive(Debug, Clone, Error)]
pub enum NegotiationError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    /// Covers the absent offer, the already-processed offer, and the offer that belongs to someone else. The
    /// caller cannot tell these apart, which is intentional.
    #[error("Offer not found")]
    OfferNotFound,
    #[error("Chat not found or you are not a participant")]
    ChatNotFound,
    #[error("Product {0} does not exist")]
    ProductNotFound(i64),
    #[error("Offer amounts must be positive, not {0}")]
    InvalidAmount(Centavos),
    #[error("You cannot make an offer on your own product")]
    SelfOffer,
    #[error("Product owner not found")]
    RecipientNotFound,
    #[error("There is already a pending offer in this chat")]
    PendingOfferExists,
    #[error("Order {0} does not exist")]
    OrderNotFound(i64),
}

impl From<sqlx::Error> for NegotiationError {
    fn from(e: sqlx::Error) -> Self {
        NegotiationError::DatabaseError(e.to_string())
    }
}

/// The offer state machine and the orders it spawns.
///
/// Offers move along PENDING -> ACCEPTED -> PAID, with PENDING -> DECLINED as the rejection branch. Every
/// transition here is a single conditional update keyed on the expected current status, so two racing calls
/// cannot both win. Each transition appends its system message to the chat and touches the chat timestamp in
/// the same transaction.
#[allow(async_fn_in_trait)]
pub trait NegotiationDatabase: Clone {
    /// The URL of the database backing this instance.
    fn url(&self) -> &str;

    /// Validates and persists a new PENDING offer, together with its announcement message.
    ///
    /// The sender must be a participant in the chat, the recipient is resolved as the other participant and must
    /// be the product's author, and a chat can hold at most one pending offer at a time.
    async fn insert_offer(&self, offer: NewOffer) -> Result<Offer, NegotiationError>;

    /// Moves a PENDING offer addressed to `user_id` to ACCEPTED and creates the matching order in the same
    /// transaction. Returns [`NegotiationError::OfferNotFound`] when no row matches.
    async fn accept_offer(&self, offer_id: i64, user_id: i64) -> Result<(Offer, Order), NegotiationError>;

    /// Moves a PENDING offer addressed to `user_id` to DECLINED. No order is created.
    async fn decline_offer(&self, offer_id: i64, user_id: i64) -> Result<Offer, NegotiationError>;

    /// Fetches an ACCEPTED offer made by `sender_id`, the only state in which payment may be initiated.
    async fn offer_for_payment(&self, offer_id: i64, sender_id: i64) -> Result<Offer, NegotiationError>;

    /// Records the payment intent id against an ACCEPTED offer.
    async fn attach_payment_intent(&self, offer_id: i64, intent_id: &str) -> Result<Offer, NegotiationError>;

    /// Fetches an ACCEPTED offer that has a payment intent attached, i.e. one whose payment may be confirmed.
    async fn offer_awaiting_confirmation(&self, offer_id: i64) -> Result<Offer, NegotiationError>;

    /// Moves an ACCEPTED offer to PAID and appends the confirmation message. A second call for the same offer
    /// finds no ACCEPTED row and returns [`NegotiationError::OfferNotFound`], which makes duplicate payment
    /// notifications harmless.
    async fn complete_payment(&self, offer_id: i64) -> Result<Offer, NegotiationError>;

    /// Fetches the offer with the given id, or None if no such offer exists.
    async fn offer_by_id(&self, offer_id: i64) -> Result<Option<Offer>, NegotiationError>;

    /// Fetches the chat's PENDING offer, if there is one. At most one can exist.
    async fn pending_offer_for_chat(&self, chat_id: i64) -> Result<Option<Offer>, NegotiationError>;

    /// Fetches every offer the user sent or received, newest first.
    async fn offers_for_user(&self, user_id: i64) -> Result<Vec<Offer>, NegotiationError>;

    /// Fetches the order with the given id, or None if no such order exists.
    async fn order_by_id(&self, order_id: i64) -> Result<Option<Order>, NegotiationError>;

    /// Fetches every order in which the user is the seller or the purchaser, newest first.
    async fn orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, NegotiationError>;

    /// Sets the status of an order, gated on `user_id` being the seller or the purchaser.
    async fn update_order_status(
        &self,
        order_id: i64,
        user_id: i64,
        status: OrderStatus,
    ) -> Result<Order, NegotiationError>;
}
