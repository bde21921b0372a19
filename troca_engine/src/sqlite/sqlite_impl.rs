//! `SqliteDatabase` is a concrete implementation of a Troca marketplace engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`crate::traits`]
//! module.
use std::fmt::Debug;

use log::*;
use sqlx::SqlitePool;

use super::db::{categories, chats, db_url, messages, new_pool, offers, orders, products, users};
use crate::{
    api::chat_objects::{ChatDetail, ChatSummary},
    db_types::{Category, Chat, Message, NewMessage, NewOffer, NewProduct, NewUser, Offer, Order, OrderStatus, Product, ProductImage, User},
    traits::{
        CatalogApiError,
        CatalogManagement,
        ChatApiError,
        ChatManagement,
        NegotiationDatabase,
        NegotiationError,
        UserApiError,
        UserManagement,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl UserManagement for SqliteDatabase {
    async fn create_user(&self, user: NewUser) -> Result<User, UserApiError> {
        let mut conn = self.pool.acquire().await?;
        users::insert_user(user, &mut conn).await
    }

    async fn fetch_user_by_id(&self, id: i64) -> Result<Option<User>, UserApiError> {
        let mut conn = self.pool.acquire().await?;
        let user = users::fetch_user_by_id(id, &mut conn).await?;
        Ok(user)
    }

    async fn fetch_user_by_email(&self, email: &str) -> Result<Option<User>, UserApiError> {
        let mut conn = self.pool.acquire().await?;
        let user = users::fetch_user_by_email(email, &mut conn).await?;
        Ok(user)
    }

    async fn set_stripe_customer_id(&self, user_id: i64, customer_id: &str) -> Result<User, UserApiError> {
        let mut conn = self.pool.acquire().await?;
        let user = users::set_stripe_customer_id(user_id, customer_id, &mut conn).await?;
        debug!("🗃️ User #{user_id} linked to Stripe customer {customer_id}");
        Ok(user)
    }
}

impl CatalogManagement for SqliteDatabase {
    async fn create_product(&self, product: NewProduct) -> Result<Product, CatalogApiError> {
        let mut tx = self.pool.begin().await?;
        if categories::fetch_category(product.category_id, &mut tx).await?.is_none() {
            return Err(CatalogApiError::CategoryNotFound(product.category_id));
        }
        let product = products::insert_product(product, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Product #{} listed by user #{}", product.id, product.author_id);
        Ok(product)
    }

    async fn fetch_product(&self, id: i64) -> Result<Option<Product>, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        let product = products::fetch_product(id, &mut conn).await?;
        Ok(product)
    }

    async fn fetch_product_images(&self, product_id: i64) -> Result<Vec<ProductImage>, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        let images = products::fetch_product_images(product_id, &mut conn).await?;
        Ok(images)
    }

    async fn fetch_categories(&self) -> Result<Vec<Category>, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        let categories = categories::fetch_categories(&mut conn).await?;
        Ok(categories)
    }
}

impl ChatManagement for SqliteDatabase {
    async fn create_chat(&self, product_id: i64, requester: i64, seller: i64) -> Result<(Chat, bool), ChatApiError> {
        let mut tx = self.pool.begin().await?;
        let product =
            products::fetch_product(product_id, &mut tx).await?.ok_or(ChatApiError::ProductNotFound(product_id))?;
        if product.author_id != seller || requester == seller {
            return Err(ChatApiError::InvalidParticipants);
        }
        let (chat, created) = chats::idempotent_insert(product_id, requester, seller, &mut tx).await?;
        tx.commit().await?;
        if created {
            debug!("🗃️ Chat #{} saved for product #{product_id}", chat.id);
        }
        Ok((chat, created))
    }

    async fn fetch_chat_by_id(&self, chat_id: i64, user_id: i64) -> Result<Option<ChatDetail>, ChatApiError> {
        let mut conn = self.pool.acquire().await?;
        chats::chat_detail(chat_id, user_id, &mut conn).await
    }

    async fn fetch_chats_for_user(
        &self,
        user_id: i64,
        page: i64,
        limit: i64,
    ) -> Result<(Vec<ChatSummary>, i64), ChatApiError> {
        let mut conn = self.pool.acquire().await?;
        let rows = chats::fetch_chats_for_user(user_id, page, limit, &mut conn).await?;
        let total = chats::count_chats_for_user(user_id, &mut conn).await?;
        let mut summaries = Vec::with_capacity(rows.len());
        for chat in rows {
            let summary = chats::chat_summary(chat, &mut conn).await?;
            summaries.push(summary);
        }
        trace!("🗃️ Fetched {} of {total} chats for user #{user_id}", summaries.len());
        Ok((summaries, total))
    }

    async fn send_message(&self, chat_id: i64, from_user_id: i64, text: &str) -> Result<Message, ChatApiError> {
        let mut tx = self.pool.begin().await?;
        if chats::fetch_chat_for_user(chat_id, from_user_id, &mut tx).await?.is_none() {
            return Err(ChatApiError::ChatNotFound);
        }
        let to_user_id =
            chats::other_participant(chat_id, from_user_id, &mut tx).await?.ok_or(ChatApiError::ChatNotFound)?;
        let message =
            messages::insert_message(NewMessage::new(chat_id, from_user_id, to_user_id, text), &mut tx).await?;
        chats::touch_chat(chat_id, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Message #{} saved in chat #{chat_id}", message.id);
        Ok(message)
    }

    async fn fetch_messages(&self, chat_id: i64, user_id: i64) -> Result<Vec<Message>, ChatApiError> {
        let mut conn = self.pool.acquire().await?;
        if chats::fetch_chat_for_user(chat_id, user_id, &mut conn).await?.is_none() {
            return Err(ChatApiError::ChatNotFound);
        }
        let messages = messages::fetch_messages(chat_id, &mut conn).await?;
        Ok(messages)
    }
}

impl NegotiationDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn insert_offer(&self, offer: NewOffer) -> Result<Offer, NegotiationError> {
        if offer.amount.value() <= 0 {
            return Err(NegotiationError::InvalidAmount(offer.amount));
        }
        let mut tx = self.pool.begin().await?;
        let chat = chats::fetch_chat_for_user(offer.chat_id, offer.sender_id, &mut tx)
            .await?
            .ok_or(NegotiationError::ChatNotFound)?;
        let product = products::fetch_product(offer.product_id, &mut tx)
            .await?
            .ok_or(NegotiationError::ProductNotFound(offer.product_id))?;
        if product.author_id == offer.sender_id {
            return Err(NegotiationError::SelfOffer);
        }
        let recipient = chats::other_participant(offer.chat_id, offer.sender_id, &mut tx)
            .await?
            .ok_or(NegotiationError::ChatNotFound)?;
        if recipient != product.author_id || chat.product_id != product.id {
            return Err(NegotiationError::RecipientNotFound);
        }
        if offers::pending_offer_for_chat(offer.chat_id, &mut tx).await?.is_some() {
            return Err(NegotiationError::PendingOfferExists);
        }
        let offer =
            offers::insert_offer(offer.chat_id, offer.product_id, offer.sender_id, recipient, offer.amount, &mut tx)
                .await?;
        let text = format!("Proposta de compra enviada: {}", offer.amount);
        messages::insert_message(NewMessage::new(offer.chat_id, offer.sender_id, recipient, text), &mut tx).await?;
        chats::touch_chat(offer.chat_id, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Offer #{} of {} saved in chat #{}", offer.id, offer.amount, offer.chat_id);
        Ok(offer)
    }

    async fn accept_offer(&self, offer_id: i64, user_id: i64) -> Result<(Offer, Order), NegotiationError> {
        let mut tx = self.pool.begin().await?;
        let offer =
            offers::accept_pending(offer_id, user_id, &mut tx).await?.ok_or(NegotiationError::OfferNotFound)?;
        let order = orders::insert_order_for_offer(&offer, &mut tx).await?;
        let text = format!("Proposta de {} foi aceita. Aguardando pagamento.", offer.amount);
        messages::insert_message(NewMessage::new(offer.chat_id, user_id, offer.sender_id, text), &mut tx).await?;
        chats::touch_chat(offer.chat_id, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Offer #{offer_id} accepted. Order #{} created", order.id);
        Ok((offer, order))
    }

    async fn decline_offer(&self, offer_id: i64, user_id: i64) -> Result<Offer, NegotiationError> {
        let mut tx = self.pool.begin().await?;
        let offer =
            offers::decline_pending(offer_id, user_id, &mut tx).await?.ok_or(NegotiationError::OfferNotFound)?;
        let text = format!("Proposta de {} foi recusada.", offer.amount);
        messages::insert_message(NewMessage::new(offer.chat_id, user_id, offer.sender_id, text), &mut tx).await?;
        chats::touch_chat(offer.chat_id, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Offer #{offer_id} declined");
        Ok(offer)
    }

    async fn offer_for_payment(&self, offer_id: i64, sender_id: i64) -> Result<Offer, NegotiationError> {
        let mut conn = self.pool.acquire().await?;
        let offer = offers::fetch_accepted_for_sender(offer_id, sender_id, &mut conn)
            .await?
            .ok_or(NegotiationError::OfferNotFound)?;
        Ok(offer)
    }

    async fn attach_payment_intent(&self, offer_id: i64, intent_id: &str) -> Result<Offer, NegotiationError> {
        let mut conn = self.pool.acquire().await?;
        let offer = offers::attach_payment_intent(offer_id, intent_id, &mut conn)
            .await?
            .ok_or(NegotiationError::OfferNotFound)?;
        debug!("🗃️ Offer #{offer_id} now carries payment intent {intent_id}");
        Ok(offer)
    }

    async fn offer_awaiting_confirmation(&self, offer_id: i64) -> Result<Offer, NegotiationError> {
        let mut conn = self.pool.acquire().await?;
        let offer =
            offers::fetch_accepted_with_intent(offer_id, &mut conn).await?.ok_or(NegotiationError::OfferNotFound)?;
        Ok(offer)
    }

    async fn complete_payment(&self, offer_id: i64) -> Result<Offer, NegotiationError> {
        let mut tx = self.pool.begin().await?;
        let offer = offers::mark_paid(offer_id, &mut tx).await?.ok_or(NegotiationError::OfferNotFound)?;
        let text = format!("Pagamento de {} foi confirmado. Agora vocês podem combinar a entrega.", offer.amount);
        messages::insert_message(NewMessage::new(offer.chat_id, offer.sender_id, offer.recipient_id, text), &mut tx)
            .await?;
        chats::touch_chat(offer.chat_id, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Offer #{offer_id} marked as paid");
        Ok(offer)
    }

    async fn offer_by_id(&self, offer_id: i64) -> Result<Option<Offer>, NegotiationError> {
        let mut conn = self.pool.acquire().await?;
        let offer = offers::fetch_offer(offer_id, &mut conn).await?;
        Ok(offer)
    }

    async fn pending_offer_for_chat(&self, chat_id: i64) -> Result<Option<Offer>, NegotiationError> {
        let mut conn = self.pool.acquire().await?;
        let offer = offers::pending_offer_for_chat(chat_id, &mut conn).await?;
        Ok(offer)
    }

    async fn offers_for_user(&self, user_id: i64) -> Result<Vec<Offer>, NegotiationError> {
        let mut conn = self.pool.acquire().await?;
        let offers = offers::fetch_offers_for_user(user_id, &mut conn).await?;
        Ok(offers)
    }

    async fn order_by_id(&self, order_id: i64) -> Result<Option<Order>, NegotiationError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order(order_id, &mut conn).await?;
        Ok(order)
    }

    async fn orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, NegotiationError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::fetch_orders_for_user(user_id, &mut conn).await?;
        Ok(orders)
    }

    async fn update_order_status(
        &self,
        order_id: i64,
        user_id: i64,
        status: OrderStatus,
    ) -> Result<Order, NegotiationError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::update_order_status(order_id, user_id, status, &mut conn)
            .await?
            .ok_or(NegotiationError::OrderNotFound(order_id))?;
        debug!("🗃️ Order #{order_id} moved to {status}");
        Ok(order)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object, reading the URL from the environment.
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Brings the schema up to date. Embedded migrations, so deployments are a single binary.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations are up to date");
        Ok(())
    }

    pub async fn close(&mut self) {
        self.pool.close().await;
    }
}
