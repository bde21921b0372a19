use thiserror::Error;

use crate::{
    api::chat_objects::{ChatDetail, ChatSummary},
    db_types::{Chat, Message},
};

#[derive(Debug, Clone, Error)]
pub enum ChatApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Chat not found or you are not a participant")]
    ChatNotFound,
    #[error("Product {0} does not exist")]
    ProductNotFound(i64),
    #[error("A chat needs a buyer and a seller, and they cannot be the same user")]
    InvalidParticipants,
}

impl From<sqlx::Error> for ChatApiError {
    fn from(e: sqlx::Error) -> Self {
        ChatApiError::DatabaseError(e.to_string())
    }
}

#[allow(async_fn_in_trait)]
pub trait ChatManagement {
    /// Creates a conversation about a product between the requester and the seller, or returns the existing one.
    /// The boolean is true if a new chat was created.
    ///
    /// The seller must be the product's author and the requester must be someone else.
    async fn create_chat(&self, product_id: i64, requester: i64, seller: i64) -> Result<(Chat, bool), ChatApiError>;

    /// Fetches a chat with its product, participants, message history and offer history. Returns None when the
    /// chat does not exist or `user_id` is not one of its participants.
    async fn fetch_chat_by_id(&self, chat_id: i64, user_id: i64) -> Result<Option<ChatDetail>, ChatApiError>;

    /// Fetches one page of the user's chats, most recently updated first, along with the total chat count.
    async fn fetch_chats_for_user(
        &self,
        user_id: i64,
        page: i64,
        limit: i64,
    ) -> Result<(Vec<ChatSummary>, i64), ChatApiError>;

    /// Appends a message from `from_user_id` to the other participant of the chat and touches the chat's
    /// `updated_at`. Fails with [`ChatApiError::ChatNotFound`] when the sender is not a participant.
    async fn send_message(&self, chat_id: i64, from_user_id: i64, text: &str) -> Result<Message, ChatApiError>;

    /// Fetches the messages of a chat, oldest first. Participant scoped like [`ChatManagement::fetch_chat_by_id`].
    async fn fetch_messages(&self, chat_id: i64, user_id: i64) -> Result<Vec<Message>, ChatApiError>;
}
