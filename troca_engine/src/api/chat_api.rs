//! Conversations and messages.

use std::fmt::Debug;

use log::*;

use crate::{
    api::chat_objects::{ChatDetail, ChatSummary},
    db_types::{Chat, Message},
    events::{EventProducers, NewMessageEvent},
    traits::{ChatApiError, ChatManagement},
};

/// The `ChatApi` manages the conversation around a product listing. Each chat belongs to one product and has
/// exactly two participants. Sending a message publishes a [`NewMessageEvent`] after the write commits, which is
/// how the real-time layer learns about it without this crate knowing the real-time layer exists.
pub struct ChatApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B: Debug> Debug for ChatApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ChatApi ({:?})", self.db)
    }
}

impl<B> ChatApi<B>
where B: ChatManagement
{
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }

    /// Opens a conversation about a product, or returns the existing one. The boolean is true when a new chat
    /// was created.
    pub async fn create_chat(
        &self,
        product_id: i64,
        requester: i64,
        seller: i64,
    ) -> Result<(Chat, bool), ChatApiError> {
        let (chat, created) = self.db.create_chat(product_id, requester, seller).await?;
        if created {
            debug!("🔄️💬️ Chat #{} opened for product #{product_id} by user #{requester}", chat.id);
        }
        Ok((chat, created))
    }

    /// Fetches a full conversation, participant scoped.
    pub async fn chat_by_id(&self, chat_id: i64, user_id: i64) -> Result<Option<ChatDetail>, ChatApiError> {
        self.db.fetch_chat_by_id(chat_id, user_id).await
    }

    /// Fetches one page of the user's chats plus the total count.
    pub async fn chats_for_user(
        &self,
        user_id: i64,
        page: i64,
        limit: i64,
    ) -> Result<(Vec<ChatSummary>, i64), ChatApiError> {
        self.db.fetch_chats_for_user(user_id, page, limit).await
    }

    /// Appends a message to a chat and notifies subscribers.
    pub async fn send_message(&self, chat_id: i64, from: i64, text: &str) -> Result<Message, ChatApiError> {
        let message = self.db.send_message(chat_id, from, text).await?;
        debug!("🔄️💬️ Message #{} sent in chat #{chat_id} by user #{from}", message.id);
        self.call_new_message_hook(&message).await;
        Ok(message)
    }

    /// Fetches the message history of a chat, oldest first.
    pub async fn messages_for_chat(&self, chat_id: i64, user_id: i64) -> Result<Vec<Message>, ChatApiError> {
        self.db.fetch_messages(chat_id, user_id).await
    }

    async fn call_new_message_hook(&self, message: &Message) {
        for emitter in &self.producers.new_message_producer {
            debug!("🔄️💬️ Notifying new message hook subscribers");
            let event = NewMessageEvent::new(message.clone());
            emitter.publish_event(event).await;
        }
    }
}
