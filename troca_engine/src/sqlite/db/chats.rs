use log::debug;
use sqlx::SqliteConnection;

use super::{messages, offers, products};
use crate::{
    api::chat_objects::{ChatDetail, ChatSummary},
    db_types::{Chat, UserSummary},
    traits::ChatApiError,
};

/// Finds the chat the buyer already has about a product, creating it if it does not exist yet. Returns `false`
/// in the second parameter if the chat already existed.
///
/// The unique index on `(product_id, buyer_id)` backs the pre-check: when two requests race past the lookup,
/// one insert loses with a unique violation and picks up the winner's row instead.
pub async fn idempotent_insert(
    product_id: i64,
    buyer: i64,
    seller: i64,
    conn: &mut SqliteConnection,
) -> Result<(Chat, bool), ChatApiError> {
    if let Some(chat) = fetch_chat_for_buyer(product_id, buyer, &mut *conn).await? {
        return Ok((chat, false));
    }
    match insert_chat(product_id, buyer, seller, &mut *conn).await {
        Ok(chat) => {
            debug!("📝️ Chat #{} created for product #{product_id}", chat.id);
            Ok((chat, true))
        },
        Err(e) if is_unique_violation(&e) => {
            let chat = fetch_chat_for_buyer(product_id, buyer, conn).await?.ok_or_else(|| {
                ChatApiError::DatabaseError(format!(
                    "Chat for product #{product_id} and buyer #{buyer} exists but could not be fetched"
                ))
            })?;
            Ok((chat, false))
        },
        Err(e) => Err(e.into()),
    }
}

pub async fn fetch_chat_for_buyer(
    product_id: i64,
    buyer: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<Chat>, sqlx::Error> {
    let chat = sqlx::query_as("SELECT * FROM chats WHERE product_id = $1 AND buyer_id = $2")
        .bind(product_id)
        .bind(buyer)
        .fetch_optional(conn)
        .await?;
    Ok(chat)
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(de) if de.is_unique_violation())
}

async fn insert_chat(
    product_id: i64,
    buyer: i64,
    seller: i64,
    conn: &mut SqliteConnection,
) -> Result<Chat, sqlx::Error> {
    let chat: Chat = sqlx::query_as("INSERT INTO chats (product_id, buyer_id) VALUES ($1, $2) RETURNING *")
        .bind(product_id)
        .bind(buyer)
        .fetch_one(&mut *conn)
        .await?;
    for user_id in [buyer, seller] {
        sqlx::query("INSERT INTO chat_participants (chat_id, user_id) VALUES ($1, $2)")
            .bind(chat.id)
            .bind(user_id)
            .execute(&mut *conn)
            .await?;
    }
    Ok(chat)
}

/// Fetches the chat only if `user_id` is one of its participants. Absent chats and foreign chats are
/// indistinguishable to the caller.
pub async fn fetch_chat_for_user(
    chat_id: i64,
    user_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<Chat>, sqlx::Error> {
    let chat = sqlx::query_as(
        r#"
            SELECT chats.* FROM chats
            JOIN chat_participants ON chat_participants.chat_id = chats.id AND chat_participants.user_id = $2
            WHERE chats.id = $1;
        "#,
    )
    .bind(chat_id)
    .bind(user_id)
    .fetch_optional(conn)
    .await?;
    Ok(chat)
}

pub async fn fetch_participants(chat_id: i64, conn: &mut SqliteConnection) -> Result<Vec<UserSummary>, sqlx::Error> {
    let participants = sqlx::query_as(
        r#"
            SELECT users.id, users.name, users.email FROM users
            JOIN chat_participants ON chat_participants.user_id = users.id
            WHERE chat_participants.chat_id = $1
            ORDER BY users.id;
        "#,
    )
    .bind(chat_id)
    .fetch_all(conn)
    .await?;
    Ok(participants)
}

/// Returns the participant of the chat that is not `user_id`. A chat always has exactly two participants, so
/// `None` here means the chat does not exist.
pub async fn other_participant(
    chat_id: i64,
    user_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<i64>, sqlx::Error> {
    let other = sqlx::query_scalar("SELECT user_id FROM chat_participants WHERE chat_id = $1 AND user_id != $2")
        .bind(chat_id)
        .bind(user_id)
        .fetch_optional(conn)
        .await?;
    Ok(other)
}

/// Bumps the chat's `updated_at` so that the chat list sorts it to the top.
pub async fn touch_chat(chat_id: i64, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE chats SET updated_at = CURRENT_TIMESTAMP WHERE id = $1").bind(chat_id).execute(conn).await?;
    Ok(())
}

/// Fetches one page of the user's chats, most recently updated first. `page` is 1-based.
pub async fn fetch_chats_for_user(
    user_id: i64,
    page: i64,
    limit: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<Chat>, sqlx::Error> {
    let offset = (page.max(1) - 1) * limit;
    let chats = sqlx::query_as(
        r#"
            SELECT chats.* FROM chats
            JOIN chat_participants ON chat_participants.chat_id = chats.id
            WHERE chat_participants.user_id = $1
            ORDER BY chats.updated_at DESC, chats.id DESC
            LIMIT $2 OFFSET $3;
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(conn)
    .await?;
    Ok(chats)
}

pub async fn count_chats_for_user(user_id: i64, conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
    let count = sqlx::query_scalar("SELECT COUNT(*) FROM chat_participants WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(conn)
        .await?;
    Ok(count)
}

/// Assembles the full conversation view for a participant: chat, product summary, participants, messages
/// (oldest first) and offers (newest first). Returns `None` when the chat is absent or the user is not in it.
pub async fn chat_detail(
    chat_id: i64,
    user_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<ChatDetail>, ChatApiError> {
    let Some(chat) = fetch_chat_for_user(chat_id, user_id, &mut *conn).await? else {
        return Ok(None);
    };
    let product = products::fetch_product_summary(chat.product_id, &mut *conn)
        .await?
        .ok_or_else(|| ChatApiError::DatabaseError(format!("Chat #{chat_id} references a missing product")))?;
    let participants = fetch_participants(chat_id, &mut *conn).await?;
    let messages = messages::fetch_messages(chat_id, &mut *conn).await?;
    let offers = offers::fetch_offers_for_chat(chat_id, &mut *conn).await?;
    Ok(Some(ChatDetail { chat, product, participants, messages, offers }))
}

/// Assembles one chat-list row: the chat, its product summary, the participants and the latest message.
pub async fn chat_summary(chat: Chat, conn: &mut SqliteConnection) -> Result<ChatSummary, ChatApiError> {
    let product = products::fetch_product_summary(chat.product_id, &mut *conn)
        .await?
        .ok_or_else(|| ChatApiError::DatabaseError(format!("Chat #{} references a missing product", chat.id)))?;
    let participants = fetch_participants(chat.id, &mut *conn).await?;
    let last_message = messages::last_message(chat.id, &mut *conn).await?;
    Ok(ChatSummary { chat, product, participants, last_message })
}
