use sqlx::SqliteConnection;

use crate::db_types::{Message, NewMessage};

/// Appends a message to a chat. The chat timestamp is not touched here; callers do that in the same
/// transaction via [`super::chats::touch_chat`].
pub async fn insert_message(message: NewMessage, conn: &mut SqliteConnection) -> Result<Message, sqlx::Error> {
    let message = sqlx::query_as(
        r#"
            INSERT INTO messages (chat_id, from_user_id, to_user_id, text)
            VALUES ($1, $2, $3, $4)
            RETURNING *;
        "#,
    )
    .bind(message.chat_id)
    .bind(message.from_user_id)
    .bind(message.to_user_id)
    .bind(message.text)
    .fetch_one(conn)
    .await?;
    Ok(message)
}

/// Returns the full message history of a chat, oldest first. The id tiebreak keeps insertion order stable when
/// two messages share a timestamp.
pub async fn fetch_messages(chat_id: i64, conn: &mut SqliteConnection) -> Result<Vec<Message>, sqlx::Error> {
    let messages = sqlx::query_as("SELECT * FROM messages WHERE chat_id = $1 ORDER BY created_at, id")
        .bind(chat_id)
        .fetch_all(conn)
        .await?;
    Ok(messages)
}

/// Returns the most recent message of a chat, used as the preview in chat lists.
pub async fn last_message(chat_id: i64, conn: &mut SqliteConnection) -> Result<Option<Message>, sqlx::Error> {
    let message = sqlx::query_as("SELECT * FROM messages WHERE chat_id = $1 ORDER BY created_at DESC, id DESC LIMIT 1")
        .bind(chat_id)
        .fetch_optional(conn)
        .await?;
    Ok(message)
}
