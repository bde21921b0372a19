use log::debug;
use sqlx::SqliteConnection;
use troca_common::Centavos;

use crate::db_types::Offer;

/// Inserts a PENDING offer. Validation (participation, ownership, single pending offer) happens in the caller's
/// transaction before this runs; the partial unique index on `(chat_id) WHERE status = 'PENDING'` is the
/// backstop against races.
pub async fn insert_offer(
    chat_id: i64,
    product_id: i64,
    sender_id: i64,
    recipient_id: i64,
    amount: Centavos,
    conn: &mut SqliteConnection,
) -> Result<Offer, sqlx::Error> {
    let offer: Offer = sqlx::query_as(
        r#"
            INSERT INTO offers (chat_id, product_id, sender_id, recipient_id, amount, status)
            VALUES ($1, $2, $3, $4, $5, 'PENDING')
            RETURNING *;
        "#,
    )
    .bind(chat_id)
    .bind(product_id)
    .bind(sender_id)
    .bind(recipient_id)
    .bind(amount)
    .fetch_one(conn)
    .await?;
    debug!("📝️ Offer #{} of {} inserted in chat #{chat_id}", offer.id, offer.amount);
    Ok(offer)
}

pub async fn fetch_offer(offer_id: i64, conn: &mut SqliteConnection) -> Result<Option<Offer>, sqlx::Error> {
    let offer = sqlx::query_as("SELECT * FROM offers WHERE id = $1").bind(offer_id).fetch_optional(conn).await?;
    Ok(offer)
}

/// Returns the chat's PENDING offer, if any. The schema allows at most one.
pub async fn pending_offer_for_chat(chat_id: i64, conn: &mut SqliteConnection) -> Result<Option<Offer>, sqlx::Error> {
    let offer = sqlx::query_as("SELECT * FROM offers WHERE chat_id = $1 AND status = 'PENDING'")
        .bind(chat_id)
        .fetch_optional(conn)
        .await?;
    Ok(offer)
}

/// Moves a PENDING offer addressed to `recipient_id` to ACCEPTED. The status guard in the WHERE clause means
/// at most one of two racing calls can get a row back.
pub async fn accept_pending(
    offer_id: i64,
    recipient_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<Offer>, sqlx::Error> {
    let offer = sqlx::query_as(
        r#"
            UPDATE offers SET status = 'ACCEPTED', updated_at = CURRENT_TIMESTAMP
            WHERE id = $1 AND recipient_id = $2 AND status = 'PENDING'
            RETURNING *;
        "#,
    )
    .bind(offer_id)
    .bind(recipient_id)
    .fetch_optional(conn)
    .await?;
    Ok(offer)
}

/// Moves a PENDING offer addressed to `recipient_id` to DECLINED. Same guard semantics as
/// [`accept_pending`].
pub async fn decline_pending(
    offer_id: i64,
    recipient_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<Offer>, sqlx::Error> {
    let offer = sqlx::query_as(
        r#"
            UPDATE offers SET status = 'DECLINED', updated_at = CURRENT_TIMESTAMP
            WHERE id = $1 AND recipient_id = $2 AND status = 'PENDING'
            RETURNING *;
        "#,
    )
    .bind(offer_id)
    .bind(recipient_id)
    .fetch_optional(conn)
    .await?;
    Ok(offer)
}

/// Fetches an ACCEPTED offer made by `sender_id`. Only the buyer may set up payment for an offer, and only
/// after it was accepted.
pub async fn fetch_accepted_for_sender(
    offer_id: i64,
    sender_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<Offer>, sqlx::Error> {
    let offer = sqlx::query_as("SELECT * FROM offers WHERE id = $1 AND sender_id = $2 AND status = 'ACCEPTED'")
        .bind(offer_id)
        .bind(sender_id)
        .fetch_optional(conn)
        .await?;
    Ok(offer)
}

/// Records the payment intent id against an ACCEPTED offer.
pub async fn attach_payment_intent(
    offer_id: i64,
    intent_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Offer>, sqlx::Error> {
    let offer = sqlx::query_as(
        r#"
            UPDATE offers SET payment_intent_id = $2, updated_at = CURRENT_TIMESTAMP
            WHERE id = $1 AND status = 'ACCEPTED'
            RETURNING *;
        "#,
    )
    .bind(offer_id)
    .bind(intent_id)
    .fetch_optional(conn)
    .await?;
    Ok(offer)
}

/// Fetches an ACCEPTED offer that has a payment intent attached, i.e. one that is confirmable.
pub async fn fetch_accepted_with_intent(
    offer_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<Offer>, sqlx::Error> {
    let offer =
        sqlx::query_as("SELECT * FROM offers WHERE id = $1 AND status = 'ACCEPTED' AND payment_intent_id IS NOT NULL")
            .bind(offer_id)
            .fetch_optional(conn)
            .await?;
    Ok(offer)
}

/// Moves an ACCEPTED offer with an attached intent to PAID. A duplicate call finds no row and returns `None`,
/// which is how webhook redelivery stays harmless.
pub async fn mark_paid(offer_id: i64, conn: &mut SqliteConnection) -> Result<Option<Offer>, sqlx::Error> {
    let offer = sqlx::query_as(
        r#"
            UPDATE offers SET status = 'PAID', updated_at = CURRENT_TIMESTAMP
            WHERE id = $1 AND status = 'ACCEPTED' AND payment_intent_id IS NOT NULL
            RETURNING *;
        "#,
    )
    .bind(offer_id)
    .fetch_optional(conn)
    .await?;
    Ok(offer)
}

/// Returns every offer the user sent or received, newest first.
pub async fn fetch_offers_for_user(user_id: i64, conn: &mut SqliteConnection) -> Result<Vec<Offer>, sqlx::Error> {
    let offers = sqlx::query_as(
        "SELECT * FROM offers WHERE sender_id = $1 OR recipient_id = $1 ORDER BY created_at DESC, id DESC",
    )
    .bind(user_id)
    .fetch_all(conn)
    .await?;
    Ok(offers)
}

/// Returns the offer history of a chat, newest first.
pub async fn fetch_offers_for_chat(chat_id: i64, conn: &mut SqliteConnection) -> Result<Vec<Offer>, sqlx::Error> {
    let offers = sqlx::query_as("SELECT * FROM offers WHERE chat_id = $1 ORDER BY created_at DESC, id DESC")
        .bind(chat_id)
        .fetch_all(conn)
        .await?;
    Ok(offers)
}
