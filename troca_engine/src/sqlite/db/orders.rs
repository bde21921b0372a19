use log::debug;
use sqlx::SqliteConnection;

use crate::db_types::{Offer, Order, OrderStatus};

/// Creates the order for a freshly accepted offer. The seller is the offer's recipient and the purchaser its
/// sender. `orders.offer_id` is UNIQUE, so a second insert for the same offer fails rather than duplicating.
pub async fn insert_order_for_offer(offer: &Offer, conn: &mut SqliteConnection) -> Result<Order, sqlx::Error> {
    let order: Order = sqlx::query_as(
        r#"
            INSERT INTO orders (offer_id, product_id, seller_id, purchaser_id, amount, status)
            VALUES ($1, $2, $3, $4, $5, 'PENDING')
            RETURNING *;
        "#,
    )
    .bind(offer.id)
    .bind(offer.product_id)
    .bind(offer.recipient_id)
    .bind(offer.sender_id)
    .bind(offer.amount)
    .fetch_one(conn)
    .await?;
    debug!("📝️ Order #{} created for offer #{}", order.id, offer.id);
    Ok(order)
}

pub async fn fetch_order(order_id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(order_id).fetch_optional(conn).await?;
    Ok(order)
}

/// Returns every order in which the user is the seller or the purchaser, newest first.
pub async fn fetch_orders_for_user(user_id: i64, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let orders = sqlx::query_as(
        "SELECT * FROM orders WHERE seller_id = $1 OR purchaser_id = $1 ORDER BY created_at DESC, id DESC",
    )
    .bind(user_id)
    .fetch_all(conn)
    .await?;
    Ok(orders)
}

/// Sets the order's status, but only when `user_id` is a party to it. Absent orders and foreign orders both
/// come back as `None`.
pub async fn update_order_status(
    order_id: i64,
    user_id: i64,
    status: OrderStatus,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as(
        r#"
            UPDATE orders SET status = $2, updated_at = CURRENT_TIMESTAMP
            WHERE id = $1 AND (seller_id = $3 OR purchaser_id = $3)
            RETURNING *;
        "#,
    )
    .bind(order_id)
    .bind(status)
    .bind(user_id)
    .fetch_optional(conn)
    .await?;
    Ok(order)
}
