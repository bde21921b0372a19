use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewUser, User},
    traits::UserApiError,
};

/// Inserts a new user, enforcing email uniqueness. The `users.email` column carries a UNIQUE constraint, so a
/// race between the pre-check and the insert still cannot produce a duplicate; it surfaces as
/// [`UserApiError::EmailAlreadyExists`] either way.
pub async fn insert_user(user: NewUser, conn: &mut SqliteConnection) -> Result<User, UserApiError> {
    if fetch_user_by_email(&user.email, &mut *conn).await?.is_some() {
        return Err(UserApiError::EmailAlreadyExists);
    }
    let user: User = sqlx::query_as(
        r#"
            INSERT INTO users (name, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING *;
        "#,
    )
    .bind(user.name)
    .bind(user.email)
    .bind(user.password_hash)
    .fetch_one(conn)
    .await
    .map_err(|e| match e.as_database_error().map(|db| db.kind()) {
        Some(sqlx::error::ErrorKind::UniqueViolation) => UserApiError::EmailAlreadyExists,
        _ => UserApiError::from(e),
    })?;
    debug!("📝️ User #{} ({}) inserted", user.id, user.email);
    Ok(user)
}

pub async fn fetch_user_by_id(id: i64, conn: &mut SqliteConnection) -> Result<Option<User>, sqlx::Error> {
    let user = sqlx::query_as("SELECT * FROM users WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(user)
}

pub async fn fetch_user_by_email(email: &str, conn: &mut SqliteConnection) -> Result<Option<User>, sqlx::Error> {
    let user = sqlx::query_as("SELECT * FROM users WHERE email = $1").bind(email).fetch_optional(conn).await?;
    Ok(user)
}

/// Stores the Stripe customer id against the user and returns the updated row.
pub async fn set_stripe_customer_id(
    user_id: i64,
    customer_id: &str,
    conn: &mut SqliteConnection,
) -> Result<User, UserApiError> {
    let user = sqlx::query_as(
        "UPDATE users SET stripe_customer_id = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 RETURNING *",
    )
    .bind(customer_id)
    .bind(user_id)
    .fetch_optional(conn)
    .await?
    .ok_or(UserApiError::UserNotFound(user_id))?;
    Ok(user)
}
