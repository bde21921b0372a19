use thiserror::Error;

use crate::db_types::{NewUser, User};

#[derive(Debug, Clone, Error)]
pub enum UserApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("A user with this email address already exists")]
    EmailAlreadyExists,
    #[error("User {0} does not exist")]
    UserNotFound(i64),
    #[error("Could not process the password: {0}")]
    PasswordHash(String),
}

impl From<sqlx::Error> for UserApiError {
    fn from(e: sqlx::Error) -> Self {
        UserApiError::DatabaseError(e.to_string())
    }
}

#[allow(async_fn_in_trait)]
pub trait UserManagement {
    /// Creates a new user record. The password must already be hashed. Fails with
    /// [`UserApiError::EmailAlreadyExists`] when the email address is taken.
    async fn create_user(&self, user: NewUser) -> Result<User, UserApiError>;

    /// Fetches the user with the given id, or None if no such user exists.
    async fn fetch_user_by_id(&self, id: i64) -> Result<Option<User>, UserApiError>;

    /// Fetches the user with the given email address, or None if no such user exists.
    async fn fetch_user_by_email(&self, email: &str) -> Result<Option<User>, UserApiError>;

    /// Stores the Stripe customer id against the user, so that future payments reuse the same customer.
    async fn set_stripe_customer_id(&self, user_id: i64, customer_id: &str) -> Result<User, UserApiError>;
}
