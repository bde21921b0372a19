//! Registration and credential checks.

use std::fmt::Debug;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use log::*;

use crate::{
    db_types::{NewUser, User},
    traits::{UserApiError, UserManagement},
};

/// The `UserApi` registers users and verifies their credentials. Passwords are hashed with argon2 before they
/// reach the database; the plaintext is never stored or logged.
pub struct UserApi<B> {
    db: B,
}

impl<B: Debug> Debug for UserApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "UserApi ({:?})", self.db)
    }
}

impl<B> UserApi<B>
where B: UserManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// Registers a new user. The password is hashed here; callers pass the plaintext exactly once.
    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<User, UserApiError> {
        let password_hash = hash_password(password)?;
        let user = self.db.create_user(NewUser::new(name, email, password_hash)).await?;
        debug!("🧑️ Registered user #{} ({})", user.id, user.email);
        Ok(user)
    }

    /// Checks an email / password pair. Returns the user on success and `None` when the email is unknown or the
    /// password does not match. The two failure cases are indistinguishable to the caller.
    pub async fn verify_credentials(&self, email: &str, password: &str) -> Result<Option<User>, UserApiError> {
        let Some(user) = self.db.fetch_user_by_email(email).await? else {
            return Ok(None);
        };
        let hash = PasswordHash::new(&user.password_hash).map_err(|e| UserApiError::PasswordHash(e.to_string()))?;
        match Argon2::default().verify_password(password.as_bytes(), &hash) {
            Ok(()) => Ok(Some(user)),
            Err(_) => Ok(None),
        }
    }

    /// Fetches the user with the given id, or None if no such user exists.
    pub async fn user_by_id(&self, id: i64) -> Result<Option<User>, UserApiError> {
        self.db.fetch_user_by_id(id).await
    }

    /// Fetches the user with the given email address, or None if no such user exists.
    pub async fn user_by_email(&self, email: &str) -> Result<Option<User>, UserApiError> {
        self.db.fetch_user_by_email(email).await
    }

    /// Stores the Stripe customer id against the user.
    pub async fn set_stripe_customer_id(&self, user_id: i64, customer_id: &str) -> Result<User, UserApiError> {
        let user = self.db.set_stripe_customer_id(user_id, customer_id).await?;
        debug!("🧑️ User #{user_id} is now Stripe customer {customer_id}");
        Ok(user)
    }
}

fn hash_password(password: &str) -> Result<String, UserApiError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| UserApiError::PasswordHash(e.to_string()))?;
    Ok(hash.to_string())
}
