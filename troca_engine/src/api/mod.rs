//! # Troca marketplace engine public API
//!
//! The `api` module exposes the programmatic API for the marketplace engine. The API is modular, so that clients
//! can pick and choose the functionality they need. Different parts (e.g. users and negotiation) could even be
//! hosted on different machines, backed by different databases.
//!
//! * [`UserApi`] registers users, checks credentials and tracks the Stripe customer attached to a user.
//! * [`CatalogApi`] serves the category list and product listings.
//! * [`ChatApi`] manages per-product conversations and the messages inside them.
//! * [`NegotiationApi`] drives the offer state machine and the orders it creates.
//!
//! The [`chat_objects`] submodule holds the aggregate view types the chat API returns.
//!
//! # API usage
//!
//! The pattern for all the APIs is the same. An instance is created by supplying a database backend that
//! implements the traits the API requires.
//!
//! ```rust,ignore
//! use troca_engine::{ChatApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url(...).await?;
//! // SqliteDatabase implements ChatManagement
//! let api = ChatApi::new(db, producers);
//! let page = api.chats_for_user(user_id, 1, 10).await?;
//! ```

pub mod chat_objects;

mod catalog_api;
mod chat_api;
mod negotiation_api;
mod user_api;

pub use catalog_api::CatalogApi;
pub use chat_api::ChatApi;
pub use negotiation_api::NegotiationApi;
pub use user_api::UserApi;
