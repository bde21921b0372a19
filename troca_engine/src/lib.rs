//! Troca Marketplace Engine
//!
//! The engine holds the core logic for the Troca marketplace: chats between buyers and sellers, price offers and
//! their lifecycle, and the orders that result from accepted offers. It is server-agnostic; the REST and websocket
//! surfaces live in `troca_server`.
//!
//! The library is divided into two main sections:
//! 1. Database management and control ([`mod@sqlite`]). SQLite is the supported backend. You should never need to
//!    access the database directly. Instead, use the public API provided by the engine. The exception is the data
//!    types used in the database. These are defined in the `db_types` module and are public.
//! 2. The engine public API ([`mod@api`]). This provides the public-facing functionality of the engine: user
//!    registration and credentials, chat threads and messages, and the offer negotiation flow. Backends need to
//!    implement the traits in [`mod@traits`] in order to drive these APIs.
//!
//! The engine also provides a set of events that can be subscribed to. These events are emitted when messages are
//! sent and when offers are created or change status. A simple actor framework is used so that you can hook into
//! these events and perform custom actions, such as pushing them to connected websocket clients.
pub mod api;
pub mod db_types;
pub mod events;
pub mod traits;

#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use api::{chat_objects, CatalogApi, ChatApi, NegotiationApi, UserApi};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use traits::{
    CatalogApiError,
    CatalogManagement,
    ChatApiError,
    ChatManagement,
    NegotiationDatabase,
    NegotiationError,
    UserApiError,
    UserManagement,
};
