//! The database-agnostic behaviour of the marketplace lives in this module, described as a set of traits.
//!
//! Backends implement these traits to provide persistence. The SQLite implementation in the `sqlite` module is the
//! only backend at present, but API structs are written against the traits so that swapping the store out is a
//! matter of implementing them elsewhere.
//!
//! ## Traits
//!
//! * [`UserManagement`]: Registration lookups and user records, including the Stripe customer id attached to a user
//!   the first time they pay.
//! * [`CatalogManagement`]: Products, product images and the fixed category list they hang off.
//! * [`ChatManagement`]: Per-product conversations between a buyer and a seller, and the messages inside them.
//! * [`NegotiationDatabase`]: The offer state machine and the orders that acceptance creates.

mod catalog_management;
mod chat_management;
mod negotiation;
mod user_management;

pub use catalog_management::{CatalogApiError, CatalogManagement};
pub use chat_management::{ChatApiError, ChatManagement};
pub use negotiation::{NegotiationDatabase, NegotiationError};
pub use user_management::{UserApiError, UserManagement};
