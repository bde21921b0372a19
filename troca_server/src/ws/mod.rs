//! The real-time layer.
//!
//! Clients connect to `GET /ws` with their access token and are registered under their user id. They can then
//! join the channels of the chats they have open. The engine's domain events are pushed to these channels by the
//! handlers in [`crate::integrations::websocket`]; the registry here only knows how to track connections and
//! fan frames out to them.

mod registry;
mod session;

use serde::Serialize;
use serde_json::json;

pub use registry::{ConnectionId, WsRegistry};
pub use session::{web_socket, WebSocketRoute};

pub const NEW_MESSAGE_EVENT: &str = "newMessage";
pub const NEW_OFFER_EVENT: &str = "newOffer";
pub const OFFER_STATUS_CHANGED_EVENT: &str = "offerStatusChanged";

/// Renders a websocket frame in the `{"event": ..., "data": ...}` envelope every push and ack uses.
pub fn frame<T: Serialize>(event: &str, data: &T) -> String {
    json!({ "event": event, "data": data }).to_string()
}
