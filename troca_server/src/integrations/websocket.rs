//! Wires the engine's domain events to the websocket registry.
//!
//! The engine publishes an event after each committed write; the hooks installed here render the event in the
//! client frame envelope and push it to the chat channel and to both participants' personal channels. The engine
//! stays ignorant of the websocket layer, and a frame that cannot be delivered costs nothing but a log line.

use futures::future::BoxFuture;
use log::*;
use troca_engine::events::{EventHandlers, EventHooks};

use crate::ws::{frame, WsRegistry, NEW_MESSAGE_EVENT, NEW_OFFER_EVENT, OFFER_STATUS_CHANGED_EVENT};

pub const WS_EVENT_BUFFER_SIZE: usize = 25;

/// Assigns event handlers that fan domain events out to connected websocket clients.
///
/// All three domain events are relevant here:
///
/// 1. NewMessageEvent - A user posted a message in a chat. Pushed as `newMessage`.
/// 2. NewOfferEvent - A buyer made an offer. Pushed as `newOffer`.
/// 3. OfferStatusChangedEvent - An offer was accepted, declined or paid. Pushed as `offerStatusChanged`.
pub fn create_websocket_event_handlers(registry: WsRegistry) -> EventHandlers {
    let mut hooks = EventHooks::default();
    // --- On NewMessage Handler ---
    let reg = registry.clone();
    hooks.on_new_message(move |ev| {
        let message = ev.message;
        debug!("📡️ Pushing message #{} to the subscribers of chat #{}", message.id, message.chat_id);
        let payload = frame(NEW_MESSAGE_EVENT, &message);
        reg.send_to_chat(message.chat_id, &payload);
        reg.send_to_user(message.from_user_id, &payload);
        reg.send_to_user(message.to_user_id, &payload);
        no_op()
    });
    // --- On NewOffer Handler ---
    let reg = registry.clone();
    hooks.on_new_offer(move |ev| {
        let offer = ev.offer;
        debug!("📡️ Pushing offer #{} to the subscribers of chat #{}", offer.id, offer.chat_id);
        let payload = frame(NEW_OFFER_EVENT, &offer);
        reg.send_to_chat(offer.chat_id, &payload);
        reg.send_to_user(offer.sender_id, &payload);
        reg.send_to_user(offer.recipient_id, &payload);
        no_op()
    });
    // --- On OfferStatusChanged Handler ---
    let reg = registry;
    hooks.on_offer_status_changed(move |ev| {
        let offer = ev.offer;
        debug!("📡️ Pushing {} status of offer #{} to the subscribers of chat #{}", offer.status, offer.id, offer.chat_id);
        let payload = frame(OFFER_STATUS_CHANGED_EVENT, &offer);
        reg.send_to_chat(offer.chat_id, &payload);
        reg.send_to_user(offer.sender_id, &payload);
        reg.send_to_user(offer.recipient_id, &payload);
        no_op()
    });
    EventHandlers::new(WS_EVENT_BUFFER_SIZE, hooks)
}

fn no_op() -> BoxFuture<'static, ()> {
    Box::pin(async {})
}
