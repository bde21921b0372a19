use serde::{Deserialize, Serialize};

use crate::db_types::{Message, Offer};

/// A user posted a message in a chat. System messages written by the offer flow do not raise this event; their
/// information travels with the offer events below.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMessageEvent {
    pub message: Message,
}

impl NewMessageEvent {
    pub fn new(message: Message) -> Self {
        Self { message }
    }
}

/// A buyer made an offer on a product. The offer is in the PENDING state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOfferEvent {
    pub offer: Offer,
}

impl NewOfferEvent {
    pub fn new(offer: Offer) -> Self {
        Self { offer }
    }
}

/// An offer moved to a new state (ACCEPTED, DECLINED or PAID). The embedded offer carries the new status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferStatusChangedEvent {
    pub offer: Offer,
}

impl OfferStatusChangedEvent {
    pub fn new(offer: Offer) -> Self {
        Self { offer }
    }
}
