//! The offer state machine, from first bid to confirmed payment.

use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{NewOffer, Offer, Order, OrderStatus},
    events::{EventProducers, NewOfferEvent, OfferStatusChangedEvent},
    traits::{NegotiationDatabase, NegotiationError},
};

/// The `NegotiationApi` is the primary API for the offer lifecycle. It drives offers along
/// PENDING -> ACCEPTED -> PAID (or PENDING -> DECLINED), creates the order when an offer is accepted, and
/// publishes events after each committed transition so that subscribers can fan the change out to clients.
///
/// Payment gateway calls do not happen here. Callers fetch the offer via [`Self::offer_for_payment`] or
/// [`Self::offer_awaiting_confirmation`], talk to the gateway themselves, and then record the outcome with
/// [`Self::attach_payment_intent`] or [`Self::complete_payment`].
pub struct NegotiationApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for NegotiationApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "NegotiationApi")
    }
}

impl<B> NegotiationApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }
}

impl<B> NegotiationApi<B>
where B: NegotiationDatabase
{
    /// Submits a new offer on a product. The engine validates the amount, the sender's participation in the
    /// chat and the recipient's ownership of the product, persists the PENDING offer with its announcement
    /// message, and then notifies subscribers.
    pub async fn make_offer(&self, offer: NewOffer) -> Result<Offer, NegotiationError> {
        let offer = self.db.insert_offer(offer).await?;
        debug!(
            "🔄️🤝️ Offer #{} of {} made in chat #{} by user #{}",
            offer.id, offer.amount, offer.chat_id, offer.sender_id
        );
        self.call_new_offer_hook(&offer).await;
        Ok(offer)
    }

    /// Accepts a PENDING offer addressed to `user_id`. The matching order is created in the same transaction.
    pub async fn accept_offer(&self, offer_id: i64, user_id: i64) -> Result<(Offer, Order), NegotiationError> {
        let (offer, order) = self.db.accept_offer(offer_id, user_id).await?;
        debug!("🔄️🤝️ Offer #{offer_id} accepted by user #{user_id}. Order #{} created", order.id);
        self.call_status_changed_hook(&offer).await;
        Ok((offer, order))
    }

    /// Declines a PENDING offer addressed to `user_id`.
    pub async fn decline_offer(&self, offer_id: i64, user_id: i64) -> Result<Offer, NegotiationError> {
        let offer = self.db.decline_offer(offer_id, user_id).await?;
        debug!("🔄️🤝️ Offer #{offer_id} declined by user #{user_id}");
        self.call_status_changed_hook(&offer).await;
        Ok(offer)
    }

    /// Fetches an ACCEPTED offer owned by `sender_id` so the caller can set up its payment.
    pub async fn offer_for_payment(&self, offer_id: i64, sender_id: i64) -> Result<Offer, NegotiationError> {
        self.db.offer_for_payment(offer_id, sender_id).await
    }

    /// Records the gateway's payment intent id against the offer.
    pub async fn attach_payment_intent(&self, offer_id: i64, intent_id: &str) -> Result<Offer, NegotiationError> {
        let offer = self.db.attach_payment_intent(offer_id, intent_id).await?;
        debug!("🔄️🤝️ Payment intent {intent_id} attached to offer #{offer_id}");
        Ok(offer)
    }

    /// Fetches an ACCEPTED offer with a payment intent attached so the caller can check the payment's fate.
    pub async fn offer_awaiting_confirmation(&self, offer_id: i64) -> Result<Offer, NegotiationError> {
        self.db.offer_awaiting_confirmation(offer_id).await
    }

    /// Marks an ACCEPTED offer as PAID once the gateway reports the payment as settled, and notifies
    /// subscribers. Safe to call twice for the same offer; the loser of the race gets
    /// [`NegotiationError::OfferNotFound`].
    pub async fn complete_payment(&self, offer_id: i64) -> Result<Offer, NegotiationError> {
        let offer = self.db.complete_payment(offer_id).await?;
        debug!("🔄️🤝️ Offer #{offer_id} is paid");
        self.call_status_changed_hook(&offer).await;
        Ok(offer)
    }

    /// Fetches the offer with the given id, or None if no such offer exists.
    pub async fn offer_by_id(&self, offer_id: i64) -> Result<Option<Offer>, NegotiationError> {
        self.db.offer_by_id(offer_id).await
    }

    /// Fetches the chat's PENDING offer, if any.
    pub async fn pending_offer_for_chat(&self, chat_id: i64) -> Result<Option<Offer>, NegotiationError> {
        self.db.pending_offer_for_chat(chat_id).await
    }

    /// Fetches every offer the user sent or received.
    pub async fn offers_for_user(&self, user_id: i64) -> Result<Vec<Offer>, NegotiationError> {
        self.db.offers_for_user(user_id).await
    }

    /// Fetches the order with the given id, or None if no such order exists.
    pub async fn order_by_id(&self, order_id: i64) -> Result<Option<Order>, NegotiationError> {
        self.db.order_by_id(order_id).await
    }

    /// Fetches every order in which the user is a party.
    pub async fn orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, NegotiationError> {
        self.db.orders_for_user(user_id).await
    }

    /// Sets the status of an order, gated on `user_id` being a party to it.
    pub async fn update_order_status(
        &self,
        order_id: i64,
        user_id: i64,
        status: OrderStatus,
    ) -> Result<Order, NegotiationError> {
        let order = self.db.update_order_status(order_id, user_id, status).await?;
        debug!("🔄️🤝️ Order #{order_id} moved to {status} by user #{user_id}");
        Ok(order)
    }

    async fn call_new_offer_hook(&self, offer: &Offer) {
        for emitter in &self.producers.new_offer_producer {
            debug!("🔄️🤝️ Notifying new offer hook subscribers");
            let event = NewOfferEvent::new(offer.clone());
            emitter.publish_event(event).await;
        }
    }

    async fn call_status_changed_hook(&self, offer: &Offer) {
        for emitter in &self.producers.offer_status_producer {
            debug!("🔄️🤝️ Notifying offer status hook subscribers");
            let event = OfferStatusChangedEvent::new(offer.clone());
            emitter.publish_event(event).await;
        }
    }
}
