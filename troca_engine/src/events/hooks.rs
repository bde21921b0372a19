use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{EventHandler, EventProducer, Handler, NewMessageEvent, NewOfferEvent, OfferStatusChangedEvent};

/// The set of producers handed to the domain APIs. Cloning is cheap; each producer is a channel sender.
#[derive(Default, Clone)]
pub struct EventProducers {
    pub new_message_producer: Vec<EventProducer<NewMessageEvent>>,
    pub new_offer_producer: Vec<EventProducer<NewOfferEvent>>,
    pub offer_status_producer: Vec<EventProducer<OfferStatusChangedEvent>>,
}

pub struct EventHandlers {
    pub on_new_message: Option<EventHandler<NewMessageEvent>>,
    pub on_new_offer: Option<EventHandler<NewOfferEvent>>,
    pub on_offer_status_changed: Option<EventHandler<OfferStatusChangedEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_new_message = hooks.on_new_message.map(|f| EventHandler::new(buffer_size, f));
        let on_new_offer = hooks.on_new_offer.map(|f| EventHandler::new(buffer_size, f));
        let on_offer_status_changed = hooks.on_offer_status_changed.map(|f| EventHandler::new(buffer_size, f));
        Self { on_new_message, on_new_offer, on_offer_status_changed }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_new_message {
            result.new_message_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_new_offer {
            result.new_offer_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_offer_status_changed {
            result.offer_status_producer.push(handler.subscribe());
        }
        result
    }

    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_new_message {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
        if let Some(handler) = self.on_new_offer {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
        if let Some(handler) = self.on_offer_status_changed {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_new_message: Option<Handler<NewMessageEvent>>,
    pub on_new_offer: Option<Handler<NewOfferEvent>>,
    pub on_offer_status_changed: Option<Handler<OfferStatusChangedEvent>>,
}

impl EventHooks {
    pub fn on_new_message<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(NewMessageEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_new_message = Some(Arc::new(f));
        self
    }

    pub fn on_new_offer<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(NewOfferEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_new_offer = Some(Arc::new(f));
        self
    }

    pub fn on_offer_status_changed<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OfferStatusChangedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_offer_status_changed = Some(Arc::new(f));
        self
    }
}
