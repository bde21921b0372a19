//! Stateless pub-sub plumbing for marketplace events.
//!
//! Components subscribe to negotiation events and react to them without the negotiation code knowing who is
//! listening. Handlers are stateless: they receive the event and nothing else. They may be async, and each event
//! is handled on its own task so a slow handler does not hold up the queue.
use std::{
    future::Future,
    pin::Pin,
    sync::{
        atomic::{AtomicI64, Ordering},
        Arc,
    },
};

use log::*;
use tokio::sync::mpsc;

pub type Handler<E> = Arc<dyn Fn(E) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

pub struct EventHandler<E: Send + Sync + 'static> {
    receiver: mpsc::Receiver<E>,
    sender: mpsc::Sender<E>,
    handler: Handler<E>,
}

impl<E: Send + Sync + 'static> EventHandler<E> {
    pub fn new(buffer_size: usize, handler: Handler<E>) -> Self {
        let (sender, receiver) = mpsc::channel(buffer_size);
        Self { receiver, sender, handler }
    }

    pub fn subscribe(&self) -> EventProducer<E> {
        EventProducer::new(self.sender.clone())
    }

    /// Consumes events until every producer has been dropped, then waits for the in-flight handler tasks to
    /// finish before returning.
    pub async fn start_handler(mut self) {
        debug!("📬️ Event handler running");
        // The handler holds its own sender for subscribe(). Drop it here so the recv loop ends once the
        // last external producer goes away.
        drop(self.sender);
        let in_flight = Arc::new(AtomicI64::new(0));
        while let Some(ev) = self.receiver.recv().await {
            trace!("📬️ Event received");
            let handler = Arc::clone(&self.handler);
            in_flight.fetch_add(1, Ordering::SeqCst);
            let counter = Arc::clone(&in_flight);
            tokio::spawn(async move {
                (handler)(ev).await;
                counter.fetch_sub(1, Ordering::Relaxed);
                trace!("📬️ Event handled");
            });
        }
        let drain = tokio::spawn(async move {
            while in_flight.load(Ordering::SeqCst) > 0 {
                debug!("📬️ Waiting for in-flight handlers to finish");
                tokio::time::sleep(tokio::time::Duration::from_millis(1000)).await;
            }
        });
        match drain.await {
            Ok(()) => debug!("📬️ Event handler shut down cleanly"),
            Err(e) => warn!("📬️ Event handler drain task failed: {e}"),
        }
    }
}

#[derive(Clone)]
pub struct EventProducer<E: Send + Sync> {
    sender: mpsc::Sender<E>,
}

impl<E: Send + Sync> EventProducer<E> {
    pub fn new(sender: mpsc::Sender<E>) -> Self {
        Self { sender }
    }

    pub async fn publish_event(&self, event: E) {
        if let Err(e) = self.sender.send(event).await {
            error!("📬️ Failed to send event: {e}");
        }
    }
}
