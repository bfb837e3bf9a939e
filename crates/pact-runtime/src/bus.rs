//! EventBus - broadcast fan-out between workers.
//!
//! The bus delivers every published [`Message`] to every live
//! subscription, each over its own unbounded queue:
//!
//! ```text
//! agreement worker ──publish()──►┐
//! container worker ──publish()──►│ EventBus ──┬──► queue ──► governance
//! governance       ──publish()──►┘            ├──► queue ──► container
//!                                             └──► queue ──► torrent
//! ```
//!
//! Per-subscriber queues mean a slow consumer only grows its own
//! backlog; publishers never block and unrelated consumers are never
//! held up. A single producer's messages are observed by each consumer
//! in emission order. No ordering is defined across producers.
//!
//! Delivery is assumed reliable: there is no retry or error surface
//! here. A subscription ends only when every bus clone is gone.

use pact_event::Message;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::trace;

/// Many-producer / many-consumer broadcast bus.
///
/// Cloning is cheap; clones share the subscriber set. Workers keep a
/// clone for publishing and hand their subscription to the runtime.
#[derive(Debug, Clone, Default)]
pub struct EventBus {
    subscribers: Arc<Mutex<Vec<mpsc::UnboundedSender<Message>>>>,
}

impl EventBus {
    /// Creates an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Delivers `message` to every live subscription.
    ///
    /// Non-blocking. Subscriptions whose receiver is gone are dropped
    /// from the subscriber set.
    pub fn publish(&self, message: Message) {
        trace!(event = %message.event_id(), "publish");
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|tx| tx.send(message.clone()).is_ok());
    }

    /// Opens a new subscription.
    ///
    /// The subscription observes every message published after this
    /// call. It is not restartable; subscribe again to observe new
    /// messages after dropping one.
    #[must_use]
    pub fn subscribe(&self) -> BusSubscription {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.lock().push(tx);
        BusSubscription { rx }
    }

    /// Number of live subscriptions.
    ///
    /// Subscriptions are pruned on publish, so this may over-count
    /// until the next message.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }
}

/// Receiving end of one bus subscription.
pub struct BusSubscription {
    rx: mpsc::UnboundedReceiver<Message>,
}

impl BusSubscription {
    /// Waits for the next message.
    ///
    /// Returns `None` once every [`EventBus`] clone has been dropped
    /// and the queue is drained.
    pub async fn recv(&mut self) -> Option<Message> {
        self.rx.recv().await
    }

    /// Returns the next message without waiting.
    pub fn try_recv(&mut self) -> Option<Message> {
        self.rx.try_recv().ok()
    }
}
