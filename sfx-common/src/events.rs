//! Generic broadcast event bus
//!
//! Each producer owns an [`EventBus`] for its own event type. Subscribers only
//! see events emitted after they subscribed; slow subscribers lose the oldest
//! events once `capacity` is exceeded (tokio broadcast semantics).

use tokio::sync::broadcast;

/// Broadcast bus for one event type
#[derive(Debug)]
pub struct EventBus<E: Clone> {
    tx: broadcast::Sender<E>,
    capacity: usize,
}

impl<E: Clone> EventBus<E> {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// # Examples
    ///
    /// ```
    /// use sfx_common::events::EventBus;
    ///
    /// let event_bus: EventBus<String> = EventBus::new(100);
    /// assert_eq!(event_bus.capacity(), 100);
    /// ```
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self {
            tx,
            capacity: capacity.max(1),
        }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<E> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(&self, event: E) -> Result<usize, broadcast::error::SendError<E>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring the no-subscriber case
    pub fn emit_lossy(&self, event: E) {
        let _ = self.tx.send(event);
    }

    /// Channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl<E: Clone> Clone for EventBus<E> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            capacity: self.capacity,
        }
    }
}
