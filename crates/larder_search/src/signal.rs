//! Multi-subscriber broadcast signal.

use parking_lot::RwLock;
use std::sync::mpsc::{self, Receiver, Sender};

/// A small broadcast channel: every subscriber receives every value
/// emitted after it subscribed. Disconnected subscribers are pruned on
/// the next emit.
pub struct Signal<T> {
    subscribers: RwLock<Vec<Sender<T>>>,
}

impl<T: Clone> Signal<T> {
    /// Creates a signal with no subscribers.
    pub fn new() -> Self {
        Self {
            subscribers: RwLock::new(Vec::new()),
        }
    }

    /// Subscribes to future values.
    pub fn subscribe(&self) -> Receiver<T> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.write().push(tx);
        rx
    }

    /// Delivers a value to every live subscriber.
    pub fn emit(&self, value: T) {
        let mut subscribers = self.subscribers.write();
        subscribers.retain(|tx| tx.send(value.clone()).is_ok());
    }

    /// Returns the number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }
}

impl<T: Clone> Default for Signal<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("subscribers", &self.subscribers.read().len())
            .finish()
    }
}
