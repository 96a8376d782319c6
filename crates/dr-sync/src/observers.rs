//! Connected observer sessions
//!
//! Each observer owns a bounded channel. Delivery never blocks the writer:
//! an observer whose channel is full is dropped, so every observer that
//! stays connected has seen every message in order.

use std::collections::BTreeMap;
use std::sync::Arc;

use dr_core_types::ObserverId;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::protocol::ServerMessage;

pub type MessageSender = mpsc::Sender<Arc<ServerMessage>>;
pub type MessageReceiver = mpsc::Receiver<Arc<ServerMessage>>;

#[derive(Debug)]
struct ObserverEntry {
    label: Option<String>,
    sender: MessageSender,
}

/// Registry of observers, owned by the writer
#[derive(Debug, Default)]
pub struct ObserverRegistry {
    observers: BTreeMap<ObserverId, ObserverEntry>,
    next_id: u64,
}

impl ObserverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate an id for a new observer
    pub fn register(&mut self, label: Option<String>, sender: MessageSender) -> ObserverId {
        self.next_id += 1;
        let id = ObserverId(self.next_id);
        self.observers.insert(id, ObserverEntry { label, sender });
        tracing::debug!(observer_id = %id, observers = self.observers.len(), "observer registered");
        id
    }

    /// Returns false when the observer was not connected
    pub fn unregister(&mut self, id: ObserverId) -> bool {
        let removed = self.observers.remove(&id).is_some();
        if removed {
            tracing::debug!(observer_id = %id, observers = self.observers.len(), "observer unregistered");
        }
        removed
    }

    pub fn contains(&self, id: ObserverId) -> bool {
        self.observers.contains_key(&id)
    }

    pub fn label(&self, id: ObserverId) -> Option<&str> {
        self.observers.get(&id).and_then(|o| o.label.as_deref())
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    /// Deliver to one observer; drops it if it cannot keep up.
    ///
    /// Returns false when the observer is gone after the call.
    pub fn send_to(&mut self, id: ObserverId, message: Arc<ServerMessage>) -> bool {
        let Some(entry) = self.observers.get(&id) else {
            return false;
        };
        match entry.sender.try_send(message) {
            Ok(()) => true,
            Err(err) => {
                self.drop_observer(id, &err);
                false
            }
        }
    }

    /// Deliver to every observer except `except`; returns the number reached
    pub fn broadcast(&mut self, message: Arc<ServerMessage>, except: Option<ObserverId>) -> usize {
        let mut failed = Vec::new();
        let mut delivered = 0;
        for (id, entry) in &self.observers {
            if Some(*id) == except {
                continue;
            }
            match entry.sender.try_send(message.clone()) {
                Ok(()) => delivered += 1,
                Err(err) => failed.push((*id, err)),
            }
        }
        for (id, err) in failed {
            self.drop_observer(id, &err);
        }
        delivered
    }

    fn drop_observer<T>(&mut self, id: ObserverId, err: &TrySendError<T>) {
        self.observers.remove(&id);
        match err {
            TrySendError::Full(_) => {
                tracing::warn!(observer_id = %id, "observer channel full, disconnecting");
            }
            TrySendError::Closed(_) => {
                tracing::debug!(observer_id = %id, "observer channel closed");
            }
        }
    }
}
