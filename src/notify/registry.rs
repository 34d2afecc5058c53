// SPDX-License-Identifier: GPL-3.0-only
//! Subscriber registry for brightness change notifications
//!
//! Callbacks are kept in registration order. [`SubscriberRegistry::emit`]
//! takes a snapshot of the list and releases the lock before calling out, so
//! a callback may subscribe or unsubscribe (itself included) while a
//! notification is being delivered on another thread or on its own.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};

use crate::protocols::LevelCallback;

/// Identifies one registered callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

#[derive(Default)]
pub struct SubscriberRegistry {
    next_id: AtomicU64,
    subscribers: RwLock<Vec<(SubscriberId, LevelCallback)>>,
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, callback: LevelCallback) -> SubscriberId {
        let id = SubscriberId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, callback));
        id
    }

    /// Returns `false` if `id` was not registered
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        let mut subscribers = self
            .subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let len_before = subscribers.len();
        subscribers.retain(|(existing, _)| *existing != id);
        subscribers.len() != len_before
    }

    pub fn len(&self) -> usize {
        self.subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deliver `level` to every subscriber registered at the time of the call
    pub fn emit(&self, level: i32) {
        let snapshot: Vec<LevelCallback> = self
            .subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, callback)| callback.clone())
            .collect();

        trace!("Relaying brightness {} to {} subscriber(s)", level, snapshot.len());
        for callback in snapshot {
            callback(level);
        }
    }
}

impl std::fmt::Debug for SubscriberRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SubscriberRegistry(subscribers: {})", self.len())
    }
}
