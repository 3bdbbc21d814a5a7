//! Online-status observer registry.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use dashmap::DashMap;

/// Callback invoked with the new `is_online` value on every transition.
pub type StatusCallback = Arc<dyn Fn(bool) + Send + Sync>;

/// Token returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Clone, Default)]
pub struct SubscriberRegistry {
    next_id: Arc<AtomicU64>,
    callbacks: Arc<DashMap<u64, StatusCallback>>,
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.callbacks.insert(id, Arc::new(callback));
        SubscriptionId(id)
    }

    /// Returns false if the subscription was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.callbacks.remove(&id.0).is_some()
    }

    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }

    pub fn clear(&self) {
        self.callbacks.clear();
    }

    /// Invoke every callback with `online`.
    pub fn notify(&self, online: bool) {
        // Snapshot first so callbacks may (un)subscribe without deadlocking a shard.
        let callbacks: Vec<StatusCallback> = self.callbacks.iter().map(|r| r.value().clone()).collect();
        for callback in callbacks {
            callback(online);
        }
    }
}

impl std::fmt::Debug for SubscriberRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriberRegistry")
            .field("subscribers", &self.callbacks.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_subscribe_notify_unsubscribe() {
        let registry = SubscriberRegistry::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let s = seen.clone();
        let id = registry.subscribe(move |online| s.lock().unwrap().push(online));
        assert_eq!(registry.len(), 1);

        registry.notify(false);
        registry.notify(true);
        assert_eq!(*seen.lock().unwrap(), vec![false, true]);

        assert!(registry.unsubscribe(id));
        assert!(!registry.unsubscribe(id));
        registry.notify(false);
        assert_eq!(seen.lock().unwrap().len(), 2);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_callback_may_unsubscribe_itself() {
        let registry = SubscriberRegistry::new();
        let slot: Arc<Mutex<Option<SubscriptionId>>> = Arc::new(Mutex::new(None));

        let r = registry.clone();
        let s = slot.clone();
        let id = registry.subscribe(move |_| {
            if let Some(id) = *s.lock().unwrap() {
                r.unsubscribe(id);
            }
        });
        *slot.lock().unwrap() = Some(id);

        registry.notify(true);
        assert!(registry.is_empty());
    }
}
