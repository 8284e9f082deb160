//! Synchronous topic-keyed publish/subscribe
//!
//! Listeners run on the publisher's thread, in subscription order. The
//! listener list for a topic is snapshotted before dispatch, so a listener
//! added or removed during a publish only affects later publishes. A
//! panicking listener is logged and skipped; the rest still run.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, Weak};

use smallvec::SmallVec;
use tracing::error;

use crate::device::Device;
use crate::sync::{read, write};

/// Topic for newly classified devices
pub const DEVICE_DISCOVERED: &str = "device discovered";

/// Payload of every scanner event
#[derive(Debug, Clone)]
pub struct DeviceEvent {
    pub device: Arc<Device>,
}

pub type Listener<P> = Arc<dyn Fn(&P) + Send + Sync>;

struct Topics<P> {
    next_id: AtomicU64,
    listeners: RwLock<HashMap<String, Vec<(u64, Listener<P>)>>>,
}

/// Owned event bus
pub struct EventBus<P> {
    topics: Arc<Topics<P>>,
}

impl<P: 'static> EventBus<P> {
    pub fn new() -> Self {
        Self {
            topics: Arc::new(Topics {
                next_id: AtomicU64::new(0),
                listeners: RwLock::new(HashMap::new()),
            }),
        }
    }

    /// Register `listener` for `topic`
    pub fn subscribe<F>(&self, topic: impl Into<String>, listener: F) -> Subscription
    where
        F: Fn(&P) + Send + Sync + 'static,
    {
        let topic = topic.into();
        let id = self.topics.next_id.fetch_add(1, Ordering::Relaxed);
        write(&self.topics.listeners)
            .entry(topic.clone())
            .or_default()
            .push((id, Arc::new(listener)));

        let topics: Weak<Topics<P>> = Arc::downgrade(&self.topics);
        Subscription {
            topic: topic.clone(),
            cancel: Box::new(move || {
                if let Some(topics) = topics.upgrade() {
                    let mut listeners = write(&topics.listeners);
                    if let Some(entries) = listeners.get_mut(&topic) {
                        entries.retain(|(entry_id, _)| *entry_id != id);
                        if entries.is_empty() {
                            listeners.remove(&topic);
                        }
                    }
                }
            }),
        }
    }

    /// Invoke every listener currently subscribed to `topic`.
    ///
    /// Returns the number of listeners that completed without panicking.
    pub fn publish(&self, topic: &str, payload: &P) -> usize {
        let snapshot: SmallVec<[Listener<P>; 4]> = match read(&self.topics.listeners).get(topic) {
            Some(entries) => entries.iter().map(|(_, l)| Arc::clone(l)).collect(),
            None => return 0,
        };

        let mut delivered = 0;
        for listener in snapshot {
            match catch_unwind(AssertUnwindSafe(|| listener(payload))) {
                Ok(()) => delivered += 1,
                Err(panic) => {
                    let reason = panic
                        .downcast_ref::<&str>()
                        .map(|s| s.to_string())
                        .or_else(|| panic.downcast_ref::<String>().cloned())
                        .unwrap_or_else(|| "unknown panic".to_string());
                    error!("Listener for topic '{}' panicked: {}", topic, reason);
                }
            }
        }
        delivered
    }

    pub fn listener_count(&self, topic: &str) -> usize {
        read(&self.topics.listeners)
            .get(topic)
            .map_or(0, |entries| entries.len())
    }
}

impl<P: 'static> Default for EventBus<P> {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle returned by [`EventBus::subscribe`]
///
/// Dropping the handle keeps the listener registered; call
/// [`Subscription::unsubscribe`] to remove it.
pub struct Subscription {
    topic: String,
    cancel: Box<dyn Fn() + Send + Sync>,
}

impl Subscription {
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Remove the listener. Safe to call more than once.
    pub fn unsubscribe(&self) {
        (self.cancel)();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("topic", &self.topic)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_publish_in_subscription_order() {
        let bus = EventBus::<u32>::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for tag in ["a", "b", "c"] {
            let seen = seen.clone();
            bus.subscribe("topic", move |value: &u32| {
                seen.lock().unwrap().push(format!("{}{}", tag, value))
            });
        }

        assert_eq!(bus.publish("topic", &7), 3);
        assert_eq!(bus.publish("other", &7), 0);
        assert_eq!(*seen.lock().unwrap(), vec!["a7", "b7", "c7"]);
    }

    #[test]
    fn test_unsubscribe_is_idempotent() {
        let bus = EventBus::<u32>::new();
        let count = Arc::new(AtomicU64::new(0));
        let counter = count.clone();
        let subscription = bus.subscribe("topic", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        bus.publish("topic", &1);
        subscription.unsubscribe();
        subscription.unsubscribe();
        bus.publish("topic", &2);

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(bus.listener_count("topic"), 0);
        assert_eq!(subscription.topic(), "topic");
    }

    #[test]
    fn test_panicking_listener_is_isolated() {
        let bus = EventBus::<u32>::new();
        let reached = Arc::new(AtomicU64::new(0));

        bus.subscribe("topic", |_| panic!("listener failure"));
        let r = reached.clone();
        bus.subscribe("topic", move |_| {
            r.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(bus.publish("topic", &0), 1);
        assert_eq!(reached.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_subscribe_during_publish_applies_to_next_publish() {
        let bus = Arc::new(EventBus::<u32>::new());
        let late_calls = Arc::new(AtomicU64::new(0));

        let bus_ref = Arc::downgrade(&bus);
        let late = late_calls.clone();
        bus.subscribe("topic", move |_| {
            if let Some(bus) = bus_ref.upgrade() {
                let late = late.clone();
                bus.subscribe("topic", move |_| {
                    late.fetch_add(1, Ordering::SeqCst);
                });
            }
        });

        assert_eq!(bus.publish("topic", &0), 1);
        assert_eq!(late_calls.load(Ordering::SeqCst), 0);

        bus.publish("topic", &0);
        assert_eq!(late_calls.load(Ordering::SeqCst), 1);
    }
}
