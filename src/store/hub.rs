//! Subscriber registry shared by the bundled store implementations.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::mpsc;

use super::{NodePath, Subscription, SubscriptionEvent};

struct Subscriber {
    parent: NodePath,
    tx: mpsc::UnboundedSender<SubscriptionEvent>,
}

#[derive(Default)]
struct HubInner {
    next_id: u64,
    subscribers: HashMap<u64, Subscriber>,
}

/// Fans child updates out to the subscriptions of their parent collection.
#[derive(Clone, Default)]
pub(crate) struct SubscriberHub {
    inner: Arc<Mutex<HubInner>>,
}

impl SubscriberHub {
    /// Register a subscription on `parent`, deliver `snapshot` to it, and
    /// optionally follow with [`SubscriptionEvent::Synced`].
    ///
    /// Callers must hold their own write lock while calling this so that no
    /// update can slip in between the snapshot and the registration.
    pub(crate) fn subscribe(
        &self,
        parent: NodePath,
        snapshot: Vec<(String, Value)>,
        synced: bool,
    ) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();

        for (key, value) in snapshot {
            // The receiver is still in scope, so this cannot fail.
            let _ = tx.send(SubscriptionEvent::Child { key, value });
        }
        if synced {
            let _ = tx.send(SubscriptionEvent::Synced);
        }

        let id = {
            let mut inner = self.inner.lock();
            let id = inner.next_id;
            inner.next_id += 1;
            inner.subscribers.insert(id, Subscriber { parent, tx });
            id
        };

        let weak: Weak<Mutex<HubInner>> = Arc::downgrade(&self.inner);
        Subscription::new(
            rx,
            Some(Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.lock().subscribers.remove(&id);
                }
            })),
        )
    }

    /// Deliver the merged value of `path` to subscribers of its parent.
    pub(crate) fn publish(&self, path: &NodePath, value: &Value) {
        let (Some(parent), Some(key)) = (path.parent(), path.key()) else {
            return;
        };

        let mut inner = self.inner.lock();
        inner.subscribers.retain(|_, subscriber| {
            if subscriber.parent != parent {
                return !subscriber.tx.is_closed();
            }
            subscriber
                .tx
                .send(SubscriptionEvent::Child {
                    key: key.to_string(),
                    value: value.clone(),
                })
                .is_ok()
        });
    }

    /// Number of live subscriptions.
    pub(crate) fn len(&self) -> usize {
        self.inner.lock().subscribers.len()
    }
}
