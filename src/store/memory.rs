//! In-process graph store.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use crate::logging::trace;

use super::hub::SubscriberHub;
use super::{GraphStore, NodePath, StoreError, Subscription, merge_value};

#[derive(Default)]
struct State {
    nodes: BTreeMap<String, Value>,
    rejected: Vec<NodePath>,
}

/// Graph store held entirely in memory.
///
/// Useful as a local replica and in tests. `with_latency` delays every read
/// and subscription start to mimic a slow relay, and `without_sync_marker`
/// makes subscriptions behave like a gossip peer that never announces
/// completion.
#[derive(Clone)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
    hub: SubscriberHub,
    latency: Duration,
    sync_marker: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State::default())),
            hub: SubscriberHub::default(),
            latency: Duration::ZERO,
            sync_marker: true,
        }
    }

    /// Delay reads and subscription starts by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Never send [`super::SubscriptionEvent::Synced`].
    pub fn without_sync_marker(mut self) -> Self {
        self.sync_marker = false;
        self
    }

    /// Reject every write at or below `prefix`.
    pub fn reject_writes_to(&self, prefix: NodePath) {
        self.state.lock().rejected.push(prefix);
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.hub.len()
    }

    async fn lag(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GraphStore for MemoryStore {
    async fn once(&self, path: &NodePath) -> Result<Option<Value>, StoreError> {
        self.lag().await;
        let state = self.state.lock();
        Ok(state.nodes.get(&path.storage_key()).cloned())
    }

    async fn map(&self, path: &NodePath) -> Result<Subscription, StoreError> {
        self.lag().await;
        let state = self.state.lock();

        let prefix = path.children_prefix();
        let snapshot: Vec<(String, Value)> = state
            .nodes
            .range(prefix.clone()..)
            .take_while(|(key, _)| key.starts_with(&prefix))
            .filter_map(|(key, value)| {
                path.direct_child_key(key)
                    .map(|child| (child, value.clone()))
            })
            .collect();

        trace!(path = %path, children = snapshot.len(), "memory store subscription");
        Ok(self.hub.subscribe(path.clone(), snapshot, self.sync_marker))
    }

    async fn put(&self, path: &NodePath, value: Value) -> Result<(), StoreError> {
        let mut state = self.state.lock();

        if state
            .rejected
            .iter()
            .any(|prefix| path.segments().starts_with(prefix.segments()))
        {
            return Err(StoreError::Rejected {
                path: path.to_string(),
                reason: "writes to this path are rejected".to_string(),
            });
        }

        let key = path.storage_key();
        let merged = merge_value(state.nodes.remove(&key), value);
        state.nodes.insert(key, merged.clone());
        self.hub.publish(path, &merged);
        Ok(())
    }
}
