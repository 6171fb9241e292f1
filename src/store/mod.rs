//! Graph store abstraction.
//!
//! The reconciliation layer talks to an eventually-consistent graph store
//! through three primitives:
//!
//! - [`GraphStore::once`]: single-shot read of the value at a path.
//! - [`GraphStore::map`]: subscription to every child of a collection node.
//!   Children may be delivered more than once as replicas converge.
//! - [`GraphStore::put`]: merge a value into a node.
//!
//! Two implementations ship with the crate: [`MemoryStore`] and, with the
//! `kv` feature, the fjall-backed [`FjallStore`].

#[cfg(feature = "kv")]
mod disk;
mod error;
mod hub;
mod memory;
mod path;

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use async_trait::async_trait;
use futures::Stream;
use serde_json::Value;
use tokio::sync::mpsc;

#[cfg(feature = "kv")]
pub use disk::FjallStore;
pub use error::StoreError;
pub use memory::MemoryStore;
pub use path::NodePath;

/// Handle to the process-wide store, shared by every reader and writer.
pub type SharedStore = Arc<dyn GraphStore>;

/// An eventually-consistent graph store.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Read the current known value at `path`.
    ///
    /// `Ok(None)` means the store has no value for the path (yet).
    async fn once(&self, path: &NodePath) -> Result<Option<Value>, StoreError>;

    /// Subscribe to the children of the collection at `path`.
    ///
    /// The subscription delivers the currently known children first and
    /// keeps delivering updates until it is dropped.
    async fn map(&self, path: &NodePath) -> Result<Subscription, StoreError>;

    /// Merge `value` into the node at `path`.
    ///
    /// Objects are merged field by field into an existing object; any other
    /// value replaces the node. `Ok(())` is the store's acknowledgement; it
    /// does not imply the write reached any other peer.
    async fn put(&self, path: &NodePath, value: Value) -> Result<(), StoreError>;
}

/// Event delivered by a [`Subscription`].
#[derive(Debug, Clone, PartialEq)]
pub enum SubscriptionEvent {
    /// A child node's current value. The same key may arrive many times.
    Child { key: String, value: Value },
    /// The store has delivered every child it knew of when the
    /// subscription started. Stores without such knowledge never send it.
    Synced,
}

/// Live subscription to a collection node.
///
/// Dropping the subscription unregisters it from the store.
pub struct Subscription {
    events: mpsc::UnboundedReceiver<SubscriptionEvent>,
    on_drop: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// Build a subscription from an event channel and an unsubscribe hook.
    pub fn new(
        events: mpsc::UnboundedReceiver<SubscriptionEvent>,
        on_drop: Option<Box<dyn FnOnce() + Send>>,
    ) -> Self {
        Self { events, on_drop }
    }

    /// Wait for the next event. `None` once the store side has closed.
    pub async fn recv(&mut self) -> Option<SubscriptionEvent> {
        self.events.recv().await
    }
}

impl Stream for Subscription {
    type Item = SubscriptionEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.events.poll_recv(cx)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(unsubscribe) = self.on_drop.take() {
            unsubscribe();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

/// Merge an incoming value into the existing node value.
pub(crate) fn merge_value(existing: Option<Value>, incoming: Value) -> Value {
    match (existing, incoming) {
        (Some(Value::Object(mut current)), Value::Object(fields)) => {
            for (field, value) in fields {
                current.insert(field, value);
            }
            Value::Object(current)
        }
        (_, incoming) => incoming,
    }
}
