//! Graph store persisted with fjall.

use std::path::Path;

use async_trait::async_trait;
use fjall::{Keyspace, KeyspaceCreateOptions, PersistMode};
use parking_lot::Mutex;
use serde_json::Value;

use crate::logging::{debug, info};

use super::hub::SubscriberHub;
use super::{GraphStore, NodePath, StoreError, Subscription, merge_value};

/// Keyspace holding one JSON document per node.
const NODES_KEYSPACE: &str = "nodes";

/// Graph store backed by a fjall database.
///
/// Node values are stored as JSON under their flattened path. The store is
/// the authoritative local replica, so subscriptions announce
/// [`super::SubscriptionEvent::Synced`] after the snapshot.
pub struct FjallStore {
    db: fjall::Database,
    nodes: Keyspace,
    hub: SubscriberHub,
    write_lock: Mutex<()>,
}

impl FjallStore {
    /// Open (or create) a store at the given path.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let db = fjall::Database::builder(path).open()?;
        let nodes = db.keyspace(NODES_KEYSPACE, KeyspaceCreateOptions::default)?;
        info!(path = %path.display(), "opened graph store");

        Ok(Self {
            db,
            nodes,
            hub: SubscriberHub::default(),
            write_lock: Mutex::new(()),
        })
    }

    fn load(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let Some(bytes) = self.nodes.get(key)? else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_slice(&bytes)?))
    }
}

#[async_trait]
impl GraphStore for FjallStore {
    async fn once(&self, path: &NodePath) -> Result<Option<Value>, StoreError> {
        self.load(&path.storage_key())
    }

    async fn map(&self, path: &NodePath) -> Result<Subscription, StoreError> {
        let _guard = self.write_lock.lock();

        let mut snapshot = Vec::new();
        for kv in self.nodes.prefix(path.children_prefix()) {
            let Ok(key_bytes) = kv.key() else {
                continue;
            };
            let key_str = String::from_utf8_lossy(&key_bytes).into_owned();

            let Some(child) = path.direct_child_key(&key_str) else {
                continue;
            };
            if let Some(value) = self.load(&key_str)? {
                snapshot.push((child, value));
            }
        }

        debug!(path = %path, children = snapshot.len(), "fjall store subscription");
        Ok(self.hub.subscribe(path.clone(), snapshot, true))
    }

    async fn put(&self, path: &NodePath, value: Value) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock();

        let key = path.storage_key();
        let merged = merge_value(self.load(&key)?, value);
        let bytes = serde_json::to_vec(&merged)?;
        self.nodes.insert(key.as_str(), bytes.as_slice())?;
        self.db.persist(PersistMode::SyncAll)?;

        self.hub.publish(path, &merged);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SubscriptionEvent;
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_values_survive_reopen() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let path = NodePath::from_segments(["shogun", "linko", "slugs", "alice"]);

        {
            let store = FjallStore::open(dir.path())?;
            store.put(&path, json!("page_abc123")).await?;
        }

        let store = FjallStore::open(dir.path())?;
        assert_eq!(store.once(&path).await?, Some(json!("page_abc123")));
        Ok(())
    }

    #[tokio::test]
    async fn test_map_lists_direct_children() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let store = FjallStore::open(dir.path())?;
        let pages = NodePath::root("pages");

        store.put(&pages.child("p1"), json!({"title": "One"})).await?;
        store.put(&pages.child("p1"), json!({"createdAt": 5})).await?;
        store
            .put(&pages.child("p1").child("components").child("c1"), json!({"type": "p"}))
            .await?;

        let mut sub = store.map(&pages).await?;
        assert_eq!(
            sub.recv().await,
            Some(SubscriptionEvent::Child {
                key: "p1".to_string(),
                value: json!({"title": "One", "createdAt": 5}),
            })
        );
        assert_eq!(sub.recv().await, Some(SubscriptionEvent::Synced));
        Ok(())
    }
}
