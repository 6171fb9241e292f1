//! Collects a page's streamed component records into an ordered list.

use std::collections::HashSet;

use futures::future::join_all;
use indexmap::IndexMap;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::config::AggregationConfig;
use crate::loader::PageHandle;
use crate::logging::{debug, trace, warn};
use crate::model::{Component, ComponentId, Delivery, fields};
use crate::namespace::standalone_component;
use crate::store::GraphStore;

use super::{Aggregation, collect};

/// Deduplicating reducer over component deliveries.
///
/// Entries are keyed by component id. A later live delivery replaces the
/// earlier one but keeps its position; a tombstone removes the entry and
/// excludes the id for the rest of the run.
#[derive(Debug, Clone, Default)]
pub struct ComponentSet {
    live: IndexMap<ComponentId, Component>,
    tombstoned: HashSet<ComponentId>,
}

impl ComponentSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one delivery. Returns whether the set changed.
    pub fn offer(&mut self, key: &str, value: &Value) -> bool {
        let id = ComponentId::from(key);
        if self.tombstoned.contains(&id) {
            return false;
        }

        match Component::classify(key, value) {
            Delivery::Live(component) => {
                if self.live.get(&id) == Some(&component) {
                    return false;
                }
                self.live.insert(id, component);
                true
            }
            Delivery::Tombstone => {
                trace!(component_id = %id, "component tombstoned");
                self.live.shift_remove(&id);
                self.tombstoned.insert(id);
                true
            }
            Delivery::Malformed => {
                trace!(component_id = %id, "ignoring malformed component");
                false
            }
        }
    }

    /// Exclude `id` as if a tombstone had been delivered for it.
    pub fn exclude(&mut self, id: &ComponentId) {
        self.live.shift_remove(id);
        self.tombstoned.insert(id.clone());
    }

    pub fn get(&self, id: &ComponentId) -> Option<&Component> {
        self.live.get(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &ComponentId> {
        self.live.keys()
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    pub fn is_tombstoned(&self, id: &ComponentId) -> bool {
        self.tombstoned.contains(id)
    }

    /// Live components, stable-sorted by `order`.
    pub fn into_sorted(self) -> Vec<Component> {
        let mut components: Vec<Component> = self.live.into_values().collect();
        components.sort_by_key(|component| component.order);
        components
    }
}

/// Collect the live components of the page behind `handle`.
///
/// Commits per the configured completion policy, then drops components
/// whose standalone node carries a tombstone and sorts by `order`. Store
/// errors degrade to an empty or partial list.
pub async fn aggregate_components(
    store: &dyn GraphStore,
    handle: &PageHandle,
    config: &AggregationConfig,
    cancel: &CancellationToken,
) -> Aggregation<Vec<Component>> {
    let path = handle.components_path();
    let subscription = match store.map(&path).await {
        Ok(subscription) => vec![((), subscription)],
        Err(err) => {
            warn!(path = %path, error = %err, "component subscription failed");
            Vec::new()
        }
    };

    let mut set = ComponentSet::new();
    let Some(reason) = collect(subscription, config, cancel, |_, key, value| {
        set.offer(&key, &value)
    })
    .await
    else {
        debug!(page_id = %handle.page_id, "component aggregation cancelled");
        return Aggregation::Cancelled;
    };

    tokio::select! {
        biased;
        _ = cancel.cancelled() => return Aggregation::Cancelled,
        _ = drop_standalone_tombstones(store, &mut set, config) => {}
    }

    let value = set.into_sorted();
    debug!(page_id = %handle.page_id, components = value.len(), ?reason, "components committed");
    Aggregation::Committed { value, reason }
}

/// Read every accepted component's standalone node and exclude the ones
/// that are tombstoned. Components that cannot be confirmed in time are kept.
async fn drop_standalone_tombstones(
    store: &dyn GraphStore,
    set: &mut ComponentSet,
    config: &AggregationConfig,
) {
    if set.is_empty() {
        return;
    }

    let ids: Vec<ComponentId> = set.ids().cloned().collect();
    let reads = ids.iter().map(|id| async move {
        let path = standalone_component(id);
        let deleted = match store.once(&path).await {
            Ok(Some(Value::Object(fields))) => fields::deleted(&fields),
            Ok(_) => false,
            Err(err) => {
                warn!(path = %path, error = %err, "standalone component read failed");
                false
            }
        };
        (id, deleted)
    });

    match tokio::time::timeout(config.standalone_timeout(), join_all(reads)).await {
        Ok(results) => {
            for (id, deleted) in results {
                if deleted {
                    trace!(component_id = %id, "standalone node tombstoned");
                    set.exclude(id);
                }
            }
        }
        Err(_) => warn!(
            components = ids.len(),
            "standalone tombstone check timed out, keeping unconfirmed components"
        ),
    }
}
