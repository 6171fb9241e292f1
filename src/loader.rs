//! Page id to page metadata, from whichever namespace holds valid data.

use std::time::Duration;

use serde::Serialize;

use crate::logging::{debug, warn};
use crate::model::{PageId, PageRecord};
use crate::namespace::{Namespace, NamespaceSet};
use crate::store::{NodePath, SharedStore};

/// Pins a page to the namespace it was loaded from.
///
/// Component reads and edits of a loaded page go through the same handle so
/// they never straddle namespaces.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct PageHandle {
    pub namespace: Namespace,
    pub page_id: PageId,
}

impl PageHandle {
    pub fn new(namespace: Namespace, page_id: PageId) -> Self {
        Self { namespace, page_id }
    }

    pub fn page_path(&self) -> NodePath {
        self.namespace.page(&self.page_id)
    }

    pub fn components_path(&self) -> NodePath {
        self.namespace.page_components(&self.page_id)
    }

    pub fn component_path(&self, component: &str) -> NodePath {
        self.components_path().child(component)
    }
}

/// A page record accepted by the loader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedPage {
    pub id: PageId,
    pub namespace: Namespace,
    pub record: PageRecord,
    pub handle: PageHandle,
}

/// Loads page records, preferring the highest-precedence namespace.
#[derive(Clone)]
pub struct PageLoader {
    store: SharedStore,
    namespaces: NamespaceSet,
    timeout: Duration,
}

impl PageLoader {
    pub fn new(store: SharedStore, namespaces: NamespaceSet, timeout: Duration) -> Self {
        Self {
            store,
            namespaces,
            timeout,
        }
    }

    /// Load the first live record for `id`, in namespace precedence order.
    ///
    /// Returns `None` when no namespace holds a live record or the lookup
    /// exceeds the load timeout.
    pub async fn load(&self, id: &PageId) -> Option<LoadedPage> {
        match tokio::time::timeout(self.timeout, self.probe(id)).await {
            Ok(found) => found,
            Err(_) => {
                warn!(
                    page_id = %id,
                    timeout_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
                    "page load timed out"
                );
                None
            }
        }
    }

    async fn probe(&self, id: &PageId) -> Option<LoadedPage> {
        for namespace in self.namespaces.iter() {
            let path = namespace.page(id);
            let value = match self.store.once(&path).await {
                Ok(value) => value,
                Err(err) => {
                    warn!(path = %path, error = %err, "page read failed");
                    None
                }
            };

            match value.as_ref().and_then(PageRecord::live_from_value) {
                Some(record) => {
                    debug!(page_id = %id, namespace = %namespace, "page loaded");
                    return Some(LoadedPage {
                        id: id.clone(),
                        namespace,
                        record,
                        handle: PageHandle::new(namespace, id.clone()),
                    });
                }
                None => debug!(page_id = %id, namespace = %namespace, "no live page record"),
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{GraphStore, MemoryStore};
    use serde_json::json;
    use std::sync::Arc;

    fn loader(store: &MemoryStore) -> PageLoader {
        PageLoader::new(
            Arc::new(store.clone()),
            NamespaceSet::migrating(),
            Duration::from_secs(5),
        )
    }

    #[tokio::test]
    async fn test_current_namespace_preferred() -> anyhow::Result<()> {
        let store = MemoryStore::new();
        let id = PageId::from("page_1");
        store
            .put(&Namespace::Legacy.page(&id), json!({"title": "Old", "author": "a"}))
            .await?;
        store
            .put(&Namespace::Current.page(&id), json!({"title": "New", "author": "a"}))
            .await?;

        let page = loader(&store).load(&id).await;
        let page = page.ok_or_else(|| anyhow::anyhow!("page should load"))?;
        assert_eq!(page.namespace, Namespace::Current);
        assert_eq!(page.record.title, "New");
        assert_eq!(
            page.handle.components_path().to_string(),
            "shogun/linko/pages/page_1/components"
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_falls_back_past_tombstone_and_untitled() -> anyhow::Result<()> {
        let store = MemoryStore::new();
        let id = PageId::from("page_2");
        store
            .put(&Namespace::Current.page(&id), json!({"title": "X", "deleted": true}))
            .await?;
        store
            .put(&Namespace::Legacy.page(&id), json!({"title": "Legacy", "author": "a"}))
            .await?;

        let page = loader(&store).load(&id).await;
        assert_eq!(page.map(|p| p.namespace), Some(Namespace::Legacy));

        let untitled = PageId::from("page_3");
        store
            .put(&Namespace::Current.page(&untitled), json!({"title": "", "author": "a"}))
            .await?;
        assert!(loader(&store).load(&untitled).await.is_none());
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_times_out() -> anyhow::Result<()> {
        let store = MemoryStore::new().with_latency(Duration::from_secs(4));
        let id = PageId::from("page_4");
        store
            .put(&Namespace::Legacy.page(&id), json!({"title": "Slow"}))
            .await?;

        let start = tokio::time::Instant::now();
        assert!(loader(&store).load(&id).await.is_none());
        assert!(start.elapsed() >= Duration::from_secs(5));
        Ok(())
    }
}
