//! Enumerates every live page across the namespaces.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::config::AggregationConfig;
use crate::logging::{debug, trace, warn};
use crate::model::{PageId, PageRecord, PageSummary};
use crate::namespace::{Namespace, NamespaceSet};
use crate::store::GraphStore;

use super::{Aggregation, collect};

#[derive(Debug, Clone)]
enum Slot {
    Live(PageSummary),
    Tombstoned,
}

/// Per-namespace state for one page id.
#[derive(Debug, Clone, Default)]
struct Candidates {
    slots: Vec<(Namespace, Slot)>,
}

impl Candidates {
    fn slot(&self, namespace: Namespace) -> Option<&Slot> {
        self.slots
            .iter()
            .find(|(ns, _)| *ns == namespace)
            .map(|(_, slot)| slot)
    }

    fn set(&mut self, namespace: Namespace, slot: Slot) {
        match self.slots.iter_mut().find(|(ns, _)| *ns == namespace) {
            Some((_, existing)) => *existing = slot,
            None => self.slots.push((namespace, slot)),
        }
    }

    /// Live summary from the highest-precedence namespace.
    fn winner(&self, namespaces: &NamespaceSet) -> Option<(Namespace, &PageSummary)> {
        self.slots
            .iter()
            .filter_map(|(ns, slot)| match slot {
                Slot::Live(summary) => Some((*ns, summary)),
                Slot::Tombstoned => None,
            })
            .fold(None, |best, (ns, summary)| match best {
                Some((best_ns, _)) if !namespaces.may_replace(best_ns, ns) => best,
                _ => Some((ns, summary)),
            })
    }
}

/// Deduplicating reducer over page deliveries from several namespaces.
///
/// Each namespace keeps its own last delivery per id; the visible entry is
/// the live one from the highest-precedence namespace. A tombstone removes
/// only its own namespace's entry and sticks for the rest of the run.
#[derive(Debug, Clone)]
pub struct PageIndexSet {
    namespaces: NamespaceSet,
    pages: IndexMap<PageId, Candidates>,
}

impl PageIndexSet {
    pub fn new(namespaces: NamespaceSet) -> Self {
        Self {
            namespaces,
            pages: IndexMap::new(),
        }
    }

    /// Apply one delivery from `namespace`. Returns whether the visible
    /// index changed.
    pub fn offer(&mut self, namespace: Namespace, key: &str, value: &Value) -> bool {
        if key.is_empty() || !self.namespaces.contains(namespace) {
            return false;
        }
        let Some(record) = PageRecord::from_value(value) else {
            trace!(page_id = key, namespace = %namespace, "ignoring malformed page record");
            return false;
        };

        let id = PageId::from(key);
        let candidates = self.pages.entry(id.clone()).or_default();
        if matches!(candidates.slot(namespace), Some(Slot::Tombstoned)) {
            return false;
        }

        let slot = if record.deleted {
            trace!(page_id = key, namespace = %namespace, "page tombstoned");
            Slot::Tombstoned
        } else if record.is_live() {
            let summary = PageSummary::new(id, record);
            if let Some(Slot::Live(existing)) = candidates.slot(namespace) {
                if *existing == summary {
                    return false;
                }
            }
            Slot::Live(summary)
        } else {
            trace!(page_id = key, namespace = %namespace, "ignoring untitled page");
            return false;
        };

        let before = candidates
            .winner(&self.namespaces)
            .map(|(ns, summary)| (ns, summary.clone()));
        candidates.set(namespace, slot);
        let after = candidates.winner(&self.namespaces);
        before.as_ref().map(|(ns, summary)| (*ns, summary)) != after
    }

    /// Visible entry for `id` and the namespace it came from.
    pub fn get(&self, id: &PageId) -> Option<(Namespace, &PageSummary)> {
        self.pages.get(id)?.winner(&self.namespaces)
    }

    /// Number of visible pages.
    pub fn len(&self) -> usize {
        self.pages
            .values()
            .filter(|candidates| candidates.winner(&self.namespaces).is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Commit the visible entries, newest `createdAt` first.
    pub fn into_index(self) -> PageIndex {
        let namespaces = self.namespaces;
        let mut pages: Vec<PageSummary> = self
            .pages
            .values()
            .filter_map(|candidates| candidates.winner(&namespaces))
            .map(|(_, summary)| summary.clone())
            .collect();
        pages.sort_by_key(|page| std::cmp::Reverse(page.created_at.unwrap_or(0)));
        PageIndex::from_sorted(pages)
    }
}

/// Committed list of live pages, newest first.
///
/// Navigation helpers live in [`crate::navigation`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PageIndex {
    pages: Vec<PageSummary>,
}

impl PageIndex {
    /// Wrap a list that is already in index order.
    pub fn from_sorted(pages: Vec<PageSummary>) -> Self {
        Self { pages }
    }

    pub fn pages(&self) -> &[PageSummary] {
        &self.pages
    }

    pub fn into_pages(self) -> Vec<PageSummary> {
        self.pages
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn get(&self, id: &PageId) -> Option<&PageSummary> {
        self.pages.iter().find(|page| page.id == *id)
    }

    /// The author's pages, most recently updated first.
    pub fn by_author(&self, author: &str) -> Vec<PageSummary> {
        let mut pages: Vec<PageSummary> = self
            .pages
            .iter()
            .filter(|page| page.author == author)
            .cloned()
            .collect();
        pages.sort_by_key(|page| std::cmp::Reverse(page.updated_at.unwrap_or(0)));
        pages
    }
}

/// Subscribe to every namespace's page collection and collect the index.
pub async fn aggregate_index(
    store: &dyn GraphStore,
    namespaces: &NamespaceSet,
    config: &AggregationConfig,
    cancel: &CancellationToken,
) -> Aggregation<PageIndex> {
    let mut subscriptions = Vec::new();
    for namespace in namespaces.iter() {
        let path = namespace.pages();
        match store.map(&path).await {
            Ok(subscription) => subscriptions.push((namespace, subscription)),
            Err(err) => warn!(path = %path, error = %err, "page subscription failed"),
        }
    }

    let mut set = PageIndexSet::new(namespaces.clone());
    let Some(reason) = collect(subscriptions, config, cancel, |namespace, key, value| {
        set.offer(namespace, &key, &value)
    })
    .await
    else {
        debug!("page index aggregation cancelled");
        return Aggregation::Cancelled;
    };

    let value = set.into_index();
    debug!(pages = value.len(), ?reason, "page index committed");
    Aggregation::Committed { value, reason }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::CommitReason;
    use crate::store::MemoryStore;
    use serde_json::json;

    fn page(title: &str, created: i64) -> Value {
        json!({"title": title, "author": "pub_a", "createdAt": created, "updatedAt": created})
    }

    fn titles(index: &PageIndex) -> Vec<&str> {
        index.pages().iter().map(|p| p.title.as_str()).collect()
    }

    #[test]
    fn test_current_wins_in_either_arrival_order() {
        for current_first in [true, false] {
            let mut set = PageIndexSet::new(NamespaceSet::migrating());
            let deliveries = [
                (Namespace::Current, page("Current", 1)),
                (Namespace::Legacy, page("Legacy", 1)),
            ];
            let ordered: Vec<_> = if current_first {
                deliveries.iter().collect()
            } else {
                deliveries.iter().rev().collect()
            };
            for (namespace, value) in ordered {
                set.offer(*namespace, "page_1", value);
            }

            let entry = set.get(&PageId::from("page_1"));
            assert_eq!(entry.map(|(ns, _)| ns), Some(Namespace::Current));
            assert_eq!(set.len(), 1);
        }
    }

    #[test]
    fn test_legacy_update_does_not_change_visible_entry() {
        let mut set = PageIndexSet::new(NamespaceSet::migrating());
        assert!(set.offer(Namespace::Current, "page_1", &page("Current", 1)));
        assert!(!set.offer(Namespace::Legacy, "page_1", &page("Legacy", 1)));
    }

    #[test]
    fn test_tombstone_removes_only_its_namespace() {
        let mut set = PageIndexSet::new(NamespaceSet::migrating());
        set.offer(Namespace::Legacy, "page_1", &page("Legacy", 1));
        set.offer(Namespace::Current, "page_1", &page("Current", 1));
        assert!(set.offer(
            Namespace::Current,
            "page_1",
            &json!({"title": "Current", "deleted": true})
        ));
        assert_eq!(
            set.get(&PageId::from("page_1")).map(|(ns, _)| ns),
            Some(Namespace::Legacy)
        );

        // Sticky for the rest of the run.
        assert!(!set.offer(Namespace::Current, "page_1", &page("Current", 1)));
        assert!(set.offer(Namespace::Legacy, "page_1", &json!({"deleted": "yes"})));
        assert!(set.is_empty());
    }

    #[test]
    fn test_untitled_and_malformed_ignored() {
        let mut set = PageIndexSet::new(NamespaceSet::migrating());
        assert!(!set.offer(Namespace::Current, "page_1", &json!({"title": ""})));
        assert!(!set.offer(Namespace::Current, "page_2", &json!("page_2")));
        assert!(!set.offer(Namespace::Current, "", &page("Empty key", 1)));
        assert!(set.is_empty());
    }

    #[test]
    fn test_legacy_ignored_when_not_consulted() {
        let mut set = PageIndexSet::new(NamespaceSet::current_only());
        assert!(!set.offer(Namespace::Legacy, "page_1", &page("Legacy", 1)));
        assert!(set.is_empty());
    }

    #[test]
    fn test_index_sorted_by_created_desc() {
        let mut set = PageIndexSet::new(NamespaceSet::migrating());
        set.offer(Namespace::Current, "a", &page("Old", 10));
        set.offer(Namespace::Legacy, "b", &json!({"title": "Undated"}));
        set.offer(Namespace::Current, "c", &page("New", 30));
        set.offer(Namespace::Legacy, "d", &page("Mid", 20));
        let index = set.into_index();
        assert_eq!(titles(&index), vec!["New", "Mid", "Old", "Undated"]);
    }

    #[test]
    fn test_by_author_sorted_by_updated_desc() {
        let index = PageIndex::from_sorted(vec![
            PageSummary::new(
                PageId::from("a"),
                PageRecord {
                    title: "A".to_string(),
                    author: "alice".to_string(),
                    slug: None,
                    created_at: Some(3),
                    updated_at: Some(5),
                    deleted: false,
                    deleted_at: None,
                },
            ),
            PageSummary::new(
                PageId::from("b"),
                PageRecord {
                    title: "B".to_string(),
                    author: "bob".to_string(),
                    slug: None,
                    created_at: Some(2),
                    updated_at: Some(9),
                    deleted: false,
                    deleted_at: None,
                },
            ),
            PageSummary::new(
                PageId::from("c"),
                PageRecord {
                    title: "C".to_string(),
                    author: "alice".to_string(),
                    slug: None,
                    created_at: Some(1),
                    updated_at: Some(8),
                    deleted: false,
                    deleted_at: None,
                },
            ),
        ]);
        let mine: Vec<String> = index
            .by_author("alice")
            .into_iter()
            .map(|p| p.title)
            .collect();
        assert_eq!(mine, vec!["C", "A"]);
    }

    #[tokio::test]
    async fn test_aggregates_both_namespaces() -> anyhow::Result<()> {
        let store = MemoryStore::new();
        let id = PageId::from("page_1");
        store.put(&Namespace::Legacy.page(&id), page("Legacy", 1)).await?;
        store.put(&Namespace::Current.page(&id), page("Current", 1)).await?;
        store
            .put(&Namespace::Legacy.page(&PageId::from("page_2")), page("Only legacy", 2))
            .await?;

        let outcome = aggregate_index(
            &store,
            &NamespaceSet::migrating(),
            &AggregationConfig::default(),
            &CancellationToken::new(),
        )
        .await;
        let Aggregation::Committed { value, reason } = outcome else {
            anyhow::bail!("index should commit");
        };
        assert_eq!(reason, CommitReason::Synced);
        assert_eq!(titles(&value), vec!["Only legacy", "Current"]);
        Ok(())
    }
}
