//! One entry point over the resolver, loader, aggregators and writer.

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::aggregate::{Aggregation, PageIndex, aggregate_components, aggregate_index};
use crate::config::ReadConfig;
use crate::error::{Error, Result};
use crate::loader::{LoadedPage, PageHandle, PageLoader};
use crate::logging::debug;
use crate::model::{Component, ComponentId, PageId, PageSummary};
use crate::namespace::Namespace;
use crate::navigation::Navigation;
use crate::resolver::{PathResolver, Resolution};
use crate::store::SharedStore;
use crate::writer::{
    MutationWriter, PageDraft, SaveReport, ShareLinks, SlugCheck, WriteReport,
};

/// A page ready for display: record, links and live components.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageView {
    pub id: PageId,
    pub namespace: Namespace,
    pub title: String,
    pub author: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    pub created_at: Option<i64>,
    pub updated_at: Option<i64>,
    pub links: ShareLinks,
    pub components: Vec<Component>,
}

impl PageView {
    fn new(page: LoadedPage, components: Vec<Component>, base_url: &str) -> Self {
        let record = page.record;
        Self {
            links: ShareLinks::new(base_url, &page.id, record.slug.as_deref()),
            id: page.id,
            namespace: page.namespace,
            title: record.title,
            author: record.author,
            slug: record.slug,
            created_at: record.created_at,
            updated_at: record.updated_at,
            components,
        }
    }
}

/// Shared by every request; cheap to clone.
#[derive(Clone)]
pub struct PageService {
    store: SharedStore,
    config: ReadConfig,
    resolver: PathResolver,
    loader: PageLoader,
    writer: MutationWriter,
}

impl PageService {
    pub fn new(store: SharedStore, config: ReadConfig) -> Self {
        let namespaces = config.namespaces();
        Self {
            resolver: PathResolver::new(
                store.clone(),
                namespaces.clone(),
                config.resolver.clone(),
            ),
            loader: PageLoader::new(store.clone(), namespaces, config.loader.load_timeout()),
            writer: MutationWriter::new(store.clone(), &config),
            store,
            config,
        }
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    pub fn config(&self) -> &ReadConfig {
        &self.config
    }

    pub async fn resolve(&self, slug: &str) -> Resolution {
        self.resolver.resolve(slug).await
    }

    pub async fn load(&self, id: &PageId) -> Option<LoadedPage> {
        self.loader.load(id).await
    }

    /// Live components of a loaded page.
    pub async fn components(
        &self,
        handle: &PageHandle,
        cancel: &CancellationToken,
    ) -> Aggregation<Vec<Component>> {
        aggregate_components(self.store.as_ref(), handle, &self.config.aggregation, cancel).await
    }

    /// Page by id. `None` when it does not exist or `cancel` fires.
    pub async fn view(&self, id: &PageId, cancel: &CancellationToken) -> Option<PageView> {
        let page = self.loader.load(id).await?;
        let components = self.components(&page.handle, cancel).await.into_value()?;
        Some(PageView::new(page, components, &self.config.base_url))
    }

    /// Page by slug, through the resolver.
    pub async fn view_slug(&self, slug: &str, cancel: &CancellationToken) -> Option<PageView> {
        let page_id = match self.resolver.resolve(slug).await {
            Resolution::Found { page_id, .. } => page_id,
            Resolution::NotFound => return None,
        };
        debug!(slug, page_id = %page_id, "viewing page by slug");
        self.view(&page_id, cancel).await
    }

    /// Page as the editor opens it; only its author may edit.
    pub async fn editor(
        &self,
        id: &PageId,
        author: &str,
        cancel: &CancellationToken,
    ) -> Result<PageView> {
        let page = self
            .view(id, cancel)
            .await
            .ok_or_else(|| Error::PageNotFound(id.to_string()))?;
        if !page.author.is_empty() && page.author != author {
            return Err(Error::NotOwner {
                page_id: id.to_string(),
            });
        }
        Ok(page)
    }

    /// Every live page, newest first.
    pub async fn index(&self, cancel: &CancellationToken) -> Aggregation<PageIndex> {
        aggregate_index(
            self.store.as_ref(),
            &self.config.namespaces(),
            &self.config.aggregation,
            cancel,
        )
        .await
    }

    /// The author's pages, most recently updated first.
    pub async fn pages_by_author(
        &self,
        author: &str,
        cancel: &CancellationToken,
    ) -> Option<Vec<PageSummary>> {
        Some(self.index(cancel).await.into_value()?.by_author(author))
    }

    /// Previous, next and random links around `id`.
    pub async fn navigation(&self, id: &PageId, cancel: &CancellationToken) -> Option<Navigation> {
        let index = self.index(cancel).await.into_value()?;
        Some(index.navigation(id, &mut rand::thread_rng()))
    }

    pub async fn save(&self, draft: PageDraft) -> Result<SaveReport> {
        self.writer.save(draft, None).await
    }

    /// Save through a handle obtained from an earlier load.
    pub async fn save_with_handle(
        &self,
        draft: PageDraft,
        handle: &PageHandle,
    ) -> Result<SaveReport> {
        self.writer.save(draft, Some(handle)).await
    }

    pub async fn delete_page(&self, id: &PageId, author: &str) -> Result<WriteReport> {
        self.writer.delete_page(id, author).await
    }

    /// Tombstone one component of a page.
    pub async fn delete_component(
        &self,
        page_id: &PageId,
        component_id: &ComponentId,
        author: &str,
    ) -> Result<WriteReport> {
        let page = self
            .loader
            .load(page_id)
            .await
            .ok_or_else(|| Error::PageNotFound(page_id.to_string()))?;
        if !page.record.author.is_empty() && page.record.author != author {
            return Err(Error::NotOwner {
                page_id: page_id.to_string(),
            });
        }
        Ok(self.writer.delete_component(&page.handle, component_id).await)
    }

    pub async fn check_slug(&self, slug: &str, current: Option<&PageId>) -> SlugCheck {
        self.writer.check_slug(slug, current).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::model::ComponentKind;
    use crate::store::MemoryStore;
    use crate::writer::ComponentDraft;

    fn service() -> PageService {
        PageService::new(Arc::new(MemoryStore::new()), ReadConfig::default())
    }

    fn draft(title: &str, slug: Option<&str>) -> PageDraft {
        PageDraft {
            title: title.to_string(),
            slug: slug.map(str::to_string),
            author: "pub_alice".to_string(),
            components: vec![
                ComponentDraft::new(ComponentKind::Heading).with("content", "Hi"),
                ComponentDraft::new(ComponentKind::Spacer),
                ComponentDraft::new(ComponentKind::Paragraph).with("content", "Bio"),
            ],
            ..PageDraft::default()
        }
    }

    #[tokio::test]
    async fn test_save_then_view_by_slug() -> anyhow::Result<()> {
        let service = service();
        let cancel = CancellationToken::new();
        let saved = service.save(draft("Alice", Some("alice"))).await?;

        let view = service
            .view_slug("alice", &cancel)
            .await
            .ok_or_else(|| anyhow::anyhow!("page should be visible"))?;
        assert_eq!(view.id, saved.page_id);
        assert_eq!(view.links.primary, "/alice");
        let kinds: Vec<ComponentKind> = view.components.iter().map(|c| c.kind).collect();
        assert_eq!(
            kinds,
            vec![ComponentKind::Heading, ComponentKind::Spacer, ComponentKind::Paragraph]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_saving_twice_reads_the_same() -> anyhow::Result<()> {
        let service = service();
        let cancel = CancellationToken::new();
        let saved = service.save(draft("Alice", None)).await?;
        let first = service.view(&saved.page_id, &cancel).await;

        let editor = service.editor(&saved.page_id, "pub_alice", &cancel).await?;
        let again = PageDraft {
            id: Some(saved.page_id.clone()),
            title: editor.title.clone(),
            slug: editor.slug.clone(),
            author: editor.author.clone(),
            components: editor.components.iter().map(ComponentDraft::from).collect(),
            removed: vec![],
        };
        service.save(again).await?;
        let second = service.view(&saved.page_id, &cancel).await;

        let components = |view: &Option<PageView>| view.as_ref().map(|v| v.components.clone());
        assert_eq!(components(&first), components(&second));
        Ok(())
    }

    #[tokio::test]
    async fn test_editor_checks_author() -> anyhow::Result<()> {
        let service = service();
        let cancel = CancellationToken::new();
        let saved = service.save(draft("Alice", None)).await?;
        let result = service.editor(&saved.page_id, "pub_mallory", &cancel).await;
        assert!(matches!(result, Err(Error::NotOwner { .. })));

        let missing = service
            .editor(&PageId::from("page_missing"), "pub_alice", &cancel)
            .await;
        assert!(matches!(missing, Err(Error::PageNotFound(_))));
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_component_hides_it() -> anyhow::Result<()> {
        let service = service();
        let cancel = CancellationToken::new();
        let saved = service.save(draft("Alice", None)).await?;
        let spacer = saved
            .components
            .get(1)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("spacer missing"))?;

        service
            .delete_component(&saved.page_id, &spacer, "pub_alice")
            .await?;
        let view = service.view(&saved.page_id, &cancel).await;
        let ids: Vec<ComponentId> = view
            .map(|v| v.components.into_iter().map(|c| c.id).collect())
            .unwrap_or_default();
        assert_eq!(ids.len(), 2);
        assert!(!ids.contains(&spacer));
        Ok(())
    }

    #[tokio::test]
    async fn test_index_author_listing_and_navigation() -> anyhow::Result<()> {
        let service = service();
        let cancel = CancellationToken::new();
        let first = service.save(draft("First", None)).await?;
        let mut other = draft("Other", Some("other"));
        other.author = "pub_bob".to_string();
        service.save(other).await?;

        let mine = service.pages_by_author("pub_alice", &cancel).await;
        assert_eq!(mine.map(|pages| pages.len()), Some(1));

        let nav = service
            .navigation(&first.page_id, &cancel)
            .await
            .ok_or_else(|| anyhow::anyhow!("navigation should commit"))?;
        assert_eq!(nav.total, 2);
        assert_eq!(nav.random.map(|link| link.url), Some("/other".to_string()));
        Ok(())
    }

    #[tokio::test]
    async fn test_deleted_page_disappears() -> anyhow::Result<()> {
        let service = service();
        let cancel = CancellationToken::new();
        let saved = service.save(draft("Alice", Some("alice"))).await?;
        service.delete_page(&saved.page_id, "pub_alice").await?;

        assert!(service.view(&saved.page_id, &cancel).await.is_none());
        let index = service.index(&cancel).await.into_value().unwrap_or_default();
        assert!(index.is_empty());
        assert!(service.check_slug("alice", None).await.is_available());
        Ok(())
    }
}
