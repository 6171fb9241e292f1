//! Create, update and soft-delete pages, components and slug mappings.
//!
//! The store has no multi-record transactions. Every write here is an
//! idempotent full-value put issued independently; a failed acknowledgement
//! is logged and reported, never retried or rolled back. Readers already
//! tolerate any subset of the writes having landed.

use std::collections::HashSet;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::config::{ReadConfig, SlugRetention, WriterConfig};
use crate::error::{Error, Result, ValidationError};
use crate::loader::{PageHandle, PageLoader};
use crate::logging::{debug, info, warn};
use crate::model::{
    Component, ComponentId, ComponentKind, PageId, PageRecord, now_millis, page_url, tombstone,
};
use crate::namespace::{Namespace, NamespaceSet, standalone_component};
use crate::slug::{self, mapped_page_id};
use crate::store::{NodePath, SharedStore};

/// A component as submitted by the editor.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ComponentDraft {
    /// Kept across edits; generated on first save when absent.
    #[serde(default)]
    pub id: Option<ComponentId>,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl ComponentDraft {
    /// New block of `kind` with its default payload.
    pub fn new(kind: ComponentKind) -> Self {
        Self {
            id: None,
            kind: kind.as_str().to_string(),
            payload: kind.default_payload(),
        }
    }

    /// Set a payload field.
    pub fn with(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.payload.insert(field.to_string(), value.into());
        self
    }

    pub fn with_id(mut self, id: ComponentId) -> Self {
        self.id = Some(id);
        self
    }
}

impl From<&Component> for ComponentDraft {
    fn from(component: &Component) -> Self {
        Self {
            id: Some(component.id.clone()),
            kind: component.kind.as_str().to_string(),
            payload: component.payload.clone(),
        }
    }
}

/// Editor state submitted for saving.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PageDraft {
    /// Existing page to update; a new page is created when absent.
    #[serde(default)]
    pub id: Option<PageId>,
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    pub author: String,
    /// Components in display order.
    #[serde(default)]
    pub components: Vec<ComponentDraft>,
    /// Components removed in this editing session.
    #[serde(default)]
    pub removed: Vec<ComponentId>,
}

/// A write the store did not acknowledge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedWrite {
    pub path: String,
    pub error: String,
}

/// Acknowledged and failed writes of one operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WriteReport {
    pub written: usize,
    pub failed: Vec<FailedWrite>,
}

impl WriteReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Public URLs of a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShareLinks {
    /// Slug URL when the page has a slug, otherwise the id URL.
    pub primary: String,
    pub by_id: String,
}

impl ShareLinks {
    pub fn new(base_url: &str, id: &PageId, slug: Option<&str>) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            primary: format!("{}{}", base, page_url(id, slug)),
            by_id: format!("{}{}", base, page_url(id, None)),
        }
    }
}

/// Result of [`MutationWriter::save`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaveReport {
    pub page_id: PageId,
    pub namespace: Namespace,
    pub created: bool,
    /// Ids of the saved components, in display order.
    pub components: Vec<ComponentId>,
    pub written: usize,
    pub failed: Vec<FailedWrite>,
    pub links: ShareLinks,
}

/// Answer of a slug availability check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SlugStatus {
    Available,
    Empty,
    Reserved,
    Taken { page_id: PageId },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlugCheck {
    /// The normalised slug the status applies to.
    pub slug: String,
    #[serde(flatten)]
    pub status: SlugStatus,
}

impl SlugCheck {
    pub fn is_available(&self) -> bool {
        self.status == SlugStatus::Available
    }
}

/// A validated draft, ready to be written.
struct Prepared {
    title: String,
    slug: Option<String>,
    components: Vec<Component>,
    removed: Vec<ComponentId>,
}

#[derive(Clone)]
pub struct MutationWriter {
    store: SharedStore,
    namespaces: NamespaceSet,
    loader: PageLoader,
    config: WriterConfig,
    base_url: String,
}

impl MutationWriter {
    pub fn new(store: SharedStore, config: &ReadConfig) -> Self {
        let namespaces = config.namespaces();
        Self {
            loader: PageLoader::new(
                store.clone(),
                namespaces.clone(),
                config.loader.load_timeout(),
            ),
            store,
            namespaces,
            config: config.writer.clone(),
            base_url: config.base_url.clone(),
        }
    }

    /// Save a page and its components.
    ///
    /// `handle` pins the namespace of a page that was loaded for editing;
    /// without it the page is looked up by `draft.id`, and a page that does
    /// not exist yet is created in the primary namespace.
    pub async fn save(&self, draft: PageDraft, handle: Option<&PageHandle>) -> Result<SaveReport> {
        let prepared = prepare(&draft)?;

        let (handle, existing) = self.target(&draft, handle).await?;
        if let Some(record) = &existing {
            if !record.author.is_empty() && record.author != draft.author {
                return Err(Error::NotOwner {
                    page_id: handle.page_id.to_string(),
                });
            }
        }

        if let Some(slug) = &prepared.slug {
            if let Some(owner) = self.slug_owner(slug, Some(&handle.page_id)).await {
                return Err(ValidationError::SlugTaken {
                    slug: slug.clone(),
                    page_id: owner.to_string(),
                }
                .into());
            }
        }

        let created = existing.is_none();
        let now = now_millis();
        let mut report = WriteReport::default();

        if let Some(slug) = &prepared.slug {
            self.put(
                &mut report,
                handle.namespace.slug(slug),
                json!(handle.page_id.as_str()),
            )
            .await;
        }
        let previous_slug = existing
            .as_ref()
            .and_then(|record| record.slug.clone())
            .filter(|old| Some(old) != prepared.slug.as_ref());
        if let (Some(previous), SlugRetention::Release) =
            (previous_slug, self.config.slug_retention)
        {
            self.release_slug(&mut report, handle.namespace, &previous, &handle.page_id)
                .await;
        }

        let mut record = json!({
            "title": prepared.title,
            "author": draft.author,
            "updatedAt": now,
            "slug": prepared.slug.clone().unwrap_or_default(),
            "deleted": false,
            "deletedAt": null,
        });
        if created {
            if let Some(fields) = record.as_object_mut() {
                fields.insert("createdAt".to_string(), json!(now));
            }
        }
        self.put(&mut report, handle.page_path(), record).await;

        for component in &prepared.components {
            let value = component.to_record();
            self.put(&mut report, standalone_component(&component.id), value.clone())
                .await;
            self.put(&mut report, handle.component_path(component.id.as_str()), value)
                .await;
        }
        for id in &prepared.removed {
            self.tombstone_component(&mut report, &handle, id, now).await;
        }

        info!(
            page_id = %handle.page_id,
            namespace = %handle.namespace,
            created,
            written = report.written,
            failed = report.failed.len(),
            "page saved"
        );

        Ok(SaveReport {
            links: ShareLinks::new(&self.base_url, &handle.page_id, prepared.slug.as_deref()),
            page_id: handle.page_id,
            namespace: handle.namespace,
            created,
            components: prepared.components.into_iter().map(|c| c.id).collect(),
            written: report.written,
            failed: report.failed,
        })
    }

    /// Tombstone a component in both places it is stored.
    pub async fn delete_component(&self, handle: &PageHandle, id: &ComponentId) -> WriteReport {
        let mut report = WriteReport::default();
        self.tombstone_component(&mut report, handle, id, now_millis())
            .await;
        debug!(page_id = %handle.page_id, component_id = %id, "component deleted");
        report
    }

    /// Tombstone a page in every namespace where it is live.
    ///
    /// The slug mapping is released or kept according to the configured
    /// [`SlugRetention`]. A release clears mappings to this page in every
    /// namespace, not only the ones holding a live record.
    pub async fn delete_page(&self, id: &PageId, author: &str) -> Result<WriteReport> {
        let mut live = Vec::new();
        for namespace in self.namespaces.iter() {
            let path = namespace.page(id);
            let value = match self.store.once(&path).await {
                Ok(value) => value,
                Err(err) => {
                    warn!(path = %path, error = %err, "page read failed");
                    None
                }
            };
            if let Some(record) = value.as_ref().and_then(PageRecord::live_from_value) {
                if !record.author.is_empty() && record.author != author {
                    return Err(Error::NotOwner {
                        page_id: id.to_string(),
                    });
                }
                live.push((namespace, record));
            }
        }
        if live.is_empty() {
            return Err(Error::PageNotFound(id.to_string()));
        }

        let now = now_millis();
        let mut report = WriteReport::default();
        for (namespace, _) in &live {
            self.put(
                &mut report,
                namespace.page(id),
                json!({"deleted": true, "deletedAt": now}),
            )
            .await;
        }

        if self.config.slug_retention == SlugRetention::Release {
            let mut slugs: Vec<&str> = live
                .iter()
                .filter_map(|(_, record)| record.slug.as_deref())
                .collect();
            slugs.dedup();
            for namespace in self.namespaces.iter() {
                for slug in &slugs {
                    self.release_slug(&mut report, namespace, slug, id).await;
                }
            }
        }

        info!(page_id = %id, namespaces = live.len(), written = report.written, "page deleted");
        Ok(report)
    }

    /// Normalise `raw` and report whether it could be used by `current`.
    ///
    /// Mappings that do not answer within the availability timeout count
    /// as free. The answer is advisory: nothing stops a concurrent writer
    /// from claiming the slug before this caller saves.
    pub async fn check_slug(&self, raw: &str, current: Option<&PageId>) -> SlugCheck {
        let normalised = slug::slugify(raw);
        let status = if normalised.is_empty() {
            SlugStatus::Empty
        } else if slug::is_reserved(&normalised) {
            SlugStatus::Reserved
        } else {
            match self.slug_owner(&normalised, current).await {
                Some(page_id) => SlugStatus::Taken { page_id },
                None => SlugStatus::Available,
            }
        };
        SlugCheck {
            slug: normalised,
            status,
        }
    }

    /// Existing page namespace and record for the draft's target.
    async fn target(
        &self,
        draft: &PageDraft,
        handle: Option<&PageHandle>,
    ) -> Result<(PageHandle, Option<PageRecord>)> {
        if let Some(handle) = handle {
            let existing = self
                .store
                .once(&handle.page_path())
                .await?
                .as_ref()
                .and_then(PageRecord::live_from_value);
            return Ok((handle.clone(), existing));
        }

        match &draft.id {
            Some(id) => match self.loader.load(id).await {
                Some(page) => Ok((page.handle, Some(page.record))),
                None => Ok((PageHandle::new(self.namespaces.primary(), id.clone()), None)),
            },
            None => Ok((
                PageHandle::new(self.namespaces.primary(), PageId::generate()),
                None,
            )),
        }
    }

    /// Page that currently holds `slug`, when it is not `current`.
    async fn slug_owner(&self, slug: &str, current: Option<&PageId>) -> Option<PageId> {
        let timeout = self.config.availability_timeout();
        let reads = self.namespaces.iter().map(|namespace| async move {
            let path = namespace.slug(slug);
            match tokio::time::timeout(timeout, self.store.once(&path)).await {
                Ok(Ok(value)) => mapped_page_id(value.as_ref()).map(PageId::from),
                Ok(Err(err)) => {
                    warn!(path = %path, error = %err, "slug availability read failed");
                    None
                }
                Err(_) => {
                    debug!(slug, namespace = %namespace, "slug availability check timed out");
                    None
                }
            }
        });

        join_all(reads)
            .await
            .into_iter()
            .flatten()
            .find(|owner| Some(owner) != current)
    }

    /// Clear `slug` in `namespace` if it still maps to `page_id`.
    async fn release_slug(
        &self,
        report: &mut WriteReport,
        namespace: Namespace,
        slug: &str,
        page_id: &PageId,
    ) {
        let path = namespace.slug(slug);
        let mapped = match self.store.once(&path).await {
            Ok(value) => value,
            Err(err) => {
                warn!(path = %path, error = %err, "slug read failed, keeping mapping");
                return;
            }
        };
        if mapped_page_id(mapped.as_ref()) == Some(page_id.as_str()) {
            self.put(report, path, Value::Null).await;
        }
    }

    async fn tombstone_component(
        &self,
        report: &mut WriteReport,
        handle: &PageHandle,
        id: &ComponentId,
        deleted_at: i64,
    ) {
        self.put(report, standalone_component(id), tombstone(deleted_at))
            .await;
        self.put(report, handle.component_path(id.as_str()), tombstone(deleted_at))
            .await;
    }

    async fn put(&self, report: &mut WriteReport, path: NodePath, value: Value) {
        match self.store.put(&path, value).await {
            Ok(()) => report.written += 1,
            Err(err) => {
                warn!(path = %path, error = %err, "write not acknowledged");
                report.failed.push(FailedWrite {
                    path: path.to_string(),
                    error: err.to_string(),
                });
            }
        }
    }
}

/// Validate a draft and renumber its components densely.
fn prepare(draft: &PageDraft) -> std::result::Result<Prepared, ValidationError> {
    let title = draft.title.trim();
    if title.is_empty() {
        return Err(ValidationError::EmptyTitle);
    }

    let slug = match draft.slug.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(slug) if slug::is_reserved(slug) => {
            return Err(ValidationError::ReservedSlug(slug.to_string()));
        }
        Some(slug) if !slug::is_valid(slug) => {
            return Err(ValidationError::InvalidSlug(slug.to_string()));
        }
        Some(slug) => Some(slug.to_string()),
    };

    let removed: HashSet<&ComponentId> = draft.removed.iter().collect();
    let mut seen = HashSet::new();
    let mut components = Vec::with_capacity(draft.components.len());

    for component in &draft.components {
        if component.id.as_ref().is_some_and(|id| removed.contains(id)) {
            continue;
        }
        let kind = ComponentKind::parse(&component.kind)
            .ok_or_else(|| ValidationError::UnknownComponentType(component.kind.clone()))?;
        let id = component.id.clone().unwrap_or_else(ComponentId::generate);
        if !seen.insert(id.clone()) {
            return Err(ValidationError::DuplicateComponent(id.into_string()));
        }

        let order = i64::try_from(components.len()).unwrap_or(i64::MAX);
        let built = Component::from_parts(id, kind, order, component.payload.clone());
        if let Some(Err(value)) = built.alignment() {
            return Err(ValidationError::InvalidAlignment {
                component_id: built.id.into_string(),
                value,
            });
        }
        components.push(built);
    }

    Ok(Prepared {
        title: title.to_string(),
        slug,
        components,
        removed: draft.removed.clone(),
    })
}
