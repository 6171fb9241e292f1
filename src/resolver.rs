//! Slug to page id resolution across namespaces.
//!
//! A freshly written slug mapping may not have reached this replica yet, so
//! a miss is retried a bounded number of times before it is reported as
//! [`Resolution::NotFound`]. Store errors count as misses.

use serde::Serialize;

use crate::config::ResolverConfig;
use crate::logging::{debug, info, warn};
use crate::model::PageId;
use crate::namespace::{Namespace, NamespaceSet};
use crate::slug::mapped_page_id;
use crate::store::SharedStore;

/// Outcome of resolving a slug.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Resolution {
    Found { page_id: PageId, namespace: Namespace },
    NotFound,
}

impl Resolution {
    pub fn page_id(&self) -> Option<&PageId> {
        match self {
            Resolution::Found { page_id, .. } => Some(page_id),
            Resolution::NotFound => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Resolution::Found { .. })
    }
}

#[derive(Clone)]
pub struct PathResolver {
    store: SharedStore,
    namespaces: NamespaceSet,
    config: ResolverConfig,
}

impl PathResolver {
    pub fn new(store: SharedStore, namespaces: NamespaceSet, config: ResolverConfig) -> Self {
        Self {
            store,
            namespaces,
            config,
        }
    }

    /// Resolve `slug` to a page id.
    ///
    /// Probes every namespace in precedence order, retrying a full miss up
    /// to the configured number of times. Never fails: running out of
    /// retries or hitting the overall deadline yields `NotFound`.
    pub async fn resolve(&self, slug: &str) -> Resolution {
        if slug.is_empty() {
            return Resolution::NotFound;
        }

        match tokio::time::timeout(self.config.deadline(), self.retry(slug)).await {
            Ok(resolution) => resolution,
            Err(_) => {
                warn!(
                    slug,
                    deadline_ms = self.config.deadline_ms,
                    "slug resolution deadline passed"
                );
                Resolution::NotFound
            }
        }
    }

    async fn retry(&self, slug: &str) -> Resolution {
        for attempt in 0..=self.config.retries {
            if attempt > 0 {
                tokio::time::sleep(self.config.retry_delay()).await;
            }
            if let Some(resolution) = self.probe(slug, attempt).await {
                return resolution;
            }
        }
        info!(slug, attempts = self.config.retries + 1, "slug not found");
        Resolution::NotFound
    }

    /// One pass over the namespaces. `None` means every namespace missed.
    async fn probe(&self, slug: &str, attempt: u32) -> Option<Resolution> {
        for namespace in self.namespaces.iter() {
            let path = namespace.slug(slug);
            match tokio::time::timeout(self.config.probe_timeout(), self.store.once(&path)).await {
                Ok(Ok(value)) => {
                    if let Some(page_id) = mapped_page_id(value.as_ref()) {
                        debug!(slug, page_id, namespace = %namespace, attempt, "slug resolved");
                        return Some(Resolution::Found {
                            page_id: PageId::from(page_id),
                            namespace,
                        });
                    }
                }
                Ok(Err(err)) => warn!(path = %path, error = %err, "slug read failed"),
                Err(_) => debug!(slug, namespace = %namespace, attempt, "slug probe timed out"),
            }
        }
        None
    }
}
