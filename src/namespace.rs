//! Storage namespaces and their precedence.
//!
//! Pages and slug mappings live under one of two path prefixes while a
//! data-layout migration is in progress:
//!
//! | namespace | pages                  | slugs                  |
//! |-----------|------------------------|------------------------|
//! | current   | `shogun/linko/pages`   | `shogun/linko/slugs`   |
//! | legacy    | `pages`                | `slugs`                |
//!
//! Readers consult both. [`NamespaceSet`] keeps them in precedence order and
//! is the only place that decides which one wins.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::{ComponentId, PageId};
use crate::store::NodePath;

/// One of the two storage layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Namespace {
    Current,
    Legacy,
}

impl Namespace {
    fn collection(self, name: &str) -> NodePath {
        match self {
            Namespace::Current => NodePath::from_segments(["shogun", "linko", name]),
            Namespace::Legacy => NodePath::root(name),
        }
    }

    /// Collection holding page records.
    pub fn pages(self) -> NodePath {
        self.collection("pages")
    }

    /// Collection holding `slug -> pageId` mappings.
    pub fn slugs(self) -> NodePath {
        self.collection("slugs")
    }

    /// Page record node.
    pub fn page(self, id: &PageId) -> NodePath {
        self.pages().child(id.as_str())
    }

    /// Collection of component references owned by a page.
    pub fn page_components(self, id: &PageId) -> NodePath {
        self.page(id).child("components")
    }

    /// Slug mapping node.
    pub fn slug(self, slug: &str) -> NodePath {
        self.slugs().child(slug)
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Namespace::Current => write!(f, "current"),
            Namespace::Legacy => write!(f, "legacy"),
        }
    }
}

/// Top-level standalone node of a component. Shared by both namespaces.
pub fn standalone_component(id: &ComponentId) -> NodePath {
    NodePath::root(id.as_str())
}

/// Namespaces ordered from highest to lowest precedence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceSet {
    order: Vec<Namespace>,
}

impl NamespaceSet {
    /// Current first, then legacy.
    pub fn migrating() -> Self {
        Self {
            order: vec![Namespace::Current, Namespace::Legacy],
        }
    }

    /// Only the current namespace (migration finished).
    pub fn current_only() -> Self {
        Self {
            order: vec![Namespace::Current],
        }
    }

    /// Namespaces in precedence order.
    pub fn iter(&self) -> impl Iterator<Item = Namespace> + '_ {
        self.order.iter().copied()
    }

    /// Namespace new data is written to.
    pub fn primary(&self) -> Namespace {
        self.order.first().copied().unwrap_or(Namespace::Current)
    }

    pub fn contains(&self, namespace: Namespace) -> bool {
        self.order.contains(&namespace)
    }

    fn rank(&self, namespace: Namespace) -> usize {
        self.order
            .iter()
            .position(|n| *n == namespace)
            .unwrap_or(self.order.len())
    }

    /// Whether a record from `incoming` may replace one from `existing`.
    ///
    /// Equal namespaces replace (later arrival wins); otherwise only a
    /// higher-precedence namespace replaces a lower one.
    pub fn may_replace(&self, existing: Namespace, incoming: Namespace) -> bool {
        self.rank(incoming) <= self.rank(existing)
    }
}

impl Default for NamespaceSet {
    fn default() -> Self {
        Self::migrating()
    }
}
