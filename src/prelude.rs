//! Convenient re-exports for common usage patterns.
//!
//! This module provides a single import to bring all commonly used types
//! into scope.
//!
//! # Example
//!
//! ```ignore
//! use linkthree::prelude::*;
//!
//! let service = PageService::new(Arc::new(MemoryStore::new()), ReadConfig::default());
//! let index = service.index(&CancellationToken::new()).await;
//! ```

// Unified error handling
pub use crate::error::{Error, Result, ValidationError};

// Store types
#[cfg(feature = "kv")]
pub use crate::store::FjallStore;
pub use crate::store::{
    GraphStore, MemoryStore, NodePath, SharedStore, StoreError, Subscription, SubscriptionEvent,
};

// Read and write path
pub use crate::aggregate::{Aggregation, CommitReason, PageIndex, Quiescence};
pub use crate::config::{QuiescenceMode, ReadConfig, SlugRetention};
pub use crate::loader::{LoadedPage, PageHandle};
pub use crate::model::{
    Alignment, Component, ComponentId, ComponentKind, PageId, PageRecord, PageSummary,
};
pub use crate::namespace::{Namespace, NamespaceSet};
pub use crate::navigation::{NavLink, Navigation};
pub use crate::resolver::Resolution;
pub use crate::service::{PageService, PageView};
pub use crate::writer::{
    ComponentDraft, PageDraft, SaveReport, ShareLinks, SlugCheck, SlugStatus, WriteReport,
};

// Dependency re-exports
pub use std::sync::Arc;
pub use tokio_util::sync::CancellationToken;
