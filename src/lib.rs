//! Page and slug reconciliation over an eventually-consistent graph store.
//!
//! Pages, their components and `slug -> page` mappings are replicated by a
//! gossip store that may deliver any record late, more than once, or out of
//! order, and that keeps data under two namespaces while a layout migration
//! is in progress. This library turns that stream into stable answers.
//!
//! # Quick Start
//!
//! ```ignore
//! use linkthree::prelude::*;
//!
//! let store: SharedStore = Arc::new(MemoryStore::new());
//! let service = PageService::new(store, ReadConfig::default());
//!
//! let saved = service.save(PageDraft {
//!     title: "Alice".into(),
//!     slug: Some("alice".into()),
//!     author: "pub_alice".into(),
//!     ..PageDraft::default()
//! }).await?;
//!
//! let view = service.view_slug("alice", &CancellationToken::new()).await;
//! ```
//!
//! # Modules
//!
//! - [`store`] - The [`GraphStore`] trait with in-memory and fjall-backed stores
//! - [`resolver`] - Slug to page id, with bounded retries
//! - [`loader`] - Page id to record and namespace handle
//! - [`aggregate`] - Component list and page index aggregation
//! - [`navigation`] - Previous, next and random links over the index
//! - [`writer`] - Saves, soft deletes and slug reservations
//! - [`service`] - All of the above behind one handle
//! - [`server`] - HTTP API (requires `server` feature)
//!
//! # Feature Flags
//!
//! - `kv` - Enable the fjall-backed store (enabled by default)
//! - `logging` - Enable library-level tracing (consumers provide their own subscriber)
//! - `cli` - Enable the command-line interface binary
//! - `server` - Enable the HTTP API server
//! - `full` - Enable all features

mod logging;

pub mod aggregate;
pub mod config;
mod error;
pub mod loader;
pub mod model;
pub mod namespace;
pub mod navigation;
pub mod prelude;
pub mod resolver;
#[cfg(feature = "server")]
pub mod server;
pub mod service;
pub mod slug;
pub mod store;
pub mod writer;

// Re-export the unified error type
pub use error::{Error, Result, ValidationError};

pub use aggregate::{Aggregation, CommitReason, PageIndex, Quiescence};
pub use config::ReadConfig;
pub use loader::{LoadedPage, PageHandle};
pub use model::{Component, ComponentId, ComponentKind, PageId, PageRecord, PageSummary};
pub use namespace::{Namespace, NamespaceSet};
pub use resolver::Resolution;
pub use service::{PageService, PageView};
#[cfg(feature = "kv")]
pub use store::FjallStore;
pub use store::{GraphStore, MemoryStore, NodePath, SharedStore, StoreError};
pub use writer::{ComponentDraft, PageDraft, SaveReport};
