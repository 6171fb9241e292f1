//! Application state management.

use std::path::Path;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::service::PageService;
use crate::store::{FjallStore, MemoryStore, SharedStore, StoreError};

use super::config::{Config, StoreBackend};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    service: PageService,
    /// Cancelled on shutdown; every request aggregates under a child token.
    shutdown: CancellationToken,
}

impl AppState {
    /// Open the configured store and build the page service over it.
    pub fn from_config(config: &Config) -> Result<Self, StateError> {
        let store: SharedStore = match config.store.backend {
            StoreBackend::Memory => Arc::new(MemoryStore::new()),
            StoreBackend::Fjall => {
                let store = FjallStore::open(Path::new(&config.store.path)).map_err(|e| {
                    StateError::OpenStore {
                        path: config.store.path.clone(),
                        source: e,
                    }
                })?;
                Arc::new(store)
            }
        };
        Ok(Self::new(PageService::new(store, config.read.clone())))
    }

    pub fn new(service: PageService) -> Self {
        Self {
            service,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn service(&self) -> &PageService {
        &self.service
    }

    /// Token for one request's aggregations.
    pub fn request_token(&self) -> CancellationToken {
        self.shutdown.child_token()
    }

    /// Token the binary cancels when a shutdown signal arrives.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }
}

/// Errors that can occur when setting up application state.
#[derive(Debug)]
pub enum StateError {
    /// Failed to open the on-disk store.
    OpenStore { path: String, source: StoreError },
}

impl std::fmt::Display for StateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StateError::OpenStore { path, source } => {
                write!(f, "Failed to open store at '{}': {}", path, source)
            }
        }
    }
}

impl std::error::Error for StateError {}
