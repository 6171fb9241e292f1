//! Error types for the graph store module.

use thiserror::Error;

/// Errors that can occur during graph store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "kv")]
    #[error("Fjall error: {0}")]
    Fjall(#[from] fjall::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Store is closed")]
    Closed,

    #[error("Write rejected at {path}: {reason}")]
    Rejected { path: String, reason: String },
}
