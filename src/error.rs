//! Unified error type for the linkthree library.
//!
//! "Not found" is never an error here: resolvers and loaders report absence
//! as a value. [`Error`] covers rejected edits and store failures that a
//! caller has to act on.

use thiserror::Error;

use crate::store::StoreError;

/// Reasons an edit is refused before anything is written.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Page title must not be empty")]
    EmptyTitle,

    #[error("Slug '{0}' contains invalid characters")]
    InvalidSlug(String),

    #[error("Slug '{0}' is reserved")]
    ReservedSlug(String),

    #[error("Slug '{slug}' is already used by page '{page_id}'")]
    SlugTaken { slug: String, page_id: String },

    #[error("Unknown component type: {0}")]
    UnknownComponentType(String),

    #[error("Invalid alignment '{value}' on component '{component_id}'")]
    InvalidAlignment { component_id: String, value: String },

    #[error("Component '{0}' appears more than once in the draft")]
    DuplicateComponent(String),
}

/// Unified error type for all linkthree operations.
#[derive(Error, Debug)]
pub enum Error {
    /// The requested edit is invalid.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Error from the underlying graph store.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The page exists but belongs to another author.
    #[error("Page '{page_id}' belongs to another author")]
    NotOwner { page_id: String },

    /// The page to modify could not be loaded.
    #[error("Page not found: {0}")]
    PageNotFound(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A [`Result`] type alias using the unified [`Error`] type.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns `true` if this is a validation error.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns `true` if this is a store error.
    pub fn is_store(&self) -> bool {
        matches!(self, Self::Store(_))
    }

    /// Returns `true` if the page could not be found.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::PageNotFound(_))
    }
}
