//! Pages, components and their identifiers.
//!
//! Records arrive from many client versions, so decoding is lenient:
//! fields of the wrong type are treated as missing, and only the checks the
//! readers depend on (`type`, `title`, `deleted`) decide acceptance.

mod component;
pub mod fields;
mod ids;
mod page;

pub use component::{Alignment, Component, ComponentKind, Delivery, tombstone};
pub use ids::{ComponentId, PageId};
pub use page::{PageRecord, PageSummary, now_millis, page_url};
