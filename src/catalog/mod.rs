//! Catalog data model
//!
//! Records, pages and media payloads exchanged with the backend, plus the two
//! error kinds the browsing core handles.

mod error;
mod types;

pub use error::{BackendError, MediaError};
pub use types::{
    CatalogKind, ContentRecord, FALLBACK_PER_PAGE, MediaPayload, MediaRef, Page, total_pages,
};
