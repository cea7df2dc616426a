//! Backend collaborator contracts
//!
//! The browsing core never talks to storage, the filesystem or an embedding
//! model directly. Everything goes through [`CatalogBackend`], which makes it
//! possible to drive the core from a local JSON catalog, a remote service, or
//! a scripted test double.

use async_trait::async_trait;

use crate::catalog::{BackendError, CatalogKind, ContentRecord, MediaError, MediaPayload, MediaRef, Page};

/// Operations the browsing core consumes from its backend
#[async_trait]
pub trait CatalogBackend: Send + Sync {
    /// Fetch one page of a catalog
    ///
    /// `page` and `per_page` are at least 1 when called by the core.
    async fn list_catalog(
        &self,
        kind: CatalogKind,
        page: usize,
        per_page: usize,
    ) -> Result<Page<ContentRecord>, BackendError>;

    /// Semantic search over a catalog, ranked best first, at most `limit` records
    async fn search_catalog(
        &self,
        kind: CatalogKind,
        query: &str,
        limit: usize,
    ) -> Result<Vec<ContentRecord>, BackendError>;

    /// Resolve a media reference to displayable bytes
    async fn resolve_media(&self, reference: &MediaRef) -> Result<MediaPayload, MediaError>;

    /// Generate missing embeddings for every catalog
    ///
    /// Long-running. Callers only observe completion.
    async fn trigger_embedding_generation(&self) -> Result<(), BackendError>;
}

/// Turns free text into an embedding vector for semantic search
#[async_trait]
pub trait QueryEmbedder: Send + Sync {
    /// Embed `text`
    async fn embed(&self, text: &str) -> Result<Vec<f32>, BackendError>;
}
