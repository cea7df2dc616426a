//! Local JSON catalog backend
//!
//! Serves the three catalogs from `models.json`, `stages.json` and
//! `motions.json` in a data directory, resolves media references as file
//! paths, and ranks search results by cosine similarity against a
//! [`QueryEmbedder`].
//!
//! Resolved media is kept in a shared `moka` cache so that several cards
//! showing the same screenshot only read it from disk once.

use async_trait::async_trait;
use moka::sync::Cache;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use super::traits::{CatalogBackend, QueryEmbedder};
use crate::catalog::{
    BackendError, CatalogKind, ContentRecord, MediaError, MediaPayload, MediaRef, Page,
};
use crate::config::MediaConfig;

/// On-disk catalog shape: `{"models": [...]}`, `{"stages": [...]}` or `{"motions": [...]}`
#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(alias = "models", alias = "stages", alias = "motions", default)]
    records: Vec<ContentRecord>,
}

type Catalogs = HashMap<CatalogKind, Arc<Vec<ContentRecord>>>;

/// Backend reading catalogs and media from the local filesystem
pub struct LocalBackend {
    data_dir: PathBuf,
    catalogs: RwLock<Catalogs>,
    embedder: Option<Arc<dyn QueryEmbedder>>,
    media_cache: Cache<MediaRef, MediaPayload>,
}

impl LocalBackend {
    /// Open the catalogs stored in `data_dir`
    ///
    /// A catalog file that does not exist yet is treated as an empty catalog.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if an existing catalog file cannot be read or parsed.
    pub async fn open(data_dir: impl Into<PathBuf>, media: &MediaConfig) -> Result<Self, BackendError> {
        let data_dir = data_dir.into();
        let catalogs = load_catalogs(&data_dir).await?;

        let media_cache = Cache::builder()
            .time_to_live(Duration::from_secs(media.cache_ttl_secs))
            .max_capacity(media.cache_capacity)
            .build();

        Ok(Self {
            data_dir,
            catalogs: RwLock::new(catalogs),
            embedder: None,
            media_cache,
        })
    }

    /// Enable semantic search and embedding generation
    #[must_use]
    pub fn with_embedder(mut self, embedder: Arc<dyn QueryEmbedder>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Re-read every catalog file
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if a catalog file cannot be read or parsed. The
    /// previously loaded catalogs stay in place in that case.
    pub async fn reload(&self) -> Result<(), BackendError> {
        let fresh = load_catalogs(&self.data_dir).await?;
        *self.catalogs.write().await = fresh;
        self.media_cache.invalidate_all();
        Ok(())
    }

    /// Record `id` of catalog `kind`
    pub async fn find(&self, kind: CatalogKind, id: &str) -> Option<ContentRecord> {
        self.catalog(kind).await.iter().find(|r| r.id == id).cloned()
    }

    async fn catalog(&self, kind: CatalogKind) -> Arc<Vec<ContentRecord>> {
        self.catalogs
            .read()
            .await
            .get(&kind)
            .cloned()
            .unwrap_or_default()
    }

    fn embedder(&self) -> Result<&Arc<dyn QueryEmbedder>, BackendError> {
        self.embedder
            .as_ref()
            .ok_or_else(|| BackendError::SearchUnavailable("no query embedder configured".into()))
    }
}

#[async_trait]
impl CatalogBackend for LocalBackend {
    async fn list_catalog(
        &self,
        kind: CatalogKind,
        page: usize,
        per_page: usize,
    ) -> Result<Page<ContentRecord>, BackendError> {
        let records = self.catalog(kind).await;
        Ok(Page::paginate(&records, page, per_page))
    }

    async fn search_catalog(
        &self,
        kind: CatalogKind,
        query: &str,
        limit: usize,
    ) -> Result<Vec<ContentRecord>, BackendError> {
        let records = self.catalog(kind).await;
        if records.is_empty() {
            return Ok(Vec::new());
        }

        let query_embedding = self.embedder()?.embed(query).await?;
        let ranked = rank_by_similarity(&records, &query_embedding, limit);

        tracing::debug!(%kind, query, results = ranked.len(), "semantic search ranked");
        Ok(ranked)
    }

    async fn resolve_media(&self, reference: &MediaRef) -> Result<MediaPayload, MediaError> {
        if let Some(payload) = self.media_cache.get(reference) {
            return Ok(payload);
        }

        let path = Path::new(reference.as_str());
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| MediaError::from_io(reference.as_str(), &e))?;

        if bytes.is_empty() {
            return Err(MediaError::Decode(format!("{reference}: empty file")));
        }

        let payload = MediaPayload::new(mime_for(path), bytes);
        self.media_cache.insert(reference.clone(), payload.clone());
        Ok(payload)
    }

    async fn trigger_embedding_generation(&self) -> Result<(), BackendError> {
        let embedder = self.embedder()?.clone();

        for kind in CatalogKind::ALL {
            let mut records = self.catalog(kind).await.as_ref().clone();
            let mut updated = 0usize;
            let mut failed = 0usize;

            for record in records.iter_mut().filter(|r| r.embedding.is_none()) {
                let text = embedding_text(record);
                match embedder.embed(&text).await {
                    Ok(vector) => {
                        record.embedding = Some(vector);
                        updated += 1;
                    }
                    Err(e) => {
                        tracing::warn!(%kind, id = %record.id, error = %e, "embedding failed");
                        failed += 1;
                    }
                }
            }

            if updated > 0 {
                write_catalog(&self.data_dir, kind, &records).await?;
                self.catalogs.write().await.insert(kind, Arc::new(records));
            }

            tracing::info!(%kind, updated, failed, "embedding generation finished");
        }

        Ok(())
    }
}

/// Text embedded for a record: its name and description
#[must_use]
pub fn embedding_text(record: &ContentRecord) -> String {
    format!("Name: {}\nDescription: {}", record.name, record.description)
}

/// Cosine similarity of two vectors
///
/// Vectors of different length, or with zero magnitude, score 0.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let (dot, norm_a, norm_b) = a
        .iter()
        .zip(b)
        .fold((0.0f32, 0.0f32, 0.0f32), |(dot, na, nb), (x, y)| {
            (dot + x * y, na + x * x, nb + y * y)
        });

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Records with an embedding, best match first, capped at `limit` (0 = no cap)
fn rank_by_similarity(records: &[ContentRecord], query: &[f32], limit: usize) -> Vec<ContentRecord> {
    let mut scored: Vec<(f32, &ContentRecord)> = records
        .iter()
        .filter_map(|r| {
            r.embedding
                .as_deref()
                .filter(|e| !e.is_empty())
                .map(|e| (cosine_similarity(query, e), r))
        })
        .collect();

    scored.sort_by(|a, b| b.0.total_cmp(&a.0));

    let limit = if limit == 0 { scored.len() } else { limit };
    scored
        .into_iter()
        .take(limit)
        .map(|(_, r)| r.clone())
        .collect()
}

/// MIME type inferred from a media file extension
#[must_use]
pub fn mime_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        _ => "image/jpeg",
    }
}

async fn load_catalogs(data_dir: &Path) -> Result<Catalogs, BackendError> {
    let mut catalogs = HashMap::new();
    for kind in CatalogKind::ALL {
        let records = read_catalog(&data_dir.join(kind.file_name())).await?;
        tracing::debug!(%kind, count = records.len(), "catalog loaded");
        catalogs.insert(kind, Arc::new(records));
    }
    Ok(catalogs)
}

async fn read_catalog(path: &Path) -> Result<Vec<ContentRecord>, BackendError> {
    match tokio::fs::read(path).await {
        Ok(data) => {
            let file: CatalogFile = serde_json::from_slice(&data)?;
            Ok(file.records)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(e.into()),
    }
}

async fn write_catalog(
    data_dir: &Path,
    kind: CatalogKind,
    records: &[ContentRecord],
) -> Result<(), BackendError> {
    tokio::fs::create_dir_all(data_dir).await?;
    let mut root = serde_json::Map::new();
    root.insert(kind.catalog_key().to_string(), serde_json::to_value(records)?);
    let data = serde_json::to_vec_pretty(&root)?;
    tokio::fs::write(data_dir.join(kind.file_name()), data).await?;
    Ok(())
}
