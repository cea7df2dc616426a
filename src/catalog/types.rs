//! Catalog data types shared by the backend and the browsing core

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Page size the backend falls back to when asked for zero records per page
pub const FALLBACK_PER_PAGE: usize = 100;

/// One of the three independently browsed catalogs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CatalogKind {
    /// Character models
    #[value(alias = "models")]
    Model,
    /// Stages (scenes)
    #[value(alias = "stages")]
    Stage,
    /// Motions (animations)
    #[value(alias = "motions")]
    Motion,
}

impl CatalogKind {
    /// All catalogs, in menu order
    pub const ALL: [Self; 3] = [Self::Model, Self::Stage, Self::Motion];

    /// Singular noun used in messages ("model")
    #[must_use]
    pub const fn noun(self) -> &'static str {
        match self {
            Self::Model => "model",
            Self::Stage => "stage",
            Self::Motion => "motion",
        }
    }

    /// Plural heading used for the catalog view ("Models")
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Model => "Models",
            Self::Stage => "Stages",
            Self::Motion => "Motions",
        }
    }

    /// Top-level key of the catalog file (`{"models": [...]}`)
    #[must_use]
    pub const fn catalog_key(self) -> &'static str {
        match self {
            Self::Model => "models",
            Self::Stage => "stages",
            Self::Motion => "motions",
        }
    }

    /// Name of the catalog file inside the data directory
    #[must_use]
    pub fn file_name(self) -> String {
        format!("{}.json", self.catalog_key())
    }
}

impl fmt::Display for CatalogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.noun())
    }
}

/// Opaque media reference, only meaningful to the backend
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediaRef(String);

impl MediaRef {
    /// Wrap a backend reference
    #[must_use]
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    /// The raw reference string
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MediaRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MediaRef {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// One catalog entry
///
/// Models, stages and motions share this shape. Records are produced fresh by
/// every listing or search response and never edited client-side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentRecord {
    /// Stable identifier, unique within its catalog
    pub id: String,

    /// Display label
    pub name: String,

    /// Screenshots in display order
    #[serde(default)]
    pub screenshots: Vec<MediaRef>,

    /// Video references; when non-empty they take precedence over screenshots
    #[serde(default)]
    pub video: Vec<MediaRef>,

    /// Free text, target of semantic search
    #[serde(default)]
    pub description: String,

    /// Source-of-truth location on disk, used by the copy/open actions
    #[serde(default)]
    pub original_path: String,

    /// Search-relevance vector, owned by the backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

impl ContentRecord {
    /// Create a record with no media, description or embedding
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            screenshots: Vec::new(),
            video: Vec::new(),
            description: String::new(),
            original_path: String::new(),
            embedding: None,
        }
    }

    /// Set the screenshots
    #[must_use]
    pub fn with_screenshots<I, S>(mut self, screenshots: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.screenshots = screenshots.into_iter().map(MediaRef::new).collect();
        self
    }

    /// Set the video references
    #[must_use]
    pub fn with_video<I, S>(mut self, video: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.video = video.into_iter().map(MediaRef::new).collect();
        self
    }

    /// Set the description
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the original path
    #[must_use]
    pub fn with_original_path(mut self, path: impl Into<String>) -> Self {
        self.original_path = path.into();
        self
    }

    /// Set the embedding
    #[must_use]
    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }

    /// Whether any video reference is present
    #[must_use]
    pub fn has_video(&self) -> bool {
        !self.video.is_empty()
    }
}

/// Number of pages needed for `total` records at `per_page` records per page
///
/// Returns 0 when `per_page` is 0.
#[must_use]
pub const fn total_pages(total: usize, per_page: usize) -> usize {
    if per_page == 0 {
        0
    } else {
        total.div_ceil(per_page)
    }
}

/// A bounded slice of a catalog plus pagination metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// Records on this page, at most `per_page`
    pub data: Vec<T>,
    /// Records in the whole catalog
    pub total: usize,
    /// 1-based page number
    pub page: usize,
    /// Requested page size
    pub per_page: usize,
    /// `ceil(total / per_page)`
    pub total_pages: usize,
}

impl<T: Clone> Page<T> {
    /// Slice `items` into the requested page
    ///
    /// Out-of-range requests are clamped rather than rejected: a page below 1
    /// becomes 1, a zero page size becomes [`FALLBACK_PER_PAGE`], and a page
    /// past the end becomes the last page (or 1 for an empty catalog).
    #[must_use]
    pub fn paginate(items: &[T], page: usize, per_page: usize) -> Self {
        let total = items.len();
        let per_page = if per_page == 0 { FALLBACK_PER_PAGE } else { per_page };
        let total_pages = total_pages(total, per_page);
        let page = page.clamp(1, total_pages.max(1));

        let start = ((page - 1) * per_page).min(total);
        let end = start.saturating_add(per_page).min(total);

        Self {
            data: items[start..end].to_vec(),
            total,
            page,
            per_page,
            total_pages,
        }
    }
}

impl<T> Page<T> {
    /// An empty first page
    #[must_use]
    pub const fn empty(per_page: usize) -> Self {
        Self {
            data: Vec::new(),
            total: 0,
            page: 1,
            per_page,
            total_pages: 0,
        }
    }

    /// Whether `page` is a valid page number for this result set
    #[must_use]
    pub const fn contains_page(&self, page: usize) -> bool {
        let last = if self.total_pages == 0 { 1 } else { self.total_pages };
        page >= 1 && page <= last
    }
}

/// Resolved, displayable media
///
/// Cloning is cheap: the bytes are shared.
#[derive(Clone, PartialEq, Eq)]
pub struct MediaPayload {
    /// MIME type (`image/png`, `video/mp4`, ...)
    pub mime: String,
    /// Raw bytes
    pub bytes: Arc<[u8]>,
}

impl MediaPayload {
    /// Wrap resolved bytes
    #[must_use]
    pub fn new(mime: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            mime: mime.into(),
            bytes: bytes.into(),
        }
    }

    /// Whether this payload is a video
    #[must_use]
    pub fn is_video(&self) -> bool {
        self.mime.starts_with("video/")
    }

    /// Size in bytes
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the payload has no bytes
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Inline `data:` URI, ready for an `<img>`/`<video>` source
    #[must_use]
    pub fn to_data_uri(&self) -> String {
        use base64::Engine;
        let encoded = base64::engine::general_purpose::STANDARD.encode(&self.bytes);
        format!("data:{};base64,{encoded}", self.mime)
    }
}

impl fmt::Debug for MediaPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaPayload")
            .field("mime", &self.mime)
            .field("len", &self.bytes.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbers(n: usize) -> Vec<usize> {
        (0..n).collect()
    }

    #[test]
    fn test_total_pages_rounds_up() {
        assert_eq!(total_pages(250, 100), 3);
        assert_eq!(total_pages(200, 100), 2);
        assert_eq!(total_pages(0, 100), 0);
        assert_eq!(total_pages(1, 10_000), 1);
        assert_eq!(total_pages(10, 0), 0);
    }

    #[test]
    fn test_paginate_last_partial_page() {
        let items = numbers(250);
        let page = Page::paginate(&items, 3, 100);

        assert_eq!(page.data.len(), 50);
        assert_eq!(page.data[0], 200);
        assert_eq!(page.total, 250);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.page, 3);
    }

    #[test]
    fn test_paginate_clamps_out_of_range_pages() {
        let items = numbers(250);

        let past_end = Page::paginate(&items, 9, 100);
        assert_eq!(past_end.page, 3);
        assert_eq!(past_end.data.len(), 50);

        let before_start = Page::paginate(&items, 0, 100);
        assert_eq!(before_start.page, 1);
        assert_eq!(before_start.data[0], 0);
    }

    #[test]
    fn test_paginate_zero_per_page_falls_back() {
        let items = numbers(150);
        let page = Page::paginate(&items, 1, 0);
        assert_eq!(page.per_page, FALLBACK_PER_PAGE);
        assert_eq!(page.data.len(), 100);
    }

    #[test]
    fn test_paginate_empty_catalog_stays_on_page_one() {
        let items: Vec<usize> = Vec::new();
        let page = Page::paginate(&items, 5, 10);
        assert_eq!(page.page, 1);
        assert_eq!(page.total_pages, 0);
        assert!(page.data.is_empty());
        assert!(page.contains_page(1));
        assert!(!page.contains_page(2));
    }

    #[test]
    fn test_contains_page_bounds() {
        let page = Page::paginate(&numbers(250), 1, 100);
        assert!(!page.contains_page(0));
        assert!(page.contains_page(3));
        assert!(!page.contains_page(4));
    }

    #[test]
    fn test_record_json_uses_camel_case() {
        let json = r#"{
            "id": "m-001",
            "name": "Miku",
            "screenshots": ["/data/a.png"],
            "description": "twin tails",
            "originalPath": "C:\\mmd\\Miku\\miku.pmx"
        }"#;

        let record: ContentRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.original_path, "C:\\mmd\\Miku\\miku.pmx");
        assert!(record.video.is_empty());
        assert!(record.embedding.is_none());
        assert_eq!(record.screenshots, vec![MediaRef::new("/data/a.png")]);

        let back = serde_json::to_value(&record).unwrap();
        assert!(back.get("originalPath").is_some());
        assert!(back.get("embedding").is_none());
    }

    #[test]
    fn test_payload_data_uri() {
        let payload = MediaPayload::new("image/png", b"abc".to_vec());
        assert_eq!(payload.to_data_uri(), "data:image/png;base64,YWJj");
        assert!(!payload.is_video());
        assert_eq!(payload.len(), 3);
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(CatalogKind::Stage.file_name(), "stages.json");
        assert_eq!(CatalogKind::Motion.label(), "Motions");
        assert_eq!(CatalogKind::Model.to_string(), "model");
    }
}
