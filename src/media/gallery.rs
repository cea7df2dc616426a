//! Detail view image gallery
//!
//! Loads every screenshot of a record in one background task, one after the
//! other, and publishes them together. Selecting an image opens it zoomable;
//! zoom is reset whenever an image is opened or closed.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::backend::CatalogBackend;
use crate::catalog::{MediaPayload, MediaRef};
use crate::events::{AppEvent, EventSender, GalleryImage, InstanceId};

/// Zoom applied when an image is opened
pub const ZOOM_DEFAULT: u16 = 100;
/// Smallest zoom percentage
pub const ZOOM_MIN: u16 = 50;
/// Largest zoom percentage
pub const ZOOM_MAX: u16 = 300;
/// Zoom change per step
pub const ZOOM_STEP: u16 = 25;

/// Gallery state for one detail view
pub struct DetailGallery {
    id: InstanceId,
    refs: Vec<MediaRef>,
    images: HashMap<usize, MediaPayload>,
    loading: bool,
    selected: Option<usize>,
    zoom: u16,
    task: Option<JoinHandle<()>>,
}

impl DetailGallery {
    /// Start loading `screenshots` in the background
    #[must_use]
    pub fn open(screenshots: Vec<MediaRef>, backend: Arc<dyn CatalogBackend>, events: EventSender) -> Self {
        let id = InstanceId::next();
        let refs = screenshots.clone();

        let task = tokio::spawn(async move {
            let mut images: Vec<GalleryImage> = Vec::with_capacity(screenshots.len());
            for (index, reference) in screenshots.iter().enumerate() {
                images.push((index, backend.resolve_media(reference).await));
            }
            events.send(AppEvent::GalleryLoaded { gallery: id, images });
        });

        Self {
            id,
            refs,
            images: HashMap::new(),
            loading: true,
            selected: None,
            zoom: ZOOM_DEFAULT,
            task: Some(task),
        }
    }

    #[must_use]
    pub const fn id(&self) -> InstanceId {
        self.id
    }

    /// Whether the bulk load is still running
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.loading
    }

    /// Number of screenshots in the gallery
    #[must_use]
    pub fn len(&self) -> usize {
        self.refs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }

    /// Loaded image at `index`, if it resolved
    #[must_use]
    pub fn image(&self, index: usize) -> Option<&MediaPayload> {
        self.images.get(&index)
    }

    /// Number of images that resolved
    #[must_use]
    pub fn loaded_count(&self) -> usize {
        self.images.len()
    }

    /// Apply the bulk-load result. Failed images are logged and left out.
    pub fn apply(&mut self, images: Vec<GalleryImage>) {
        for (index, result) in images {
            match result {
                Ok(payload) => {
                    self.images.insert(index, payload);
                }
                Err(e) => {
                    tracing::warn!(gallery = %self.id, index, error = %e, "failed to load gallery image");
                }
            }
        }
        self.loading = false;
        self.task = None;
    }

    /// Open image `index` in the zoom view
    ///
    /// Returns `false` if `index` is out of range.
    pub fn select(&mut self, index: usize) -> bool {
        if index >= self.refs.len() {
            return false;
        }
        self.selected = Some(index);
        self.zoom = ZOOM_DEFAULT;
        true
    }

    /// Close the zoom view
    pub fn close(&mut self) {
        self.selected = None;
        self.zoom = ZOOM_DEFAULT;
    }

    #[must_use]
    pub const fn selected(&self) -> Option<usize> {
        self.selected
    }

    /// Current zoom percentage
    #[must_use]
    pub const fn zoom(&self) -> u16 {
        self.zoom
    }

    pub fn zoom_in(&mut self) -> u16 {
        self.zoom = (self.zoom + ZOOM_STEP).min(ZOOM_MAX);
        self.zoom
    }

    pub fn zoom_out(&mut self) -> u16 {
        self.zoom = self.zoom.saturating_sub(ZOOM_STEP).max(ZOOM_MIN);
        self.zoom
    }
}

impl Drop for DetailGallery {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
