//! Application state
//!
//! [`AppState`] is what a UI shell holds: the current [`ViewState`], the
//! mounted catalog view model, the detail gallery and the embedding
//! generation status. All completion events go through
//! [`AppState::handle_event`].

use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinHandle;

use crate::backend::CatalogBackend;
use crate::browse::{BrowseError, BrowserViewModel};
use crate::catalog::{CatalogKind, ContentRecord};
use crate::config::BrowseConfig;
use crate::events::{AppEvent, EventSender};
use crate::media::{CardInput, CardOutcome, DetailGallery};
use crate::view::ViewState;

/// Refused navigation
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NavigationError {
    #[error("Detail views are opened with show_detail")]
    DetailRequiresItem,

    #[error("A {kind} detail can only be opened from the {} view", .kind.label())]
    NotFromSourceCatalog { kind: CatalogKind },

    #[error("Not in a detail view")]
    NotInDetail,

    #[error("No catalog view is mounted")]
    NoCatalog,

    #[error(transparent)]
    Browse(#[from] BrowseError),
}

/// Progress of embedding generation
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EmbeddingStatus {
    #[default]
    Idle,
    Pending,
    Succeeded,
    Failed(String),
}

impl EmbeddingStatus {
    /// Status line for the sidebar
    #[must_use]
    pub fn message(&self) -> Option<String> {
        match self {
            Self::Idle => None,
            Self::Pending => Some("Generating AI embeddings...".to_string()),
            Self::Succeeded => Some("Embeddings generated successfully".to_string()),
            Self::Failed(e) => Some(format!("Error generating embeddings: {e}")),
        }
    }
}

/// Everything the UI shell needs to render
pub struct AppState {
    view: ViewState,
    catalog: Option<BrowserViewModel>,
    gallery: Option<DetailGallery>,
    embeddings: EmbeddingStatus,
    embed_task: Option<JoinHandle<()>>,
    config: BrowseConfig,
    backend: Arc<dyn CatalogBackend>,
    events: EventSender,
}

impl AppState {
    /// Start on the dashboard
    #[must_use]
    pub fn new(config: BrowseConfig, backend: Arc<dyn CatalogBackend>, events: EventSender) -> Self {
        Self {
            view: ViewState::Dashboard,
            catalog: None,
            gallery: None,
            embeddings: EmbeddingStatus::Idle,
            embed_task: None,
            config,
            backend,
            events,
        }
    }

    #[must_use]
    pub const fn view(&self) -> &ViewState {
        &self.view
    }

    /// The mounted catalog view model
    ///
    /// Stays mounted while a detail view opened from it is shown.
    #[must_use]
    pub const fn catalog(&self) -> Option<&BrowserViewModel> {
        self.catalog.as_ref()
    }

    pub const fn catalog_mut(&mut self) -> Option<&mut BrowserViewModel> {
        self.catalog.as_mut()
    }

    #[must_use]
    pub const fn gallery(&self) -> Option<&DetailGallery> {
        self.gallery.as_ref()
    }

    pub const fn gallery_mut(&mut self) -> Option<&mut DetailGallery> {
        self.gallery.as_mut()
    }

    #[must_use]
    pub const fn embedding_status(&self) -> &EmbeddingStatus {
        &self.embeddings
    }

    /// Record shown by the detail view
    #[must_use]
    pub fn detail_item(&self) -> Option<(CatalogKind, &ContentRecord)> {
        match &self.view {
            ViewState::Detail { kind, item } => Some((*kind, item.as_ref())),
            _ => None,
        }
    }

    /// Switch to a non-detail view
    ///
    /// Entering a catalog view mounts a fresh view model; leaving it discards
    /// the old one along with its outstanding work. Selecting the view already
    /// shown does nothing.
    ///
    /// # Errors
    ///
    /// Returns `NavigationError::DetailRequiresItem` for `ViewState::Detail`.
    pub fn navigate(&mut self, view: ViewState) -> Result<(), NavigationError> {
        if view.is_detail() {
            return Err(NavigationError::DetailRequiresItem);
        }
        if view == self.view {
            return Ok(());
        }

        tracing::debug!(from = %self.view, to = %view, "navigate");
        self.gallery = None;
        self.catalog = view.catalog_kind().map(|kind| {
            BrowserViewModel::mount(kind, &self.config, Arc::clone(&self.backend), self.events.clone())
        });
        self.view = view;
        Ok(())
    }

    /// Open the detail view for `item`
    ///
    /// Only allowed from the catalog view of `kind`, which is kept mounted for
    /// the way back.
    ///
    /// # Errors
    ///
    /// Returns `NavigationError::NotFromSourceCatalog` from any other view.
    pub fn show_detail(&mut self, kind: CatalogKind, item: ContentRecord) -> Result<(), NavigationError> {
        if self.view.catalog_kind() != Some(kind) {
            return Err(NavigationError::NotFromSourceCatalog { kind });
        }

        tracing::debug!(%kind, id = %item.id, "show detail");
        self.gallery = Some(DetailGallery::open(
            item.screenshots.clone(),
            Arc::clone(&self.backend),
            self.events.clone(),
        ));
        self.view = ViewState::Detail {
            kind,
            item: Box::new(item),
        };
        Ok(())
    }

    /// Leave the detail view for the catalog it was opened from
    ///
    /// # Errors
    ///
    /// Returns `NavigationError::NotInDetail` outside a detail view.
    pub fn back_from_detail(&mut self) -> Result<CatalogKind, NavigationError> {
        let ViewState::Detail { kind, .. } = &self.view else {
            return Err(NavigationError::NotInDetail);
        };
        let kind = *kind;

        self.gallery = None;
        self.view = ViewState::catalog(kind);
        Ok(kind)
    }

    /// Forward card input to the mounted catalog; activating a card opens its detail view
    ///
    /// # Errors
    ///
    /// Returns `NavigationError` if no catalog is shown or there is no card at `position`.
    pub fn card_input(&mut self, position: usize, input: CardInput) -> Result<CardOutcome, NavigationError> {
        if self.view.is_detail() {
            return Err(NavigationError::NoCatalog);
        }
        let catalog = self.catalog.as_mut().ok_or(NavigationError::NoCatalog)?;
        let kind = catalog.kind();
        let outcome = catalog.card_input(position, input)?;

        if let CardOutcome::OpenDetail(record) = &outcome {
            self.show_detail(kind, record.as_ref().clone())?;
        }
        Ok(outcome)
    }

    /// Start embedding generation in the background
    ///
    /// Returns `false` if a run is already pending.
    pub fn trigger_embeddings(&mut self) -> bool {
        if self.embeddings == EmbeddingStatus::Pending {
            return false;
        }

        self.embeddings = EmbeddingStatus::Pending;
        let backend = Arc::clone(&self.backend);
        let events = self.events.clone();
        self.embed_task = Some(tokio::spawn(async move {
            let result = backend.trigger_embedding_generation().await;
            events.send(AppEvent::EmbeddingsFinished { result });
        }));
        true
    }

    /// Apply a completion event; returns whether anything consumed it
    pub fn handle_event(&mut self, event: AppEvent) -> bool {
        match event {
            AppEvent::EmbeddingsFinished { result } => {
                self.embed_task = None;
                self.embeddings = match result {
                    Ok(()) => {
                        tracing::info!("embedding generation succeeded");
                        EmbeddingStatus::Succeeded
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "embedding generation failed");
                        EmbeddingStatus::Failed(e.to_string())
                    }
                };
                true
            }
            AppEvent::GalleryLoaded { gallery, images } => match self.gallery.as_mut() {
                Some(current) if current.id() == gallery => {
                    current.apply(images);
                    true
                }
                _ => false,
            },
            other => self
                .catalog
                .as_mut()
                .is_some_and(|catalog| catalog.handle_event(other)),
        }
    }

    /// Whether no background work is outstanding
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.catalog.as_ref().is_none_or(BrowserViewModel::is_settled)
            && self.gallery.as_ref().is_none_or(|g| !g.is_loading())
            && self.embeddings != EmbeddingStatus::Pending
    }
}

impl Drop for AppState {
    fn drop(&mut self) {
        if let Some(task) = self.embed_task.take() {
            task.abort();
        }
    }
}
