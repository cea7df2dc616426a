//! Catalog view model
//!
//! Combines the paged listing and the search session of one catalog view
//! into a single answer to "what should the grid show", and keeps one
//! [`CardMedia`] per displayed record.

use std::collections::HashMap;
use std::sync::Arc;

use super::paged::{PagedQuery, PagerItem};
use super::search::{SearchOptions, SearchSession};
use super::{BrowseError, Result};
use crate::backend::CatalogBackend;
use crate::catalog::{BackendError, CatalogKind, ContentRecord};
use crate::config::BrowseConfig;
use crate::events::{AppEvent, EventSender, InstanceId};
use crate::media::{CardInput, CardMedia, CardOutcome};

/// Top-level render decision for the grid area
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridState {
    /// Nothing has loaded yet ("Loading models...")
    InitialLoading,
    /// A search call is outstanding ("Searching with AI...")
    Searching,
    /// Nothing to show; `searching` selects the "no results for your search" wording
    Empty { searching: bool },
    /// Cards are shown
    Records,
}

/// State of one mounted catalog view
pub struct BrowserViewModel {
    id: InstanceId,
    kind: CatalogKind,
    paged: PagedQuery,
    search: SearchSession,
    cards: Vec<CardMedia>,
    preview_media: bool,
    page_sizes: Vec<usize>,
    backend: Arc<dyn CatalogBackend>,
    events: EventSender,
}

impl BrowserViewModel {
    /// Mount the view for `kind` and request its first page
    #[must_use]
    pub fn mount(
        kind: CatalogKind,
        config: &BrowseConfig,
        backend: Arc<dyn CatalogBackend>,
        events: EventSender,
    ) -> Self {
        let id = InstanceId::next();
        let mut paged = PagedQuery::new(
            id,
            kind,
            config.default_per_page,
            Arc::clone(&backend),
            events.clone(),
        );
        if let Err(e) = paged.start() {
            tracing::warn!(%kind, error = %e, "initial page request refused");
        }

        let search = SearchSession::new(
            id,
            kind,
            SearchOptions::from(config),
            Arc::clone(&backend),
            events.clone(),
        );

        tracing::debug!(%kind, view = %id, "catalog view mounted");
        Self {
            id,
            kind,
            paged,
            search,
            cards: Vec::new(),
            preview_media: config.preview_media,
            page_sizes: config.page_sizes.clone(),
            backend,
            events,
        }
    }

    #[must_use]
    pub const fn id(&self) -> InstanceId {
        self.id
    }

    #[must_use]
    pub const fn kind(&self) -> CatalogKind {
        self.kind
    }

    #[must_use]
    pub const fn paged(&self) -> &PagedQuery {
        &self.paged
    }

    #[must_use]
    pub const fn search(&self) -> &SearchSession {
        &self.search
    }

    /// Page sizes offered by the selector
    #[must_use]
    pub fn page_sizes(&self) -> &[usize] {
        &self.page_sizes
    }

    /// Records to render: search results in search mode, else the current page
    #[must_use]
    pub fn display(&self) -> &[ContentRecord] {
        self.search.results().unwrap_or_else(|| self.paged.records())
    }

    /// Loading indicator for the active mode
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        if self.search.is_active() {
            self.search.is_searching()
        } else {
            self.paged.is_loading()
        }
    }

    /// Pagination controls are hidden in search mode
    #[must_use]
    pub const fn show_pagination(&self) -> bool {
        !self.search.is_active()
    }

    /// Error behind the current mode's last failed call
    #[must_use]
    pub const fn last_error(&self) -> Option<&BackendError> {
        if self.search.is_active() {
            self.search.last_error()
        } else {
            self.paged.last_error()
        }
    }

    #[must_use]
    pub fn grid_state(&self) -> GridState {
        if self.paged.is_loading() && self.paged.current().is_none() && !self.search.is_active() {
            GridState::InitialLoading
        } else if self.search.is_searching() {
            GridState::Searching
        } else if self.display().is_empty() {
            GridState::Empty {
                searching: self.search.is_active(),
            }
        } else {
            GridState::Records
        }
    }

    /// Pager buttons, or nothing in search mode
    #[must_use]
    pub fn pager(&self) -> Vec<PagerItem> {
        if self.show_pagination() {
            self.paged.pager()
        } else {
            Vec::new()
        }
    }

    /// Cards for the displayed records, in display order
    #[must_use]
    pub fn cards(&self) -> &[CardMedia] {
        &self.cards
    }

    /// Type into the search box
    pub fn set_query(&mut self, text: impl Into<String>) {
        self.search.set_query(text);
        self.sync_cards();
    }

    /// "Clear search" button
    pub fn clear_search(&mut self) {
        self.search.clear();
        self.sync_cards();
    }

    /// Pager button
    ///
    /// # Errors
    ///
    /// Returns `BrowseError` if search mode is active, a fetch is in flight, or
    /// `page` is out of range.
    pub fn go_to_page(&mut self, page: usize) -> Result<()> {
        self.ensure_paging()?;
        self.paged.go_to_page(page)
    }

    /// Page-size selector
    ///
    /// # Errors
    ///
    /// Returns `BrowseError` if search mode is active, a fetch is in flight, or
    /// `per_page` is 0.
    pub fn set_per_page(&mut self, per_page: usize) -> Result<()> {
        self.ensure_paging()?;
        self.paged.set_per_page(per_page)
    }

    /// "Refresh" button: re-fetch the current page
    ///
    /// # Errors
    ///
    /// Returns `BrowseError` if search mode is active or a fetch is in flight.
    pub fn refresh(&mut self) -> Result<()> {
        self.ensure_paging()?;
        self.paged.refresh()
    }

    /// Forward input to the card at display `position`
    ///
    /// # Errors
    ///
    /// Returns `BrowseError::NoSuchCard` if there is no card at `position`.
    pub fn card_input(&mut self, position: usize, input: CardInput) -> Result<CardOutcome> {
        let card = self
            .cards
            .get_mut(position)
            .ok_or(BrowseError::NoSuchCard(position))?;
        Ok(card.input(input))
    }

    /// Apply a completion event; returns whether it belonged to this view
    pub fn handle_event(&mut self, event: AppEvent) -> bool {
        match event {
            AppEvent::PageLoaded { view, seq, result } if view == self.id => {
                if self.paged.apply(seq, result) {
                    self.sync_cards();
                }
                true
            }
            AppEvent::SearchDue { view, seq } if view == self.id => {
                self.search.handle_due(seq);
                true
            }
            AppEvent::SearchCompleted { view, seq, result } if view == self.id => {
                if self.search.apply(seq, result) {
                    self.sync_cards();
                }
                true
            }
            AppEvent::MediaLoaded { card, index, result } => {
                match self.cards.iter_mut().find(|c| c.id() == card) {
                    Some(target) => {
                        target.apply_media(index, result);
                        true
                    }
                    None => false,
                }
            }
            _ => false,
        }
    }

    /// Whether no request, timer or media fetch is outstanding
    #[must_use]
    pub fn is_settled(&self) -> bool {
        !self.paged.is_loading() && self.search.is_settled() && self.cards.iter().all(CardMedia::is_settled)
    }

    fn ensure_paging(&self) -> Result<()> {
        if self.search.is_active() {
            Err(BrowseError::SearchActive)
        } else {
            Ok(())
        }
    }

    /// Rebuild the card list for the current display
    ///
    /// A card survives when its record is still shown with the same media; it
    /// then takes the fresh copy of the record. Anything else gets a new card.
    fn sync_cards(&mut self) {
        let mut existing: HashMap<String, CardMedia> = self
            .cards
            .drain(..)
            .map(|c| (c.record().id.clone(), c))
            .collect();

        let records: Vec<ContentRecord> = self.display().to_vec();
        let mut cards = Vec::with_capacity(records.len());
        for record in records {
            let card = match existing.remove(&record.id) {
                Some(mut card) if card.shows_same_media(&record) => {
                    card.refresh_record(record);
                    card
                }
                _ => {
                    let mut card = CardMedia::new(record, Arc::clone(&self.backend), self.events.clone());
                    if self.preview_media {
                        card.load();
                    }
                    card
                }
            };
            cards.push(card);
        }
        self.cards = cards;
    }
}
