//! Paged catalog listing
//!
//! [`PagedQuery`] owns the `(page, per_page)` position of one catalog view and
//! the last page the backend returned. Page controls are refused while a
//! request is outstanding, so at most one listing is ever in flight per view.

use std::sync::Arc;
use tokio::task::JoinHandle;

use super::{BrowseError, Result};
use crate::backend::CatalogBackend;
use crate::catalog::{BackendError, CatalogKind, ContentRecord, FALLBACK_PER_PAGE, Page};
use crate::events::{AppEvent, EventSender, InstanceId};

/// One element of the pager button row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagerItem {
    /// A page button; `current` marks the highlighted one
    Page { number: usize, current: bool },
    /// "..." gap
    Ellipsis,
}

/// Pager buttons for `page` of `total_pages`
///
/// Up to five pages centred on the current one, plus the first and last page
/// with an ellipsis when they are not adjacent to that window.
#[must_use]
pub fn page_window(page: usize, total_pages: usize) -> Vec<PagerItem> {
    let mut items = Vec::new();
    if total_pages == 0 {
        return items;
    }

    let button = |number: usize| PagerItem::Page {
        number,
        current: number == page,
    };

    if page > 3 {
        items.push(button(1));
        if page > 4 {
            items.push(PagerItem::Ellipsis);
        }
    }

    let first = page.saturating_sub(2).max(1);
    let last = (page + 2).min(total_pages);
    items.extend((first..=last).map(button));

    if page + 2 < total_pages {
        if page + 3 < total_pages {
            items.push(PagerItem::Ellipsis);
        }
        items.push(button(total_pages));
    }

    items
}

/// Page state machine for one catalog view
pub struct PagedQuery {
    view: InstanceId,
    kind: CatalogKind,
    page: usize,
    per_page: usize,
    current: Option<Page<ContentRecord>>,
    loading: bool,
    seq: u64,
    last_error: Option<BackendError>,
    task: Option<JoinHandle<()>>,
    backend: Arc<dyn CatalogBackend>,
    events: EventSender,
}

impl PagedQuery {
    /// Create the query positioned on page 1; nothing is fetched until [`start`](Self::start)
    #[must_use]
    pub fn new(
        view: InstanceId,
        kind: CatalogKind,
        per_page: usize,
        backend: Arc<dyn CatalogBackend>,
        events: EventSender,
    ) -> Self {
        Self {
            view,
            kind,
            page: 1,
            per_page: if per_page == 0 { FALLBACK_PER_PAGE } else { per_page },
            current: None,
            loading: false,
            seq: 0,
            last_error: None,
            task: None,
            backend,
            events,
        }
    }

    /// Issue the initial fetch
    ///
    /// # Errors
    ///
    /// Returns `BrowseError::Busy` if a fetch is already in flight.
    pub fn start(&mut self) -> Result<()> {
        self.refresh()
    }

    /// Re-fetch the current `(page, per_page)`
    ///
    /// # Errors
    ///
    /// Returns `BrowseError::Busy` if a fetch is already in flight.
    pub fn refresh(&mut self) -> Result<()> {
        self.ensure_idle()?;
        self.fetch();
        Ok(())
    }

    /// Move to `page`
    ///
    /// Selecting the page already shown does nothing.
    ///
    /// # Errors
    ///
    /// Returns `BrowseError::Busy` while a fetch is in flight and
    /// `BrowseError::PageOutOfRange` for a page outside `[1, total_pages]`.
    /// The position is unchanged in both cases.
    pub fn go_to_page(&mut self, page: usize) -> Result<()> {
        self.ensure_idle()?;

        let in_range = self
            .current
            .as_ref()
            .map_or(page == 1, |shown| shown.contains_page(page));
        if !in_range {
            let last = self.last_page();
            tracing::debug!(kind = %self.kind, page, last, "page change rejected");
            return Err(BrowseError::PageOutOfRange { page, last });
        }
        if page == self.page {
            return Ok(());
        }

        self.page = page;
        self.fetch();
        Ok(())
    }

    /// Previous page, if there is one
    ///
    /// # Errors
    ///
    /// See [`go_to_page`](Self::go_to_page).
    pub fn prev_page(&mut self) -> Result<()> {
        self.go_to_page(self.page.saturating_sub(1))
    }

    /// Next page, if there is one
    ///
    /// # Errors
    ///
    /// See [`go_to_page`](Self::go_to_page).
    pub fn next_page(&mut self) -> Result<()> {
        self.go_to_page(self.page + 1)
    }

    /// Change the page size and go back to page 1
    ///
    /// Any positive size is accepted, not only the sizes offered in the UI.
    ///
    /// # Errors
    ///
    /// Returns `BrowseError::Busy` while a fetch is in flight and
    /// `BrowseError::InvalidPageSize` for 0.
    pub fn set_per_page(&mut self, per_page: usize) -> Result<()> {
        self.ensure_idle()?;
        if per_page == 0 {
            return Err(BrowseError::InvalidPageSize);
        }
        if per_page == self.per_page {
            return Ok(());
        }

        self.per_page = per_page;
        self.page = 1;
        self.fetch();
        Ok(())
    }

    /// Apply a listing completion
    ///
    /// Returns `false` if the completion is not for the latest request. On
    /// failure the displayed page is kept and the position reverts to it.
    pub fn apply(&mut self, seq: u64, result: std::result::Result<Page<ContentRecord>, BackendError>) -> bool {
        if seq != self.seq || !self.loading {
            tracing::debug!(kind = %self.kind, seq, current = self.seq, "discarding stale page");
            return false;
        }

        self.loading = false;
        self.task = None;

        match result {
            Ok(page) => {
                tracing::debug!(
                    kind = %self.kind,
                    page = page.page,
                    per_page = page.per_page,
                    records = page.data.len(),
                    total = page.total,
                    "page loaded"
                );
                self.page = page.page.max(1);
                self.per_page = page.per_page;
                self.current = Some(page);
                self.last_error = None;
            }
            Err(e) => {
                tracing::warn!(kind = %self.kind, page = self.page, error = %e, "failed to load page");
                if let Some(shown) = &self.current {
                    self.page = shown.page.max(1);
                    self.per_page = shown.per_page;
                }
                self.last_error = Some(e);
            }
        }
        true
    }

    #[must_use]
    pub const fn kind(&self) -> CatalogKind {
        self.kind
    }

    /// 1-based page number
    #[must_use]
    pub const fn page(&self) -> usize {
        self.page
    }

    #[must_use]
    pub const fn per_page(&self) -> usize {
        self.per_page
    }

    /// The last page the backend returned
    #[must_use]
    pub const fn current(&self) -> Option<&Page<ContentRecord>> {
        self.current.as_ref()
    }

    /// Records of the displayed page (empty before the first load)
    #[must_use]
    pub fn records(&self) -> &[ContentRecord] {
        self.current.as_ref().map_or(&[], |p| p.data.as_slice())
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.current.as_ref().map_or(0, |p| p.total)
    }

    #[must_use]
    pub fn total_pages(&self) -> usize {
        self.current.as_ref().map_or(0, |p| p.total_pages)
    }

    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.loading
    }

    /// Error of the most recent failed fetch, cleared by the next success
    #[must_use]
    pub const fn last_error(&self) -> Option<&BackendError> {
        self.last_error.as_ref()
    }

    /// Whether the previous-page control is enabled
    #[must_use]
    pub const fn can_go_prev(&self) -> bool {
        !self.loading && self.page > 1
    }

    /// Whether the next-page control is enabled
    #[must_use]
    pub fn can_go_next(&self) -> bool {
        !self.loading && self.page < self.total_pages()
    }

    /// 1-based `(first, last, total)` record positions of the displayed page
    #[must_use]
    pub fn showing_range(&self) -> Option<(usize, usize, usize)> {
        let page = self.current.as_ref()?;
        if page.total == 0 {
            return None;
        }
        let number = page.page.max(1);
        let first = (number - 1).saturating_mul(page.per_page).saturating_add(1);
        let last = number.saturating_mul(page.per_page).min(page.total);
        Some((first, last, page.total))
    }

    /// "Showing X to Y of Z"
    #[must_use]
    pub fn showing_label(&self) -> Option<String> {
        self.showing_range()
            .map(|(first, last, total)| format!("Showing {first} to {last} of {total}"))
    }

    /// Pager buttons for the current position
    #[must_use]
    pub fn pager(&self) -> Vec<PagerItem> {
        page_window(self.page, self.total_pages())
    }

    fn last_page(&self) -> usize {
        self.total_pages().max(1)
    }

    fn ensure_idle(&self) -> Result<()> {
        if self.loading {
            Err(BrowseError::Busy)
        } else {
            Ok(())
        }
    }

    fn fetch(&mut self) {
        self.seq += 1;
        self.loading = true;

        let (view, seq, kind, page, per_page) = (self.view, self.seq, self.kind, self.page, self.per_page);
        tracing::debug!(%kind, page, per_page, seq, "fetching page");

        let backend = Arc::clone(&self.backend);
        let events = self.events.clone();
        self.task = Some(tokio::spawn(async move {
            let result = backend.list_catalog(kind, page, per_page).await;
            events.send(AppEvent::PageLoaded { view, seq, result });
        }));
    }
}

impl Drop for PagedQuery {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
