//! Debounced semantic search
//!
//! Every keystroke restarts a quiet-period timer; the backend is only called
//! once input has been stable for the whole period. Each scheduled call gets a
//! sequence number and only the completion carrying the latest number is ever
//! applied, so a slow superseded search can never overwrite a newer one.
//!
//! Superseded in-flight calls are also aborted unless
//! `abort_superseded_search` is turned off, in which case they run to
//! completion and their results are discarded on arrival.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::backend::CatalogBackend;
use crate::catalog::{BackendError, CatalogKind, ContentRecord};
use crate::config::BrowseConfig;
use crate::events::{AppEvent, EventSender, InstanceId};

/// Search settings taken from the browse configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    /// Quiet period before a query is sent
    pub debounce: Duration,
    /// Result cap passed through to the backend
    pub limit: usize,
    /// Abort a superseded in-flight call instead of only ignoring its result
    pub abort_superseded: bool,
}

impl From<&BrowseConfig> for SearchOptions {
    fn from(config: &BrowseConfig) -> Self {
        Self {
            debounce: config.search_debounce(),
            limit: config.search_limit,
            abort_superseded: config.abort_superseded_search,
        }
    }
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self::from(&BrowseConfig::default())
    }
}

/// Search state for one catalog view
pub struct SearchSession {
    view: InstanceId,
    kind: CatalogKind,
    options: SearchOptions,
    query: String,
    seq: u64,
    searching: bool,
    results: Option<Vec<ContentRecord>>,
    last_error: Option<BackendError>,
    timer: Option<JoinHandle<()>>,
    in_flight: Option<JoinHandle<()>>,
    backend: Arc<dyn CatalogBackend>,
    events: EventSender,
}

impl SearchSession {
    #[must_use]
    pub fn new(
        view: InstanceId,
        kind: CatalogKind,
        options: SearchOptions,
        backend: Arc<dyn CatalogBackend>,
        events: EventSender,
    ) -> Self {
        Self {
            view,
            kind,
            options,
            query: String::new(),
            seq: 0,
            searching: false,
            results: None,
            last_error: None,
            timer: None,
            in_flight: None,
            backend,
            events,
        }
    }

    /// Update the search text
    ///
    /// A blank query leaves search mode immediately. Anything else (re)starts
    /// the debounce timer; earlier pending or in-flight searches are superseded.
    pub fn set_query(&mut self, text: impl Into<String>) {
        self.query = text.into();
        self.supersede();

        if self.query.trim().is_empty() {
            self.results = None;
            self.last_error = None;
            return;
        }

        let (view, seq, debounce) = (self.view, self.seq, self.options.debounce);
        let events = self.events.clone();
        self.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            events.send(AppEvent::SearchDue { view, seq });
        }));
    }

    /// Leave search mode and empty the search box
    ///
    /// Takes effect at once; any pending or in-flight search is superseded.
    pub fn clear(&mut self) {
        self.query.clear();
        self.supersede();
        self.results = None;
        self.last_error = None;
    }

    /// The debounce period for `seq` elapsed; issue the search if still current
    pub fn handle_due(&mut self, seq: u64) -> bool {
        if seq != self.seq {
            return false;
        }
        self.timer = None;
        self.searching = true;

        let (view, kind, limit) = (self.view, self.kind, self.options.limit);
        let query = self.query.clone();
        tracing::debug!(%kind, query = %query, seq, "issuing search");

        let backend = Arc::clone(&self.backend);
        let events = self.events.clone();
        self.in_flight = Some(tokio::spawn(async move {
            let result = backend.search_catalog(kind, &query, limit).await;
            events.send(AppEvent::SearchCompleted { view, seq, result });
        }));
        true
    }

    /// Apply a search completion
    ///
    /// Returns `false` for a superseded search. A failed search still enters
    /// search mode, with no results and the error recorded.
    pub fn apply(&mut self, seq: u64, result: Result<Vec<ContentRecord>, BackendError>) -> bool {
        if seq != self.seq || !self.searching {
            tracing::debug!(kind = %self.kind, seq, current = self.seq, "discarding stale search results");
            return false;
        }

        self.searching = false;
        self.in_flight = None;

        match result {
            Ok(records) => {
                tracing::debug!(kind = %self.kind, results = records.len(), "search completed");
                self.results = Some(records);
                self.last_error = None;
            }
            Err(e) => {
                tracing::warn!(kind = %self.kind, query = %self.query, error = %e, "search failed");
                self.results = Some(Vec::new());
                self.last_error = Some(e);
            }
        }
        true
    }

    /// Current search box text
    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Whether search results supersede the paged listing
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.results.is_some()
    }

    /// Whether a search call is outstanding
    #[must_use]
    pub const fn is_searching(&self) -> bool {
        self.searching
    }

    /// Whether a debounce timer is running
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.timer.is_some()
    }

    /// Whether nothing is scheduled or outstanding
    #[must_use]
    pub const fn is_settled(&self) -> bool {
        !self.searching && self.timer.is_none()
    }

    #[must_use]
    pub fn results(&self) -> Option<&[ContentRecord]> {
        self.results.as_deref()
    }

    #[must_use]
    pub const fn last_error(&self) -> Option<&BackendError> {
        self.last_error.as_ref()
    }

    /// "N results found" while search mode is active
    #[must_use]
    pub fn result_label(&self) -> Option<String> {
        self.results.as_ref().map(|r| {
            let n = r.len();
            format!("{n} result{} found", if n == 1 { "" } else { "s" })
        })
    }

    fn supersede(&mut self) {
        self.seq += 1;
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        if let Some(task) = self.in_flight.take()
            && self.options.abort_superseded
        {
            tracing::debug!(kind = %self.kind, "aborting superseded search");
            task.abort();
        }
        self.searching = false;
    }
}

impl Drop for SearchSession {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        if let Some(task) = self.in_flight.take() {
            task.abort();
        }
    }
}
