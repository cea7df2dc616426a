//! Testing utilities for mmdbrowse
//!
//! This module provides a scripted in-memory backend with a call log, plus
//! helpers that pump completion events into the component under test until
//! it has no outstanding work.
//!
//! Only available when compiled with `cfg(test)`.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::app::AppState;
use crate::backend::{CatalogBackend, mime_for};
use crate::browse::BrowserViewModel;
use crate::catalog::{BackendError, CatalogKind, ContentRecord, MediaError, MediaPayload, MediaRef, Page};
use crate::events::{AppEvent, EventReceiver};
use crate::media::MediaCache;

/// One backend invocation, recorded when the call starts
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Call {
    List {
        kind: CatalogKind,
        page: usize,
        per_page: usize,
    },
    Search {
        kind: CatalogKind,
        query: String,
        limit: usize,
    },
    Media(String),
    Embeddings,
}

/// In-memory [`CatalogBackend`] with scripted latency and failures
///
/// Search matches records whose name or description contains the query,
/// case-insensitively, in catalog order.
#[derive(Default)]
pub struct ScriptedBackend {
    catalogs: Mutex<HashMap<CatalogKind, Vec<ContentRecord>>>,
    search_delays: HashMap<String, Duration>,
    media_delay: Duration,
    failing_media: HashSet<String>,
    failing_search: bool,
    failing_embeddings: Option<BackendError>,
    failing_listings: AtomicBool,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_catalog(self, kind: CatalogKind, records: Vec<ContentRecord>) -> Self {
        self.replace_catalog(kind, records);
        self
    }

    /// Swap the records served for `kind`, as if the catalog changed on the server
    ///
    /// # Panics
    /// Panics if the catalog mutex is poisoned.
    pub fn replace_catalog(&self, kind: CatalogKind, records: Vec<ContentRecord>) {
        self.catalogs.lock().expect("catalogs poisoned").insert(kind, records);
    }

    /// Delay the search for exactly `query`
    #[must_use]
    pub fn with_search_delay(mut self, query: &str, delay: Duration) -> Self {
        self.search_delays.insert(query.to_string(), delay);
        self
    }

    /// Delay every media resolution
    #[must_use]
    pub fn with_media_delay(mut self, delay: Duration) -> Self {
        self.media_delay = delay;
        self
    }

    /// Make resolving `reference` fail with `NotFound`
    #[must_use]
    pub fn with_failing_media(mut self, reference: &str) -> Self {
        self.failing_media.insert(reference.to_string());
        self
    }

    #[must_use]
    pub fn with_failing_search(mut self) -> Self {
        self.failing_search = true;
        self
    }

    #[must_use]
    pub fn with_failing_embeddings(mut self, error: BackendError) -> Self {
        self.failing_embeddings = Some(error);
        self
    }

    /// Toggle listing failures at runtime
    pub fn fail_listings(&self, fail: bool) {
        self.failing_listings.store(fail, Ordering::SeqCst);
    }

    /// Calls made so far, in start order
    ///
    /// # Panics
    /// Panics if the call log mutex is poisoned.
    #[must_use]
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().expect("call log poisoned").clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().expect("call log poisoned").push(call);
    }

    fn catalog(&self, kind: CatalogKind) -> Vec<ContentRecord> {
        self.catalogs
            .lock()
            .expect("catalogs poisoned")
            .get(&kind)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl CatalogBackend for ScriptedBackend {
    async fn list_catalog(
        &self,
        kind: CatalogKind,
        page: usize,
        per_page: usize,
    ) -> Result<Page<ContentRecord>, BackendError> {
        self.record(Call::List { kind, page, per_page });
        if self.failing_listings.load(Ordering::SeqCst) {
            return Err(BackendError::Transport("scripted listing failure".into()));
        }
        Ok(Page::paginate(&self.catalog(kind), page, per_page))
    }

    async fn search_catalog(
        &self,
        kind: CatalogKind,
        query: &str,
        limit: usize,
    ) -> Result<Vec<ContentRecord>, BackendError> {
        self.record(Call::Search {
            kind,
            query: query.to_string(),
            limit,
        });
        if let Some(delay) = self.search_delays.get(query) {
            tokio::time::sleep(*delay).await;
        }
        if self.failing_search {
            return Err(BackendError::Server("scripted search failure".into()));
        }

        let needle = query.to_lowercase();
        Ok(self
            .catalog(kind)
            .into_iter()
            .filter(|r| {
                r.name.to_lowercase().contains(&needle) || r.description.to_lowercase().contains(&needle)
            })
            .take(limit)
            .collect())
    }

    async fn resolve_media(&self, reference: &MediaRef) -> Result<MediaPayload, MediaError> {
        self.record(Call::Media(reference.to_string()));
        if !self.media_delay.is_zero() {
            tokio::time::sleep(self.media_delay).await;
        }
        if self.failing_media.contains(reference.as_str()) {
            return Err(MediaError::NotFound(reference.to_string()));
        }
        Ok(MediaPayload::new(
            mime_for(Path::new(reference.as_str())),
            reference.as_str().as_bytes().to_vec(),
        ))
    }

    async fn trigger_embedding_generation(&self) -> Result<(), BackendError> {
        self.record(Call::Embeddings);
        match &self.failing_embeddings {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }
}

/// `n` records with ids `{prefix}000`, `{prefix}001`, ... named "Record 0", "Record 1", ...
#[must_use]
pub fn records(prefix: &str, n: usize) -> Vec<ContentRecord> {
    (0..n)
        .map(|i| ContentRecord::new(format!("{prefix}{i:03}"), format!("Record {i}")))
        .collect()
}

/// Apply media completions to `cache` until none are outstanding
pub async fn drain_media(rx: &mut EventReceiver, cache: &mut MediaCache) {
    while cache.in_flight_count() > 0 {
        match rx.recv().await {
            Some(AppEvent::MediaLoaded { index, result, .. }) => cache.apply(index, result),
            Some(_) => {}
            None => break,
        }
    }
}

/// Feed events to `vm` until it is settled
pub async fn pump_view(vm: &mut BrowserViewModel, rx: &mut EventReceiver) {
    while !vm.is_settled() {
        match rx.recv().await {
            Some(event) => {
                vm.handle_event(event);
            }
            None => break,
        }
    }
}

/// Feed events to `app` until it is settled
pub async fn pump_app(app: &mut AppState, rx: &mut EventReceiver) {
    while !app.is_settled() {
        match rx.recv().await {
            Some(event) => {
                app.handle_event(event);
            }
            None => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_backend_logs_calls() {
        let backend = ScriptedBackend::new().with_catalog(CatalogKind::Motion, records("mo", 12));

        let page = backend.list_catalog(CatalogKind::Motion, 2, 5).await.unwrap();
        assert_eq!(page.data[0].id, "mo005");

        let hits = backend.search_catalog(CatalogKind::Motion, "record 1", 2).await.unwrap();
        assert_eq!(hits.len(), 2);

        assert_eq!(
            backend.calls(),
            vec![
                Call::List { kind: CatalogKind::Motion, page: 2, per_page: 5 },
                Call::Search { kind: CatalogKind::Motion, query: "record 1".into(), limit: 2 },
            ]
        );
    }

    #[tokio::test]
    async fn test_scripted_media_failure() {
        let backend = ScriptedBackend::new().with_failing_media("bad.png");
        assert!(backend.resolve_media(&MediaRef::new("bad.png")).await.is_err());

        let ok = backend.resolve_media(&MediaRef::new("ok.webp")).await.unwrap();
        assert_eq!(ok.mime, "image/webp");
    }
}
