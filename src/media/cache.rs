//! Per-card media cache
//!
//! Each card owns one [`MediaCache`] over its own list of media references.
//! Entries are fetched on demand, kept for the life of the card and never
//! evicted. An explicit in-flight table guarantees that an index is never
//! fetched twice concurrently.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::backend::CatalogBackend;
use crate::catalog::{MediaError, MediaPayload, MediaRef};
use crate::events::{AppEvent, EventSender, InstanceId};

/// What the cache can say about one index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaSlot<'a> {
    /// Never requested, or out of range
    Idle,
    /// A fetch is outstanding
    Loading,
    /// The last fetch failed
    Failed,
    /// Resolved payload
    Ready(&'a MediaPayload),
}

/// Lazily populated index → payload map for one card
pub struct MediaCache {
    card: InstanceId,
    refs: Vec<MediaRef>,
    entries: HashMap<usize, MediaPayload>,
    in_flight: HashMap<usize, JoinHandle<()>>,
    failed: HashSet<usize>,
    backend: Arc<dyn CatalogBackend>,
    events: EventSender,
}

impl MediaCache {
    /// Cache over `refs`; completions are posted as `MediaLoaded` for `card`
    #[must_use]
    pub fn new(
        card: InstanceId,
        refs: Vec<MediaRef>,
        backend: Arc<dyn CatalogBackend>,
        events: EventSender,
    ) -> Self {
        Self {
            card,
            refs,
            entries: HashMap::new(),
            in_flight: HashMap::new(),
            failed: HashSet::new(),
            backend,
            events,
        }
    }

    /// Number of references the cache covers
    #[must_use]
    pub fn len(&self) -> usize {
        self.refs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }

    /// Request `index` for display
    ///
    /// Returns the cached payload if there is one. Otherwise starts a fetch,
    /// unless one is already outstanding. A previously failed index is
    /// fetched again.
    pub fn get(&mut self, index: usize) -> MediaSlot<'_> {
        if index >= self.refs.len() {
            return MediaSlot::Idle;
        }
        if !self.entries.contains_key(&index) && !self.in_flight.contains_key(&index) {
            self.failed.remove(&index);
            self.spawn_fetch(index);
        }
        self.slot(index)
    }

    /// Read-ahead request for `index`
    ///
    /// Like [`get`](Self::get), except that a failed index stays failed until
    /// the user navigates to it.
    pub fn preload(&mut self, index: usize) {
        if index < self.refs.len()
            && !self.entries.contains_key(&index)
            && !self.in_flight.contains_key(&index)
            && !self.failed.contains(&index)
        {
            self.spawn_fetch(index);
        }
    }

    /// Current state of `index` without triggering a fetch
    #[must_use]
    pub fn slot(&self, index: usize) -> MediaSlot<'_> {
        if let Some(payload) = self.entries.get(&index) {
            MediaSlot::Ready(payload)
        } else if self.in_flight.contains_key(&index) {
            MediaSlot::Loading
        } else if self.failed.contains(&index) {
            MediaSlot::Failed
        } else {
            MediaSlot::Idle
        }
    }

    /// Whether `index` has a resolved payload
    #[must_use]
    pub fn has(&self, index: usize) -> bool {
        self.entries.contains_key(&index)
    }

    /// Whether a fetch for `index` is outstanding
    #[must_use]
    pub fn is_loading(&self, index: usize) -> bool {
        self.in_flight.contains_key(&index)
    }

    /// Number of outstanding fetches
    #[must_use]
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    /// Forget everything known about `index`, aborting any outstanding fetch
    pub fn invalidate(&mut self, index: usize) {
        self.entries.remove(&index);
        self.failed.remove(&index);
        if let Some(task) = self.in_flight.remove(&index) {
            task.abort();
        }
    }

    /// Record the outcome of a fetch for `index`
    ///
    /// Outcomes for fetches that are no longer outstanding (invalidated) are ignored.
    pub fn apply(&mut self, index: usize, result: Result<MediaPayload, MediaError>) {
        if self.in_flight.remove(&index).is_none() {
            tracing::trace!(card = %self.card, index, "ignoring media result for cancelled fetch");
            return;
        }

        match result {
            Ok(payload) => {
                self.entries.insert(index, payload);
            }
            Err(e) => {
                tracing::warn!(card = %self.card, index, error = %e, "failed to load media");
                self.failed.insert(index);
            }
        }
    }

    fn spawn_fetch(&mut self, index: usize) {
        let Some(reference) = self.refs.get(index).cloned() else {
            return;
        };
        tracing::debug!(card = %self.card, index, %reference, "fetching media");

        let backend = Arc::clone(&self.backend);
        let events = self.events.clone();
        let card = self.card;
        let task = tokio::spawn(async move {
            let result = backend.resolve_media(&reference).await;
            events.send(AppEvent::MediaLoaded { card, index, result });
        });
        self.in_flight.insert(index, task);
    }
}

impl Drop for MediaCache {
    fn drop(&mut self) {
        for (_, task) in self.in_flight.drain() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Call, ScriptedBackend, drain_media};
    use std::time::Duration;

    fn refs(n: usize) -> Vec<MediaRef> {
        (0..n).map(|i| MediaRef::new(format!("shot{i}.png"))).collect()
    }

    fn cache(backend: &Arc<ScriptedBackend>, n: usize) -> (MediaCache, crate::events::EventReceiver) {
        let (events, rx) = EventSender::channel();
        let cache = MediaCache::new(InstanceId::next(), refs(n), backend.clone(), events);
        (cache, rx)
    }

    #[tokio::test(start_paused = true)]
    async fn test_duplicate_get_issues_one_fetch() {
        let backend = Arc::new(ScriptedBackend::new().with_media_delay(Duration::from_millis(50)));
        let (mut cache, mut rx) = cache(&backend, 3);

        assert_eq!(cache.get(1), MediaSlot::Loading);
        assert_eq!(cache.get(1), MediaSlot::Loading);
        assert_eq!(cache.in_flight_count(), 1);

        drain_media(&mut rx, &mut cache).await;
        assert!(cache.has(1));
        assert_eq!(backend.calls(), vec![Call::Media("shot1.png".into())]);

        assert!(matches!(cache.get(1), MediaSlot::Ready(_)));
        assert_eq!(backend.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_index_retried_only_on_get() {
        let backend = Arc::new(ScriptedBackend::new().with_failing_media("shot0.png"));
        let (mut cache, mut rx) = cache(&backend, 2);

        cache.get(0);
        drain_media(&mut rx, &mut cache).await;
        assert_eq!(cache.slot(0), MediaSlot::Failed);

        cache.preload(0);
        assert_eq!(cache.slot(0), MediaSlot::Failed);
        assert_eq!(backend.calls().len(), 1);

        assert_eq!(cache.get(0), MediaSlot::Loading);
        drain_media(&mut rx, &mut cache).await;
        assert_eq!(backend.calls().len(), 2);
        assert_eq!(cache.slot(0), MediaSlot::Failed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidate_discards_late_result() {
        let backend = Arc::new(ScriptedBackend::new().with_media_delay(Duration::from_millis(50)));
        let (mut cache, _rx) = cache(&backend, 1);

        cache.get(0);
        cache.invalidate(0);
        cache.apply(0, Ok(MediaPayload::new("image/png", b"late".to_vec())));

        assert_eq!(cache.slot(0), MediaSlot::Idle);
        assert_eq!(cache.in_flight_count(), 0);
    }

    #[tokio::test]
    async fn test_out_of_range_get_is_idle() {
        let backend = Arc::new(ScriptedBackend::new());
        let (mut cache, _rx) = cache(&backend, 2);

        assert_eq!(cache.get(5), MediaSlot::Idle);
        assert!(backend.calls().is_empty());
    }
}
