//! Completion events
//!
//! Background tasks never touch view state. They post an [`AppEvent`] back to
//! the owner of that state, which applies it on its own thread through the
//! various `handle_event` methods. Each event names the component instance it
//! is addressed to so that completions for torn-down components fall on the
//! floor.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::catalog::{BackendError, ContentRecord, MediaError, MediaPayload, Page};

static NEXT_INSTANCE: AtomicU64 = AtomicU64::new(1);

/// Identity of a mounted component (catalog view, card, gallery)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(u64);

impl InstanceId {
    /// Allocate a process-wide unique id
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_INSTANCE.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Outcome of one gallery image load, by media index
pub type GalleryImage = (usize, Result<MediaPayload, MediaError>);

/// Completion posted by a background task
#[derive(Debug)]
pub enum AppEvent {
    /// A catalog listing finished
    PageLoaded {
        view: InstanceId,
        seq: u64,
        result: Result<Page<ContentRecord>, BackendError>,
    },

    /// The search debounce period elapsed without further input
    SearchDue { view: InstanceId, seq: u64 },

    /// A semantic search finished
    SearchCompleted {
        view: InstanceId,
        seq: u64,
        result: Result<Vec<ContentRecord>, BackendError>,
    },

    /// One card media item resolved (or failed)
    MediaLoaded {
        card: InstanceId,
        index: usize,
        result: Result<MediaPayload, MediaError>,
    },

    /// The detail gallery finished its bulk load
    GalleryLoaded {
        gallery: InstanceId,
        images: Vec<GalleryImage>,
    },

    /// Embedding generation finished
    EmbeddingsFinished { result: Result<(), BackendError> },
}

impl AppEvent {
    /// Short name for log lines
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::PageLoaded { .. } => "page_loaded",
            Self::SearchDue { .. } => "search_due",
            Self::SearchCompleted { .. } => "search_completed",
            Self::MediaLoaded { .. } => "media_loaded",
            Self::GalleryLoaded { .. } => "gallery_loaded",
            Self::EmbeddingsFinished { .. } => "embeddings_finished",
        }
    }
}

/// Receiving half, drained by the state owner
pub type EventReceiver = UnboundedReceiver<AppEvent>;

/// Cloneable handle background tasks use to post completions
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: UnboundedSender<AppEvent>,
}

impl EventSender {
    /// Create a connected sender/receiver pair
    #[must_use]
    pub fn channel() -> (Self, EventReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Post an event. If the owner is gone the event is dropped and logged.
    pub fn send(&self, event: AppEvent) {
        if let Err(e) = self.tx.send(event) {
            tracing::debug!(event = e.0.name(), "event receiver closed, dropping event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instance_ids_are_unique_and_increasing() {
        let a = InstanceId::next();
        let b = InstanceId::next();
        assert_ne!(a, b);
        assert!(b > a);
    }

    #[tokio::test]
    async fn test_send_delivers_in_order() {
        let (tx, mut rx) = EventSender::channel();
        let view = InstanceId::next();
        tx.send(AppEvent::SearchDue { view, seq: 1 });
        tx.send(AppEvent::SearchDue { view, seq: 2 });

        assert!(matches!(rx.recv().await, Some(AppEvent::SearchDue { seq: 1, .. })));
        assert!(matches!(rx.recv().await, Some(AppEvent::SearchDue { seq: 2, .. })));
    }

    #[test]
    fn test_send_after_receiver_dropped_does_not_panic() {
        let (tx, rx) = EventSender::channel();
        drop(rx);
        tx.send(AppEvent::EmbeddingsFinished { result: Ok(()) });
    }
}
