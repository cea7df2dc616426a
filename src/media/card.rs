//! Card preview state
//!
//! A [`CardMedia`] is the stateful part of one grid card: it picks the media
//! mode once, owns the carousel and the media cache, and turns user input into
//! fetches. Navigation never opens the detail view; only [`CardInput::Activate`]
//! does.

use std::sync::Arc;

use super::cache::{MediaCache, MediaSlot};
use super::carousel::{CarouselController, CarouselState};
use crate::backend::CatalogBackend;
use crate::catalog::{ContentRecord, MediaError, MediaPayload, MediaRef};
use crate::events::{EventSender, InstanceId};

/// Which media a card shows, fixed when the card is created
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaMode {
    /// First video reference only; screenshots are never fetched
    Video,
    /// Screenshot carousel
    Screenshots,
    /// Nothing to show
    None,
}

impl MediaMode {
    fn for_record(record: &ContentRecord) -> Self {
        if record.has_video() {
            Self::Video
        } else if record.screenshots.is_empty() {
            Self::None
        } else {
            Self::Screenshots
        }
    }
}

/// User input on a card
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardInput {
    /// Next-arrow
    Next,
    /// Previous-arrow
    Prev,
    /// Dot indicator `i`
    Jump(usize),
    /// Click on the card body
    Activate,
}

/// Result of handling a [`CardInput`]
#[derive(Debug, Clone, PartialEq)]
pub enum CardOutcome {
    /// The carousel moved to this index
    Navigated(usize),
    /// Input had no effect (no controls, or out-of-range jump)
    Ignored,
    /// The card body was clicked; open the detail view for this record
    OpenDetail(Box<ContentRecord>),
}

/// Render state of the card's preview area
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardPreview<'a> {
    /// The record has no screenshots and no video
    NoMedia,
    /// Media exists but has not been requested
    Idle,
    Loading,
    /// "Failed to load"
    Failed,
    Ready(&'a MediaPayload),
}

/// Preview state of one card
pub struct CardMedia {
    id: InstanceId,
    record: ContentRecord,
    mode: MediaMode,
    carousel: CarouselController,
    cache: MediaCache,
}

impl CardMedia {
    /// Build the card for `record` without fetching anything yet
    #[must_use]
    pub fn new(record: ContentRecord, backend: Arc<dyn CatalogBackend>, events: EventSender) -> Self {
        let id = InstanceId::next();
        let mode = MediaMode::for_record(&record);

        let (refs, carousel_len): (Vec<MediaRef>, usize) = match mode {
            MediaMode::Video => (record.video.iter().take(1).cloned().collect(), 0),
            MediaMode::Screenshots => (record.screenshots.clone(), record.screenshots.len()),
            MediaMode::None => (Vec::new(), 0),
        };

        Self {
            id,
            record,
            mode,
            carousel: CarouselController::new(carousel_len),
            cache: MediaCache::new(id, refs, backend, events),
        }
    }

    /// Start fetching the initial media
    pub fn load(&mut self) {
        match self.mode {
            MediaMode::Video => {
                self.cache.get(0);
            }
            MediaMode::Screenshots => self.load_active(),
            MediaMode::None => {}
        }
    }

    #[must_use]
    pub const fn id(&self) -> InstanceId {
        self.id
    }

    #[must_use]
    pub const fn record(&self) -> &ContentRecord {
        &self.record
    }

    #[must_use]
    pub const fn mode(&self) -> MediaMode {
        self.mode
    }

    #[must_use]
    pub const fn carousel(&self) -> &CarouselController {
        &self.carousel
    }

    #[must_use]
    pub const fn carousel_state(&self) -> CarouselState {
        self.carousel.state()
    }

    /// The card's media cache
    #[must_use]
    pub const fn cache(&self) -> &MediaCache {
        &self.cache
    }

    /// Whether `record` references exactly the media this card was built for
    #[must_use]
    pub fn shows_same_media(&self, record: &ContentRecord) -> bool {
        self.record.video == record.video && self.record.screenshots == record.screenshots
    }

    /// Adopt a newer copy of the record, keeping carousel position and cached media
    ///
    /// Callers must check [`shows_same_media`](Self::shows_same_media) first.
    pub fn refresh_record(&mut self, record: ContentRecord) {
        debug_assert!(self.shows_same_media(&record));
        self.record = record;
    }

    /// Handle a click or key on the card
    pub fn input(&mut self, input: CardInput) -> CardOutcome {
        let moved = match input {
            CardInput::Activate => {
                return CardOutcome::OpenDetail(Box::new(self.record.clone()));
            }
            _ if !self.carousel.shows_controls() => None,
            CardInput::Next => Some(self.carousel.next()),
            CardInput::Prev => Some(self.carousel.prev()),
            CardInput::Jump(i) => self.carousel.jump(i).then(|| self.carousel.index()),
        };

        match moved {
            Some(index) => {
                self.load_active();
                CardOutcome::Navigated(index)
            }
            None => CardOutcome::Ignored,
        }
    }

    /// What the preview area should show right now
    #[must_use]
    pub fn preview(&self) -> CardPreview<'_> {
        let index = match self.mode {
            MediaMode::None => return CardPreview::NoMedia,
            MediaMode::Video => 0,
            MediaMode::Screenshots => self.carousel.index(),
        };

        match self.cache.slot(index) {
            MediaSlot::Idle => CardPreview::Idle,
            MediaSlot::Loading => CardPreview::Loading,
            MediaSlot::Failed => CardPreview::Failed,
            MediaSlot::Ready(payload) => CardPreview::Ready(payload),
        }
    }

    /// Whether the card has no outstanding fetches
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.cache.in_flight_count() == 0
    }

    /// Apply a media completion addressed to this card
    pub fn apply_media(&mut self, index: usize, result: Result<MediaPayload, MediaError>) {
        self.cache.apply(index, result);
    }

    fn load_active(&mut self) {
        self.cache.get(self.carousel.index());
        if let Some(next) = self.carousel.preload_target() {
            self.cache.preload(next);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{AppEvent, EventReceiver};
    use crate::testing::{Call, ScriptedBackend};
    use std::collections::BTreeSet;

    fn screenshots(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("s{i}.png")).collect()
    }

    fn card(record: ContentRecord) -> (Arc<ScriptedBackend>, CardMedia, EventReceiver) {
        let backend = Arc::new(ScriptedBackend::new());
        let (events, rx) = EventSender::channel();
        let card = CardMedia::new(record, backend.clone(), events);
        (backend, card, rx)
    }

    async fn settle(card: &mut CardMedia, rx: &mut EventReceiver) {
        while !card.is_settled() {
            match rx.recv().await {
                Some(AppEvent::MediaLoaded { card: id, index, result }) if id == card.id() => {
                    card.apply_media(index, result);
                }
                Some(_) => {}
                None => break,
            }
        }
    }

    fn fetched(backend: &ScriptedBackend) -> BTreeSet<String> {
        backend
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Media(r) => Some(r),
                _ => None,
            })
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_mount_fetches_active_and_next() {
        let record = ContentRecord::new("m1", "Miku").with_screenshots(screenshots(5));
        let (backend, mut card, mut rx) = card(record);

        card.load();
        settle(&mut card, &mut rx).await;

        assert_eq!(fetched(&backend), BTreeSet::from(["s0.png".to_string(), "s1.png".to_string()]));
        assert!(matches!(card.preview(), CardPreview::Ready(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_jump_fetches_target_and_one_ahead_only() {
        let record = ContentRecord::new("m1", "Miku").with_screenshots(screenshots(5));
        let (backend, mut card, mut rx) = card(record);
        card.load();
        settle(&mut card, &mut rx).await;
        let before = backend.calls().len();

        assert_eq!(card.input(CardInput::Jump(3)), CardOutcome::Navigated(3));
        settle(&mut card, &mut rx).await;

        let new_calls: BTreeSet<_> = backend.calls()[before..]
            .iter()
            .cloned()
            .collect();
        assert_eq!(
            new_calls,
            BTreeSet::from([Call::Media("s3.png".into()), Call::Media("s4.png".into())])
        );
        assert!(!fetched(&backend).contains("s2.png"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_preload_wraps_to_first() {
        let record = ContentRecord::new("m1", "Miku").with_screenshots(screenshots(3));
        let (backend, mut card, mut rx) = card(record);

        assert_eq!(card.input(CardInput::Prev), CardOutcome::Navigated(2));
        settle(&mut card, &mut rx).await;
        assert_eq!(fetched(&backend), BTreeSet::from(["s0.png".to_string(), "s2.png".to_string()]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_video_takes_precedence() {
        let record = ContentRecord::new("mo1", "Dance")
            .with_screenshots(screenshots(3))
            .with_video(["dance.mp4", "dance2.mp4"]);
        let (backend, mut card, mut rx) = card(record);

        card.load();
        settle(&mut card, &mut rx).await;

        assert_eq!(card.mode(), MediaMode::Video);
        assert_eq!(card.carousel().len(), 0);
        assert_eq!(backend.calls(), vec![Call::Media("dance.mp4".into())]);
        assert_eq!(card.input(CardInput::Next), CardOutcome::Ignored);
    }

    #[tokio::test]
    async fn test_single_screenshot_has_no_preload_or_controls() {
        let record = ContentRecord::new("s1", "Stage").with_screenshots(screenshots(1));
        let (backend, mut card, mut rx) = card(record);

        card.load();
        settle(&mut card, &mut rx).await;

        assert_eq!(backend.calls().len(), 1);
        assert_eq!(card.carousel_state(), CarouselState::Single);
        assert_eq!(card.input(CardInput::Next), CardOutcome::Ignored);
    }

    #[tokio::test]
    async fn test_navigation_never_opens_detail() {
        let record = ContentRecord::new("m1", "Miku").with_screenshots(screenshots(2));
        let (_backend, mut card, _rx) = card(record.clone());

        for input in [CardInput::Next, CardInput::Prev, CardInput::Jump(1), CardInput::Jump(9)] {
            assert!(!matches!(card.input(input), CardOutcome::OpenDetail(_)));
        }
        assert_eq!(card.input(CardInput::Activate), CardOutcome::OpenDetail(Box::new(record)));
    }

    #[tokio::test]
    async fn test_no_media_preview() {
        let (backend, mut card, _rx) = card(ContentRecord::new("x", "Empty"));
        card.load();
        assert_eq!(card.preview(), CardPreview::NoMedia);
        assert!(backend.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_preview() {
        let backend = Arc::new(ScriptedBackend::new().with_failing_media("s0.png"));
        let (events, mut rx) = EventSender::channel();
        let record = ContentRecord::new("m1", "Miku").with_screenshots(screenshots(1));
        let mut card = CardMedia::new(record, backend, events);

        card.load();
        settle(&mut card, &mut rx).await;
        assert_eq!(card.preview(), CardPreview::Failed);
    }
}
