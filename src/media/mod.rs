//! Card and detail media state
//!
//! - **`MediaCache`**: per-card, on-demand media with in-flight dedupe
//! - **`CarouselController`**: cyclic index over a card's screenshots
//! - **`CardMedia`**: one card's carousel plus cache, with one-ahead preload
//! - **`DetailGallery`**: bulk-loaded zoomable gallery for the detail view

mod cache;
mod card;
mod carousel;
mod gallery;

pub use cache::{MediaCache, MediaSlot};
pub use card::{CardInput, CardMedia, CardOutcome, CardPreview, MediaMode};
pub use carousel::{CarouselController, CarouselState};
pub use gallery::{DetailGallery, ZOOM_DEFAULT, ZOOM_MAX, ZOOM_MIN, ZOOM_STEP};
