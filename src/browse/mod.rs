//! Catalog browsing state
//!
//! UI-agnostic state machines behind a catalog grid. Nothing in here renders;
//! a front end reads the view model, forwards user input to it and feeds it
//! the completion events produced by its background tasks.
//!
//! # Architecture
//!
//! - **`PagedQuery`**: page / page-size position and the last listed page
//! - **`SearchSession`**: debounced, sequence-gated semantic search
//! - **`BrowserViewModel`**: picks search results or the page, owns the cards
//!
//! # Event flow
//!
//! ```text
//! user input ──→ BrowserViewModel ──→ PagedQuery / SearchSession / CardMedia
//!                      ↑                        │ spawn
//!                      │                        ↓
//!               handle_event ←── AppEvent ←── backend call
//! ```

mod paged;
mod search;
mod view_model;

pub use paged::{PagedQuery, PagerItem, page_window};
pub use search::{SearchOptions, SearchSession};
pub use view_model::{BrowserViewModel, GridState};

/// Browse result type
pub type Result<T> = std::result::Result<T, BrowseError>;

/// Refused browsing operations
///
/// A refused operation leaves all state untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BrowseError {
    #[error("A page request is already in flight")]
    Busy,

    #[error("Page {page} is out of range (1..={last})")]
    PageOutOfRange { page: usize, last: usize },

    #[error("Page size must be at least 1")]
    InvalidPageSize,

    #[error("Pagination is unavailable while search results are shown")]
    SearchActive,

    #[error("No card at position {0}")]
    NoSuchCard(usize),
}
