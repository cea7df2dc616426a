//! mmdbrowse - A browser for MMD model, stage and motion catalogs
//!
//! This library holds the client side of catalog browsing: paginated
//! listing, debounced semantic search with stale-result suppression, a
//! per-card media cache with one-ahead preloading, screenshot carousels and
//! the detail view's zoom gallery.
//!
//! Background work runs on tokio tasks that post [`events::AppEvent`]s back
//! to the state owner; state only changes when the owner applies them.

use thiserror::Error;

pub mod actions;
pub mod app;
pub mod backend;
pub mod browse;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod events;
pub mod logging;
pub mod media;
pub mod output;
pub mod view;

#[cfg(test)]
pub mod testing;

/// Error enum, contains all failure states of the program
#[derive(Debug, Error)]
pub enum MmdError {
    /// Catalog backend error
    #[error("Backend error: {0}")]
    Backend(#[from] catalog::BackendError),
    /// Media resolution error
    #[error("Media error: {0}")]
    Media(#[from] catalog::MediaError),
    /// Refused paging or search request
    #[error("{0}")]
    Browse(#[from] browse::BrowseError),
    /// Refused navigation
    #[error("{0}")]
    Navigation(#[from] app::NavigationError),
    /// Desktop integration error
    #[error("{0}")]
    Action(#[from] actions::ActionError),
    /// Represents a configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ::config::ConfigError),
    /// Represents an I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Invalid input error
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
