//! Backend and media error types
//!
//! These are the two failure kinds the browsing core ever sees from its
//! collaborator:
//!
//! - **`BackendError`**: a listing, search or embedding call failed as a whole
//! - **`MediaError`**: a single media reference could not be resolved
//!
//! Both are caught where the call completes and turned into view state
//! ("failed to load", "no results"); neither is fatal to a view.

use thiserror::Error;

/// Failure of a listing, search or embedding-generation call
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    /// The call never reached the backend or its reply was lost
    #[error("Transport error: {0}")]
    Transport(String),

    /// The backend received the call and failed while serving it
    #[error("Server error: {0}")]
    Server(String),

    /// Semantic search was requested but no query embedder is configured
    #[error("Semantic search is unavailable: {0}")]
    SearchUnavailable(String),

    /// The backend does not implement the requested operation
    #[error("Unsupported operation: {0}")]
    Unsupported(String),
}

impl From<std::io::Error> for BackendError {
    fn from(e: std::io::Error) -> Self {
        Self::Server(e.to_string())
    }
}

impl From<serde_json::Error> for BackendError {
    fn from(e: serde_json::Error) -> Self {
        Self::Server(format!("Malformed catalog data: {e}"))
    }
}

/// Failure to resolve one media reference
///
/// The UI treats every variant identically ("failed to load"); the split only
/// matters for diagnostics.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MediaError {
    /// Nothing exists at the referenced location
    #[error("Media not found: {0}")]
    NotFound(String),

    /// The reference exists but could not be read
    #[error("I/O error reading {reference}: {message}")]
    Io {
        /// Reference that failed
        reference: String,
        /// Underlying error text
        message: String,
    },

    /// The bytes were read but are not displayable
    #[error("Cannot decode {0}")]
    Decode(String),
}

impl MediaError {
    /// Classify an I/O error raised while reading `reference`
    #[must_use]
    pub fn from_io(reference: &str, error: &std::io::Error) -> Self {
        if error.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound(reference.to_string())
        } else {
            Self::Io {
                reference: reference.to_string(),
                message: error.to_string(),
            }
        }
    }
}
