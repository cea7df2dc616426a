//! Catalog backends
//!
//! [`CatalogBackend`] is the seam between the browsing core and whatever
//! serves catalog data. [`LocalBackend`] is the filesystem implementation
//! used by the command-line front end; [`OpenAiEmbedder`] gives it semantic
//! search through an OpenAI-compatible embeddings endpoint.

mod local;
mod openai;
mod traits;

pub use local::{LocalBackend, cosine_similarity, embedding_text, mime_for};
pub use openai::OpenAiEmbedder;
pub use traits::{CatalogBackend, QueryEmbedder};
