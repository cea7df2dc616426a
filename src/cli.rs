//! Command-line interface definitions and parsing
//!
//! This module defines the CLI structure for mmdbrowse using the `clap` crate.
//!
//! # Commands
//!
//! - **list**: Show one page of a catalog, with card previews
//! - **search**: Semantic search over a catalog
//! - **show**: Detail view of a single record, with its screenshot gallery
//! - **embed**: Generate missing embeddings for every catalog
//! - **config**: Print the effective configuration
//!
//! # Examples
//!
//! ```bash
//! mmdbrowse list model --page 2 --per-page 50
//! mmdbrowse search stage "night city"
//! mmdbrowse show motion mo_017 --copy-path
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::actions::DetailAction;
use crate::catalog::CatalogKind;

/// Browse MMD model, stage and motion catalogs
#[derive(Parser, Debug)]
#[command(name = "mmdbrowse")]
#[command(about = "Browse MMD model, stage and motion catalogs", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Suppress informational output (only print results)
    #[arg(short = 'q', long = "quiet", global = true)]
    pub quiet: bool,

    /// Catalog directory (overrides config)
    #[arg(long = "data-dir", value_name = "DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Read configuration from this file instead of the default location
    #[arg(long = "config", value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// List one page of a catalog
    #[command(visible_alias = "ls")]
    List {
        #[arg(value_enum)]
        kind: CatalogKind,

        /// Page number, starting at 1
        #[arg(short = 'p', long = "page", default_value_t = 1)]
        page: usize,

        /// Records per page (defaults to the configured page size)
        #[arg(short = 'n', long = "per-page")]
        per_page: Option<usize>,

        /// Skip resolving card previews
        #[arg(long = "no-media")]
        no_media: bool,
    },

    /// Search a catalog by meaning
    #[command(visible_alias = "s")]
    Search {
        #[arg(value_enum)]
        kind: CatalogKind,

        /// Search text
        #[arg(value_name = "QUERY")]
        query: String,

        /// Maximum number of results (defaults to the configured limit)
        #[arg(short = 'l', long = "limit")]
        limit: Option<usize>,
    },

    /// Show a record in detail
    Show {
        #[arg(value_enum)]
        kind: CatalogKind,

        /// Record id
        #[arg(value_name = "ID")]
        id: String,

        /// Copy the original path to the clipboard
        #[arg(long = "copy-path")]
        copy_path: bool,

        /// Copy the containing folder to the clipboard
        #[arg(long = "copy-folder")]
        copy_folder: bool,

        /// Open the containing folder in the file manager
        #[arg(long = "open-folder")]
        open_folder: bool,
    },

    /// Generate embeddings for records that lack them
    Embed,

    /// Print the effective configuration
    Config {
        /// Print only the config file location
        #[arg(long = "path")]
        path: bool,
    },
}

impl Cli {
    /// Parse command line arguments
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Commands {
    /// Detail actions requested by a `show` command, in button order
    #[must_use]
    pub fn detail_actions(&self) -> Vec<DetailAction> {
        let Self::Show {
            copy_path,
            copy_folder,
            open_folder,
            ..
        } = self
        else {
            return Vec::new();
        };

        [
            (*copy_path, DetailAction::CopyPath),
            (*copy_folder, DetailAction::CopyFolder),
            (*open_folder, DetailAction::OpenFolder),
        ]
        .into_iter()
        .filter_map(|(wanted, action)| wanted.then_some(action))
        .collect()
    }
}
