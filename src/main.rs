//! mmdbrowse CLI application entry point
//!
//! Browses the model, stage and motion catalogs kept in the data directory.
//! Each command drives the same application state a graphical shell would:
//! it navigates, issues paging or search requests, and applies completion
//! events until nothing is outstanding, then prints the resulting view.
//!
//! # Usage
//!
//! ```bash
//! # First page of the model catalog
//! mmdbrowse list model
//!
//! # Page 3 at 50 per page, without resolving previews
//! mmdbrowse list stage -p 3 -n 50 --no-media
//!
//! # Semantic search
//! mmdbrowse search motion "slow dance"
//!
//! # Detail view, copying the original path
//! mmdbrowse show model m_001 --copy-path
//!
//! # Generate missing embeddings
//! mmdbrowse embed
//! ```
//!
//! # Configuration
//!
//! Settings are read from `~/.config/mmdbrowse/config.toml` (or `--config`)
//! with `MMDBROWSE__SECTION__KEY` environment overrides. `search` and `embed`
//! call the OpenAI-compatible endpoint in the `[embeddings]` section, keyed by
//! `OPENAI_API_KEY` unless configured otherwise.

use colored::Colorize;
use std::path::Path;
use std::sync::Arc;

use mmdbrowse::{
    MmdError,
    actions::{self, ActionOutcome, SystemDesktop},
    app::{AppState, EmbeddingStatus, NavigationError},
    backend::{LocalBackend, OpenAiEmbedder},
    browse::BrowserViewModel,
    catalog::CatalogKind,
    cli::{Cli, Commands},
    config::{AppConfig, BrowseConfig},
    events::{EventReceiver, EventSender},
    logging, output,
    view::ViewState,
};

type Result<T> = std::result::Result<T, MmdError>;

/// Apply completion events until the application has nothing outstanding
async fn pump(app: &mut AppState, rx: &mut EventReceiver) {
    while !app.is_settled() {
        let Some(event) = rx.recv().await else {
            break;
        };
        app.handle_event(event);
    }
}

fn mounted(app: &AppState) -> Result<&BrowserViewModel> {
    app.catalog().ok_or_else(|| NavigationError::NoCatalog.into())
}

/// Print the catalog grid: summary line, cards (or a state message) and pager
fn print_catalog(vm: &BrowserViewModel, quiet: bool) {
    if !quiet {
        let summary = vm
            .search()
            .result_label()
            .or_else(|| vm.paged().showing_label());
        if let Some(summary) = summary {
            println!("{}", summary.cyan());
        }
    }

    match output::grid_message(vm.grid_state(), vm.kind()) {
        Some(message) => {
            if !quiet {
                println!("{}", message.dimmed());
            }
        }
        None => {
            for card in vm.cards() {
                println!("{}", output::card_line(card, quiet));
            }
        }
    }

    if !quiet && vm.show_pagination() && vm.paged().total_pages() > 1 {
        println!("{}", output::pager_line(&vm.pager()));
    }
}

/// Handle the list command
///
/// # Errors
/// Returns `MmdError` if the page cannot be loaded or is out of range.
async fn handle_list_command(
    mut app: AppState,
    rx: &mut EventReceiver,
    kind: CatalogKind,
    page: usize,
    quiet: bool,
) -> Result<()> {
    app.navigate(ViewState::catalog(kind))?;
    pump(&mut app, rx).await;

    if let Some(e) = mounted(&app)?.last_error() {
        return Err(e.clone().into());
    }

    if page != 1 {
        app.catalog_mut().ok_or(NavigationError::NoCatalog)?.go_to_page(page)?;
        pump(&mut app, rx).await;
    }

    let vm = mounted(&app)?;
    if let Some(e) = vm.last_error() {
        return Err(e.clone().into());
    }
    print_catalog(vm, quiet);
    Ok(())
}

/// Handle the search command
///
/// A failed search is reported as a warning and shows no results.
///
/// # Errors
/// Returns `MmdError` if the catalog view cannot be mounted.
async fn handle_search_command(
    mut app: AppState,
    rx: &mut EventReceiver,
    kind: CatalogKind,
    query: &str,
    quiet: bool,
) -> Result<()> {
    if query.trim().is_empty() {
        return Err(MmdError::InvalidInput("Search query must not be empty".into()));
    }

    app.navigate(ViewState::catalog(kind))?;
    pump(&mut app, rx).await;

    app.catalog_mut().ok_or(NavigationError::NoCatalog)?.set_query(query);
    pump(&mut app, rx).await;

    let vm = mounted(&app)?;
    if let Some(e) = vm.search().last_error() {
        eprintln!("{} {e}", "Warning:".yellow().bold());
    }
    print_catalog(vm, quiet);
    Ok(())
}

/// Handle the show command
///
/// # Errors
/// Returns `MmdError::InvalidInput` if no record has the given id.
async fn handle_show_command(
    mut app: AppState,
    rx: &mut EventReceiver,
    backend: &LocalBackend,
    command: &Commands,
    quiet: bool,
) -> Result<()> {
    let Commands::Show { kind, id, .. } = command else {
        return Err(MmdError::InvalidInput("Expected a show command".into()));
    };

    let record = backend
        .find(*kind, id)
        .await
        .ok_or_else(|| MmdError::InvalidInput(format!("No {} with id '{id}'", kind.noun())))?;

    app.navigate(ViewState::catalog(*kind))?;
    app.show_detail(*kind, record)?;
    pump(&mut app, rx).await;

    let Some((_, record)) = app.detail_item() else {
        return Err(NavigationError::NotInDetail.into());
    };

    if !quiet {
        for line in output::detail_lines(record, app.gallery()) {
            println!("{line}");
        }
    }

    for action in command.detail_actions() {
        match actions::run(&SystemDesktop, action, record) {
            ActionOutcome::Success { details } => {
                if !quiet {
                    println!("{} {details}", "✓".green());
                }
            }
            ActionOutcome::Failed(message) => eprintln!("{} {message}", "✗".red()),
        }
    }
    Ok(())
}

/// Handle the embed command
///
/// # Errors
/// Returns `MmdError::InvalidInput` if generation failed.
async fn handle_embed_command(mut app: AppState, rx: &mut EventReceiver, quiet: bool) -> Result<()> {
    if !quiet && let Some(message) = EmbeddingStatus::Pending.message() {
        println!("{message}");
    }

    app.trigger_embeddings();
    pump(&mut app, rx).await;

    match app.embedding_status() {
        EmbeddingStatus::Failed(e) => Err(MmdError::InvalidInput(format!("Error generating embeddings: {e}"))),
        status => {
            if !quiet && let Some(message) = status.message() {
                println!("{}", message.green());
            }
            Ok(())
        }
    }
}

/// Handle the config command
///
/// # Errors
/// Returns `MmdError::Config` if the configuration cannot be serialized.
fn handle_config_command(config: &AppConfig, path: &Path, path_only: bool) -> Result<()> {
    if path_only {
        println!("{}", path.display());
        return Ok(());
    }

    let rendered = toml::to_string_pretty(config)
        .map_err(|e| ::config::ConfigError::Message(format!("Failed to serialize config: {e}")))?;
    print!("{rendered}");
    Ok(())
}

/// Browse settings for one command
fn browse_settings(config: &AppConfig, command: &Commands) -> BrowseConfig {
    let mut browse = config.browse.clone();
    match command {
        Commands::List { per_page, no_media, .. } => {
            if let Some(per_page) = per_page {
                browse.default_per_page = *per_page;
            }
            browse.preview_media = !*no_media;
        }
        Commands::Search { limit, .. } => {
            if let Some(limit) = limit {
                browse.search_limit = *limit;
            }
        }
        Commands::Show { .. } => browse.preview_media = false,
        Commands::Embed | Commands::Config { .. } => {}
    }
    browse
}

async fn run(cli: Cli) -> Result<()> {
    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => AppConfig::config_path()?,
    };
    let mut config = AppConfig::load_from(&config_path)?;
    if let Some(dir) = &cli.data_dir {
        config.data_dir = Some(dir.clone());
    }

    logging::init(&config.log_filter);

    if let Commands::Config { path } = &cli.command {
        return handle_config_command(&config, &config_path, *path);
    }

    let browse = browse_settings(&config, &cli.command);
    if browse.default_per_page == 0 || browse.search_limit == 0 {
        return Err(MmdError::InvalidInput("Page size and limit must be at least 1".into()));
    }

    let data_dir = config.resolved_data_dir()?;
    let mut local = LocalBackend::open(data_dir.clone(), &config.media).await?;
    if config.embeddings.enabled {
        let embedder = OpenAiEmbedder::from_config(&config.embeddings)?;
        if config.embeddings.resolved_api_key().is_none() {
            tracing::warn!(
                env = %config.embeddings.api_key_env,
                "no embeddings API key set; hosted endpoints will refuse search"
            );
        }
        tracing::debug!(model = embedder.model(), "semantic search enabled");
        local = local.with_embedder(Arc::new(embedder));
    }
    let backend = Arc::new(local);
    tracing::debug!(data_dir = %data_dir.display(), "catalogs opened");

    let (events, mut rx) = EventSender::channel();
    let app = AppState::new(browse, backend.clone(), events);

    match &cli.command {
        Commands::List { kind, page, .. } => {
            handle_list_command(app, &mut rx, *kind, *page, cli.quiet).await
        }
        Commands::Search { kind, query, .. } => {
            handle_search_command(app, &mut rx, *kind, query, cli.quiet).await
        }
        Commands::Show { .. } => handle_show_command(app, &mut rx, &backend, &cli.command, cli.quiet).await,
        Commands::Embed => handle_embed_command(app, &mut rx, cli.quiet).await,
        Commands::Config { .. } => Ok(()),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse_args();

    if let Err(e) = run(cli).await {
        eprintln!("{} {e}", "Error:".red().bold());
        std::process::exit(1);
    }
}
