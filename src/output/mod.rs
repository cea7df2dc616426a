//! Output formatting for CLI display
//!
//! This module renders catalog pages, cards, pagers and detail views as
//! terminal lines.

use colored::Colorize;

use crate::browse::{GridState, PagerItem};
use crate::catalog::{CatalogKind, ContentRecord};
use crate::media::{CardMedia, CardPreview, DetailGallery, MediaMode};

/// One-word preview state of a card
#[must_use]
pub fn preview_label(preview: &CardPreview<'_>, mode: MediaMode) -> String {
    match preview {
        CardPreview::NoMedia => "no screenshot".dimmed().to_string(),
        CardPreview::Idle => "not loaded".dimmed().to_string(),
        CardPreview::Loading => "loading".yellow().to_string(),
        CardPreview::Failed => "failed to load".red().to_string(),
        CardPreview::Ready(payload) => {
            let what = if mode == MediaMode::Video { "video" } else { "image" };
            format!("{what} {} ({})", payload.mime, human_bytes(payload.len()))
                .green()
                .to_string()
        }
    }
}

/// Format a card for a listing
#[must_use]
pub fn card_line(card: &CardMedia, quiet: bool) -> String {
    let record = card.record();
    if quiet {
        return record.id.clone();
    }

    let counter = card
        .carousel()
        .counter_label()
        .map(|c| format!(" [{c}]"))
        .unwrap_or_default();

    format!(
        "  {}  {}{}  {}",
        record.id.dimmed(),
        record.name.bold(),
        counter,
        preview_label(&card.preview(), card.mode())
    )
}

/// Format a record without preview state
#[must_use]
pub fn record_line(record: &ContentRecord, quiet: bool) -> String {
    if quiet {
        record.id.clone()
    } else {
        format!("  {}  {}", record.id.dimmed(), record.name.bold())
    }
}

/// Pager row, current page highlighted
#[must_use]
pub fn pager_line(items: &[PagerItem]) -> String {
    items
        .iter()
        .map(|item| match item {
            PagerItem::Page { number, current: true } => format!("[{number}]").bold().to_string(),
            PagerItem::Page { number, current: false } => number.to_string(),
            PagerItem::Ellipsis => "...".to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Message for non-record grid states
#[must_use]
pub fn grid_message(state: GridState, kind: CatalogKind) -> Option<String> {
    match state {
        GridState::InitialLoading => Some(format!("Loading {}s...", kind.noun())),
        GridState::Searching => Some("Searching with AI...".to_string()),
        GridState::Empty { searching: true } => Some("No results found for your search".to_string()),
        GridState::Empty { searching: false } => Some(format!("No {}s found", kind.noun())),
        GridState::Records => None,
    }
}

/// Detail view lines for `record`
#[must_use]
pub fn detail_lines(record: &ContentRecord, gallery: Option<&DetailGallery>) -> Vec<String> {
    let mut lines = vec![
        record.name.bold().to_string(),
        format!("ID: {}", record.id),
        String::new(),
        "Description".bold().to_string(),
    ];

    if record.description.is_empty() {
        lines.push("No description available".dimmed().to_string());
    } else {
        lines.extend(record.description.lines().map(str::to_string));
    }

    lines.push(String::new());
    lines.push(format!("Original path: {}", record.original_path));

    if let Some(gallery) = gallery {
        lines.push(String::new());
        lines.push(format!("Screenshots ({})", gallery.len()).bold().to_string());
        for index in 0..gallery.len() {
            let state = match gallery.image(index) {
                Some(payload) => format!("{} ({})", payload.mime, human_bytes(payload.len())).green(),
                None if gallery.is_loading() => "loading".yellow(),
                None => "failed to load".red(),
            };
            lines.push(format!("  {}  {state}", index + 1));
        }
    }

    lines
}

/// Byte count in B / KB / MB
#[must_use]
pub fn human_bytes(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = KB * 1024;
    match bytes {
        b if b >= MB => format!("{:.1} MB", b as f64 / MB as f64),
        b if b >= KB => format!("{:.1} KB", b as f64 / KB as f64),
        b => format!("{b} B"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_human_bytes() {
        assert_eq!(human_bytes(12), "12 B");
        assert_eq!(human_bytes(2048), "2.0 KB");
        assert_eq!(human_bytes(3 * 1024 * 1024), "3.0 MB");
    }

    #[test]
    fn test_pager_line() {
        colored::control::set_override(false);
        let items = crate::browse::page_window(5, 10);
        assert_eq!(pager_line(&items), "1 ... 3 4 [5] 6 7 ... 10");
    }

    #[test]
    fn test_grid_messages() {
        assert_eq!(
            grid_message(GridState::Empty { searching: false }, CatalogKind::Motion).as_deref(),
            Some("No motions found")
        );
        assert_eq!(grid_message(GridState::Records, CatalogKind::Model), None);
    }

    #[test]
    fn test_detail_without_description() {
        colored::control::set_override(false);
        let record = ContentRecord::new("s1", "Beach").with_original_path("/srv/beach.pmx");
        let lines = detail_lines(&record, None);
        assert!(lines.contains(&"No description available".to_string()));
        assert!(lines.contains(&"Original path: /srv/beach.pmx".to_string()));
    }
}
