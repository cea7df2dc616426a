//! Top-level navigation state

use std::fmt;

use crate::catalog::{CatalogKind, ContentRecord};

/// Which screen is shown
///
/// A detail view always carries its record and the catalog it was opened
/// from, so "back" has exactly one place to go.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewState {
    Dashboard,
    Models,
    Stages,
    Motions,
    Settings,
    Detail {
        kind: CatalogKind,
        item: Box<ContentRecord>,
    },
}

impl ViewState {
    /// The catalog view for `kind`
    #[must_use]
    pub const fn catalog(kind: CatalogKind) -> Self {
        match kind {
            CatalogKind::Model => Self::Models,
            CatalogKind::Stage => Self::Stages,
            CatalogKind::Motion => Self::Motions,
        }
    }

    /// Catalog shown by this view, if it is a catalog grid
    #[must_use]
    pub const fn catalog_kind(&self) -> Option<CatalogKind> {
        match self {
            Self::Models => Some(CatalogKind::Model),
            Self::Stages => Some(CatalogKind::Stage),
            Self::Motions => Some(CatalogKind::Motion),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_detail(&self) -> bool {
        matches!(self, Self::Detail { .. })
    }

    /// Label of the detail view's back button ("Back to Models")
    #[must_use]
    pub fn back_label(&self) -> Option<String> {
        match self {
            Self::Detail { kind, .. } => Some(format!("Back to {}", kind.label())),
            _ => None,
        }
    }
}

impl fmt::Display for ViewState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dashboard => f.write_str("Dashboard"),
            Self::Settings => f.write_str("Settings"),
            Self::Detail { item, .. } => f.write_str(&item.name),
            catalog => match catalog.catalog_kind() {
                Some(kind) => f.write_str(kind.label()),
                None => Ok(()),
            },
        }
    }
}
