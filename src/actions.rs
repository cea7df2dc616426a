//! Detail view actions (OS integration)
//!
//! "Copy Path", "Copy Folder" and "Open Folder" on a record's original path.
//! These are fire-and-forget: failures are logged and reported back as an
//! [`ActionOutcome`], never propagated.

use thiserror::Error;

use crate::catalog::ContentRecord;

/// Errors raised by the desktop integration
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ActionError {
    #[error("Clipboard unavailable: {0}")]
    Clipboard(String),

    #[error("Failed to open {target}: {message}")]
    Open { target: String, message: String },

    #[error("Path has no parent folder: {0}")]
    NoFolder(String),
}

/// The two OS services the detail view needs
pub trait Desktop {
    /// Open a URI or path with the system handler
    ///
    /// # Errors
    ///
    /// Returns `ActionError::Open` if the system handler could not be launched.
    fn open_external(&self, target: &str) -> Result<(), ActionError>;

    /// Put `text` on the clipboard
    ///
    /// # Errors
    ///
    /// Returns `ActionError::Clipboard` if the clipboard is unavailable.
    fn copy_to_clipboard(&self, text: &str) -> Result<(), ActionError>;
}

/// [`Desktop`] backed by the real clipboard and system opener
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemDesktop;

impl Desktop for SystemDesktop {
    fn open_external(&self, target: &str) -> Result<(), ActionError> {
        open::that(target).map_err(|e| ActionError::Open {
            target: target.to_string(),
            message: e.to_string(),
        })
    }

    fn copy_to_clipboard(&self, text: &str) -> Result<(), ActionError> {
        let mut clipboard =
            arboard::Clipboard::new().map_err(|e| ActionError::Clipboard(e.to_string()))?;
        clipboard
            .set_text(text)
            .map_err(|e| ActionError::Clipboard(e.to_string()))
    }
}

/// Detail view buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailAction {
    CopyPath,
    CopyFolder,
    OpenFolder,
}

/// Result of a detail action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    Success { details: String },
    Failed(String),
}

impl ActionOutcome {
    /// Check if outcome represents success
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Folder part of an original path, up to the last `\` or `/`
#[must_use]
pub fn folder_of(path: &str) -> Option<&str> {
    path.rfind(['\\', '/']).map(|idx| &path[..idx])
}

/// `file:///` URI for a folder
#[must_use]
pub fn folder_uri(folder: &str) -> String {
    let normalized = folder.replace('\\', "/");
    format!("file:///{}", normalized.trim_start_matches('/'))
}

/// Run `action` for `record`
pub fn run(desktop: &dyn Desktop, action: DetailAction, record: &ContentRecord) -> ActionOutcome {
    let result = match action {
        DetailAction::CopyPath => desktop
            .copy_to_clipboard(&record.original_path)
            .map(|()| "Copied path to clipboard".to_string()),
        DetailAction::CopyFolder => folder(record).and_then(|folder| {
            desktop
                .copy_to_clipboard(folder)
                .map(|()| "Copied folder to clipboard".to_string())
        }),
        DetailAction::OpenFolder => folder(record).and_then(|folder| {
            let uri = folder_uri(folder);
            desktop
                .open_external(&uri)
                .map(|()| format!("Opened {uri}"))
        }),
    };

    match result {
        Ok(details) => {
            tracing::debug!(id = %record.id, ?action, "{details}");
            ActionOutcome::Success { details }
        }
        Err(e) => {
            tracing::warn!(id = %record.id, ?action, error = %e, "detail action failed");
            ActionOutcome::Failed(e.to_string())
        }
    }
}

fn folder(record: &ContentRecord) -> Result<&str, ActionError> {
    folder_of(&record.original_path).ok_or_else(|| ActionError::NoFolder(record.original_path.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct RecordingDesktop {
        clipboard: RefCell<Vec<String>>,
        opened: RefCell<Vec<String>>,
        fail: bool,
    }

    impl Desktop for RecordingDesktop {
        fn open_external(&self, target: &str) -> Result<(), ActionError> {
            if self.fail {
                return Err(ActionError::Open {
                    target: target.to_string(),
                    message: "no handler".into(),
                });
            }
            self.opened.borrow_mut().push(target.to_string());
            Ok(())
        }

        fn copy_to_clipboard(&self, text: &str) -> Result<(), ActionError> {
            if self.fail {
                return Err(ActionError::Clipboard("headless".into()));
            }
            self.clipboard.borrow_mut().push(text.to_string());
            Ok(())
        }
    }

    fn record() -> ContentRecord {
        ContentRecord::new("m1", "Miku").with_original_path(r"C:\MMD\Models\Miku\miku.pmx")
    }

    #[test]
    fn test_folder_of() {
        assert_eq!(folder_of(r"C:\MMD\Miku\miku.pmx"), Some(r"C:\MMD\Miku"));
        assert_eq!(folder_of("/srv/mmd/miku.pmx"), Some("/srv/mmd"));
        assert_eq!(folder_of("miku.pmx"), None);
    }

    #[test]
    fn test_folder_uri() {
        assert_eq!(folder_uri(r"C:\MMD\Miku"), "file:///C:/MMD/Miku");
        assert_eq!(folder_uri("/srv/mmd"), "file:///srv/mmd");
    }

    #[test]
    fn test_copy_actions() {
        let desktop = RecordingDesktop::default();
        assert!(run(&desktop, DetailAction::CopyPath, &record()).is_success());
        assert!(run(&desktop, DetailAction::CopyFolder, &record()).is_success());

        assert_eq!(
            *desktop.clipboard.borrow(),
            vec![
                r"C:\MMD\Models\Miku\miku.pmx".to_string(),
                r"C:\MMD\Models\Miku".to_string()
            ]
        );
    }

    #[test]
    fn test_open_folder() {
        let desktop = RecordingDesktop::default();
        assert!(run(&desktop, DetailAction::OpenFolder, &record()).is_success());
        assert_eq!(*desktop.opened.borrow(), vec!["file:///C:/MMD/Models/Miku".to_string()]);
    }

    #[test]
    fn test_failures_reported_not_raised() {
        let desktop = RecordingDesktop {
            fail: true,
            ..RecordingDesktop::default()
        };
        match run(&desktop, DetailAction::CopyPath, &record()) {
            ActionOutcome::Failed(msg) => assert!(msg.contains("headless")),
            other @ ActionOutcome::Success { .. } => panic!("Expected failure, got {other:?}"),
        }

        let bare = ContentRecord::new("x", "x").with_original_path("nofolder.pmx");
        assert!(!run(&RecordingDesktop::default(), DetailAction::OpenFolder, &bare).is_success());
    }
}
