//! Notebook domain model.
//!
//! # Responsibility
//! - Define the top-level container of one form grid.
//! - Provide soft-delete lifecycle helpers.
//!
//! # Invariants
//! - `uuid` is stable and never reused.
//! - `title` is not blank.
//! - `color` is a `#RRGGBB` hex string.
//! - `is_deleted` is the source of truth for tombstone state.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Stable notebook identifier.
pub type NotebookId = Uuid;

/// Color given to notebooks created without one.
pub const DEFAULT_NOTEBOOK_COLOR: &str = "#4CAF50";

/// Notebook container for one grid of columns and cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notebook {
    pub uuid: NotebookId,
    pub title: String,
    pub color: String,
    pub description: Option<String>,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds.
    pub updated_at: i64,
    pub is_deleted: bool,
}

impl Notebook {
    /// Creates a notebook with a generated ID and current timestamps.
    pub fn new(title: impl Into<String>, color: impl Into<String>) -> Self {
        let now = now_epoch_ms();
        Self {
            uuid: Uuid::new_v4(),
            title: title.into(),
            color: color.into(),
            description: None,
            created_at: now,
            updated_at: now,
            is_deleted: false,
        }
    }

    pub fn soft_delete(&mut self) {
        self.is_deleted = true;
        self.touch();
    }

    pub fn restore(&mut self) {
        self.is_deleted = false;
        self.touch();
    }

    pub fn is_active(&self) -> bool {
        !self.is_deleted
    }

    /// Refreshes `updated_at`.
    pub fn touch(&mut self) {
        self.updated_at = now_epoch_ms().max(self.updated_at);
    }

    /// Validates notebook invariants.
    pub fn validate(&self) -> Result<(), NotebookValidationError> {
        if self.uuid.is_nil() {
            return Err(NotebookValidationError::NilUuid);
        }
        if self.title.trim().is_empty() {
            return Err(NotebookValidationError::EmptyTitle);
        }
        if !is_hex_color(&self.color) {
            return Err(NotebookValidationError::InvalidColor(self.color.clone()));
        }
        Ok(())
    }
}

/// Validation failures for [`Notebook`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotebookValidationError {
    NilUuid,
    EmptyTitle,
    InvalidColor(String),
}

impl Display for NotebookValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilUuid => write!(f, "notebook uuid must not be nil"),
            Self::EmptyTitle => write!(f, "notebook title must not be empty"),
            Self::InvalidColor(value) => {
                write!(f, "notebook color must be #RRGGBB, got `{value}`")
            }
        }
    }
}

impl Error for NotebookValidationError {}

pub(crate) fn is_hex_color(value: &str) -> bool {
    value.len() == 7
        && value.starts_with('#')
        && value[1..].chars().all(|c| c.is_ascii_hexdigit())
}

pub(crate) fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::{Notebook, NotebookValidationError, DEFAULT_NOTEBOOK_COLOR};

    #[test]
    fn new_notebook_is_valid_and_active() {
        let notebook = Notebook::new("Guest house", DEFAULT_NOTEBOOK_COLOR);
        assert!(notebook.validate().is_ok());
        assert!(notebook.is_active());
        assert_eq!(notebook.created_at, notebook.updated_at);
    }

    #[test]
    fn rejects_blank_title() {
        let notebook = Notebook::new("  ", DEFAULT_NOTEBOOK_COLOR);
        assert_eq!(
            notebook.validate().unwrap_err(),
            NotebookValidationError::EmptyTitle
        );
    }

    #[test]
    fn rejects_malformed_color() {
        for color in ["red", "#12345", "#12345G", "123456#"] {
            let notebook = Notebook::new("Rooms", color);
            assert!(matches!(
                notebook.validate(),
                Err(NotebookValidationError::InvalidColor(_))
            ));
        }
    }

    #[test]
    fn soft_delete_and_restore_toggle_tombstone() {
        let mut notebook = Notebook::new("Rooms", DEFAULT_NOTEBOOK_COLOR);
        notebook.soft_delete();
        assert!(!notebook.is_active());
        notebook.restore();
        assert!(notebook.is_active());
    }
}
