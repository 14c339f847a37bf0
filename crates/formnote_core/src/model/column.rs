//! Grid column model.

use crate::model::cell::CellType;
use crate::model::notebook::NotebookId;
use serde::{Deserialize, Serialize};

/// Width given to new columns, in density-independent pixels.
pub const DEFAULT_COLUMN_WIDTH: f32 = 150.0;

/// Sort direction applied to a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ascending => "ascending",
            Self::Descending => "descending",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "ascending" => Some(Self::Ascending),
            "descending" => Some(Self::Descending),
            _ => None,
        }
    }
}

/// Column header and presentation settings.
///
/// Identified by `(notebook_id, column_index)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub notebook_id: NotebookId,
    pub column_index: u32,
    pub name: String,
    pub width: f32,
    pub kind: CellType,
    pub sort_order: Option<SortOrder>,
    pub is_visible: bool,
    pub is_frozen: bool,
}

impl Column {
    pub fn new(notebook_id: NotebookId, column_index: u32, name: impl Into<String>) -> Self {
        Self {
            notebook_id,
            column_index,
            name: name.into(),
            width: DEFAULT_COLUMN_WIDTH,
            kind: CellType::Text,
            sort_order: None,
            is_visible: true,
            is_frozen: false,
        }
    }
}
