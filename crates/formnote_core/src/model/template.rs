//! Notebook template model.
//!
//! # Responsibility
//! - Describe the initial grid shape a new notebook is created with.
//! - Decode the optional column-header layout stored with a template.
//!
//! # Invariants
//! - `name` is not blank and unique across templates (enforced by storage).
//! - `rows` and `cols` are positive.
//! - System templates ship with the schema and are read-only.

use crate::model::notebook::now_epoch_ms;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Storage-assigned template identifier.
pub type TemplateId = i64;

/// Rows a template gets when none is given.
pub const DEFAULT_TEMPLATE_ROWS: u32 = 10;
/// Columns a template gets when none is given.
pub const DEFAULT_TEMPLATE_COLS: u32 = 5;

/// Reusable notebook layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    /// `0` until persisted.
    pub id: TemplateId,
    pub name: String,
    pub description: String,
    pub rows: u32,
    pub cols: u32,
    /// JSON-encoded [`TemplateLayout`], absent for a blank grid.
    pub data: Option<String>,
    pub is_system: bool,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

/// Column headers and row count decoded from [`Template::data`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateLayout {
    #[serde(default)]
    pub headers: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rows: Option<u32>,
}

impl Template {
    /// Creates an unsaved user template without layout data.
    pub fn new(name: impl Into<String>, description: impl Into<String>, rows: u32, cols: u32) -> Self {
        Self {
            id: 0,
            name: name.into(),
            description: description.into(),
            rows,
            cols,
            data: None,
            is_system: false,
            created_at: now_epoch_ms(),
        }
    }

    /// Stores `headers` as the layout; `cols` grows to fit them.
    pub fn with_headers(mut self, headers: Vec<String>) -> Self {
        self.cols = self.cols.max(u32::try_from(headers.len()).unwrap_or(u32::MAX));
        let layout = TemplateLayout {
            headers,
            rows: Some(self.rows),
        };
        self.data = serde_json::to_string(&layout).ok();
        self
    }

    /// Decodes the stored layout. `Ok(None)` when the template has none.
    pub fn layout(&self) -> Result<Option<TemplateLayout>, TemplateValidationError> {
        let Some(raw) = self.data.as_deref().filter(|raw| !raw.trim().is_empty()) else {
            return Ok(None);
        };
        serde_json::from_str(raw)
            .map(Some)
            .map_err(|err| TemplateValidationError::InvalidData(err.to_string()))
    }

    /// Names for every template column. Missing or blank headers fall back
    /// to `列N` (1-based).
    pub fn column_names(&self) -> Result<Vec<String>, TemplateValidationError> {
        let headers = self.layout()?.map(|layout| layout.headers).unwrap_or_default();
        Ok((0..self.cols)
            .map(|index| {
                headers
                    .get(index as usize)
                    .map(|header| header.trim())
                    .filter(|header| !header.is_empty())
                    .map_or_else(|| default_column_name(index), str::to_string)
            })
            .collect())
    }

    /// Case-insensitive match on name or description.
    pub fn matches_query(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        query.is_empty()
            || self.name.to_lowercase().contains(&query)
            || self.description.to_lowercase().contains(&query)
    }

    pub fn validate(&self) -> Result<(), TemplateValidationError> {
        if self.name.trim().is_empty() {
            return Err(TemplateValidationError::EmptyName);
        }
        if self.rows == 0 || self.cols == 0 {
            return Err(TemplateValidationError::EmptyGrid {
                rows: self.rows,
                cols: self.cols,
            });
        }
        self.layout().map(|_| ())
    }
}

/// Header given to a column that has no name yet.
pub fn default_column_name(index: u32) -> String {
    format!("列{}", u64::from(index) + 1)
}

/// Validation failures for [`Template`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateValidationError {
    EmptyName,
    EmptyGrid { rows: u32, cols: u32 },
    InvalidData(String),
}

impl Display for TemplateValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "template name must not be empty"),
            Self::EmptyGrid { rows, cols } => write!(
                f,
                "template rows and columns must be greater than 0, got {rows}x{cols}"
            ),
            Self::InvalidData(message) => write!(f, "template layout is not valid JSON: {message}"),
        }
    }
}

impl Error for TemplateValidationError {}
