//! Grid cell model and content type detection.
//!
//! # Responsibility
//! - Define one addressable cell of a notebook grid and its display style.
//! - Infer a display type from raw cell text.
//!
//! # Invariants
//! - `content` is never absent; empty text is `""`.
//! - `(notebook_id, row_index, col_index)` identifies at most one cell.
//! - Style colors are `#RRGGBB`; text size is finite and positive.

use crate::model::notebook::{is_hex_color, NotebookId};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

static DATE_RES: Lazy<[Regex; 4]> = Lazy::new(|| {
    [
        Regex::new(r"^\d{4}-\d{1,2}-\d{1,2}$").expect("valid iso date regex"),
        Regex::new(r"^\d{4}/\d{1,2}/\d{1,2}$").expect("valid slash date regex"),
        Regex::new(r"^\d{1,2}-\d{1,2}-\d{4}$").expect("valid dmy date regex"),
        Regex::new(r"^\d{1,2}/\d{1,2}/\d{4}$").expect("valid dmy slash date regex"),
    ]
});

const BOOLEAN_TOKENS: &[&str] = &["true", "false", "是", "否", "✓", "✗", "1", "0"];
const IMAGE_SUFFIXES: &[&str] = &[".jpg", ".jpeg", ".png", ".gif", ".bmp", ".webp"];
const IMAGE_URI_PREFIXES: &[&str] = &["content://", "file://"];

/// Content type of a cell or column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellType {
    Text,
    Number,
    Date,
    Boolean,
    Image,
}

impl CellType {
    /// Infers the type of raw cell text.
    ///
    /// Checks run in order boolean, number, date, image; the first match
    /// wins, so `"1"` is a boolean and not a number.
    pub fn detect(content: &str) -> Self {
        let content = content.trim();
        if content.is_empty() {
            return Self::Text;
        }
        if is_boolean(content) {
            return Self::Boolean;
        }
        if is_number(content) {
            return Self::Number;
        }
        if DATE_RES.iter().any(|re| re.is_match(content)) {
            return Self::Date;
        }
        if is_image_reference(content) {
            return Self::Image;
        }
        Self::Text
    }

    /// Stable storage id.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Number => "number",
            Self::Date => "date",
            Self::Boolean => "boolean",
            Self::Image => "image",
        }
    }

    /// Parses a storage id.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "text" => Some(Self::Text),
            "number" => Some(Self::Number),
            "date" => Some(Self::Date),
            "boolean" => Some(Self::Boolean),
            "image" => Some(Self::Image),
            _ => None,
        }
    }
}

fn is_boolean(content: &str) -> bool {
    let lower = content.to_lowercase();
    BOOLEAN_TOKENS.contains(&lower.as_str())
}

fn is_number(content: &str) -> bool {
    content.parse::<f64>().is_ok_and(f64::is_finite)
}

fn is_image_reference(content: &str) -> bool {
    let lower = content.to_lowercase();
    IMAGE_SUFFIXES.iter().any(|suffix| lower.ends_with(suffix))
        || IMAGE_URI_PREFIXES
            .iter()
            .any(|prefix| content.starts_with(prefix))
}

/// Horizontal alignment of cell text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextAlignment {
    #[default]
    Left,
    Center,
    Right,
}

impl TextAlignment {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Center => "center",
            Self::Right => "right",
        }
    }

    /// Parses a storage id, accepting any letter case.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "left" => Some(Self::Left),
            "center" => Some(Self::Center),
            "right" => Some(Self::Right),
            _ => None,
        }
    }
}

pub const DEFAULT_TEXT_COLOR: &str = "#000000";
pub const DEFAULT_BACKGROUND_COLOR: &str = "#FFFFFF";
pub const DEFAULT_TEXT_SIZE: f32 = 14.0;

/// Display formatting of one cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellStyle {
    pub text_color: String,
    pub background_color: String,
    pub bold: bool,
    pub italic: bool,
    /// Font size in scale-independent pixels.
    pub text_size: f32,
    pub alignment: TextAlignment,
}

impl Default for CellStyle {
    fn default() -> Self {
        Self {
            text_color: DEFAULT_TEXT_COLOR.to_string(),
            background_color: DEFAULT_BACKGROUND_COLOR.to_string(),
            bold: false,
            italic: false,
            text_size: DEFAULT_TEXT_SIZE,
            alignment: TextAlignment::Left,
        }
    }
}

impl CellStyle {
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    pub fn validate(&self) -> Result<(), CellStyleError> {
        for color in [&self.text_color, &self.background_color] {
            if !is_hex_color(color) {
                return Err(CellStyleError::InvalidColor(color.clone()));
            }
        }
        if !self.text_size.is_finite() || self.text_size <= 0.0 {
            return Err(CellStyleError::InvalidTextSize(self.text_size));
        }
        Ok(())
    }
}

/// Validation failures for [`CellStyle`].
#[derive(Debug, Clone, PartialEq)]
pub enum CellStyleError {
    InvalidColor(String),
    InvalidTextSize(f32),
}

impl Display for CellStyleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidColor(value) => write!(f, "cell color must be #RRGGBB, got `{value}`"),
            Self::InvalidTextSize(value) => {
                write!(f, "cell text size must be positive, got {value}")
            }
        }
    }
}

impl Error for CellStyleError {}

/// One grid cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub notebook_id: NotebookId,
    pub row_index: u32,
    pub col_index: u32,
    pub content: String,
    pub style: CellStyle,
}

impl Cell {
    pub fn new(
        notebook_id: NotebookId,
        row_index: u32,
        col_index: u32,
        content: impl Into<String>,
    ) -> Self {
        Self {
            notebook_id,
            row_index,
            col_index,
            content: content.into(),
            style: CellStyle::default(),
        }
    }

    pub fn detected_type(&self) -> CellType {
        CellType::detect(&self.content)
    }
}
