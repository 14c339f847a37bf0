//! Filter candidate shown in a column's multi-select filter.
//!
//! # Invariants
//! - `value` is never absent; missing input becomes `""`.
//! - `display` is derived from `value` only.
//! - Equality and hashing consider `value` only.

use serde::Serialize;
use std::hash::{Hash, Hasher};

/// Display text used for the empty value.
pub const EMPTY_DISPLAY: &str = "（空）";

/// One distinct column value with its occurrence count and selection state.
#[derive(Debug, Clone, Serialize)]
pub struct FilterOption {
    value: String,
    display: String,
    /// Number of rows carrying `value`.
    pub count: u32,
    /// Selection state toggled by the user.
    pub checked: bool,
}

impl FilterOption {
    pub fn new(value: Option<&str>, count: u32, checked: bool) -> Self {
        let value = value.unwrap_or_default().to_string();
        let display = if value.is_empty() {
            EMPTY_DISPLAY.to_string()
        } else {
            value.clone()
        };
        Self {
            value,
            display,
            count,
            checked,
        }
    }

    /// Creates a checked option.
    pub fn checked(value: impl AsRef<str>, count: u32) -> Self {
        Self::new(Some(value.as_ref()), count, true)
    }

    /// Raw cell value; `""` stands for the empty value.
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn display(&self) -> &str {
        &self.display
    }

    pub fn is_empty_value(&self) -> bool {
        self.value.is_empty()
    }
}

impl PartialEq for FilterOption {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Eq for FilterOption {}

impl Hash for FilterOption {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}
