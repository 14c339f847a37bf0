//! Form-notebook domain model.
//!
//! # Responsibility
//! - Define notebooks, their grid columns and styled cells.
//! - Define templates new notebooks are laid out from.
//! - Define UI-facing filter candidates derived from cell values.
//!
//! # Invariants
//! - Every notebook is identified by a stable `NotebookId`.
//! - Columns and cells are addressed by grid position inside a notebook.
//! - Notebook deletion is a soft-delete tombstone.

pub mod cell;
pub mod column;
pub mod filter_option;
pub mod notebook;
pub mod template;
