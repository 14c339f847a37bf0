//! Notebook repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD APIs over `notebooks` storage.
//! - Define the repository error shared by notebook, grid and template
//!   persistence.
//!
//! # Invariants
//! - Write paths call `Notebook::validate()` before SQL mutations.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::DbError;
use crate::model::cell::CellStyleError;
use crate::model::notebook::{Notebook, NotebookId, NotebookValidationError};
use crate::model::template::{TemplateId, TemplateValidationError};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const NOTEBOOK_SELECT_SQL: &str = "SELECT
    uuid,
    title,
    color,
    description,
    created_at,
    updated_at,
    is_deleted
FROM notebooks";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for notebook grid persistence and queries.
#[derive(Debug)]
pub enum RepoError {
    Validation(NotebookValidationError),
    CellStyle(CellStyleError),
    Template(TemplateValidationError),
    /// Another template already uses this name.
    DuplicateTemplateName(String),
    /// System templates cannot be changed or removed.
    ReadOnlyTemplate(TemplateId),
    Db(DbError),
    NotFound(NotebookId),
    TemplateNotFound(TemplateId),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::CellStyle(err) => write!(f, "{err}"),
            Self::Template(err) => write!(f, "{err}"),
            Self::DuplicateTemplateName(name) => write!(f, "template name already exists: {name}"),
            Self::ReadOnlyTemplate(id) => write!(f, "system template {id} is read-only"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "notebook not found: {id}"),
            Self::TemplateNotFound(id) => write!(f, "template not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted notebook data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::CellStyle(err) => Some(err),
            Self::Template(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::DuplicateTemplateName(_)
            | Self::ReadOnlyTemplate(_)
            | Self::NotFound(_)
            | Self::TemplateNotFound(_)
            | Self::InvalidData(_) => None,
        }
    }
}

impl From<NotebookValidationError> for RepoError {
    fn from(value: NotebookValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<CellStyleError> for RepoError {
    fn from(value: CellStyleError) -> Self {
        Self::CellStyle(value)
    }
}

impl From<TemplateValidationError> for RepoError {
    fn from(value: TemplateValidationError) -> Self {
        Self::Template(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for notebook CRUD operations.
pub trait NotebookRepository {
    fn create_notebook(&self, notebook: &Notebook) -> RepoResult<NotebookId>;
    fn update_notebook(&self, notebook: &Notebook) -> RepoResult<()>;
    fn get_notebook(&self, id: NotebookId, include_deleted: bool) -> RepoResult<Option<Notebook>>;
    /// Lists notebooks ordered by `updated_at DESC, uuid ASC`.
    fn list_notebooks(&self, include_deleted: bool) -> RepoResult<Vec<Notebook>>;
    fn soft_delete_notebook(&self, id: NotebookId) -> RepoResult<()>;
}

/// SQLite-backed notebook repository.
pub struct SqliteNotebookRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteNotebookRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl NotebookRepository for SqliteNotebookRepository<'_> {
    fn create_notebook(&self, notebook: &Notebook) -> RepoResult<NotebookId> {
        notebook.validate()?;

        self.conn.execute(
            "INSERT INTO notebooks (
                uuid,
                title,
                color,
                description,
                created_at,
                updated_at,
                is_deleted
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                notebook.uuid.to_string(),
                notebook.title.trim(),
                notebook.color.as_str(),
                notebook.description.as_deref(),
                notebook.created_at,
                notebook.updated_at,
                bool_to_int(notebook.is_deleted),
            ],
        )?;

        Ok(notebook.uuid)
    }

    fn update_notebook(&self, notebook: &Notebook) -> RepoResult<()> {
        notebook.validate()?;

        let changed = self.conn.execute(
            "UPDATE notebooks
             SET
                title = ?1,
                color = ?2,
                description = ?3,
                updated_at = ?4,
                is_deleted = ?5
             WHERE uuid = ?6;",
            params![
                notebook.title.trim(),
                notebook.color.as_str(),
                notebook.description.as_deref(),
                notebook.updated_at,
                bool_to_int(notebook.is_deleted),
                notebook.uuid.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(notebook.uuid));
        }

        Ok(())
    }

    fn get_notebook(&self, id: NotebookId, include_deleted: bool) -> RepoResult<Option<Notebook>> {
        let mut stmt = self.conn.prepare(&format!(
            "{NOTEBOOK_SELECT_SQL}
             WHERE uuid = ?1
               AND (?2 = 1 OR is_deleted = 0);"
        ))?;

        let mut rows = stmt.query(params![id.to_string(), bool_to_int(include_deleted)])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_notebook_row(row)?));
        }

        Ok(None)
    }

    fn list_notebooks(&self, include_deleted: bool) -> RepoResult<Vec<Notebook>> {
        let mut stmt = self.conn.prepare(&format!(
            "{NOTEBOOK_SELECT_SQL}
             WHERE (?1 = 1 OR is_deleted = 0)
             ORDER BY updated_at DESC, uuid ASC;"
        ))?;

        let mut rows = stmt.query([bool_to_int(include_deleted)])?;
        let mut notebooks = Vec::new();
        while let Some(row) = rows.next()? {
            notebooks.push(parse_notebook_row(row)?);
        }

        Ok(notebooks)
    }

    fn soft_delete_notebook(&self, id: NotebookId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE notebooks
             SET
                is_deleted = 1,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            [id.to_string()],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }
}

/// Fails with `NotFound` unless an active notebook with `id` exists.
pub(crate) fn ensure_active_notebook(conn: &Connection, id: NotebookId) -> RepoResult<()> {
    let exists = conn
        .query_row(
            "SELECT 1 FROM notebooks WHERE uuid = ?1 AND is_deleted = 0;",
            [id.to_string()],
            |_| Ok(()),
        )
        .optional()?;

    exists.ok_or(RepoError::NotFound(id))
}

pub(crate) fn parse_uuid(value: &str, column: &str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}

pub(crate) fn int_to_bool(value: i64, column: &str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean value `{other}` in {column}"
        ))),
    }
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    i64::from(value)
}

fn parse_notebook_row(row: &Row<'_>) -> RepoResult<Notebook> {
    let uuid_text: String = row.get("uuid")?;
    let notebook = Notebook {
        uuid: parse_uuid(&uuid_text, "notebooks.uuid")?,
        title: row.get("title")?,
        color: row.get("color")?,
        description: row.get("description")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        is_deleted: int_to_bool(row.get("is_deleted")?, "notebooks.is_deleted")?,
    };
    notebook.validate()?;
    Ok(notebook)
}
