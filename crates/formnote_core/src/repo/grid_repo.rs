//! Grid (columns + cells) repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist column settings, cell contents and cell styles of a notebook.
//! - Keep grid positions dense when rows or columns are removed.
//!
//! # Invariants
//! - Writes require an active (not soft-deleted) parent notebook.
//! - Deleting row/column `n` shifts every later row/column down by one in
//!   the same transaction.
//! - Content writes never touch a cell's style and style writes never touch
//!   its content.

use crate::model::cell::{Cell, CellStyle, CellType, TextAlignment};
use crate::model::column::{Column, SortOrder};
use crate::model::notebook::{now_epoch_ms, NotebookId};
use crate::repo::notebook_repo::{
    bool_to_int, ensure_active_notebook, int_to_bool, parse_uuid, RepoError, RepoResult,
};
use rusqlite::{params, Connection, Row};

const COLUMN_SELECT_SQL: &str = "SELECT
    notebook_id,
    column_index,
    name,
    width,
    type,
    sort_order,
    is_visible,
    is_frozen
FROM columns";

const CELL_SELECT_SQL: &str = "SELECT
    notebook_id,
    row_index,
    col_index,
    content,
    text_color,
    background_color,
    is_bold,
    is_italic,
    text_size,
    text_alignment
FROM cells";

/// Repository interface for grid columns and cells.
pub trait GridRepository {
    /// Inserts or replaces the column at `(notebook_id, column_index)`.
    fn upsert_column(&self, column: &Column) -> RepoResult<()>;
    fn get_column(&self, notebook_id: NotebookId, column_index: u32)
        -> RepoResult<Option<Column>>;
    /// Lists columns ordered by `column_index`.
    fn list_columns(&self, notebook_id: NotebookId) -> RepoResult<Vec<Column>>;
    /// Inserts the cell, or replaces only the content of an existing one.
    fn upsert_cell(&self, cell: &Cell) -> RepoResult<()>;
    /// Sets the style at `(notebook_id, row, col)`, creating an empty cell
    /// when none exists yet.
    fn update_cell_style(
        &self,
        notebook_id: NotebookId,
        row_index: u32,
        col_index: u32,
        style: &CellStyle,
    ) -> RepoResult<()>;
    /// Creates empty cells for every missing position of a `rows x cols`
    /// grid. Returns the number of cells created.
    fn fill_blank_cells(&self, notebook_id: NotebookId, rows: u32, cols: u32)
        -> RepoResult<usize>;
    /// Lists cells ordered by `(row_index, col_index)`.
    fn list_cells(&self, notebook_id: NotebookId) -> RepoResult<Vec<Cell>>;
    /// Lists one column's cells ordered by `row_index`.
    fn list_column_cells(&self, notebook_id: NotebookId, col_index: u32) -> RepoResult<Vec<Cell>>;
    /// Removes one row and shifts later rows up. Returns removed cell count.
    fn delete_row(&self, notebook_id: NotebookId, row_index: u32) -> RepoResult<usize>;
    /// Removes one column with its cells and shifts later columns left.
    /// Returns removed cell count.
    fn delete_column(&self, notebook_id: NotebookId, col_index: u32) -> RepoResult<usize>;
}

/// SQLite-backed grid repository.
pub struct SqliteGridRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteGridRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn touch_notebook(&self, notebook_id: NotebookId) -> RepoResult<()> {
        self.conn.execute(
            "UPDATE notebooks SET updated_at = MAX(updated_at, ?1) WHERE uuid = ?2;",
            params![now_epoch_ms(), notebook_id.to_string()],
        )?;
        Ok(())
    }
}

impl GridRepository for SqliteGridRepository<'_> {
    fn upsert_column(&self, column: &Column) -> RepoResult<()> {
        ensure_active_notebook(self.conn, column.notebook_id)?;

        self.conn.execute(
            "INSERT INTO columns (
                notebook_id,
                column_index,
                name,
                width,
                type,
                sort_order,
                is_visible,
                is_frozen
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT (notebook_id, column_index) DO UPDATE SET
                name = excluded.name,
                width = excluded.width,
                type = excluded.type,
                sort_order = excluded.sort_order,
                is_visible = excluded.is_visible,
                is_frozen = excluded.is_frozen;",
            params![
                column.notebook_id.to_string(),
                column.column_index,
                column.name.as_str(),
                f64::from(column.width),
                column.kind.as_str(),
                column.sort_order.map(SortOrder::as_str),
                bool_to_int(column.is_visible),
                bool_to_int(column.is_frozen),
            ],
        )?;

        self.touch_notebook(column.notebook_id)
    }

    fn get_column(
        &self,
        notebook_id: NotebookId,
        column_index: u32,
    ) -> RepoResult<Option<Column>> {
        let mut stmt = self.conn.prepare(&format!(
            "{COLUMN_SELECT_SQL} WHERE notebook_id = ?1 AND column_index = ?2;"
        ))?;
        let mut rows = stmt.query(params![notebook_id.to_string(), column_index])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_column_row(row)?));
        }
        Ok(None)
    }

    fn list_columns(&self, notebook_id: NotebookId) -> RepoResult<Vec<Column>> {
        let mut stmt = self.conn.prepare(&format!(
            "{COLUMN_SELECT_SQL} WHERE notebook_id = ?1 ORDER BY column_index ASC;"
        ))?;
        let mut rows = stmt.query([notebook_id.to_string()])?;
        let mut columns = Vec::new();
        while let Some(row) = rows.next()? {
            columns.push(parse_column_row(row)?);
        }
        Ok(columns)
    }

    fn upsert_cell(&self, cell: &Cell) -> RepoResult<()> {
        ensure_active_notebook(self.conn, cell.notebook_id)?;
        cell.style.validate()?;

        let style = &cell.style;
        self.conn.execute(
            "INSERT INTO cells (
                notebook_id,
                row_index,
                col_index,
                content,
                updated_at,
                text_color,
                background_color,
                is_bold,
                is_italic,
                text_size,
                text_alignment
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            ON CONFLICT (notebook_id, row_index, col_index) DO UPDATE SET
                content = excluded.content,
                updated_at = excluded.updated_at;",
            params![
                cell.notebook_id.to_string(),
                cell.row_index,
                cell.col_index,
                cell.content.as_str(),
                now_epoch_ms(),
                style.text_color.as_str(),
                style.background_color.as_str(),
                bool_to_int(style.bold),
                bool_to_int(style.italic),
                f64::from(style.text_size),
                style.alignment.as_str(),
            ],
        )?;

        self.touch_notebook(cell.notebook_id)
    }

    fn update_cell_style(
        &self,
        notebook_id: NotebookId,
        row_index: u32,
        col_index: u32,
        style: &CellStyle,
    ) -> RepoResult<()> {
        ensure_active_notebook(self.conn, notebook_id)?;
        style.validate()?;

        self.conn.execute(
            "INSERT INTO cells (
                notebook_id,
                row_index,
                col_index,
                updated_at,
                text_color,
                background_color,
                is_bold,
                is_italic,
                text_size,
                text_alignment
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ON CONFLICT (notebook_id, row_index, col_index) DO UPDATE SET
                updated_at = excluded.updated_at,
                text_color = excluded.text_color,
                background_color = excluded.background_color,
                is_bold = excluded.is_bold,
                is_italic = excluded.is_italic,
                text_size = excluded.text_size,
                text_alignment = excluded.text_alignment;",
            params![
                notebook_id.to_string(),
                row_index,
                col_index,
                now_epoch_ms(),
                style.text_color.as_str(),
                style.background_color.as_str(),
                bool_to_int(style.bold),
                bool_to_int(style.italic),
                f64::from(style.text_size),
                style.alignment.as_str(),
            ],
        )?;

        self.touch_notebook(notebook_id)
    }

    fn fill_blank_cells(
        &self,
        notebook_id: NotebookId,
        rows: u32,
        cols: u32,
    ) -> RepoResult<usize> {
        ensure_active_notebook(self.conn, notebook_id)?;
        let id = notebook_id.to_string();
        let now = now_epoch_ms();

        let tx = self.conn.unchecked_transaction()?;
        let mut created = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO cells (notebook_id, row_index, col_index, content, updated_at)
                 VALUES (?1, ?2, ?3, '', ?4);",
            )?;
            for row_index in 0..rows {
                for col_index in 0..cols {
                    created += stmt.execute(params![id, row_index, col_index, now])?;
                }
            }
        }
        tx.commit()?;

        self.touch_notebook(notebook_id)?;
        Ok(created)
    }

    fn list_cells(&self, notebook_id: NotebookId) -> RepoResult<Vec<Cell>> {
        let mut stmt = self.conn.prepare(&format!(
            "{CELL_SELECT_SQL} WHERE notebook_id = ?1 ORDER BY row_index ASC, col_index ASC;"
        ))?;
        let mut rows = stmt.query([notebook_id.to_string()])?;
        collect_cells(&mut rows)
    }

    fn list_column_cells(&self, notebook_id: NotebookId, col_index: u32) -> RepoResult<Vec<Cell>> {
        let mut stmt = self.conn.prepare(&format!(
            "{CELL_SELECT_SQL} WHERE notebook_id = ?1 AND col_index = ?2 ORDER BY row_index ASC;"
        ))?;
        let mut rows = stmt.query(params![notebook_id.to_string(), col_index])?;
        collect_cells(&mut rows)
    }

    fn delete_row(&self, notebook_id: NotebookId, row_index: u32) -> RepoResult<usize> {
        ensure_active_notebook(self.conn, notebook_id)?;
        let id = notebook_id.to_string();

        let tx = self.conn.unchecked_transaction()?;
        let removed = tx.execute(
            "DELETE FROM cells WHERE notebook_id = ?1 AND row_index = ?2;",
            params![id, row_index],
        )?;
        // Two passes through negative indices keep the primary key unique
        // while rows move.
        tx.execute(
            "UPDATE cells SET row_index = -row_index WHERE notebook_id = ?1 AND row_index > ?2;",
            params![id, row_index],
        )?;
        tx.execute(
            "UPDATE cells SET row_index = -row_index - 1 WHERE notebook_id = ?1 AND row_index < 0;",
            [id.as_str()],
        )?;
        tx.commit()?;

        self.touch_notebook(notebook_id)?;
        Ok(removed)
    }

    fn delete_column(&self, notebook_id: NotebookId, col_index: u32) -> RepoResult<usize> {
        ensure_active_notebook(self.conn, notebook_id)?;
        let id = notebook_id.to_string();

        let tx = self.conn.unchecked_transaction()?;
        let removed = tx.execute(
            "DELETE FROM cells WHERE notebook_id = ?1 AND col_index = ?2;",
            params![id, col_index],
        )?;
        tx.execute(
            "DELETE FROM columns WHERE notebook_id = ?1 AND column_index = ?2;",
            params![id, col_index],
        )?;
        tx.execute(
            "UPDATE cells SET col_index = -col_index WHERE notebook_id = ?1 AND col_index > ?2;",
            params![id, col_index],
        )?;
        tx.execute(
            "UPDATE cells SET col_index = -col_index - 1 WHERE notebook_id = ?1 AND col_index < 0;",
            [id.as_str()],
        )?;
        tx.execute(
            "UPDATE columns SET column_index = -column_index
             WHERE notebook_id = ?1 AND column_index > ?2;",
            params![id, col_index],
        )?;
        tx.execute(
            "UPDATE columns SET column_index = -column_index - 1
             WHERE notebook_id = ?1 AND column_index < 0;",
            [id.as_str()],
        )?;
        tx.commit()?;

        self.touch_notebook(notebook_id)?;
        Ok(removed)
    }
}

fn collect_cells(rows: &mut rusqlite::Rows<'_>) -> RepoResult<Vec<Cell>> {
    let mut cells = Vec::new();
    while let Some(row) = rows.next()? {
        let notebook_text: String = row.get("notebook_id")?;
        let alignment_text: String = row.get("text_alignment")?;
        let alignment = TextAlignment::parse(&alignment_text).ok_or_else(|| {
            RepoError::InvalidData(format!(
                "invalid text alignment `{alignment_text}` in cells.text_alignment"
            ))
        })?;

        cells.push(Cell {
            notebook_id: parse_uuid(&notebook_text, "cells.notebook_id")?,
            row_index: row.get("row_index")?,
            col_index: row.get("col_index")?,
            content: row.get::<_, Option<String>>("content")?.unwrap_or_default(),
            style: CellStyle {
                text_color: row.get("text_color")?,
                background_color: row.get("background_color")?,
                bold: int_to_bool(row.get("is_bold")?, "cells.is_bold")?,
                italic: int_to_bool(row.get("is_italic")?, "cells.is_italic")?,
                text_size: row.get::<_, f64>("text_size")? as f32,
                alignment,
            },
        });
    }
    Ok(cells)
}

fn parse_column_row(row: &Row<'_>) -> RepoResult<Column> {
    let notebook_text: String = row.get("notebook_id")?;

    let type_text: String = row.get("type")?;
    let kind = CellType::parse(&type_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid column type `{type_text}` in columns.type"))
    })?;

    let sort_order = match row.get::<_, Option<String>>("sort_order")? {
        Some(value) => Some(SortOrder::parse(&value).ok_or_else(|| {
            RepoError::InvalidData(format!(
                "invalid sort order `{value}` in columns.sort_order"
            ))
        })?),
        None => None,
    };

    Ok(Column {
        notebook_id: parse_uuid(&notebook_text, "columns.notebook_id")?,
        column_index: row.get("column_index")?,
        name: row.get("name")?,
        width: row.get::<_, f64>("width")? as f32,
        kind,
        sort_order,
        is_visible: int_to_bool(row.get("is_visible")?, "columns.is_visible")?,
        is_frozen: int_to_bool(row.get("is_frozen")?, "columns.is_frozen")?,
    })
}
