//! Notebook grid use-case service.
//!
//! # Responsibility
//! - Orchestrate notebook and grid repositories into UI use-cases.
//! - Build column filter candidates and apply checked selections.
//! - Keep column types in sync with their content.
//! - Lay out new notebooks from templates and capture notebooks as templates.
//!
//! # Invariants
//! - Service APIs never bypass repository validation.
//! - A column's type is re-inferred from all of its cells on every write.
//! - Logs carry ids and counts only, never cell content.

use crate::model::cell::{Cell, CellStyle, CellType};
use crate::model::column::{Column, SortOrder};
use crate::model::filter_option::FilterOption;
use crate::model::notebook::{Notebook, NotebookId, DEFAULT_NOTEBOOK_COLOR};
use crate::model::template::{
    default_column_name, Template, DEFAULT_TEMPLATE_COLS, DEFAULT_TEMPLATE_ROWS,
};
use crate::repo::grid_repo::GridRepository;
use crate::repo::notebook_repo::{NotebookRepository, RepoError};
use crate::service::filter::{
    build_value_counts, row_indices, sort_rows, visible_rows, FilterSelection,
};
use log::{debug, info};
use std::collections::{BTreeSet, HashMap};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for grid use-cases.
#[derive(Debug)]
pub enum GridServiceError {
    /// Target notebook does not exist or is deleted.
    NotebookNotFound(NotebookId),
    /// Target column has no header record.
    ColumnNotFound {
        notebook_id: NotebookId,
        column_index: u32,
    },
    /// Column name is blank.
    EmptyColumnName,
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for GridServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotebookNotFound(id) => write!(f, "notebook not found: {id}"),
            Self::ColumnNotFound {
                notebook_id,
                column_index,
            } => write!(f, "column {column_index} not found in notebook {notebook_id}"),
            Self::EmptyColumnName => write!(f, "column name must not be empty"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for GridServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for GridServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NotebookNotFound(id),
            other => Self::Repo(other),
        }
    }
}

pub type GridResult<T> = Result<T, GridServiceError>;

/// Use-case service over notebook and grid repositories.
pub struct GridService<N: NotebookRepository, G: GridRepository> {
    notebooks: N,
    grid: G,
}

impl<N: NotebookRepository, G: GridRepository> GridService<N, G> {
    pub fn new(notebooks: N, grid: G) -> Self {
        Self { notebooks, grid }
    }

    /// Creates a notebook. A missing color falls back to the default color.
    pub fn create_notebook(&self, title: &str, color: Option<&str>) -> GridResult<NotebookId> {
        let color = color
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(DEFAULT_NOTEBOOK_COLOR);
        let notebook = Notebook::new(title.trim(), color.to_ascii_uppercase());
        let id = self.notebooks.create_notebook(&notebook)?;
        info!("event=notebook_create module=grid status=ok notebook_id={id}");
        Ok(id)
    }

    /// Creates a notebook laid out as `template`: one column per template
    /// column, named from its headers, and an empty `rows x cols` grid.
    pub fn create_notebook_from_template(
        &self,
        title: &str,
        template: &Template,
    ) -> GridResult<NotebookId> {
        template.validate().map_err(RepoError::from)?;
        let names = template.column_names().map_err(RepoError::from)?;

        let id = self.create_notebook(title, None)?;
        for (index, name) in (0u32..).zip(names) {
            self.grid.upsert_column(&Column::new(id, index, name))?;
        }
        let cell_count = self.grid.fill_blank_cells(id, template.rows, template.cols)?;
        info!(
            "event=notebook_from_template module=grid status=ok notebook_id={id} template_id={} column_count={} cell_count={cell_count}",
            template.id, template.cols
        );
        Ok(id)
    }

    /// Captures a notebook's column names and grid size as an unsaved user
    /// template. An empty notebook uses the default template size.
    pub fn template_from_notebook(
        &self,
        notebook_id: NotebookId,
        name: &str,
        description: &str,
    ) -> GridResult<Template> {
        self.ensure_notebook(notebook_id)?;
        let columns = self.grid.list_columns(notebook_id)?;
        let cells = self.grid.list_cells(notebook_id)?;

        let rows = cells
            .iter()
            .map(|cell| cell.row_index + 1)
            .max()
            .unwrap_or(DEFAULT_TEMPLATE_ROWS);
        let cols = columns
            .iter()
            .map(|column| column.column_index + 1)
            .chain(cells.iter().map(|cell| cell.col_index + 1))
            .max()
            .unwrap_or(DEFAULT_TEMPLATE_COLS);

        let mut headers = (0..cols).map(default_column_name).collect::<Vec<_>>();
        for column in columns {
            headers[column.column_index as usize] = column.name;
        }

        let template = Template::new(name.trim(), description.trim(), rows, cols)
            .with_headers(headers);
        template.validate().map_err(RepoError::from)?;
        Ok(template)
    }

    pub fn get_notebook(&self, id: NotebookId) -> GridResult<Notebook> {
        self.notebooks
            .get_notebook(id, false)?
            .ok_or(GridServiceError::NotebookNotFound(id))
    }

    /// Lists active notebooks, most recently updated first.
    pub fn list_notebooks(&self) -> GridResult<Vec<Notebook>> {
        Ok(self.notebooks.list_notebooks(false)?)
    }

    pub fn delete_notebook(&self, id: NotebookId) -> GridResult<()> {
        self.notebooks.soft_delete_notebook(id)?;
        info!("event=notebook_delete module=grid status=ok notebook_id={id}");
        Ok(())
    }

    /// Appends a column after the last existing one. Returns its index.
    pub fn add_column(&self, notebook_id: NotebookId, name: &str) -> GridResult<u32> {
        let name = name.trim();
        if name.is_empty() {
            return Err(GridServiceError::EmptyColumnName);
        }

        let next_index = self
            .grid
            .list_columns(notebook_id)?
            .last()
            .map_or(0, |column| column.column_index + 1);
        self.grid
            .upsert_column(&Column::new(notebook_id, next_index, name))?;
        Ok(next_index)
    }

    pub fn columns(&self, notebook_id: NotebookId) -> GridResult<Vec<Column>> {
        Ok(self.grid.list_columns(notebook_id)?)
    }

    pub fn cells(&self, notebook_id: NotebookId) -> GridResult<Vec<Cell>> {
        Ok(self.grid.list_cells(notebook_id)?)
    }

    /// Writes one cell's content, keeping its style, then re-infers the
    /// column type from every cell of the column.
    pub fn set_cell(
        &self,
        notebook_id: NotebookId,
        row_index: u32,
        col_index: u32,
        content: &str,
    ) -> GridResult<()> {
        self.grid
            .upsert_cell(&Cell::new(notebook_id, row_index, col_index, content))?;
        self.refresh_column_type(notebook_id, col_index)?;
        Ok(())
    }

    /// Re-infers the type of every column. Returns how many changed.
    pub fn infer_column_types(&self, notebook_id: NotebookId) -> GridResult<usize> {
        self.ensure_notebook(notebook_id)?;
        let mut changed = 0;
        for column in self.grid.list_columns(notebook_id)? {
            if self.refresh_column_type(notebook_id, column.column_index)? {
                changed += 1;
            }
        }
        Ok(changed)
    }

    /// Applies `style` to one cell without touching its content.
    pub fn set_cell_style(
        &self,
        notebook_id: NotebookId,
        row_index: u32,
        col_index: u32,
        style: &CellStyle,
    ) -> GridResult<()> {
        self.grid
            .update_cell_style(notebook_id, row_index, col_index, style)?;
        debug!(
            "event=cell_style module=grid status=ok notebook_id={notebook_id} row_index={row_index} column_index={col_index} default={}",
            style.is_default()
        );
        Ok(())
    }

    /// Restores the default style of one cell.
    pub fn reset_cell_style(
        &self,
        notebook_id: NotebookId,
        row_index: u32,
        col_index: u32,
    ) -> GridResult<()> {
        self.set_cell_style(notebook_id, row_index, col_index, &CellStyle::default())
    }

    /// Builds filter candidates from every cell of the column.
    pub fn filter_options(
        &self,
        notebook_id: NotebookId,
        col_index: u32,
    ) -> GridResult<Vec<FilterOption>> {
        self.ensure_notebook(notebook_id)?;
        let cells = self.grid.list_column_cells(notebook_id, col_index)?;
        let options = build_value_counts(&cells, col_index);
        info!(
            "event=filter_build module=grid status=ok notebook_id={notebook_id} column_index={col_index} cell_count={} option_count={}",
            cells.len(),
            options.len()
        );
        Ok(options)
    }

    /// Applies checked candidates. Returns the visible rows, or `None` when
    /// the selection leaves every row visible.
    pub fn apply_value_filter(
        &self,
        notebook_id: NotebookId,
        col_index: u32,
        options: &[FilterOption],
    ) -> GridResult<Option<BTreeSet<u32>>> {
        self.ensure_notebook(notebook_id)?;
        let selection = FilterSelection::from_options(options);
        if selection.is_all() {
            debug!("event=filter_apply module=grid status=ok notebook_id={notebook_id} column_index={col_index} filtered=false");
            return Ok(None);
        }

        let cells = self.grid.list_column_cells(notebook_id, col_index)?;
        let rows = visible_rows(&cells, col_index, &selection);
        info!(
            "event=filter_apply module=grid status=ok notebook_id={notebook_id} column_index={col_index} filtered={} visible_rows={}",
            rows.is_some(),
            rows.as_ref().map_or(0, BTreeSet::len)
        );
        Ok(rows)
    }

    /// Sorts rows by one column and records the order on the column.
    ///
    /// `visible` restricts the result to already-filtered rows.
    pub fn sort_by_column(
        &self,
        notebook_id: NotebookId,
        col_index: u32,
        order: SortOrder,
        visible: Option<&BTreeSet<u32>>,
    ) -> GridResult<Vec<u32>> {
        let mut column = self.grid.get_column(notebook_id, col_index)?.ok_or(
            GridServiceError::ColumnNotFound {
                notebook_id,
                column_index: col_index,
            },
        )?;
        column.sort_order = Some(order);
        self.grid.upsert_column(&column)?;

        let cells = self.grid.list_cells(notebook_id)?;
        let rows = match visible {
            Some(rows) => rows.clone(),
            None => row_indices(&cells),
        };
        Ok(sort_rows(&cells, col_index, column.kind, order, rows))
    }

    /// Removes a row and shifts later rows up.
    pub fn delete_row(&self, notebook_id: NotebookId, row_index: u32) -> GridResult<()> {
        let removed = self.grid.delete_row(notebook_id, row_index)?;
        info!("event=row_delete module=grid status=ok notebook_id={notebook_id} row_index={row_index} removed_cells={removed}");
        Ok(())
    }

    /// Removes a column with its cells and shifts later columns left.
    pub fn delete_column(&self, notebook_id: NotebookId, col_index: u32) -> GridResult<()> {
        let removed = self.grid.delete_column(notebook_id, col_index)?;
        info!("event=column_delete module=grid status=ok notebook_id={notebook_id} column_index={col_index} removed_cells={removed}");
        Ok(())
    }

    fn ensure_notebook(&self, id: NotebookId) -> GridResult<()> {
        self.get_notebook(id).map(|_| ())
    }

    /// Stores the inferred type when it differs. Returns whether it did.
    fn refresh_column_type(&self, notebook_id: NotebookId, col_index: u32) -> GridResult<bool> {
        let Some(mut column) = self.grid.get_column(notebook_id, col_index)? else {
            return Ok(false);
        };
        let cells = self.grid.list_column_cells(notebook_id, col_index)?;
        let kind = infer_column_type(&cells);
        if kind == column.kind {
            return Ok(false);
        }

        let previous = column.kind;
        column.kind = kind;
        self.grid.upsert_column(&column)?;
        debug!(
            "event=column_type_detect module=grid status=ok notebook_id={notebook_id} column_index={col_index} from={} to={}",
            previous.as_str(),
            kind.as_str()
        );
        Ok(true)
    }
}

/// Types a column may take besides text, in tie-break order.
const INFERRED_TYPES: [CellType; 4] = [
    CellType::Number,
    CellType::Date,
    CellType::Boolean,
    CellType::Image,
];

/// The first of [`INFERRED_TYPES`] held by more than half of the non-empty
/// cells, otherwise `Text`.
fn infer_column_type(cells: &[Cell]) -> CellType {
    let mut counts = HashMap::new();
    let mut non_empty = 0usize;
    for cell in cells.iter().filter(|cell| !cell.content.trim().is_empty()) {
        non_empty += 1;
        *counts.entry(cell.detected_type()).or_insert(0usize) += 1;
    }

    INFERRED_TYPES
        .into_iter()
        .find(|kind| counts.get(kind).is_some_and(|count| count * 2 > non_empty))
        .unwrap_or(CellType::Text)
}
