//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose notebook grid, cell style and template use-cases to Dart via FRB.
//! - Flatten core errors into envelope messages.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Envelopes always carry `ok` and a human-readable `message`.

use formnote_core::db::open_db;
use formnote_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    CellStyle, CoreConfig, FilterOption, GridService, NotebookId, SqliteGridRepository,
    SqliteNotebookRepository, SqliteTemplateRepository, Template, TemplateFilter,
    TemplateRepository, TextAlignment,
};
use log::warn;
use rusqlite::Connection;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::OnceLock;
use uuid::Uuid;

static STORE_DB_PATH: OnceLock<Result<PathBuf, String>> = OnceLock::new();

type FfiGridService<'conn> =
    GridService<SqliteNotebookRepository<'conn>, SqliteGridRepository<'conn>>;

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir`.
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Generic action response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResponse {
    pub ok: bool,
    /// Created entity id, when the action creates one.
    pub id: Option<String>,
    pub message: String,
}

impl ActionResponse {
    fn success(message: impl Into<String>, id: Option<String>) -> Self {
        Self {
            ok: true,
            id,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            id: None,
            message: message.into(),
        }
    }
}

/// One filter candidate as shown in the column filter sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOptionItem {
    /// Raw value; empty string for blank cells.
    pub value: String,
    /// Label to render; blank cells use a placeholder.
    pub display: String,
    pub count: u32,
    pub checked: bool,
}

/// Filter candidate list envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOptionsResponse {
    pub ok: bool,
    pub options: Vec<FilterOptionItem>,
    pub message: String,
}

/// Filter application envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterApplyResponse {
    pub ok: bool,
    /// `false` when every row stays visible.
    pub filtered: bool,
    /// Visible row indexes in ascending order; empty when `filtered=false`.
    pub visible_rows: Vec<u32>,
    pub message: String,
}

/// One template as shown in the template picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateItem {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub rows: u32,
    pub cols: u32,
    pub is_system: bool,
}

/// Template list envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateListResponse {
    pub ok: bool,
    pub templates: Vec<TemplateItem>,
    pub message: String,
}

/// Creates a notebook. Blank `color` uses the default notebook color.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn notebook_create(title: String, color: Option<String>) -> ActionResponse {
    match with_grid_service(|service| {
        service
            .create_notebook(&title, color.as_deref())
            .map_err(|err| err.to_string())
    }) {
        Ok(id) => ActionResponse::success("Notebook created.", Some(id.to_string())),
        Err(err) => action_failure("notebook_create", err),
    }
}

/// Appends a named column to a notebook. Returns the new column index as id.
#[flutter_rust_bridge::frb(sync)]
pub fn column_add(notebook_id: String, name: String) -> ActionResponse {
    let result = parse_notebook_id(&notebook_id).and_then(|id| {
        with_grid_service(|service| service.add_column(id, &name).map_err(|err| err.to_string()))
    });
    match result {
        Ok(index) => ActionResponse::success("Column added.", Some(index.to_string())),
        Err(err) => action_failure("column_add", err),
    }
}

/// Writes one cell's content.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn cell_set(notebook_id: String, row: u32, col: u32, content: String) -> ActionResponse {
    let result = parse_notebook_id(&notebook_id).and_then(|id| {
        with_grid_service(|service| {
            service
                .set_cell(id, row, col, &content)
                .map_err(|err| err.to_string())
        })
    });
    match result {
        Ok(()) => ActionResponse::success("Cell saved.", None),
        Err(err) => action_failure("cell_set", err),
    }
}

/// Sets one cell's display style. Content is left untouched.
///
/// `alignment` is `left|center|right` (case-insensitive).
#[allow(clippy::too_many_arguments)]
#[flutter_rust_bridge::frb(sync)]
pub fn cell_set_style(
    notebook_id: String,
    row: u32,
    col: u32,
    text_color: String,
    background_color: String,
    bold: bool,
    italic: bool,
    text_size: f32,
    alignment: String,
) -> ActionResponse {
    let result = parse_notebook_id(&notebook_id).and_then(|id| {
        let alignment = TextAlignment::parse(&alignment)
            .ok_or_else(|| format!("unsupported text alignment `{}`", alignment.trim()))?;
        let style = CellStyle {
            text_color: text_color.trim().to_ascii_uppercase(),
            background_color: background_color.trim().to_ascii_uppercase(),
            bold,
            italic,
            text_size,
            alignment,
        };
        with_grid_service(|service| {
            service
                .set_cell_style(id, row, col, &style)
                .map_err(|err| err.to_string())
        })
    });
    match result {
        Ok(()) => ActionResponse::success("Cell style saved.", None),
        Err(err) => action_failure("cell_set_style", err),
    }
}

/// Restores the default style of one cell.
#[flutter_rust_bridge::frb(sync)]
pub fn cell_reset_style(notebook_id: String, row: u32, col: u32) -> ActionResponse {
    let result = parse_notebook_id(&notebook_id).and_then(|id| {
        with_grid_service(|service| {
            service
                .reset_cell_style(id, row, col)
                .map_err(|err| err.to_string())
        })
    });
    match result {
        Ok(()) => ActionResponse::success("Cell style reset.", None),
        Err(err) => action_failure("cell_reset_style", err),
    }
}

/// Lists templates, system ones first.
///
/// Input semantics:
/// - `filter`: `system`, `user`, or anything else for all templates.
/// - `query`: case-insensitive match on name or description; blank = all.
#[flutter_rust_bridge::frb(sync)]
pub fn template_list(filter: String, query: String) -> TemplateListResponse {
    let result = with_store(|conn| {
        SqliteTemplateRepository::new(conn)
            .list_templates(TemplateFilter::parse(&filter), Some(query.as_str()))
            .map_err(|err| err.to_string())
    });
    match result {
        Ok(templates) => TemplateListResponse {
            ok: true,
            message: format!("{} template(s).", templates.len()),
            templates: templates.iter().map(to_template_item).collect(),
        },
        Err(err) => {
            warn!("event=ffi_call module=ffi status=error call=template_list");
            TemplateListResponse {
                ok: false,
                templates: Vec::new(),
                message: format!("template_list failed: {err}"),
            }
        }
    }
}

/// Creates a notebook laid out from a stored template.
#[flutter_rust_bridge::frb(sync)]
pub fn notebook_create_from_template(title: String, template_id: i64) -> ActionResponse {
    let result = with_store(|conn| {
        let template = SqliteTemplateRepository::new(conn)
            .get_template(template_id)
            .map_err(|err| err.to_string())?
            .ok_or_else(|| format!("template not found: {template_id}"))?;
        grid_service(conn)
            .create_notebook_from_template(&title, &template)
            .map_err(|err| err.to_string())
    });
    match result {
        Ok(id) => ActionResponse::success("Notebook created.", Some(id.to_string())),
        Err(err) => action_failure("notebook_create_from_template", err),
    }
}

/// Saves a notebook's columns and grid size as a new user template.
#[flutter_rust_bridge::frb(sync)]
pub fn template_save_from_notebook(
    notebook_id: String,
    name: String,
    description: String,
) -> ActionResponse {
    let result = parse_notebook_id(&notebook_id).and_then(|id| {
        with_store(|conn| {
            let template = grid_service(conn)
                .template_from_notebook(id, &name, &description)
                .map_err(|err| err.to_string())?;
            SqliteTemplateRepository::new(conn)
                .create_template(&template)
                .map_err(|err| err.to_string())
        })
    });
    match result {
        Ok(id) => ActionResponse::success("Template saved.", Some(id.to_string())),
        Err(err) => action_failure("template_save_from_notebook", err),
    }
}

/// Lists filter candidates of one column, all checked.
#[flutter_rust_bridge::frb(sync)]
pub fn column_filter_options(notebook_id: String, col: u32) -> FilterOptionsResponse {
    let result = parse_notebook_id(&notebook_id).and_then(|id| {
        with_grid_service(|service| {
            service
                .filter_options(id, col)
                .map_err(|err| err.to_string())
        })
    });
    match result {
        Ok(options) => FilterOptionsResponse {
            ok: true,
            message: format!("{} option(s).", options.len()),
            options: options.iter().map(to_filter_option_item).collect(),
        },
        Err(err) => {
            warn!("event=ffi_call module=ffi status=error call=column_filter_options");
            FilterOptionsResponse {
                ok: false,
                options: Vec::new(),
                message: format!("column_filter_options failed: {err}"),
            }
        }
    }
}

/// Applies a value filter to one column.
///
/// `checked_values` are raw values (`""` for blank cells). An empty list or
/// a list covering every value leaves all rows visible.
#[flutter_rust_bridge::frb(sync)]
pub fn column_apply_filter(
    notebook_id: String,
    col: u32,
    checked_values: Vec<String>,
) -> FilterApplyResponse {
    let checked = checked_values.into_iter().collect::<BTreeSet<_>>();
    let result = parse_notebook_id(&notebook_id).and_then(|id| {
        with_grid_service(|service| {
            let mut options = service
                .filter_options(id, col)
                .map_err(|err| err.to_string())?;
            for option in options.iter_mut() {
                option.checked = checked.contains(option.value());
            }
            service
                .apply_value_filter(id, col, &options)
                .map_err(|err| err.to_string())
        })
    });

    match result {
        Ok(Some(rows)) => FilterApplyResponse {
            ok: true,
            filtered: true,
            message: format!("{} row(s) visible.", rows.len()),
            visible_rows: rows.into_iter().collect(),
        },
        Ok(None) => FilterApplyResponse {
            ok: true,
            filtered: false,
            visible_rows: Vec::new(),
            message: "No filter applied.".to_string(),
        },
        Err(err) => {
            warn!("event=ffi_call module=ffi status=error call=column_apply_filter");
            FilterApplyResponse {
                ok: false,
                filtered: false,
                visible_rows: Vec::new(),
                message: format!("column_apply_filter failed: {err}"),
            }
        }
    }
}

fn action_failure(call: &str, err: String) -> ActionResponse {
    warn!("event=ffi_call module=ffi status=error call={call}");
    ActionResponse::failure(format!("{call} failed: {err}"))
}

fn parse_notebook_id(raw: &str) -> Result<NotebookId, String> {
    Uuid::parse_str(raw.trim()).map_err(|_| format!("invalid notebook id `{}`", raw.trim()))
}

fn resolve_store_db_path() -> Result<PathBuf, String> {
    STORE_DB_PATH
        .get_or_init(|| {
            CoreConfig::from_env()
                .map(|config| config.db_path)
                .map_err(|err| err.to_string())
        })
        .clone()
}

fn open_store() -> Result<Connection, String> {
    let db_path = resolve_store_db_path()?;
    open_db(&db_path).map_err(|err| format!("store DB open failed: {err}"))
}

fn with_store<T>(f: impl FnOnce(&Connection) -> Result<T, String>) -> Result<T, String> {
    let conn = open_store()?;
    f(&conn)
}

fn grid_service(conn: &Connection) -> FfiGridService<'_> {
    GridService::new(
        SqliteNotebookRepository::new(conn),
        SqliteGridRepository::new(conn),
    )
}

fn with_grid_service<T>(
    f: impl FnOnce(&FfiGridService<'_>) -> Result<T, String>,
) -> Result<T, String> {
    with_store(|conn| f(&grid_service(conn)))
}

fn to_filter_option_item(option: &FilterOption) -> FilterOptionItem {
    FilterOptionItem {
        value: option.value().to_string(),
        display: option.display().to_string(),
        count: option.count,
        checked: option.checked,
    }
}

fn to_template_item(template: &Template) -> TemplateItem {
    TemplateItem {
        id: template.id,
        name: template.name.clone(),
        description: template.description.clone(),
        rows: template.rows,
        cols: template.cols,
        is_system: template.is_system,
    }
}

#[cfg(test)]
mod tests {
    use super::{
        cell_reset_style, cell_set, cell_set_style, column_add, column_apply_filter,
        column_filter_options, core_version, init_logging, notebook_create,
        notebook_create_from_template, ping, template_list, template_save_from_notebook,
    };
    use formnote_core::config::ENV_DB_PATH;
    use formnote_core::EMPTY_DISPLAY;
    use std::sync::OnceLock;
    use tempfile::TempDir;

    static TEST_STORE: OnceLock<TempDir> = OnceLock::new();

    /// Points the store at a per-run temp dir before any DB call resolves it.
    fn use_temp_store() {
        TEST_STORE.get_or_init(|| {
            let dir = tempfile::tempdir().expect("temp store dir");
            std::env::set_var(ENV_DB_PATH, dir.path().join("formnote.sqlite3"));
            dir
        });
    }

    fn create_notebook(title: &str) -> String {
        let created = notebook_create(title.to_string(), None);
        assert!(created.ok, "{}", created.message);
        created.id.expect("notebook id")
    }

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_empty_log_dir() {
        let error = init_logging("info".to_string(), String::new());
        assert!(!error.is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        let error = init_logging("verbose".to_string(), "tmp/logs".to_string());
        assert!(!error.is_empty());
    }

    #[test]
    fn notebook_create_rejects_invalid_color() {
        use_temp_store();
        let response = notebook_create("Rooms".to_string(), Some("green".to_string()));
        assert!(!response.ok);
        assert!(response.message.contains("#RRGGBB"));
    }

    #[test]
    fn grid_calls_reject_malformed_notebook_id() {
        use_temp_store();
        let response = cell_set("not-a-uuid".to_string(), 0, 0, "x".to_string());
        assert!(!response.ok);
        assert!(response.message.contains("invalid notebook id"));

        let options = column_filter_options("not-a-uuid".to_string(), 0);
        assert!(!options.ok);
        assert!(options.options.is_empty());
    }

    #[test]
    fn filter_flow_over_created_notebook() {
        use_temp_store();
        let id = create_notebook("Guests");

        let column = column_add(id.clone(), "City".to_string());
        assert!(column.ok, "{}", column.message);
        assert_eq!(column.id.as_deref(), Some("0"));

        for (row, city) in ["Paris", "", "Lyon", "Paris"].into_iter().enumerate() {
            let response = cell_set(id.clone(), row as u32, 0, city.to_string());
            assert!(response.ok, "{}", response.message);
        }

        let options = column_filter_options(id.clone(), 0);
        assert!(options.ok, "{}", options.message);
        let labels = options
            .options
            .iter()
            .map(|option| (option.display.as_str(), option.count))
            .collect::<Vec<_>>();
        assert_eq!(labels, vec![("Paris", 2), ("Lyon", 1), (EMPTY_DISPLAY, 1)]);

        let applied = column_apply_filter(id.clone(), 0, vec!["Paris".to_string()]);
        assert!(applied.ok, "{}", applied.message);
        assert!(applied.filtered);
        assert_eq!(applied.visible_rows, vec![0, 3]);

        let cleared = column_apply_filter(id, 0, Vec::new());
        assert!(cleared.ok);
        assert!(!cleared.filtered);
    }

    #[test]
    fn store_path_comes_from_temp_dir() {
        use_temp_store();
        let dir = TEST_STORE.get().expect("temp store initialized");
        assert_eq!(
            super::resolve_store_db_path().unwrap(),
            dir.path().join("formnote.sqlite3")
        );
    }

    #[test]
    fn template_flow_over_seeded_templates() {
        use_temp_store();
        let listed = template_list("system".to_string(), "民宿".to_string());
        assert!(listed.ok, "{}", listed.message);
        assert_eq!(listed.templates.len(), 1);
        let rooms = &listed.templates[0];
        assert!(rooms.is_system);
        assert_eq!((rooms.rows, rooms.cols), (20, 5));

        let created = notebook_create_from_template("Rooms 2026".to_string(), rooms.id);
        assert!(created.ok, "{}", created.message);
        let id = created.id.expect("notebook id");

        let options = column_filter_options(id.clone(), 0);
        assert!(options.ok, "{}", options.message);
        assert_eq!(options.options.len(), 1);
        assert_eq!(options.options[0].count, 20);

        let name = format!("Rooms layout {id}");
        let saved = template_save_from_notebook(id, name.clone(), String::new());
        assert!(saved.ok, "{}", saved.message);
        let user = template_list("user".to_string(), name.clone());
        assert_eq!(
            user.templates
                .iter()
                .map(|template| template.name.as_str())
                .collect::<Vec<_>>(),
            vec![name.as_str()]
        );

        let missing = notebook_create_from_template("Nowhere".to_string(), -1);
        assert!(!missing.ok);
        assert!(missing.message.contains("template not found"));
    }

    #[test]
    fn cell_style_calls_validate_input() {
        use_temp_store();
        let id = create_notebook("Styled");

        let saved = cell_set_style(
            id.clone(),
            0,
            0,
            "#ff0000".to_string(),
            "#ffffff".to_string(),
            true,
            false,
            16.0,
            "CENTER".to_string(),
        );
        assert!(saved.ok, "{}", saved.message);

        let bad = cell_set_style(
            id.clone(),
            0,
            0,
            "#ff0000".to_string(),
            "#ffffff".to_string(),
            false,
            false,
            16.0,
            "justify".to_string(),
        );
        assert!(!bad.ok);
        assert!(bad.message.contains("alignment"));

        let reset = cell_reset_style(id, 0, 0);
        assert!(reset.ok, "{}", reset.message);
    }
}
