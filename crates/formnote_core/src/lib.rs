//! Core domain logic for FormNote, a grid-based note book.
//! This crate is the single source of truth for business invariants.

pub mod config;
pub mod db;
pub mod event;
pub mod logging;
pub mod model;
pub mod notice;
pub mod permission;
pub mod repo;
pub mod service;

pub use config::{ConfigError, CoreConfig};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use event::live_value::{Lifecycle, LifecycleState, LiveValue, ObserverId};
pub use event::single_fire::{EventChannelError, SingleFireEvent};
pub use logging::{default_log_level, init_logging, init_logging_from_config, logging_status};
pub use model::cell::{Cell, CellStyle, CellStyleError, CellType, TextAlignment};
pub use model::column::{Column, SortOrder};
pub use model::filter_option::{FilterOption, EMPTY_DISPLAY};
pub use model::notebook::{Notebook, NotebookId, NotebookValidationError};
pub use model::template::{Template, TemplateId, TemplateLayout, TemplateValidationError};
pub use notice::{
    ActionMessages, ActionOutcome, ExternalAction, Notice, NoticeCenter, NoticeDuration,
    NoticeKind, UNKNOWN_ERROR_MESSAGE,
};
pub use permission::gate::{
    MemoryPermissionGate, PermissionCallback, PermissionGate, PermissionGuard,
};
pub use permission::kind::{parse_permission_kind, PermissionKind, PermissionKindError};
pub use repo::grid_repo::{GridRepository, SqliteGridRepository};
pub use repo::notebook_repo::{
    NotebookRepository, RepoError, RepoResult, SqliteNotebookRepository,
};
pub use repo::template_repo::{SqliteTemplateRepository, TemplateFilter, TemplateRepository};
pub use service::filter::FilterSelection;
pub use service::grid_service::{GridResult, GridService, GridServiceError};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
