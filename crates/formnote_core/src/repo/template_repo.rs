//! Template repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Store user templates next to the system templates seeded by migration.
//! - List templates by origin with an optional text query.
//!
//! # Invariants
//! - Template names are unique.
//! - Templates created through this API are user templates.
//! - System templates are never deleted.

use crate::model::notebook::now_epoch_ms;
use crate::model::template::{Template, TemplateId};
use crate::repo::notebook_repo::{int_to_bool, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};

const TEMPLATE_SELECT_SQL: &str = "SELECT
    id,
    name,
    description,
    rows,
    cols,
    data,
    is_system,
    created_at
FROM templates";

/// Which templates a listing returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TemplateFilter {
    #[default]
    All,
    System,
    User,
}

impl TemplateFilter {
    /// Parses `system`/`user`; anything else lists all templates.
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "system" => Self::System,
            "user" => Self::User,
            _ => Self::All,
        }
    }
}

/// Repository interface for notebook templates.
pub trait TemplateRepository {
    /// Stores `template` as a user template. Returns the assigned id.
    fn create_template(&self, template: &Template) -> RepoResult<TemplateId>;
    fn get_template(&self, id: TemplateId) -> RepoResult<Option<Template>>;
    /// Lists system templates first, then newest first. A non-blank `query`
    /// keeps templates whose name or description contains it, ignoring case.
    fn list_templates(&self, filter: TemplateFilter, query: Option<&str>)
        -> RepoResult<Vec<Template>>;
    fn delete_template(&self, id: TemplateId) -> RepoResult<()>;
}

/// SQLite-backed template repository.
pub struct SqliteTemplateRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTemplateRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl TemplateRepository for SqliteTemplateRepository<'_> {
    fn create_template(&self, template: &Template) -> RepoResult<TemplateId> {
        template.validate()?;
        let name = template.name.trim();

        let taken = self
            .conn
            .query_row("SELECT 1 FROM templates WHERE name = ?1;", [name], |_| Ok(()))
            .optional()?;
        if taken.is_some() {
            return Err(RepoError::DuplicateTemplateName(name.to_string()));
        }

        self.conn.execute(
            "INSERT INTO templates (
                name,
                description,
                rows,
                cols,
                data,
                is_system,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6);",
            params![
                name,
                template.description.trim(),
                template.rows,
                template.cols,
                template.data.as_deref(),
                now_epoch_ms().max(template.created_at),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_template(&self, id: TemplateId) -> RepoResult<Option<Template>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TEMPLATE_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_template_row(row)?));
        }
        Ok(None)
    }

    fn list_templates(
        &self,
        filter: TemplateFilter,
        query: Option<&str>,
    ) -> RepoResult<Vec<Template>> {
        let where_clause = match filter {
            TemplateFilter::All => "",
            TemplateFilter::System => " WHERE is_system = 1",
            TemplateFilter::User => " WHERE is_system = 0",
        };
        let mut stmt = self.conn.prepare(&format!(
            "{TEMPLATE_SELECT_SQL}{where_clause} ORDER BY is_system DESC, created_at DESC, id ASC;"
        ))?;
        let mut rows = stmt.query([])?;

        let query = query.unwrap_or_default();
        let mut templates = Vec::new();
        while let Some(row) = rows.next()? {
            let template = parse_template_row(row)?;
            if template.matches_query(query) {
                templates.push(template);
            }
        }
        Ok(templates)
    }

    fn delete_template(&self, id: TemplateId) -> RepoResult<()> {
        let template = self
            .get_template(id)?
            .ok_or(RepoError::TemplateNotFound(id))?;
        if template.is_system {
            return Err(RepoError::ReadOnlyTemplate(id));
        }
        self.conn
            .execute("DELETE FROM templates WHERE id = ?1 AND is_system = 0;", [id])?;
        Ok(())
    }
}

fn parse_template_row(row: &Row<'_>) -> RepoResult<Template> {
    let template = Template {
        id: row.get("id")?,
        name: row.get("name")?,
        description: row.get::<_, Option<String>>("description")?.unwrap_or_default(),
        rows: row.get("rows")?,
        cols: row.get("cols")?,
        data: row.get("data")?,
        is_system: int_to_bool(row.get("is_system")?, "templates.is_system")?,
        created_at: row.get("created_at")?,
    };
    template.validate().map_err(|err| {
        RepoError::InvalidData(format!("template {} is not usable: {err}", template.id))
    })?;
    Ok(template)
}
