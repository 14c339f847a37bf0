//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `formnote_core` linkage.
//! - Exercise the SQLite store and the filter pipeline on a throwaway
//!   in-memory notebook.
//! - Keep output deterministic for quick local sanity checks.

use formnote_core::db::open_db_in_memory;
use formnote_core::{GridService, SqliteGridRepository, SqliteNotebookRepository};
use std::error::Error;
use std::process::ExitCode;

const SAMPLE_CITIES: &[&str] = &["Paris", "Lyon", "", "Paris", "Nice"];

fn main() -> ExitCode {
    println!("formnote_core ping={}", formnote_core::ping());
    println!("formnote_core version={}", formnote_core::core_version());

    match print_filter_summary() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("formnote_core smoke failed: {err}");
            ExitCode::FAILURE
        }
    }
}

fn print_filter_summary() -> Result<(), Box<dyn Error>> {
    let conn = open_db_in_memory()?;
    let service = GridService::new(
        SqliteNotebookRepository::new(&conn),
        SqliteGridRepository::new(&conn),
    );

    let notebook_id = service.create_notebook("Smoke", None)?;
    let column = service.add_column(notebook_id, "City")?;
    for (row, city) in SAMPLE_CITIES.iter().enumerate() {
        service.set_cell(notebook_id, u32::try_from(row)?, column, city)?;
    }

    for option in service.filter_options(notebook_id, column)? {
        println!("filter option={} count={}", option.display(), option.count);
    }
    Ok(())
}
