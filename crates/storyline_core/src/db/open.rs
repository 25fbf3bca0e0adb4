//! Connection bootstrap utilities for project databases.
//!
//! # Responsibility
//! - Open file or in-memory SQLite connections.
//! - Configure pragmas and run the missing schema steps before handing out
//!   a connection.
//!
//! # Invariants
//! - Returned connections have `foreign_keys=ON`.
//! - Returned connections have migrations fully applied.

use super::migrations::apply_migrations;
use super::{DbError, DbResult, IN_MEMORY_LOCATION};
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

/// Opens (or creates) a project database file and applies pending migrations.
///
/// # Side effects
/// - Emits `db_open` logging events with duration and status.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    let path = path.as_ref();
    open_with("file", path.display().to_string(), || Connection::open(path))
}

/// Opens an in-memory project database and applies all migrations.
pub fn open_db_in_memory() -> DbResult<Connection> {
    open_with("memory", IN_MEMORY_LOCATION.to_string(), Connection::open_in_memory)
}

fn open_with(
    mode: &'static str,
    location: String,
    connect: impl FnOnce() -> rusqlite::Result<Connection>,
) -> DbResult<Connection> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode={mode}");

    let mut conn = match connect().and_then(|conn| configure(&conn).map(|()| conn)) {
        Ok(conn) => conn,
        Err(source) => {
            error!(
                "event=db_open module=db status=error mode={} location={} duration_ms={} error_code=db_open_failed error={}",
                mode,
                location,
                started_at.elapsed().as_millis(),
                source
            );
            return Err(DbError::Open { location, source });
        }
    };

    let applied = apply_migrations(&mut conn).map_err(|err| {
        error!(
            "event=db_open module=db status=error mode={} location={} duration_ms={} error_code=db_schema_failed error={}",
            mode,
            location,
            started_at.elapsed().as_millis(),
            err
        );
        err
    })?;

    info!(
        "event=db_open module=db status=ok mode={} location={} duration_ms={} schema_steps_applied={}",
        mode,
        location,
        started_at.elapsed().as_millis(),
        applied.len()
    );
    Ok(conn)
}

fn configure(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_secs(5))
}
