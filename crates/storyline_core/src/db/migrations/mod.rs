//! Named project schema steps.
//!
//! # Responsibility
//! - List the schema steps a project file goes through, oldest first.
//! - Run the steps a file is missing inside one transaction.
//!
//! # Invariants
//! - Step versions start at 1 and increase by one.
//! - `PRAGMA user_version` equals the last step applied.

use crate::db::{DbError, DbResult};
use log::{error, info};
use rusqlite::{Connection, Transaction};

#[derive(Debug, Clone, Copy)]
struct SchemaStep {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const SCHEMA_STEPS: &[SchemaStep] = &[SchemaStep {
    version: 1,
    name: "project_tree",
    sql: include_str!("0001_init.sql"),
}];

/// A schema step run by [`apply_migrations`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppliedStep {
    pub version: u32,
    pub name: &'static str,
}

/// Returns the schema version written by this build.
pub fn latest_version() -> u32 {
    SCHEMA_STEPS.last().map_or(0, |step| step.version)
}

/// Name of the schema step that produces `version`.
pub fn step_name(version: u32) -> Option<&'static str> {
    SCHEMA_STEPS
        .iter()
        .find(|step| step.version == version)
        .map(|step| step.name)
}

/// Brings a project file up to [`latest_version`].
///
/// Returns the steps that ran, empty when the file was current. Nothing is
/// committed when a step fails.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<Vec<AppliedStep>> {
    let current_version = current_user_version(conn)?;
    let latest = latest_version();

    if current_version > latest {
        error!(
            "event=db_migrate module=db status=error error_code=schema_too_new db_version={} latest_supported={}",
            current_version, latest
        );
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: current_version,
            latest_supported: latest,
        });
    }

    let pending: Vec<&SchemaStep> = SCHEMA_STEPS
        .iter()
        .filter(|step| step.version > current_version)
        .collect();
    if pending.is_empty() {
        return Ok(Vec::new());
    }

    let tx = conn.transaction()?;
    let mut applied = Vec::with_capacity(pending.len());
    for step in pending {
        run_step(&tx, step)?;
        info!(
            "event=db_migrate module=db status=step_applied version={} name={}",
            step.version, step.name
        );
        applied.push(AppliedStep {
            version: step.version,
            name: step.name,
        });
    }
    tx.commit()?;

    info!(
        "event=db_migrate module=db status=ok from_version={} to_version={} steps={}",
        current_version,
        latest,
        applied.len()
    );
    Ok(applied)
}

fn run_step(tx: &Transaction<'_>, step: &SchemaStep) -> DbResult<()> {
    tx.execute_batch(step.sql)
        .and_then(|()| tx.execute_batch(&format!("PRAGMA user_version = {};", step.version)))
        .map_err(|source| {
            error!(
                "event=db_migrate module=db status=error error_code=schema_step_failed version={} name={} error={}",
                step.version, step.name, source
            );
            DbError::SchemaStep {
                version: step.version,
                name: step.name,
                source,
            }
        })
}

fn current_user_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}
