//! Schema migrations for the graph store.
//!
//! # Responsibility
//! - Keep the ordered list of schema steps for entities, capabilities and links.
//! - Bring a connection up to the newest schema in one transaction.
//!
//! # Invariants
//! - Step versions start at 1 and increase by exactly one.
//! - `PRAGMA user_version` always equals the last applied step.
//! - A database written by a newer binary is refused, never downgraded.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::Connection;

#[derive(Debug, Clone, Copy)]
struct SchemaStep {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const SCHEMA_STEPS: &[SchemaStep] = &[SchemaStep {
    version: 1,
    name: "init_graph",
    sql: include_str!("0001_init.sql"),
}];

/// Returns the newest schema version this build can write.
pub fn latest_version() -> u32 {
    SCHEMA_STEPS.last().map_or(0, |step| step.version)
}

/// Reads the schema version recorded in `PRAGMA user_version`.
///
/// # Errors
/// - Returns `DbError::Sqlite` when the pragma cannot be read, for example on
///   a closed or non-SQLite file.
pub fn current_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}

/// Applies every step newer than the recorded version.
///
/// Returns how many steps ran; `0` when the schema was already current.
///
/// # Errors
/// - `DbError::UnsupportedSchemaVersion` when the database is newer than
///   [`latest_version`].
/// - `DbError::Sqlite` when a step fails; nothing from the run is kept.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<usize> {
    let recorded = current_version(conn)?;
    let latest = latest_version();

    if recorded > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: recorded,
            latest_supported: latest,
        });
    }

    let pending: Vec<&SchemaStep> = SCHEMA_STEPS
        .iter()
        .filter(|step| step.version > recorded)
        .collect();
    if pending.is_empty() {
        return Ok(0);
    }

    let tx = conn.transaction()?;
    for step in &pending {
        tx.execute_batch(step.sql)?;
        tx.execute_batch(&format!("PRAGMA user_version = {};", step.version))?;
        info!(
            "event=db_migrate module=db status=ok version={} name={}",
            step.version, step.name
        );
    }
    tx.commit()?;

    Ok(pending.len())
}
