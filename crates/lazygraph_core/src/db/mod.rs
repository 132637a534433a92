//! SQLite storage bootstrap, schema migration and connection sharing.
//!
//! # Responsibility
//! - Open and configure SQLite connections for the graph core.
//! - Apply schema migrations in deterministic order.
//! - Share one connection across request threads with scoped transactions.
//! - Run the background keep-alive probe.
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - Core code must not read/write application data before migrations succeed.
//! - Every connection runs with `foreign_keys=ON` so deletes cascade.

use thiserror::Error;

pub mod keep_alive;
pub mod migrations;
mod open;
mod shared;

pub use keep_alive::{spawn_keep_alive, KeepAliveHandle, LivenessProbe};
pub use open::{open_db, open_db_in_memory, open_db_with, DEFAULT_BUSY_TIMEOUT};
pub use shared::SharedDb;

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
    #[error("database schema version {db_version} is newer than supported {latest_supported}")]
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    /// Persisted row cannot be converted into a valid domain record.
    #[error("invalid persisted data: {0}")]
    InvalidData(String),
    #[error("cannot start keep-alive thread: {0}")]
    KeepAliveSpawn(#[source] std::io::Error),
}
