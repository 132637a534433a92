//! Transaction-scoped repositories for entities, capabilities and links.
//!
//! # Responsibility
//! - Keep SQL details inside the core persistence boundary.
//! - Enforce ownership through one authorization primitive (`access`).
//!
//! # Invariants
//! - Repositories borrow a connection or open transaction; they never commit.
//! - Every scoped operation authorizes before touching data.
//! - Read paths reject invalid persisted state instead of masking it.

pub mod access;
pub mod capability_repo;
pub mod entity_repo;
pub mod link_repo;

use crate::db::DbError;
use crate::error::GraphResult;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Newest-first ordering with insertion order breaking same-millisecond ties.
pub(crate) const NEWEST_FIRST: &str = "created_at DESC, rowid DESC";

pub(crate) fn parse_id(value: &str, column: &str) -> GraphResult<Uuid> {
    Uuid::parse_str(value).map_err(|_| {
        DbError::InvalidData(format!("invalid uuid value `{value}` in {column}")).into()
    })
}

pub(crate) fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or_default()
}
