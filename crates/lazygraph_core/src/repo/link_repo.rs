//! Link repository contracts and SQLite implementation for directed, typed
//! edges between entities.
//!
//! # Responsibility
//! - Create edges from an entity owned by the caller to any existing entity.
//! - List one-hop edges of a single entity.
//!
//! # Invariants
//! - Self-links are rejected before any lookup.
//! - `(source_id, target_id, type)` uniqueness is enforced by the schema; a
//!   violation surfaces as `Conflict`, never as a silent duplicate.
//! - The target may belong to another owner; only the source is authorized.

use crate::error::{GraphError, GraphResult};
use crate::model::entity::EntityId;
use crate::model::link::{EntityLinks, Link, NewLink};
use crate::model::owner::OwnerId;
use crate::repo::access::{authorize_entity, ensure_entity_exists};
use crate::repo::{now_epoch_ms, parse_id, NEWEST_FIRST};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

const LINK_SELECT_SQL: &str = "SELECT
    id,
    type,
    source_id,
    target_id,
    created_at
FROM links";

/// Repository contract for link persistence.
pub trait LinkRepository {
    /// Creates the edge `source_id -> target_id` of type `kind`.
    ///
    /// # Errors
    /// - `Validation` for self-links or a blank type.
    /// - `NotFound`/`Forbidden` when the source is missing or foreign.
    /// - `NotFound` when the target is missing.
    /// - `Conflict` when the same typed edge already exists.
    fn create_link(
        &self,
        source_id: EntityId,
        target_id: EntityId,
        kind: &str,
        owner: &OwnerId,
    ) -> GraphResult<Link>;
    /// Lists one-hop edges of an entity owned by `owner`.
    fn list_links(&self, entity_id: EntityId, owner: &OwnerId) -> GraphResult<EntityLinks>;
}

/// SQLite-backed link repository bound to one connection or open transaction.
pub struct SqliteLinkRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteLinkRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Lists edges of an already-authorized entity.
    pub(crate) fn links_for(&self, entity_id: EntityId) -> GraphResult<EntityLinks> {
        Ok(EntityLinks {
            outgoing: self.query_links("source_id", entity_id)?,
            incoming: self.query_links("target_id", entity_id)?,
        })
    }

    fn query_links(&self, column: &'static str, entity_id: EntityId) -> GraphResult<Vec<Link>> {
        let mut stmt = self.conn.prepare(&format!(
            "{LINK_SELECT_SQL} WHERE {column} = ?1 ORDER BY {NEWEST_FIRST};"
        ))?;
        let mut rows = stmt.query([entity_id.to_string()])?;
        let mut links = Vec::new();
        while let Some(row) = rows.next()? {
            links.push(parse_link_row(row)?);
        }
        Ok(links)
    }
}

impl LinkRepository for SqliteLinkRepository<'_> {
    fn create_link(
        &self,
        source_id: EntityId,
        target_id: EntityId,
        kind: &str,
        owner: &OwnerId,
    ) -> GraphResult<Link> {
        let payload = NewLink::new(source_id, target_id, kind);
        payload.validate()?;
        authorize_entity(self.conn, source_id, owner)?;
        ensure_entity_exists(self.conn, target_id)?;

        let link = Link {
            id: Uuid::new_v4(),
            kind: payload.kind,
            source_id,
            target_id,
            created_at: now_epoch_ms(),
        };
        let inserted = self.conn.execute(
            "INSERT INTO links (id, type, source_id, target_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                link.id.to_string(),
                link.kind.as_str(),
                source_id.to_string(),
                target_id.to_string(),
                link.created_at,
            ],
        );

        match inserted {
            Ok(_) => Ok(link),
            Err(err) if is_unique_violation(&err) => Err(GraphError::Conflict(format!(
                "link `{}` from {source_id} to {target_id} already exists",
                link.kind
            ))),
            Err(err) => Err(err.into()),
        }
    }

    fn list_links(&self, entity_id: EntityId, owner: &OwnerId) -> GraphResult<EntityLinks> {
        authorize_entity(self.conn, entity_id, owner)?;
        self.links_for(entity_id)
    }
}

fn parse_link_row(row: &Row<'_>) -> GraphResult<Link> {
    let id_text: String = row.get("id")?;
    let source_text: String = row.get("source_id")?;
    let target_text: String = row.get("target_id")?;
    Ok(Link {
        id: parse_id(&id_text, "links.id")?,
        kind: row.get("type")?,
        source_id: parse_id(&source_text, "links.source_id")?,
        target_id: parse_id(&target_text, "links.target_id")?,
        created_at: row.get("created_at")?,
    })
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(inner, _)
            if inner.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

