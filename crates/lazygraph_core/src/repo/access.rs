//! Ownership authorization primitive.
//!
//! Every scoped operation resolves the owning entity's `owner_id` and routes
//! it through [`check_owner`]: missing rows are `NotFound`, foreign rows are
//! `Forbidden`.

use crate::error::{GraphError, GraphResult};
use crate::model::capability::CapabilityId;
use crate::model::entity::EntityId;
use crate::model::owner::OwnerId;
use crate::model::record::RecordKind;
use rusqlite::{Connection, OptionalExtension};
use uuid::Uuid;

/// Fails unless entity `id` exists and belongs to `owner`.
pub fn authorize_entity(conn: &Connection, id: EntityId, owner: &OwnerId) -> GraphResult<()> {
    let stored = conn
        .query_row(
            "SELECT owner_id FROM entities WHERE id = ?1;",
            [id.to_string()],
            |row| row.get::<_, String>(0),
        )
        .optional()?;
    check_owner(RecordKind::Entity, id, stored, owner)
}

/// Fails unless capability `id` exists and its entity belongs to `owner`.
pub fn authorize_capability(
    conn: &Connection,
    id: CapabilityId,
    owner: &OwnerId,
) -> GraphResult<()> {
    let stored = conn
        .query_row(
            "SELECT e.owner_id
             FROM capabilities c
             INNER JOIN entities e ON e.id = c.entity_id
             WHERE c.id = ?1;",
            [id.to_string()],
            |row| row.get::<_, String>(0),
        )
        .optional()?;
    check_owner(RecordKind::Capability, id, stored, owner)
}

/// Fails with `NotFound` unless entity `id` exists, regardless of owner.
pub fn ensure_entity_exists(conn: &Connection, id: EntityId) -> GraphResult<()> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM entities WHERE id = ?1);",
        [id.to_string()],
        |row| row.get(0),
    )?;
    if exists == 1 {
        Ok(())
    } else {
        Err(GraphError::not_found(RecordKind::Entity, id))
    }
}

fn check_owner(
    kind: RecordKind,
    id: Uuid,
    stored_owner: Option<String>,
    caller: &OwnerId,
) -> GraphResult<()> {
    match stored_owner {
        None => Err(GraphError::not_found(kind, id)),
        Some(owner) if owner == caller.as_str() => Ok(()),
        Some(_) => Err(GraphError::forbidden(kind, id)),
    }
}
