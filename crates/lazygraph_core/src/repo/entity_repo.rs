//! Entity repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Own the entity lifecycle: create, list, get, update, delete.
//! - Compose the capability and link repositories for nested reads and writes.
//! - Be the single enforcement point of entity ownership.
//!
//! # Invariants
//! - Entity + initial capability batch are written in the caller's
//!   transaction; any failure leaves neither behind after rollback.
//! - `owner_id` is written once on insert and never updated.
//! - Deletes rely on `ON DELETE CASCADE` for capabilities and links.
//! - Lists are newest-first and only ever include the caller's entities.

use crate::error::{GraphError, GraphResult};
use crate::model::entity::{Entity, EntityId, EntityListFilter, EntityPatch, NewEntity};
use crate::model::owner::OwnerId;
use crate::model::record::{DeletionReceipt, RecordKind};
use crate::repo::access::authorize_entity;
use crate::repo::capability_repo::SqliteCapabilityRepository;
use crate::repo::link_repo::SqliteLinkRepository;
use crate::repo::{now_epoch_ms, parse_id, NEWEST_FIRST};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use uuid::Uuid;

const ENTITY_SELECT_SQL: &str = "SELECT
    id,
    title,
    content,
    priority,
    owner_id,
    created_at,
    updated_at
FROM entities";

/// Repository contract for entity persistence.
pub trait EntityRepository {
    /// Creates an entity owned by `owner` together with its capability batch.
    fn create_entity(&self, payload: &NewEntity, owner: &OwnerId) -> GraphResult<Entity>;
    /// Lists the caller's entities matching `filter`, newest-first.
    fn list_entities(
        &self,
        owner: &OwnerId,
        filter: &EntityListFilter,
    ) -> GraphResult<Vec<Entity>>;
    /// Loads one entity owned by `owner`.
    ///
    /// # Errors
    /// - `NotFound` when no entity has this id.
    /// - `Forbidden` when it belongs to another owner.
    fn get_entity(&self, id: EntityId, owner: &OwnerId) -> GraphResult<Entity>;
    /// Applies the present fields of `patch` and appends its capabilities.
    fn update_entity(
        &self,
        id: EntityId,
        patch: &EntityPatch,
        owner: &OwnerId,
    ) -> GraphResult<Entity>;
    /// Deletes one entity owned by `owner`; capabilities and links on either
    /// side cascade.
    fn delete_entity(&self, id: EntityId, owner: &OwnerId) -> GraphResult<DeletionReceipt>;
}

/// SQLite-backed entity repository bound to one connection or open transaction.
pub struct SqliteEntityRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteEntityRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn load(&self, id: EntityId) -> GraphResult<Entity> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ENTITY_SELECT_SQL} WHERE id = ?1;"))?;
        let found = stmt
            .query_row([id.to_string()], |row| Ok(parse_entity_row(row)))
            .optional()?;
        match found {
            Some(parsed) => self.hydrate(parsed?),
            None => Err(GraphError::not_found(RecordKind::Entity, id)),
        }
    }

    fn hydrate(&self, mut entity: Entity) -> GraphResult<Entity> {
        let links = self.links().links_for(entity.id)?;
        entity.capabilities = self.capabilities().list_for_entity(entity.id)?;
        entity.outgoing_links = links.outgoing;
        entity.incoming_links = links.incoming;
        Ok(entity)
    }

    fn capabilities(&self) -> SqliteCapabilityRepository<'conn> {
        SqliteCapabilityRepository::new(self.conn)
    }

    fn links(&self) -> SqliteLinkRepository<'conn> {
        SqliteLinkRepository::new(self.conn)
    }
}

impl EntityRepository for SqliteEntityRepository<'_> {
    fn create_entity(&self, payload: &NewEntity, owner: &OwnerId) -> GraphResult<Entity> {
        payload.validate()?;

        let id = Uuid::new_v4();
        let now = now_epoch_ms();
        self.conn.execute(
            "INSERT INTO entities (
                id,
                title,
                content,
                priority,
                owner_id,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6);",
            params![
                id.to_string(),
                payload.title.as_str(),
                payload.content.as_deref(),
                payload.priority,
                owner.as_str(),
                now,
            ],
        )?;

        self.capabilities().insert_batch(id, &payload.capabilities)?;
        self.load(id)
    }

    fn list_entities(
        &self,
        owner: &OwnerId,
        filter: &EntityListFilter,
    ) -> GraphResult<Vec<Entity>> {
        let mut sql = format!("{ENTITY_SELECT_SQL} WHERE owner_id = ?");
        let mut bind_values: Vec<Value> = vec![Value::Text(owner.as_str().to_string())];

        if let Some(kind) = filter.kind.as_ref() {
            sql.push_str(
                " AND EXISTS (
                    SELECT 1
                    FROM capabilities c
                    WHERE c.entity_id = entities.id
                      AND c.type = ?
                )",
            );
            bind_values.push(Value::Text(kind.clone()));
        }
        sql.push_str(&format!(" ORDER BY {NEWEST_FIRST}"));

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut entities = Vec::new();
        while let Some(row) = rows.next()? {
            let entity = parse_entity_row(row)?;
            // SQLite's LIKE/lower() only fold ASCII; search is matched here.
            if filter.matches_search(&entity.title, entity.content.as_deref()) {
                entities.push(self.hydrate(entity)?);
            }
        }

        Ok(entities)
    }

    fn get_entity(&self, id: EntityId, owner: &OwnerId) -> GraphResult<Entity> {
        authorize_entity(self.conn, id, owner)?;
        self.load(id)
    }

    fn update_entity(
        &self,
        id: EntityId,
        patch: &EntityPatch,
        owner: &OwnerId,
    ) -> GraphResult<Entity> {
        authorize_entity(self.conn, id, owner)?;
        patch.validate()?;

        let mut assignments = vec!["updated_at = ?"];
        let mut bind_values: Vec<Value> = vec![Value::Integer(now_epoch_ms())];
        if let Some(title) = patch.title.as_ref() {
            assignments.push("title = ?");
            bind_values.push(Value::Text(title.clone()));
        }
        if let Some(content) = patch.content.as_ref() {
            assignments.push("content = ?");
            bind_values.push(content.clone().map_or(Value::Null, Value::Text));
        }
        if let Some(priority) = patch.priority {
            assignments.push("priority = ?");
            bind_values.push(priority.map_or(Value::Null, Value::Integer));
        }
        bind_values.push(Value::Text(id.to_string()));

        self.conn.execute(
            &format!(
                "UPDATE entities SET {} WHERE id = ?;",
                assignments.join(", ")
            ),
            params_from_iter(bind_values),
        )?;

        self.capabilities().insert_batch(id, &patch.capabilities)?;
        self.load(id)
    }

    fn delete_entity(&self, id: EntityId, owner: &OwnerId) -> GraphResult<DeletionReceipt> {
        authorize_entity(self.conn, id, owner)?;
        self.conn
            .execute("DELETE FROM entities WHERE id = ?1;", [id.to_string()])?;
        Ok(DeletionReceipt::new(RecordKind::Entity, id))
    }
}

/// Parses entity columns; nested collections are filled by `hydrate`.
fn parse_entity_row(row: &Row<'_>) -> GraphResult<Entity> {
    let id_text: String = row.get("id")?;
    Ok(Entity {
        id: parse_id(&id_text, "entities.id")?,
        title: row.get("title")?,
        content: row.get("content")?,
        priority: row.get("priority")?,
        owner_id: OwnerId::from_stored(row.get("owner_id")?),
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        capabilities: Vec::new(),
        outgoing_links: Vec::new(),
        incoming_links: Vec::new(),
    })
}
