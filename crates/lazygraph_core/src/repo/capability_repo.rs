//! Capability repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist typed attribute records bound to one entity.
//! - Scope every read and write to the owner of the bound entity.
//! - Insert capability batches inside the caller's transaction.
//!
//! # Invariants
//! - Stored `data` is always a JSON object (`{}` when the caller omits it).
//! - A batch item failing validation aborts the batch; the enclosing
//!   transaction is rolled back by the caller, so no partial batch is visible.
//! - Lists are newest-first.

use crate::db::DbError;
use crate::error::{GraphError, GraphResult};
use crate::model::capability::{
    Capability, CapabilityData, CapabilityDraft, CapabilityId, CapabilityListFilter,
    CapabilityPatch, NewCapability,
};
use crate::model::entity::EntityId;
use crate::model::owner::OwnerId;
use crate::model::record::{DeletionReceipt, RecordKind};
use crate::model::validation::ValidationError;
use crate::repo::access::{authorize_capability, authorize_entity};
use crate::repo::{now_epoch_ms, parse_id, NEWEST_FIRST};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use uuid::Uuid;

const CAPABILITY_SELECT_SQL: &str = "SELECT
    id,
    entity_id,
    type,
    data,
    created_at
FROM capabilities";

/// Repository contract for capability persistence.
pub trait CapabilityRepository {
    /// Attaches one capability to an entity owned by `owner`.
    fn create_capability(
        &self,
        payload: NewCapability,
        owner: &OwnerId,
    ) -> GraphResult<Capability>;
    /// Lists the caller's capabilities, optionally by type and/or entity.
    fn list_capabilities(
        &self,
        owner: &OwnerId,
        filter: &CapabilityListFilter,
    ) -> GraphResult<Vec<Capability>>;
    /// Loads one capability whose entity belongs to `owner`.
    fn get_capability(&self, id: CapabilityId, owner: &OwnerId) -> GraphResult<Capability>;
    /// Applies the present fields of `patch`; absent fields stay unchanged.
    fn update_capability(
        &self,
        id: CapabilityId,
        patch: &CapabilityPatch,
        owner: &OwnerId,
    ) -> GraphResult<Capability>;
    /// Deletes one capability whose entity belongs to `owner`.
    fn delete_capability(
        &self,
        id: CapabilityId,
        owner: &OwnerId,
    ) -> GraphResult<DeletionReceipt>;
    /// Lists every capability of one entity owned by `owner`.
    fn list_by_entity(
        &self,
        entity_id: EntityId,
        owner: &OwnerId,
    ) -> GraphResult<Vec<Capability>>;
    /// Inserts a whole batch for one entity and returns its refreshed list.
    ///
    /// Must run inside a transaction: a failing item leaves earlier items
    /// written until the caller rolls back.
    fn create_many(
        &self,
        entity_id: EntityId,
        drafts: &[CapabilityDraft],
        owner: &OwnerId,
    ) -> GraphResult<Vec<Capability>>;
}

/// SQLite-backed capability repository bound to one connection or open
/// transaction.
pub struct SqliteCapabilityRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCapabilityRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Inserts `drafts` for an already-authorized entity.
    pub(crate) fn insert_batch(
        &self,
        entity_id: EntityId,
        drafts: &[CapabilityDraft],
    ) -> GraphResult<()> {
        for (index, draft) in drafts.iter().enumerate() {
            draft
                .validate()
                .map_err(|source| ValidationError::InvalidBatchItem {
                    index,
                    source: Box::new(source),
                })?;
            self.insert_draft(entity_id, draft)?;
        }
        Ok(())
    }

    /// Lists capabilities of an already-authorized entity.
    pub(crate) fn list_for_entity(&self, entity_id: EntityId) -> GraphResult<Vec<Capability>> {
        let sql = format!("{CAPABILITY_SELECT_SQL} WHERE entity_id = ? ORDER BY {NEWEST_FIRST}");
        self.query_capabilities(&sql, vec![Value::Text(entity_id.to_string())])
    }

    fn insert_draft(&self, entity_id: EntityId, draft: &CapabilityDraft) -> GraphResult<CapabilityId> {
        let id = Uuid::new_v4();
        let data = encode_data(&draft.data_or_default())?;
        self.conn.execute(
            "INSERT INTO capabilities (id, entity_id, type, data, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                id.to_string(),
                entity_id.to_string(),
                draft.kind.as_str(),
                data,
                now_epoch_ms(),
            ],
        )?;
        Ok(id)
    }

    fn load(&self, id: CapabilityId) -> GraphResult<Capability> {
        let mut stmt = self
            .conn
            .prepare(&format!("{CAPABILITY_SELECT_SQL} WHERE id = ?1;"))?;
        let found = stmt
            .query_row([id.to_string()], |row| Ok(parse_capability_row(row)))
            .optional()?;
        match found {
            Some(parsed) => parsed,
            None => Err(GraphError::not_found(RecordKind::Capability, id)),
        }
    }

    fn query_capabilities(&self, sql: &str, bind_values: Vec<Value>) -> GraphResult<Vec<Capability>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut capabilities = Vec::new();
        while let Some(row) = rows.next()? {
            capabilities.push(parse_capability_row(row)?);
        }
        Ok(capabilities)
    }
}

impl CapabilityRepository for SqliteCapabilityRepository<'_> {
    fn create_capability(
        &self,
        payload: NewCapability,
        owner: &OwnerId,
    ) -> GraphResult<Capability> {
        let (entity_id, draft) = payload.into_parts()?;
        authorize_entity(self.conn, entity_id, owner)?;
        draft.validate()?;
        let id = self.insert_draft(entity_id, &draft)?;
        self.load(id)
    }

    fn list_capabilities(
        &self,
        owner: &OwnerId,
        filter: &CapabilityListFilter,
    ) -> GraphResult<Vec<Capability>> {
        let mut sql = format!(
            "{CAPABILITY_SELECT_SQL}
             WHERE entity_id IN (SELECT id FROM entities WHERE owner_id = ?)"
        );
        let mut bind_values: Vec<Value> = vec![Value::Text(owner.as_str().to_string())];

        if let Some(kind) = filter.kind.as_ref() {
            sql.push_str(" AND type = ?");
            bind_values.push(Value::Text(kind.clone()));
        }
        if let Some(entity_id) = filter.entity_id {
            sql.push_str(" AND entity_id = ?");
            bind_values.push(Value::Text(entity_id.to_string()));
        }
        sql.push_str(&format!(" ORDER BY {NEWEST_FIRST}"));

        self.query_capabilities(&sql, bind_values)
    }

    fn get_capability(&self, id: CapabilityId, owner: &OwnerId) -> GraphResult<Capability> {
        authorize_capability(self.conn, id, owner)?;
        self.load(id)
    }

    fn update_capability(
        &self,
        id: CapabilityId,
        patch: &CapabilityPatch,
        owner: &OwnerId,
    ) -> GraphResult<Capability> {
        authorize_capability(self.conn, id, owner)?;
        patch.validate()?;

        if !patch.is_empty() {
            let mut assignments = Vec::new();
            let mut bind_values: Vec<Value> = Vec::new();
            if let Some(kind) = patch.kind.as_ref() {
                assignments.push("type = ?");
                bind_values.push(Value::Text(kind.clone()));
            }
            if let Some(data) = patch.data.as_ref() {
                assignments.push("data = ?");
                bind_values.push(Value::Text(encode_data(data)?));
            }
            bind_values.push(Value::Text(id.to_string()));

            self.conn.execute(
                &format!(
                    "UPDATE capabilities SET {} WHERE id = ?;",
                    assignments.join(", ")
                ),
                params_from_iter(bind_values),
            )?;
        }

        self.load(id)
    }

    fn delete_capability(
        &self,
        id: CapabilityId,
        owner: &OwnerId,
    ) -> GraphResult<DeletionReceipt> {
        authorize_capability(self.conn, id, owner)?;
        self.conn
            .execute("DELETE FROM capabilities WHERE id = ?1;", [id.to_string()])?;
        Ok(DeletionReceipt::new(RecordKind::Capability, id))
    }

    fn list_by_entity(
        &self,
        entity_id: EntityId,
        owner: &OwnerId,
    ) -> GraphResult<Vec<Capability>> {
        authorize_entity(self.conn, entity_id, owner)?;
        self.list_for_entity(entity_id)
    }

    fn create_many(
        &self,
        entity_id: EntityId,
        drafts: &[CapabilityDraft],
        owner: &OwnerId,
    ) -> GraphResult<Vec<Capability>> {
        authorize_entity(self.conn, entity_id, owner)?;
        self.insert_batch(entity_id, drafts)?;
        self.list_for_entity(entity_id)
    }
}

fn parse_capability_row(row: &Row<'_>) -> GraphResult<Capability> {
    let id_text: String = row.get("id")?;
    let entity_text: String = row.get("entity_id")?;
    let data_text: String = row.get("data")?;
    let data = serde_json::from_str::<CapabilityData>(&data_text).map_err(|err| {
        DbError::InvalidData(format!(
            "capabilities.data for `{id_text}` is not a JSON object: {err}"
        ))
    })?;

    Ok(Capability {
        id: parse_id(&id_text, "capabilities.id")?,
        kind: row.get("type")?,
        data,
        entity_id: parse_id(&entity_text, "capabilities.entity_id")?,
        created_at: row.get("created_at")?,
    })
}

fn encode_data(data: &CapabilityData) -> GraphResult<String> {
    serde_json::to_string(data)
        .map_err(|err| DbError::InvalidData(format!("cannot encode capability data: {err}")).into())
}
