//! Graph use-case service.
//!
//! # Responsibility
//! - Expose the entity, capability and link operation contract.
//! - Scope every call to one transaction on the shared store.
//! - Normalize request shapes before delegating to the repositories.
//! - Emit metadata-only `event=... module=graph` logs per call.
//!
//! # Invariants
//! - No authorization logic lives here; repositories enforce ownership.
//! - Errors from repositories are returned unchanged.
//! - A failed call commits nothing.

use crate::config::CoreConfig;
use crate::db::{open_db_with, spawn_keep_alive, KeepAliveHandle, SharedDb};
use crate::error::{ErrorKind, GraphResult};
use crate::model::capability::{
    Capability, CapabilityDraft, CapabilityId, CapabilityListFilter, CapabilityPatch,
    NewCapability,
};
use crate::model::entity::{Entity, EntityId, EntityListFilter, EntityPatch, NewEntity};
use crate::model::link::{EntityLinks, Link};
use crate::model::owner::OwnerId;
use crate::model::record::DeletionReceipt;
use crate::db::DbError;
use crate::repo::capability_repo::{CapabilityRepository, SqliteCapabilityRepository};
use crate::repo::entity_repo::{EntityRepository, SqliteEntityRepository};
use crate::repo::link_repo::{LinkRepository, SqliteLinkRepository};
use log::{debug, error, info, warn, Level};
use rusqlite::Transaction;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Entry point for the surrounding transport layer.
///
/// Cheap to clone; clones share the same store and keep-alive probe. The
/// probe stops once the last clone is dropped.
#[derive(Clone)]
pub struct GraphService {
    db: SharedDb,
    keep_alive: Option<Arc<KeepAliveHandle>>,
}

impl GraphService {
    /// Wraps an already-open store without a keep-alive probe.
    pub fn new(db: SharedDb) -> Self {
        Self {
            db,
            keep_alive: None,
        }
    }

    /// Opens the configured store, applying migrations, and starts the
    /// keep-alive probe at `config.keep_alive_interval`.
    ///
    /// # Errors
    /// - `Fatal` when the store cannot be opened or migrated.
    /// - `Fatal` when the keep-alive thread cannot be spawned.
    pub fn open(config: &CoreConfig) -> GraphResult<Self> {
        let conn = open_db_with(config.db_path.as_deref(), config.busy_timeout)?;
        let mut service = Self::new(SharedDb::new(conn));
        if !config.keep_alive_interval.is_zero() {
            let handle = service
                .start_keep_alive(config.keep_alive_interval)
                .map_err(DbError::KeepAliveSpawn)?;
            service.keep_alive = Some(Arc::new(handle));
        }
        Ok(service)
    }

    pub fn db(&self) -> &SharedDb {
        &self.db
    }

    /// The probe started by [`Self::open`], if any.
    pub fn keep_alive(&self) -> Option<&KeepAliveHandle> {
        self.keep_alive.as_deref()
    }

    /// Starts a caller-owned keep-alive probe on this service's store.
    pub fn start_keep_alive(&self, interval: Duration) -> std::io::Result<KeepAliveHandle> {
        spawn_keep_alive(self.db.clone(), interval)
    }

    pub fn create_entity(&self, payload: NewEntity, owner: &OwnerId) -> GraphResult<Entity> {
        self.write("entity_create", |tx| {
            SqliteEntityRepository::new(tx).create_entity(&payload, owner)
        })
    }

    pub fn list_entities(
        &self,
        owner: &OwnerId,
        filter: EntityListFilter,
    ) -> GraphResult<Vec<Entity>> {
        let filter = filter.normalized();
        self.read("entity_list", |tx| {
            SqliteEntityRepository::new(tx).list_entities(owner, &filter)
        })
    }

    pub fn get_entity(&self, id: EntityId, owner: &OwnerId) -> GraphResult<Entity> {
        self.read("entity_get", |tx| SqliteEntityRepository::new(tx).get_entity(id, owner))
    }

    pub fn update_entity(
        &self,
        id: EntityId,
        patch: EntityPatch,
        owner: &OwnerId,
    ) -> GraphResult<Entity> {
        self.write("entity_update", |tx| {
            SqliteEntityRepository::new(tx).update_entity(id, &patch, owner)
        })
    }

    pub fn delete_entity(&self, id: EntityId, owner: &OwnerId) -> GraphResult<DeletionReceipt> {
        self.write("entity_delete", |tx| {
            SqliteEntityRepository::new(tx).delete_entity(id, owner)
        })
    }

    pub fn create_capability(
        &self,
        payload: NewCapability,
        owner: &OwnerId,
    ) -> GraphResult<Capability> {
        self.write("capability_create", |tx| {
            SqliteCapabilityRepository::new(tx).create_capability(payload, owner)
        })
    }

    /// Attaches `draft` to `entity_id`; the nested-route form of
    /// [`Self::create_capability`].
    pub fn attach_capability(
        &self,
        entity_id: EntityId,
        draft: CapabilityDraft,
        owner: &OwnerId,
    ) -> GraphResult<Capability> {
        let payload = NewCapability {
            entity_id: Some(entity_id),
            kind: draft.kind,
            data: draft.data,
        };
        self.create_capability(payload, owner)
    }

    pub fn list_capabilities(
        &self,
        owner: &OwnerId,
        filter: CapabilityListFilter,
    ) -> GraphResult<Vec<Capability>> {
        let filter = CapabilityListFilter {
            kind: filter.kind.filter(|kind| !kind.trim().is_empty()),
            entity_id: filter.entity_id,
        };
        self.read("capability_list", |tx| {
            SqliteCapabilityRepository::new(tx).list_capabilities(owner, &filter)
        })
    }

    pub fn get_capability(&self, id: CapabilityId, owner: &OwnerId) -> GraphResult<Capability> {
        self.read("capability_get", |tx| {
            SqliteCapabilityRepository::new(tx).get_capability(id, owner)
        })
    }

    pub fn update_capability(
        &self,
        id: CapabilityId,
        patch: CapabilityPatch,
        owner: &OwnerId,
    ) -> GraphResult<Capability> {
        self.write("capability_update", |tx| {
            SqliteCapabilityRepository::new(tx).update_capability(id, &patch, owner)
        })
    }

    pub fn delete_capability(
        &self,
        id: CapabilityId,
        owner: &OwnerId,
    ) -> GraphResult<DeletionReceipt> {
        self.write("capability_delete", |tx| {
            SqliteCapabilityRepository::new(tx).delete_capability(id, owner)
        })
    }

    pub fn list_capabilities_by_entity(
        &self,
        entity_id: EntityId,
        owner: &OwnerId,
    ) -> GraphResult<Vec<Capability>> {
        self.read("capability_list_by_entity", |tx| {
            SqliteCapabilityRepository::new(tx).list_by_entity(entity_id, owner)
        })
    }

    /// Bulk insert; all items commit together or none do.
    pub fn create_capabilities(
        &self,
        entity_id: EntityId,
        drafts: Vec<CapabilityDraft>,
        owner: &OwnerId,
    ) -> GraphResult<Vec<Capability>> {
        self.write("capability_create_many", |tx| {
            SqliteCapabilityRepository::new(tx).create_many(entity_id, &drafts, owner)
        })
    }

    pub fn create_link(
        &self,
        source_id: EntityId,
        target_id: EntityId,
        kind: &str,
        owner: &OwnerId,
    ) -> GraphResult<Link> {
        self.write("link_create", |tx| {
            SqliteLinkRepository::new(tx).create_link(source_id, target_id, kind, owner)
        })
    }

    pub fn list_links(&self, entity_id: EntityId, owner: &OwnerId) -> GraphResult<EntityLinks> {
        self.read("link_list", |tx| {
            SqliteLinkRepository::new(tx).list_links(entity_id, owner)
        })
    }

    fn write<T, F>(&self, event: &'static str, work: F) -> GraphResult<T>
    where
        F: FnOnce(&Transaction<'_>) -> GraphResult<T>,
    {
        let started_at = Instant::now();
        let result = self.db.write(work);
        log_outcome(event, Level::Info, started_at, &result);
        result
    }

    fn read<T, F>(&self, event: &'static str, work: F) -> GraphResult<T>
    where
        F: FnOnce(&Transaction<'_>) -> GraphResult<T>,
    {
        let started_at = Instant::now();
        let result = self.db.read(work);
        log_outcome(event, Level::Debug, started_at, &result);
        result
    }
}

fn log_outcome<T>(event: &str, ok_level: Level, started_at: Instant, result: &GraphResult<T>) {
    let duration_ms = started_at.elapsed().as_millis();
    match result {
        Ok(_) if ok_level == Level::Info => {
            info!("event={event} module=graph status=ok duration_ms={duration_ms}")
        }
        Ok(_) => debug!("event={event} module=graph status=ok duration_ms={duration_ms}"),
        Err(err) if err.kind() == ErrorKind::Fatal => error!(
            "event={event} module=graph status=error duration_ms={duration_ms} error_kind=fatal error={err}"
        ),
        Err(err) => warn!(
            "event={event} module=graph status=error duration_ms={duration_ms} error_kind={}",
            err.kind().as_str()
        ),
    }
}
