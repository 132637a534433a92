//! Core domain logic for LazyGraph.
//! This crate is the single source of truth for entity graph invariants.

pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, CoreConfig};
pub use db::{spawn_keep_alive, KeepAliveHandle, LivenessProbe, SharedDb};
pub use error::{ErrorKind, GraphError, GraphResult};
pub use logging::{default_log_level, init_logging, init_logging_from, logging_status, LoggingError};
pub use model::capability::{
    Capability, CapabilityData, CapabilityDraft, CapabilityId, CapabilityListFilter,
    CapabilityPatch, NewCapability,
};
pub use model::entity::{Entity, EntityId, EntityListFilter, EntityPatch, NewEntity};
pub use model::link::{EntityLinks, Link, LinkId, NewLink};
pub use model::owner::OwnerId;
pub use model::record::{DeletionReceipt, RecordKind};
pub use model::validation::ValidationError;
pub use repo::capability_repo::{CapabilityRepository, SqliteCapabilityRepository};
pub use repo::entity_repo::{EntityRepository, SqliteEntityRepository};
pub use repo::link_repo::{LinkRepository, SqliteLinkRepository};
pub use service::graph_service::GraphService;

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
