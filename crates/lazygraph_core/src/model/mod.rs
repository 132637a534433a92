//! Entity graph domain model.
//!
//! # Responsibility
//! - Define the records owned by one principal: entities, their capabilities
//!   and the links between entities.
//! - Define write payloads and list filters consumed by the stores.
//!
//! # Invariants
//! - Every entity has exactly one `OwnerId`, fixed at creation.
//! - Capability data is always a JSON object, never null.
//! - A link never points from an entity to itself.

pub mod capability;
pub mod entity;
pub mod link;
pub mod owner;
pub mod record;
pub mod validation;
