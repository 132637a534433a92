//! Link domain model: directed, typed edges between two entities.
//!
//! # Invariants
//! - `source_id != target_id`.
//! - `(source_id, target_id, kind)` is unique in storage.
//! - Links are never updated; they disappear with either endpoint.

use crate::model::entity::EntityId;
use crate::model::validation::{require_text, ValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier of one link.
pub type LinkId = Uuid;

/// Directed edge from `source_id` to `target_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub id: LinkId,
    #[serde(rename = "type")]
    pub kind: String,
    pub source_id: EntityId,
    pub target_id: EntityId,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

/// Link creation payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLink {
    pub source_id: EntityId,
    pub target_id: EntityId,
    #[serde(rename = "type")]
    pub kind: String,
}

impl NewLink {
    pub fn new(source_id: EntityId, target_id: EntityId, kind: impl Into<String>) -> Self {
        Self {
            source_id,
            target_id,
            kind: kind.into(),
        }
    }

    /// Self-link is reported before any other input problem.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.source_id == self.target_id {
            return Err(ValidationError::SelfLink(self.source_id));
        }
        require_text(&self.kind, ValidationError::EmptyLinkType)
    }
}

/// One-hop edges of a single entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityLinks {
    pub outgoing: Vec<Link>,
    pub incoming: Vec<Link>,
}
