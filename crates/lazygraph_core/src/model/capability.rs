//! Capability domain model.
//!
//! # Responsibility
//! - Describe typed attribute records attached to one entity.
//! - Provide write payloads for single, nested and bulk creation.
//!
//! # Invariants
//! - `kind` is a non-blank tag; several capabilities may share one tag.
//! - `data` is a JSON object and defaults to `{}` when the caller omits it.
//! - Authorization always goes through the owning entity's owner.

use crate::model::entity::EntityId;
use crate::model::validation::{require_text, ValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier of one capability record.
pub type CapabilityId = Uuid;

/// Opaque structured payload of a capability.
pub type CapabilityData = serde_json::Map<String, serde_json::Value>;

/// Typed attribute record attached to an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Capability {
    pub id: CapabilityId,
    /// Serialized as `type` to match the external schema naming.
    #[serde(rename = "type")]
    pub kind: String,
    pub data: CapabilityData,
    pub entity_id: EntityId,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

/// Capability payload without an entity binding.
///
/// Used inside entity creation/update batches and bulk inserts, where the
/// target entity is supplied by the enclosing call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityDraft {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: Option<CapabilityData>,
}

impl CapabilityDraft {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: CapabilityData) -> Self {
        self.data = Some(data);
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text(&self.kind, ValidationError::EmptyCapabilityType)
    }

    /// Returns the payload, substituting `{}` when absent.
    pub fn data_or_default(&self) -> CapabilityData {
        self.data.clone().unwrap_or_default()
    }
}

/// Standalone capability creation payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCapability {
    /// Required; `None` is rejected as a validation error.
    #[serde(default)]
    pub entity_id: Option<EntityId>,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: Option<CapabilityData>,
}

impl NewCapability {
    pub fn new(entity_id: EntityId, kind: impl Into<String>) -> Self {
        Self {
            entity_id: Some(entity_id),
            kind: kind.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: CapabilityData) -> Self {
        self.data = Some(data);
        self
    }

    /// Splits the payload into its entity binding and an unbound draft.
    ///
    /// # Errors
    /// - `MissingEntityId` when no entity is referenced.
    pub fn into_parts(self) -> Result<(EntityId, CapabilityDraft), ValidationError> {
        let entity_id = self.entity_id.ok_or(ValidationError::MissingEntityId)?;
        Ok((
            entity_id,
            CapabilityDraft {
                kind: self.kind,
                data: self.data,
            },
        ))
    }
}

/// Partial capability update. Only `Some` fields are applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CapabilityPatch {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    /// Replaces the whole stored map when present.
    #[serde(default)]
    pub data: Option<CapabilityData>,
}

impl CapabilityPatch {
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self.kind.as_deref() {
            Some(kind) => require_text(kind, ValidationError::EmptyCapabilityType),
            None => Ok(()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.kind.is_none() && self.data.is_none()
    }
}

/// Filter for listing the caller's capabilities.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityListFilter {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub entity_id: Option<EntityId>,
}

#[cfg(test)]
mod tests {
    use super::{CapabilityDraft, NewCapability};
    use crate::model::validation::ValidationError;
    use serde_json::json;

    #[test]
    fn draft_without_data_defaults_to_empty_object() {
        let draft: CapabilityDraft = serde_json::from_value(json!({ "type": "task" })).unwrap();
        assert!(draft.data_or_default().is_empty());

        let explicit_null: CapabilityDraft =
            serde_json::from_value(json!({ "type": "task", "data": null })).unwrap();
        assert!(explicit_null.data_or_default().is_empty());
    }

    #[test]
    fn new_capability_without_entity_is_rejected() {
        let payload: NewCapability = serde_json::from_value(json!({ "type": "task" })).unwrap();
        assert_eq!(
            payload.into_parts().unwrap_err(),
            ValidationError::MissingEntityId
        );
    }

    #[test]
    fn blank_draft_type_is_rejected() {
        assert_eq!(
            CapabilityDraft::new("  ").validate().unwrap_err(),
            ValidationError::EmptyCapabilityType
        );
    }
}
