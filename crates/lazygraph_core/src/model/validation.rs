//! Input validation failures for graph write payloads.

use crate::model::entity::EntityId;
use thiserror::Error;

/// Malformed or missing caller input. Never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("entity title must not be blank")]
    EmptyTitle,
    #[error("capability type must not be blank")]
    EmptyCapabilityType,
    #[error("capability requires an entity id")]
    MissingEntityId,
    #[error("link type must not be blank")]
    EmptyLinkType,
    #[error("entity {0} cannot link to itself")]
    SelfLink(EntityId),
    #[error("owner id must not be blank")]
    EmptyOwnerId,
    #[error("capability batch item {index} is invalid: {source}")]
    InvalidBatchItem {
        index: usize,
        #[source]
        source: Box<ValidationError>,
    },
}

pub(crate) fn require_text(value: &str, err: ValidationError) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(err)
    } else {
        Ok(())
    }
}
