//! Record kinds and deletion receipts shared by all stores.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Persisted record family, used in errors and receipts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Entity,
    Capability,
    Link,
}

impl RecordKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Entity => "entity",
            Self::Capability => "capability",
            Self::Link => "link",
        }
    }
}

impl Display for RecordKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Confirmation returned by delete operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletionReceipt {
    pub kind: RecordKind,
    pub id: Uuid,
    /// Human-readable confirmation for the calling layer.
    pub message: String,
}

impl DeletionReceipt {
    pub(crate) fn new(kind: RecordKind, id: Uuid) -> Self {
        Self {
            kind,
            id,
            message: format!("{kind} {id} deleted"),
        }
    }
}
