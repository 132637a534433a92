//! Identity context for scoped operations.
//!
//! The surrounding auth layer verifies credentials and hands the core an
//! opaque principal id. Core only compares these ids for equality.

use crate::model::validation::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Opaque id of the authenticated principal that owns entities.
///
/// Deserialization goes through [`OwnerId::new`], so blank ids are rejected
/// on every path into the core.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct OwnerId(String);

impl OwnerId {
    /// Builds an owner id from caller-supplied text.
    ///
    /// # Errors
    /// - Returns `ValidationError::EmptyOwnerId` when the value is blank.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(ValidationError::EmptyOwnerId);
        }
        Ok(Self(value))
    }

    /// Wraps a value read back from storage, which was validated on write.
    pub(crate) fn from_stored(value: String) -> Self {
        Self(value)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl TryFrom<String> for OwnerId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<OwnerId> for String {
    fn from(value: OwnerId) -> Self {
        value.0
    }
}

impl Display for OwnerId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::OwnerId;
    use crate::model::validation::ValidationError;

    #[test]
    fn owner_id_rejects_blank_values() {
        let err = OwnerId::new("   ").expect_err("blank owner must be rejected");
        assert_eq!(err, ValidationError::EmptyOwnerId);
    }

    #[test]
    fn deserializing_blank_owner_id_fails() {
        assert!(serde_json::from_str::<OwnerId>("\"   \"").is_err());
        assert!(serde_json::from_str::<OwnerId>("\"\"").is_err());

        let owner: OwnerId = serde_json::from_str("\"user-a\"").unwrap();
        assert_eq!(owner.as_str(), "user-a");
        assert_eq!(serde_json::to_string(&owner).unwrap(), "\"user-a\"");
    }

    #[test]
    fn owner_id_compares_by_exact_value() {
        let a = OwnerId::new("user-a").unwrap();
        assert_eq!(a, OwnerId::new("user-a").unwrap());
        assert_ne!(a, OwnerId::new("USER-A").unwrap());
    }
}
