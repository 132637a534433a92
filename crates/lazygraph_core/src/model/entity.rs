//! Entity domain model.
//!
//! # Responsibility
//! - Define the aggregate root of the knowledge/task graph.
//! - Provide create/update payloads and list filters.
//!
//! # Invariants
//! - `title` is never blank.
//! - `owner_id` is set once at creation and never changes.
//! - Read models carry capabilities and one-hop links newest-first.

use crate::model::capability::{Capability, CapabilityDraft};
use crate::model::link::Link;
use crate::model::owner::OwnerId;
use crate::model::validation::{require_text, ValidationError};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Stable identifier of one entity.
pub type EntityId = Uuid;

/// Note/task unit owned by exactly one principal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub title: String,
    pub content: Option<String>,
    pub priority: Option<i64>,
    pub owner_id: OwnerId,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds.
    pub updated_at: i64,
    pub capabilities: Vec<Capability>,
    /// Links where this entity is the source.
    pub outgoing_links: Vec<Link>,
    /// Links where this entity is the target.
    pub incoming_links: Vec<Link>,
}

/// Entity creation payload with an optional initial capability batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEntity {
    pub title: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub priority: Option<i64>,
    #[serde(default)]
    pub capabilities: Vec<CapabilityDraft>,
}

impl NewEntity {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: None,
            priority: None,
            capabilities: Vec::new(),
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn with_priority(mut self, priority: i64) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_capability(mut self, draft: CapabilityDraft) -> Self {
        self.capabilities.push(draft);
        self
    }

    /// Checks entity fields. Batch items are checked as they are inserted.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text(&self.title, ValidationError::EmptyTitle)
    }
}

/// Partial entity update.
///
/// `None` fields keep their stored value. For the nullable columns
/// `Some(None)` (an explicit JSON `null`) clears the stored value.
/// `capabilities` are appended to the entity, never replacing existing ones.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(
        default,
        deserialize_with = "present_or_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub content: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "present_or_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub priority: Option<Option<i64>>,
    #[serde(default)]
    pub capabilities: Vec<CapabilityDraft>,
}

impl EntityPatch {
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self.title.as_deref() {
            Some(title) => require_text(title, ValidationError::EmptyTitle),
            None => Ok(()),
        }
    }
}

/// Maps a present key to `Some`, keeping `null` distinct from a missing key.
fn present_or_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Filter for listing the caller's entities. Present filters are ANDed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityListFilter {
    /// Keeps entities having at least one capability of this exact type.
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    /// Case-insensitive substring match against title or content.
    #[serde(default)]
    pub search: Option<String>,
}

impl EntityListFilter {
    /// Drops blank filter values so they behave as absent.
    pub fn normalized(self) -> Self {
        Self {
            kind: self.kind.filter(|value| !value.trim().is_empty()),
            search: self.search.filter(|value| !value.trim().is_empty()),
        }
    }

    /// Returns whether `title`/`content` satisfy the `search` filter.
    pub fn matches_search(&self, title: &str, content: Option<&str>) -> bool {
        let Some(search) = self.search.as_deref() else {
            return true;
        };
        let needle = search.to_lowercase();
        title.to_lowercase().contains(&needle)
            || content.is_some_and(|value| value.to_lowercase().contains(&needle))
    }
}

#[cfg(test)]
mod tests {
    use super::{EntityListFilter, EntityPatch, NewEntity};
    use crate::model::validation::ValidationError;
    use serde_json::json;

    #[test]
    fn new_entity_requires_non_blank_title() {
        assert_eq!(
            NewEntity::new(" \t").validate().unwrap_err(),
            ValidationError::EmptyTitle
        );
        assert!(NewEntity::new("Buy milk").validate().is_ok());
    }

    #[test]
    fn patch_only_validates_present_title() {
        assert!(EntityPatch::default().validate().is_ok());
        let patch = EntityPatch {
            title: Some(String::new()),
            ..EntityPatch::default()
        };
        assert_eq!(patch.validate().unwrap_err(), ValidationError::EmptyTitle);
    }

    #[test]
    fn patch_distinguishes_null_from_missing_fields() {
        let patch: EntityPatch =
            serde_json::from_value(json!({ "content": null, "priority": 3 })).unwrap();
        assert_eq!(patch.content, Some(None));
        assert_eq!(patch.priority, Some(Some(3)));
        assert_eq!(patch.title, None);

        let untouched: EntityPatch = serde_json::from_value(json!({})).unwrap();
        assert_eq!(untouched.content, None);
        assert_eq!(untouched.priority, None);
    }

    #[test]
    fn search_matches_title_or_content_ignoring_case() {
        let filter = EntityListFilter {
            kind: None,
            search: Some("MILK".to_string()),
        };
        assert!(filter.matches_search("Buy milk", None));
        assert!(filter.matches_search("Groceries", Some("oat Milk, eggs")));
        assert!(!filter.matches_search("Groceries", None));
    }

    #[test]
    fn normalized_filter_drops_blank_values() {
        let filter = EntityListFilter {
            kind: Some(" ".to_string()),
            search: Some(String::new()),
        }
        .normalized();
        assert_eq!(filter, EntityListFilter::default());
    }
}
