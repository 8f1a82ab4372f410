//! Knowledge store type definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored text blob. Immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeItem {
    /// Unique identifier (UUIDv4 for runtime additions)
    pub id: String,

    /// Text content, stored verbatim
    pub text: String,

    /// When the item was written
    pub created_at: DateTime<Utc>,
}

impl KnowledgeItem {
    /// Create an item with a freshly generated identifier.
    pub fn new(text: impl Into<String>) -> Self {
        Self::with_id(uuid::Uuid::new_v4().to_string(), text)
    }

    /// Create an item under a caller-chosen identifier.
    pub fn with_id(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            created_at: Utc::now(),
        }
    }
}

/// One candidate returned by a similarity search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Identifier of the stored item
    pub id: String,

    /// Stored text
    pub text: String,

    /// Dissimilarity to the query; lower is closer
    pub distance: f32,
}

impl SearchHit {
    pub fn new(id: impl Into<String>, text: impl Into<String>, distance: f32) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            distance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_items_get_distinct_ids() {
        let a = KnowledgeItem::new("same text");
        let b = KnowledgeItem::new("same text");
        assert_ne!(a.id, b.id);
        assert!(uuid::Uuid::parse_str(&a.id).is_ok());
    }

    #[test]
    fn test_with_id() {
        let item = KnowledgeItem::with_id("knowledge", "seeded");
        assert_eq!(item.id, "knowledge");
        assert_eq!(item.text, "seeded");
    }
}
