//! Shared data model for blocksync.
//!
//! A `Block` is the unit of synced content: a captured note or file
//! reference identified by a server-assigned `luid`. `BlockHash` pairs are
//! the change-detection fingerprints exchanged during a sync pass, and
//! `SyncSummary` is the derived result reported back to the caller.

pub mod timestamp;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// Placeholder emoji for extracted entities that arrive without one.
pub const DEFAULT_ENTITY_EMOJI: &str = "#";
/// Placeholder color for extracted entities that arrive without one.
pub const DEFAULT_ENTITY_COLOR: &str = "#919191";

/// A single synced content unit.
///
/// The `luid` is assigned server-side, globally unique, and immutable; it is
/// the only field used for equality and for store upsert keys. Everything
/// else is replaced wholesale on re-fetch — there are no field-level updates.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Block {
    pub luid: String,
    pub slug: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub pinned: bool,
    #[serde(default, with = "timestamp::option")]
    pub created_timestamp: Option<DateTime<Utc>>,
    #[serde(default, with = "timestamp::option")]
    pub last_edited: Option<DateTime<Utc>>,
    #[serde(default)]
    pub entities: Option<Vec<BlockEntity>>,
    #[serde(default)]
    pub text: Option<String>,
}

impl PartialEq for Block {
    fn eq(&self, other: &Self) -> bool {
        self.luid == other.luid
    }
}

impl Eq for Block {}

impl Hash for Block {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.luid.hash(state);
    }
}

/// An entity extracted from a block's text (person, place, topic).
///
/// Presentation fields default when the server omits them or sends them
/// empty, so a sparse payload still renders.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockEntity {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default = "default_emoji", deserialize_with = "emoji_or_default")]
    pub emoji: String,
    #[serde(default = "default_color", deserialize_with = "color_or_default")]
    pub color: String,
}

fn default_emoji() -> String {
    DEFAULT_ENTITY_EMOJI.to_string()
}

fn default_color() -> String {
    DEFAULT_ENTITY_COLOR.to_string()
}

fn emoji_or_default<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(match value {
        Some(s) if !s.is_empty() => s,
        _ => default_emoji(),
    })
}

fn color_or_default<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(match value {
        Some(s) if !s.is_empty() => s,
        _ => default_color(),
    })
}

/// Server fingerprint for one block, used only during reconciliation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHash {
    pub luid: String,
    pub hash: String,
}

/// Outcome of one sync pass, reported to the caller for UI status.
///
/// Invariant: `updated_count <= total_count`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSummary {
    pub total_count: usize,
    pub updated_count: usize,
    pub is_initial_sync: bool,
}

impl SyncSummary {
    /// Human-readable status line for toasts.
    pub fn message(&self) -> String {
        if self.updated_count == 0 {
            format!("Already up to date ({} blocks)", self.total_count)
        } else if self.is_initial_sync {
            format!("Initial sync completed ({} blocks)", self.total_count)
        } else {
            format!(
                "Updated {} of {} blocks",
                self.updated_count, self.total_count
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn block_equality_is_by_luid_only() {
        let a = Block {
            luid: "b-1".into(),
            slug: "first".into(),
            kind: "note".into(),
            pinned: false,
            created_timestamp: None,
            last_edited: None,
            entities: None,
            text: Some("hello".into()),
        };
        let mut b = a.clone();
        b.slug = "renamed".into();
        b.text = None;
        assert_eq!(a, b);
    }

    #[test]
    fn block_decodes_from_wire_json() {
        let json = r#"{
            "luid": "b-1",
            "slug": "grocery-list",
            "type": "note",
            "pinned": true,
            "created_timestamp": "2025-03-01T09:30:00.123456Z",
            "last_edited": "2025-03-02T10:00:00Z",
            "entities": [{"id": 7, "title": "Groceries", "emoji": "", "color": ""}],
            "text": "milk, eggs"
        }"#;
        let block: Block = serde_json::from_str(json).unwrap();
        assert_eq!(block.luid, "b-1");
        assert_eq!(block.kind, "note");
        assert!(block.pinned);
        assert!(block.created_timestamp.is_some());
        let entities = block.entities.unwrap();
        assert_eq!(entities[0].emoji, DEFAULT_ENTITY_EMOJI);
        assert_eq!(entities[0].color, DEFAULT_ENTITY_COLOR);
    }

    #[test]
    fn block_decodes_with_optional_fields_absent() {
        let json = r#"{"luid": "b-2", "slug": "s", "type": "file"}"#;
        let block: Block = serde_json::from_str(json).unwrap();
        assert!(!block.pinned);
        assert!(block.created_timestamp.is_none());
        assert!(block.last_edited.is_none());
        assert!(block.entities.is_none());
        assert!(block.text.is_none());
    }

    #[test]
    fn block_rejects_unparseable_timestamp() {
        let json = r#"{"luid": "b-3", "slug": "s", "type": "note", "last_edited": "tomorrow"}"#;
        let result = serde_json::from_str::<Block>(json);
        assert!(result.is_err());
    }

    #[test]
    fn entity_keeps_non_empty_presentation_fields() {
        let json = r##"{"id": 1, "title": "Work", "emoji": "💼", "color": "#ff0000"}"##;
        let entity: BlockEntity = serde_json::from_str(json).unwrap();
        assert_eq!(entity.emoji, "💼");
        assert_eq!(entity.color, "#ff0000");
    }

    #[test]
    fn entity_defaults_absent_fields() {
        let entity: BlockEntity = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(entity.id, 0);
        assert_eq!(entity.title, "");
        assert_eq!(entity.emoji, DEFAULT_ENTITY_EMOJI);
        assert_eq!(entity.color, DEFAULT_ENTITY_COLOR);
    }

    #[test]
    fn summary_message_up_to_date() {
        let s = SyncSummary {
            total_count: 12,
            updated_count: 0,
            is_initial_sync: false,
        };
        assert_eq!(s.message(), "Already up to date (12 blocks)");
    }

    #[test]
    fn summary_message_initial_sync() {
        let s = SyncSummary {
            total_count: 5,
            updated_count: 5,
            is_initial_sync: true,
        };
        assert_eq!(s.message(), "Initial sync completed (5 blocks)");
    }

    #[test]
    fn summary_message_partial_update() {
        let s = SyncSummary {
            total_count: 10,
            updated_count: 3,
            is_initial_sync: false,
        };
        assert_eq!(s.message(), "Updated 3 of 10 blocks");
    }
}
