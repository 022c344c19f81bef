use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use backoffice_core::ActorId;

/// One committed change-set.
///
/// Exactly one per transaction that modified at least one audited entity.
/// Ids are assigned at commit and increase monotonically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionRecord {
    pub id: u64,
    pub timestamp: DateTime<Utc>,
    pub actor: ActorId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeType {
    Add,
    Modify,
    Delete,
}

impl ChangeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeType::Add => "ADD",
            ChangeType::Modify => "MODIFY",
            ChangeType::Delete => "DELETE",
        }
    }
}

impl core::fmt::Display for ChangeType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Historical copy of one entity at one revision. Never updated once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub revision_id: u64,
    pub entity_type: String,
    pub entity_id: Uuid,
    pub change: ChangeType,
    pub state: JsonValue,
}

/// A snapshot joined with its revision and decoded back into the entity type.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry<E> {
    pub revision: RevisionRecord,
    pub change: ChangeType,
    pub state: E,
}
