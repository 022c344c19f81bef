//! Entity traits: identity, plus the audit stamp carried by every business entity.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ActorId;

/// Entity marker + minimal interface.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Copy + Ord + core::hash::Hash + core::fmt::Debug + Send + Sync + 'static;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}

/// Creation/update attribution owned by an entity.
///
/// Populated by the persistence layer from the resolved actor; values supplied
/// by callers are overwritten on insert and ignored on update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStamp {
    pub created_by: ActorId,
    pub created_at: DateTime<Utc>,
    pub updated_by: ActorId,
    pub updated_at: DateTime<Utc>,
}

impl AuditStamp {
    /// Stamp for a freshly inserted entity.
    pub fn created(actor: ActorId, at: DateTime<Utc>) -> Self {
        Self {
            created_by: actor,
            created_at: at,
            updated_by: actor,
            updated_at: at,
        }
    }

    /// Keep the creation half, advance the update half.
    pub fn touched(self, actor: ActorId, at: DateTime<Utc>) -> Self {
        Self {
            updated_by: actor,
            updated_at: at,
            ..self
        }
    }
}

/// An entity whose changes are recorded in the revision trail.
pub trait Audited:
    Entity + Clone + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Stable type tag used for snapshots and table names.
    const ENTITY_TYPE: &'static str;

    /// Raw key of the entity, used to address snapshots.
    fn key(&self) -> Uuid;

    fn stamp(&self) -> &AuditStamp;

    fn stamp_mut(&mut self) -> &mut AuditStamp;

    /// Whether both values hold the same business state, ignoring stamps.
    fn same_state(&self, other: &Self) -> bool {
        let mut left = self.clone();
        let mut right = other.clone();
        *left.stamp_mut() = AuditStamp::default();
        *right.stamp_mut() = AuditStamp::default();
        left == right
    }
}
