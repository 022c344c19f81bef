use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use backoffice_auth::ResolveActor;
use backoffice_core::{ActorId, Audited, Clock};

use super::revision::{ChangeType, RevisionRecord, Snapshot};

/// Revision attribution fixed for the lifetime of one transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingRevision {
    pub timestamp: DateTime<Utc>,
    pub actor: ActorId,
}

#[derive(Debug, Clone)]
struct PendingSnapshot {
    entity_type: &'static str,
    entity_id: Uuid,
    change: ChangeType,
    state: JsonValue,
}

/// Transaction-scoped audit hook.
///
/// The actor is resolved and the revision opened on the first audited change
/// only; later changes in the same transaction reuse both. A transaction that
/// records nothing produces no revision.
pub struct RevisionRecorder<'a> {
    actor_source: &'a dyn ResolveActor,
    clock: &'a dyn Clock,
    pending: Option<PendingRevision>,
    snapshots: Vec<PendingSnapshot>,
}

impl<'a> RevisionRecorder<'a> {
    pub fn new(actor_source: &'a dyn ResolveActor, clock: &'a dyn Clock) -> Self {
        Self {
            actor_source,
            clock,
            pending: None,
            snapshots: Vec::new(),
        }
    }

    /// Attribution for the current transaction, opening it on first use.
    pub fn revision(&mut self) -> PendingRevision {
        if let Some(pending) = self.pending {
            return pending;
        }
        let pending = PendingRevision {
            timestamp: self.clock.now(),
            actor: self.actor_source.resolve_actor(),
        };
        tracing::debug!(actor = %pending.actor, "opened revision");
        self.pending = Some(pending);
        pending
    }

    /// Record one audited change. Called before the writes are applied, once
    /// for every entity whose state the transaction changed, with its
    /// post-change state (or last state, for deletes).
    pub fn on_audited_change<E: Audited>(
        &mut self,
        entity: &E,
        change: ChangeType,
    ) -> Result<(), serde_json::Error> {
        let state = serde_json::to_value(entity)?;
        self.revision();
        self.snapshots.push(PendingSnapshot {
            entity_type: E::ENTITY_TYPE,
            entity_id: entity.key(),
            change,
            state,
        });
        Ok(())
    }

    /// Close the transaction under `revision_id`.
    pub fn finish(self, revision_id: u64) -> Option<(RevisionRecord, Vec<Snapshot>)> {
        let pending = self.pending?;
        if self.snapshots.is_empty() {
            return None;
        }
        let record = RevisionRecord {
            id: revision_id,
            timestamp: pending.timestamp,
            actor: pending.actor,
        };
        let snapshots = self
            .snapshots
            .into_iter()
            .map(|s| Snapshot {
                revision_id,
                entity_type: s.entity_type.to_string(),
                entity_id: s.entity_id,
                change: s.change,
                state: s.state,
            })
            .collect();
        Some((record, snapshots))
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use chrono::TimeZone;

    use backoffice_core::{Company, CompanyId, ManualClock};

    use super::*;

    struct Counting {
        actor: ActorId,
        calls: Cell<u32>,
    }

    impl ResolveActor for Counting {
        fn resolve_actor(&self) -> ActorId {
            self.calls.set(self.calls.get() + 1);
            self.actor
        }
    }

    fn clock() -> ManualClock {
        ManualClock::new(Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap())
    }

    #[test]
    fn no_changes_means_no_revision() {
        let clock = clock();
        let source = Counting {
            actor: ActorId::new(),
            calls: Cell::new(0),
        };
        let recorder = RevisionRecorder::new(&source, &clock);
        assert!(recorder.finish(1).is_none());
        assert_eq!(source.calls.get(), 0);
    }

    #[test]
    fn many_changes_share_one_revision_and_one_actor_lookup() {
        let clock = clock();
        let actor = ActorId::new();
        let source = Counting {
            actor,
            calls: Cell::new(0),
        };
        let mut recorder = RevisionRecorder::new(&source, &clock);

        let a = Company::new(CompanyId::new(), "A", "NL");
        let b = Company::new(CompanyId::new(), "B", "DE");
        recorder.on_audited_change(&a, ChangeType::Add).unwrap();
        clock.advance(chrono::Duration::seconds(5));
        recorder.on_audited_change(&b, ChangeType::Modify).unwrap();

        let (record, snapshots) = recorder.finish(7).unwrap();
        assert_eq!(source.calls.get(), 1);
        assert_eq!(record.id, 7);
        assert_eq!(record.actor, actor);
        assert_eq!(record.timestamp, Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap());
        assert_eq!(snapshots.len(), 2);
        assert!(snapshots.iter().all(|s| s.revision_id == 7 && s.entity_type == "company"));
        assert_eq!(snapshots[1].entity_id, *b.id.as_uuid());
        assert_eq!(snapshots[1].change, ChangeType::Modify);
    }

    #[test]
    fn change_type_serializes_upper_case() {
        assert_eq!(serde_json::to_string(&ChangeType::Delete).unwrap(), "\"DELETE\"");
        assert_eq!(ChangeType::Add.to_string(), "ADD");
    }
}
