//! In-memory transactional store for the audited business entities.
//!
//! Writes are staged in a [`Transaction`] and become visible together with
//! their revision and snapshots under a single write lock at commit.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use thiserror::Error;
use uuid::Uuid;

use backoffice_auth::{OwnershipDescriptor, OwnershipError, OwnershipLookup, ResolveActor};
use backoffice_core::{
    AuditStamp, Audited, Claim, ClaimId, Clock, Company, CompanyId, SystemClock, User, UserId,
};

use crate::audit::{ChangeType, HistoryEntry, RevisionRecord, RevisionRecorder, Snapshot};
use crate::filter::{Predicate, Record};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store lock poisoned")]
    Poisoned,

    #[error("{entity_type} {id} not found")]
    NotFound { entity_type: &'static str, id: Uuid },

    /// The row already exists, or a concurrent commit changed it.
    #[error("{entity_type} {id} conflicts with an existing row")]
    Conflict { entity_type: &'static str, id: Uuid },

    #[error("snapshot encoding failed: {0}")]
    Snapshot(#[from] serde_json::Error),
}

/// Committed rows.
#[derive(Debug, Default)]
pub struct Tables {
    companies: BTreeMap<CompanyId, Company>,
    users: BTreeMap<UserId, User>,
    claims: BTreeMap<ClaimId, Claim>,
    revisions: Vec<RevisionRecord>,
    snapshots: Vec<Snapshot>,
}

/// Uncommitted writes of one transaction.
#[derive(Debug, Default)]
pub struct Staged {
    companies: BTreeMap<CompanyId, StagedWrite<Company>>,
    users: BTreeMap<UserId, StagedWrite<User>>,
    claims: BTreeMap<ClaimId, StagedWrite<Claim>>,
}

/// Latest staged state of one row next to the committed row it started from.
///
/// `base == None` marks an insert and `row == None` a delete.
#[derive(Debug, Clone)]
pub struct StagedWrite<E> {
    base: Option<E>,
    row: Option<E>,
}

impl<E: Audited> StagedWrite<E> {
    /// Net change against the committed row and the state to snapshot for it.
    /// `None` when the row ends the transaction where it began.
    fn change(&self) -> Option<(ChangeType, &E)> {
        match (&self.base, &self.row) {
            (None, Some(row)) => Some((ChangeType::Add, row)),
            (Some(base), None) => Some((ChangeType::Delete, base)),
            (Some(base), Some(row)) if !base.same_state(row) => Some((ChangeType::Modify, row)),
            _ => None,
        }
    }
}

/// An audited entity with a table in the store.
pub trait Stored: Audited + Record {
    fn key_of(id: &Self::Id) -> Uuid;
    fn table(tables: &Tables) -> &BTreeMap<Self::Id, Self>;
    fn table_mut(tables: &mut Tables) -> &mut BTreeMap<Self::Id, Self>;
    fn staged(staged: &Staged) -> &BTreeMap<Self::Id, StagedWrite<Self>>;
    fn staged_mut(staged: &mut Staged) -> &mut BTreeMap<Self::Id, StagedWrite<Self>>;
}

macro_rules! impl_stored {
    ($entity:ty, $id:ty, $field:ident) => {
        impl Stored for $entity {
            fn key_of(id: &$id) -> Uuid {
                *id.as_uuid()
            }

            fn table(tables: &Tables) -> &BTreeMap<$id, Self> {
                &tables.$field
            }

            fn table_mut(tables: &mut Tables) -> &mut BTreeMap<$id, Self> {
                &mut tables.$field
            }

            fn staged(staged: &Staged) -> &BTreeMap<$id, StagedWrite<Self>> {
                &staged.$field
            }

            fn staged_mut(staged: &mut Staged) -> &mut BTreeMap<$id, StagedWrite<Self>> {
                &mut staged.$field
            }
        }
    };
}

impl_stored!(Company, CompanyId, companies);
impl_stored!(User, UserId, users);
impl_stored!(Claim, ClaimId, claims);

impl Staged {
    /// Every staged row must still sit on the committed row it was based on.
    fn verify<E: Stored>(&self, tables: &Tables) -> Result<(), StoreError> {
        let table = E::table(tables);
        for (id, write) in E::staged(self) {
            let committed = table.get(id);
            if committed == write.base.as_ref() {
                continue;
            }
            let id = E::key_of(id);
            tracing::warn!(entity_type = E::ENTITY_TYPE, %id, "row changed by a concurrent commit");
            return Err(match committed {
                None => StoreError::NotFound {
                    entity_type: E::ENTITY_TYPE,
                    id,
                },
                Some(_) => StoreError::Conflict {
                    entity_type: E::ENTITY_TYPE,
                    id,
                },
            });
        }
        Ok(())
    }

    fn record<E: Stored>(&self, recorder: &mut RevisionRecorder<'_>) -> Result<(), StoreError> {
        for write in E::staged(self).values() {
            if let Some((change, state)) = write.change() {
                recorder.on_audited_change(state, change)?;
            }
        }
        Ok(())
    }

    fn apply_to<E: Stored>(&mut self, tables: &mut Tables) {
        let writes = std::mem::take(E::staged_mut(self));
        let table = E::table_mut(tables);
        for (id, write) in writes {
            if write.change().is_none() {
                continue;
            }
            match write.row {
                Some(entity) => {
                    table.insert(id, entity);
                }
                None => {
                    table.remove(&id);
                }
            }
        }
    }

    fn write_count(&self) -> usize {
        self.companies.len() + self.users.len() + self.claims.len()
    }
}

pub struct Store {
    tables: RwLock<Tables>,
    clock: Arc<dyn Clock>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl core::fmt::Debug for Store {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Store").finish_non_exhaustive()
    }
}

impl Store {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            clock,
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, StoreError> {
        self.tables.read().map_err(|_| StoreError::Poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, StoreError> {
        self.tables.write().map_err(|_| StoreError::Poisoned)
    }

    pub fn get<E: Stored>(&self, id: &E::Id) -> Result<Option<E>, StoreError> {
        Ok(E::table(&*self.read()?).get(id).cloned())
    }

    /// Rows matching `predicate`, in id order.
    pub fn find<E: Stored>(&self, predicate: &Predicate<E>) -> Result<Vec<E>, StoreError> {
        if predicate.is_never() {
            return Ok(Vec::new());
        }
        let tables = self.read()?;
        Ok(E::table(&tables)
            .values()
            .filter(|row| predicate.matches(row))
            .cloned()
            .collect())
    }

    /// Open a unit of work attributed to whoever `actor` resolves to.
    pub fn begin<'s>(&'s self, actor: &'s dyn ResolveActor) -> Transaction<'s> {
        Transaction {
            store: self,
            recorder: RevisionRecorder::new(actor, &*self.clock),
            staged: Staged::default(),
        }
    }

    /// Snapshots of one entity ordered by revision id.
    pub fn history<E: Stored>(&self, id: &E::Id) -> Result<Vec<HistoryEntry<E>>, StoreError> {
        let key = E::key_of(id);
        let tables = self.read()?;
        let mut entries = Vec::new();
        for snapshot in tables
            .snapshots
            .iter()
            .filter(|s| s.entity_type == E::ENTITY_TYPE && s.entity_id == key)
        {
            let Some(revision) = tables.revisions.iter().find(|r| r.id == snapshot.revision_id)
            else {
                tracing::warn!(revision = snapshot.revision_id, "snapshot without revision");
                continue;
            };
            entries.push(HistoryEntry {
                revision: *revision,
                change: snapshot.change,
                state: serde_json::from_value(snapshot.state.clone())?,
            });
        }
        entries.sort_by_key(|e| e.revision.id);
        Ok(entries)
    }

    pub fn revisions(&self) -> Result<Vec<RevisionRecord>, StoreError> {
        Ok(self.read()?.revisions.clone())
    }
}

/// Staged writes against a [`Store`].
///
/// Nothing is visible to other readers until [`Transaction::commit`];
/// dropping the transaction discards everything.
pub struct Transaction<'s> {
    store: &'s Store,
    recorder: RevisionRecorder<'s>,
    staged: Staged,
}

impl<'s> Transaction<'s> {
    /// Current state as seen by this transaction (staged writes first).
    pub fn get<E: Stored>(&self, id: &E::Id) -> Result<Option<E>, StoreError> {
        match E::staged(&self.staged).get(id) {
            Some(write) => Ok(write.row.clone()),
            None => self.store.get(id),
        }
    }

    fn stage<E: Stored>(&mut self, id: E::Id, row: Option<E>) -> Result<(), StoreError> {
        let base = match E::staged(&self.staged).get(&id) {
            Some(write) => write.base.clone(),
            None => self.store.get::<E>(&id)?,
        };
        E::staged_mut(&mut self.staged).insert(id, StagedWrite { base, row });
        Ok(())
    }

    /// Insert a new row. Caller-supplied stamps are replaced.
    pub fn insert<E: Stored>(&mut self, mut entity: E) -> Result<E, StoreError> {
        if self.get::<E>(entity.id())?.is_some() {
            return Err(StoreError::Conflict {
                entity_type: E::ENTITY_TYPE,
                id: entity.key(),
            });
        }
        let revision = self.recorder.revision();
        *entity.stamp_mut() = AuditStamp::created(revision.actor, revision.timestamp);
        self.stage(*entity.id(), Some(entity.clone()))?;
        Ok(entity)
    }

    /// Replace the business state of an existing row.
    ///
    /// If nothing but the stamp differs the current row is returned untouched.
    /// A row that ends the transaction in its committed business state keeps
    /// its committed stamp and gets no snapshot.
    pub fn update<E: Stored>(&mut self, mut entity: E) -> Result<E, StoreError> {
        let current = self.get::<E>(entity.id())?.ok_or(StoreError::NotFound {
            entity_type: E::ENTITY_TYPE,
            id: entity.key(),
        })?;
        if current.same_state(&entity) {
            tracing::debug!(entity_type = E::ENTITY_TYPE, id = %entity.key(), "no-op update");
            return Ok(current);
        }
        let revision = self.recorder.revision();
        *entity.stamp_mut() = current.stamp().touched(revision.actor, revision.timestamp);
        self.stage(*entity.id(), Some(entity.clone()))?;
        Ok(entity)
    }

    /// Remove a row; its last committed state is snapshotted.
    pub fn delete<E: Stored>(&mut self, id: &E::Id) -> Result<E, StoreError> {
        let current = self.get::<E>(id)?.ok_or(StoreError::NotFound {
            entity_type: E::ENTITY_TYPE,
            id: E::key_of(id),
        })?;
        self.recorder.revision();
        self.stage::<E>(*id, None)?;
        Ok(current)
    }

    /// Apply every staged write together with the revision and snapshots.
    ///
    /// Fails with [`StoreError::Conflict`] or [`StoreError::NotFound`] and
    /// applies nothing if another transaction committed a staged row first.
    /// Returns the revision, or `None` when nothing audited changed.
    pub fn commit(self) -> Result<Option<RevisionRecord>, StoreError> {
        let Transaction {
            store,
            mut recorder,
            mut staged,
        } = self;

        let mut tables = store.write()?;
        staged.verify::<Company>(&tables)?;
        staged.verify::<User>(&tables)?;
        staged.verify::<Claim>(&tables)?;

        staged.record::<Company>(&mut recorder)?;
        staged.record::<User>(&mut recorder)?;
        staged.record::<Claim>(&mut recorder)?;

        let writes = staged.write_count();
        staged.apply_to::<Company>(&mut tables);
        staged.apply_to::<User>(&mut tables);
        staged.apply_to::<Claim>(&mut tables);

        let next_id = tables.revisions.len() as u64 + 1;
        let Some((record, snapshots)) = recorder.finish(next_id) else {
            return Ok(None);
        };
        tracing::info!(
            revision = record.id,
            actor = %record.actor,
            writes,
            snapshots = snapshots.len(),
            "committed revision"
        );
        tables.revisions.push(record);
        tables.snapshots.extend(snapshots);
        Ok(Some(record))
    }

    /// Discard staged writes.
    pub fn rollback(self) {
        let writes = self.staged.write_count();
        if writes > 0 {
            tracing::debug!(writes, "rolled back transaction");
        }
    }
}

impl OwnershipLookup<ClaimId> for Store {
    fn ownership(&self, id: &ClaimId) -> Result<Option<OwnershipDescriptor>, OwnershipError> {
        let tables = self.read().map_err(|e| OwnershipError(e.to_string()))?;
        Ok(tables
            .claims
            .get(id)
            .map(|c| OwnershipDescriptor::owned_by(c.company_id, c.user_id)))
    }
}

impl OwnershipLookup<UserId> for Store {
    fn ownership(&self, id: &UserId) -> Result<Option<OwnershipDescriptor>, OwnershipError> {
        let tables = self.read().map_err(|e| OwnershipError(e.to_string()))?;
        Ok(tables
            .users
            .get(id)
            .map(|u| OwnershipDescriptor::new(u.company_id, Some(u.id))))
    }
}

impl OwnershipLookup<CompanyId> for Store {
    fn ownership(&self, id: &CompanyId) -> Result<Option<OwnershipDescriptor>, OwnershipError> {
        let tables = self.read().map_err(|e| OwnershipError(e.to_string()))?;
        Ok(tables
            .companies
            .get(id)
            .map(|c| OwnershipDescriptor::company(c.id)))
    }
}
