//! Audit trail: revisions, entity snapshots and the transaction-scoped
//! recorder that produces them.

mod recorder;
mod revision;

pub use recorder::{PendingRevision, RevisionRecorder};
pub use revision::{ChangeType, HistoryEntry, RevisionRecord, Snapshot};
