//! Infrastructure layer: dynamic filtering, the transactional store and the
//! audit trail.

pub mod audit;
pub mod filter;
pub mod store;

pub use audit::{ChangeType, HistoryEntry, RevisionRecord, RevisionRecorder, Snapshot};
pub use filter::{Criteria, Predicate, build};
pub use store::{Store, StoreError, Stored, Transaction};
