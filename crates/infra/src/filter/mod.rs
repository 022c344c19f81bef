//! Dynamic filtering: search criteria compiled into typed predicates that
//! run against the in-memory store or render to Postgres SQL.

mod criteria;
mod predicate;
mod record;
mod sql;

pub use criteria::{Criteria, PredicateBuilder, build};
pub use predicate::{FieldValue, Predicate};
pub use record::{Record, Relation, fields};
