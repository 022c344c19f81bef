//! `backoffice-core`: domain foundation building blocks.
//!
//! Pure domain primitives shared by the authorization, filtering and audit
//! layers (no infrastructure concerns).

#[macro_use]
mod macros;

pub mod clock;
pub mod criteria;
pub mod entity;
pub mod error;
pub mod id;
pub mod model;

pub use clock::{Clock, ManualClock, SystemClock};
pub use criteria::{ClaimFilter, CompanyFilter, DateRange, UserFilter};
pub use entity::{AuditStamp, Audited, Entity};
pub use error::DomainError;
pub use id::{ActorId, ClaimId, CompanyId, UserId};
pub use model::{
    Claim, ClaimStatus, Company, CompanyStatus, User, UserFunction, UserStatus,
};
