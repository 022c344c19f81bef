//! Business entities managed by the back office.

pub mod claim;
pub mod company;
pub mod user;

pub use claim::{Claim, ClaimStatus};
pub use company::{Company, CompanyStatus};
pub use user::{User, UserFunction, UserStatus};
