//! Ownership projections used for cheap authorization checks.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use backoffice_core::{CompanyId, UserId};

/// Minimal `{company, user}` projection of a resource.
///
/// Fetched without loading the full entity so the cost of an authorization
/// check does not depend on the size of the resource.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OwnershipDescriptor {
    pub company_id: Option<CompanyId>,
    pub user_id: Option<UserId>,
}

impl OwnershipDescriptor {
    pub fn new(company_id: Option<CompanyId>, user_id: Option<UserId>) -> Self {
        Self {
            company_id,
            user_id,
        }
    }

    pub fn company(company_id: CompanyId) -> Self {
        Self::new(Some(company_id), None)
    }

    pub fn owned_by(company_id: CompanyId, user_id: UserId) -> Self {
        Self::new(Some(company_id), Some(user_id))
    }

    pub fn belongs_to_company(&self, company_id: CompanyId) -> bool {
        self.company_id == Some(company_id)
    }

    pub fn belongs_to_user(&self, user_id: UserId) -> bool {
        self.user_id == Some(user_id)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("ownership lookup failed: {0}")]
pub struct OwnershipError(pub String);

/// Read-only ownership lookup, answered by the persistence layer.
///
/// `Ok(None)` means the resource does not exist.
pub trait OwnershipLookup<Id>: Send + Sync {
    fn ownership(&self, id: &Id) -> Result<Option<OwnershipDescriptor>, OwnershipError>;
}

impl<Id, L> OwnershipLookup<Id> for Arc<L>
where
    L: OwnershipLookup<Id> + ?Sized,
{
    fn ownership(&self, id: &Id) -> Result<Option<OwnershipDescriptor>, OwnershipError> {
        (**self).ownership(id)
    }
}
