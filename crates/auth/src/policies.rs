//! One [`ResourcePolicy`] per resource type.

use backoffice_core::{ClaimFilter, ClaimId, CompanyFilter, CompanyId, UserFilter, UserId};

use crate::authorize::{ListPolicy, Operation, ResourcePolicy, Scope};
use crate::{OwnershipDescriptor, OwnershipError, OwnershipLookup, Role};

const COMPANY_MANAGERS: &[Role] = &[Role::COMPANY_MANAGER];
const USER_MANAGERS: &[Role] = &[Role::USER_MANAGER];
const CLAIM_MANAGERS: &[Role] = &[Role::CLAIM_MANAGER];
const ANY_MANAGER: &[Role] = &[Role::COMPANY_MANAGER, Role::USER_MANAGER, Role::CLAIM_MANAGER];

/// Companies themselves.
///
/// Company managers see and maintain their own company; creating companies
/// is reserved to application admins. Consumers may read their employer.
#[derive(Debug, Clone)]
pub struct CompanyPolicy<L> {
    lookup: L,
}

impl<L> CompanyPolicy<L> {
    pub fn new(lookup: L) -> Self {
        Self { lookup }
    }
}

impl<L: OwnershipLookup<CompanyId>> ResourcePolicy for CompanyPolicy<L> {
    type Id = CompanyId;

    const RESOURCE: &'static str = "company";

    fn manager_roles(&self) -> &[Role] {
        COMPANY_MANAGERS
    }

    fn manager_operations(&self) -> &[Operation] {
        &[Operation::List, Operation::Read, Operation::Process]
    }

    fn consumer_operations(&self) -> &[Operation] {
        &[Operation::Read]
    }

    fn ownership(&self, id: &CompanyId) -> Result<Option<OwnershipDescriptor>, OwnershipError> {
        self.lookup.ownership(id)
    }

    fn owns(&self, scope: &Scope, owner: &OwnershipDescriptor) -> bool {
        match scope {
            Scope::Unrestricted => true,
            Scope::Company(company_id) => owner.belongs_to_company(*company_id),
            Scope::Own { company_id, .. } => {
                company_id.is_some_and(|c| owner.belongs_to_company(c))
            }
        }
    }
}

impl<L: OwnershipLookup<CompanyId>> ListPolicy for CompanyPolicy<L> {
    type Filter = CompanyFilter;
}

/// Resources nested under a company (its users, packages, enrollments...).
///
/// The reference is the owning company; any manager role of that company
/// qualifies. No lookup is needed: the company id is the ownership.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompanyResourcePolicy;

impl ResourcePolicy for CompanyResourcePolicy {
    type Id = CompanyId;

    const RESOURCE: &'static str = "company resource";

    fn manager_roles(&self) -> &[Role] {
        ANY_MANAGER
    }

    fn ownership(&self, id: &CompanyId) -> Result<Option<OwnershipDescriptor>, OwnershipError> {
        Ok(Some(OwnershipDescriptor::company(*id)))
    }
}

/// Back-office users.
#[derive(Debug, Clone)]
pub struct UserPolicy<L> {
    lookup: L,
}

impl<L> UserPolicy<L> {
    pub fn new(lookup: L) -> Self {
        Self { lookup }
    }
}

impl<L: OwnershipLookup<UserId>> ResourcePolicy for UserPolicy<L> {
    type Id = UserId;

    const RESOURCE: &'static str = "user";

    fn manager_roles(&self) -> &[Role] {
        USER_MANAGERS
    }

    fn consumer_operations(&self) -> &[Operation] {
        &[Operation::List, Operation::Read]
    }

    fn ownership(&self, id: &UserId) -> Result<Option<OwnershipDescriptor>, OwnershipError> {
        self.lookup.ownership(id)
    }
}

impl<L: OwnershipLookup<UserId>> ListPolicy for UserPolicy<L> {
    type Filter = UserFilter;
}

/// Claims. Consumers file and follow their own; processing is for claim
/// managers of the claim's company.
#[derive(Debug, Clone)]
pub struct ClaimPolicy<L> {
    lookup: L,
}

impl<L> ClaimPolicy<L> {
    pub fn new(lookup: L) -> Self {
        Self { lookup }
    }
}

impl<L: OwnershipLookup<ClaimId>> ResourcePolicy for ClaimPolicy<L> {
    type Id = ClaimId;

    const RESOURCE: &'static str = "claim";

    fn manager_roles(&self) -> &[Role] {
        CLAIM_MANAGERS
    }

    fn consumer_operations(&self) -> &[Operation] {
        &[Operation::List, Operation::Read, Operation::Create]
    }

    fn ownership(&self, id: &ClaimId) -> Result<Option<OwnershipDescriptor>, OwnershipError> {
        self.lookup.ownership(id)
    }
}

impl<L: OwnershipLookup<ClaimId>> ListPolicy for ClaimPolicy<L> {
    type Filter = ClaimFilter;
}
