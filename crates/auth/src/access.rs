//! Named decision functions used by controllers.

use backoffice_core::{ClaimFilter, ClaimId, CompanyFilter, CompanyId, UserFilter, UserId};

use crate::authorize::{AuthzError, Authorizer, NewResource, Operation};
use crate::policies::{ClaimPolicy, CompanyPolicy, CompanyResourcePolicy, UserPolicy};
use crate::{OwnershipLookup, Principal};

/// A request to authorize, keyed by what the controller holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessTarget {
    Companies(CompanyFilter),
    Company(CompanyId),
    CompanyResource(CompanyId),
    Users(UserFilter),
    User(UserId),
    Claims(ClaimFilter),
    Claim(ClaimId),
    NewClaim(NewResource),
}

/// What an allowed request may proceed with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Granted {
    /// Proceed as requested.
    Resource,
    Companies(CompanyFilter),
    Users(UserFilter),
    Claims(ClaimFilter),
}

/// Authorization facade over all resource policies.
///
/// `L` answers ownership lookups for every resource type; in practice this is
/// a shared handle to the store.
#[derive(Debug, Clone)]
pub struct AccessControl<L> {
    companies: Authorizer<CompanyPolicy<L>>,
    company_resources: Authorizer<CompanyResourcePolicy>,
    users: Authorizer<UserPolicy<L>>,
    claims: Authorizer<ClaimPolicy<L>>,
}

impl<L> AccessControl<L>
where
    L: OwnershipLookup<CompanyId> + OwnershipLookup<UserId> + OwnershipLookup<ClaimId> + Clone,
{
    pub fn new(lookup: L) -> Self {
        Self {
            companies: Authorizer::new(CompanyPolicy::new(lookup.clone())),
            company_resources: Authorizer::new(CompanyResourcePolicy),
            users: Authorizer::new(UserPolicy::new(lookup.clone())),
            claims: Authorizer::new(ClaimPolicy::new(lookup)),
        }
    }

    /// Single entry point: `operation` on `target` by `principal`.
    pub fn authorize(
        &self,
        operation: Operation,
        principal: Option<&Principal>,
        target: AccessTarget,
    ) -> Result<Granted, AuthzError> {
        match (operation, target) {
            (Operation::List, AccessTarget::Companies(filter)) => {
                self.authorize_company_list(principal, filter).map(Granted::Companies)
            }
            (Operation::List, AccessTarget::Users(filter)) => {
                self.authorize_user_list(principal, filter).map(Granted::Users)
            }
            (Operation::List, AccessTarget::Claims(filter)) => {
                self.authorize_claim_list(principal, filter).map(Granted::Claims)
            }
            (Operation::Create, AccessTarget::NewClaim(resource)) => self
                .can_create_claim(principal, &resource)
                .map(|()| Granted::Resource),
            (op @ (Operation::Read | Operation::Process), AccessTarget::Company(id)) => {
                self.companies.check(principal, op, &id).map(|()| Granted::Resource)
            }
            (op @ (Operation::Read | Operation::Process), AccessTarget::CompanyResource(id)) => self
                .company_resources
                .check(principal, op, &id)
                .map(|()| Granted::Resource),
            (op @ (Operation::Read | Operation::Process), AccessTarget::User(id)) => {
                self.users.check(principal, op, &id).map(|()| Granted::Resource)
            }
            (op @ (Operation::Read | Operation::Process), AccessTarget::Claim(id)) => {
                self.claims.check(principal, op, &id).map(|()| Granted::Resource)
            }
            (op, target) => Err(AuthzError::forbidden(format!(
                "operation '{op}' does not apply to {target:?}"
            ))),
        }
    }

    pub fn can_access_company(
        &self,
        principal: Option<&Principal>,
        company_id: CompanyId,
    ) -> Result<(), AuthzError> {
        self.companies.read(principal, &company_id)
    }

    /// Access to anything nested under `company_id` (company-admin resources).
    pub fn can_access_company_resource(
        &self,
        principal: Option<&Principal>,
        company_id: CompanyId,
    ) -> Result<(), AuthzError> {
        self.company_resources.read(principal, &company_id)
    }

    pub fn authorize_company_list(
        &self,
        principal: Option<&Principal>,
        filter: CompanyFilter,
    ) -> Result<CompanyFilter, AuthzError> {
        self.companies.list(principal, filter)
    }

    pub fn authorize_user_list(
        &self,
        principal: Option<&Principal>,
        filter: UserFilter,
    ) -> Result<UserFilter, AuthzError> {
        self.users.list(principal, filter)
    }

    pub fn can_access_user(
        &self,
        principal: Option<&Principal>,
        user_id: UserId,
    ) -> Result<(), AuthzError> {
        self.users.read(principal, &user_id)
    }

    pub fn authorize_claim_list(
        &self,
        principal: Option<&Principal>,
        filter: ClaimFilter,
    ) -> Result<ClaimFilter, AuthzError> {
        self.claims.list(principal, filter)
    }

    pub fn can_access_claim(
        &self,
        principal: Option<&Principal>,
        claim_id: ClaimId,
    ) -> Result<(), AuthzError> {
        self.claims.read(principal, &claim_id)
    }

    pub fn can_create_claim(
        &self,
        principal: Option<&Principal>,
        claim: &NewResource,
    ) -> Result<(), AuthzError> {
        self.claims.create(principal, claim)
    }

    pub fn can_process_claim(
        &self,
        principal: Option<&Principal>,
        claim_id: ClaimId,
    ) -> Result<(), AuthzError> {
        self.claims.process(principal, &claim_id)
    }
}
