//! Authorization engine.
//!
//! Every resource type follows the same decision shape:
//!
//! 1. no principal / unauthenticated → deny (`Unauthenticated`)
//! 2. `APPLICATION_ADMIN` → allow, nothing narrowed
//! 3. manager role of the resource → scoped to the company claim
//! 4. `CONSUMER` (where the resource permits it) → scoped to the caller's user id
//! 5. anything else → deny
//!
//! The per-resource differences live in [`ResourcePolicy`] implementations;
//! the branch logic lives here once. Decisions are values: list operations
//! return the effective filter, everything else returns `()`.

use serde::Serialize;
use thiserror::Error;

use backoffice_core::{CompanyId, UserId};

use crate::scope::{narrow_filter, ScopedFilter};
use crate::{OwnershipDescriptor, OwnershipError, Principal, Role};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    /// No authenticated caller where one is required.
    #[error("unauthenticated")]
    Unauthenticated,

    /// The caller is scoped to a different company than the resource.
    #[error("tenant mismatch")]
    TenantMismatch,

    #[error("forbidden: {0}")]
    Forbidden(String),
}

impl AuthzError {
    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    List,
    Read,
    Create,
    /// State transitions on an existing resource (review, approve, pay, ...).
    Process,
}

impl Operation {
    pub const ALL: &'static [Operation] = &[
        Operation::List,
        Operation::Read,
        Operation::Create,
        Operation::Process,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::List => "list",
            Operation::Read => "read",
            Operation::Create => "create",
            Operation::Process => "process",
        }
    }
}

impl core::fmt::Display for Operation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The slice of data a caller may act on for one resource type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Unrestricted,
    Company(CompanyId),
    Own {
        user_id: UserId,
        company_id: Option<CompanyId>,
    },
}

/// Ownership declared by a resource that is about to be created.
///
/// `path_owner` is the user named by the request path, if any;
/// `declared_owner` is the owner named in the body. Managers create within
/// their own company, so the target company is not part of the check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NewResource {
    pub declared_owner: Option<UserId>,
    pub path_owner: Option<UserId>,
}

/// Per-resource authorization strategy.
pub trait ResourcePolicy {
    type Id: core::fmt::Debug;

    /// Resource name used in logs and denial messages.
    const RESOURCE: &'static str;

    /// Roles granting company-scoped access.
    fn manager_roles(&self) -> &[Role];

    /// Operations available to managers within their company.
    fn manager_operations(&self) -> &[Operation] {
        Operation::ALL
    }

    /// Operations a consumer may perform on their own records.
    fn consumer_operations(&self) -> &[Operation] {
        &[]
    }

    /// Cheap `{company, user}` projection; `Ok(None)` if the resource does not exist.
    fn ownership(&self, id: &Self::Id) -> Result<Option<OwnershipDescriptor>, OwnershipError>;

    /// Whether a caller in `scope` may see a resource owned as `owner`.
    fn owns(&self, scope: &Scope, owner: &OwnershipDescriptor) -> bool {
        match scope {
            Scope::Unrestricted => true,
            Scope::Company(company_id) => owner.belongs_to_company(*company_id),
            Scope::Own { user_id, .. } => owner.belongs_to_user(*user_id),
        }
    }
}

/// Resource policies that also support filtered list operations.
pub trait ListPolicy: ResourcePolicy {
    type Filter: ScopedFilter;
}

/// Resolve the scope of `principal` for `operation` on `policy`'s resource.
pub fn resolve_scope<P: ResourcePolicy + ?Sized>(
    policy: &P,
    principal: Option<&Principal>,
    operation: Operation,
) -> Result<Scope, AuthzError> {
    let principal = match principal {
        Some(p) if p.is_authenticated() && !p.is_anonymous() => p,
        _ => return Err(AuthzError::Unauthenticated),
    };

    if principal.has_role(&Role::APPLICATION_ADMIN) {
        return Ok(Scope::Unrestricted);
    }

    let is_manager = policy.manager_roles().iter().any(|r| principal.has_role(r));
    if is_manager && policy.manager_operations().contains(&operation) {
        return principal.company_id().map(Scope::Company).ok_or_else(|| {
            AuthzError::forbidden(format!(
                "company claim missing or malformed for {} {}",
                operation,
                P::RESOURCE
            ))
        });
    }

    if principal.has_role(&Role::CONSUMER) && policy.consumer_operations().contains(&operation) {
        return principal
            .user_id()
            .map(|user_id| Scope::Own {
                user_id,
                company_id: principal.company_id(),
            })
            .ok_or_else(|| {
                AuthzError::forbidden(format!(
                    "user claim missing or malformed for {} {}",
                    operation,
                    P::RESOURCE
                ))
            });
    }

    Err(AuthzError::forbidden(format!(
        "not permitted to {} {}",
        operation,
        P::RESOURCE
    )))
}

/// Decision entry points for one resource type.
#[derive(Debug, Clone)]
pub struct Authorizer<P> {
    policy: P,
}

impl<P: ResourcePolicy> Authorizer<P> {
    pub fn new(policy: P) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    /// Read or process a single existing resource.
    ///
    /// Only the ownership projection is consulted. A missing resource is
    /// allowed so the lookup that follows can answer 404 rather than 403.
    pub fn check(
        &self,
        principal: Option<&Principal>,
        operation: Operation,
        id: &P::Id,
    ) -> Result<(), AuthzError> {
        let decision = self.check_existing(principal, operation, id);
        log_decision(P::RESOURCE, operation, &decision);
        decision
    }

    pub fn read(&self, principal: Option<&Principal>, id: &P::Id) -> Result<(), AuthzError> {
        self.check(principal, Operation::Read, id)
    }

    pub fn process(&self, principal: Option<&Principal>, id: &P::Id) -> Result<(), AuthzError> {
        self.check(principal, Operation::Process, id)
    }

    /// Create a resource.
    ///
    /// Managers create inside their own company by construction of the write
    /// path. Consumers must name themselves as the owner in the body, and the
    /// path owner (if any) must agree.
    pub fn create(
        &self,
        principal: Option<&Principal>,
        resource: &NewResource,
    ) -> Result<(), AuthzError> {
        let decision = resolve_scope(&self.policy, principal, Operation::Create).and_then(
            |scope| match scope {
                Scope::Unrestricted | Scope::Company(_) => Ok(()),
                Scope::Own { user_id, .. } => {
                    let declared = resource.declared_owner == Some(user_id);
                    let path = resource.path_owner.is_none_or(|p| p == user_id);
                    if declared && path {
                        Ok(())
                    } else {
                        Err(AuthzError::forbidden(format!(
                            "cannot create {} on behalf of another user",
                            P::RESOURCE
                        )))
                    }
                }
            },
        );
        log_decision(P::RESOURCE, Operation::Create, &decision);
        decision
    }

    fn check_existing(
        &self,
        principal: Option<&Principal>,
        operation: Operation,
        id: &P::Id,
    ) -> Result<(), AuthzError> {
        let scope = resolve_scope(&self.policy, principal, operation)?;
        if scope == Scope::Unrestricted {
            return Ok(());
        }

        let owner = match self.policy.ownership(id) {
            Ok(Some(owner)) => owner,
            Ok(None) => return Ok(()),
            Err(err) => {
                tracing::warn!(resource = P::RESOURCE, id = ?id, error = %err, "ownership lookup failed");
                return Err(AuthzError::forbidden("ownership could not be determined"));
            }
        };

        if self.policy.owns(&scope, &owner) {
            Ok(())
        } else if matches!(scope, Scope::Company(_)) {
            Err(AuthzError::TenantMismatch)
        } else {
            Err(AuthzError::forbidden(format!("{} is not owned by caller", P::RESOURCE)))
        }
    }
}

impl<P: ListPolicy> Authorizer<P> {
    /// List resources; returns the filter narrowed to the caller's scope.
    pub fn list(
        &self,
        principal: Option<&Principal>,
        filter: P::Filter,
    ) -> Result<P::Filter, AuthzError> {
        let decision = resolve_scope(&self.policy, principal, Operation::List)
            .and_then(|scope| narrow_filter(filter, &scope));
        log_decision(P::RESOURCE, Operation::List, &decision);
        decision
    }
}

fn log_decision<T>(resource: &'static str, operation: Operation, decision: &Result<T, AuthzError>) {
    match decision {
        Ok(_) => tracing::debug!(resource, %operation, "access granted"),
        Err(reason) => tracing::info!(resource, %operation, %reason, "access denied"),
    }
}
