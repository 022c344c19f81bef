//! Narrowing list filters to a caller's scope.

use backoffice_core::{ClaimFilter, CompanyFilter, CompanyId, UserFilter, UserId};

use crate::authorize::{AuthzError, Scope};

/// A list filter that can be restricted to one company or one user.
pub trait ScopedFilter: Sized {
    fn company_scope(&self) -> Option<CompanyId>;

    fn with_company_scope(self, company_id: CompanyId) -> Self;

    fn user_scope(&self) -> Option<UserId>;

    /// `None` when the filter has no way to express a per-user restriction.
    fn with_user_scope(self, user_id: UserId) -> Option<Self>;
}

/// Apply `scope` to a caller-supplied filter.
///
/// - unrestricted: the filter is returned untouched
/// - company: an unset company is forced to the caller's; the same company is
///   accepted; a different company is rejected
/// - own: an unset user is forced to the caller; any other user is rejected
pub fn narrow_filter<F: ScopedFilter>(filter: F, scope: &Scope) -> Result<F, AuthzError> {
    match *scope {
        Scope::Unrestricted => Ok(filter),
        Scope::Company(company_id) => match filter.company_scope() {
            None => Ok(filter.with_company_scope(company_id)),
            Some(requested) if requested == company_id => Ok(filter),
            Some(_) => Err(AuthzError::TenantMismatch),
        },
        Scope::Own { user_id, .. } => match filter.user_scope() {
            Some(requested) if requested != user_id => Err(AuthzError::forbidden(
                "cannot list records of another user",
            )),
            _ => filter
                .with_user_scope(user_id)
                .ok_or_else(|| AuthzError::forbidden("filter cannot be restricted to a user")),
        },
    }
}

impl ScopedFilter for CompanyFilter {
    fn company_scope(&self) -> Option<CompanyId> {
        self.id
    }

    fn with_company_scope(mut self, company_id: CompanyId) -> Self {
        self.id = Some(company_id);
        self
    }

    fn user_scope(&self) -> Option<UserId> {
        None
    }

    fn with_user_scope(self, _user_id: UserId) -> Option<Self> {
        None
    }
}

impl ScopedFilter for UserFilter {
    fn company_scope(&self) -> Option<CompanyId> {
        self.company_id
    }

    fn with_company_scope(mut self, company_id: CompanyId) -> Self {
        self.company_id = Some(company_id);
        self
    }

    fn user_scope(&self) -> Option<UserId> {
        self.user_id
    }

    fn with_user_scope(mut self, user_id: UserId) -> Option<Self> {
        self.user_id = Some(user_id);
        Some(self)
    }
}

impl ScopedFilter for ClaimFilter {
    fn company_scope(&self) -> Option<CompanyId> {
        self.company_id
    }

    fn with_company_scope(mut self, company_id: CompanyId) -> Self {
        self.company_id = Some(company_id);
        self
    }

    fn user_scope(&self) -> Option<UserId> {
        self.user_id
    }

    fn with_user_scope(mut self, user_id: UserId) -> Option<Self> {
        self.user_id = Some(user_id);
        Some(self)
    }
}
