use std::collections::BTreeSet;

use backoffice_core::{CompanyId, UserId};

use crate::claims::{COMPANY_ID_CLAIM, USER_ID_CLAIM};
use crate::Role;

/// Subject reported for requests that passed through without credentials.
pub const ANONYMOUS_SUBJECT: &str = "anonymousUser";

/// Authenticated-request abstraction the resolver reads from.
///
/// Implemented by verified token claims; tests implement it directly.
pub trait SecurityContext {
    fn is_authenticated(&self) -> bool;

    fn subject_id(&self) -> &str;

    fn roles(&self) -> Vec<Role>;

    fn claim(&self, name: &str) -> Option<String>;
}

/// The resolved identity and claims of the calling actor for one request.
///
/// Claims are kept raw: whether a claim resolves to an id is decided at the
/// point of use, where a malformed value means "cannot resolve".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    authenticated: bool,
    subject_id: String,
    roles: BTreeSet<Role>,
    company_claim: Option<String>,
    user_claim: Option<String>,
}

impl Principal {
    pub fn unauthenticated() -> Self {
        Self {
            authenticated: false,
            subject_id: String::new(),
            roles: BTreeSet::new(),
            company_claim: None,
            user_claim: None,
        }
    }

    /// Authenticated-but-anonymous principal (no credentials, passed through).
    pub fn anonymous() -> Self {
        Self {
            authenticated: true,
            subject_id: ANONYMOUS_SUBJECT.to_string(),
            ..Self::unauthenticated()
        }
    }

    pub fn authenticated(
        subject_id: impl Into<String>,
        roles: impl IntoIterator<Item = Role>,
    ) -> Self {
        Self {
            authenticated: true,
            subject_id: subject_id.into(),
            roles: roles.into_iter().collect(),
            company_claim: None,
            user_claim: None,
        }
    }

    pub fn with_company_claim(mut self, claim: impl Into<String>) -> Self {
        self.company_claim = Some(claim.into());
        self
    }

    pub fn with_user_claim(mut self, claim: impl Into<String>) -> Self {
        self.user_claim = Some(claim.into());
        self
    }

    /// Build a principal from a security context; absent authentication is a
    /// normal state, not an error.
    pub fn from_context<C: SecurityContext + ?Sized>(ctx: &C) -> Self {
        if !ctx.is_authenticated() {
            return Self::unauthenticated();
        }

        Self {
            authenticated: true,
            subject_id: ctx.subject_id().to_string(),
            roles: ctx.roles().into_iter().collect(),
            company_claim: ctx.claim(COMPANY_ID_CLAIM),
            user_claim: ctx.claim(USER_ID_CLAIM),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// Passed through without credentials.
    pub fn is_anonymous(&self) -> bool {
        self.subject_id == ANONYMOUS_SUBJECT
    }

    pub fn subject_id(&self) -> &str {
        &self.subject_id
    }

    pub fn roles(&self) -> &BTreeSet<Role> {
        &self.roles
    }

    pub fn has_role(&self, role: &Role) -> bool {
        self.roles.contains(role)
    }

    /// Tenant of the caller, if the claim is present and a valid UUID.
    pub fn company_id(&self) -> Option<CompanyId> {
        self.company_claim.as_deref()?.parse().ok()
    }

    /// Back-office user id of the caller.
    ///
    /// Taken from the user claim when present (a malformed claim does not
    /// fall back); otherwise from the subject when it is itself a UUID.
    pub fn user_id(&self) -> Option<UserId> {
        match self.user_claim.as_deref() {
            Some(claim) => claim.parse().ok(),
            None => self.subject_id.parse().ok(),
        }
    }
}

/// Resolve the principal for the current request.
pub fn resolve_principal<C: SecurityContext + ?Sized>(ctx: Option<&C>) -> Principal {
    match ctx {
        Some(ctx) => Principal::from_context(ctx),
        None => Principal::unauthenticated(),
    }
}
