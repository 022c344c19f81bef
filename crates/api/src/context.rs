use std::sync::Arc;

use backoffice_auth::{JwtClaims, Principal, resolve_principal};

/// Security context attached to every request by the auth middleware.
///
/// Requests without credentials carry an empty context; deciding whether
/// that is acceptable is left to the handler's authorization step.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    claims: Option<Arc<JwtClaims>>,
}

impl RequestContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(claims: JwtClaims) -> Self {
        Self {
            claims: Some(Arc::new(claims)),
        }
    }

    pub fn claims(&self) -> Option<&JwtClaims> {
        self.claims.as_deref()
    }

    pub fn principal(&self) -> Principal {
        resolve_principal(self.claims())
    }
}
