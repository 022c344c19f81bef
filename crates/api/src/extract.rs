use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};

use backoffice_auth::{Principal, PrincipalSource, PrincipalSourceError};

use crate::context::RequestContext;

/// The resolved principal of the current request.
///
/// Never rejects: a request that bypassed the auth middleware resolves to an
/// unauthenticated principal, which every authorization decision denies.
#[derive(Debug, Clone)]
pub struct CurrentPrincipal(pub Principal);

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentPrincipal
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let principal = match parts.extensions.get::<RequestContext>() {
            Some(context) => context.principal(),
            None => Principal::unauthenticated(),
        };
        Ok(Self(principal))
    }
}

impl PrincipalSource for CurrentPrincipal {
    fn current(&self) -> Result<Option<Principal>, PrincipalSourceError> {
        Ok(Some(self.0.clone()))
    }
}
