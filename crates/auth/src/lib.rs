//! `backoffice-auth`: principal resolution, actor identity and tenant-scoped
//! authorization.
//!
//! This crate is intentionally decoupled from HTTP and storage: requests reach
//! it as a [`SecurityContext`], storage reaches it as an [`OwnershipLookup`].

pub mod access;
pub mod actor;
pub mod authorize;
pub mod claims;
pub mod ownership;
pub mod policies;
pub mod principal;
pub mod roles;
pub mod scope;

pub use access::{AccessControl, AccessTarget, Granted};
pub use actor::{ActorResolver, PrincipalSource, PrincipalSourceError, ResolveActor, actor_for};
pub use authorize::{AuthzError, Authorizer, NewResource, Operation, Scope};
pub use claims::{JwtClaims, TokenValidationError, validate_claims};
pub use ownership::{OwnershipDescriptor, OwnershipError, OwnershipLookup};
pub use principal::{Principal, SecurityContext, resolve_principal};
pub use roles::Role;
pub use scope::ScopedFilter;
