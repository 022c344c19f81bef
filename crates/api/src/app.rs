//! Diagnostic router: liveness plus a view of how the caller is resolved.

use axum::{Json, Router, middleware, routing::get};
use serde::Serialize;

use backoffice_auth::{ActorResolver, AuthzError, ResolveActor};
use backoffice_core::{ActorId, CompanyId, UserId};

use crate::config::AuthConfig;
use crate::errors::ApiError;
use crate::extract::CurrentPrincipal;
use crate::middleware::{AuthState, auth_middleware};

pub fn build_app(config: &AuthConfig) -> Router {
    let state = AuthState::new(config);
    Router::new()
        .route("/whoami", get(whoami))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
        .route("/health", get(health))
}

#[derive(Debug, Serialize)]
struct Health {
    status: &'static str,
}

async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

#[derive(Debug, Serialize)]
pub struct WhoAmI {
    pub subject: String,
    pub roles: Vec<String>,
    pub company_id: Option<CompanyId>,
    pub user_id: Option<UserId>,
    /// Identity changes made by this caller are attributed to.
    pub actor: ActorId,
}

async fn whoami(current: CurrentPrincipal) -> Result<Json<WhoAmI>, ApiError> {
    let principal = &current.0;
    if !principal.is_authenticated() || principal.is_anonymous() {
        return Err(AuthzError::Unauthenticated.into());
    }

    let actor = ActorResolver::new(current.clone()).resolve_actor();
    Ok(Json(WhoAmI {
        subject: principal.subject_id().to_string(),
        roles: principal.roles().iter().map(|r| r.as_str().to_string()).collect(),
        company_id: principal.company_id(),
        user_id: principal.user_id(),
        actor,
    }))
}
