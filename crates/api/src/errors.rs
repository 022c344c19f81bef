use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use backoffice_auth::AuthzError;

pub fn authz_error_to_response(err: &AuthzError) -> Response {
    match err {
        AuthzError::Unauthenticated => {
            json_error(StatusCode::UNAUTHORIZED, "unauthenticated", err.to_string())
        }
        AuthzError::TenantMismatch => {
            json_error(StatusCode::FORBIDDEN, "tenant_mismatch", err.to_string())
        }
        AuthzError::Forbidden(reason) => json_error(StatusCode::FORBIDDEN, "forbidden", reason.clone()),
    }
}

/// Error returned by handlers.
#[derive(Debug)]
pub struct ApiError(pub AuthzError);

impl From<AuthzError> for ApiError {
    fn from(err: AuthzError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        authz_error_to_response(&self.0)
    }
}

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
