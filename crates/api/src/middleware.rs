use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use thiserror::Error;

use backoffice_auth::{JwtClaims, TokenValidationError, validate_claims};

use crate::config::AuthConfig;
use crate::context::RequestContext;
use crate::errors::json_error;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("malformed authorization header")]
    MalformedHeader,

    #[error("invalid token: {0}")]
    Decode(#[from] jsonwebtoken::errors::Error),

    #[error(transparent)]
    Claims(#[from] TokenValidationError),
}

const MAX_LEEWAY_SECS: u64 = 24 * 60 * 60;

/// HS256 bearer-token verifier.
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
    leeway: chrono::Duration,
}

impl TokenVerifier {
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = config.leeway_secs;
        if let Some(issuer) = &config.issuer {
            validation.set_issuer(&[issuer]);
        }
        match &config.audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }

        Self {
            key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
            leeway: chrono::Duration::seconds(config.leeway_secs.min(MAX_LEEWAY_SECS) as i64),
        }
    }

    /// Check the signature, then the claim time window.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, TokenError> {
        let claims = jsonwebtoken::decode::<JwtClaims>(token, &self.key, &self.validation)?.claims;
        match validate_claims(&claims, now) {
            Ok(()) => Ok(claims),
            Err(TokenValidationError::NotYetValid) if claims.issued_at <= now + self.leeway => {
                Ok(claims)
            }
            Err(TokenValidationError::Expired) if now < claims.expires_at + self.leeway => {
                Ok(claims)
            }
            Err(err) => Err(err.into()),
        }
    }
}

#[derive(Clone)]
pub struct AuthState {
    pub verifier: Arc<TokenVerifier>,
}

impl AuthState {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            verifier: Arc::new(TokenVerifier::new(config)),
        }
    }
}

/// Attach a [`RequestContext`] to the request.
///
/// No `Authorization` header yields an anonymous context; a header that is
/// present but does not verify is rejected with 401.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Response {
    let context = match extract_bearer(req.headers()) {
        Ok(None) => RequestContext::anonymous(),
        Ok(Some(token)) => match state.verifier.verify(token, Utc::now()) {
            Ok(claims) => RequestContext::authenticated(claims),
            Err(err) => return reject(err),
        },
        Err(err) => return reject(err),
    };

    req.extensions_mut().insert(context);
    next.run(req).await
}

fn reject(err: TokenError) -> Response {
    tracing::info!(reason = %err, "rejected bearer token");
    json_error(StatusCode::UNAUTHORIZED, "invalid_token", err.to_string())
}

fn extract_bearer(headers: &HeaderMap) -> Result<Option<&str>, TokenError> {
    let Some(header) = headers.get(AUTHORIZATION) else {
        return Ok(None);
    };

    let header = header.to_str().map_err(|_| TokenError::MalformedHeader)?;
    let token = header
        .strip_prefix("Bearer ")
        .ok_or(TokenError::MalformedHeader)?
        .trim();
    if token.is_empty() {
        return Err(TokenError::MalformedHeader);
    }

    Ok(Some(token))
}
