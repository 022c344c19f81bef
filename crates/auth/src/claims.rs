use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::{Role, SecurityContext};

/// Claim naming the caller's company (tenant).
pub const COMPANY_ID_CLAIM: &str = "company_id";

/// Claim naming the caller's back-office user id.
pub const USER_ID_CLAIM: &str = "user_id";

/// JWT claims model (transport-agnostic).
///
/// The subject is kept as an opaque string: identity providers issue UUIDs,
/// e-mail addresses or provider-specific ids (`auth0|...`) interchangeably.
/// Custom claims such as [`COMPANY_ID_CLAIM`] live in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject / principal identifier.
    pub sub: String,

    #[serde(default)]
    pub roles: Vec<Role>,

    /// Issued-at timestamp.
    #[serde(rename = "iat", with = "chrono::serde::ts_seconds")]
    pub issued_at: DateTime<Utc>,

    /// Expiration timestamp.
    #[serde(rename = "exp", with = "chrono::serde::ts_seconds")]
    pub expires_at: DateTime<Utc>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl JwtClaims {
    pub fn new(
        sub: impl Into<String>,
        roles: Vec<Role>,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            sub: sub.into(),
            roles,
            issued_at,
            expires_at,
            extra: Map::new(),
        }
    }

    pub fn with_claim(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(name.into(), value.into());
        self
    }
}

impl SecurityContext for JwtClaims {
    fn is_authenticated(&self) -> bool {
        true
    }

    fn subject_id(&self) -> &str {
        &self.sub
    }

    fn roles(&self) -> Vec<Role> {
        self.roles.clone()
    }

    fn claim(&self, name: &str) -> Option<String> {
        match self.extra.get(name)? {
            Value::String(s) => Some(s.clone()),
            _ => None,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (issued_at is in the future)")]
    NotYetValid,

    #[error("invalid token time window (expires_at <= issued_at)")]
    InvalidTimeWindow,
}

/// Deterministically validate JWT claims.
///
/// Note: this validates the *claims* only. Signature verification / decoding
/// happens at the HTTP edge.
pub fn validate_claims(claims: &JwtClaims, now: DateTime<Utc>) -> Result<(), TokenValidationError> {
    if claims.expires_at <= claims.issued_at {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    if now < claims.issued_at {
        return Err(TokenValidationError::NotYetValid);
    }
    if now >= claims.expires_at {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}
