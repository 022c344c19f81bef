//! Environment configuration for the HTTP edge.

use std::net::SocketAddr;

use thiserror::Error;

pub const JWT_SECRET_VAR: &str = "BACKOFFICE_JWT_SECRET";
pub const JWT_ISSUER_VAR: &str = "BACKOFFICE_JWT_ISSUER";
pub const JWT_AUDIENCE_VAR: &str = "BACKOFFICE_JWT_AUDIENCE";
pub const JWT_LEEWAY_VAR: &str = "BACKOFFICE_JWT_LEEWAY_SECS";
pub const BIND_ADDR_VAR: &str = "BACKOFFICE_BIND_ADDR";

const DEFAULT_LEEWAY_SECS: u64 = 30;
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{var} is invalid: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Bearer-token verification settings.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthConfig {
    pub secret: String,
    pub issuer: Option<String>,
    pub audience: Option<String>,
    pub leeway_secs: u64,
}

impl core::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("secret", &"<redacted>")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("leeway_secs", &self.leeway_secs)
            .finish()
    }
}

impl AuthConfig {
    /// HS256 with the given secret and default leeway.
    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            issuer: None,
            audience: None,
            leeway_secs: DEFAULT_LEEWAY_SECS,
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let secret = non_empty(lookup(JWT_SECRET_VAR)).ok_or(ConfigError::Missing(JWT_SECRET_VAR))?;
        let leeway_secs = match non_empty(lookup(JWT_LEEWAY_VAR)) {
            Some(raw) => raw.parse().map_err(|e: std::num::ParseIntError| ConfigError::Invalid {
                var: JWT_LEEWAY_VAR,
                reason: e.to_string(),
            })?,
            None => DEFAULT_LEEWAY_SECS,
        };

        Ok(Self {
            secret,
            issuer: non_empty(lookup(JWT_ISSUER_VAR)),
            audience: non_empty(lookup(JWT_AUDIENCE_VAR)),
            leeway_secs,
        })
    }
}

/// Listen address of the diagnostic server.
pub fn bind_addr_from_env() -> Result<SocketAddr, ConfigError> {
    bind_addr_from_lookup(|var| std::env::var(var).ok())
}

pub fn bind_addr_from_lookup(
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<SocketAddr, ConfigError> {
    let raw = non_empty(lookup(BIND_ADDR_VAR)).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
    raw.parse().map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
        var: BIND_ADDR_VAR,
        reason: e.to_string(),
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
