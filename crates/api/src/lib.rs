//! HTTP edge: bearer-token verification, principal extraction and mapping of
//! authorization failures to responses.

pub mod app;
pub mod config;
pub mod context;
pub mod errors;
pub mod extract;
pub mod middleware;

pub use app::build_app;
pub use config::{AuthConfig, ConfigError};
pub use context::RequestContext;
pub use extract::CurrentPrincipal;
