//! Environment configuration
//!
//! Settings are read from `CSRF_`-prefixed environment variables, after
//! loading a `.env` file when one exists:
//!
//! | variable | meaning |
//! |----------|---------|
//! | `CSRF_AUTH_KEY` | secret key (required) |
//! | `CSRF_SECURE` | HTTPS-only cookie |
//! | `CSRF_COOKIE_NAME` | cookie name |
//! | `CSRF_FIELD_NAME` | form field name |
//! | `CSRF_REQUEST_HEADER` | token header name |
//! | `CSRF_DOMAIN` | cookie domain |
//! | `CSRF_PATH` | cookie path |
//! | `CSRF_MAX_AGE` | cookie lifetime in seconds |
//! | `CSRF_TRUSTED_ORIGINS` | comma-separated referer hosts |

use crate::middleware::Csrf;
use csrf_protect::CsrfOption;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

/// Prefix shared by every variable
pub const ENV_PREFIX: &str = "CSRF_";

/// Error type for configuration loading failures
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable is missing.
    #[error("Missing required environment variable: {0}")]
    MissingVar(String),

    /// Environment variable deserialization failed.
    #[error("Configuration error: {0}")]
    Env(envy::Error),

    /// The protection rejected the loaded settings.
    #[error("Invalid CSRF settings: {0}")]
    Protection(#[from] csrf_protect::Error),
}

impl From<envy::Error> for ConfigError {
    fn from(err: envy::Error) -> Self {
        match err {
            envy::Error::MissingValue(field) => {
                ConfigError::MissingVar(format!("{}{}", ENV_PREFIX, field.to_uppercase()))
            }
            other => ConfigError::Env(other),
        }
    }
}

/// CSRF settings as read from the environment
///
/// Unset optional values keep the middleware defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CsrfSettings {
    /// Secret key signing the cookie.
    pub auth_key: String,
    /// HTTPS-only cookie.
    pub secure: Option<bool>,
    /// Cookie name.
    pub cookie_name: Option<String>,
    /// Form field name.
    pub field_name: Option<String>,
    /// Header carrying the token.
    pub request_header: Option<String>,
    /// Cookie domain.
    pub domain: Option<String>,
    /// Cookie path.
    pub path: Option<String>,
    /// Cookie lifetime in seconds.
    pub max_age: Option<u64>,
    /// Referer hosts accepted besides the request's own.
    pub trusted_origins: Option<Vec<String>>,
}

impl CsrfSettings {
    /// Read settings from `CSRF_*` variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(envy::prefixed(ENV_PREFIX).from_env::<Self>()?)
    }

    /// Secret key plus the options the settings describe
    pub fn into_parts(self) -> (Vec<u8>, Vec<CsrfOption>) {
        let mut opts = Vec::new();

        if let Some(secure) = self.secure {
            opts.push(csrf_protect::secure(secure));
        }
        if let Some(name) = self.cookie_name {
            opts.push(csrf_protect::cookie_name(name));
        }
        if let Some(name) = self.field_name {
            opts.push(csrf_protect::field_name(name));
        }
        if let Some(header) = self.request_header {
            opts.push(csrf_protect::request_header(header));
        }
        if let Some(domain) = self.domain {
            opts.push(csrf_protect::domain(domain));
        }
        if let Some(path) = self.path {
            opts.push(csrf_protect::path(path));
        }
        if let Some(seconds) = self.max_age {
            opts.push(csrf_protect::max_age(Duration::from_secs(seconds)));
        }
        if let Some(origins) = self.trusted_origins {
            opts.push(csrf_protect::trusted_origins(origins));
        }

        (self.auth_key.into_bytes(), opts)
    }
}

/// Load environment variables from a `.env` file, if present
pub fn load_dotenv() {
    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!("Loaded environment from {}", path.display());
    }
}

impl Csrf {
    /// Create the middleware from `.env` and `CSRF_*` variables
    pub fn from_env() -> Result<Self, ConfigError> {
        load_dotenv();
        let (secret, opts) = CsrfSettings::from_env()?.into_parts();
        Ok(Csrf::new(secret, opts)?)
    }
}
