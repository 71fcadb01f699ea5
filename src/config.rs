//! Gate configuration with validation.
//!
//! The only required setting is the tenant identifier; everything else
//! has working defaults. Configuration can be built programmatically or
//! loaded from environment variables.

use std::env;

use thiserror::Error;
use url::Url;

/// Default discovery authority for Azure AD tenants.
pub const DEFAULT_AUTHORITY: &str = "https://login.windows.net";

/// Default timeout for discovery and key-publication fetches, in seconds.
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Missing required field
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    /// Invalid URL format
    #[error("Invalid URL for {field}: {reason}")]
    InvalidUrl {
        /// Name of the offending field
        field: String,
        /// Why the URL was rejected
        reason: String,
    },

    /// Invalid fetch timeout
    #[error("Invalid fetch timeout: must be greater than 0")]
    InvalidTimeout,

    /// Environment variable parse error
    #[error("Failed to parse environment variable {name}: {reason}")]
    ParseError {
        /// Variable name
        name: String,
        /// Why parsing failed
        reason: String,
    },

    /// The outbound HTTP client could not be constructed
    #[error("Failed to build HTTP client: {reason}")]
    HttpClient {
        /// Underlying client error
        reason: String,
    },
}

/// What the gate does with a request it cannot authenticate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RejectMode {
    /// Rejections become `401` responses; key-acquisition failures
    /// become `503` responses.
    Strict,

    /// The request proceeds down the stack unauthenticated, with no
    /// claims attached. **Security-relevant**: this is the default, and
    /// it silently admits requests that failed authentication. Prefer
    /// [`RejectMode::Strict`] unless downstream services perform their
    /// own checks.
    #[default]
    FailOpen,
}

/// Gate configuration.
#[derive(Debug, Clone)]
pub struct GateConfig {
    /// Expected tenant identifier, used for both issuer validation and
    /// key discovery. Required.
    pub tenant: String,
    /// Behavior on failed authentication.
    pub reject_mode: RejectMode,
    /// Base URL the metadata-discovery endpoint is derived from.
    pub authority: Url,
    /// Timeout for discovery and key-publication fetches, in seconds.
    pub fetch_timeout_secs: u64,
}

impl GateConfig {
    /// Creates a configuration for the given tenant with defaults
    /// everywhere else.
    ///
    /// Fails immediately if the tenant is empty.
    pub fn new(tenant: impl Into<String>) -> Result<Self, ConfigError> {
        let config = Self {
            tenant: tenant.into(),
            reject_mode: RejectMode::default(),
            authority: default_authority(),
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
        };
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from environment variables.
    ///
    /// Recognized variables: `AAD_TENANT` (required), `AAD_STRICT`
    /// (bool, default false), `AAD_AUTHORITY`, `AAD_FETCH_TIMEOUT`.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let tenant = env::var("AAD_TENANT")
            .map_err(|_| ConfigError::MissingRequired("AAD_TENANT".to_string()))?;
        let reject_mode = if parse_env("AAD_STRICT", false)? {
            RejectMode::Strict
        } else {
            RejectMode::FailOpen
        };

        let config = Self {
            tenant,
            reject_mode,
            authority: parse_url_env("AAD_AUTHORITY", DEFAULT_AUTHORITY)?,
            fetch_timeout_secs: parse_env("AAD_FETCH_TIMEOUT", DEFAULT_FETCH_TIMEOUT_SECS)?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Sets the reject mode.
    #[must_use]
    pub fn with_reject_mode(mut self, mode: RejectMode) -> Self {
        self.reject_mode = mode;
        self
    }

    /// Overrides the discovery authority.
    #[must_use]
    pub fn with_authority(mut self, authority: Url) -> Self {
        self.authority = authority;
        self
    }

    /// Overrides the fetch timeout.
    #[must_use]
    pub fn with_fetch_timeout_secs(mut self, secs: u64) -> Self {
        self.fetch_timeout_secs = secs;
        self
    }

    /// Validates the configuration.
    ///
    /// Re-run by the gate constructor, since builder setters do not
    /// validate.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.tenant.trim().is_empty() {
            return Err(ConfigError::MissingRequired("tenant".to_string()));
        }
        if self.fetch_timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout);
        }
        if self.authority.cannot_be_a_base() {
            return Err(ConfigError::InvalidUrl {
                field: "authority".to_string(),
                reason: "must be an absolute base URL".to_string(),
            });
        }
        Ok(())
    }
}

fn default_authority() -> Url {
    Url::parse(DEFAULT_AUTHORITY).expect("default authority is a valid URL")
}

/// Parse an environment variable with a default value.
fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(val) => val.parse().map_err(|e: T::Err| ConfigError::ParseError {
            name: name.to_string(),
            reason: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}

/// Parse a URL environment variable with a default value.
fn parse_url_env(name: &str, default: &str) -> Result<Url, ConfigError> {
    let url_str = env::var(name).unwrap_or_else(|_| default.to_string());
    Url::parse(&url_str).map_err(|e| ConfigError::InvalidUrl {
        field: name.to_string(),
        reason: e.to_string(),
    })
}
