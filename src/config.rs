//! Service Configuration
//!
//! Secrets, session lifetime, cache TTLs and request deadlines. Loaded from a
//! JSON file or from the environment, immutable once the services are built.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::context::RequestContext;

/// Longest accepted session token lifetime (one year)
pub const MAX_EXPIRATION_SECS: u64 = 365 * 24 * 60 * 60;

/// Longest accepted cache TTL (thirty days)
pub const MAX_TTL_SECS: u64 = 30 * 24 * 60 * 60;

/// Longest accepted request or invalidation timeout (one day)
pub const MAX_TIMEOUT_MS: u64 = 24 * 60 * 60 * 1000;

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnv(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Top-level configuration for the identity and document services
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Static secret gating registration
    pub admin_token: String,

    #[serde(default)]
    pub jwt: TokenConfig,

    #[serde(default)]
    pub cache: CacheTtlConfig,

    /// Default deadline for request contexts (default: 5000)
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Budget for cache invalidation after a committed mutation (default: 2000)
    #[serde(default = "default_invalidation_timeout_ms")]
    pub invalidation_timeout_ms: u64,

    /// Listing limit used when the caller supplies none (default: 100)
    #[serde(default = "default_list_limit")]
    pub default_list_limit: usize,
}

/// Session token settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenConfig {
    /// HMAC secret for signing session tokens
    #[serde(default)]
    pub secret: String,

    /// Token lifetime in seconds (default: 24h)
    #[serde(default = "default_expiration_secs")]
    pub expiration_secs: u64,

    /// Issuer claim (default: "docshare")
    #[serde(default = "default_issuer")]
    pub issuer: String,
}

/// Cache entry lifetimes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheTtlConfig {
    /// Listing cache TTL in seconds (default: 300)
    #[serde(default = "default_listing_ttl_secs")]
    pub listing_ttl_secs: u64,

    /// Single-document cache TTL in seconds (default: 600)
    #[serde(default = "default_document_ttl_secs")]
    pub document_ttl_secs: u64,
}

fn default_request_timeout_ms() -> u64 {
    5_000
}

fn default_invalidation_timeout_ms() -> u64 {
    2_000
}

fn default_list_limit() -> usize {
    100
}

fn default_expiration_secs() -> u64 {
    24 * 60 * 60
}

fn default_issuer() -> String {
    "docshare".to_string()
}

fn default_listing_ttl_secs() -> u64 {
    5 * 60
}

fn default_document_ttl_secs() -> u64 {
    10 * 60
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            expiration_secs: default_expiration_secs(),
            issuer: default_issuer(),
        }
    }
}

impl TokenConfig {
    /// Token lifetime, capped at `MAX_EXPIRATION_SECS`
    pub fn expiration(&self) -> chrono::Duration {
        let secs = self.expiration_secs.min(MAX_EXPIRATION_SECS);
        chrono::Duration::seconds(i64::try_from(secs).unwrap_or(0))
    }
}

impl Default for CacheTtlConfig {
    fn default() -> Self {
        Self {
            listing_ttl_secs: default_listing_ttl_secs(),
            document_ttl_secs: default_document_ttl_secs(),
        }
    }
}

impl CacheTtlConfig {
    pub fn listing_ttl(&self) -> Duration {
        Duration::from_secs(self.listing_ttl_secs)
    }

    pub fn document_ttl(&self) -> Duration {
        Duration::from_secs(self.document_ttl_secs)
    }
}

impl ServiceConfig {
    /// Create a config with the given secrets and default everything else
    pub fn new(admin_token: impl Into<String>, jwt_secret: impl Into<String>) -> Self {
        Self {
            admin_token: admin_token.into(),
            jwt: TokenConfig {
                secret: jwt_secret.into(),
                ..TokenConfig::default()
            },
            cache: CacheTtlConfig::default(),
            request_timeout_ms: default_request_timeout_ms(),
            invalidation_timeout_ms: default_invalidation_timeout_ms(),
            default_list_limit: default_list_limit(),
        }
    }

    /// Load and validate a JSON config file
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: ServiceConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Build from `ADMIN_TOKEN`, `JWT_SECRET` and the optional TTL overrides
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| ConfigError::MissingEnv(key.to_string()))
        };
        let optional_secs = |key: &str| -> Result<Option<u64>, ConfigError> {
            match lookup(key) {
                Some(raw) => raw
                    .parse::<u64>()
                    .map(Some)
                    .map_err(|_| ConfigError::InvalidValue(key.to_string(), raw)),
                None => Ok(None),
            }
        };

        let mut config = Self::new(required("ADMIN_TOKEN")?, required("JWT_SECRET")?);
        if let Some(secs) = optional_secs("JWT_EXPIRATION_SECS")? {
            config.jwt.expiration_secs = secs;
        }
        if let Some(secs) = optional_secs("LISTING_CACHE_TTL_SECS")? {
            config.cache.listing_ttl_secs = secs;
        }
        if let Some(secs) = optional_secs("DOCUMENT_CACHE_TTL_SECS")? {
            config.cache.document_ttl_secs = secs;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject empty secrets, zero lifetimes and out-of-range durations
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.admin_token.is_empty() {
            return Err(ConfigError::InvalidValue("admin_token".into(), "empty".into()));
        }
        if self.jwt.secret.is_empty() {
            return Err(ConfigError::InvalidValue("jwt.secret".into(), "empty".into()));
        }

        let bounded = [
            ("jwt.expiration_secs", self.jwt.expiration_secs, 1, MAX_EXPIRATION_SECS),
            ("cache.listing_ttl_secs", self.cache.listing_ttl_secs, 1, MAX_TTL_SECS),
            ("cache.document_ttl_secs", self.cache.document_ttl_secs, 1, MAX_TTL_SECS),
            ("request_timeout_ms", self.request_timeout_ms, 0, MAX_TIMEOUT_MS),
            ("invalidation_timeout_ms", self.invalidation_timeout_ms, 0, MAX_TIMEOUT_MS),
        ];
        for (field, value, min, max) in bounded {
            if !(min..=max).contains(&value) {
                return Err(ConfigError::InvalidValue(
                    field.to_string(),
                    format!("{} outside {}..={}", value, min, max),
                ));
            }
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn invalidation_timeout(&self) -> Duration {
        Duration::from_millis(self.invalidation_timeout_ms)
    }

    /// A fresh request context bounded by the configured request timeout
    pub fn request_context(&self) -> RequestContext {
        RequestContext::new().with_timeout(self.request_timeout())
    }
}
