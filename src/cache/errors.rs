//! # Cache Errors
//!
//! Cache failures never reach callers of the services: reads degrade to a
//! miss and writes or invalidations are logged and dropped.

use thiserror::Error;

/// Result type for cache operations
pub type CacheResult<T> = Result<T, CacheError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    #[error("Cache backend failure: {0}")]
    Backend(String),

    /// Entry could not be encoded or decoded
    #[error("Cache codec failure: {0}")]
    Codec(String),
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        CacheError::Codec(err.to_string())
    }
}
