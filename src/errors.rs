//! # Service Errors
//!
//! Error taxonomy surfaced to callers of the identity and document services,
//! plus the error contract spoken by the record stores.

use thiserror::Error;

/// Result type for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Result type for record store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors returned by the identity and document services
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// Malformed login, password, metadata or identifier
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Bad admin token, bad credentials, invalid or expired session token.
    /// Deliberately carries no detail.
    #[error("Unauthorized")]
    Unauthorized,

    /// Authenticated but not permitted to read the document
    #[error("Access denied")]
    Forbidden,

    /// Duplicate login
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Unknown document or user
    #[error("Not found: {0}")]
    NotFound(String),

    /// Durable store failure
    #[error("Store error: {0}")]
    Store(String),

    /// The request deadline elapsed
    #[error("Request cancelled: deadline exceeded")]
    Cancelled,

    /// Hashing or token signing failed
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            ServiceError::InvalidInput(_) => 400,
            ServiceError::Unauthorized => 401,
            ServiceError::Forbidden => 403,
            ServiceError::NotFound(_) => 404,
            ServiceError::Conflict(_) => 409,
            ServiceError::Store(_) => 500,
            ServiceError::Internal(_) => 500,
            ServiceError::Cancelled => 504,
        }
    }

    /// Returns whether the caller is at fault
    pub fn is_client_error(&self) -> bool {
        self.status_code() < 500
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}

/// Errors reported by `UserStore` and `DocumentStore` implementations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Uniqueness violation on insert
    #[error("Duplicate record: {0}")]
    Duplicate(String),

    #[error("Backend failure: {0}")]
    Backend(String),
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => ServiceError::NotFound(what),
            StoreError::Duplicate(what) => ServiceError::Conflict(what),
            StoreError::Backend(msg) => ServiceError::Store(msg),
        }
    }
}
