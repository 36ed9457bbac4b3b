//! docshare - document access and cache coordination
//!
//! An identity service (admin-gated registration, password authentication,
//! signed session tokens) and a document service (upload, authorized reads,
//! filtered listings, owner deletes) coordinating a durable store with a
//! cache-aside layer.

pub mod auth;
pub mod cache;
pub mod clock;
pub mod config;
pub mod context;
pub mod documents;
pub mod errors;

pub use auth::{IdentityService, SessionIdentity};
pub use cache::{DocumentCache, InMemoryCache};
pub use config::ServiceConfig;
pub use context::RequestContext;
pub use documents::{Document, DocumentMeta, DocumentService, Payload};
pub use errors::{ServiceError, ServiceResult, StoreError};
