//! # Documents
//!
//! Ownership-scoped documents with per-document grants, and the service
//! coordinating their store and cache.

pub mod model;
pub mod access;
pub mod filter;
pub mod store;
pub mod service;

pub use model::{parse_document_id, Document, DocumentMeta, Payload};
pub use access::{AccessTier, DocumentAccess};
pub use filter::{filter_documents, FilterKey};
pub use store::{DocumentStore, InMemoryDocumentStore};
pub use service::DocumentService;
