//! # Document Cache Trait

use std::time::Duration;

use async_trait::async_trait;

use super::errors::CacheResult;
use crate::documents::Document;

/// Volatile key-value cache of documents and document collections.
///
/// A miss is `Ok(None)`. Entries may vanish at any time; the record store
/// stays the source of truth.
#[async_trait]
pub trait DocumentCache: Send + Sync {
    async fn set_document(&self, key: &str, doc: &Document, ttl: Duration) -> CacheResult<()>;

    async fn get_document(&self, key: &str) -> CacheResult<Option<Document>>;

    async fn set_documents(&self, key: &str, docs: &[Document], ttl: Duration) -> CacheResult<()>;

    async fn get_documents(&self, key: &str) -> CacheResult<Option<Vec<Document>>>;

    /// Delete one key; returns whether it existed
    async fn delete(&self, key: &str) -> CacheResult<bool>;

    /// Delete every key matching a glob (see `keys::glob_match`); returns the count removed
    async fn delete_pattern(&self, pattern: &str) -> CacheResult<usize>;
}
