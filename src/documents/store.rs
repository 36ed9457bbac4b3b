//! # Document Store Trait
//!
//! Durable document storage consumed by the coordination service, and an
//! in-memory implementation.

use std::sync::RwLock;

use async_trait::async_trait;
use uuid::Uuid;

use super::model::Document;
use crate::errors::{StoreError, StoreResult};

/// Durable document storage
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn create(&self, doc: &Document) -> StoreResult<()>;

    /// Fetch a full document; `NotFound` if absent
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Document>;

    /// Up to `limit` documents owned by, granted to, or public for `login`,
    /// ordered by name then creation time, without payload bodies
    async fn list_visible(&self, login: &str, limit: usize) -> StoreResult<Vec<Document>>;

    /// Delete `id` if owned by `owner`; returns rows affected (0 on mismatch)
    async fn delete_owned(&self, id: Uuid, owner: &str) -> StoreResult<u64>;

    async fn exists(&self, id: Uuid) -> StoreResult<bool>;
}

/// In-memory document store
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    docs: RwLock<Vec<Document>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.docs.read().map(|d| d.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned() -> StoreError {
    StoreError::Backend("Lock poisoned".to_string())
}

fn visible_to(doc: &Document, login: &str) -> bool {
    doc.owner == login || doc.grant.iter().any(|g| g == login) || doc.public
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn create(&self, doc: &Document) -> StoreResult<()> {
        let mut docs = self.docs.write().map_err(|_| poisoned())?;

        if docs.iter().any(|d| d.id == doc.id) {
            return Err(StoreError::Duplicate(doc.id.to_string()));
        }

        docs.push(doc.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Document> {
        let docs = self.docs.read().map_err(|_| poisoned())?;
        docs.iter()
            .find(|d| d.id == id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("document {}", id)))
    }

    async fn list_visible(&self, login: &str, limit: usize) -> StoreResult<Vec<Document>> {
        let docs = self.docs.read().map_err(|_| poisoned())?;

        let mut visible: Vec<&Document> = docs.iter().filter(|d| visible_to(d, login)).collect();
        visible.sort_by(|a, b| {
            a.name
                .cmp(&b.name)
                .then_with(|| a.created_at.cmp(&b.created_at))
        });

        Ok(visible.into_iter().take(limit).map(Document::summary).collect())
    }

    async fn delete_owned(&self, id: Uuid, owner: &str) -> StoreResult<u64> {
        let mut docs = self.docs.write().map_err(|_| poisoned())?;

        let before = docs.len();
        docs.retain(|d| !(d.id == id && d.owner == owner));
        Ok((before - docs.len()) as u64)
    }

    async fn exists(&self, id: Uuid) -> StoreResult<bool> {
        let docs = self.docs.read().map_err(|_| poisoned())?;
        Ok(docs.iter().any(|d| d.id == id))
    }
}
