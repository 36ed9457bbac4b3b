//! Shared fixtures for integration tests: in-memory services plus counting,
//! failing and slow wrappers around the store and cache contracts.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use docshare::auth::{IdentityService, InMemoryUserStore, User, UserStore};
use docshare::cache::{CacheError, CacheResult, DocumentCache, InMemoryCache};
use docshare::clock::{SequentialIds, SteppingClock};
use docshare::documents::{DocumentMeta, DocumentService, DocumentStore, InMemoryDocumentStore};
use docshare::errors::StoreResult;
use docshare::{Document, ServiceConfig};

pub const ADMIN: &str = "admin-secret";
pub const PASSWORD: &str = "Abc1!";

pub fn config() -> ServiceConfig {
    ServiceConfig::new(ADMIN, "integration-secret")
}

/// Clock starting at a fixed instant and advancing one second per reading,
/// so creation times are distinct and ordered
pub fn stepping_clock() -> Arc<SteppingClock> {
    let start = chrono::DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z")
        .unwrap()
        .with_timezone(&chrono::Utc);
    Arc::new(SteppingClock::new(start, chrono::Duration::seconds(1)))
}

pub fn document_service(
    store: Arc<dyn DocumentStore>,
    cache: Arc<dyn DocumentCache>,
) -> DocumentService {
    DocumentService::new(store, cache, &config())
        .with_sources(stepping_clock(), Arc::new(SequentialIds::default()))
}

pub fn identity_service(cache: Arc<dyn DocumentCache>) -> IdentityService {
    IdentityService::new(Arc::new(InMemoryUserStore::new()), cache, &config())
}

pub fn meta(name: &str, is_file: bool, public: bool, grant: &[&str]) -> DocumentMeta {
    DocumentMeta {
        name: name.to_string(),
        is_file,
        public,
        mime: if is_file { "text/plain" } else { "application/json" }.to_string(),
        grant: grant.iter().map(|g| g.to_string()).collect(),
    }
}

// =============================================================================
// Store Wrappers
// =============================================================================

/// Counts reads reaching the wrapped store
#[derive(Default)]
pub struct CountingStore {
    inner: InMemoryDocumentStore,
    pub lists: AtomicUsize,
    pub finds: AtomicUsize,
}

impl CountingStore {
    pub fn lists(&self) -> usize {
        self.lists.load(Ordering::SeqCst)
    }

    pub fn finds(&self) -> usize {
        self.finds.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentStore for CountingStore {
    async fn create(&self, doc: &Document) -> StoreResult<()> {
        self.inner.create(doc).await
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Document> {
        self.finds.fetch_add(1, Ordering::SeqCst);
        self.inner.find_by_id(id).await
    }

    async fn list_visible(&self, login: &str, limit: usize) -> StoreResult<Vec<Document>> {
        self.lists.fetch_add(1, Ordering::SeqCst);
        self.inner.list_visible(login, limit).await
    }

    async fn delete_owned(&self, id: Uuid, owner: &str) -> StoreResult<u64> {
        self.inner.delete_owned(id, owner).await
    }

    async fn exists(&self, id: Uuid) -> StoreResult<bool> {
        self.inner.exists(id).await
    }
}

/// Delays every call by a fixed amount before delegating
pub struct SlowStore {
    inner: InMemoryDocumentStore,
    delay: Duration,
}

impl SlowStore {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: InMemoryDocumentStore::new(),
            delay,
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }
}

#[async_trait]
impl DocumentStore for SlowStore {
    async fn create(&self, doc: &Document) -> StoreResult<()> {
        tokio::time::sleep(self.delay).await;
        self.inner.create(doc).await
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Document> {
        tokio::time::sleep(self.delay).await;
        self.inner.find_by_id(id).await
    }

    async fn list_visible(&self, login: &str, limit: usize) -> StoreResult<Vec<Document>> {
        tokio::time::sleep(self.delay).await;
        self.inner.list_visible(login, limit).await
    }

    async fn delete_owned(&self, id: Uuid, owner: &str) -> StoreResult<u64> {
        tokio::time::sleep(self.delay).await;
        self.inner.delete_owned(id, owner).await
    }

    async fn exists(&self, id: Uuid) -> StoreResult<bool> {
        tokio::time::sleep(self.delay).await;
        self.inner.exists(id).await
    }
}

/// User store whose existence check always misses, as when two
/// registrations for one login interleave between check and insert
#[derive(Default)]
pub struct RacingUserStore {
    inner: InMemoryUserStore,
}

#[async_trait]
impl UserStore for RacingUserStore {
    async fn create(&self, user: &User) -> StoreResult<()> {
        self.inner.create(user).await
    }

    async fn find_by_login(&self, login: &str) -> StoreResult<User> {
        self.inner.find_by_login(login).await
    }

    async fn exists(&self, _login: &str) -> StoreResult<bool> {
        Ok(false)
    }
}

// =============================================================================
// Cache Wrappers
// =============================================================================

/// Cache whose every operation fails
#[derive(Default)]
pub struct FailingCache {
    pub calls: AtomicUsize,
}

impl FailingCache {
    fn fail<T>(&self) -> CacheResult<T> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(CacheError::Backend("connection refused".to_string()))
    }
}

#[async_trait]
impl DocumentCache for FailingCache {
    async fn set_document(&self, _key: &str, _doc: &Document, _ttl: Duration) -> CacheResult<()> {
        self.fail()
    }

    async fn get_document(&self, _key: &str) -> CacheResult<Option<Document>> {
        self.fail()
    }

    async fn set_documents(
        &self,
        _key: &str,
        _docs: &[Document],
        _ttl: Duration,
    ) -> CacheResult<()> {
        self.fail()
    }

    async fn get_documents(&self, _key: &str) -> CacheResult<Option<Vec<Document>>> {
        self.fail()
    }

    async fn delete(&self, _key: &str) -> CacheResult<bool> {
        self.fail()
    }

    async fn delete_pattern(&self, _pattern: &str) -> CacheResult<usize> {
        self.fail()
    }
}

/// Cache that never answers within any reasonable deadline
pub struct HangingCache {
    pub inner: InMemoryCache,
}

impl HangingCache {
    pub fn new() -> Self {
        Self {
            inner: InMemoryCache::new(),
        }
    }

    async fn hang(&self) {
        tokio::time::sleep(Duration::from_secs(3600)).await;
    }
}

#[async_trait]
impl DocumentCache for HangingCache {
    async fn set_document(&self, key: &str, doc: &Document, ttl: Duration) -> CacheResult<()> {
        self.hang().await;
        self.inner.set_document(key, doc, ttl).await
    }

    async fn get_document(&self, key: &str) -> CacheResult<Option<Document>> {
        self.hang().await;
        self.inner.get_document(key).await
    }

    async fn set_documents(&self, key: &str, docs: &[Document], ttl: Duration) -> CacheResult<()> {
        self.hang().await;
        self.inner.set_documents(key, docs, ttl).await
    }

    async fn get_documents(&self, key: &str) -> CacheResult<Option<Vec<Document>>> {
        self.hang().await;
        self.inner.get_documents(key).await
    }

    async fn delete(&self, key: &str) -> CacheResult<bool> {
        self.hang().await;
        self.inner.delete(key).await
    }

    async fn delete_pattern(&self, pattern: &str) -> CacheResult<usize> {
        self.hang().await;
        self.inner.delete_pattern(pattern).await
    }
}
