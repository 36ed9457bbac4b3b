//! # Document Coordination
//!
//! Upload, authorized retrieval, filtered listing and owner-scoped deletion
//! over a durable `DocumentStore`, accelerated by a cache-aside
//! `DocumentCache`.
//!
//! ## Consistency
//! - The store is the source of truth. Cache failures never fail a request:
//!   reads fall through to the store, writes and invalidations are logged and
//!   dropped.
//! - Forbidden reads are never cached. A cached single-document entry is
//!   returned without re-checking access, so it is only ever written after a
//!   successful check for that requester.
//! - Mutations invalidate by pattern (`KeyPattern`), not by exact key. A
//!   listing populated concurrently with an upload or delete may survive the
//!   invalidation and stay stale until its TTL expires. Listings of other
//!   logins that include a public or granted document of the mutating owner
//!   are not invalidated either and follow the same TTL window.
//! - Invalidation runs after the store commit under its own time budget,
//!   not the request deadline, so an expiring request cannot stop it halfway.
//!   Every step is an idempotent pattern delete.

use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use super::access::DocumentAccess;
use super::filter::filter_documents;
use super::model::{Document, DocumentMeta, Payload};
use super::store::DocumentStore;
use crate::cache::{CacheKey, DocumentCache, KeyPattern};
use crate::clock::{Clock, IdGenerator, RandomIds, SystemClock};
use crate::config::{CacheTtlConfig, ServiceConfig};
use crate::context::RequestContext;
use crate::errors::ServiceResult;

/// Coordinates document reads and writes between store and cache
pub struct DocumentService {
    store: Arc<dyn DocumentStore>,
    cache: Arc<dyn DocumentCache>,
    access: DocumentAccess,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    ttls: CacheTtlConfig,
    invalidation_timeout: Duration,
    default_limit: usize,
}

impl DocumentService {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        cache: Arc<dyn DocumentCache>,
        config: &ServiceConfig,
    ) -> Self {
        Self {
            store,
            cache,
            access: DocumentAccess::new(),
            clock: Arc::new(SystemClock),
            ids: Arc::new(RandomIds),
            ttls: config.cache.clone(),
            invalidation_timeout: config.invalidation_timeout(),
            default_limit: config.default_list_limit,
        }
    }

    /// Replace the time and id sources
    pub fn with_sources(mut self, clock: Arc<dyn Clock>, ids: Arc<dyn IdGenerator>) -> Self {
        self.clock = clock;
        self.ids = ids;
        self
    }

    /// Store a new document owned by `owner`.
    ///
    /// `data` is kept for file documents and `json` otherwise, per
    /// `meta.is_file`. On success every cached listing of `owner` is dropped.
    pub async fn upload(
        &self,
        ctx: &RequestContext,
        meta: &DocumentMeta,
        data: Vec<u8>,
        json: String,
        owner: &str,
    ) -> ServiceResult<Document> {
        ctx.ensure_active()?;
        meta.validate()?;

        let doc = Document {
            id: self.ids.next_id(),
            name: meta.name.clone(),
            mime: meta.mime.clone(),
            public: meta.public,
            created_at: self.clock.now(),
            grant: meta.grant.clone(),
            owner: owner.to_string(),
            payload: Payload::select(meta.is_file, data, json),
        };

        ctx.bounded(self.store.create(&doc)).await??;
        tracing::info!(
            request_id = %ctx.request_id,
            document_id = %doc.id,
            owner = %owner,
            file = doc.is_file(),
            "document uploaded"
        );

        self.invalidate(ctx, &[KeyPattern::listings_of(owner)]).await;
        Ok(doc)
    }

    /// Documents visible to `target_login`, optionally filtered.
    ///
    /// Served from the listing cache when present. Otherwise loaded from the
    /// store (ordered by name then creation time, at most `limit`), filtered
    /// when both `filter_key` and `filter_value` are non-empty, and cached.
    /// The cache key does not include `limit`.
    pub async fn list_documents(
        &self,
        ctx: &RequestContext,
        target_login: &str,
        filter_key: &str,
        filter_value: &str,
        limit: Option<usize>,
    ) -> ServiceResult<Vec<Document>> {
        ctx.ensure_active()?;
        let key = CacheKey::listing(target_login, filter_key, filter_value);

        match ctx.bounded(self.cache.get_documents(&key)).await? {
            Ok(Some(docs)) => {
                tracing::debug!(request_id = %ctx.request_id, key = %key, "listing cache hit");
                return Ok(docs);
            }
            Ok(None) => {
                tracing::debug!(request_id = %ctx.request_id, key = %key, "listing cache miss");
            }
            Err(e) => {
                tracing::warn!(
                    request_id = %ctx.request_id,
                    key = %key,
                    error = %e,
                    "listing cache read failed"
                );
            }
        }

        let limit = limit.unwrap_or(self.default_limit);
        let mut docs = ctx
            .bounded(self.store.list_visible(target_login, limit))
            .await??;

        if !filter_key.is_empty() && !filter_value.is_empty() {
            docs = filter_documents(&docs, filter_key, filter_value);
        }

        match ctx
            .bounded(self.cache.set_documents(&key, &docs, self.ttls.listing_ttl()))
            .await
        {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::warn!(
                    request_id = %ctx.request_id,
                    key = %key,
                    error = %e,
                    "listing cache write failed"
                );
            }
            Err(_) => {
                tracing::warn!(
                    request_id = %ctx.request_id,
                    key = %key,
                    "listing cache write abandoned at deadline"
                );
            }
        }

        Ok(docs)
    }

    /// Read one document on behalf of `requester_login`.
    ///
    /// Fails with `NotFound` for unknown ids and `Forbidden` when the
    /// requester is neither owner nor grantee and the document is private.
    pub async fn get_document(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        requester_id: Uuid,
        requester_login: &str,
    ) -> ServiceResult<Document> {
        ctx.ensure_active()?;
        let key = CacheKey::document(id, requester_login);

        match ctx.bounded(self.cache.get_document(&key)).await? {
            Ok(Some(doc)) => {
                tracing::debug!(request_id = %ctx.request_id, key = %key, "document cache hit");
                return Ok(doc);
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(
                    request_id = %ctx.request_id,
                    key = %key,
                    error = %e,
                    "document cache read failed"
                );
            }
        }

        let doc = ctx.bounded(self.store.find_by_id(id)).await??;

        let tier = self.access.check_read(&doc, requester_login).inspect_err(|_| {
            tracing::info!(
                request_id = %ctx.request_id,
                document_id = %id,
                requester_id = %requester_id,
                requester = %requester_login,
                "document read denied"
            );
        })?;
        tracing::debug!(
            request_id = %ctx.request_id,
            document_id = %id,
            tier = ?tier,
            "document read allowed"
        );

        match ctx
            .bounded(self.cache.set_document(&key, &doc, self.ttls.document_ttl()))
            .await
        {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::warn!(
                    request_id = %ctx.request_id,
                    key = %key,
                    error = %e,
                    "document cache write failed"
                );
            }
            Err(_) => {
                tracing::warn!(
                    request_id = %ctx.request_id,
                    key = %key,
                    "document cache write abandoned at deadline"
                );
            }
        }

        Ok(doc)
    }

    /// Delete `id` if `requester_login` owns it.
    ///
    /// A non-owner delete affects nothing and still succeeds. Afterwards
    /// every cached copy of the document and every listing of the requester
    /// is dropped.
    pub async fn delete_document(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        requester_login: &str,
    ) -> ServiceResult<()> {
        ctx.ensure_active()?;

        let affected = ctx
            .bounded(self.store.delete_owned(id, requester_login))
            .await??;
        if affected == 0 {
            tracing::debug!(
                request_id = %ctx.request_id,
                document_id = %id,
                requester = %requester_login,
                "delete matched no owned document"
            );
        } else {
            tracing::info!(
                request_id = %ctx.request_id,
                document_id = %id,
                owner = %requester_login,
                "document deleted"
            );
        }

        self.invalidate(
            ctx,
            &[
                KeyPattern::document_variants(id),
                KeyPattern::listings_of(requester_login),
            ],
        )
        .await;
        Ok(())
    }

    /// Exact-match filter over an already loaded listing
    pub fn filter_documents(&self, docs: &[Document], key: &str, value: &str) -> Vec<Document> {
        filter_documents(docs, key, value)
    }

    async fn invalidate(&self, ctx: &RequestContext, patterns: &[String]) {
        for pattern in patterns {
            let delete = self.cache.delete_pattern(pattern);
            match tokio::time::timeout(self.invalidation_timeout, delete).await {
                Ok(Ok(removed)) => {
                    tracing::debug!(
                        request_id = %ctx.request_id,
                        pattern = %pattern,
                        removed,
                        "cache invalidated"
                    );
                }
                Ok(Err(e)) => {
                    tracing::warn!(
                        request_id = %ctx.request_id,
                        pattern = %pattern,
                        error = %e,
                        "cache invalidation failed"
                    );
                }
                Err(_) => {
                    tracing::warn!(
                        request_id = %ctx.request_id,
                        pattern = %pattern,
                        "cache invalidation timed out"
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::InMemoryCache;
    use crate::clock::SequentialIds;
    use crate::documents::InMemoryDocumentStore;
    use crate::errors::ServiceError;

    struct Fixture {
        service: DocumentService,
        store: Arc<InMemoryDocumentStore>,
        cache: Arc<InMemoryCache>,
        ctx: RequestContext,
    }

    impl Fixture {
        async fn upload_file(&self, name: &str, public: bool, grant: &[&str]) -> Document {
            let meta = meta(name, true, public, grant);
            self.service
                .upload(&self.ctx, &meta, b"x".to_vec(), String::new(), "alice")
                .await
                .unwrap()
        }

        async fn list(&self, login: &str, key: &str, value: &str) -> Vec<Document> {
            self.service
                .list_documents(&self.ctx, login, key, value, None)
                .await
                .unwrap()
        }

        async fn get(&self, id: Uuid, login: &str) -> ServiceResult<Document> {
            self.service
                .get_document(&self.ctx, id, Uuid::new_v4(), login)
                .await
        }
    }

    fn fixture() -> Fixture {
        let store = Arc::new(InMemoryDocumentStore::new());
        let cache = Arc::new(InMemoryCache::new());
        let config = ServiceConfig::new("admin", "secret");
        let service = DocumentService::new(store.clone(), cache.clone(), &config)
            .with_sources(Arc::new(SystemClock), Arc::new(SequentialIds::default()));
        Fixture {
            service,
            store,
            cache,
            ctx: RequestContext::new(),
        }
    }

    fn meta(name: &str, is_file: bool, public: bool, grant: &[&str]) -> DocumentMeta {
        DocumentMeta {
            name: name.to_string(),
            is_file,
            public,
            mime: if is_file { "text/plain" } else { "application/json" }.to_string(),
            grant: grant.iter().map(|g| g.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn test_upload_file_populates_data_only() {
        let f = fixture();
        let meta = meta("a.txt", true, false, &[]);
        let doc = f
            .service
            .upload(&f.ctx, &meta, b"content".to_vec(), "ignored".into(), "alice")
            .await
            .unwrap();

        assert_eq!(doc.id, Uuid::from_u128(1));
        assert!(doc.is_file());
        assert_eq!(doc.data(), b"content");
        assert_eq!(doc.json(), "");
        assert_eq!(doc.owner, "alice");
        assert_eq!(f.store.len(), 1);
    }

    #[tokio::test]
    async fn test_upload_json_populates_json_only() {
        let f = fixture();
        let meta = meta("a.json", false, true, &["bob", "carol"]);
        let doc = f
            .service
            .upload(&f.ctx, &meta, b"ignored".to_vec(), r#"{"k":"v"}"#.into(), "alice")
            .await
            .unwrap();

        assert!(!doc.is_file());
        assert!(doc.data().is_empty());
        assert_eq!(doc.json(), r#"{"k":"v"}"#);
        assert_eq!(doc.grant, vec!["bob", "carol"]);
    }

    #[tokio::test]
    async fn test_upload_rejects_unnamed_document() {
        let f = fixture();
        let meta = meta("", true, false, &[]);
        let result = f
            .service
            .upload(&f.ctx, &meta, Vec::new(), String::new(), "alice")
            .await;

        assert!(matches!(result, Err(ServiceError::InvalidInput(_))));
        assert!(f.store.is_empty());
    }

    #[tokio::test]
    async fn test_upload_invalidates_owner_listings_only() {
        let f = fixture();
        f.list("alice", "", "").await;
        f.list("alice", "public", "true").await;
        f.list("bob", "", "").await;
        assert_eq!(f.cache.keys().len(), 3);

        f.upload_file("a.txt", false, &[]).await;

        assert_eq!(f.cache.keys(), vec!["docs:bob::".to_string()]);
    }

    #[tokio::test]
    async fn test_listing_is_cached_and_served_unfiltered_again() {
        let f = fixture();
        f.upload_file("a.txt", true, &[]).await;

        let first = f.list("alice", "public", "true").await;
        assert_eq!(first.len(), 1);
        assert!(f.cache.contains("docs:alice:public:true"));

        // written behind the service's back, so invisible until invalidation
        let mut hidden = first[0].clone();
        hidden.id = Uuid::new_v4();
        f.store.create(&hidden).await.unwrap();

        assert_eq!(f.list("alice", "public", "true").await, first);
    }

    #[tokio::test]
    async fn test_filter_requires_both_key_and_value() {
        let f = fixture();
        f.upload_file("a.txt", false, &[]).await;

        assert_eq!(f.list("alice", "name", "").await.len(), 1);
        assert!(f.list("alice", "bogus", "x").await.is_empty());
    }

    #[tokio::test]
    async fn test_get_document_caches_authorized_read() {
        let f = fixture();
        let doc = f.upload_file("a.txt", false, &["bob"]).await;

        assert_eq!(f.get(doc.id, "bob").await, Ok(doc.clone()));
        assert!(f.cache.contains(&CacheKey::document(doc.id, "bob")));
    }

    #[tokio::test]
    async fn test_forbidden_read_is_not_cached() {
        let f = fixture();
        let doc = f.upload_file("a.txt", false, &[]).await;

        assert_eq!(f.get(doc.id, "mallory").await, Err(ServiceError::Forbidden));
        assert!(f.cache.keys().is_empty());
    }

    #[tokio::test]
    async fn test_get_unknown_document() {
        let f = fixture();
        let result = f.get(Uuid::new_v4(), "alice").await;
        assert!(matches!(result, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_invalidates_document_and_listings() {
        let f = fixture();
        let doc = f.upload_file("a.txt", true, &[]).await;
        f.get(doc.id, "alice").await.unwrap();
        f.get(doc.id, "bob").await.unwrap();
        f.list("alice", "", "").await;
        assert_eq!(f.cache.keys().len(), 3);

        f.service.delete_document(&f.ctx, doc.id, "alice").await.unwrap();

        assert!(f.cache.keys().is_empty());
        assert!(f.store.is_empty());
    }

    #[tokio::test]
    async fn test_non_owner_delete_is_silent_noop() {
        let f = fixture();
        let doc = f.upload_file("a.txt", true, &["bob"]).await;

        f.service.delete_document(&f.ctx, doc.id, "bob").await.unwrap();
        assert!(f.store.exists(doc.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_expired_context_fails_before_store() {
        let f = fixture();
        let ctx = RequestContext::new().with_deadline(tokio::time::Instant::now());
        let meta = meta("a.txt", true, false, &[]);

        let result = f
            .service
            .upload(&ctx, &meta, b"x".to_vec(), String::new(), "alice")
            .await;

        assert_eq!(result, Err(ServiceError::Cancelled));
        assert!(f.store.is_empty());
    }

    #[test]
    fn test_filter_documents_delegates() {
        let f = fixture();
        assert!(f.service.filter_documents(&[], "name", "x").is_empty());
    }
}
