//! # In-Memory Cache
//!
//! Process-local `DocumentCache` with per-entry TTL. Entries are stored
//! JSON-encoded, so a round trip through this cache behaves like one through
//! a networked cache.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::time::Instant;

use super::backend::DocumentCache;
use super::errors::{CacheError, CacheResult};
use super::keys::glob_match;
use crate::documents::Document;

#[derive(Debug)]
struct Entry {
    encoded: Vec<u8>,
    /// `None` when the TTL reaches past any representable instant
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| now < at)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryCache {
    entries: RwLock<HashMap<String, Entry>>,
}

fn poisoned() -> CacheError {
    CacheError::Backend("Lock poisoned".to_string())
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Live keys, sorted
    pub fn keys(&self) -> Vec<String> {
        let now = Instant::now();
        let mut keys: Vec<String> = self
            .entries
            .read()
            .map(|entries| {
                entries
                    .iter()
                    .filter(|(_, e)| e.is_live(now))
                    .map(|(k, _)| k.clone())
                    .collect()
            })
            .unwrap_or_default();
        keys.sort();
        keys
    }

    pub fn contains(&self, key: &str) -> bool {
        let now = Instant::now();
        self.entries
            .read()
            .map(|entries| entries.get(key).is_some_and(|e| e.is_live(now)))
            .unwrap_or(false)
    }

    /// Drop expired entries; returns how many were removed
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        match self.entries.write() {
            Ok(mut entries) => {
                let before = entries.len();
                entries.retain(|_, e| e.is_live(now));
                before - entries.len()
            }
            Err(_) => 0,
        }
    }

    fn put<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl: Duration) -> CacheResult<()> {
        let encoded = serde_json::to_vec(value)?;
        let now = Instant::now();

        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        entries.retain(|_, e| e.is_live(now));
        entries.insert(
            key.to_string(),
            Entry {
                encoded,
                expires_at: now.checked_add(ttl),
            },
        );
        Ok(())
    }

    fn fetch<T: DeserializeOwned>(&self, key: &str) -> CacheResult<Option<T>> {
        let now = Instant::now();
        let entries = self.entries.read().map_err(|_| poisoned())?;

        match entries.get(key) {
            Some(entry) if entry.is_live(now) => Ok(Some(serde_json::from_slice(&entry.encoded)?)),
            _ => Ok(None),
        }
    }
}

#[async_trait]
impl DocumentCache for InMemoryCache {
    async fn set_document(&self, key: &str, doc: &Document, ttl: Duration) -> CacheResult<()> {
        self.put(key, doc, ttl)
    }

    async fn get_document(&self, key: &str) -> CacheResult<Option<Document>> {
        self.fetch(key)
    }

    async fn set_documents(&self, key: &str, docs: &[Document], ttl: Duration) -> CacheResult<()> {
        self.put(key, docs, ttl)
    }

    async fn get_documents(&self, key: &str) -> CacheResult<Option<Vec<Document>>> {
        self.fetch(key)
    }

    async fn delete(&self, key: &str) -> CacheResult<bool> {
        let now = Instant::now();
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        Ok(entries.remove(key).is_some_and(|e| e.is_live(now)))
    }

    async fn delete_pattern(&self, pattern: &str) -> CacheResult<usize> {
        let now = Instant::now();
        let mut entries = self.entries.write().map_err(|_| poisoned())?;

        let matching: Vec<String> = entries
            .keys()
            .filter(|k| glob_match(pattern, k))
            .cloned()
            .collect();

        let mut removed = 0;
        for key in matching {
            if entries.remove(&key).is_some_and(|e| e.is_live(now)) {
                removed += 1;
            }
        }
        Ok(removed)
    }
}
