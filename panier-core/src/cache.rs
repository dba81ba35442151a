//! Cache store seam and freshness policy.
//!
//! The store itself is external (a database table in production); this module
//! owns the policy around it: the 24h TTL with lazy deletion, the 20-item
//! usability threshold, volatile-field stripping and the merge cap. Store
//! errors never block discovery — they are logged and reported as a miss.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::collections::HashSet;
use thiserror::Error;

use crate::types::{CacheEntry, CandidateRecipe};

/// Entries older than this are never returned as fresh.
pub const CACHE_TTL_HOURS: i64 = 24;

/// Minimum item count for direct reuse without a fanout round.
pub const REUSE_THRESHOLD: usize = 20;

/// Hard cap on stored items per key; merge overflow is dropped from the tail.
pub const MAX_ITEMS_PER_KEY: usize = 200;

/// Injectable time source. Replaces ambient timers so TTL eviction stays
/// deterministic in tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Fixed time source for tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

#[derive(Error, Debug)]
#[error("cache store error: {0}")]
pub struct CacheStoreError(pub String);

/// Narrow seam over the external cache store.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>, CacheStoreError>;
    async fn put(&self, entry: CacheEntry) -> Result<(), CacheStoreError>;
    async fn delete(&self, key: &str) -> Result<(), CacheStoreError>;
}

/// Outcome of a policy-aware cache read.
#[derive(Debug)]
pub enum CacheOutcome {
    Miss,
    /// Fresh and large enough for direct reuse; the caller samples up to 20
    /// items and runs no search.
    Hit(Vec<CandidateRecipe>),
    /// Fresh but below the usability threshold; the caller merges these into
    /// a fanout round and writes the union back.
    Insufficient(Vec<CandidateRecipe>),
}

/// Read `key` applying the freshness and usability policy.
pub async fn lookup(store: &dyn CacheStore, clock: &dyn Clock, key: &str) -> CacheOutcome {
    let entry = match store.get(key).await {
        Ok(Some(entry)) => entry,
        Ok(None) => return CacheOutcome::Miss,
        Err(e) => {
            tracing::warn!(key, error = %e, "cache read failed, treating as miss");
            return CacheOutcome::Miss;
        }
    };

    let age = clock.now() - entry.updated_at;
    if age > Duration::hours(CACHE_TTL_HOURS) {
        tracing::debug!(key, "cache entry stale, deleting");
        if let Err(e) = store.delete(key).await {
            tracing::warn!(key, error = %e, "failed to delete stale cache entry");
        }
        return CacheOutcome::Miss;
    }

    if entry.items.len() >= REUSE_THRESHOLD {
        CacheOutcome::Hit(entry.items)
    } else if entry.items.is_empty() {
        CacheOutcome::Miss
    } else {
        CacheOutcome::Insufficient(entry.items)
    }
}

/// Write `items` under `key`, stripping volatile cost fields first.
///
/// With `merge`, the existing entry's items win on url collisions and the
/// result is capped at [`MAX_ITEMS_PER_KEY`]. Failures are logged only.
pub async fn write(
    store: &dyn CacheStore,
    clock: &dyn Clock,
    key: &str,
    items: Vec<CandidateRecipe>,
    merge: bool,
) {
    let mut stored: Vec<CandidateRecipe> = Vec::new();
    if merge {
        match store.get(key).await {
            Ok(Some(entry)) => stored = entry.items,
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(key, error = %e, "cache read during merge failed, writing fresh");
            }
        }
    }

    let mut seen: HashSet<String> = stored.iter().map(|i| i.url.clone()).collect();
    for item in items {
        if seen.insert(item.url.clone()) {
            stored.push(item.without_cost_fields());
        }
    }
    stored.truncate(MAX_ITEMS_PER_KEY);

    let entry = CacheEntry {
        key: key.to_string(),
        items: stored,
        updated_at: clock.now(),
    };
    if let Err(e) = store.put(entry).await {
        tracing::warn!(key, error = %e, "cache write failed");
    }
}

/// In-memory store, used in tests and single-process deployments.
#[derive(Default)]
pub struct MemoryCacheStore {
    entries: DashMap<String, CacheEntry>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>, CacheStoreError> {
        Ok(self.entries.get(key).map(|e| e.value().clone()))
    }

    async fn put(&self, entry: CacheEntry) -> Result<(), CacheStoreError> {
        self.entries.insert(entry.key.clone(), entry);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheStoreError> {
        self.entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingStore;

    #[async_trait]
    impl CacheStore for FailingStore {
        async fn get(&self, _key: &str) -> Result<Option<CacheEntry>, CacheStoreError> {
            Err(CacheStoreError("connection refused".to_string()))
        }

        async fn put(&self, _entry: CacheEntry) -> Result<(), CacheStoreError> {
            Err(CacheStoreError("connection refused".to_string()))
        }

        async fn delete(&self, _key: &str) -> Result<(), CacheStoreError> {
            Err(CacheStoreError("connection refused".to_string()))
        }
    }

    fn candidates(n: usize) -> Vec<CandidateRecipe> {
        (0..n)
            .map(|i| {
                CandidateRecipe::new(
                    format!("Recette {}", i),
                    format!("https://site.test/r/{}", i),
                    "Une recette",
                    "site.test",
                )
            })
            .collect()
    }

    fn now() -> DateTime<Utc> {
        "2026-03-01T12:00:00Z".parse().unwrap()
    }

    async fn seed(store: &MemoryCacheStore, key: &str, n: usize, updated_at: DateTime<Utc>) {
        store
            .put(CacheEntry {
                key: key.to_string(),
                items: candidates(n),
                updated_at,
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_absent_key_is_a_miss() {
        let store = MemoryCacheStore::new();
        let clock = FixedClock(now());
        assert!(matches!(
            lookup(&store, &clock, "k").await,
            CacheOutcome::Miss
        ));
    }

    #[tokio::test]
    async fn test_twenty_fresh_items_is_a_hit() {
        let store = MemoryCacheStore::new();
        let clock = FixedClock(now());
        seed(&store, "k", 20, now() - Duration::hours(1)).await;
        match lookup(&store, &clock, "k").await {
            CacheOutcome::Hit(items) => assert_eq!(items.len(), 20),
            other => panic!("expected hit, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_nineteen_fresh_items_is_insufficient() {
        let store = MemoryCacheStore::new();
        let clock = FixedClock(now());
        seed(&store, "k", 19, now() - Duration::hours(1)).await;
        match lookup(&store, &clock, "k").await {
            CacheOutcome::Insufficient(items) => assert_eq!(items.len(), 19),
            other => panic!("expected insufficient, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_stale_entry_is_deleted_and_missed_regardless_of_size() {
        let store = MemoryCacheStore::new();
        let clock = FixedClock(now());
        seed(&store, "k", 50, now() - Duration::hours(25)).await;
        assert!(matches!(
            lookup(&store, &clock, "k").await,
            CacheOutcome::Miss
        ));
        assert!(store.get("k").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_store_error_degrades_to_miss() {
        let clock = FixedClock(now());
        assert!(matches!(
            lookup(&FailingStore, &clock, "k").await,
            CacheOutcome::Miss
        ));
    }

    #[tokio::test]
    async fn test_write_strips_volatile_fields() {
        let store = MemoryCacheStore::new();
        let clock = FixedClock(now());
        let mut items = candidates(2);
        items[0].estimated_cost = Some(12.0);
        items[0].cost_source = Some(crate::types::CostSource::Rule);
        write(&store, &clock, "k", items, false).await;
        let entry = store.get("k").await.unwrap().unwrap();
        assert!(entry.items.iter().all(|i| i.estimated_cost.is_none()));
    }

    #[tokio::test]
    async fn test_merge_unions_by_url() {
        let store = MemoryCacheStore::new();
        let clock = FixedClock(now());
        write(&store, &clock, "k", candidates(5), false).await;
        // Overlapping urls 0..5 plus five new ones.
        write(&store, &clock, "k", candidates(10), true).await;
        let entry = store.get("k").await.unwrap().unwrap();
        assert_eq!(entry.items.len(), 10);
    }

    #[tokio::test]
    async fn test_merge_caps_entry_size() {
        let store = MemoryCacheStore::new();
        let clock = FixedClock(now());
        write(&store, &clock, "k", candidates(MAX_ITEMS_PER_KEY + 50), false).await;
        let entry = store.get("k").await.unwrap().unwrap();
        assert_eq!(entry.items.len(), MAX_ITEMS_PER_KEY);
    }
}
