//! In-process admission store
//!
//! Bounded, TTL-aware shared state for the rate limiter, the idempotency
//! cache, and the in-flight dedup markers. Every caller treats this store
//! as best-effort: a miss or an evicted entry degrades to pass-through.

use async_trait::async_trait;
use chrono::Utc;
use lru::LruCache;
use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use vitrine_interfaces::{AdmissionStore, CachedResponse, IdempotencyRecord, RateLimitDecision};

struct RateWindow {
    hits: Vec<Instant>,
}

struct IdempotencyEntry {
    record: IdempotencyRecord,
    expires_at: Instant,
}

/// In-memory admission store with LRU-bounded keyspaces
pub struct InMemoryAdmissionStore {
    rates: Mutex<LruCache<String, RateWindow>>,
    idempotency: Mutex<LruCache<String, IdempotencyEntry>>,
    inflight: Mutex<HashSet<String>>,
}

impl InMemoryAdmissionStore {
    pub fn new(max_keys: usize) -> Self {
        let capacity = NonZeroUsize::new(max_keys.max(1)).expect("non-zero capacity");
        Self {
            rates: Mutex::new(LruCache::new(capacity)),
            idempotency: Mutex::new(LruCache::new(capacity)),
            inflight: Mutex::new(HashSet::new()),
        }
    }
}

impl Default for InMemoryAdmissionStore {
    fn default() -> Self {
        Self::new(10_000)
    }
}

#[async_trait]
impl AdmissionStore for InMemoryAdmissionStore {
    async fn check_rate(&self, key: &str, limit: u32, window: Duration) -> RateLimitDecision {
        let now = Instant::now();
        let mut rates = self.rates.lock().await;

        let entry = match rates.get_mut(key) {
            Some(entry) => entry,
            None => {
                rates.put(key.to_string(), RateWindow { hits: Vec::new() });
                rates.get_mut(key).expect("entry just inserted")
            }
        };

        entry.hits.retain(|hit| now.duration_since(*hit) < window);
        if entry.hits.len() >= limit as usize {
            let oldest = entry.hits.first().copied().unwrap_or(now);
            let retry_after = window.saturating_sub(now.duration_since(oldest));
            return RateLimitDecision::Limited {
                retry_after_secs: retry_after.as_secs().max(1),
            };
        }
        entry.hits.push(now);
        RateLimitDecision::Allowed
    }

    async fn claim_idempotency(
        &self,
        key: &str,
        fingerprint: &str,
        ttl: Duration,
    ) -> Option<IdempotencyRecord> {
        let now = Instant::now();
        let mut cache = self.idempotency.lock().await;

        if let Some(entry) = cache.get(key) {
            if entry.expires_at > now {
                return Some(entry.record.clone());
            }
        }

        cache.put(
            key.to_string(),
            IdempotencyEntry {
                record: IdempotencyRecord {
                    fingerprint: fingerprint.to_string(),
                    response: None,
                    created_at: Utc::now(),
                },
                expires_at: now + ttl,
            },
        );
        None
    }

    async fn complete_idempotency(&self, key: &str, response: CachedResponse) {
        let mut cache = self.idempotency.lock().await;
        if let Some(entry) = cache.get_mut(key) {
            entry.record.response = Some(response);
        }
    }

    async fn get_idempotency(&self, key: &str) -> Option<IdempotencyRecord> {
        let now = Instant::now();
        let mut cache = self.idempotency.lock().await;
        cache
            .get(key)
            .filter(|entry| entry.expires_at > now)
            .map(|entry| entry.record.clone())
    }

    async fn release_idempotency(&self, key: &str) {
        self.idempotency.lock().await.pop(key);
    }

    async fn begin_inflight(&self, fingerprint: &str) -> bool {
        self.inflight.lock().await.insert(fingerprint.to_string())
    }

    async fn end_inflight(&self, fingerprint: &str) {
        self.inflight.lock().await.remove(fingerprint);
    }
}
