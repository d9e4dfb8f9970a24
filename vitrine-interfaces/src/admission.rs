//! Admission store interface
//!
//! Backing store for the rate limiter, the idempotency-key cache, and the
//! in-flight request dedup. The store is best-effort shared state: every
//! caller treats absence or failure as fail-open, never as a request error.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Outcome of a rate-limit check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allowed,
    /// Rejected; retry after the given number of seconds
    Limited { retry_after_secs: u64 },
}

/// Cached response for an idempotency key
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdempotencyRecord {
    /// Fingerprint of the request payload the key was first used with
    pub fingerprint: String,
    /// Completed response, absent while the first request is in flight
    pub response: Option<CachedResponse>,
    pub created_at: DateTime<Utc>,
}

/// A completed HTTP response small enough to replay
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedResponse {
    pub status: u16,
    pub body: Vec<u8>,
    pub content_type: String,
}

/// Shared admission state
///
/// Implementations must be safe under concurrent callers; the in-process
/// implementation lives in `vitrine-web`, and the trait leaves room for an
/// external key-value store.
#[async_trait]
pub trait AdmissionStore: Send + Sync {
    /// Count a hit on the sliding window `key` and decide
    async fn check_rate(&self, key: &str, limit: u32, window: Duration) -> RateLimitDecision;

    /// Atomically claim an idempotency key. Returns the existing record when
    /// the key is already claimed, `None` when this caller won the claim.
    async fn claim_idempotency(
        &self,
        key: &str,
        fingerprint: &str,
        ttl: Duration,
    ) -> Option<IdempotencyRecord>;

    /// Store the completed response for a claimed key
    async fn complete_idempotency(&self, key: &str, response: CachedResponse);

    /// Re-read a key, used while waiting for an in-flight winner
    async fn get_idempotency(&self, key: &str) -> Option<IdempotencyRecord>;

    /// Drop a claim whose handler failed, so a retry can re-execute
    async fn release_idempotency(&self, key: &str);

    /// Mark an argument fingerprint as in flight for request dedup.
    /// Returns false when an identical computation is already running.
    async fn begin_inflight(&self, fingerprint: &str) -> bool;

    /// Clear an in-flight marker
    async fn end_inflight(&self, fingerprint: &str);
}
