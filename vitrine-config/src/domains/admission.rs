//! Admission control configuration: rate limiting, idempotency, dedup

use crate::error::ConfigResult;
use crate::validation::{validate_positive, Validatable};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Admission configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdmissionConfig {
    /// Enable rate limiting
    #[serde(default = "super::utils::default_true")]
    pub rate_limit_enabled: bool,

    /// Requests per window for anonymous (IP-keyed) callers
    #[serde(default = "default_anonymous_limit")]
    pub anonymous_limit: u32,

    /// Requests per window for authenticated users
    #[serde(default = "default_user_limit")]
    pub user_limit: u32,

    /// Sliding window size
    #[serde(with = "super::utils::serde_duration", default = "default_window")]
    pub window: Duration,

    /// TTL for cached idempotency-key responses
    #[serde(with = "super::utils::serde_duration", default = "default_idempotency_ttl")]
    pub idempotency_ttl: Duration,

    /// How long a concurrent duplicate waits for the in-flight winner
    #[serde(with = "super::utils::serde_duration", default = "default_inflight_wait")]
    pub inflight_wait: Duration,

    /// Maximum number of tracked admission keys
    #[serde(default = "default_max_keys")]
    pub max_keys: usize,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            rate_limit_enabled: true,
            anonymous_limit: default_anonymous_limit(),
            user_limit: default_user_limit(),
            window: default_window(),
            idempotency_ttl: default_idempotency_ttl(),
            inflight_wait: default_inflight_wait(),
            max_keys: default_max_keys(),
        }
    }
}

impl Validatable for AdmissionConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_positive(self.anonymous_limit as i64, "anonymous_limit", self.domain_name())?;
        validate_positive(self.user_limit as i64, "user_limit", self.domain_name())?;
        validate_positive(self.max_keys as i64, "max_keys", self.domain_name())?;
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "admission"
    }
}

fn default_anonymous_limit() -> u32 {
    30
}

fn default_user_limit() -> u32 {
    120
}

fn default_window() -> Duration {
    Duration::from_secs(60)
}

fn default_idempotency_ttl() -> Duration {
    Duration::from_secs(24 * 60 * 60)
}

fn default_inflight_wait() -> Duration {
    Duration::from_secs(5)
}

fn default_max_keys() -> usize {
    10_000
}
