//! Provisioning worker configuration

use crate::error::ConfigResult;
use crate::validation::{validate_positive, Validatable};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Provisioning worker configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvisioningConfig {
    /// Enable the background worker
    #[serde(default = "super::utils::default_true")]
    pub enabled: bool,

    /// Poll interval for queued jobs
    #[serde(with = "super::utils::serde_duration", default = "default_poll_interval")]
    pub poll_interval: Duration,

    /// Maximum number of jobs claimed per poll
    #[serde(default = "default_batch_size")]
    pub batch_size: u64,
}

impl Default for ProvisioningConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            poll_interval: default_poll_interval(),
            batch_size: default_batch_size(),
        }
    }
}

impl Validatable for ProvisioningConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_positive(self.batch_size as i64, "batch_size", self.domain_name())?;
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "provisioning"
    }
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(2)
}

fn default_batch_size() -> u64 {
    5
}
