//! Domain-specific configuration modules

pub mod admission;
pub mod auth;
pub mod billing;
pub mod database;
pub mod logging;
pub mod platform;
pub mod provisioning;
pub mod server;
pub mod utils;

use crate::error::ConfigResult;
use crate::validation::Validatable;
use serde::{Deserialize, Serialize};

/// Main Vitrine configuration combining all domains
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct VitrineConfig {
    /// HTTP server configuration
    #[serde(default)]
    pub server: server::ServerConfig,

    /// Database configuration
    #[serde(default)]
    pub database: database::DatabaseConfig,

    /// Authentication configuration
    #[serde(default)]
    pub auth: auth::AuthConfig,

    /// Billing provider configuration
    #[serde(default)]
    pub billing: billing::BillingConfig,

    /// Platform-level settings (domain suffix, fallback tenant)
    #[serde(default)]
    pub platform: platform::PlatformConfig,

    /// Admission control: rate limits, idempotency, dedup
    #[serde(default)]
    pub admission: admission::AdmissionConfig,

    /// Provisioning worker configuration
    #[serde(default)]
    pub provisioning: provisioning::ProvisioningConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: logging::LoggingConfig,
}

impl VitrineConfig {
    /// Validate all domain configurations
    pub fn validate_all(&self) -> ConfigResult<()> {
        self.server.validate()?;
        self.database.validate()?;
        self.auth.validate()?;
        self.billing.validate()?;
        self.platform.validate()?;
        self.admission.validate()?;
        self.provisioning.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}
