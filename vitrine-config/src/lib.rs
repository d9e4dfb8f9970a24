//! Domain-driven configuration management for Vitrine
//!
//! Configuration is split by functional domain, with defaults, YAML loading,
//! environment variable overrides, and validation.

pub mod error;
pub mod loader;
pub mod validation;

// Domain-specific configuration modules
pub mod domains;

// Re-export main types
pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;

// Re-export domain configurations
pub use domains::{
    admission::AdmissionConfig, auth::AuthConfig, billing::BillingConfig, database::DatabaseConfig,
    logging::LoggingConfig, platform::PlatformConfig, provisioning::ProvisioningConfig, server::ServerConfig,
    VitrineConfig,
};
