//! Platform-level settings

use crate::error::ConfigResult;
use crate::validation::{validate_required_string, Validatable};
use serde::{Deserialize, Serialize};

/// Platform configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    /// Suffix for auto-assigned tenant subdomains: `<code>.<suffix>`
    #[serde(default = "default_domain_suffix")]
    pub domain_suffix: String,

    /// Fallback tenant code for platform-scoped operations (`DEFAULT_TENANT`)
    #[serde(default = "default_tenant_code")]
    pub default_tenant: String,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            domain_suffix: default_domain_suffix(),
            default_tenant: default_tenant_code(),
        }
    }
}

impl PlatformConfig {
    /// Default platform domain for a tenant code
    pub fn default_domain_for(&self, code: &str) -> String {
        format!("{}.{}", code, self.domain_suffix)
    }
}

impl Validatable for PlatformConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_required_string(&self.domain_suffix, "domain_suffix", self.domain_name())?;
        validate_required_string(&self.default_tenant, "default_tenant", self.domain_name())?;
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "platform"
    }
}

fn default_domain_suffix() -> String {
    "shops.vitrine.dev".to_string()
}

fn default_tenant_code() -> String {
    "platform".to_string()
}
