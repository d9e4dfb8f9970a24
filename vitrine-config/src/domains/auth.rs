//! Authentication configuration

use crate::error::ConfigResult;
use crate::validation::{validate_positive, validate_required_string, Validatable};
use serde::{Deserialize, Serialize};

/// JWT bearer authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// JWT secret for signing/verification
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,

    /// JWT issuer
    #[serde(default = "default_issuer")]
    pub issuer: String,

    /// JWT audience
    #[serde(default = "default_audience")]
    pub audience: String,

    /// Token expiration in hours
    #[serde(default = "default_expiry_hours")]
    pub token_expiry_hours: i64,

    /// Login of the platform super-user, used for lazy admin-tenant creation
    #[serde(default = "default_superuser_login")]
    pub superuser_login: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            issuer: default_issuer(),
            audience: default_audience(),
            token_expiry_hours: default_expiry_hours(),
            superuser_login: default_superuser_login(),
        }
    }
}

impl Validatable for AuthConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_required_string(&self.jwt_secret, "jwt_secret", self.domain_name())?;
        validate_positive(self.token_expiry_hours, "token_expiry_hours", self.domain_name())?;
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "auth"
    }
}

fn default_jwt_secret() -> String {
    "change-me-in-production".to_string()
}

fn default_issuer() -> String {
    "vitrine-api".to_string()
}

fn default_audience() -> String {
    "vitrine-clients".to_string()
}

fn default_expiry_hours() -> i64 {
    24
}

fn default_superuser_login() -> String {
    "platform-admin".to_string()
}
