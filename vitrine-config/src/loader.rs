//! Configuration loading and environment variable handling

use crate::domains::VitrineConfig;
use crate::error::{ConfigError, ConfigResult};
use std::path::Path;

/// Configuration loader with environment variable support
///
/// Well-known deployment variables (`DATABASE_URL`, `STRIPE_*`,
/// `DEFAULT_TENANT`, `PLATFORM_DOMAIN_SUFFIX`, `JWT_SECRET`,
/// `CORS_ALLOWED_ORIGINS`) are read unprefixed; everything else uses the
/// `VITRINE_` prefix.
pub struct ConfigLoader {
    prefix: String,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a new config loader with the default prefix
    pub fn new() -> Self {
        Self {
            prefix: "VITRINE".to_string(),
        }
    }

    /// Create a new config loader with a custom prefix
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into() }
    }

    /// Load configuration from a YAML file with environment overrides
    pub fn from_file(&self, path: impl AsRef<Path>) -> ConfigResult<VitrineConfig> {
        let content = std::fs::read_to_string(path)?;
        let mut config: VitrineConfig = serde_yaml::from_str(&content)?;
        self.apply_env_overrides(&mut config)?;
        config.validate_all()?;
        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env(&self) -> ConfigResult<VitrineConfig> {
        let mut config = VitrineConfig::default();
        self.apply_env_overrides(&mut config)?;
        config.validate_all()?;
        Ok(config)
    }

    /// Load configuration with fallback chain
    pub fn load(&self, config_path: Option<impl AsRef<Path>>) -> ConfigResult<VitrineConfig> {
        match config_path {
            Some(path) => self.from_file(path),
            None => self.from_env(),
        }
    }

    fn apply_env_overrides(&self, config: &mut VitrineConfig) -> ConfigResult<()> {
        if let Ok(bind) = self.get_env_var("BIND_ADDRESS") {
            config.server.bind_address = bind;
        }
        if let Ok(port) = self.get_env_var("PORT") {
            config.server.port = port
                .parse()
                .map_err(|e| ConfigError::EnvError(format!("Invalid {}_PORT: {}", self.prefix, e)))?;
        }
        if let Ok(origins) = std::env::var("CORS_ALLOWED_ORIGINS") {
            config.server.cors.allowed_origins = origins.split(',').map(|s| s.trim().to_string()).collect();
        }

        if let Ok(url) = std::env::var("DATABASE_URL") {
            config.database.url = url;
        }

        if let Ok(secret) = std::env::var("JWT_SECRET") {
            config.auth.jwt_secret = secret;
        }

        if let Ok(key) = std::env::var("STRIPE_SECRET_KEY") {
            config.billing.secret_key = Some(key);
        }
        if let Ok(key) = std::env::var("STRIPE_PUBLISHABLE_KEY") {
            config.billing.publishable_key = Some(key);
        }
        if let Ok(secret) = std::env::var("STRIPE_WEBHOOK_SECRET") {
            config.billing.webhook_secret = Some(secret);
        }

        if let Ok(suffix) = std::env::var("PLATFORM_DOMAIN_SUFFIX") {
            config.platform.domain_suffix = suffix;
        }
        if let Ok(code) = std::env::var("DEFAULT_TENANT") {
            config.platform.default_tenant = code;
        }

        if let Ok(level) = self.get_env_var("LOG_LEVEL") {
            config.logging.level = level;
        }

        Ok(())
    }

    fn get_env_var(&self, name: &str) -> Result<String, std::env::VarError> {
        std::env::var(format!("{}_{}", self.prefix, name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_load() {
        let config = VitrineConfig::default();
        assert!(config.validate_all().is_ok());
        assert!(!config.billing.is_configured());
    }

    #[test]
    fn test_from_yaml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "server:\n  port: 9090\nplatform:\n  domain_suffix: shops.example.com\n"
        )
        .unwrap();

        let config = ConfigLoader::new().from_file(file.path()).unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.platform.default_domain_for("acme"), "acme.shops.example.com");
    }
}
