//! Context types for dependency injection in REST API handlers

use std::sync::Arc;

use vitrine_billing::{BillingService, WebhookProcessor};
use vitrine_config::PlatformConfig;
use vitrine_interfaces::RepositoryFactory;
use vitrine_web::middleware::tenant::DomainCache;

/// Context for tenant registry endpoints
#[derive(Clone)]
pub struct TenantsContext {
    pub repositories: Arc<dyn RepositoryFactory>,
    pub platform: PlatformConfig,
    /// Bumped on any domain mutation so the resolver drops stale lookups
    pub domain_cache: Arc<DomainCache>,
    /// Login of the platform super-user, for lazy admin-tenant creation
    pub superuser_login: String,
}

impl TenantsContext {
    pub fn new(
        repositories: Arc<dyn RepositoryFactory>,
        platform: PlatformConfig,
        domain_cache: Arc<DomainCache>,
        superuser_login: String,
    ) -> Self {
        Self {
            repositories,
            platform,
            domain_cache,
            superuser_login,
        }
    }
}

/// Context for onboarding endpoints
#[derive(Clone)]
pub struct OnboardingContext {
    pub repositories: Arc<dyn RepositoryFactory>,
    pub platform: PlatformConfig,
}

impl OnboardingContext {
    pub fn new(repositories: Arc<dyn RepositoryFactory>, platform: PlatformConfig) -> Self {
        Self { repositories, platform }
    }
}

/// Context for billing endpoints
#[derive(Clone)]
pub struct BillingContext {
    pub repositories: Arc<dyn RepositoryFactory>,
    pub service: Arc<BillingService>,
    pub processor: Arc<WebhookProcessor>,
    /// Webhook signing secret; absence is a loudly-logged deployment error
    pub webhook_secret: Option<String>,
}

/// Context for tenant-scoped storefront endpoints
#[derive(Clone)]
pub struct StoreContext {
    pub repositories: Arc<dyn RepositoryFactory>,
}
