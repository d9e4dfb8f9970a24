//! Service container
//!
//! One place where concrete implementations are chosen and shared: the
//! SeaORM repository factory, the Stripe gateway, the billing service and
//! webhook processor, the provisioning engine, and the middleware states.

use std::sync::Arc;
use std::time::Duration;

use vitrine_billing::{BillingService, StripeGateway, WebhookProcessor};
use vitrine_config::VitrineConfig;
use vitrine_interfaces::{BillingGateway, RepositoryFactory};
use vitrine_provisioning::{default_steps, ProvisioningEngine};
use vitrine_rest_api::{AppContext, BillingContext, OnboardingContext, StoreContext, TenantsContext};
use vitrine_storage::{DatabaseConnection, SeaOrmRepositoryFactory, StorageError};
use vitrine_web::{
    AdmissionState, AuditLogger, AuditState, AuthState, DomainCache, InMemoryAdmissionStore, JwtManager,
    TenantResolver,
};

const DOMAIN_CACHE_TTL: Duration = Duration::from_secs(30);

pub struct ServiceContainer {
    pub config: VitrineConfig,
    pub db: DatabaseConnection,
    pub repositories: Arc<dyn RepositoryFactory>,
    pub gateway: Arc<dyn BillingGateway>,
    pub billing_service: Arc<BillingService>,
    pub webhook_processor: Arc<WebhookProcessor>,
    pub engine: Arc<ProvisioningEngine>,
    pub domain_cache: Arc<DomainCache>,
}

impl ServiceContainer {
    pub async fn build(config: VitrineConfig) -> Result<Self, StorageError> {
        let db = DatabaseConnection::new(config.database.clone()).await?;
        if config.database.auto_migrate {
            db.migrate().await?;
        }

        let repositories: Arc<dyn RepositoryFactory> = Arc::new(SeaOrmRepositoryFactory::new(db.clone()));
        let gateway: Arc<dyn BillingGateway> = Arc::new(StripeGateway::new(config.billing.clone()));

        let billing_service = Arc::new(BillingService::new(
            repositories.clone(),
            gateway.clone(),
            config.billing.clone(),
        ));
        let webhook_processor = Arc::new(WebhookProcessor::new(repositories.clone()));

        let billing_gateway_for_steps = config.billing.is_configured().then(|| gateway.clone());
        let engine = Arc::new(ProvisioningEngine::new(
            repositories.clone(),
            default_steps(repositories.clone(), billing_gateway_for_steps),
            config.provisioning.clone(),
        ));

        Ok(Self {
            config,
            db,
            repositories,
            gateway,
            billing_service,
            webhook_processor,
            engine,
            domain_cache: Arc::new(DomainCache::new(DOMAIN_CACHE_TTL)),
        })
    }

    /// Wire the REST application context from the shared services
    pub fn app_context(&self) -> AppContext {
        let jwt = Arc::new(JwtManager::new(self.config.auth.clone()));
        let admission_state = AdmissionState::new(
            Arc::new(InMemoryAdmissionStore::new(self.config.admission.max_keys)),
            self.config.admission.clone(),
        );
        let tenant_resolver = TenantResolver::new(
            self.repositories.clone(),
            self.config.platform.clone(),
            self.config.auth.superuser_login.clone(),
            self.domain_cache.clone(),
        );

        AppContext {
            tenants: TenantsContext::new(
                self.repositories.clone(),
                self.config.platform.clone(),
                self.domain_cache.clone(),
                self.config.auth.superuser_login.clone(),
            ),
            onboarding: OnboardingContext::new(self.repositories.clone(), self.config.platform.clone()),
            billing: BillingContext {
                repositories: self.repositories.clone(),
                service: self.billing_service.clone(),
                processor: self.webhook_processor.clone(),
                webhook_secret: self.config.billing.webhook_secret.clone(),
            },
            store: StoreContext {
                repositories: self.repositories.clone(),
            },
            auth_state: AuthState { jwt },
            admission_state,
            audit_state: AuditState {
                logger: Arc::new(AuditLogger::new(Some(self.repositories.clone()))),
            },
            tenant_resolver,
            cors: self.config.server.cors.clone(),
        }
    }
}
