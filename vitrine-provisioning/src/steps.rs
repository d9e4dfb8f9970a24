//! Provisioning steps
//!
//! Every step is idempotent: sub-resources are created behind deterministic
//! keys (tenant id or uuid) and looked up before creation, so a resumed job
//! can safely re-enter any step.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::StepError;
use vitrine_api_types::{TenantPatch, TenantStatus, UnifiedProvisioningJob, UnifiedTenant};
use vitrine_interfaces::{BillingGateway, DatabaseError, RepositoryFactory};

/// Context handed to each step body
pub struct StepContext {
    pub tenant: UnifiedTenant,
    pub job: UnifiedProvisioningJob,
}

impl StepContext {
    pub fn tenant_id(&self) -> Result<i32, StepError> {
        self.tenant.id.as_i32().ok_or_else(|| {
            StepError::Database(DatabaseError::Internal {
                message: "tenant id is not a database id".to_string(),
            })
        })
    }
}

/// One unit of provisioning work
#[async_trait]
pub trait ProvisioningStep: Send + Sync {
    /// Stable name; jobs store the plan by these names
    fn name(&self) -> &'static str;

    async fn execute(&self, ctx: &StepContext) -> Result<(), StepError>;
}

/// The standard step set wired by the server
pub fn default_steps(
    repositories: Arc<dyn RepositoryFactory>,
    gateway: Option<Arc<dyn BillingGateway>>,
) -> Vec<Arc<dyn ProvisioningStep>> {
    vec![
        Arc::new(CreateCompanyStep {
            repositories: repositories.clone(),
        }),
        Arc::new(SeedBrandingStep {
            repositories: repositories.clone(),
        }),
        Arc::new(SeedCatalogDefaultsStep {
            repositories: repositories.clone(),
        }),
        Arc::new(ConfigurePaymentStep {
            repositories: repositories.clone(),
            gateway,
        }),
        Arc::new(ProvisionDomainsStep {
            repositories: repositories.clone(),
        }),
        Arc::new(FinalizeStep { repositories }),
    ]
}

/// Create the tenant's host company and link it
pub struct CreateCompanyStep {
    pub repositories: Arc<dyn RepositoryFactory>,
}

#[async_trait]
impl ProvisioningStep for CreateCompanyStep {
    fn name(&self) -> &'static str {
        "create-company"
    }

    async fn execute(&self, ctx: &StepContext) -> Result<(), StepError> {
        let company_id = self
            .repositories
            .tenant_repository()
            .ensure_company(ctx.tenant_id()?, &ctx.tenant.name, ctx.tenant.email.as_deref())
            .await?;
        debug!(tenant = %ctx.tenant.code, company_id, "host company ensured");
        Ok(())
    }
}

/// Apply default branding where the signup left fields empty
pub struct SeedBrandingStep {
    pub repositories: Arc<dyn RepositoryFactory>,
}

#[async_trait]
impl ProvisioningStep for SeedBrandingStep {
    fn name(&self) -> &'static str {
        "seed-branding"
    }

    async fn execute(&self, ctx: &StepContext) -> Result<(), StepError> {
        if ctx.tenant.primary_color.is_some() {
            // Signup already carried branding
            return Ok(());
        }
        let patch = TenantPatch {
            primary_color: Some("#1a1a2e".to_string()),
            ..Default::default()
        };
        self.repositories
            .tenant_repository()
            .update(ctx.tenant_id()?, patch)
            .await?;
        Ok(())
    }
}

/// Seed the demo catalog rows for a fresh store
pub struct SeedCatalogDefaultsStep {
    pub repositories: Arc<dyn RepositoryFactory>,
}

#[async_trait]
impl ProvisioningStep for SeedCatalogDefaultsStep {
    fn name(&self) -> &'static str {
        "seed-catalog-defaults"
    }

    async fn execute(&self, ctx: &StepContext) -> Result<(), StepError> {
        let seeded = self
            .repositories
            .catalog_repository()
            .ensure_default_products(ctx.tenant.uuid)
            .await?;
        debug!(tenant = %ctx.tenant.code, seeded, "catalog defaults ensured");
        Ok(())
    }
}

/// Register the tenant with the billing provider when credentials exist.
/// Checkout still works without this step; the customer would then be
/// created lazily on the first checkout call.
pub struct ConfigurePaymentStep {
    pub repositories: Arc<dyn RepositoryFactory>,
    pub gateway: Option<Arc<dyn BillingGateway>>,
}

#[async_trait]
impl ProvisioningStep for ConfigurePaymentStep {
    fn name(&self) -> &'static str {
        "configure-payment"
    }

    async fn execute(&self, ctx: &StepContext) -> Result<(), StepError> {
        let Some(gateway) = &self.gateway else {
            info!(tenant = %ctx.tenant.code, "billing not configured, skipping payment setup");
            return Ok(());
        };
        if ctx.tenant.provider_customer_id.is_some() {
            return Ok(());
        }
        let email = ctx.tenant.email.as_deref().unwrap_or("");
        let customer_id = gateway.create_customer(email, &ctx.tenant.code).await?;
        self.repositories
            .tenant_repository()
            .set_provider_customer(ctx.tenant_id()?, &customer_id)
            .await?;
        Ok(())
    }
}

/// Confirm the tenant's domains resolve back to it in the registry
pub struct ProvisionDomainsStep {
    pub repositories: Arc<dyn RepositoryFactory>,
}

#[async_trait]
impl ProvisioningStep for ProvisionDomainsStep {
    fn name(&self) -> &'static str {
        "provision-domains"
    }

    async fn execute(&self, ctx: &StepContext) -> Result<(), StepError> {
        let resolved = self
            .repositories
            .tenant_repository()
            .find_by_domain(&ctx.tenant.domain)
            .await?;
        match resolved {
            Some(found) if found.uuid == ctx.tenant.uuid => Ok(()),
            Some(found) => Err(StepError::invariant(format!(
                "domain {} resolves to tenant {} instead of {}",
                ctx.tenant.domain, found.code, ctx.tenant.code
            ))),
            None => Err(StepError::invariant(format!(
                "domain {} does not resolve",
                ctx.tenant.domain
            ))),
        }
    }
}

/// Activate the tenant unless billing already did
pub struct FinalizeStep {
    pub repositories: Arc<dyn RepositoryFactory>,
}

#[async_trait]
impl ProvisioningStep for FinalizeStep {
    fn name(&self) -> &'static str {
        "finalize"
    }

    async fn execute(&self, ctx: &StepContext) -> Result<(), StepError> {
        // Re-read: checkout completion may have activated the tenant while
        // earlier steps ran
        let tenant = self
            .repositories
            .tenant_repository()
            .find_by_id(ctx.tenant_id()?)
            .await?
            .ok_or_else(|| StepError::invariant("tenant disappeared during provisioning"))?;

        if tenant.status == TenantStatus::Provisioning {
            self.repositories
                .tenant_repository()
                .transition_status(ctx.tenant_id()?, TenantStatus::Active)
                .await?;
            info!(tenant = %tenant.code, "tenant activated by provisioning");
        }
        Ok(())
    }
}
