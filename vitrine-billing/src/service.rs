//! Outbound billing operations
//!
//! Orchestrates the provider hand-off the UI needs: hosted checkout and the
//! self-service portal. State only changes here as a cache (the provider
//! customer id); everything authoritative arrives later through webhooks.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

use vitrine_api_types::BillingCycle;
use vitrine_config::BillingConfig;
use vitrine_interfaces::{
    BillingError, BillingGateway, CheckoutSessionRequest, CheckoutSessionResponse, DatabaseError,
    PortalSessionResponse, RepositoryFactory,
};

/// Errors surfaced by billing orchestration
#[derive(Debug, thiserror::Error)]
pub enum BillingServiceError {
    #[error("tenant not found: {code}")]
    TenantNotFound { code: String },

    #[error("plan not found: {code}")]
    PlanNotFound { code: String },

    #[error(transparent)]
    Billing(#[from] BillingError),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

pub struct BillingService {
    repositories: Arc<dyn RepositoryFactory>,
    gateway: Arc<dyn BillingGateway>,
    config: BillingConfig,
}

impl BillingService {
    pub fn new(repositories: Arc<dyn RepositoryFactory>, gateway: Arc<dyn BillingGateway>, config: BillingConfig) -> Self {
        Self {
            repositories,
            gateway,
            config,
        }
    }

    /// Start a hosted checkout for a tenant on `plan` × `cycle`.
    ///
    /// Resolves the external price id, gets or creates the provider customer
    /// (cached on the tenant), and returns the hosted checkout URL.
    pub async fn create_checkout_session(
        &self,
        tenant_code: &str,
        plan_code: &str,
        cycle: BillingCycle,
    ) -> Result<CheckoutSessionResponse, BillingServiceError> {
        if !self.config.is_configured() {
            return Err(BillingError::NotConfigured.into());
        }

        let tenant = self
            .repositories
            .tenant_repository()
            .find_by_code(tenant_code)
            .await?
            .ok_or_else(|| BillingServiceError::TenantNotFound {
                code: tenant_code.to_string(),
            })?;

        let plan = self
            .repositories
            .plan_repository()
            .find_by_code(plan_code)
            .await?
            .ok_or_else(|| BillingServiceError::PlanNotFound {
                code: plan_code.to_string(),
            })?;

        let price_id = plan.price_id(cycle).ok_or_else(|| BillingError::PriceNotConfigured {
            plan: plan_code.to_string(),
            cycle: cycle.to_string(),
        })?;

        let customer_id = match &tenant.provider_customer_id {
            Some(id) => id.clone(),
            None => {
                let email = tenant.email.as_deref().unwrap_or("");
                let id = self.gateway.create_customer(email, &tenant.code).await?;
                if let Some(tenant_id) = tenant.id.as_i32() {
                    self.repositories
                        .tenant_repository()
                        .set_provider_customer(tenant_id, &id)
                        .await?;
                }
                id
            }
        };

        let mut metadata = HashMap::new();
        metadata.insert("tenant_code".to_string(), tenant.code.clone());
        metadata.insert("plan_code".to_string(), plan.code.clone());
        metadata.insert("billing_cycle".to_string(), cycle.to_string());

        let session = self
            .gateway
            .create_checkout_session(CheckoutSessionRequest {
                customer_id,
                price_id: price_id.to_string(),
                trial_days: plan.trial_days,
                success_url: self.config.checkout_success_url.clone(),
                cancel_url: self.config.checkout_cancel_url.clone(),
                metadata,
            })
            .await?;

        info!(tenant = %tenant.code, plan = %plan.code, %cycle, session = %session.session_id, "checkout session created");
        Ok(session)
    }

    /// Open the self-service portal for a tenant with an existing customer
    pub async fn create_portal_session(
        &self,
        tenant_code: &str,
        return_url: &str,
    ) -> Result<PortalSessionResponse, BillingServiceError> {
        if !self.config.is_configured() {
            return Err(BillingError::NotConfigured.into());
        }

        let tenant = self
            .repositories
            .tenant_repository()
            .find_by_code(tenant_code)
            .await?
            .ok_or_else(|| BillingServiceError::TenantNotFound {
                code: tenant_code.to_string(),
            })?;

        let customer_id = tenant.provider_customer_id.as_deref().ok_or_else(|| BillingError::NoCustomer {
            tenant: tenant.code.clone(),
        })?;

        Ok(self.gateway.create_portal_session(customer_id, return_url).await?)
    }

    /// Publishable key for the frontend, when configured
    pub fn publishable_key(&self) -> Option<&str> {
        self.gateway.publishable_key()
    }
}
