//! Billing gateway interface
//!
//! The gateway abstracts the subscription provider's API surface the core
//! needs: customer management, hosted checkout, and the self-service portal.
//! The production implementation talks to Stripe; tests use a mock.

use async_trait::async_trait;
use std::collections::HashMap;

/// Errors surfaced by a billing gateway
#[derive(Debug, thiserror::Error)]
pub enum BillingError {
    /// Provider credentials are not configured in this deployment
    #[error("billing provider is not configured")]
    NotConfigured,

    /// The plan does not offer the requested billing cycle
    #[error("plan {plan} has no price for the {cycle} cycle")]
    PriceNotConfigured { plan: String, cycle: String },

    /// Tenant has no provider customer yet (portal requires one)
    #[error("tenant {tenant} has no billing customer")]
    NoCustomer { tenant: String },

    /// The provider rejected or failed the call
    #[error("billing provider error: {message}")]
    Provider { message: String },

    /// Webhook payload failed signature verification
    #[error("webhook signature verification failed: {message}")]
    InvalidSignature { message: String },

    /// Malformed or unparseable provider payload
    #[error("invalid provider payload: {message}")]
    InvalidPayload { message: String },
}

/// Request for a hosted checkout session
#[derive(Debug, Clone)]
pub struct CheckoutSessionRequest {
    pub customer_id: String,
    pub price_id: String,
    pub trial_days: u32,
    pub success_url: String,
    pub cancel_url: String,
    /// Carried back on webhook events: tenant_code, plan_code, billing_cycle
    pub metadata: HashMap<String, String>,
}

/// Hosted checkout session handle
#[derive(Debug, Clone)]
pub struct CheckoutSessionResponse {
    pub session_id: String,
    pub url: String,
}

/// Self-service portal session handle
#[derive(Debug, Clone)]
pub struct PortalSessionResponse {
    pub url: String,
}

/// Outbound operations against the subscription provider
#[async_trait]
pub trait BillingGateway: Send + Sync {
    /// Create a provider customer and return its id
    async fn create_customer(&self, email: &str, tenant_code: &str) -> Result<String, BillingError>;

    /// Create a subscription-mode checkout session
    async fn create_checkout_session(
        &self,
        request: CheckoutSessionRequest,
    ) -> Result<CheckoutSessionResponse, BillingError>;

    /// Open the self-service billing portal for an existing customer
    async fn create_portal_session(
        &self,
        customer_id: &str,
        return_url: &str,
    ) -> Result<PortalSessionResponse, BillingError>;

    /// Publishable key exposed to the frontend, when configured
    fn publishable_key(&self) -> Option<&str>;
}
