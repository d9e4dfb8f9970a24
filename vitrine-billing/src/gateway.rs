//! Stripe HTTP gateway
//!
//! Thin reqwest client over the provider's form-encoded API. Only the three
//! calls the core needs are implemented: customers, checkout sessions, and
//! billing portal sessions.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use vitrine_config::BillingConfig;
use vitrine_interfaces::{
    BillingError, BillingGateway, CheckoutSessionRequest, CheckoutSessionResponse, PortalSessionResponse,
};

/// Production billing gateway speaking to the Stripe API
#[derive(Clone)]
pub struct StripeGateway {
    client: Client,
    config: BillingConfig,
}

#[derive(Debug, Deserialize)]
struct CustomerPayload {
    id: String,
}

#[derive(Debug, Deserialize)]
struct CheckoutSessionPayload {
    id: String,
    url: String,
}

#[derive(Debug, Deserialize)]
struct PortalSessionPayload {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorPayload {
    error: ProviderErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorDetail {
    message: Option<String>,
}

impl StripeGateway {
    pub fn new(config: BillingConfig) -> Self {
        if config.webhook_secret_missing() {
            // Deployment error, surfaced once here and again per delivery
            warn!("STRIPE_WEBHOOK_SECRET is not configured; webhook deliveries will be processed UNVERIFIED");
        }
        Self {
            client: Client::new(),
            config,
        }
    }

    fn secret_key(&self) -> Result<&str, BillingError> {
        self.config.secret_key.as_deref().ok_or(BillingError::NotConfigured)
    }

    async fn post_form<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        params: &[(String, String)],
    ) -> Result<T, BillingError> {
        let url = format!("{}{}", self.config.api_base, path);
        debug!(%url, "billing provider call");

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.secret_key()?)
            .form(params)
            .send()
            .await
            .map_err(|e| BillingError::Provider {
                message: format!("request failed: {e}"),
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| BillingError::Provider {
            message: format!("failed to read response: {e}"),
        })?;

        if !status.is_success() {
            let message = serde_json::from_str::<ProviderErrorPayload>(&body)
                .ok()
                .and_then(|p| p.error.message)
                .unwrap_or_else(|| format!("provider returned {status}"));
            return Err(BillingError::Provider { message });
        }

        serde_json::from_str(&body).map_err(|e| BillingError::Provider {
            message: format!("unexpected provider payload: {e}"),
        })
    }
}

#[async_trait]
impl BillingGateway for StripeGateway {
    async fn create_customer(&self, email: &str, tenant_code: &str) -> Result<String, BillingError> {
        let params = vec![
            ("email".to_string(), email.to_string()),
            ("metadata[tenant_code]".to_string(), tenant_code.to_string()),
        ];
        let customer: CustomerPayload = self.post_form("/customers", &params).await?;
        Ok(customer.id)
    }

    async fn create_checkout_session(
        &self,
        request: CheckoutSessionRequest,
    ) -> Result<CheckoutSessionResponse, BillingError> {
        let mut params = vec![
            ("mode".to_string(), "subscription".to_string()),
            ("customer".to_string(), request.customer_id),
            ("line_items[0][price]".to_string(), request.price_id),
            ("line_items[0][quantity]".to_string(), "1".to_string()),
            ("success_url".to_string(), request.success_url),
            ("cancel_url".to_string(), request.cancel_url),
        ];
        if request.trial_days > 0 {
            params.push((
                "subscription_data[trial_period_days]".to_string(),
                request.trial_days.to_string(),
            ));
        }
        for (key, value) in &request.metadata {
            params.push((format!("metadata[{key}]"), value.clone()));
            params.push((format!("subscription_data[metadata][{key}]"), value.clone()));
        }

        let session: CheckoutSessionPayload = self.post_form("/checkout/sessions", &params).await?;
        Ok(CheckoutSessionResponse {
            session_id: session.id,
            url: session.url,
        })
    }

    async fn create_portal_session(
        &self,
        customer_id: &str,
        return_url: &str,
    ) -> Result<PortalSessionResponse, BillingError> {
        let params = vec![
            ("customer".to_string(), customer_id.to_string()),
            ("return_url".to_string(), return_url.to_string()),
        ];
        let session: PortalSessionPayload = self.post_form("/billing_portal/sessions", &params).await?;
        Ok(PortalSessionResponse { url: session.url })
    }

    fn publishable_key(&self) -> Option<&str> {
        self.config.publishable_key.as_deref()
    }
}
