//! Billing provider configuration
//!
//! Credentials are optional: a deployment without them serves
//! `BILLING_NOT_CONFIGURED` on billing calls instead of failing startup.
//! A configured secret key without a webhook secret is a deployment error
//! surfaced loudly at startup, not a supported mode.

use crate::error::ConfigResult;
use crate::validation::{validate_url, Validatable};
use serde::{Deserialize, Serialize};

/// Stripe billing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BillingConfig {
    /// Secret API key (`STRIPE_SECRET_KEY`)
    pub secret_key: Option<String>,

    /// Publishable key served to the frontend (`STRIPE_PUBLISHABLE_KEY`)
    pub publishable_key: Option<String>,

    /// Webhook signing secret (`STRIPE_WEBHOOK_SECRET`)
    pub webhook_secret: Option<String>,

    /// Base URL of the provider API
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Checkout redirect on success
    #[serde(default = "default_success_url")]
    pub checkout_success_url: String,

    /// Checkout redirect on cancel
    #[serde(default = "default_cancel_url")]
    pub checkout_cancel_url: String,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            secret_key: None,
            publishable_key: None,
            webhook_secret: None,
            api_base: default_api_base(),
            checkout_success_url: default_success_url(),
            checkout_cancel_url: default_cancel_url(),
        }
    }
}

impl BillingConfig {
    pub fn is_configured(&self) -> bool {
        self.secret_key.is_some()
    }

    /// Configured for outbound calls but unable to verify webhooks
    pub fn webhook_secret_missing(&self) -> bool {
        self.is_configured() && self.webhook_secret.is_none()
    }
}

impl Validatable for BillingConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_url(&self.api_base, "api_base", self.domain_name())?;
        validate_url(&self.checkout_success_url, "checkout_success_url", self.domain_name())?;
        validate_url(&self.checkout_cancel_url, "checkout_cancel_url", self.domain_name())?;
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "billing"
    }
}

fn default_api_base() -> String {
    "https://api.stripe.com/v1".to_string()
}

fn default_success_url() -> String {
    "http://localhost:3000/onboarding/success".to_string()
}

fn default_cancel_url() -> String {
    "http://localhost:3000/onboarding/cancelled".to_string()
}
