//! Billing endpoint models

use serde::{Deserialize, Serialize};

/// Checkout start request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSessionRequest {
    pub tenant_code: Option<String>,
    pub plan: Option<String>,
    pub billing_cycle: Option<String>,
}

/// Self-service portal request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalSessionRequest {
    pub return_url: Option<String>,
}
