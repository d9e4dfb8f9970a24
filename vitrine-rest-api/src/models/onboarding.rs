//! Onboarding endpoint models

use serde::{Deserialize, Serialize};

/// Slug availability check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckSlugRequest {
    pub slug: String,
}

/// Async signup request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTenantAsyncRequest {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub email: Option<String>,
    pub plan: Option<String>,
    #[serde(default)]
    pub billing_cycle: Option<String>,
    #[serde(default)]
    pub alternate_domains: Vec<String>,
}
