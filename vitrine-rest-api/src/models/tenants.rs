//! Tenant endpoint models

use serde::{Deserialize, Serialize};

use vitrine_api_types::{PaginationInput, TenantStatus};
use vitrine_interfaces::database::CreateTenantInput;

/// Admin tenant creation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTenantRequest {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    pub plan_code: String,
    #[serde(default)]
    pub billing_cycle: Option<String>,
    #[serde(default)]
    pub alternate_domains: Vec<String>,
}

impl From<CreateTenantRequest> for CreateTenantInput {
    fn from(request: CreateTenantRequest) -> Self {
        CreateTenantInput {
            code: request.code,
            name: request.name,
            email: request.email,
            plan_code: request.plan_code,
            billing_cycle: request.billing_cycle,
            alternate_domains: request.alternate_domains,
        }
    }
}

/// Query parameters for tenant listing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ListTenantsQuery {
    pub active: Option<bool>,
    pub status: Option<TenantStatus>,
    pub search: Option<String>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

impl ListTenantsQuery {
    pub fn pagination(&self) -> PaginationInput {
        let defaults = PaginationInput::default();
        PaginationInput {
            page: self.page.unwrap_or(defaults.page).max(1),
            limit: self.limit.unwrap_or(defaults.limit).clamp(1, 100),
        }
    }
}
