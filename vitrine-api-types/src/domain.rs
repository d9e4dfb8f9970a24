use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::enums::*;
use crate::ids::ApiId;

/// Unified Tenant representation
///
/// The serialized form of this struct is the stable tenant JSON contract
/// consumed by edge middleware and the storefront frontend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnifiedTenant {
    pub id: ApiId,
    pub uuid: Uuid,
    pub code: String,
    pub name: String,
    pub domain: String,
    pub alternate_domains: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backoffice_domain: Option<String>,
    pub primary_color: Option<String>,
    pub logo_url: Option<String>,
    pub favicon_url: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub feature_flags: FeatureFlags,
    pub plan_code: Option<String>,
    pub status: TenantStatus,
    pub active: bool,
    pub deployment_tier: DeploymentTier,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_customer_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Storefront feature toggles carried on the tenant record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureFlags {
    pub wishlist: bool,
    pub comparison: bool,
    pub reviews: bool,
    pub guest_checkout: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            wishlist: true,
            comparison: true,
            reviews: true,
            guest_checkout: true,
        }
    }
}

/// Unified Subscription representation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnifiedSubscription {
    pub id: ApiId,
    pub uuid: Uuid,
    pub tenant_id: ApiId,
    pub plan_code: String,
    pub billing_cycle: BillingCycle,
    pub state: SubscriptionState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_customer_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_subscription_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_billing_date: Option<DateTime<Utc>>,
    /// Provider-side `updated_at` of the last event applied; stale events lose
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_updated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Unified Plan representation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnifiedPlan {
    pub id: ApiId,
    pub code: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_price_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yearly_price_id: Option<String>,
    pub trial_days: u32,
}

impl UnifiedPlan {
    /// External price id for a billing cycle, if the cycle is offered
    pub fn price_id(&self, cycle: BillingCycle) -> Option<&str> {
        match cycle {
            BillingCycle::Monthly => self.monthly_price_id.as_deref(),
            BillingCycle::Yearly => self.yearly_price_id.as_deref(),
        }
    }
}

/// Unified provisioning job representation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnifiedProvisioningJob {
    pub id: ApiId,
    pub uuid: Uuid,
    pub tenant_id: ApiId,
    pub state: JobState,
    pub progress: u8,
    pub current_step: String,
    pub step_index: usize,
    pub steps: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UnifiedProvisioningJob {
    /// The polling payload served by the onboarding status endpoint
    pub fn status_report(&self) -> JobStatusReport {
        JobStatusReport {
            id: ApiId::from_uuid(self.uuid),
            state: self.state,
            progress: self.progress,
            current_step: self.current_step.clone(),
            step_index: self.step_index,
            n_steps: self.steps.len(),
            error: self.error.clone(),
        }
    }
}

/// Job status JSON served to the onboarding UI
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatusReport {
    pub id: ApiId,
    pub state: JobState,
    pub progress: u8,
    pub current_step: String,
    pub step_index: usize,
    pub n_steps: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<serde_json::Value>,
}

/// Unified audit entry representation (append-only)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnifiedAuditEntry {
    pub timestamp: DateTime<Utc>,
    pub actor_id: Option<i32>,
    pub actor_login: String,
    pub tenant_id: Option<ApiId>,
    pub action: String,
    pub resource_type: String,
    pub resource_id: Option<String>,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub success: bool,
    pub details: serde_json::Value,
    pub request_id: String,
}

/// Partial tenant update
///
/// All fields optional; which of them a caller may set is decided by the
/// registry based on the caller's role, not by this struct.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TenantPatch {
    pub name: Option<String>,
    pub primary_color: Option<String>,
    pub logo_url: Option<String>,
    pub favicon_url: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub feature_flags: Option<FeatureFlags>,
    // Protected fields; platform admins only
    pub code: Option<String>,
    pub domain: Option<String>,
    pub alternate_domains: Option<Vec<String>>,
    pub backoffice_domain: Option<String>,
    pub company_id: Option<i32>,
    pub active: Option<bool>,
    pub plan_code: Option<String>,
    pub status: Option<TenantStatus>,
}

impl TenantPatch {
    /// Names of the protected fields present in this patch
    pub fn protected_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.code.is_some() {
            fields.push("code");
        }
        if self.domain.is_some() {
            fields.push("domain");
        }
        if self.alternate_domains.is_some() {
            fields.push("alternate_domains");
        }
        if self.backoffice_domain.is_some() {
            fields.push("backoffice_domain");
        }
        if self.company_id.is_some() {
            fields.push("company_id");
        }
        if self.active.is_some() {
            fields.push("active");
        }
        if self.plan_code.is_some() {
            fields.push("plan_code");
        }
        if self.status.is_some() {
            fields.push("status");
        }
        fields
    }

    /// Whether this patch touches any tenant domain, for resolver cache invalidation
    pub fn touches_domains(&self) -> bool {
        self.domain.is_some() || self.alternate_domains.is_some() || self.backoffice_domain.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_price_id_per_cycle() {
        let plan = UnifiedPlan {
            id: ApiId::from_i32(1),
            code: "starter".into(),
            name: "Starter".into(),
            monthly_price_id: Some("price_month".into()),
            yearly_price_id: None,
            trial_days: 14,
        };
        assert_eq!(plan.price_id(BillingCycle::Monthly), Some("price_month"));
        assert_eq!(plan.price_id(BillingCycle::Yearly), None);
    }

    #[test]
    fn test_patch_protected_fields() {
        let patch = TenantPatch {
            name: Some("New Name".into()),
            status: Some(TenantStatus::Active),
            ..Default::default()
        };
        assert_eq!(patch.protected_fields(), vec!["status"]);
        assert!(!patch.touches_domains());
    }

    #[test]
    fn test_status_report_shape() {
        let job = UnifiedProvisioningJob {
            id: ApiId::from_i32(7),
            uuid: Uuid::new_v4(),
            tenant_id: ApiId::from_i32(3),
            state: JobState::Running,
            progress: 50,
            current_step: "configure-payment".into(),
            step_index: 3,
            steps: vec![
                "create-company".into(),
                "seed-branding".into(),
                "seed-catalog-defaults".into(),
                "configure-payment".into(),
                "provision-domains".into(),
                "finalize".into(),
            ],
            error: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let report = job.status_report();
        assert_eq!(report.n_steps, 6);
        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("error").is_none());
        assert_eq!(json["progress"], 50);
    }
}
