//! Database repository interfaces
//!
//! These traits define the contracts the storage layer satisfies and the
//! handlers consume. They deliberately speak in unified API types so that
//! nothing above the storage crate ever touches a SeaORM entity.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use vitrine_api_types::{
    ListResponse, PaginationInput, SubscriptionState, TenantPatch, TenantStatus, UnifiedAuditEntry,
    UnifiedPlan, UnifiedProvisioningJob, UnifiedSubscription, UnifiedTenant,
};

/// Common database error type
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Constraint violation: {message}")]
    Constraint { message: String },

    #[error("Connection error: {message}")]
    Connection { message: String },

    #[error("Transaction error: {message}")]
    Transaction { message: String },

    #[error("Forbidden state transition: {message}")]
    StateTransition { message: String },

    #[error("Internal database error: {message}")]
    Internal { message: String },
}

impl DatabaseError {
    pub fn not_found(entity: impl Into<String>, id: impl std::fmt::Display) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

/// Filter criteria for tenant list queries
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TenantFilters {
    pub active: Option<bool>,
    pub status: Option<TenantStatus>,
    /// Case-insensitive substring match against code, name, and domain
    pub search: Option<String>,
}

/// Input accepted by the signup flow and the admin create endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTenantInput {
    pub code: String,
    pub name: String,
    pub email: Option<String>,
    pub plan_code: String,
    pub billing_cycle: Option<String>,
    pub alternate_domains: Vec<String>,
}

/// Authoritative store for tenants
#[async_trait]
pub trait TenantRepository: Send + Sync {
    /// Create a tenant in `provisioning` with its default platform domain.
    /// Fails with `Constraint` when code or any domain already exists.
    async fn create(&self, input: CreateTenantInput, default_domain: String) -> Result<UnifiedTenant, DatabaseError>;

    async fn find_by_id(&self, id: i32) -> Result<Option<UnifiedTenant>, DatabaseError>;

    async fn find_by_uuid(&self, uuid: Uuid) -> Result<Option<UnifiedTenant>, DatabaseError>;

    async fn find_by_code(&self, code: &str) -> Result<Option<UnifiedTenant>, DatabaseError>;

    /// Lookup against primary and alternate domains; the caller normalizes
    async fn find_by_domain(&self, domain: &str) -> Result<Option<UnifiedTenant>, DatabaseError>;

    /// Tenant linked to the given host company
    async fn find_by_company(&self, company_id: i32) -> Result<Option<UnifiedTenant>, DatabaseError>;

    async fn list(
        &self,
        filters: TenantFilters,
        pagination: PaginationInput,
    ) -> Result<ListResponse<UnifiedTenant>, DatabaseError>;

    /// Apply a field patch. Uniqueness of any new domain or code is enforced
    /// here; status changes must already have passed the state machine guard.
    async fn update(&self, id: i32, patch: TenantPatch) -> Result<UnifiedTenant, DatabaseError>;

    /// Guarded status transition; fails with `StateTransition` when illegal
    async fn transition_status(&self, id: i32, to: TenantStatus) -> Result<UnifiedTenant, DatabaseError>;

    /// Link the tenant to its host company (set once by provisioning)
    async fn link_company(&self, id: i32, company_id: i32) -> Result<(), DatabaseError>;

    /// Idempotent creation of the tenant's host company, keyed by tenant id;
    /// returns the company id and links it to the tenant
    async fn ensure_company(&self, id: i32, name: &str, email: Option<&str>) -> Result<i32, DatabaseError>;

    /// Cache the provider customer id on the tenant
    async fn set_provider_customer(&self, id: i32, customer_id: &str) -> Result<(), DatabaseError>;

    /// Soft-delete: clears `active`, moves status to archived
    async fn archive(&self, id: i32) -> Result<UnifiedTenant, DatabaseError>;

    /// Idempotent lazy creation of the synthetic `admin-<company_id>` tenant
    /// used when the platform super-user has no tenant link
    async fn ensure_admin_tenant(&self, company_id: i32, default_domain: String) -> Result<UnifiedTenant, DatabaseError>;
}

/// Subscriptions attached to tenants
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    async fn create(&self, subscription: UnifiedSubscription) -> Result<UnifiedSubscription, DatabaseError>;

    async fn find_by_tenant(&self, tenant_id: i32) -> Result<Option<UnifiedSubscription>, DatabaseError>;

    async fn find_by_provider_subscription(
        &self,
        provider_subscription_id: &str,
    ) -> Result<Option<UnifiedSubscription>, DatabaseError>;

    async fn find_by_provider_customer(
        &self,
        provider_customer_id: &str,
    ) -> Result<Option<UnifiedSubscription>, DatabaseError>;

    /// Persist provider identifiers after checkout completion
    async fn attach_provider_ids(
        &self,
        id: i32,
        customer_id: &str,
        subscription_id: &str,
    ) -> Result<(), DatabaseError>;

    /// Guarded state write; `provider_updated_at` arbitration happens in the
    /// billing state machine, not here
    async fn set_state(
        &self,
        id: i32,
        state: SubscriptionState,
        provider_updated_at: Option<DateTime<Utc>>,
    ) -> Result<(), DatabaseError>;

    async fn set_next_billing_date(&self, id: i32, when: DateTime<Utc>) -> Result<(), DatabaseError>;
}

/// Globally shared plan catalog
#[async_trait]
pub trait PlanRepository: Send + Sync {
    async fn find_by_code(&self, code: &str) -> Result<Option<UnifiedPlan>, DatabaseError>;

    async fn list(&self) -> Result<Vec<UnifiedPlan>, DatabaseError>;
}

/// Durable provisioning job records
#[async_trait]
pub trait ProvisioningJobRepository: Send + Sync {
    /// Create a `queued` job for the tenant with the given step plan
    async fn create(&self, tenant_id: i32, steps: Vec<String>) -> Result<UnifiedProvisioningJob, DatabaseError>;

    async fn find_by_uuid(&self, uuid: Uuid) -> Result<Option<UnifiedProvisioningJob>, DatabaseError>;

    async fn find_by_tenant(&self, tenant_id: i32) -> Result<Option<UnifiedProvisioningJob>, DatabaseError>;

    /// Oldest queued jobs first
    async fn find_queued(&self, limit: u64) -> Result<Vec<UnifiedProvisioningJob>, DatabaseError>;

    /// Atomic `queued -> running` claim. Returns false when another worker
    /// already owns the job.
    async fn claim(&self, id: i32) -> Result<bool, DatabaseError>;

    /// Persist the human-readable step label before the step body runs
    async fn set_current_step(&self, id: i32, step: &str) -> Result<(), DatabaseError>;

    /// Commit boundary at the end of each step: progress and cursor together
    async fn commit_step(&self, id: i32, step_index: usize, progress: u8) -> Result<(), DatabaseError>;

    /// Terminal success
    async fn mark_succeeded(&self, id: i32) -> Result<(), DatabaseError>;

    /// Terminal failure with the recorded error blob
    async fn mark_failed(&self, id: i32, error: serde_json::Value) -> Result<(), DatabaseError>;

    /// Reset a failed job to `queued`, preserving the step cursor
    async fn retry(&self, id: i32) -> Result<UnifiedProvisioningJob, DatabaseError>;
}

/// Append-only audit log
#[async_trait]
pub trait AuditRepository: Send + Sync {
    async fn append(&self, entry: UnifiedAuditEntry) -> Result<(), DatabaseError>;

    async fn list_for_tenant(
        &self,
        tenant_id: i32,
        pagination: PaginationInput,
    ) -> Result<ListResponse<UnifiedAuditEntry>, DatabaseError>;
}

/// Tenant-owned catalog rows
///
/// The catalog data model belongs to the storefront; the core touches it
/// only to seed defaults during provisioning and because product rows are
/// the canonical RLS-governed data used to verify isolation.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Seed the default demo products for a fresh tenant; safe to re-run
    async fn ensure_default_products(&self, tenant_uuid: Uuid) -> Result<u32, DatabaseError>;

    /// Product count visible for the tenant
    async fn count_for_tenant(&self, tenant_uuid: Uuid) -> Result<u64, DatabaseError>;

    /// Products visible for the tenant
    async fn list_for_tenant(&self, tenant_uuid: Uuid) -> Result<Vec<ProductSummary>, DatabaseError>;
}

/// Minimal product projection served by the storefront listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductSummary {
    pub name: String,
    pub price_cents: i64,
}

/// Dedup ledger backing webhook idempotency
#[async_trait]
pub trait WebhookEventRepository: Send + Sync {
    /// Record the event id; returns false when it was already present
    async fn record(&self, event_id: &str, event_type: &str) -> Result<bool, DatabaseError>;

    async fn seen(&self, event_id: &str) -> Result<bool, DatabaseError>;
}

/// Factory trait for handing repository instances to handlers
pub trait RepositoryFactory: Send + Sync {
    fn tenant_repository(&self) -> &dyn TenantRepository;

    fn subscription_repository(&self) -> &dyn SubscriptionRepository;

    fn plan_repository(&self) -> &dyn PlanRepository;

    fn job_repository(&self) -> &dyn ProvisioningJobRepository;

    fn audit_repository(&self) -> &dyn AuditRepository;

    fn webhook_event_repository(&self) -> &dyn WebhookEventRepository;

    fn catalog_repository(&self) -> &dyn CatalogRepository;
}

