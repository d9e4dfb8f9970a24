//! Unified API types for the Vitrine REST API
//!
//! This crate provides consistent type definitions shared by the REST
//! handlers, the middleware stack, and the backing services, reducing
//! duplication and keeping the wire contract in one place.

pub mod domain;
pub mod enums;
pub mod errors;
pub mod ids;
pub mod pagination;

// Re-export main types for convenience
pub use domain::{
    FeatureFlags, JobStatusReport, TenantPatch, UnifiedAuditEntry, UnifiedPlan, UnifiedProvisioningJob,
    UnifiedSubscription, UnifiedTenant,
};
pub use enums::{BillingCycle, DeploymentTier, JobState, SubscriptionState, TenantStatus, UserRole};
pub use errors::ErrorCode;
pub use ids::ApiId;
pub use pagination::{ListResponse, PaginationInput, PaginationMeta};
