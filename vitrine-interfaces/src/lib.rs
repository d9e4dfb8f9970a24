//! # Vitrine Interfaces
//!
//! Core interfaces and traits shared across the Vitrine workspace.
//!
//! This crate is the neutral ground between the storage, billing, and web
//! layers: handlers and services depend on these traits rather than on
//! concrete implementations, which keeps the dependency graph acyclic and
//! makes every consumer testable with mock implementations.

pub mod admission;
pub mod billing;
pub mod database;

// Re-export commonly used types
pub use admission::{AdmissionStore, CachedResponse, IdempotencyRecord, RateLimitDecision};
pub use billing::{
    BillingError, BillingGateway, CheckoutSessionRequest, CheckoutSessionResponse, PortalSessionResponse,
};
pub use database::{
    AuditRepository, CatalogRepository, CreateTenantInput, DatabaseError, PlanRepository,
    ProvisioningJobRepository, RepositoryFactory, SubscriptionRepository, TenantFilters, TenantRepository,
    WebhookEventRepository,
};
