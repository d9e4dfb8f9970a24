//! Request and response models for the REST API

pub mod billing;
pub mod onboarding;
pub mod tenants;

pub use billing::{CheckoutSessionRequest, PortalSessionRequest};
pub use onboarding::{CheckSlugRequest, CreateTenantAsyncRequest};
pub use tenants::{CreateTenantRequest, ListTenantsQuery};
