//! # Vitrine Web
//!
//! Reusable web middleware and utilities for the Vitrine APIs: the error
//! envelope, the fixed pre-dispatch pipeline (request id, auth, tenant
//! resolution, status gate, admission), audit emission, and the in-process
//! admission store.

pub mod admission;
pub mod errors;
pub mod extractors;
pub mod middleware;
pub mod utils;

// Re-export commonly used types
pub use admission::InMemoryAdmissionStore;
pub use errors::{WebError, WebResult};
pub use middleware::audit::{audit_middleware, AuditLogger, AuditState};
pub use middleware::auth::{auth_middleware, AuthContext, AuthState, JwtClaims, JwtManager};
pub use middleware::cors::cors_layer;
pub use middleware::dedup::dedup_middleware;
pub use middleware::idempotency::{idempotency_middleware, IDEMPOTENCY_KEY_HEADER};
pub use middleware::rate_limit::{rate_limit_middleware, AdmissionState};
pub use middleware::request_id::{request_id_middleware, RequestId, REQUEST_ID_HEADER};
pub use middleware::tenant::{
    tenant_middleware, DomainCache, TenantContext, TenantResolution, TenantResolver, TENANT_CODE_HEADER,
};
pub use utils::response::ApiResponse;
