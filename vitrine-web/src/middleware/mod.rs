pub mod audit;
pub mod auth;
pub mod cors;
pub mod dedup;
pub mod idempotency;
pub mod rate_limit;
pub mod request_id;
pub mod tenant;

pub use audit::{audit_middleware, AuditLogger, AuditState};
pub use auth::{auth_middleware, AuthContext, AuthState, JwtClaims, JwtManager};
pub use cors::cors_layer;
pub use dedup::dedup_middleware;
pub use idempotency::{idempotency_middleware, IDEMPOTENCY_KEY_HEADER};
pub use rate_limit::{rate_limit_middleware, AdmissionState};
pub use request_id::{request_id_middleware, RequestId, REQUEST_ID_HEADER};
pub use tenant::{
    tenant_middleware, DomainCache, TenantContext, TenantResolution, TenantResolver, TENANT_CODE_HEADER,
};
