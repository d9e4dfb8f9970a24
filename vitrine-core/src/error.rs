//! Core domain errors

use vitrine_api_types::{SubscriptionState, TenantStatus};

/// Result type for core operations
pub type CoreResult<T> = Result<T, CoreError>;

/// Domain-level errors
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Required field missing: {field}")]
    MissingField { field: String },

    #[error("Invalid value for field {field}: {reason}")]
    InvalidField { field: String, reason: String },

    #[error("Forbidden tenant status transition: {from} -> {to}")]
    TenantTransition { from: TenantStatus, to: TenantStatus },

    #[error("Forbidden subscription state transition: {from} -> {to}")]
    SubscriptionTransition {
        from: SubscriptionState,
        to: SubscriptionState,
    },

    #[error("Unknown provider subscription status: {status}")]
    UnknownProviderStatus { status: String },
}
