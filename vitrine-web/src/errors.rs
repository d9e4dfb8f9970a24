//! Web error type and envelope conversion
//!
//! Every error leaving the API is one of these variants, serialized as
//! `{"success": false, "error": <human>, "error_code": <machine>}` with the
//! HTTP status that the machine code maps to. Internal detail goes to the
//! operator log, never to the client.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use vitrine_api_types::ErrorCode;
use vitrine_interfaces::{BillingError, DatabaseError};

/// Result type for web operations
pub type WebResult<T> = Result<T, WebError>;

/// Web-facing error carrying a machine code and a human message
#[derive(Debug, Error)]
#[error("{message}")]
pub struct WebError {
    pub code: ErrorCode,
    pub message: String,
}

impl WebError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn missing_field(field: &str) -> Self {
        Self::new(ErrorCode::MissingField, format!("required field {field} is missing"))
    }

    pub fn invalid_field(field: &str, reason: impl std::fmt::Display) -> Self {
        Self::new(ErrorCode::InvalidField, format!("invalid {field}: {reason}"))
    }

    pub fn duplicate_key(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DuplicateKey, message)
    }

    pub fn tenant_not_found() -> Self {
        Self::new(ErrorCode::TenantNotFound, "tenant not found")
    }

    pub fn tenant_suspended() -> Self {
        Self::new(ErrorCode::TenantSuspended, "tenant is suspended")
    }

    pub fn tenant_provisioning() -> Self {
        Self::new(ErrorCode::TenantProvisioning, "tenant is still provisioning")
    }

    pub fn auth_required() -> Self {
        Self::new(ErrorCode::AuthRequired, "authentication required")
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    pub fn rate_limited() -> Self {
        Self::new(ErrorCode::RateLimited, "too many requests")
    }

    pub fn idempotency_conflict() -> Self {
        Self::new(
            ErrorCode::IdempotencyConflict,
            "idempotency key was already used with a different payload",
        )
    }

    pub fn invalid_signature() -> Self {
        Self::new(ErrorCode::InvalidSignature, "webhook signature verification failed")
    }

    pub fn internal(message: impl std::fmt::Display) -> Self {
        // Detail stays in the operator log
        error!(detail = %message, "internal server error");
        Self::new(ErrorCode::ServerError, "internal server error")
    }

    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.code.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let body = json!({
            "success": false,
            "error": self.message,
            "error_code": self.code.as_str(),
        });
        (self.status(), Json(body)).into_response()
    }
}

impl From<DatabaseError> for WebError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound { entity, .. } => {
                Self::new(ErrorCode::TenantNotFound, format!("{entity} not found"))
            }
            DatabaseError::Validation { message } => Self::new(ErrorCode::InvalidField, message),
            DatabaseError::Constraint { message } => Self::new(ErrorCode::DuplicateKey, message),
            DatabaseError::StateTransition { message } => Self::new(ErrorCode::StateTransitionForbidden, message),
            DatabaseError::Connection { message }
            | DatabaseError::Transaction { message }
            | DatabaseError::Internal { message } => Self::internal(message),
        }
    }
}

impl From<BillingError> for WebError {
    fn from(err: BillingError) -> Self {
        match err {
            BillingError::NotConfigured => {
                Self::new(ErrorCode::BillingNotConfigured, "billing provider is not configured")
            }
            BillingError::PriceNotConfigured { .. } | BillingError::InvalidPayload { .. } => {
                Self::new(ErrorCode::InvalidField, err.to_string())
            }
            BillingError::NoCustomer { .. } => Self::new(ErrorCode::InvalidField, err.to_string()),
            BillingError::InvalidSignature { .. } => Self::invalid_signature(),
            BillingError::Provider { message } => {
                error!(detail = %message, "billing provider error");
                Self::new(ErrorCode::BillingProviderError, "billing provider error")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_shape() {
        let err = WebError::tenant_not_found();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.code.as_str(), "TENANT_NOT_FOUND");
    }

    #[test]
    fn test_constraint_maps_to_duplicate_key() {
        let err: WebError = DatabaseError::Constraint {
            message: "code acme is already taken".to_string(),
        }
        .into();
        assert_eq!(err.code, ErrorCode::DuplicateKey);
        assert_eq!(err.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_internal_detail_not_leaked() {
        let err: WebError = DatabaseError::Internal {
            message: "connection pool exhausted at 10.0.0.3".to_string(),
        }
        .into();
        assert_eq!(err.message, "internal server error");
    }
}
