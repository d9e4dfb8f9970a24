//! Machine-readable error codes for the API error envelope
//!
//! Every error returned by a core endpoint carries one of these codes in
//! `error_code`, alongside a human-readable `error` string. The HTTP status
//! is a pure function of the code.

use serde::{Deserialize, Serialize};

/// Machine error codes of the error envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    MissingField,
    InvalidField,
    DuplicateKey,
    TenantNotFound,
    TenantSuspended,
    TenantProvisioning,
    AuthRequired,
    Forbidden,
    RateLimited,
    IdempotencyConflict,
    BillingNotConfigured,
    BillingProviderError,
    InvalidSignature,
    StateTransitionForbidden,
    ServerError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::MissingField => "MISSING_FIELD",
            ErrorCode::InvalidField => "INVALID_FIELD",
            ErrorCode::DuplicateKey => "DUPLICATE_KEY",
            ErrorCode::TenantNotFound => "TENANT_NOT_FOUND",
            ErrorCode::TenantSuspended => "TENANT_SUSPENDED",
            ErrorCode::TenantProvisioning => "TENANT_PROVISIONING",
            ErrorCode::AuthRequired => "AUTH_REQUIRED",
            ErrorCode::Forbidden => "FORBIDDEN",
            ErrorCode::RateLimited => "RATE_LIMITED",
            ErrorCode::IdempotencyConflict => "IDEMPOTENCY_CONFLICT",
            ErrorCode::BillingNotConfigured => "BILLING_NOT_CONFIGURED",
            ErrorCode::BillingProviderError => "BILLING_PROVIDER_ERROR",
            ErrorCode::InvalidSignature => "INVALID_SIGNATURE",
            ErrorCode::StateTransitionForbidden => "STATE_TRANSITION_FORBIDDEN",
            ErrorCode::ServerError => "SERVER_ERROR",
        }
    }

    /// HTTP status this code maps to
    pub fn http_status(&self) -> u16 {
        match self {
            ErrorCode::MissingField | ErrorCode::InvalidField | ErrorCode::InvalidSignature => 400,
            ErrorCode::AuthRequired => 401,
            ErrorCode::TenantSuspended | ErrorCode::Forbidden => 403,
            ErrorCode::TenantNotFound => 404,
            ErrorCode::DuplicateKey
            | ErrorCode::TenantProvisioning
            | ErrorCode::IdempotencyConflict
            | ErrorCode::StateTransitionForbidden => 409,
            ErrorCode::RateLimited => 429,
            ErrorCode::ServerError => 500,
            ErrorCode::BillingProviderError => 502,
            ErrorCode::BillingNotConfigured => 503,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ErrorCode::TenantNotFound.http_status(), 404);
        assert_eq!(ErrorCode::DuplicateKey.http_status(), 409);
        assert_eq!(ErrorCode::RateLimited.http_status(), 429);
        assert_eq!(ErrorCode::BillingProviderError.http_status(), 502);
        assert_eq!(ErrorCode::BillingNotConfigured.http_status(), 503);
    }

    #[test]
    fn test_wire_format_is_screaming_snake() {
        assert_eq!(
            serde_json::to_string(&ErrorCode::StateTransitionForbidden).unwrap(),
            "\"STATE_TRANSITION_FORBIDDEN\""
        );
    }
}
