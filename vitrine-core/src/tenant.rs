//! Tenant status state machine
//!
//! The transition table is authoritative; the storage layer refuses any
//! status write that this module does not allow.

use crate::error::{CoreError, CoreResult};
use vitrine_api_types::TenantStatus;

/// Whether `from -> to` is a legal tenant status transition.
///
/// ```text
/// provisioning -> active     (job success or checkout completion)
/// active       -> suspended  (past_due after grace, or admin)
/// suspended    -> active     (payment success)
/// any          -> archived   (admin archive / force-archive)
/// ```
pub fn tenant_transition_allowed(from: TenantStatus, to: TenantStatus) -> bool {
    use TenantStatus::*;
    match (from, to) {
        (Provisioning, Active) => true,
        (Active, Suspended) => true,
        (Suspended, Active) => true,
        (_, Archived) => true,
        _ => false,
    }
}

/// Guarded transition: identity transitions are rejected too, so callers
/// cannot mask a no-op as a state change.
pub fn check_tenant_transition(from: TenantStatus, to: TenantStatus) -> CoreResult<()> {
    if from == to || !tenant_transition_allowed(from, to) {
        return Err(CoreError::TenantTransition { from, to });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use TenantStatus::*;

    #[test]
    fn test_happy_path_transitions() {
        assert!(tenant_transition_allowed(Provisioning, Active));
        assert!(tenant_transition_allowed(Active, Suspended));
        assert!(tenant_transition_allowed(Suspended, Active));
    }

    #[test]
    fn test_archive_from_anywhere() {
        for from in [Provisioning, Active, Suspended] {
            assert!(tenant_transition_allowed(from, Archived));
        }
    }

    #[test]
    fn test_forbidden_transitions() {
        assert!(!tenant_transition_allowed(Archived, Active));
        assert!(!tenant_transition_allowed(Provisioning, Suspended));
        assert!(!tenant_transition_allowed(Suspended, Provisioning));
        assert!(!tenant_transition_allowed(Active, Provisioning));
    }

    #[test]
    fn test_identity_transition_rejected() {
        assert!(check_tenant_transition(Active, Active).is_err());
    }
}
