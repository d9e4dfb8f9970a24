//! Subscription state machine and provider status mapping
//!
//! Webhooks arrive with no ordering contract, so the machine is
//! reconciliation-oriented: each handler writes a monotone final state and
//! stale provider events are arbitrated by the provider-side timestamp
//! before any of this runs.

use crate::error::{CoreError, CoreResult};
use vitrine_api_types::SubscriptionState;

/// Fixed provider status -> internal state table.
///
/// Unknown statuses are an error: the caller logs and acknowledges the event
/// without writing state.
pub fn map_provider_status(status: &str) -> CoreResult<SubscriptionState> {
    match status {
        "active" => Ok(SubscriptionState::Active),
        "trialing" => Ok(SubscriptionState::Trial),
        "past_due" => Ok(SubscriptionState::PastDue),
        "canceled" => Ok(SubscriptionState::Cancelled),
        "unpaid" => Ok(SubscriptionState::PastDue),
        other => Err(CoreError::UnknownProviderStatus {
            status: other.to_string(),
        }),
    }
}

/// Whether `from -> to` is a legal subscription transition.
///
/// `active -> trial` is the one downgrade that is never legal; a trialing
/// event for an already-active subscription is by definition stale.
pub fn subscription_transition_allowed(from: SubscriptionState, to: SubscriptionState) -> bool {
    use SubscriptionState::*;
    match (from, to) {
        (Active, Trial) => false,
        (Cancelled, Trial) => false,
        // Re-activation after cancellation happens via a fresh checkout
        (Cancelled, Active) => true,
        (Cancelled, PastDue) => false,
        _ => from != to,
    }
}

/// Guarded transition used by the billing machine before a state write
pub fn check_subscription_transition(from: SubscriptionState, to: SubscriptionState) -> CoreResult<()> {
    if !subscription_transition_allowed(from, to) {
        return Err(CoreError::SubscriptionTransition { from, to });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use SubscriptionState::*;

    #[test]
    fn test_provider_status_table() {
        assert_eq!(map_provider_status("active").unwrap(), Active);
        assert_eq!(map_provider_status("trialing").unwrap(), Trial);
        assert_eq!(map_provider_status("past_due").unwrap(), PastDue);
        assert_eq!(map_provider_status("canceled").unwrap(), Cancelled);
        assert_eq!(map_provider_status("unpaid").unwrap(), PastDue);
        assert!(map_provider_status("incomplete_expired").is_err());
    }

    #[test]
    fn test_active_never_downgrades_to_trial() {
        assert!(!subscription_transition_allowed(Active, Trial));
    }

    #[test]
    fn test_payment_failure_recovery() {
        assert!(subscription_transition_allowed(Active, PastDue));
        assert!(subscription_transition_allowed(PastDue, Active));
    }

    #[test]
    fn test_cancellation() {
        assert!(subscription_transition_allowed(Trial, Cancelled));
        assert!(subscription_transition_allowed(Active, Cancelled));
        assert!(subscription_transition_allowed(PastDue, Cancelled));
        assert!(!subscription_transition_allowed(Cancelled, Trial));
    }
}
