//! # Vitrine Billing
//!
//! Everything that touches the subscription provider: the outbound Stripe
//! gateway, webhook signature verification, and the reconciliation state
//! machine that maps provider events onto tenant and subscription state.

pub mod events;
pub mod gateway;
pub mod mock;
pub mod processor;
pub mod service;
pub mod signature;

pub use events::{StripeEvent, StripeEventObject};
pub use gateway::StripeGateway;
pub use mock::MockBillingGateway;
pub use processor::{WebhookOutcome, WebhookProcessor};
pub use service::BillingService;
pub use signature::verify_signature;
