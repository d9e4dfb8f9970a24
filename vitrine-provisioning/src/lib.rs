//! # Vitrine Provisioning
//!
//! The durable job engine that drives a freshly created tenant from signup
//! input to active: an ordered, resumable sequence of idempotent steps with
//! progress committed at every step boundary.

pub mod engine;
pub mod error;
pub mod steps;

pub use engine::ProvisioningEngine;
pub use error::{ProvisioningError, StepError};
pub use steps::{default_steps, ProvisioningStep, StepContext};
