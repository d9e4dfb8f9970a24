//! Provisioning errors

use vitrine_interfaces::{BillingError, DatabaseError};

/// Engine-level errors
#[derive(Debug, thiserror::Error)]
pub enum ProvisioningError {
    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error("job {job} references unknown step {step}")]
    UnknownStep { job: String, step: String },
}

/// Errors raised by a step body; recorded onto the job's error blob
#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Billing(#[from] BillingError),

    #[error("{message}")]
    Invariant { message: String },
}

impl StepError {
    pub fn invariant(message: impl Into<String>) -> Self {
        Self::Invariant {
            message: message.into(),
        }
    }

    /// Short machine label stored in the job's error blob
    pub fn kind(&self) -> &'static str {
        match self {
            StepError::Database(_) => "database",
            StepError::Billing(_) => "billing",
            StepError::Invariant { .. } => "invariant",
        }
    }
}
