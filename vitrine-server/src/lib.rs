//! # Vitrine Server
//!
//! Composition root: builds the service container from configuration,
//! wires the REST router, and runs the provisioning worker alongside the
//! HTTP listener.

pub mod services;
pub mod startup;

pub use services::ServiceContainer;
pub use startup::run_server;
