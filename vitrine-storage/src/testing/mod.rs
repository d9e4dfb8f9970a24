//! Testing utilities for vitrine-storage
//!
//! Provides a fully stateful in-memory repository factory that honors the
//! same invariants as the SeaORM implementations (slug validation, domain
//! uniqueness, status transition guards, job claim semantics), so service
//! and handler tests can run without a database.
//!
//! Enable with the `testing` feature:
//!
//! ```toml
//! [dev-dependencies]
//! vitrine-storage = { path = "...", features = ["testing"] }
//! ```

pub mod memory;

pub use memory::InMemoryRepositoryFactory;
