//! # Vitrine Storage
//!
//! SeaORM-backed storage layer: entities, repositories implementing the
//! `vitrine-interfaces` traits, schema migrations (including the row-level
//! security policies on tenant-owned tables), and the RLS context binder.

pub mod connection;
pub mod entities;
pub mod migrations;
pub mod repositories;
pub mod rls;

#[cfg(feature = "testing")]
pub mod testing;

pub use connection::{DatabaseConnection, StorageError};
pub use migrations::Migrator;
pub use repositories::SeaOrmRepositoryFactory;
pub use rls::{RlsBinder, TenantScope, RLS_TENANT_SETTING};
