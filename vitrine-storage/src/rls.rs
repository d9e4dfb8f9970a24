//! RLS context binder
//!
//! Tenant isolation is enforced by Postgres row-level security policies that
//! compare each row's tenant against the transaction-local setting
//! `app.current_tenant`. This module owns that setting: binding writes it
//! with `set_config(..., true)` so the database clears it at every commit or
//! rollback, and the policies are fail-closed, so a session that never bound
//! reads zero rows from tenant-owned tables.
//!
//! Bind failures are logged, never surfaced as request errors: a failed bind
//! is equivalent to an empty tenant context, and the storage policy remains
//! the authority on visibility.

use sea_orm::{
    ConnectionTrait, DatabaseBackend, DatabaseConnection as SeaConnection, DatabaseTransaction, DbErr,
    Statement, TransactionTrait,
};
use tracing::{debug, warn};
use uuid::Uuid;

/// Name of the transaction-local setting consumed by the RLS policies
pub const RLS_TENANT_SETTING: &str = "app.current_tenant";

/// Stateless binder for the per-transaction tenant setting
pub struct RlsBinder;

impl RlsBinder {
    /// Set the transaction-scoped tenant on this session.
    ///
    /// Only meaningful on Postgres; other backends (unit tests) are a no-op.
    pub async fn bind<C: ConnectionTrait>(conn: &C, tenant: Uuid) -> Result<(), DbErr> {
        if conn.get_database_backend() != DatabaseBackend::Postgres {
            debug!("RLS bind skipped: backend has no row-level security");
            return Ok(());
        }
        let stmt = Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            "SELECT set_config($1, $2, true)",
            [RLS_TENANT_SETTING.into(), tenant.to_string().into()],
        );
        conn.execute(stmt).await?;
        Ok(())
    }

    /// Reset the setting inside the current transaction
    pub async fn unbind<C: ConnectionTrait>(conn: &C) -> Result<(), DbErr> {
        if conn.get_database_backend() != DatabaseBackend::Postgres {
            return Ok(());
        }
        let stmt = Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            "SELECT set_config($1, '', true)",
            [RLS_TENANT_SETTING.into()],
        );
        conn.execute(stmt).await?;
        Ok(())
    }

    /// Read the currently bound tenant, if any
    pub async fn current<C: ConnectionTrait>(conn: &C) -> Result<Option<Uuid>, DbErr> {
        if conn.get_database_backend() != DatabaseBackend::Postgres {
            return Ok(None);
        }
        let stmt = Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            "SELECT current_setting($1, true) AS tenant",
            [RLS_TENANT_SETTING.into()],
        );
        let row = conn.query_one(stmt).await?;
        let value: Option<String> = match row {
            Some(row) => row.try_get("", "tenant").ok(),
            None => None,
        };
        Ok(value.filter(|v| !v.is_empty()).and_then(|v| Uuid::parse_str(&v).ok()))
    }
}

/// A transaction bound to one tenant
///
/// The binding is strictly transaction-local: commit, rollback, and drop all
/// clear it, so there is no exit path that leaks a tenant context onto a
/// pooled connection.
pub struct TenantScope {
    txn: DatabaseTransaction,
    tenant: Uuid,
}

impl TenantScope {
    /// Open a transaction and bind the tenant on it.
    ///
    /// A bind failure is logged and the scope proceeds unbound; the policies
    /// then hide every tenant-owned row, which is the fail-closed behavior
    /// callers rely on.
    pub async fn begin(db: &SeaConnection, tenant: Uuid) -> Result<Self, DbErr> {
        let txn = db.begin().await?;
        if let Err(e) = RlsBinder::bind(&txn, tenant).await {
            warn!(tenant = %tenant, error = %e, "RLS bind failed; proceeding with empty tenant context");
        }
        Ok(Self { txn, tenant })
    }

    pub fn tenant(&self) -> Uuid {
        self.tenant
    }

    pub fn transaction(&self) -> &DatabaseTransaction {
        &self.txn
    }

    pub async fn commit(self) -> Result<(), DbErr> {
        self.txn.commit().await
    }

    pub async fn rollback(self) -> Result<(), DbErr> {
        self.txn.rollback().await
    }
}
