//! Row-level security policies on tenant-owned tables
//!
//! Policies compare the row's tenant against the transaction-local setting
//! `app.current_tenant`. The second argument of `current_setting` makes the
//! missing-setting case return NULL instead of raising, so an unbound
//! session simply sees zero rows (fail-closed). `FORCE` keeps the policies
//! in effect even for the table owner.
//!
//! Registry tables (tenants, plans, subscriptions, jobs, audit) are
//! platform-scope by design: the request plane itself must read them before
//! any tenant is bound.

use sea_orm::DatabaseBackend;
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

const ENABLE_RLS: &[&str] = &[
    "ALTER TABLE products ENABLE ROW LEVEL SECURITY",
    "ALTER TABLE products FORCE ROW LEVEL SECURITY",
    r#"CREATE POLICY products_tenant_isolation ON products
        USING (tenant_uuid = NULLIF(current_setting('app.current_tenant', true), '')::uuid)
        WITH CHECK (tenant_uuid = NULLIF(current_setting('app.current_tenant', true), '')::uuid)"#,
];

const DISABLE_RLS: &[&str] = &[
    "DROP POLICY IF EXISTS products_tenant_isolation ON products",
    "ALTER TABLE products NO FORCE ROW LEVEL SECURITY",
    "ALTER TABLE products DISABLE ROW LEVEL SECURITY",
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Row-level security is a Postgres feature; unit-test backends skip it
        if manager.get_database_backend() != DatabaseBackend::Postgres {
            return Ok(());
        }
        let conn = manager.get_connection();
        for sql in ENABLE_RLS {
            conn.execute_unprepared(sql).await?;
        }
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        if manager.get_database_backend() != DatabaseBackend::Postgres {
            return Ok(());
        }
        let conn = manager.get_connection();
        for sql in DISABLE_RLS {
            conn.execute_unprepared(sql).await?;
        }
        Ok(())
    }
}
