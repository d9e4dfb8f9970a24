use sea_orm_migration::prelude::*;

use super::m20250601_000001_create_core_tables::{AuditEntries, Products, ProvisioningJobs, Tenants};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Resolver lookups by status filter on top of the unique domain/code keys
        manager
            .create_index(
                Index::create()
                    .name("idx_tenants_status")
                    .table(Tenants::Table)
                    .col(Tenants::Status)
                    .to_owned(),
            )
            .await?;

        // Worker poll: queued jobs oldest-first
        manager
            .create_index(
                Index::create()
                    .name("idx_provisioning_jobs_state_created_at")
                    .table(ProvisioningJobs::Table)
                    .col(ProvisioningJobs::State)
                    .col(ProvisioningJobs::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // Per-tenant audit reads ordered by time
        manager
            .create_index(
                Index::create()
                    .name("idx_audit_entries_tenant_timestamp")
                    .table(AuditEntries::Table)
                    .col(AuditEntries::TenantId)
                    .col(AuditEntries::Timestamp)
                    .to_owned(),
            )
            .await?;

        // RLS policy scans products by owning tenant
        manager
            .create_index(
                Index::create()
                    .name("idx_products_tenant_uuid")
                    .table(Products::Table)
                    .col(Products::TenantUuid)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_products_tenant_uuid").table(Products::Table).to_owned())
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_audit_entries_tenant_timestamp")
                    .table(AuditEntries::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_provisioning_jobs_state_created_at")
                    .table(ProvisioningJobs::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(Index::drop().name("idx_tenants_status").table(Tenants::Table).to_owned())
            .await?;
        Ok(())
    }
}
