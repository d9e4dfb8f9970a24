use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Companies first: tenants reference them
        manager
            .create_table(
                Table::create()
                    .table(Companies::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Companies::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Companies::Name).string().not_null())
                    .col(ColumnDef::new(Companies::Email).string())
                    .col(ColumnDef::new(Companies::TenantId).integer().not_null().unique_key())
                    .col(
                        ColumnDef::new(Companies::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Plans::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Plans::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Plans::Code).string_len(40).not_null().unique_key())
                    .col(ColumnDef::new(Plans::Name).string().not_null())
                    .col(ColumnDef::new(Plans::MonthlyPriceId).string())
                    .col(ColumnDef::new(Plans::YearlyPriceId).string())
                    .col(ColumnDef::new(Plans::TrialDays).integer().not_null().default(14))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Tenants::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Tenants::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Tenants::Uuid).uuid().not_null().unique_key())
                    .col(ColumnDef::new(Tenants::Code).string_len(40).not_null().unique_key())
                    .col(ColumnDef::new(Tenants::Name).string().not_null())
                    .col(ColumnDef::new(Tenants::Domain).string().not_null().unique_key())
                    .col(ColumnDef::new(Tenants::AlternateDomains).json().not_null())
                    .col(ColumnDef::new(Tenants::BackofficeDomain).string())
                    .col(ColumnDef::new(Tenants::PrimaryColor).string_len(20))
                    .col(ColumnDef::new(Tenants::LogoUrl).string())
                    .col(ColumnDef::new(Tenants::FaviconUrl).string())
                    .col(ColumnDef::new(Tenants::Email).string())
                    .col(ColumnDef::new(Tenants::Phone).string_len(40))
                    .col(ColumnDef::new(Tenants::FeatureFlags).json().not_null())
                    .col(ColumnDef::new(Tenants::CompanyId).integer())
                    .col(ColumnDef::new(Tenants::PlanCode).string_len(40))
                    .col(
                        ColumnDef::new(Tenants::Status)
                            .string_len(20)
                            .not_null()
                            .default("provisioning"),
                    )
                    .col(ColumnDef::new(Tenants::Active).boolean().not_null().default(true))
                    .col(
                        ColumnDef::new(Tenants::DeploymentTier)
                            .string_len(20)
                            .not_null()
                            .default("shared"),
                    )
                    .col(ColumnDef::new(Tenants::ProviderCustomerId).string())
                    .col(
                        ColumnDef::new(Tenants::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Tenants::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tenants_company_id")
                            .from(Tenants::Table, Tenants::CompanyId)
                            .to(Companies::Table, Companies::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Subscriptions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Subscriptions::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Subscriptions::Uuid).uuid().not_null().unique_key())
                    .col(ColumnDef::new(Subscriptions::TenantId).integer().not_null().unique_key())
                    .col(ColumnDef::new(Subscriptions::PlanCode).string_len(40).not_null())
                    .col(ColumnDef::new(Subscriptions::BillingCycle).string_len(10).not_null())
                    .col(
                        ColumnDef::new(Subscriptions::State)
                            .string_len(20)
                            .not_null()
                            .default("trial"),
                    )
                    .col(ColumnDef::new(Subscriptions::ProviderCustomerId).string())
                    .col(ColumnDef::new(Subscriptions::ProviderSubscriptionId).string().unique_key())
                    .col(ColumnDef::new(Subscriptions::NextBillingDate).timestamp_with_time_zone())
                    .col(ColumnDef::new(Subscriptions::ProviderUpdatedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Subscriptions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Subscriptions::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_subscriptions_tenant_id")
                            .from(Subscriptions::Table, Subscriptions::TenantId)
                            .to(Tenants::Table, Tenants::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ProvisioningJobs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ProvisioningJobs::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ProvisioningJobs::Uuid).uuid().not_null().unique_key())
                    .col(
                        ColumnDef::new(ProvisioningJobs::TenantId)
                            .integer()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(ProvisioningJobs::State)
                            .string_len(20)
                            .not_null()
                            .default("queued"),
                    )
                    .col(ColumnDef::new(ProvisioningJobs::Progress).integer().not_null().default(0))
                    .col(
                        ColumnDef::new(ProvisioningJobs::CurrentStep)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(ProvisioningJobs::StepIndex).integer().not_null().default(0))
                    .col(ColumnDef::new(ProvisioningJobs::Steps).json().not_null())
                    .col(ColumnDef::new(ProvisioningJobs::Error).json())
                    .col(
                        ColumnDef::new(ProvisioningJobs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(ProvisioningJobs::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_provisioning_jobs_tenant_id")
                            .from(ProvisioningJobs::Table, ProvisioningJobs::TenantId)
                            .to(Tenants::Table, Tenants::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(AuditEntries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AuditEntries::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(AuditEntries::Timestamp)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(AuditEntries::ActorId).integer())
                    .col(ColumnDef::new(AuditEntries::ActorLogin).string().not_null())
                    .col(ColumnDef::new(AuditEntries::TenantId).integer())
                    .col(ColumnDef::new(AuditEntries::Action).string().not_null())
                    .col(ColumnDef::new(AuditEntries::ResourceType).string().not_null())
                    .col(ColumnDef::new(AuditEntries::ResourceId).string())
                    .col(ColumnDef::new(AuditEntries::Ip).string_len(45))
                    .col(ColumnDef::new(AuditEntries::UserAgent).string())
                    .col(ColumnDef::new(AuditEntries::Success).boolean().not_null())
                    .col(ColumnDef::new(AuditEntries::Details).json().not_null())
                    .col(ColumnDef::new(AuditEntries::RequestId).string().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(WebhookEvents::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(WebhookEvents::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(WebhookEvents::EventId).string().not_null().unique_key())
                    .col(ColumnDef::new(WebhookEvents::EventType).string().not_null())
                    .col(
                        ColumnDef::new(WebhookEvents::ReceivedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Products::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Products::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Products::Uuid).uuid().not_null().unique_key())
                    .col(ColumnDef::new(Products::TenantUuid).uuid().not_null())
                    .col(ColumnDef::new(Products::Name).string().not_null())
                    .col(ColumnDef::new(Products::PriceCents).big_integer().not_null().default(0))
                    .col(
                        ColumnDef::new(Products::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Products::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(WebhookEvents::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AuditEntries::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ProvisioningJobs::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Subscriptions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Tenants::Table).to_owned())
            .await?;
        manager.drop_table(Table::drop().table(Plans::Table).to_owned()).await?;
        manager
            .drop_table(Table::drop().table(Companies::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
pub enum Companies {
    Table,
    Id,
    Name,
    Email,
    TenantId,
    CreatedAt,
}

#[derive(DeriveIden)]
pub enum Plans {
    Table,
    Id,
    Code,
    Name,
    MonthlyPriceId,
    YearlyPriceId,
    TrialDays,
}

#[derive(DeriveIden)]
pub enum Tenants {
    Table,
    Id,
    Uuid,
    Code,
    Name,
    Domain,
    AlternateDomains,
    BackofficeDomain,
    PrimaryColor,
    LogoUrl,
    FaviconUrl,
    Email,
    Phone,
    FeatureFlags,
    CompanyId,
    PlanCode,
    Status,
    Active,
    DeploymentTier,
    ProviderCustomerId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub enum Subscriptions {
    Table,
    Id,
    Uuid,
    TenantId,
    PlanCode,
    BillingCycle,
    State,
    ProviderCustomerId,
    ProviderSubscriptionId,
    NextBillingDate,
    ProviderUpdatedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub enum ProvisioningJobs {
    Table,
    Id,
    Uuid,
    TenantId,
    State,
    Progress,
    CurrentStep,
    StepIndex,
    Steps,
    Error,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub enum AuditEntries {
    Table,
    Id,
    Timestamp,
    ActorId,
    ActorLogin,
    TenantId,
    Action,
    ResourceType,
    ResourceId,
    Ip,
    UserAgent,
    Success,
    Details,
    RequestId,
}

#[derive(DeriveIden)]
pub enum WebhookEvents {
    Table,
    Id,
    EventId,
    EventType,
    ReceivedAt,
}

#[derive(DeriveIden)]
pub enum Products {
    Table,
    Id,
    Uuid,
    TenantUuid,
    Name,
    PriceCents,
    CreatedAt,
}
