//! Tenant entity: one isolated store/brand on the platform

use sea_orm::entity::prelude::*;
use sea_orm::sea_query::StringLen;
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use vitrine_api_types::{ApiId, DeploymentTier, FeatureFlags, TenantStatus, UnifiedTenant};

/// Tenant lifecycle status, stored as a short string
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum DbTenantStatus {
    #[sea_orm(string_value = "provisioning")]
    Provisioning,
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "suspended")]
    Suspended,
    #[sea_orm(string_value = "archived")]
    Archived,
}

impl From<DbTenantStatus> for TenantStatus {
    fn from(status: DbTenantStatus) -> Self {
        match status {
            DbTenantStatus::Provisioning => TenantStatus::Provisioning,
            DbTenantStatus::Active => TenantStatus::Active,
            DbTenantStatus::Suspended => TenantStatus::Suspended,
            DbTenantStatus::Archived => TenantStatus::Archived,
        }
    }
}

impl From<TenantStatus> for DbTenantStatus {
    fn from(status: TenantStatus) -> Self {
        match status {
            TenantStatus::Provisioning => DbTenantStatus::Provisioning,
            TenantStatus::Active => DbTenantStatus::Active,
            TenantStatus::Suspended => DbTenantStatus::Suspended,
            TenantStatus::Archived => DbTenantStatus::Archived,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum DbDeploymentTier {
    #[sea_orm(string_value = "shared")]
    Shared,
    #[sea_orm(string_value = "dedicated")]
    Dedicated,
}

impl From<DbDeploymentTier> for DeploymentTier {
    fn from(tier: DbDeploymentTier) -> Self {
        match tier {
            DbDeploymentTier::Shared => DeploymentTier::Shared,
            DbDeploymentTier::Dedicated => DeploymentTier::Dedicated,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tenants")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub uuid: Uuid,
    /// Unique short slug
    #[sea_orm(unique)]
    pub code: String,
    pub name: String,
    /// Primary domain; globally unique
    #[sea_orm(unique)]
    pub domain: String,
    /// JSON array of alternate domains; each globally unique (checked on write)
    pub alternate_domains: Json,
    pub backoffice_domain: Option<String>,
    pub primary_color: Option<String>,
    pub logo_url: Option<String>,
    pub favicon_url: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub feature_flags: Json,
    pub company_id: Option<i32>,
    pub plan_code: Option<String>,
    pub status: DbTenantStatus,
    /// Soft-delete flag
    pub active: bool,
    pub deployment_tier: DbDeploymentTier,
    /// Cached billing provider customer id
    pub provider_customer_id: Option<String>,
    pub created_at: ChronoDateTimeUtc,
    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::subscriptions::Entity")]
    Subscription,
    #[sea_orm(has_one = "super::provisioning_jobs::Entity")]
    ProvisioningJob,
    #[sea_orm(
        belongs_to = "super::companies::Entity",
        from = "Column::CompanyId",
        to = "super::companies::Column::Id"
    )]
    Company,
}

impl Related<super::subscriptions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Subscription.def()
    }
}

impl Related<super::provisioning_jobs::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProvisioningJob.def()
    }
}

impl Related<super::companies::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Company.def()
    }
}

impl ActiveModelBehavior for ActiveModel {
    fn new() -> Self {
        Self {
            uuid: Set(Uuid::new_v4()),
            active: Set(true),
            status: Set(DbTenantStatus::Provisioning),
            deployment_tier: Set(DbDeploymentTier::Shared),
            alternate_domains: Set(serde_json::json!([])),
            feature_flags: Set(serde_json::to_value(FeatureFlags::default()).unwrap_or_default()),
            created_at: Set(chrono::Utc::now()),
            updated_at: Set(chrono::Utc::now()),
            ..ActiveModelTrait::default()
        }
    }
}

impl Model {
    /// Alternate domains as a plain vector
    pub fn alternate_domain_list(&self) -> Vec<String> {
        serde_json::from_value(self.alternate_domains.clone()).unwrap_or_default()
    }
}

impl From<Model> for UnifiedTenant {
    fn from(model: Model) -> Self {
        let alternate_domains = model.alternate_domain_list();
        let feature_flags: FeatureFlags = serde_json::from_value(model.feature_flags).unwrap_or_default();
        UnifiedTenant {
            id: ApiId::from_i32(model.id),
            uuid: model.uuid,
            code: model.code,
            name: model.name,
            domain: model.domain,
            alternate_domains,
            backoffice_domain: model.backoffice_domain,
            primary_color: model.primary_color,
            logo_url: model.logo_url,
            favicon_url: model.favicon_url,
            email: model.email,
            phone: model.phone,
            feature_flags,
            plan_code: model.plan_code,
            status: model.status.into(),
            active: model.active,
            deployment_tier: model.deployment_tier.into(),
            company_id: model.company_id,
            provider_customer_id: model.provider_customer_id,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
