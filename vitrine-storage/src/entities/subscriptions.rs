//! Subscription entity mirroring the billing provider's record

use sea_orm::entity::prelude::*;
use sea_orm::sea_query::StringLen;
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use vitrine_api_types::{ApiId, BillingCycle, SubscriptionState, UnifiedSubscription};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum DbSubscriptionState {
    #[sea_orm(string_value = "trial")]
    Trial,
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "past_due")]
    PastDue,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl From<DbSubscriptionState> for SubscriptionState {
    fn from(state: DbSubscriptionState) -> Self {
        match state {
            DbSubscriptionState::Trial => SubscriptionState::Trial,
            DbSubscriptionState::Active => SubscriptionState::Active,
            DbSubscriptionState::PastDue => SubscriptionState::PastDue,
            DbSubscriptionState::Cancelled => SubscriptionState::Cancelled,
        }
    }
}

impl From<SubscriptionState> for DbSubscriptionState {
    fn from(state: SubscriptionState) -> Self {
        match state {
            SubscriptionState::Trial => DbSubscriptionState::Trial,
            SubscriptionState::Active => DbSubscriptionState::Active,
            SubscriptionState::PastDue => DbSubscriptionState::PastDue,
            SubscriptionState::Cancelled => DbSubscriptionState::Cancelled,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
pub enum DbBillingCycle {
    #[sea_orm(string_value = "monthly")]
    Monthly,
    #[sea_orm(string_value = "yearly")]
    Yearly,
}

impl From<DbBillingCycle> for BillingCycle {
    fn from(cycle: DbBillingCycle) -> Self {
        match cycle {
            DbBillingCycle::Monthly => BillingCycle::Monthly,
            DbBillingCycle::Yearly => BillingCycle::Yearly,
        }
    }
}

impl From<BillingCycle> for DbBillingCycle {
    fn from(cycle: BillingCycle) -> Self {
        match cycle {
            BillingCycle::Monthly => DbBillingCycle::Monthly,
            BillingCycle::Yearly => DbBillingCycle::Yearly,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "subscriptions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub uuid: Uuid,
    /// At most one subscription row per tenant
    #[sea_orm(unique)]
    pub tenant_id: i32,
    pub plan_code: String,
    pub billing_cycle: DbBillingCycle,
    pub state: DbSubscriptionState,
    pub provider_customer_id: Option<String>,
    #[sea_orm(unique)]
    pub provider_subscription_id: Option<String>,
    pub next_billing_date: Option<ChronoDateTimeUtc>,
    /// Provider-side updated_at of the last applied event
    pub provider_updated_at: Option<ChronoDateTimeUtc>,
    pub created_at: ChronoDateTimeUtc,
    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::tenants::Entity",
        from = "Column::TenantId",
        to = "super::tenants::Column::Id"
    )]
    Tenant,
}

impl Related<super::tenants::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tenant.def()
    }
}

impl ActiveModelBehavior for ActiveModel {
    fn new() -> Self {
        Self {
            uuid: Set(Uuid::new_v4()),
            state: Set(DbSubscriptionState::Trial),
            created_at: Set(chrono::Utc::now()),
            updated_at: Set(chrono::Utc::now()),
            ..ActiveModelTrait::default()
        }
    }
}

impl From<Model> for UnifiedSubscription {
    fn from(model: Model) -> Self {
        UnifiedSubscription {
            id: ApiId::from_i32(model.id),
            uuid: model.uuid,
            tenant_id: ApiId::from_i32(model.tenant_id),
            plan_code: model.plan_code,
            billing_cycle: model.billing_cycle.into(),
            state: model.state.into(),
            provider_customer_id: model.provider_customer_id,
            provider_subscription_id: model.provider_subscription_id,
            next_billing_date: model.next_billing_date,
            provider_updated_at: model.provider_updated_at,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
