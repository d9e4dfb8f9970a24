//! Provisioning job entity: durable, resumable signup-to-active record

use sea_orm::entity::prelude::*;
use sea_orm::sea_query::StringLen;
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use vitrine_api_types::{ApiId, JobState, UnifiedProvisioningJob};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum DbJobState {
    #[sea_orm(string_value = "queued")]
    Queued,
    #[sea_orm(string_value = "running")]
    Running,
    #[sea_orm(string_value = "succeeded")]
    Succeeded,
    #[sea_orm(string_value = "failed")]
    Failed,
}

impl From<DbJobState> for JobState {
    fn from(state: DbJobState) -> Self {
        match state {
            DbJobState::Queued => JobState::Queued,
            DbJobState::Running => JobState::Running,
            DbJobState::Succeeded => JobState::Succeeded,
            DbJobState::Failed => JobState::Failed,
        }
    }
}

impl From<JobState> for DbJobState {
    fn from(state: JobState) -> Self {
        match state {
            JobState::Queued => DbJobState::Queued,
            JobState::Running => DbJobState::Running,
            JobState::Succeeded => DbJobState::Succeeded,
            JobState::Failed => DbJobState::Failed,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "provisioning_jobs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Public job id used by the polling endpoint
    #[sea_orm(unique)]
    pub uuid: Uuid,
    /// One active job per tenant
    #[sea_orm(unique)]
    pub tenant_id: i32,
    pub state: DbJobState,
    /// 0..=100, monotone over the job's lifetime
    pub progress: i32,
    pub current_step: String,
    /// Cursor: number of committed steps; a resume re-enters here
    pub step_index: i32,
    /// Owned copy of the ordered step plan
    pub steps: Json,
    /// Error blob on failure: kind, message, step
    pub error: Option<Json>,
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
            state: Set(DbJobState::Queued),
            progress: Set(0),
            step_index: Set(0),
            current_step: Set(String::new()),
            created_at: Set(chrono::Utc::now()),
            updated_at: Set(chrono::Utc::now()),
            ..ActiveModelTrait::default()
        }
    }
}

impl From<Model> for UnifiedProvisioningJob {
    fn from(model: Model) -> Self {
        let steps: Vec<String> = serde_json::from_value(model.steps.clone()).unwrap_or_default();
        UnifiedProvisioningJob {
            id: ApiId::from_i32(model.id),
            uuid: model.uuid,
            tenant_id: ApiId::from_i32(model.tenant_id),
            state: model.state.into(),
            progress: model.progress.clamp(0, 100) as u8,
            current_step: model.current_step,
            step_index: model.step_index.max(0) as usize,
            steps,
            error: model.error,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
