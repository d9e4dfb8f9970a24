//! Provisioning job repository
//!
//! The claim is an atomic `queued -> running` compare-and-set, which is the
//! lease that keeps two workers off the same job. Progress commits happen at
//! step boundaries so a crash mid-step resumes from the committed cursor.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{ActiveModelBehavior, ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set};
use tracing::warn;
use uuid::Uuid;

use crate::connection::DatabaseConnection;
use crate::entities::{provisioning_jobs, ProvisioningJobs};
use crate::repositories::map_db_err;
use vitrine_api_types::{JobState, UnifiedProvisioningJob};
use vitrine_interfaces::{DatabaseError, ProvisioningJobRepository};

#[derive(Clone)]
pub struct SeaOrmProvisioningJobRepository {
    db: DatabaseConnection,
}

impl SeaOrmProvisioningJobRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn fetch(&self, id: i32) -> Result<provisioning_jobs::Model, DatabaseError> {
        ProvisioningJobs::find_by_id(id)
            .one(self.db.get_connection())
            .await
            .map_err(map_db_err)?
            .ok_or_else(|| DatabaseError::not_found("provisioning job", id))
    }
}

#[async_trait]
impl ProvisioningJobRepository for SeaOrmProvisioningJobRepository {
    async fn create(&self, tenant_id: i32, steps: Vec<String>) -> Result<UnifiedProvisioningJob, DatabaseError> {
        let mut model = provisioning_jobs::ActiveModel::new();
        model.tenant_id = Set(tenant_id);
        model.steps = Set(serde_json::json!(steps));

        let created = model.insert(self.db.get_connection()).await.map_err(map_db_err)?;
        Ok(created.into())
    }

    async fn find_by_uuid(&self, uuid: Uuid) -> Result<Option<UnifiedProvisioningJob>, DatabaseError> {
        let job = ProvisioningJobs::find()
            .filter(provisioning_jobs::Column::Uuid.eq(uuid))
            .one(self.db.get_connection())
            .await
            .map_err(map_db_err)?;
        Ok(job.map(Into::into))
    }

    async fn find_by_tenant(&self, tenant_id: i32) -> Result<Option<UnifiedProvisioningJob>, DatabaseError> {
        let job = ProvisioningJobs::find()
            .filter(provisioning_jobs::Column::TenantId.eq(tenant_id))
            .one(self.db.get_connection())
            .await
            .map_err(map_db_err)?;
        Ok(job.map(Into::into))
    }

    async fn find_queued(&self, limit: u64) -> Result<Vec<UnifiedProvisioningJob>, DatabaseError> {
        let jobs = ProvisioningJobs::find()
            .filter(provisioning_jobs::Column::State.eq(provisioning_jobs::DbJobState::Queued))
            .order_by_asc(provisioning_jobs::Column::CreatedAt)
            .limit(limit)
            .all(self.db.get_connection())
            .await
            .map_err(map_db_err)?;
        Ok(jobs.into_iter().map(Into::into).collect())
    }

    async fn claim(&self, id: i32) -> Result<bool, DatabaseError> {
        let result = ProvisioningJobs::update_many()
            .col_expr(
                provisioning_jobs::Column::State,
                Expr::value(provisioning_jobs::DbJobState::Running),
            )
            .col_expr(provisioning_jobs::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(provisioning_jobs::Column::Id.eq(id))
            .filter(provisioning_jobs::Column::State.eq(provisioning_jobs::DbJobState::Queued))
            .exec(self.db.get_connection())
            .await
            .map_err(map_db_err)?;
        Ok(result.rows_affected == 1)
    }

    async fn set_current_step(&self, id: i32, step: &str) -> Result<(), DatabaseError> {
        let current = self.fetch(id).await?;
        let mut model: provisioning_jobs::ActiveModel = current.into();
        model.current_step = Set(step.to_string());
        model.updated_at = Set(Utc::now());
        model.update(self.db.get_connection()).await.map_err(map_db_err)?;
        Ok(())
    }

    async fn commit_step(&self, id: i32, step_index: usize, progress: u8) -> Result<(), DatabaseError> {
        let current = self.fetch(id).await?;
        if i32::from(progress) < current.progress {
            // Never move progress backwards; a stale writer loses
            warn!(job = current.id, "refusing non-monotone progress write");
            return Ok(());
        }
        let mut model: provisioning_jobs::ActiveModel = current.into();
        model.step_index = Set(step_index as i32);
        model.progress = Set(i32::from(progress));
        model.updated_at = Set(Utc::now());
        model.update(self.db.get_connection()).await.map_err(map_db_err)?;
        Ok(())
    }

    async fn mark_succeeded(&self, id: i32) -> Result<(), DatabaseError> {
        let current = self.fetch(id).await?;
        let n_steps = serde_json::from_value::<Vec<String>>(current.steps.clone())
            .map(|s| s.len())
            .unwrap_or(0);
        let mut model: provisioning_jobs::ActiveModel = current.into();
        model.state = Set(provisioning_jobs::DbJobState::Succeeded);
        model.progress = Set(100);
        model.step_index = Set(n_steps as i32);
        model.updated_at = Set(Utc::now());
        model.update(self.db.get_connection()).await.map_err(map_db_err)?;
        Ok(())
    }

    async fn mark_failed(&self, id: i32, error: serde_json::Value) -> Result<(), DatabaseError> {
        let current = self.fetch(id).await?;
        let mut model: provisioning_jobs::ActiveModel = current.into();
        model.state = Set(provisioning_jobs::DbJobState::Failed);
        model.error = Set(Some(error));
        model.updated_at = Set(Utc::now());
        model.update(self.db.get_connection()).await.map_err(map_db_err)?;
        Ok(())
    }

    async fn retry(&self, id: i32) -> Result<UnifiedProvisioningJob, DatabaseError> {
        let current = self.fetch(id).await?;
        let state: JobState = current.state.into();
        if state != JobState::Failed {
            return Err(DatabaseError::StateTransition {
                message: format!("only failed jobs can be retried, job is {}", state),
            });
        }

        // Cursor preserved: the resumed run re-enters at the failed step
        let mut model: provisioning_jobs::ActiveModel = current.into();
        model.state = Set(provisioning_jobs::DbJobState::Queued);
        model.error = Set(None);
        model.updated_at = Set(Utc::now());
        let updated = model.update(self.db.get_connection()).await.map_err(map_db_err)?;
        Ok(updated.into())
    }
}
