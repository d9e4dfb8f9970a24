//! Provisioning engine
//!
//! A background worker that polls for queued jobs, claims each with an
//! atomic `queued -> running` transition, and runs its steps sequentially.
//! Parallelism is across jobs, never within one. The commit boundary sits
//! at the end of each step: a crash mid-step leaves the job `running` with
//! the prior step committed, and a retry re-enters at the recorded cursor.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::error::{ProvisioningError, StepError};
use crate::steps::{ProvisioningStep, StepContext};
use vitrine_api_types::{JobState, TenantStatus, UnifiedProvisioningJob};
use vitrine_config::ProvisioningConfig;
use vitrine_core::progress_after_step;
use vitrine_interfaces::RepositoryFactory;

pub struct ProvisioningEngine {
    repositories: Arc<dyn RepositoryFactory>,
    steps: Vec<Arc<dyn ProvisioningStep>>,
    config: ProvisioningConfig,
    is_running: AtomicBool,
}

impl ProvisioningEngine {
    pub fn new(
        repositories: Arc<dyn RepositoryFactory>,
        steps: Vec<Arc<dyn ProvisioningStep>>,
        config: ProvisioningConfig,
    ) -> Self {
        Self {
            repositories,
            steps,
            config,
            is_running: AtomicBool::new(false),
        }
    }

    /// Run the poll loop until `stop()` is called
    pub async fn start(&self) -> Result<(), ProvisioningError> {
        if !self.config.enabled {
            info!("provisioning engine is disabled");
            return Ok(());
        }
        if self.is_running.swap(true, Ordering::SeqCst) {
            warn!("provisioning engine is already running");
            return Ok(());
        }

        info!(
            poll_interval = ?self.config.poll_interval,
            "provisioning engine started"
        );

        while self.is_running.load(Ordering::SeqCst) {
            if let Err(e) = self.process_batch().await {
                error!(error = %e, "error processing provisioning batch");
            }
            sleep(self.config.poll_interval).await;
        }

        info!("provisioning engine stopped");
        Ok(())
    }

    pub fn stop(&self) {
        self.is_running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.is_running.load(Ordering::SeqCst)
    }

    /// Claim and run every currently queued job, oldest first
    pub async fn process_batch(&self) -> Result<usize, ProvisioningError> {
        let jobs = self
            .repositories
            .job_repository()
            .find_queued(self.config.batch_size)
            .await?;
        if jobs.is_empty() {
            debug!("no provisioning jobs queued");
            return Ok(0);
        }

        let mut processed = 0;
        for job in jobs {
            if self.run_job(job).await? {
                processed += 1;
            }
        }
        Ok(processed)
    }

    /// Run one job to a terminal state. Returns false when the claim lost.
    pub async fn run_job(&self, job: UnifiedProvisioningJob) -> Result<bool, ProvisioningError> {
        let job_id = job.id.as_i32().ok_or_else(|| {
            ProvisioningError::Database(vitrine_interfaces::DatabaseError::Internal {
                message: "job id is not a database id".to_string(),
            })
        })?;

        // The lease: another worker already owns a non-queued job
        if !self.repositories.job_repository().claim(job_id).await? {
            debug!(job = %job.uuid, "claim lost, skipping job");
            return Ok(false);
        }
        info!(job = %job.uuid, step_index = job.step_index, "provisioning job claimed");

        let n_steps = job.steps.len();
        let jobs = self.repositories.job_repository();

        for index in job.step_index..n_steps {
            let step_name = job.steps[index].clone();
            let Some(step) = self.steps.iter().find(|s| s.name() == step_name) else {
                let err = ProvisioningError::UnknownStep {
                    job: job.uuid.to_string(),
                    step: step_name.clone(),
                };
                jobs.mark_failed(
                    job_id,
                    serde_json::json!({"kind": "unknown-step", "message": err.to_string(), "step": step_name}),
                )
                .await?;
                return Ok(true);
            };

            // Fresh tenant view per step; an admin may archive mid-job
            let tenant = match job.tenant_id.as_i32() {
                Some(id) => self.repositories.tenant_repository().find_by_id(id).await?,
                None => None,
            };
            let Some(tenant) = tenant else {
                jobs.mark_failed(
                    job_id,
                    serde_json::json!({"kind": "invariant", "message": "tenant disappeared", "step": step_name}),
                )
                .await?;
                return Ok(true);
            };
            if tenant.status == TenantStatus::Archived {
                warn!(job = %job.uuid, tenant = %tenant.code, "tenant archived during provisioning, terminating job");
                jobs.mark_failed(
                    job_id,
                    serde_json::json!({"kind": "aborted", "message": "tenant archived during provisioning", "step": step_name}),
                )
                .await?;
                return Ok(true);
            }

            // Label first, body second, commit last
            jobs.set_current_step(job_id, &step_name).await?;
            let ctx = StepContext {
                tenant,
                job: job.clone(),
            };
            if let Err(step_err) = step.execute(&ctx).await {
                error!(job = %job.uuid, step = %step_name, error = %step_err, "provisioning step failed");
                jobs.mark_failed(job_id, step_error_blob(&step_err, &step_name)).await?;
                return Ok(true);
            }

            if index + 1 == n_steps {
                jobs.mark_succeeded(job_id).await?;
                info!(job = %job.uuid, "provisioning job succeeded");
            } else {
                jobs.commit_step(job_id, index + 1, progress_after_step(index, n_steps)).await?;
            }
        }

        if n_steps == 0 {
            jobs.mark_succeeded(job_id).await?;
        }
        Ok(true)
    }
}

fn step_error_blob(err: &StepError, step: &str) -> serde_json::Value {
    serde_json::json!({
        "kind": err.kind(),
        "message": err.to_string(),
        "step": step,
    })
}

/// Queued state check used by callers that poll a job before retrying
pub fn is_retryable(state: JobState) -> bool {
    state == JobState::Failed
}
