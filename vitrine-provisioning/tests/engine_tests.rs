//! Provisioning engine tests: progress, failure, resume, claims

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use vitrine_api_types::{JobState, TenantStatus};
use vitrine_config::ProvisioningConfig;
use vitrine_core::DEFAULT_STEP_PLAN;
use vitrine_interfaces::database::CreateTenantInput;
use vitrine_interfaces::RepositoryFactory;
use vitrine_provisioning::{default_steps, ProvisioningEngine, ProvisioningStep, StepContext, StepError};
use vitrine_storage::testing::InMemoryRepositoryFactory;

/// Counts executions and optionally fails until disarmed
struct InstrumentedStep {
    inner: Arc<dyn ProvisioningStep>,
    executions: Arc<AtomicUsize>,
    fail: Arc<AtomicBool>,
}

#[async_trait]
impl ProvisioningStep for InstrumentedStep {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    async fn execute(&self, ctx: &StepContext) -> Result<(), StepError> {
        self.executions.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(StepError::invariant("injected failure"));
        }
        self.inner.execute(ctx).await
    }
}

struct Harness {
    factory: Arc<InMemoryRepositoryFactory>,
    engine: ProvisioningEngine,
    counters: Vec<Arc<AtomicUsize>>,
    fail_flags: Vec<Arc<AtomicBool>>,
}

fn harness() -> Harness {
    let factory = Arc::new(InMemoryRepositoryFactory::new());
    factory.seed_default_plans();

    let base = default_steps(factory.clone(), None);
    let mut counters = Vec::new();
    let mut fail_flags = Vec::new();
    let steps: Vec<Arc<dyn ProvisioningStep>> = base
        .into_iter()
        .map(|inner| {
            let executions = Arc::new(AtomicUsize::new(0));
            let fail = Arc::new(AtomicBool::new(false));
            counters.push(executions.clone());
            fail_flags.push(fail.clone());
            Arc::new(InstrumentedStep {
                inner,
                executions,
                fail,
            }) as Arc<dyn ProvisioningStep>
        })
        .collect();

    let engine = ProvisioningEngine::new(factory.clone(), steps, ProvisioningConfig::default());
    Harness {
        factory,
        engine,
        counters,
        fail_flags,
    }
}

async fn create_tenant_and_job(factory: &InMemoryRepositoryFactory, code: &str) -> (i32, i32) {
    let tenant = factory
        .tenant_repository()
        .create(
            CreateTenantInput {
                code: code.to_string(),
                name: "Ma Boutique".to_string(),
                email: Some("o@x.com".to_string()),
                plan_code: "starter".to_string(),
                billing_cycle: Some("monthly".to_string()),
                alternate_domains: Vec::new(),
            },
            format!("{code}.shops.test"),
        )
        .await
        .unwrap();
    let tenant_id = tenant.id.as_i32().unwrap();
    let job = factory
        .job_repository()
        .create(tenant_id, DEFAULT_STEP_PLAN.iter().map(|s| s.to_string()).collect())
        .await
        .unwrap();
    (tenant_id, job.id.as_i32().unwrap())
}

#[tokio::test]
async fn test_happy_path_runs_all_steps_once() {
    let h = harness();
    let (tenant_id, _job_id) = create_tenant_and_job(&h.factory, "ma-boutique").await;

    let processed = h.engine.process_batch().await.unwrap();
    assert_eq!(processed, 1);

    let job = h.factory.job_repository().find_by_tenant(tenant_id).await.unwrap().unwrap();
    assert_eq!(job.state, JobState::Succeeded);
    assert_eq!(job.progress, 100);
    assert_eq!(job.step_index, DEFAULT_STEP_PLAN.len());

    let tenant = h.factory.tenant_repository().find_by_id(tenant_id).await.unwrap().unwrap();
    assert_eq!(tenant.status, TenantStatus::Active);
    assert!(tenant.company_id.is_some());
    assert_eq!(
        h.factory.catalog_repository().count_for_tenant(tenant.uuid).await.unwrap(),
        3
    );

    for counter in &h.counters {
        assert_eq!(counter.load(Ordering::SeqCst), 1, "every step executes exactly once");
    }
}

#[tokio::test]
async fn test_failure_freezes_progress_and_records_error() {
    let h = harness();
    let (tenant_id, _) = create_tenant_and_job(&h.factory, "acme").await;

    // Step 3 of 6 (index 2) fails
    h.fail_flags[2].store(true, Ordering::SeqCst);
    h.engine.process_batch().await.unwrap();

    let job = h.factory.job_repository().find_by_tenant(tenant_id).await.unwrap().unwrap();
    assert_eq!(job.state, JobState::Failed);
    assert_eq!(job.progress, 33);
    assert_eq!(job.step_index, 2);
    let error = job.error.unwrap();
    assert_eq!(error["step"], "seed-catalog-defaults");
    assert_eq!(error["kind"], "invariant");

    // Tenant stays in provisioning on failure
    let tenant = h.factory.tenant_repository().find_by_id(tenant_id).await.unwrap().unwrap();
    assert_eq!(tenant.status, TenantStatus::Provisioning);
}

#[tokio::test]
async fn test_retry_resumes_at_failed_step() {
    let h = harness();
    let (tenant_id, job_id) = create_tenant_and_job(&h.factory, "acme").await;

    h.fail_flags[2].store(true, Ordering::SeqCst);
    h.engine.process_batch().await.unwrap();

    h.fail_flags[2].store(false, Ordering::SeqCst);
    h.factory.job_repository().retry(job_id).await.unwrap();
    h.engine.process_batch().await.unwrap();

    let job = h.factory.job_repository().find_by_tenant(tenant_id).await.unwrap().unwrap();
    assert_eq!(job.state, JobState::Succeeded);
    assert_eq!(job.progress, 100);
    assert!(job.error.is_none());

    // Committed steps did not re-run; the failed step ran twice
    assert_eq!(h.counters[0].load(Ordering::SeqCst), 1);
    assert_eq!(h.counters[1].load(Ordering::SeqCst), 1);
    assert_eq!(h.counters[2].load(Ordering::SeqCst), 2);
    assert_eq!(h.counters[5].load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_retry_rejected_for_non_failed_job() {
    let h = harness();
    let (_, job_id) = create_tenant_and_job(&h.factory, "acme").await;

    let err = h.factory.job_repository().retry(job_id).await.unwrap_err();
    assert!(err.to_string().contains("only failed jobs"));
}

#[tokio::test]
async fn test_second_worker_loses_the_claim() {
    let h = harness();
    let (_, job_id) = create_tenant_and_job(&h.factory, "acme").await;

    assert!(h.factory.job_repository().claim(job_id).await.unwrap());
    // Job is now running; the engine's claim must lose and skip it
    let job = h.factory.job_repository().find_queued(10).await.unwrap();
    assert!(job.is_empty());
    assert!(!h.factory.job_repository().claim(job_id).await.unwrap());
}

#[tokio::test]
async fn test_archived_tenant_terminates_job_early() {
    let h = harness();
    let (tenant_id, _) = create_tenant_and_job(&h.factory, "acme").await;

    h.factory.tenant_repository().archive(tenant_id).await.unwrap();
    h.engine.process_batch().await.unwrap();

    let job = h.factory.job_repository().find_by_tenant(tenant_id).await.unwrap().unwrap();
    assert_eq!(job.state, JobState::Failed);
    assert_eq!(job.error.unwrap()["kind"], "aborted");

    // No step body ran against the archived tenant
    for counter in &h.counters {
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }
}

#[tokio::test]
async fn test_checkout_activated_tenant_still_succeeds() {
    let h = harness();
    let (tenant_id, _) = create_tenant_and_job(&h.factory, "acme").await;

    // Billing activated the tenant before the worker got to the job
    h.factory
        .tenant_repository()
        .transition_status(tenant_id, TenantStatus::Active)
        .await
        .unwrap();

    h.engine.process_batch().await.unwrap();
    let job = h.factory.job_repository().find_by_tenant(tenant_id).await.unwrap().unwrap();
    assert_eq!(job.state, JobState::Succeeded);
    let tenant = h.factory.tenant_repository().find_by_id(tenant_id).await.unwrap().unwrap();
    assert_eq!(tenant.status, TenantStatus::Active);
}
