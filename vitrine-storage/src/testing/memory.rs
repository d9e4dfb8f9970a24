//! In-memory repository implementations
//!
//! One shared `Mutex<State>` backs every repository; no lock is ever held
//! across an await point.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

use vitrine_api_types::{
    ApiId, FeatureFlags, JobState, ListResponse, PaginationInput, SubscriptionState, TenantPatch,
    TenantStatus, UnifiedAuditEntry, UnifiedPlan, UnifiedProvisioningJob, UnifiedSubscription, UnifiedTenant,
};
use vitrine_core::{check_tenant_transition, normalize_domain, validate_slug};
use vitrine_interfaces::database::{CreateTenantInput, ProductSummary};
use vitrine_interfaces::{
    AuditRepository, CatalogRepository, DatabaseError, PlanRepository, ProvisioningJobRepository,
    RepositoryFactory, SubscriptionRepository, TenantFilters, TenantRepository, WebhookEventRepository,
};

#[derive(Default)]
struct State {
    tenants: Vec<UnifiedTenant>,
    subscriptions: Vec<UnifiedSubscription>,
    plans: Vec<UnifiedPlan>,
    jobs: Vec<UnifiedProvisioningJob>,
    audit: Vec<UnifiedAuditEntry>,
    webhook_events: HashMap<String, String>,
    /// tenant id -> company id
    companies: HashMap<i32, i32>,
    /// tenant uuid -> product names
    products: HashMap<Uuid, Vec<String>>,
    next_id: i32,
}

impl State {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    fn all_domains_of(&self, tenant: &UnifiedTenant) -> Vec<String> {
        let mut domains = vec![tenant.domain.clone()];
        domains.extend(tenant.alternate_domains.iter().cloned());
        if let Some(backoffice) = &tenant.backoffice_domain {
            domains.push(backoffice.clone());
        }
        domains
    }

    fn domain_taken(&self, domain: &str, exclude: Option<&ApiId>) -> bool {
        self.tenants
            .iter()
            .filter(|t| exclude.map(|id| &t.id != id).unwrap_or(true))
            .any(|t| self.all_domains_of(t).iter().any(|d| d == domain))
    }
}

/// Stateful in-memory repository factory for tests
#[derive(Clone)]
pub struct InMemoryRepositoryFactory {
    tenants: InMemoryTenantRepository,
    subscriptions: InMemorySubscriptionRepository,
    plans: InMemoryPlanRepository,
    jobs: InMemoryJobRepository,
    audit: InMemoryAuditRepository,
    webhook_events: InMemoryWebhookEventRepository,
    catalog: InMemoryCatalogRepository,
}

impl InMemoryRepositoryFactory {
    pub fn new() -> Self {
        let state = Arc::new(Mutex::new(State::default()));
        Self {
            tenants: InMemoryTenantRepository { state: state.clone() },
            subscriptions: InMemorySubscriptionRepository { state: state.clone() },
            plans: InMemoryPlanRepository { state: state.clone() },
            jobs: InMemoryJobRepository { state: state.clone() },
            audit: InMemoryAuditRepository { state: state.clone() },
            webhook_events: InMemoryWebhookEventRepository { state: state.clone() },
            catalog: InMemoryCatalogRepository { state },
        }
    }

    /// Seed a plan into the catalog
    pub fn seed_plan(&self, plan: UnifiedPlan) {
        self.plans.state.lock().expect("state lock").plans.push(plan);
    }

    /// Built-in plan catalog matching the seed migration: starter offers
    /// both cycles, pro is monthly-only so cycle failures are testable
    pub fn seed_default_plans(&self) {
        self.seed_plan(UnifiedPlan {
            id: ApiId::from_i32(1),
            code: "starter".to_string(),
            name: "Starter".to_string(),
            monthly_price_id: Some("price_starter_monthly".to_string()),
            yearly_price_id: Some("price_starter_yearly".to_string()),
            trial_days: 14,
        });
        self.seed_plan(UnifiedPlan {
            id: ApiId::from_i32(2),
            code: "pro".to_string(),
            name: "Pro".to_string(),
            monthly_price_id: Some("price_pro_monthly".to_string()),
            yearly_price_id: None,
            trial_days: 14,
        });
    }
}

impl RepositoryFactory for InMemoryRepositoryFactory {
    fn tenant_repository(&self) -> &dyn TenantRepository {
        &self.tenants
    }

    fn subscription_repository(&self) -> &dyn SubscriptionRepository {
        &self.subscriptions
    }

    fn plan_repository(&self) -> &dyn PlanRepository {
        &self.plans
    }

    fn job_repository(&self) -> &dyn ProvisioningJobRepository {
        &self.jobs
    }

    fn audit_repository(&self) -> &dyn AuditRepository {
        &self.audit
    }

    fn webhook_event_repository(&self) -> &dyn WebhookEventRepository {
        &self.webhook_events
    }

    fn catalog_repository(&self) -> &dyn CatalogRepository {
        &self.catalog
    }
}

#[derive(Clone, Default)]
pub struct InMemoryTenantRepository {
    state: Arc<Mutex<State>>,
}

impl InMemoryTenantRepository {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().expect("state lock")
    }
}

#[async_trait]
impl TenantRepository for InMemoryTenantRepository {
    async fn create(&self, input: CreateTenantInput, default_domain: String) -> Result<UnifiedTenant, DatabaseError> {
        validate_slug(&input.code).map_err(|e| DatabaseError::Validation { message: e.to_string() })?;

        let mut state = self.lock();
        if state.tenants.iter().any(|t| t.code == input.code) {
            return Err(DatabaseError::Constraint {
                message: format!("code {} is already taken", input.code),
            });
        }
        let domain = normalize_domain(&default_domain);
        let alternates: Vec<String> = input.alternate_domains.iter().map(|d| normalize_domain(d)).collect();
        for candidate in std::iter::once(&domain).chain(alternates.iter()) {
            if state.domain_taken(candidate, None) {
                return Err(DatabaseError::Constraint {
                    message: format!("domain {} is already taken", candidate),
                });
            }
        }

        let id = state.next_id();
        let now = Utc::now();
        let tenant = UnifiedTenant {
            id: ApiId::from_i32(id),
            uuid: Uuid::new_v4(),
            code: input.code,
            name: input.name,
            domain,
            alternate_domains: alternates,
            backoffice_domain: None,
            primary_color: None,
            logo_url: None,
            favicon_url: None,
            email: input.email,
            phone: None,
            feature_flags: FeatureFlags::default(),
            plan_code: Some(input.plan_code),
            status: TenantStatus::Provisioning,
            active: true,
            deployment_tier: vitrine_api_types::DeploymentTier::Shared,
            company_id: None,
            provider_customer_id: None,
            created_at: now,
            updated_at: now,
        };
        state.tenants.push(tenant.clone());
        Ok(tenant)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<UnifiedTenant>, DatabaseError> {
        Ok(self.lock().tenants.iter().find(|t| t.id.as_i32() == Some(id)).cloned())
    }

    async fn find_by_uuid(&self, uuid: Uuid) -> Result<Option<UnifiedTenant>, DatabaseError> {
        Ok(self.lock().tenants.iter().find(|t| t.uuid == uuid).cloned())
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<UnifiedTenant>, DatabaseError> {
        Ok(self.lock().tenants.iter().find(|t| t.code == code).cloned())
    }

    async fn find_by_domain(&self, domain: &str) -> Result<Option<UnifiedTenant>, DatabaseError> {
        let normalized = normalize_domain(domain);
        let state = self.lock();
        Ok(state
            .tenants
            .iter()
            .find(|t| state.all_domains_of(t).iter().any(|d| d == &normalized))
            .cloned())
    }

    async fn find_by_company(&self, company_id: i32) -> Result<Option<UnifiedTenant>, DatabaseError> {
        Ok(self.lock().tenants.iter().find(|t| t.company_id == Some(company_id)).cloned())
    }

    async fn list(
        &self,
        filters: TenantFilters,
        pagination: PaginationInput,
    ) -> Result<ListResponse<UnifiedTenant>, DatabaseError> {
        let state = self.lock();
        let mut matches: Vec<UnifiedTenant> = state
            .tenants
            .iter()
            .filter(|t| filters.active.map(|a| t.active == a).unwrap_or(true))
            .filter(|t| filters.status.map(|s| t.status == s).unwrap_or(true))
            .filter(|t| {
                filters
                    .search
                    .as_deref()
                    .map(|needle| {
                        let needle = needle.to_ascii_lowercase();
                        t.code.contains(&needle)
                            || t.domain.contains(&needle)
                            || t.name.to_ascii_lowercase().contains(&needle)
                    })
                    .unwrap_or(true)
            })
            .cloned()
            .collect();
        matches.sort_by(|a, b| a.code.cmp(&b.code));

        let total = matches.len() as u64;
        let items = matches
            .into_iter()
            .skip(pagination.offset() as usize)
            .take(pagination.limit as usize)
            .collect();
        Ok(ListResponse::new(items, pagination, total))
    }

    async fn update(&self, id: i32, patch: TenantPatch) -> Result<UnifiedTenant, DatabaseError> {
        let mut state = self.lock();

        let current = state
            .tenants
            .iter()
            .find(|t| t.id.as_i32() == Some(id))
            .cloned()
            .ok_or_else(|| DatabaseError::not_found("tenant", id))?;

        let mut new_domains = Vec::new();
        if let Some(domain) = &patch.domain {
            new_domains.push(normalize_domain(domain));
        }
        if let Some(alternates) = &patch.alternate_domains {
            new_domains.extend(alternates.iter().map(|d| normalize_domain(d)));
        }
        if let Some(backoffice) = &patch.backoffice_domain {
            new_domains.push(normalize_domain(backoffice));
        }
        for candidate in &new_domains {
            if state.domain_taken(candidate, Some(&current.id)) {
                return Err(DatabaseError::Constraint {
                    message: format!("domain {} is already taken", candidate),
                });
            }
        }
        if let Some(code) = &patch.code {
            validate_slug(code).map_err(|e| DatabaseError::Validation { message: e.to_string() })?;
        }
        if let Some(to) = patch.status {
            check_tenant_transition(current.status, to)
                .map_err(|e| DatabaseError::StateTransition { message: e.to_string() })?;
        }

        let tenant = state
            .tenants
            .iter_mut()
            .find(|t| t.id.as_i32() == Some(id))
            .expect("tenant fetched above");

        if let Some(name) = patch.name {
            tenant.name = name;
        }
        if let Some(primary_color) = patch.primary_color {
            tenant.primary_color = Some(primary_color);
        }
        if let Some(logo_url) = patch.logo_url {
            tenant.logo_url = Some(logo_url);
        }
        if let Some(favicon_url) = patch.favicon_url {
            tenant.favicon_url = Some(favicon_url);
        }
        if let Some(email) = patch.email {
            tenant.email = Some(email);
        }
        if let Some(phone) = patch.phone {
            tenant.phone = Some(phone);
        }
        if let Some(flags) = patch.feature_flags {
            tenant.feature_flags = flags;
        }
        if let Some(code) = patch.code {
            tenant.code = code;
        }
        if let Some(domain) = patch.domain {
            tenant.domain = normalize_domain(&domain);
        }
        if let Some(alternates) = patch.alternate_domains {
            tenant.alternate_domains = alternates.iter().map(|d| normalize_domain(d)).collect();
        }
        if let Some(backoffice) = patch.backoffice_domain {
            tenant.backoffice_domain = Some(normalize_domain(&backoffice));
        }
        if let Some(company_id) = patch.company_id {
            tenant.company_id = Some(company_id);
        }
        if let Some(active) = patch.active {
            tenant.active = active;
        }
        if let Some(plan_code) = patch.plan_code {
            tenant.plan_code = Some(plan_code);
        }
        if let Some(status) = patch.status {
            tenant.status = status;
        }
        tenant.updated_at = Utc::now();
        Ok(tenant.clone())
    }

    async fn transition_status(&self, id: i32, to: TenantStatus) -> Result<UnifiedTenant, DatabaseError> {
        let mut state = self.lock();
        let tenant = state
            .tenants
            .iter_mut()
            .find(|t| t.id.as_i32() == Some(id))
            .ok_or_else(|| DatabaseError::not_found("tenant", id))?;
        check_tenant_transition(tenant.status, to)
            .map_err(|e| DatabaseError::StateTransition { message: e.to_string() })?;
        tenant.status = to;
        tenant.updated_at = Utc::now();
        Ok(tenant.clone())
    }

    async fn link_company(&self, id: i32, company_id: i32) -> Result<(), DatabaseError> {
        let mut state = self.lock();
        let tenant = state
            .tenants
            .iter_mut()
            .find(|t| t.id.as_i32() == Some(id))
            .ok_or_else(|| DatabaseError::not_found("tenant", id))?;
        tenant.company_id = Some(company_id);
        Ok(())
    }

    async fn ensure_company(&self, id: i32, _name: &str, _email: Option<&str>) -> Result<i32, DatabaseError> {
        let mut state = self.lock();
        if let Some(existing) = state.companies.get(&id) {
            return Ok(*existing);
        }
        let company_id = state.next_id();
        state.companies.insert(id, company_id);
        let tenant = state
            .tenants
            .iter_mut()
            .find(|t| t.id.as_i32() == Some(id))
            .ok_or_else(|| DatabaseError::not_found("tenant", id))?;
        tenant.company_id = Some(company_id);
        Ok(company_id)
    }

    async fn set_provider_customer(&self, id: i32, customer_id: &str) -> Result<(), DatabaseError> {
        let mut state = self.lock();
        let tenant = state
            .tenants
            .iter_mut()
            .find(|t| t.id.as_i32() == Some(id))
            .ok_or_else(|| DatabaseError::not_found("tenant", id))?;
        tenant.provider_customer_id = Some(customer_id.to_string());
        Ok(())
    }

    async fn archive(&self, id: i32) -> Result<UnifiedTenant, DatabaseError> {
        let mut state = self.lock();
        let tenant = state
            .tenants
            .iter_mut()
            .find(|t| t.id.as_i32() == Some(id))
            .ok_or_else(|| DatabaseError::not_found("tenant", id))?;
        tenant.active = false;
        tenant.status = TenantStatus::Archived;
        tenant.updated_at = Utc::now();
        Ok(tenant.clone())
    }

    async fn ensure_admin_tenant(
        &self,
        company_id: i32,
        default_domain: String,
    ) -> Result<UnifiedTenant, DatabaseError> {
        let code = format!("admin-{}", company_id);
        if let Some(existing) = self.find_by_code(&code).await? {
            return Ok(existing);
        }
        let mut state = self.lock();
        let id = state.next_id();
        let now = Utc::now();
        let tenant = UnifiedTenant {
            id: ApiId::from_i32(id),
            uuid: Uuid::new_v4(),
            code: code.clone(),
            name: format!("Admin {}", company_id),
            domain: normalize_domain(&default_domain),
            alternate_domains: Vec::new(),
            backoffice_domain: None,
            primary_color: None,
            logo_url: None,
            favicon_url: None,
            email: None,
            phone: None,
            feature_flags: FeatureFlags::default(),
            plan_code: None,
            status: TenantStatus::Active,
            active: true,
            deployment_tier: vitrine_api_types::DeploymentTier::Shared,
            company_id: Some(company_id),
            provider_customer_id: None,
            created_at: now,
            updated_at: now,
        };
        state.tenants.push(tenant.clone());
        Ok(tenant)
    }
}

#[derive(Clone, Default)]
pub struct InMemorySubscriptionRepository {
    state: Arc<Mutex<State>>,
}

impl InMemorySubscriptionRepository {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().expect("state lock")
    }
}

#[async_trait]
impl SubscriptionRepository for InMemorySubscriptionRepository {
    async fn create(&self, mut subscription: UnifiedSubscription) -> Result<UnifiedSubscription, DatabaseError> {
        let mut state = self.lock();
        if state.subscriptions.iter().any(|s| s.tenant_id == subscription.tenant_id) {
            return Err(DatabaseError::Constraint {
                message: format!("tenant {} already has a subscription", subscription.tenant_id),
            });
        }
        let id = state.next_id();
        subscription.id = ApiId::from_i32(id);
        state.subscriptions.push(subscription.clone());
        Ok(subscription)
    }

    async fn find_by_tenant(&self, tenant_id: i32) -> Result<Option<UnifiedSubscription>, DatabaseError> {
        Ok(self
            .lock()
            .subscriptions
            .iter()
            .find(|s| s.tenant_id.as_i32() == Some(tenant_id))
            .cloned())
    }

    async fn find_by_provider_subscription(
        &self,
        provider_subscription_id: &str,
    ) -> Result<Option<UnifiedSubscription>, DatabaseError> {
        Ok(self
            .lock()
            .subscriptions
            .iter()
            .find(|s| s.provider_subscription_id.as_deref() == Some(provider_subscription_id))
            .cloned())
    }

    async fn find_by_provider_customer(
        &self,
        provider_customer_id: &str,
    ) -> Result<Option<UnifiedSubscription>, DatabaseError> {
        Ok(self
            .lock()
            .subscriptions
            .iter()
            .find(|s| s.provider_customer_id.as_deref() == Some(provider_customer_id))
            .cloned())
    }

    async fn attach_provider_ids(
        &self,
        id: i32,
        customer_id: &str,
        subscription_id: &str,
    ) -> Result<(), DatabaseError> {
        let mut state = self.lock();
        let subscription = state
            .subscriptions
            .iter_mut()
            .find(|s| s.id.as_i32() == Some(id))
            .ok_or_else(|| DatabaseError::not_found("subscription", id))?;
        subscription.provider_customer_id = Some(customer_id.to_string());
        subscription.provider_subscription_id = Some(subscription_id.to_string());
        subscription.updated_at = Utc::now();
        Ok(())
    }

    async fn set_state(
        &self,
        id: i32,
        new_state: SubscriptionState,
        provider_updated_at: Option<DateTime<Utc>>,
    ) -> Result<(), DatabaseError> {
        let mut state = self.lock();
        let subscription = state
            .subscriptions
            .iter_mut()
            .find(|s| s.id.as_i32() == Some(id))
            .ok_or_else(|| DatabaseError::not_found("subscription", id))?;
        subscription.state = new_state;
        if provider_updated_at.is_some() {
            subscription.provider_updated_at = provider_updated_at;
        }
        subscription.updated_at = Utc::now();
        Ok(())
    }

    async fn set_next_billing_date(&self, id: i32, when: DateTime<Utc>) -> Result<(), DatabaseError> {
        let mut state = self.lock();
        let subscription = state
            .subscriptions
            .iter_mut()
            .find(|s| s.id.as_i32() == Some(id))
            .ok_or_else(|| DatabaseError::not_found("subscription", id))?;
        subscription.next_billing_date = Some(when);
        subscription.updated_at = Utc::now();
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct InMemoryPlanRepository {
    state: Arc<Mutex<State>>,
}

#[async_trait]
impl PlanRepository for InMemoryPlanRepository {
    async fn find_by_code(&self, code: &str) -> Result<Option<UnifiedPlan>, DatabaseError> {
        Ok(self
            .state
            .lock()
            .expect("state lock")
            .plans
            .iter()
            .find(|p| p.code == code)
            .cloned())
    }

    async fn list(&self) -> Result<Vec<UnifiedPlan>, DatabaseError> {
        Ok(self.state.lock().expect("state lock").plans.clone())
    }
}

#[derive(Clone, Default)]
pub struct InMemoryJobRepository {
    state: Arc<Mutex<State>>,
}

impl InMemoryJobRepository {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().expect("state lock")
    }
}

#[async_trait]
impl ProvisioningJobRepository for InMemoryJobRepository {
    async fn create(&self, tenant_id: i32, steps: Vec<String>) -> Result<UnifiedProvisioningJob, DatabaseError> {
        let mut state = self.lock();
        if state.jobs.iter().any(|j| j.tenant_id.as_i32() == Some(tenant_id)) {
            return Err(DatabaseError::Constraint {
                message: format!("tenant {} already has a provisioning job", tenant_id),
            });
        }
        let id = state.next_id();
        let now = Utc::now();
        let job = UnifiedProvisioningJob {
            id: ApiId::from_i32(id),
            uuid: Uuid::new_v4(),
            tenant_id: ApiId::from_i32(tenant_id),
            state: JobState::Queued,
            progress: 0,
            current_step: String::new(),
            step_index: 0,
            steps,
            error: None,
            created_at: now,
            updated_at: now,
        };
        state.jobs.push(job.clone());
        Ok(job)
    }

    async fn find_by_uuid(&self, uuid: Uuid) -> Result<Option<UnifiedProvisioningJob>, DatabaseError> {
        Ok(self.lock().jobs.iter().find(|j| j.uuid == uuid).cloned())
    }

    async fn find_by_tenant(&self, tenant_id: i32) -> Result<Option<UnifiedProvisioningJob>, DatabaseError> {
        Ok(self
            .lock()
            .jobs
            .iter()
            .find(|j| j.tenant_id.as_i32() == Some(tenant_id))
            .cloned())
    }

    async fn find_queued(&self, limit: u64) -> Result<Vec<UnifiedProvisioningJob>, DatabaseError> {
        let state = self.lock();
        let mut queued: Vec<UnifiedProvisioningJob> =
            state.jobs.iter().filter(|j| j.state == JobState::Queued).cloned().collect();
        queued.sort_by_key(|j| j.created_at);
        queued.truncate(limit as usize);
        Ok(queued)
    }

    async fn claim(&self, id: i32) -> Result<bool, DatabaseError> {
        let mut state = self.lock();
        let job = state
            .jobs
            .iter_mut()
            .find(|j| j.id.as_i32() == Some(id))
            .ok_or_else(|| DatabaseError::not_found("provisioning job", id))?;
        if job.state != JobState::Queued {
            return Ok(false);
        }
        job.state = JobState::Running;
        job.updated_at = Utc::now();
        Ok(true)
    }

    async fn set_current_step(&self, id: i32, step: &str) -> Result<(), DatabaseError> {
        let mut state = self.lock();
        let job = state
            .jobs
            .iter_mut()
            .find(|j| j.id.as_i32() == Some(id))
            .ok_or_else(|| DatabaseError::not_found("provisioning job", id))?;
        job.current_step = step.to_string();
        job.updated_at = Utc::now();
        Ok(())
    }

    async fn commit_step(&self, id: i32, step_index: usize, progress: u8) -> Result<(), DatabaseError> {
        let mut state = self.lock();
        let job = state
            .jobs
            .iter_mut()
            .find(|j| j.id.as_i32() == Some(id))
            .ok_or_else(|| DatabaseError::not_found("provisioning job", id))?;
        if progress >= job.progress {
            job.step_index = step_index;
            job.progress = progress;
            job.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn mark_succeeded(&self, id: i32) -> Result<(), DatabaseError> {
        let mut state = self.lock();
        let job = state
            .jobs
            .iter_mut()
            .find(|j| j.id.as_i32() == Some(id))
            .ok_or_else(|| DatabaseError::not_found("provisioning job", id))?;
        job.state = JobState::Succeeded;
        job.progress = 100;
        job.step_index = job.steps.len();
        job.updated_at = Utc::now();
        Ok(())
    }

    async fn mark_failed(&self, id: i32, error: serde_json::Value) -> Result<(), DatabaseError> {
        let mut state = self.lock();
        let job = state
            .jobs
            .iter_mut()
            .find(|j| j.id.as_i32() == Some(id))
            .ok_or_else(|| DatabaseError::not_found("provisioning job", id))?;
        job.state = JobState::Failed;
        job.error = Some(error);
        job.updated_at = Utc::now();
        Ok(())
    }

    async fn retry(&self, id: i32) -> Result<UnifiedProvisioningJob, DatabaseError> {
        let mut state = self.lock();
        let job = state
            .jobs
            .iter_mut()
            .find(|j| j.id.as_i32() == Some(id))
            .ok_or_else(|| DatabaseError::not_found("provisioning job", id))?;
        if job.state != JobState::Failed {
            return Err(DatabaseError::StateTransition {
                message: format!("only failed jobs can be retried, job is {}", job.state),
            });
        }
        job.state = JobState::Queued;
        job.error = None;
        job.updated_at = Utc::now();
        Ok(job.clone())
    }
}

#[derive(Clone, Default)]
pub struct InMemoryAuditRepository {
    state: Arc<Mutex<State>>,
}

#[async_trait]
impl AuditRepository for InMemoryAuditRepository {
    async fn append(&self, entry: UnifiedAuditEntry) -> Result<(), DatabaseError> {
        self.state.lock().expect("state lock").audit.push(entry);
        Ok(())
    }

    async fn list_for_tenant(
        &self,
        tenant_id: i32,
        pagination: PaginationInput,
    ) -> Result<ListResponse<UnifiedAuditEntry>, DatabaseError> {
        let state = self.state.lock().expect("state lock");
        let mut entries: Vec<UnifiedAuditEntry> = state
            .audit
            .iter()
            .filter(|e| e.tenant_id.as_ref().and_then(|id| id.as_i32()) == Some(tenant_id))
            .cloned()
            .collect();
        entries.sort_by_key(|e| e.timestamp);

        let total = entries.len() as u64;
        let items = entries
            .into_iter()
            .skip(pagination.offset() as usize)
            .take(pagination.limit as usize)
            .collect();
        Ok(ListResponse::new(items, pagination, total))
    }
}

#[derive(Clone, Default)]
pub struct InMemoryCatalogRepository {
    state: Arc<Mutex<State>>,
}

#[async_trait]
impl CatalogRepository for InMemoryCatalogRepository {
    async fn ensure_default_products(&self, tenant_uuid: Uuid) -> Result<u32, DatabaseError> {
        let mut state = self.state.lock().expect("state lock");
        let products = state.products.entry(tenant_uuid).or_default();
        if !products.is_empty() {
            return Ok(0);
        }
        products.extend(["Sample Product", "Sample Product 2", "Gift Card"].map(String::from));
        Ok(products.len() as u32)
    }

    async fn count_for_tenant(&self, tenant_uuid: Uuid) -> Result<u64, DatabaseError> {
        Ok(self
            .state
            .lock()
            .expect("state lock")
            .products
            .get(&tenant_uuid)
            .map(|p| p.len() as u64)
            .unwrap_or(0))
    }

    async fn list_for_tenant(&self, tenant_uuid: Uuid) -> Result<Vec<ProductSummary>, DatabaseError> {
        Ok(self
            .state
            .lock()
            .expect("state lock")
            .products
            .get(&tenant_uuid)
            .map(|products| {
                products
                    .iter()
                    .map(|name| ProductSummary {
                        name: name.clone(),
                        price_cents: 1900,
                    })
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[derive(Clone, Default)]
pub struct InMemoryWebhookEventRepository {
    state: Arc<Mutex<State>>,
}

#[async_trait]
impl WebhookEventRepository for InMemoryWebhookEventRepository {
    async fn record(&self, event_id: &str, event_type: &str) -> Result<bool, DatabaseError> {
        let mut state = self.state.lock().expect("state lock");
        if state.webhook_events.contains_key(event_id) {
            return Ok(false);
        }
        state.webhook_events.insert(event_id.to_string(), event_type.to_string());
        Ok(true)
    }

    async fn seen(&self, event_id: &str) -> Result<bool, DatabaseError> {
        Ok(self
            .state
            .lock()
            .expect("state lock")
            .webhook_events
            .contains_key(event_id))
    }
}
