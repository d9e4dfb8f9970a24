//! Onboarding endpoints: slug availability, async signup, job polling
//!
//! All three are tenant-free: they run at platform scope before any tenant
//! exists to resolve.

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::context::OnboardingContext;
use crate::models::onboarding::{CheckSlugRequest, CreateTenantAsyncRequest};
use vitrine_core::{validate_slug, StepPlan};
use vitrine_interfaces::database::CreateTenantInput;
use vitrine_web::{ApiResponse, WebError, WebResult};

/// Slug availability check: `POST /onboarding/check-slug`
pub async fn check_slug(
    State(ctx): State<OnboardingContext>,
    Json(request): Json<CheckSlugRequest>,
) -> WebResult<impl IntoResponse> {
    let slug = request.slug.trim();
    if let Err(reason) = validate_slug(slug) {
        return Ok(ApiResponse::new("available", json!(false)).field("reason", reason.to_string()));
    }
    let taken = ctx.repositories.tenant_repository().find_by_code(slug).await?.is_some();
    Ok(ApiResponse::new("available", json!(!taken)))
}

/// Start async provisioning: `POST /onboarding/create-tenant-async`
///
/// Creates the tenant in `provisioning`, enqueues the job, and returns the
/// job id for polling. A duplicate slug answers 409; of two concurrent
/// signups on the same slug exactly one wins.
pub async fn create_tenant_async(
    State(ctx): State<OnboardingContext>,
    Json(request): Json<CreateTenantAsyncRequest>,
) -> WebResult<impl IntoResponse> {
    let slug = request
        .slug
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| WebError::missing_field("slug"))?;
    let name = request
        .name
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| WebError::missing_field("name"))?;
    let plan = request
        .plan
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| WebError::missing_field("plan"))?;
    validate_slug(slug).map_err(|e| WebError::invalid_field("slug", e))?;

    if ctx.repositories.plan_repository().find_by_code(plan).await?.is_none() {
        return Err(WebError::invalid_field("plan", format!("unknown plan {plan}")));
    }

    let input = CreateTenantInput {
        code: slug.to_string(),
        name: name.to_string(),
        email: request.email.clone(),
        plan_code: plan.to_string(),
        billing_cycle: request.billing_cycle.clone(),
        alternate_domains: request.alternate_domains.clone(),
    };
    let default_domain = ctx.platform.default_domain_for(slug);
    let tenant = ctx.repositories.tenant_repository().create(input, default_domain).await?;

    let tenant_id = tenant
        .id
        .as_i32()
        .ok_or_else(|| WebError::internal("tenant id is not a database id"))?;
    let job = ctx
        .repositories
        .job_repository()
        .create(tenant_id, StepPlan::default_plan().names().to_vec())
        .await?;

    info!(tenant = %tenant.code, job = %job.uuid, "signup accepted, provisioning queued");
    Ok(ApiResponse::new("job_id", json!(job.uuid)).field("tenant_code", tenant.code))
}

/// Poll provisioning progress: `GET /onboarding/job-status/{job_id}`
///
/// Tenant-free on purpose: the tenant is still provisioning while the
/// onboarding UI polls this.
pub async fn job_status(
    State(ctx): State<OnboardingContext>,
    Path(job_id): Path<String>,
) -> WebResult<impl IntoResponse> {
    let uuid = Uuid::parse_str(job_id.trim())
        .map_err(|_| WebError::invalid_field("job_id", "must be a UUID"))?;
    let job = ctx
        .repositories
        .job_repository()
        .find_by_uuid(uuid)
        .await?
        .ok_or_else(|| WebError::new(vitrine_api_types::ErrorCode::TenantNotFound, "job not found"))?;
    Ok(ApiResponse::new("job", job.status_report()))
}
