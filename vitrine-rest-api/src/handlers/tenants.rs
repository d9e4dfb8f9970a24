//! Tenant registry endpoints

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use tracing::info;

use crate::context::TenantsContext;
use crate::models::tenants::{CreateTenantRequest, ListTenantsQuery};
use vitrine_api_types::TenantPatch;
use vitrine_core::normalize_domain;
use vitrine_interfaces::TenantFilters;
use vitrine_web::{ApiResponse, AuthContext, WebError, WebResult};

#[derive(Debug, Deserialize)]
pub struct ByDomainQuery {
    pub domain: Option<String>,
}

/// Resolver lookup for edge middleware: `GET /tenant/by-domain?domain=…`
pub async fn get_by_domain(
    State(ctx): State<TenantsContext>,
    Query(query): Query<ByDomainQuery>,
) -> WebResult<impl IntoResponse> {
    let domain = query.domain.as_deref().ok_or_else(|| WebError::missing_field("domain"))?;
    let tenant = ctx
        .repositories
        .tenant_repository()
        .find_by_domain(&normalize_domain(domain))
        .await?
        .filter(|t| t.active)
        .ok_or_else(WebError::tenant_not_found)?;
    Ok(ApiResponse::new("tenant", tenant))
}

/// Public tenant config by code: `GET /tenant/code/{code}`
pub async fn get_by_code(
    State(ctx): State<TenantsContext>,
    Path(code): Path<String>,
) -> WebResult<impl IntoResponse> {
    let tenant = ctx
        .repositories
        .tenant_repository()
        .find_by_code(code.trim())
        .await?
        .filter(|t| t.active)
        .ok_or_else(WebError::tenant_not_found)?;
    Ok(ApiResponse::new("tenant", tenant))
}

/// Admin read by internal id: `GET /tenant/{id}`
pub async fn get_by_id(
    State(ctx): State<TenantsContext>,
    auth: AuthContext,
    Path(id): Path<i32>,
) -> WebResult<impl IntoResponse> {
    auth.require_admin()?;
    let tenant = ctx
        .repositories
        .tenant_repository()
        .find_by_id(id)
        .await?
        .ok_or_else(WebError::tenant_not_found)?;
    Ok(ApiResponse::new("tenant", tenant))
}

/// Admin list/search: `GET /tenant/list`
pub async fn list(
    State(ctx): State<TenantsContext>,
    auth: AuthContext,
    Query(query): Query<ListTenantsQuery>,
) -> WebResult<impl IntoResponse> {
    auth.require_admin()?;
    let filters = TenantFilters {
        active: query.active,
        status: query.status,
        search: query.search.clone(),
    };
    let page = ctx
        .repositories
        .tenant_repository()
        .list(filters, query.pagination())
        .await?;
    Ok(ApiResponse::new("tenants", page.items).field("meta", page.meta))
}

/// Admin create: `POST /tenant/create`
pub async fn create(
    State(ctx): State<TenantsContext>,
    auth: AuthContext,
    Json(request): Json<CreateTenantRequest>,
) -> WebResult<impl IntoResponse> {
    auth.require_admin()?;
    if request.name.trim().is_empty() {
        return Err(WebError::missing_field("name"));
    }

    let default_domain = ctx.platform.default_domain_for(&request.code);
    let tenant = ctx
        .repositories
        .tenant_repository()
        .create(request.into(), default_domain)
        .await?;
    info!(tenant = %tenant.code, actor = %auth.login, "tenant created by admin");
    Ok(ApiResponse::new("tenant", tenant))
}

/// Admin edit of any field: `PUT|POST /tenant/{id}/update`
pub async fn update(
    State(ctx): State<TenantsContext>,
    auth: AuthContext,
    Path(id): Path<i32>,
    Json(patch): Json<TenantPatch>,
) -> WebResult<impl IntoResponse> {
    auth.require_admin()?;
    let touches_domains = patch.touches_domains();
    let tenant = ctx.repositories.tenant_repository().update(id, patch).await?;
    if touches_domains {
        ctx.domain_cache.invalidate_all();
    }
    Ok(ApiResponse::new("tenant", tenant))
}

/// Admin soft-archive: `DELETE /tenant/{id}/delete`
pub async fn delete(
    State(ctx): State<TenantsContext>,
    auth: AuthContext,
    Path(id): Path<i32>,
) -> WebResult<impl IntoResponse> {
    auth.require_admin()?;
    let tenant = ctx.repositories.tenant_repository().archive(id).await?;
    ctx.domain_cache.invalidate_all();
    info!(tenant = %tenant.code, actor = %auth.login, "tenant archived");
    Ok(ApiResponse::new("tenant", tenant))
}

/// Caller's own tenant, with super-user lazy creation: `GET /tenant/my`
pub async fn my_tenant(State(ctx): State<TenantsContext>, auth: AuthContext) -> WebResult<impl IntoResponse> {
    let tenant = resolve_my_tenant(&ctx, &auth).await?;
    Ok(ApiResponse::new("tenant", tenant))
}

/// Edit own tenant; protected fields rejected: `PUT|POST /tenant/my/update`
pub async fn my_update(
    State(ctx): State<TenantsContext>,
    auth: AuthContext,
    Json(patch): Json<TenantPatch>,
) -> WebResult<impl IntoResponse> {
    let tenant = resolve_my_tenant(&ctx, &auth).await?;

    // End-users may edit branding and contact fields only
    let protected = patch.protected_fields();
    if !protected.is_empty() {
        return Err(WebError::forbidden(format!(
            "fields {} require platform admin role",
            protected.join(", ")
        )));
    }

    let id = tenant
        .id
        .as_i32()
        .ok_or_else(|| WebError::internal("tenant id is not a database id"))?;
    let updated = ctx.repositories.tenant_repository().update(id, patch).await?;
    Ok(ApiResponse::new("tenant", updated))
}

async fn resolve_my_tenant(
    ctx: &TenantsContext,
    auth: &AuthContext,
) -> Result<vitrine_api_types::UnifiedTenant, WebError> {
    auth.require_authenticated()?;
    let company_id = auth.company_id.ok_or_else(WebError::tenant_not_found)?;

    if let Some(tenant) = ctx.repositories.tenant_repository().find_by_company(company_id).await? {
        return Ok(tenant);
    }
    // Lazy synthetic tenant for the platform super-user only
    if auth.login == ctx.superuser_login {
        let code = format!("admin-{}", company_id);
        let domain = ctx.platform.default_domain_for(&code);
        return Ok(ctx
            .repositories
            .tenant_repository()
            .ensure_admin_tenant(company_id, domain)
            .await?);
    }
    Err(WebError::tenant_not_found())
}
