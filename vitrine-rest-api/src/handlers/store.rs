//! Tenant-scoped storefront routes
//!
//! These run behind the tenant middleware: the tenant is already resolved,
//! status-gated, and every catalog query below executes inside an
//! RLS-bound transaction, so the listing can only ever see the current
//! tenant's rows.

use axum::{extract::State, response::IntoResponse};

use crate::context::StoreContext;
use vitrine_web::{ApiResponse, TenantContext, WebResult};

/// Product listing for the resolved tenant: `GET /store/products`
pub async fn list_products(State(ctx): State<StoreContext>, tenant: TenantContext) -> WebResult<impl IntoResponse> {
    let products = ctx
        .repositories
        .catalog_repository()
        .list_for_tenant(tenant.tenant.uuid)
        .await?;
    Ok(ApiResponse::new("products", products).field("tenant_code", tenant.tenant.code))
}
