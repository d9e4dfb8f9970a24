//! Router assembly
//!
//! Layer order (outermost first): CORS preflight, request id, auth, audit,
//! rate limit, idempotency, then routing. Tenant resolution and the status
//! gate are a route-group layer on the tenant-scoped routes only; the
//! registry, onboarding, billing, and health routes are tenant-free by
//! construction.

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};

use crate::context::{BillingContext, OnboardingContext, StoreContext, TenantsContext};
use crate::handlers;
use vitrine_config::domains::server::CorsConfig;
use vitrine_web::{
    audit_middleware, auth_middleware, cors_layer, idempotency_middleware, rate_limit_middleware,
    request_id_middleware, tenant_middleware, AdmissionState, AuditState, AuthState, TenantResolver,
};

/// Everything the router needs, wired by the server's service container
#[derive(Clone)]
pub struct AppContext {
    pub tenants: TenantsContext,
    pub onboarding: OnboardingContext,
    pub billing: BillingContext,
    pub store: StoreContext,
    pub auth_state: AuthState,
    pub admission_state: AdmissionState,
    pub audit_state: AuditState,
    pub tenant_resolver: TenantResolver,
    pub cors: CorsConfig,
}

/// Build the complete REST application
pub fn create_rest_app(ctx: AppContext) -> Router {
    let tenant_routes = Router::new()
        .route("/tenant/by-domain", get(handlers::tenants::get_by_domain))
        .route("/tenant/code/{code}", get(handlers::tenants::get_by_code))
        .route("/tenant/list", get(handlers::tenants::list))
        .route("/tenant/create", post(handlers::tenants::create))
        .route("/tenant/my", get(handlers::tenants::my_tenant))
        .route(
            "/tenant/my/update",
            put(handlers::tenants::my_update).post(handlers::tenants::my_update),
        )
        .route("/tenant/{id}", get(handlers::tenants::get_by_id))
        .route(
            "/tenant/{id}/update",
            put(handlers::tenants::update).post(handlers::tenants::update),
        )
        .route("/tenant/{id}/delete", delete(handlers::tenants::delete))
        .with_state(ctx.tenants.clone());

    let onboarding_routes = Router::new()
        .route("/onboarding/check-slug", post(handlers::onboarding::check_slug))
        .route(
            "/onboarding/create-tenant-async",
            post(handlers::onboarding::create_tenant_async),
        )
        .route("/onboarding/job-status/{job_id}", get(handlers::onboarding::job_status))
        .with_state(ctx.onboarding.clone());

    let billing_routes = Router::new()
        .route(
            "/billing/create-checkout-session",
            post(handlers::billing::create_checkout_session),
        )
        .route(
            "/billing/create-portal-session",
            post(handlers::billing::create_portal_session),
        )
        .route("/billing/webhooks", post(handlers::billing::webhooks))
        .route("/billing/config", get(handlers::billing::config))
        .with_state(ctx.billing.clone());

    // Tenant-scoped storefront routes: resolver + status gate run here
    let store_routes = Router::new()
        .route("/store/products", get(handlers::store::list_products))
        .with_state(ctx.store.clone())
        .layer(middleware::from_fn_with_state(
            ctx.tenant_resolver.clone(),
            tenant_middleware,
        ));

    Router::new()
        .route("/health", get(handlers::health::health))
        .merge(tenant_routes)
        .merge(onboarding_routes)
        .merge(billing_routes)
        .merge(store_routes)
        .layer(middleware::from_fn_with_state(
            ctx.admission_state.clone(),
            idempotency_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            ctx.admission_state.clone(),
            rate_limit_middleware,
        ))
        .layer(middleware::from_fn_with_state(ctx.audit_state.clone(), audit_middleware))
        .layer(middleware::from_fn_with_state(ctx.auth_state.clone(), auth_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(cors_layer(&ctx.cors))
}
