//! Tenant resolution middleware and status gate
//!
//! Converts a request into exactly one `(tenant, resolution)` pair before
//! any tenant-scoped work runs, first match wins:
//!
//! 1. `X-Tenant-Code` header, honored only for internal service callers
//! 2. Host domain, case-folded and port-stripped, against primary and
//!    alternate domains (fronted by a short-TTL cache)
//! 3. The authenticated user's linked company, with lazy idempotent
//!    creation of `admin-<company_id>` for the platform super-user
//!
//! Routes mounted without this middleware are tenant-free by construction
//! (onboarding, platform admin, webhooks, health).

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, HeaderMap, Method},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

use crate::errors::WebError;
use crate::middleware::auth::AuthContext;
use vitrine_api_types::{TenantStatus, UnifiedTenant};
use vitrine_config::PlatformConfig;
use vitrine_core::normalize_domain;
use vitrine_interfaces::RepositoryFactory;

/// Trusted only when the caller is an internal service
pub const TENANT_CODE_HEADER: &str = "X-Tenant-Code";

/// How the tenant was resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TenantResolution {
    Header,
    Domain,
    UserCompany,
    SuperUser,
}

/// Resolved tenant attached to the request
#[derive(Debug, Clone)]
pub struct TenantContext {
    pub tenant: UnifiedTenant,
    pub resolution: TenantResolution,
}

/// Short-TTL cache for `domain -> tenant id` lookups.
///
/// Only the identity mapping is cached; the tenant record itself is
/// re-read on every hit so status transitions are observed immediately.
/// Any tenant domain mutation bumps the generation counter, which
/// invalidates every cached entry at once; the TTL bounds staleness for
/// mutations the process never observes.
pub struct DomainCache {
    ttl: Duration,
    generation: AtomicU64,
    entries: Mutex<HashMap<String, CachedLookup>>,
}

struct CachedLookup {
    cached_at: Instant,
    generation: u64,
    /// `None` caches a miss
    tenant_id: Option<i32>,
}

impl DomainCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            generation: AtomicU64::new(0),
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub async fn get(&self, domain: &str) -> Option<Option<i32>> {
        let generation = self.generation.load(Ordering::Acquire);
        let entries = self.entries.lock().await;
        entries
            .get(domain)
            .filter(|e| e.generation == generation && e.cached_at.elapsed() < self.ttl)
            .map(|e| e.tenant_id)
    }

    pub async fn put(&self, domain: String, tenant_id: Option<i32>) {
        let generation = self.generation.load(Ordering::Acquire);
        self.entries.lock().await.insert(
            domain,
            CachedLookup {
                cached_at: Instant::now(),
                generation,
                tenant_id,
            },
        );
    }

    /// Invalidate every entry; called on any tenant domain mutation
    pub fn invalidate_all(&self) {
        self.generation.fetch_add(1, Ordering::Release);
    }
}

impl Default for DomainCache {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

/// Tenant resolver service used as middleware state
#[derive(Clone)]
pub struct TenantResolver {
    repositories: Arc<dyn RepositoryFactory>,
    platform: PlatformConfig,
    superuser_login: String,
    cache: Arc<DomainCache>,
}

impl TenantResolver {
    pub fn new(
        repositories: Arc<dyn RepositoryFactory>,
        platform: PlatformConfig,
        superuser_login: String,
        cache: Arc<DomainCache>,
    ) -> Self {
        Self {
            repositories,
            platform,
            superuser_login,
            cache,
        }
    }

    pub fn cache(&self) -> &Arc<DomainCache> {
        &self.cache
    }

    /// Resolve the request to at most one tenant
    pub async fn resolve(&self, headers: &HeaderMap, auth: &AuthContext) -> Result<Option<TenantContext>, WebError> {
        // 1. Explicit header, internal services only; silently ignored for
        //    everything else
        if let Some(code) = headers.get(TENANT_CODE_HEADER).and_then(|h| h.to_str().ok()) {
            if auth.is_internal_service() {
                if let Some(tenant) = self.repositories.tenant_repository().find_by_code(code.trim()).await? {
                    return Ok(Some(TenantContext {
                        tenant,
                        resolution: TenantResolution::Header,
                    }));
                }
                return Ok(None);
            }
            debug!("ignoring tenant-code header from untrusted caller");
        }

        // 2. Host domain
        if let Some(host) = headers.get(axum::http::header::HOST).and_then(|h| h.to_str().ok()) {
            let domain = normalize_domain(host);
            if !domain.is_empty() {
                if let Some(tenant) = self.lookup_domain(&domain).await? {
                    return Ok(Some(TenantContext {
                        tenant,
                        resolution: TenantResolution::Domain,
                    }));
                }
            }
        }

        // 3. Authenticated user's linked company
        if let Some(company_id) = auth.company_id.filter(|_| auth.is_authenticated) {
            if let Some(tenant) = self.repositories.tenant_repository().find_by_company(company_id).await? {
                return Ok(Some(TenantContext {
                    tenant,
                    resolution: TenantResolution::UserCompany,
                }));
            }
            if auth.login == self.superuser_login {
                let code = format!("admin-{}", company_id);
                let domain = self.platform.default_domain_for(&code);
                let tenant = self
                    .repositories
                    .tenant_repository()
                    .ensure_admin_tenant(company_id, domain)
                    .await?;
                return Ok(Some(TenantContext {
                    tenant,
                    resolution: TenantResolution::SuperUser,
                }));
            }
        }

        Ok(None)
    }

    async fn lookup_domain(&self, domain: &str) -> Result<Option<UnifiedTenant>, WebError> {
        if let Some(cached) = self.cache.get(domain).await {
            return match cached {
                Some(id) => Ok(self.repositories.tenant_repository().find_by_id(id).await?),
                None => Ok(None),
            };
        }
        let tenant = self.repositories.tenant_repository().find_by_domain(domain).await?;
        self.cache
            .put(domain.to_string(), tenant.as_ref().and_then(|t| t.id.as_i32()))
            .await;
        Ok(tenant)
    }
}

/// Resolve the tenant and enforce the status gate on tenant-scoped routes.
///
/// Gate: archived tenants answer 404 as if they did not exist; provisioning
/// tenants answer 409; suspended tenants accept reads and reject writes.
pub async fn tenant_middleware(
    State(resolver): State<TenantResolver>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth = request
        .extensions()
        .get::<Arc<AuthContext>>()
        .map(|ctx| ctx.as_ref().clone())
        .unwrap_or_default();

    let resolved = match resolver.resolve(request.headers(), &auth).await {
        Ok(resolved) => resolved,
        Err(err) => return err.into_response(),
    };

    let Some(context) = resolved else {
        return WebError::tenant_not_found().into_response();
    };

    if !context.tenant.active || context.tenant.status == TenantStatus::Archived {
        return WebError::tenant_not_found().into_response();
    }
    match context.tenant.status {
        TenantStatus::Provisioning => {
            return WebError::tenant_provisioning().into_response();
        }
        TenantStatus::Suspended if !is_read_only(request.method()) => {
            return WebError::tenant_suspended().into_response();
        }
        _ => {}
    }

    request.extensions_mut().insert(Arc::new(context));
    next.run(request).await
}

fn is_read_only(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

impl<S> FromRequestParts<S> for TenantContext
where
    S: Send + Sync,
{
    type Rejection = WebError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Arc<TenantContext>>()
            .map(|ctx| ctx.as_ref().clone())
            .ok_or_else(WebError::tenant_not_found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vitrine_api_types::UserRole;
    use vitrine_interfaces::database::CreateTenantInput;
    use vitrine_interfaces::RepositoryFactory as _;
    use vitrine_storage::testing::InMemoryRepositoryFactory;

    fn resolver(factory: Arc<InMemoryRepositoryFactory>) -> TenantResolver {
        TenantResolver::new(
            factory,
            PlatformConfig::default(),
            "platform-admin".to_string(),
            Arc::new(DomainCache::default()),
        )
    }

    async fn seed_tenant(factory: &InMemoryRepositoryFactory, code: &str) -> UnifiedTenant {
        factory
            .tenant_repository()
            .create(
                CreateTenantInput {
                    code: code.to_string(),
                    name: code.to_string(),
                    email: None,
                    plan_code: "starter".to_string(),
                    billing_cycle: None,
                    alternate_domains: vec![format!("www.{code}.example")],
                },
                format!("{code}.shops.test"),
            )
            .await
            .unwrap()
    }

    fn service_auth() -> AuthContext {
        AuthContext {
            user_id: Some(99),
            login: "edge-proxy".to_string(),
            role: UserRole::Service,
            company_id: None,
            is_authenticated: true,
        }
    }

    #[tokio::test]
    async fn test_domain_resolution_is_case_and_port_insensitive() {
        let factory = Arc::new(InMemoryRepositoryFactory::new());
        seed_tenant(&factory, "acme").await;
        let resolver = resolver(factory);

        let mut headers = HeaderMap::new();
        headers.insert(axum::http::header::HOST, "ACME.Shops.Test:8443".parse().unwrap());
        let resolved = resolver.resolve(&headers, &AuthContext::default()).await.unwrap().unwrap();
        assert_eq!(resolved.tenant.code, "acme");
        assert_eq!(resolved.resolution, TenantResolution::Domain);
    }

    #[tokio::test]
    async fn test_alternate_domain_resolves() {
        let factory = Arc::new(InMemoryRepositoryFactory::new());
        seed_tenant(&factory, "acme").await;
        let resolver = resolver(factory);

        let mut headers = HeaderMap::new();
        headers.insert(axum::http::header::HOST, "www.acme.example".parse().unwrap());
        let resolved = resolver.resolve(&headers, &AuthContext::default()).await.unwrap();
        assert_eq!(resolved.unwrap().tenant.code, "acme");
    }

    #[tokio::test]
    async fn test_unknown_domain_resolves_to_none() {
        let factory = Arc::new(InMemoryRepositoryFactory::new());
        let resolver = resolver(factory);

        let mut headers = HeaderMap::new();
        headers.insert(axum::http::header::HOST, "nobody.example".parse().unwrap());
        assert!(resolver.resolve(&headers, &AuthContext::default()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_header_trusted_only_for_services() {
        let factory = Arc::new(InMemoryRepositoryFactory::new());
        seed_tenant(&factory, "acme").await;
        let resolver = resolver(factory);

        let mut headers = HeaderMap::new();
        headers.insert(TENANT_CODE_HEADER, "acme".parse().unwrap());

        // Untrusted caller: header silently ignored, no other route matches
        assert!(resolver.resolve(&headers, &AuthContext::default()).await.unwrap().is_none());

        // Internal service: header honored
        let resolved = resolver.resolve(&headers, &service_auth()).await.unwrap().unwrap();
        assert_eq!(resolved.resolution, TenantResolution::Header);
        assert_eq!(resolved.tenant.code, "acme");
    }

    #[tokio::test]
    async fn test_superuser_lazy_tenant_is_idempotent() {
        let factory = Arc::new(InMemoryRepositoryFactory::new());
        let resolver = resolver(factory.clone());

        let auth = AuthContext {
            user_id: Some(1),
            login: "platform-admin".to_string(),
            role: UserRole::Admin,
            company_id: Some(42),
            is_authenticated: true,
        };
        let headers = HeaderMap::new();

        let first = resolver.resolve(&headers, &auth).await.unwrap().unwrap();
        assert_eq!(first.resolution, TenantResolution::SuperUser);
        assert_eq!(first.tenant.code, "admin-42");

        let second = resolver.resolve(&headers, &auth).await.unwrap().unwrap();
        assert_eq!(second.tenant.uuid, first.tenant.uuid);
    }

    #[tokio::test]
    async fn test_cache_invalidation_on_generation_bump() {
        let factory = Arc::new(InMemoryRepositoryFactory::new());
        let tenant = seed_tenant(&factory, "acme").await;
        let resolver = resolver(factory.clone());

        let mut headers = HeaderMap::new();
        headers.insert(axum::http::header::HOST, "acme.shops.test".parse().unwrap());
        resolver.resolve(&headers, &AuthContext::default()).await.unwrap().unwrap();

        // Move the tenant to a new primary domain and invalidate
        factory
            .tenant_repository()
            .update(
                tenant.id.as_i32().unwrap(),
                vitrine_api_types::TenantPatch {
                    domain: Some("boutique.shops.test".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        resolver.cache().invalidate_all();

        assert!(resolver.resolve(&headers, &AuthContext::default()).await.unwrap().is_none());
        let mut new_headers = HeaderMap::new();
        new_headers.insert(axum::http::header::HOST, "boutique.shops.test".parse().unwrap());
        assert!(resolver.resolve(&new_headers, &AuthContext::default()).await.unwrap().is_some());
    }
}
