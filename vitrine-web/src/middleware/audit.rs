//! Audit middleware
//!
//! Emits one structured audit entry for every mutating request. The logger
//! tees to the tracing pipeline (always, which feeds the forensic log file)
//! and to the audit table when a repository is attached. Audit failures are
//! swallowed and reported to the operator log; they never fail the
//! originating request.

use axum::{
    extract::Request,
    http::Method,
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

use crate::middleware::auth::AuthContext;
use crate::middleware::request_id::RequestId;
use crate::middleware::tenant::TenantContext;
use vitrine_api_types::UnifiedAuditEntry;
use vitrine_interfaces::RepositoryFactory;

/// Structured audit sink
pub struct AuditLogger {
    repositories: Option<Arc<dyn RepositoryFactory>>,
}

impl AuditLogger {
    pub fn new(repositories: Option<Arc<dyn RepositoryFactory>>) -> Self {
        Self { repositories }
    }

    /// Write an entry to every attached sink; never fails
    pub async fn log(&self, entry: UnifiedAuditEntry) {
        info!(
            target: "audit",
            action = %entry.action,
            actor = %entry.actor_login,
            tenant = ?entry.tenant_id,
            resource = %entry.resource_type,
            success = entry.success,
            request_id = %entry.request_id,
            "audit"
        );

        if let Some(repositories) = &self.repositories {
            if let Err(e) = repositories.audit_repository().append(entry).await {
                warn!(error = %e, "audit database write failed; entry preserved in log sink only");
            }
        }
    }
}

/// Shared state for the audit middleware
#[derive(Clone)]
pub struct AuditState {
    pub logger: Arc<AuditLogger>,
}

pub async fn audit_middleware(
    axum::extract::State(state): axum::extract::State<AuditState>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    if !is_mutating(&method) {
        return next.run(request).await;
    }

    let path = request.uri().path().to_string();
    let auth = request
        .extensions()
        .get::<Arc<AuthContext>>()
        .map(|ctx| ctx.as_ref().clone())
        .unwrap_or_default();
    let tenant_id = request
        .extensions()
        .get::<Arc<TenantContext>>()
        .map(|ctx| ctx.tenant.id.clone());
    let request_id = request
        .extensions()
        .get::<Arc<RequestId>>()
        .map(|id| id.as_str().to_string())
        .unwrap_or_default();
    let ip = request
        .headers()
        .get("X-Forwarded-For")
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string());
    let user_agent = request
        .headers()
        .get(axum::http::header::USER_AGENT)
        .and_then(|h| h.to_str().ok())
        .map(str::to_string);

    let response = next.run(request).await;

    let entry = UnifiedAuditEntry {
        timestamp: Utc::now(),
        actor_id: auth.user_id,
        actor_login: auth.login,
        tenant_id,
        action: format!("{} {}", method, path),
        resource_type: resource_type_of(&path),
        resource_id: None,
        ip,
        user_agent,
        success: response.status().is_success(),
        details: serde_json::json!({"status": response.status().as_u16()}),
        request_id,
    };
    state.logger.log(entry).await;

    response
}

fn is_mutating(method: &Method) -> bool {
    matches!(*method, Method::POST | Method::PUT | Method::PATCH | Method::DELETE)
}

fn resource_type_of(path: &str) -> String {
    path.trim_start_matches('/')
        .split('/')
        .next()
        .unwrap_or("unknown")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use vitrine_api_types::{ApiId, PaginationInput};
    use vitrine_interfaces::RepositoryFactory as _;
    use vitrine_storage::testing::InMemoryRepositoryFactory;

    fn entry(tenant_id: i32, action: &str) -> UnifiedAuditEntry {
        UnifiedAuditEntry {
            timestamp: Utc::now(),
            actor_id: Some(1),
            actor_login: "alex".to_string(),
            tenant_id: Some(ApiId::from_i32(tenant_id)),
            action: action.to_string(),
            resource_type: "tenant".to_string(),
            resource_id: None,
            ip: Some("10.0.0.1".to_string()),
            user_agent: None,
            success: true,
            details: serde_json::json!({"status": 200}),
            request_id: "req-1".to_string(),
        }
    }

    #[tokio::test]
    async fn test_logger_writes_to_database_sink() {
        let factory = Arc::new(InMemoryRepositoryFactory::new());
        let logger = AuditLogger::new(Some(factory.clone()));

        logger.log(entry(7, "POST /tenant/7/update")).await;
        logger.log(entry(7, "DELETE /tenant/7/delete")).await;

        let entries = factory
            .audit_repository()
            .list_for_tenant(7, PaginationInput::default())
            .await
            .unwrap();
        assert_eq!(entries.meta.total, 2);
        assert_eq!(entries.items[0].action, "POST /tenant/7/update");
    }

    #[tokio::test]
    async fn test_logger_without_database_never_fails() {
        let logger = AuditLogger::new(None);
        logger.log(entry(1, "POST /x")).await;
    }

    #[test]
    fn test_resource_type_extraction() {
        assert_eq!(resource_type_of("/tenant/create"), "tenant");
        assert_eq!(resource_type_of("/billing/webhooks"), "billing");
        assert_eq!(resource_type_of("/"), "");
    }
}
