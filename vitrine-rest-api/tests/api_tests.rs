//! REST API integration tests over in-memory repositories

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use vitrine_billing::{BillingService, MockBillingGateway, WebhookProcessor};
use vitrine_config::domains::server::CorsConfig;
use vitrine_config::{AdmissionConfig, AuthConfig, BillingConfig, PlatformConfig, ProvisioningConfig};
use vitrine_interfaces::RepositoryFactory;
use vitrine_provisioning::{default_steps, ProvisioningEngine};
use vitrine_rest_api::{create_rest_app, AppContext, BillingContext, OnboardingContext, StoreContext, TenantsContext};
use vitrine_storage::testing::InMemoryRepositoryFactory;
use vitrine_web::{
    AdmissionState, AuditLogger, AuditState, AuthState, DomainCache, InMemoryAdmissionStore, JwtManager,
    TenantResolver,
};

struct Harness {
    app: Router,
    factory: Arc<InMemoryRepositoryFactory>,
    engine: ProvisioningEngine,
    jwt: JwtManager,
}

fn harness() -> Harness {
    let factory = Arc::new(InMemoryRepositoryFactory::new());
    factory.seed_default_plans();

    let platform = PlatformConfig::default();
    let auth_config = AuthConfig::default();
    let billing_config = BillingConfig {
        secret_key: Some("sk_test_123".to_string()),
        publishable_key: Some("pk_test_123".to_string()),
        webhook_secret: Some("whsec_test123".to_string()),
        ..Default::default()
    };

    let repositories: Arc<dyn RepositoryFactory> = factory.clone();
    let gateway = Arc::new(MockBillingGateway::new());
    let billing_service = Arc::new(BillingService::new(
        repositories.clone(),
        gateway.clone(),
        billing_config.clone(),
    ));
    let processor = Arc::new(WebhookProcessor::new(repositories.clone()));
    let domain_cache = Arc::new(DomainCache::default());
    let jwt = JwtManager::new(auth_config.clone());

    let context = AppContext {
        tenants: TenantsContext::new(
            repositories.clone(),
            platform.clone(),
            domain_cache.clone(),
            auth_config.superuser_login.clone(),
        ),
        onboarding: OnboardingContext::new(repositories.clone(), platform.clone()),
        billing: BillingContext {
            repositories: repositories.clone(),
            service: billing_service,
            processor,
            webhook_secret: billing_config.webhook_secret.clone(),
        },
        store: StoreContext {
            repositories: repositories.clone(),
        },
        auth_state: AuthState {
            jwt: Arc::new(JwtManager::new(auth_config.clone())),
        },
        admission_state: AdmissionState::new(
            Arc::new(InMemoryAdmissionStore::new(1000)),
            AdmissionConfig::default(),
        ),
        audit_state: AuditState {
            logger: Arc::new(AuditLogger::new(Some(repositories.clone()))),
        },
        tenant_resolver: TenantResolver::new(
            repositories.clone(),
            platform,
            auth_config.superuser_login.clone(),
            domain_cache,
        ),
        cors: CorsConfig::default(),
    };

    let engine = ProvisioningEngine::new(
        repositories.clone(),
        default_steps(repositories, None),
        ProvisioningConfig::default(),
    );

    Harness {
        app: create_rest_app(context),
        factory,
        engine,
        jwt,
    }
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn signup_body(slug: &str) -> Value {
    json!({"name": "Ma Boutique", "slug": slug, "email": "o@x.com", "plan": "starter"})
}

#[tokio::test]
async fn test_signup_happy_path() {
    let h = harness();

    let (status, body) = send(&h.app, post_json("/onboarding/create-tenant-async", signup_body("ma-boutique"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["tenant_code"], json!("ma-boutique"));
    let job_id = body["job_id"].as_str().unwrap().to_string();

    // Queued, 0% before the worker runs
    let (status, body) = send(&h.app, get(&format!("/onboarding/job-status/{job_id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["job"]["state"], json!("queued"));
    assert_eq!(body["job"]["progress"], json!(0));
    assert_eq!(body["job"]["n_steps"], json!(6));

    h.engine.process_batch().await.unwrap();

    let (_, body) = send(&h.app, get(&format!("/onboarding/job-status/{job_id}"))).await;
    assert_eq!(body["job"]["state"], json!("succeeded"));
    assert_eq!(body["job"]["progress"], json!(100));

    // Tenant is active and resolvable by its platform domain
    let (status, body) = send(
        &h.app,
        get("/tenant/by-domain?domain=ma-boutique.shops.vitrine.dev"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tenant"]["status"], json!("active"));
    assert_eq!(body["tenant"]["code"], json!("ma-boutique"));
}

#[tokio::test]
async fn test_duplicate_slug_conflicts() {
    let h = harness();

    let (status, _) = send(&h.app, post_json("/onboarding/create-tenant-async", signup_body("acme"))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&h.app, post_json("/onboarding/create-tenant-async", signup_body("acme"))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["error_code"], json!("DUPLICATE_KEY"));

    // Exactly one tenant exists under the slug
    assert!(h.factory.tenant_repository().find_by_code("acme").await.unwrap().is_some());
}

#[tokio::test]
async fn test_signup_validation_errors() {
    let h = harness();

    let (status, body) = send(
        &h.app,
        post_json("/onboarding/create-tenant-async", json!({"name": "X", "plan": "starter"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_code"], json!("MISSING_FIELD"));

    let (status, body) = send(
        &h.app,
        post_json(
            "/onboarding/create-tenant-async",
            json!({"name": "X", "slug": "Bad Slug!", "plan": "starter"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_code"], json!("INVALID_FIELD"));

    let (status, body) = send(
        &h.app,
        post_json(
            "/onboarding/create-tenant-async",
            json!({"name": "X", "slug": "okslug", "plan": "no-such-plan"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_code"], json!("INVALID_FIELD"));
}

#[tokio::test]
async fn test_check_slug_availability() {
    let h = harness();

    let (_, body) = send(&h.app, post_json("/onboarding/check-slug", json!({"slug": "acme"}))).await;
    assert_eq!(body["available"], json!(true));

    send(&h.app, post_json("/onboarding/create-tenant-async", signup_body("acme"))).await;

    let (_, body) = send(&h.app, post_json("/onboarding/check-slug", json!({"slug": "acme"}))).await;
    assert_eq!(body["available"], json!(false));

    let (_, body) = send(&h.app, post_json("/onboarding/check-slug", json!({"slug": "Bad!"}))).await;
    assert_eq!(body["available"], json!(false));
}

#[tokio::test]
async fn test_admin_routes_require_admin_role() {
    let h = harness();

    let (status, body) = send(&h.app, get("/tenant/list")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error_code"], json!("AUTH_REQUIRED"));

    let user_token = h
        .jwt
        .generate_token(5, "merchant", vitrine_api_types::UserRole::User, Some(2))
        .unwrap();
    let request = Request::builder()
        .uri("/tenant/list")
        .header(header::AUTHORIZATION, format!("Bearer {user_token}"))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&h.app, request).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error_code"], json!("FORBIDDEN"));

    let admin_token = h
        .jwt
        .generate_token(1, "root", vitrine_api_types::UserRole::Admin, None)
        .unwrap();
    let request = Request::builder()
        .uri("/tenant/list")
        .header(header::AUTHORIZATION, format!("Bearer {admin_token}"))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&h.app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["tenants"].is_array());
}

#[tokio::test]
async fn test_my_update_rejects_protected_fields() {
    let h = harness();
    send(&h.app, post_json("/onboarding/create-tenant-async", signup_body("acme"))).await;
    h.engine.process_batch().await.unwrap();

    let tenant = h.factory.tenant_repository().find_by_code("acme").await.unwrap().unwrap();
    let company_id = tenant.company_id.unwrap();
    let token = h
        .jwt
        .generate_token(5, "merchant", vitrine_api_types::UserRole::User, Some(company_id))
        .unwrap();

    // Branding edit passes
    let request = Request::builder()
        .method(Method::POST)
        .uri("/tenant/my/update")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::from(json!({"primary_color": "#ff0000"}).to_string()))
        .unwrap();
    let (status, body) = send(&h.app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tenant"]["primary_color"], json!("#ff0000"));

    // Protected field rejected with FORBIDDEN
    let request = Request::builder()
        .method(Method::POST)
        .uri("/tenant/my/update")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::from(json!({"status": "archived"}).to_string()))
        .unwrap();
    let (status, body) = send(&h.app, request).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error_code"], json!("FORBIDDEN"));
}

#[tokio::test]
async fn test_tenant_json_contract() {
    let h = harness();
    send(&h.app, post_json("/onboarding/create-tenant-async", signup_body("acme"))).await;

    let (_, body) = send(&h.app, get("/tenant/code/acme")).await;
    let tenant = &body["tenant"];
    for field in [
        "id",
        "code",
        "name",
        "domain",
        "alternate_domains",
        "primary_color",
        "logo_url",
        "favicon_url",
        "email",
        "phone",
        "feature_flags",
        "plan_code",
        "status",
        "active",
    ] {
        assert!(tenant.get(field).is_some(), "tenant JSON missing {field}");
    }
    assert_eq!(tenant["feature_flags"]["wishlist"], json!(true));
    assert_eq!(tenant["feature_flags"]["guest_checkout"], json!(true));
}

#[tokio::test]
async fn test_webhook_signature_enforced() {
    let h = harness();
    send(&h.app, post_json("/onboarding/create-tenant-async", signup_body("acme"))).await;

    let event = json!({
        "id": "evt_1",
        "type": "checkout.session.completed",
        "created": chrono::Utc::now().timestamp(),
        "data": {"object": {
            "id": "cs_1", "customer": "cus_1", "subscription": "sub_1",
            "metadata": {"tenant_code": "acme", "plan_code": "starter", "billing_cycle": "monthly"}
        }}
    })
    .to_string();

    // Missing signature header
    let request = Request::builder()
        .method(Method::POST)
        .uri("/billing/webhooks")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(event.clone()))
        .unwrap();
    let (status, body) = send(&h.app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_code"], json!("INVALID_SIGNATURE"));

    // Valid signature activates the tenant
    let timestamp = chrono::Utc::now().timestamp();
    let signature = sign_webhook(event.as_bytes(), "whsec_test123", timestamp);
    let request = Request::builder()
        .method(Method::POST)
        .uri("/billing/webhooks")
        .header(header::CONTENT_TYPE, "application/json")
        .header("Stripe-Signature", format!("t={timestamp},v1={signature}"))
        .body(Body::from(event))
        .unwrap();
    let (status, body) = send(&h.app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["received"], json!(true));

    let tenant = h.factory.tenant_repository().find_by_code("acme").await.unwrap().unwrap();
    assert_eq!(tenant.status, vitrine_api_types::TenantStatus::Active);
}

fn sign_webhook(payload: &[u8], secret: &str, timestamp: i64) -> String {
    use hmac::{Hmac, Mac};
    use sha2::Sha256;
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(format!("{timestamp}.").as_bytes());
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

#[tokio::test]
async fn test_billing_config_exposes_publishable_key() {
    let h = harness();
    let (status, body) = send(&h.app, get("/billing/config")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["publishable_key"], json!("pk_test_mock"));
}

#[tokio::test]
async fn test_checkout_session_endpoint() {
    let h = harness();
    send(&h.app, post_json("/onboarding/create-tenant-async", signup_body("acme"))).await;

    let (status, body) = send(
        &h.app,
        post_json(
            "/billing/create-checkout-session",
            json!({"tenant_code": "acme", "plan": "starter", "billing_cycle": "monthly"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["checkout_url"].as_str().unwrap().starts_with("https://checkout.mock/"));
    assert!(body["session_id"].as_str().is_some());
}

#[tokio::test]
async fn test_store_routes_resolve_tenant_and_gate_status() {
    let h = harness();
    send(&h.app, post_json("/onboarding/create-tenant-async", signup_body("acme"))).await;

    // Still provisioning: 409
    let request = Request::builder()
        .uri("/store/products")
        .header(header::HOST, "acme.shops.vitrine.dev")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&h.app, request).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error_code"], json!("TENANT_PROVISIONING"));

    h.engine.process_batch().await.unwrap();

    // Active: port/case variations on the Host header still match
    let request = Request::builder()
        .uri("/store/products")
        .header(header::HOST, "ACME.Shops.Vitrine.Dev:8443")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&h.app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tenant_code"], json!("acme"));
    assert_eq!(body["products"].as_array().unwrap().len(), 3);

    // Unknown domain: 404
    let request = Request::builder()
        .uri("/store/products")
        .header(header::HOST, "nobody.example.com")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&h.app, request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error_code"], json!("TENANT_NOT_FOUND"));

    // X-Tenant-Code from an untrusted client is ignored
    let request = Request::builder()
        .uri("/store/products")
        .header(header::HOST, "nobody.example.com")
        .header("X-Tenant-Code", "acme")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&h.app, request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Archived tenants answer 404 as if absent
    let tenant = h.factory.tenant_repository().find_by_code("acme").await.unwrap().unwrap();
    h.factory
        .tenant_repository()
        .archive(tenant.id.as_i32().unwrap())
        .await
        .unwrap();
    let request = Request::builder()
        .uri("/store/products")
        .header(header::HOST, "acme.shops.vitrine.dev")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&h.app, request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_request_id_echoed_on_response() {
    let h = harness();
    let response = h
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("X-Request-ID", "req-abc-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.headers().get("X-Request-ID").unwrap(), "req-abc-123");
}
