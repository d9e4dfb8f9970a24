//! End-to-end tenant lifecycle: signup, provisioning, billing
//! reconciliation, isolation

use std::sync::Arc;

use vitrine_api_types::{BillingCycle, JobState, SubscriptionState, TenantStatus};
use vitrine_billing::{BillingService, MockBillingGateway, StripeEvent, WebhookProcessor};
use vitrine_config::{BillingConfig, ProvisioningConfig};
use vitrine_core::DEFAULT_STEP_PLAN;
use vitrine_interfaces::database::CreateTenantInput;
use vitrine_interfaces::RepositoryFactory;
use vitrine_provisioning::{default_steps, ProvisioningEngine};
use vitrine_storage::testing::InMemoryRepositoryFactory;

struct Platform {
    factory: Arc<InMemoryRepositoryFactory>,
    engine: ProvisioningEngine,
    processor: WebhookProcessor,
    billing: BillingService,
}

fn platform() -> Platform {
    let factory = Arc::new(InMemoryRepositoryFactory::new());
    factory.seed_default_plans();

    let gateway = Arc::new(MockBillingGateway::new());
    let billing_config = BillingConfig {
        secret_key: Some("sk_test_123".to_string()),
        publishable_key: Some("pk_test_123".to_string()),
        webhook_secret: Some("whsec_123".to_string()),
        ..Default::default()
    };

    let repositories: Arc<dyn RepositoryFactory> = factory.clone();
    Platform {
        factory: factory.clone(),
        engine: ProvisioningEngine::new(
            repositories.clone(),
            default_steps(repositories.clone(), Some(gateway.clone())),
            ProvisioningConfig::default(),
        ),
        processor: WebhookProcessor::new(repositories.clone()),
        billing: BillingService::new(repositories, gateway, billing_config),
    }
}

async fn signup(p: &Platform, slug: &str) -> i32 {
    let tenant = p
        .factory
        .tenant_repository()
        .create(
            CreateTenantInput {
                code: slug.to_string(),
                name: "Ma Boutique".to_string(),
                email: Some("o@x.com".to_string()),
                plan_code: "starter".to_string(),
                billing_cycle: Some("monthly".to_string()),
                alternate_domains: Vec::new(),
            },
            format!("{slug}.shops.vitrine.dev"),
        )
        .await
        .unwrap();
    let tenant_id = tenant.id.as_i32().unwrap();
    p.factory
        .job_repository()
        .create(tenant_id, DEFAULT_STEP_PLAN.iter().map(|s| s.to_string()).collect())
        .await
        .unwrap();
    tenant_id
}

fn event(id: &str, event_type: &str, created: i64, object: serde_json::Value) -> StripeEvent {
    serde_json::from_value(serde_json::json!({
        "id": id, "type": event_type, "created": created, "data": {"object": object}
    }))
    .unwrap()
}

#[tokio::test]
async fn test_full_lifecycle_signup_to_recovery() {
    let p = platform();
    let tenant_id = signup(&p, "ma-boutique").await;

    // Provisioning drives the tenant to active with a complete environment
    p.engine.process_batch().await.unwrap();
    let job = p.factory.job_repository().find_by_tenant(tenant_id).await.unwrap().unwrap();
    assert_eq!(job.state, JobState::Succeeded);
    assert_eq!(job.progress, 100);

    let tenant = p.factory.tenant_repository().find_by_id(tenant_id).await.unwrap().unwrap();
    assert_eq!(tenant.status, TenantStatus::Active);
    assert!(tenant.company_id.is_some());
    assert!(tenant.provider_customer_id.is_some(), "payment step registered the customer");
    assert_eq!(p.factory.catalog_repository().count_for_tenant(tenant.uuid).await.unwrap(), 3);
    assert!(p
        .factory
        .tenant_repository()
        .find_by_domain("ma-boutique.shops.vitrine.dev")
        .await
        .unwrap()
        .is_some());

    // Checkout -> webhook -> subscription active
    let session = p
        .billing
        .create_checkout_session("ma-boutique", "starter", BillingCycle::Monthly)
        .await
        .unwrap();
    assert!(!session.url.is_empty());

    p.processor
        .process(&event(
            "evt_1",
            "checkout.session.completed",
            1_700_000_000,
            serde_json::json!({
                "id": "cs_1", "customer": "cus_1", "subscription": "sub_1",
                "metadata": {"tenant_code": "ma-boutique", "plan_code": "starter", "billing_cycle": "monthly"}
            }),
        ))
        .await
        .unwrap();
    let subscription = p
        .factory
        .subscription_repository()
        .find_by_tenant(tenant_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(subscription.state, SubscriptionState::Active);

    // Payment failure then recovery; next billing date advances
    p.processor
        .process(&event(
            "evt_2",
            "invoice.payment_failed",
            1_700_000_100,
            serde_json::json!({"id": "in_1", "customer": "cus_1", "subscription": "sub_1"}),
        ))
        .await
        .unwrap();
    let subscription = p
        .factory
        .subscription_repository()
        .find_by_tenant(tenant_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(subscription.state, SubscriptionState::PastDue);

    p.processor
        .process(&event(
            "evt_3",
            "invoice.paid",
            1_700_000_200,
            serde_json::json!({"id": "in_2", "customer": "cus_1", "subscription": "sub_1"}),
        ))
        .await
        .unwrap();
    let subscription = p
        .factory
        .subscription_repository()
        .find_by_tenant(tenant_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(subscription.state, SubscriptionState::Active);
    let next = subscription.next_billing_date.unwrap();
    let days_ahead = (next - chrono::Utc::now()).num_days();
    assert!((29..=30).contains(&days_ahead), "monthly cycle advances ~30 days");
}

#[tokio::test]
async fn test_concurrent_signups_one_winner() {
    let p = platform();

    let input = |name: &str| CreateTenantInput {
        code: "acme".to_string(),
        name: name.to_string(),
        email: None,
        plan_code: "starter".to_string(),
        billing_cycle: None,
        alternate_domains: Vec::new(),
    };
    let repo_a = p.factory.clone();
    let repo_b = p.factory.clone();
    let input_a = input("A");
    let input_b = input("B");
    let (a, b) = tokio::join!(
        async move {
            repo_a
                .tenant_repository()
                .create(input_a, "acme.shops.vitrine.dev".to_string())
                .await
        },
        async move {
            repo_b
                .tenant_repository()
                .create(input_b, "acme.shops.vitrine.dev".to_string())
                .await
        },
    );

    assert!(a.is_ok() ^ b.is_ok(), "exactly one signup wins");
    assert!(p.factory.tenant_repository().find_by_code("acme").await.unwrap().is_some());
}

#[tokio::test]
async fn test_tenant_isolation_per_tenant_catalogs() {
    let p = platform();
    let a = signup(&p, "shop-a").await;
    let b = signup(&p, "shop-b").await;
    p.engine.process_batch().await.unwrap();

    let tenant_a = p.factory.tenant_repository().find_by_id(a).await.unwrap().unwrap();
    let tenant_b = p.factory.tenant_repository().find_by_id(b).await.unwrap().unwrap();

    // Each tenant observes exactly its own catalog; a query without a
    // tenant binding observes nothing
    assert_eq!(p.factory.catalog_repository().count_for_tenant(tenant_a.uuid).await.unwrap(), 3);
    assert_eq!(p.factory.catalog_repository().count_for_tenant(tenant_b.uuid).await.unwrap(), 3);
    assert_eq!(
        p.factory
            .catalog_repository()
            .count_for_tenant(uuid::Uuid::nil())
            .await
            .unwrap(),
        0
    );
}

#[tokio::test]
async fn test_provisioning_failure_retry_and_archive() {
    let p = platform();
    let tenant_id = signup(&p, "acme").await;
    let job = p.factory.job_repository().find_by_tenant(tenant_id).await.unwrap().unwrap();
    let job_id = job.id.as_i32().unwrap();

    // Failing a job and retrying converges to the same terminal state a
    // clean run reaches
    p.factory
        .job_repository()
        .claim(job_id)
        .await
        .unwrap();
    p.factory
        .job_repository()
        .mark_failed(job_id, serde_json::json!({"kind": "billing", "message": "x", "step": "configure-payment"}))
        .await
        .unwrap();

    p.factory.job_repository().retry(job_id).await.unwrap();
    p.engine.process_batch().await.unwrap();
    let job = p.factory.job_repository().find_by_tenant(tenant_id).await.unwrap().unwrap();
    assert_eq!(job.state, JobState::Succeeded);
    assert_eq!(job.progress, 100);

    let tenant = p.factory.tenant_repository().find_by_id(tenant_id).await.unwrap().unwrap();
    assert_eq!(tenant.status, TenantStatus::Active);

    // Archive is soft and terminal
    let archived = p.factory.tenant_repository().archive(tenant_id).await.unwrap();
    assert_eq!(archived.status, TenantStatus::Archived);
    assert!(!archived.active);
    let err = p
        .factory
        .tenant_repository()
        .transition_status(tenant_id, TenantStatus::Active)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("transition"));
}

#[tokio::test]
async fn test_webhook_replay_storm_converges() {
    let p = platform();
    let tenant_id = signup(&p, "acme").await;
    p.engine.process_batch().await.unwrap();

    let completed = event(
        "evt_dup",
        "checkout.session.completed",
        1_700_000_000,
        serde_json::json!({
            "id": "cs_1", "customer": "cus_1", "subscription": "sub_1",
            "metadata": {"tenant_code": "acme", "plan_code": "starter", "billing_cycle": "monthly"}
        }),
    );
    for _ in 0..5 {
        p.processor.process(&completed).await.unwrap();
    }

    let subscription = p
        .factory
        .subscription_repository()
        .find_by_tenant(tenant_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(subscription.state, SubscriptionState::Active);
    assert_eq!(subscription.provider_subscription_id.as_deref(), Some("sub_1"));
}
