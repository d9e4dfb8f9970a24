//! Webhook reconciliation and checkout orchestration tests

use std::sync::Arc;

use vitrine_api_types::{BillingCycle, SubscriptionState, TenantStatus};
use vitrine_billing::{BillingService, MockBillingGateway, StripeEvent, WebhookOutcome, WebhookProcessor};
use vitrine_config::BillingConfig;
use vitrine_interfaces::database::CreateTenantInput;
use vitrine_interfaces::{BillingError, RepositoryFactory};
use vitrine_storage::testing::InMemoryRepositoryFactory;

fn signup_input(code: &str) -> CreateTenantInput {
    CreateTenantInput {
        code: code.to_string(),
        name: "Ma Boutique".to_string(),
        email: Some("o@x.com".to_string()),
        plan_code: "starter".to_string(),
        billing_cycle: Some("monthly".to_string()),
        alternate_domains: Vec::new(),
    }
}

async fn seeded_factory_with_tenant(code: &str) -> (Arc<InMemoryRepositoryFactory>, i32) {
    let factory = Arc::new(InMemoryRepositoryFactory::new());
    factory.seed_default_plans();
    let tenant = factory
        .tenant_repository()
        .create(signup_input(code), format!("{code}.shops.test"))
        .await
        .unwrap();
    (factory, tenant.id.as_i32().unwrap())
}

fn checkout_completed(event_id: &str, tenant_code: &str, created: i64) -> StripeEvent {
    serde_json::from_value(serde_json::json!({
        "id": event_id,
        "type": "checkout.session.completed",
        "created": created,
        "data": {"object": {
            "id": "cs_1",
            "customer": "cus_1",
            "subscription": "sub_1",
            "metadata": {
                "tenant_code": tenant_code,
                "plan_code": "starter",
                "billing_cycle": "monthly"
            }
        }}
    }))
    .unwrap()
}

fn subscription_event(event_id: &str, event_type: &str, status: &str, created: i64) -> StripeEvent {
    serde_json::from_value(serde_json::json!({
        "id": event_id,
        "type": event_type,
        "created": created,
        "data": {"object": {"id": "sub_1", "customer": "cus_1", "status": status}}
    }))
    .unwrap()
}

fn invoice_event(event_id: &str, event_type: &str, created: i64) -> StripeEvent {
    serde_json::from_value(serde_json::json!({
        "id": event_id,
        "type": event_type,
        "created": created,
        "data": {"object": {"id": "in_1", "customer": "cus_1", "subscription": "sub_1"}}
    }))
    .unwrap()
}

#[tokio::test]
async fn test_checkout_completion_activates_tenant() {
    let (factory, tenant_id) = seeded_factory_with_tenant("acme").await;
    let processor = WebhookProcessor::new(factory.clone());

    let outcome = processor.process(&checkout_completed("evt_1", "acme", 1_700_000_000)).await.unwrap();
    assert_eq!(outcome, WebhookOutcome::Processed);

    let tenant = factory.tenant_repository().find_by_code("acme").await.unwrap().unwrap();
    assert_eq!(tenant.status, TenantStatus::Active);
    assert_eq!(tenant.provider_customer_id.as_deref(), Some("cus_1"));

    let subscription = factory
        .subscription_repository()
        .find_by_tenant(tenant_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(subscription.state, SubscriptionState::Active);
    assert_eq!(subscription.provider_subscription_id.as_deref(), Some("sub_1"));
}

#[tokio::test]
async fn test_checkout_completion_is_idempotent() {
    let (factory, tenant_id) = seeded_factory_with_tenant("acme").await;
    let processor = WebhookProcessor::new(factory.clone());

    let event = checkout_completed("evt_1", "acme", 1_700_000_000);
    assert_eq!(processor.process(&event).await.unwrap(), WebhookOutcome::Processed);
    assert_eq!(processor.process(&event).await.unwrap(), WebhookOutcome::Replay);
    assert_eq!(processor.process(&event).await.unwrap(), WebhookOutcome::Replay);

    // Exactly one subscription, tenant activated exactly once
    let subscription = factory.subscription_repository().find_by_tenant(tenant_id).await.unwrap();
    assert!(subscription.is_some());
    let tenant = factory.tenant_repository().find_by_code("acme").await.unwrap().unwrap();
    assert_eq!(tenant.status, TenantStatus::Active);
}

#[tokio::test]
async fn test_payment_failure_then_recovery() {
    let (factory, tenant_id) = seeded_factory_with_tenant("acme").await;
    let processor = WebhookProcessor::new(factory.clone());
    processor.process(&checkout_completed("evt_1", "acme", 1_700_000_000)).await.unwrap();

    processor
        .process(&invoice_event("evt_2", "invoice.payment_failed", 1_700_000_100))
        .await
        .unwrap();
    let subscription = factory
        .subscription_repository()
        .find_by_tenant(tenant_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(subscription.state, SubscriptionState::PastDue);
    // Payment failure alone does not suspend the tenant
    let tenant = factory.tenant_repository().find_by_code("acme").await.unwrap().unwrap();
    assert_eq!(tenant.status, TenantStatus::Active);

    processor.process(&invoice_event("evt_3", "invoice.paid", 1_700_000_200)).await.unwrap();
    let subscription = factory
        .subscription_repository()
        .find_by_tenant(tenant_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(subscription.state, SubscriptionState::Active);
    assert!(subscription.next_billing_date.is_some());
}

#[tokio::test]
async fn test_stale_subscription_update_is_dropped() {
    let (factory, tenant_id) = seeded_factory_with_tenant("acme").await;
    let processor = WebhookProcessor::new(factory.clone());
    processor.process(&checkout_completed("evt_1", "acme", 1_700_000_500)).await.unwrap();

    // An update that predates the applied checkout completion must lose
    let outcome = processor
        .process(&subscription_event("evt_2", "customer.subscription.updated", "trialing", 1_700_000_100))
        .await
        .unwrap();
    assert_eq!(outcome, WebhookOutcome::Ignored("stale event".to_string()));

    let subscription = factory
        .subscription_repository()
        .find_by_tenant(tenant_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(subscription.state, SubscriptionState::Active);
}

#[tokio::test]
async fn test_active_never_downgrades_to_trial() {
    let (factory, tenant_id) = seeded_factory_with_tenant("acme").await;
    let processor = WebhookProcessor::new(factory.clone());
    processor.process(&checkout_completed("evt_1", "acme", 1_700_000_000)).await.unwrap();

    // Fresh timestamp, so arbitration passes; the state machine still refuses
    let outcome = processor
        .process(&subscription_event("evt_2", "customer.subscription.updated", "trialing", 1_700_009_000))
        .await
        .unwrap();
    assert!(matches!(outcome, WebhookOutcome::Ignored(_)));

    let subscription = factory
        .subscription_repository()
        .find_by_tenant(tenant_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(subscription.state, SubscriptionState::Active);
}

#[tokio::test]
async fn test_subscription_deleted_cancels() {
    let (factory, tenant_id) = seeded_factory_with_tenant("acme").await;
    let processor = WebhookProcessor::new(factory.clone());
    processor.process(&checkout_completed("evt_1", "acme", 1_700_000_000)).await.unwrap();

    processor
        .process(&subscription_event("evt_2", "customer.subscription.deleted", "canceled", 1_700_001_000))
        .await
        .unwrap();

    let subscription = factory
        .subscription_repository()
        .find_by_tenant(tenant_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(subscription.state, SubscriptionState::Cancelled);
}

#[tokio::test]
async fn test_unknown_event_type_acknowledged() {
    let (factory, _) = seeded_factory_with_tenant("acme").await;
    let processor = WebhookProcessor::new(factory);

    let event: StripeEvent = serde_json::from_value(serde_json::json!({
        "id": "evt_x",
        "type": "charge.refunded",
        "created": 1_700_000_000,
        "data": {"object": {"id": "ch_1"}}
    }))
    .unwrap();
    assert!(matches!(processor.process(&event).await.unwrap(), WebhookOutcome::Ignored(_)));
}

fn configured_billing() -> BillingConfig {
    let mut config = BillingConfig::default();
    config.secret_key = Some("sk_test_123".to_string());
    config.publishable_key = Some("pk_test_123".to_string());
    config.webhook_secret = Some("whsec_123".to_string());
    config
}

#[tokio::test]
async fn test_checkout_session_caches_customer_id() {
    let (factory, _) = seeded_factory_with_tenant("acme").await;
    let gateway = Arc::new(MockBillingGateway::new());
    let service = BillingService::new(factory.clone(), gateway.clone(), configured_billing());

    let session = service
        .create_checkout_session("acme", "starter", BillingCycle::Monthly)
        .await
        .unwrap();
    assert!(session.url.starts_with("https://checkout.mock/"));

    let tenant = factory.tenant_repository().find_by_code("acme").await.unwrap().unwrap();
    let cached = tenant.provider_customer_id.clone().unwrap();

    // Second checkout reuses the cached customer
    service
        .create_checkout_session("acme", "starter", BillingCycle::Monthly)
        .await
        .unwrap();
    let tenant = factory.tenant_repository().find_by_code("acme").await.unwrap().unwrap();
    assert_eq!(tenant.provider_customer_id.as_deref(), Some(cached.as_str()));

    let requests = gateway.checkout_requests.lock().unwrap();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].metadata["tenant_code"], "acme");
    assert_eq!(requests[0].metadata["billing_cycle"], "monthly");
}

#[tokio::test]
async fn test_checkout_session_unoffered_cycle_fails_typed() {
    let (factory, _) = seeded_factory_with_tenant("acme").await;
    let service = BillingService::new(factory, Arc::new(MockBillingGateway::new()), configured_billing());

    // The pro plan offers no yearly price
    let err = service
        .create_checkout_session("acme", "pro", BillingCycle::Yearly)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        vitrine_billing::service::BillingServiceError::Billing(BillingError::PriceNotConfigured { .. })
    ));
}

#[tokio::test]
async fn test_billing_not_configured() {
    let (factory, _) = seeded_factory_with_tenant("acme").await;
    let service = BillingService::new(factory, Arc::new(MockBillingGateway::new()), BillingConfig::default());

    let err = service
        .create_checkout_session("acme", "starter", BillingCycle::Monthly)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        vitrine_billing::service::BillingServiceError::Billing(BillingError::NotConfigured)
    ));
}

#[tokio::test]
async fn test_portal_requires_customer() {
    let (factory, _) = seeded_factory_with_tenant("acme").await;
    let service = BillingService::new(factory, Arc::new(MockBillingGateway::new()), configured_billing());

    let err = service.create_portal_session("acme", "https://app.test/billing").await.unwrap_err();
    assert!(matches!(
        err,
        vitrine_billing::service::BillingServiceError::Billing(BillingError::NoCustomer { .. })
    ));
}
