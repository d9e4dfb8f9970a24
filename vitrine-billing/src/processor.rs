//! Webhook reconciliation state machine
//!
//! Maps provider events onto tenant and subscription state. Three rules
//! govern every handler:
//!
//! 1. Idempotent per event id: a replay returns the recorded outcome without
//!    re-applying anything.
//! 2. No ordering assumed: `customer.subscription.updated` events older than
//!    the last applied provider timestamp are dropped, and `active` never
//!    downgrades to `trial`.
//! 3. Errors leave no partial ledger entry, so the provider's retry gets a
//!    clean re-run.

use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

use crate::events::StripeEvent;
use vitrine_api_types::{ApiId, SubscriptionState, TenantStatus, UnifiedSubscription, UnifiedTenant};
use vitrine_core::{map_provider_status, subscription_transition_allowed};
use vitrine_interfaces::{DatabaseError, RepositoryFactory};

/// Outcome of processing one delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// State was applied
    Processed,
    /// Event id already in the ledger; nothing re-applied
    Replay,
    /// Acknowledged without state change (unknown type, stale, unresolvable)
    Ignored(String),
}

pub struct WebhookProcessor {
    repositories: Arc<dyn RepositoryFactory>,
}

impl WebhookProcessor {
    pub fn new(repositories: Arc<dyn RepositoryFactory>) -> Self {
        Self { repositories }
    }

    /// Process one verified, parsed event.
    ///
    /// Database errors propagate so the HTTP layer can return 5xx and the
    /// provider retries; the ledger records the event id only after the
    /// handler succeeded.
    pub async fn process(&self, event: &StripeEvent) -> Result<WebhookOutcome, DatabaseError> {
        if self.repositories.webhook_event_repository().seen(&event.id).await? {
            info!(event = %event.id, "webhook replay, returning recorded outcome");
            return Ok(WebhookOutcome::Replay);
        }

        let outcome = match event.event_type.as_str() {
            "checkout.session.completed" => self.on_checkout_completed(event).await?,
            "invoice.paid" => self.on_invoice_paid(event).await?,
            "invoice.payment_failed" => self.on_invoice_payment_failed(event).await?,
            "customer.subscription.updated" => self.on_subscription_updated(event).await?,
            "customer.subscription.deleted" => self.on_subscription_deleted(event).await?,
            other => {
                info!(event_type = %other, "unknown webhook event type acknowledged");
                WebhookOutcome::Ignored(format!("unknown event type {other}"))
            }
        };

        // Ledger write last: a handler failure above leaves the event
        // unrecorded and retryable
        self.repositories
            .webhook_event_repository()
            .record(&event.id, &event.event_type)
            .await?;

        Ok(outcome)
    }

    async fn on_checkout_completed(&self, event: &StripeEvent) -> Result<WebhookOutcome, DatabaseError> {
        let object = &event.data.object;
        let Some(tenant_code) = object.metadata.get("tenant_code") else {
            warn!(event = %event.id, "checkout completion without tenant_code metadata");
            return Ok(WebhookOutcome::Ignored("missing tenant_code metadata".to_string()));
        };

        let Some(tenant) = self.repositories.tenant_repository().find_by_code(tenant_code).await? else {
            warn!(event = %event.id, tenant = %tenant_code, "checkout completion for unknown tenant");
            return Ok(WebhookOutcome::Ignored(format!("unknown tenant {tenant_code}")));
        };
        let tenant_id = tenant_db_id(&tenant)?;

        let (Some(customer_id), Some(subscription_id)) = (object.customer.as_deref(), object.subscription_id()) else {
            return Ok(WebhookOutcome::Ignored("session carries no customer/subscription".to_string()));
        };

        self.repositories
            .tenant_repository()
            .set_provider_customer(tenant_id, customer_id)
            .await?;

        let subscriptions = self.repositories.subscription_repository();
        match subscriptions.find_by_tenant(tenant_id).await? {
            Some(subscription) => {
                let id = subscription_db_id(&subscription)?;
                subscriptions.attach_provider_ids(id, customer_id, subscription_id).await?;
                if subscription.state != SubscriptionState::Active {
                    subscriptions
                        .set_state(id, SubscriptionState::Active, Some(event.created_at()))
                        .await?;
                }
            }
            None => {
                let plan_code = object
                    .metadata
                    .get("plan_code")
                    .cloned()
                    .or_else(|| tenant.plan_code.clone())
                    .unwrap_or_default();
                let billing_cycle = object
                    .metadata
                    .get("billing_cycle")
                    .and_then(|c| c.parse().ok())
                    .unwrap_or(vitrine_api_types::BillingCycle::Monthly);
                subscriptions
                    .create(UnifiedSubscription {
                        id: ApiId::from_i32(0),
                        uuid: uuid::Uuid::new_v4(),
                        tenant_id: ApiId::from_i32(tenant_id),
                        plan_code,
                        billing_cycle,
                        state: SubscriptionState::Active,
                        provider_customer_id: Some(customer_id.to_string()),
                        provider_subscription_id: Some(subscription_id.to_string()),
                        next_billing_date: None,
                        provider_updated_at: Some(event.created_at()),
                        created_at: Utc::now(),
                        updated_at: Utc::now(),
                    })
                    .await?;
            }
        }

        // Checkout completion activates a tenant still in provisioning
        if tenant.status == TenantStatus::Provisioning {
            self.repositories
                .tenant_repository()
                .transition_status(tenant_id, TenantStatus::Active)
                .await?;
            info!(tenant = %tenant.code, "tenant activated by checkout completion");
        }

        Ok(WebhookOutcome::Processed)
    }

    async fn on_invoice_paid(&self, event: &StripeEvent) -> Result<WebhookOutcome, DatabaseError> {
        let Some(subscription) = self.resolve_subscription(event).await? else {
            return Ok(WebhookOutcome::Ignored("no matching subscription".to_string()));
        };
        let id = subscription_db_id(&subscription)?;
        let subscriptions = self.repositories.subscription_repository();

        if subscription.state != SubscriptionState::Active
            && subscription_transition_allowed(subscription.state, SubscriptionState::Active)
        {
            subscriptions
                .set_state(id, SubscriptionState::Active, Some(event.created_at()))
                .await?;
        }

        let next = Utc::now() + chrono::Duration::days(subscription.billing_cycle.days());
        subscriptions.set_next_billing_date(id, next).await?;

        Ok(WebhookOutcome::Processed)
    }

    async fn on_invoice_payment_failed(&self, event: &StripeEvent) -> Result<WebhookOutcome, DatabaseError> {
        let Some(subscription) = self.resolve_subscription(event).await? else {
            return Ok(WebhookOutcome::Ignored("no matching subscription".to_string()));
        };

        // Suspension after grace is business policy outside this machine
        if subscription.state != SubscriptionState::PastDue
            && subscription_transition_allowed(subscription.state, SubscriptionState::PastDue)
        {
            self.repositories
                .subscription_repository()
                .set_state(subscription_db_id(&subscription)?, SubscriptionState::PastDue, Some(event.created_at()))
                .await?;
        }

        Ok(WebhookOutcome::Processed)
    }

    async fn on_subscription_updated(&self, event: &StripeEvent) -> Result<WebhookOutcome, DatabaseError> {
        let Some(subscription) = self.resolve_subscription(event).await? else {
            return Ok(WebhookOutcome::Ignored("no matching subscription".to_string()));
        };

        let Some(provider_status) = event.data.object.status.as_deref() else {
            return Ok(WebhookOutcome::Ignored("update without status".to_string()));
        };

        let target = match map_provider_status(provider_status) {
            Ok(state) => state,
            Err(e) => {
                warn!(event = %event.id, error = %e, "unmapped provider status acknowledged");
                return Ok(WebhookOutcome::Ignored(e.to_string()));
            }
        };

        // Out-of-order arbitration: the latest provider timestamp wins
        if let Some(applied) = subscription.provider_updated_at {
            if event.created_at() <= applied {
                return Ok(WebhookOutcome::Ignored("stale event".to_string()));
            }
        }

        if subscription.state == target {
            return Ok(WebhookOutcome::Ignored("state unchanged".to_string()));
        }
        if !subscription_transition_allowed(subscription.state, target) {
            warn!(
                event = %event.id,
                from = %subscription.state,
                to = %target,
                "dropping forbidden subscription downgrade"
            );
            return Ok(WebhookOutcome::Ignored(format!(
                "forbidden transition {} -> {}",
                subscription.state, target
            )));
        }

        self.repositories
            .subscription_repository()
            .set_state(subscription_db_id(&subscription)?, target, Some(event.created_at()))
            .await?;

        Ok(WebhookOutcome::Processed)
    }

    async fn on_subscription_deleted(&self, event: &StripeEvent) -> Result<WebhookOutcome, DatabaseError> {
        let Some(subscription) = self.resolve_subscription(event).await? else {
            return Ok(WebhookOutcome::Ignored("no matching subscription".to_string()));
        };

        if subscription.state != SubscriptionState::Cancelled {
            self.repositories
                .subscription_repository()
                .set_state(subscription_db_id(&subscription)?, SubscriptionState::Cancelled, Some(event.created_at()))
                .await?;
        }

        Ok(WebhookOutcome::Processed)
    }

    /// Find the subscription an event refers to: by provider subscription id
    /// first, then by provider customer id
    async fn resolve_subscription(&self, event: &StripeEvent) -> Result<Option<UnifiedSubscription>, DatabaseError> {
        let subscriptions = self.repositories.subscription_repository();

        if let Some(subscription_id) = event.data.object.subscription_id() {
            if let Some(found) = subscriptions.find_by_provider_subscription(subscription_id).await? {
                return Ok(Some(found));
            }
        }
        if let Some(customer_id) = event.data.object.customer.as_deref() {
            if let Some(found) = subscriptions.find_by_provider_customer(customer_id).await? {
                return Ok(Some(found));
            }
        }
        warn!(event = %event.id, "webhook references no known subscription");
        Ok(None)
    }
}

fn tenant_db_id(tenant: &UnifiedTenant) -> Result<i32, DatabaseError> {
    tenant.id.as_i32().ok_or_else(|| DatabaseError::Internal {
        message: "tenant id is not a database id".to_string(),
    })
}

fn subscription_db_id(subscription: &UnifiedSubscription) -> Result<i32, DatabaseError> {
    subscription.id.as_i32().ok_or_else(|| DatabaseError::Internal {
        message: "subscription id is not a database id".to_string(),
    })
}
