//! Subscription repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelBehavior, ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};

use crate::connection::DatabaseConnection;
use crate::entities::{subscriptions, Subscriptions};
use crate::repositories::map_db_err;
use vitrine_api_types::{SubscriptionState, UnifiedSubscription};
use vitrine_interfaces::{DatabaseError, SubscriptionRepository};

#[derive(Clone)]
pub struct SeaOrmSubscriptionRepository {
    db: DatabaseConnection,
}

impl SeaOrmSubscriptionRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn fetch(&self, id: i32) -> Result<subscriptions::Model, DatabaseError> {
        Subscriptions::find_by_id(id)
            .one(self.db.get_connection())
            .await
            .map_err(map_db_err)?
            .ok_or_else(|| DatabaseError::not_found("subscription", id))
    }
}

#[async_trait]
impl SubscriptionRepository for SeaOrmSubscriptionRepository {
    async fn create(&self, subscription: UnifiedSubscription) -> Result<UnifiedSubscription, DatabaseError> {
        let tenant_id = subscription
            .tenant_id
            .as_i32()
            .ok_or_else(|| DatabaseError::Validation {
                message: "subscription tenant_id must be a database id".to_string(),
            })?;

        let mut model = subscriptions::ActiveModel::new();
        model.tenant_id = Set(tenant_id);
        model.plan_code = Set(subscription.plan_code);
        model.billing_cycle = Set(subscription.billing_cycle.into());
        model.state = Set(subscription.state.into());
        model.provider_customer_id = Set(subscription.provider_customer_id);
        model.provider_subscription_id = Set(subscription.provider_subscription_id);
        model.next_billing_date = Set(subscription.next_billing_date);

        // The unique tenant_id key enforces at-most-one subscription per tenant
        let created = model.insert(self.db.get_connection()).await.map_err(map_db_err)?;
        Ok(created.into())
    }

    async fn find_by_tenant(&self, tenant_id: i32) -> Result<Option<UnifiedSubscription>, DatabaseError> {
        let subscription = Subscriptions::find()
            .filter(subscriptions::Column::TenantId.eq(tenant_id))
            .one(self.db.get_connection())
            .await
            .map_err(map_db_err)?;
        Ok(subscription.map(Into::into))
    }

    async fn find_by_provider_subscription(
        &self,
        provider_subscription_id: &str,
    ) -> Result<Option<UnifiedSubscription>, DatabaseError> {
        let subscription = Subscriptions::find()
            .filter(subscriptions::Column::ProviderSubscriptionId.eq(provider_subscription_id))
            .one(self.db.get_connection())
            .await
            .map_err(map_db_err)?;
        Ok(subscription.map(Into::into))
    }

    async fn find_by_provider_customer(
        &self,
        provider_customer_id: &str,
    ) -> Result<Option<UnifiedSubscription>, DatabaseError> {
        let subscription = Subscriptions::find()
            .filter(subscriptions::Column::ProviderCustomerId.eq(provider_customer_id))
            .one(self.db.get_connection())
            .await
            .map_err(map_db_err)?;
        Ok(subscription.map(Into::into))
    }

    async fn attach_provider_ids(
        &self,
        id: i32,
        customer_id: &str,
        subscription_id: &str,
    ) -> Result<(), DatabaseError> {
        let current = self.fetch(id).await?;
        let mut model: subscriptions::ActiveModel = current.into();
        model.provider_customer_id = Set(Some(customer_id.to_string()));
        model.provider_subscription_id = Set(Some(subscription_id.to_string()));
        model.updated_at = Set(Utc::now());
        model.update(self.db.get_connection()).await.map_err(map_db_err)?;
        Ok(())
    }

    async fn set_state(
        &self,
        id: i32,
        state: SubscriptionState,
        provider_updated_at: Option<DateTime<Utc>>,
    ) -> Result<(), DatabaseError> {
        let current = self.fetch(id).await?;
        let mut model: subscriptions::ActiveModel = current.into();
        model.state = Set(state.into());
        if let Some(at) = provider_updated_at {
            model.provider_updated_at = Set(Some(at));
        }
        model.updated_at = Set(Utc::now());
        model.update(self.db.get_connection()).await.map_err(map_db_err)?;
        Ok(())
    }

    async fn set_next_billing_date(&self, id: i32, when: DateTime<Utc>) -> Result<(), DatabaseError> {
        let current = self.fetch(id).await?;
        let mut model: subscriptions::ActiveModel = current.into();
        model.next_billing_date = Set(Some(when));
        model.updated_at = Set(Utc::now());
        model.update(self.db.get_connection()).await.map_err(map_db_err)?;
        Ok(())
    }
}
