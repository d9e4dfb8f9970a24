//! Processed webhook event ledger
//!
//! The unique key on `event_id` is the whole idempotency mechanism: the
//! first recorder wins, every replay observes the existing row.

use async_trait::async_trait;
use sea_orm::{ActiveModelBehavior, ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set, SqlErr};

use crate::connection::DatabaseConnection;
use crate::entities::{webhook_events, WebhookEvents};
use crate::repositories::map_db_err;
use vitrine_interfaces::{DatabaseError, WebhookEventRepository};

#[derive(Clone)]
pub struct SeaOrmWebhookEventRepository {
    db: DatabaseConnection,
}

impl SeaOrmWebhookEventRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl WebhookEventRepository for SeaOrmWebhookEventRepository {
    async fn record(&self, event_id: &str, event_type: &str) -> Result<bool, DatabaseError> {
        let mut model = webhook_events::ActiveModel::new();
        model.event_id = Set(event_id.to_string());
        model.event_type = Set(event_type.to_string());

        match model.insert(self.db.get_connection()).await {
            Ok(_) => Ok(true),
            Err(err) => match err.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => Ok(false),
                _ => Err(map_db_err(err)),
            },
        }
    }

    async fn seen(&self, event_id: &str) -> Result<bool, DatabaseError> {
        let count = WebhookEvents::find()
            .filter(webhook_events::Column::EventId.eq(event_id))
            .count(self.db.get_connection())
            .await
            .map_err(map_db_err)?;
        Ok(count > 0)
    }
}
