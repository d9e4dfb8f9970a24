//! Processed webhook event ledger, backing per-event-id idempotency

use sea_orm::entity::prelude::*;
use sea_orm::Set;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "webhook_events")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Provider event id; the uniqueness of this column is the dedup guarantee
    #[sea_orm(unique)]
    pub event_id: String,
    pub event_type: String,
    pub received_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {
    fn new() -> Self {
        Self {
            received_at: Set(chrono::Utc::now()),
            ..ActiveModelTrait::default()
        }
    }
}
