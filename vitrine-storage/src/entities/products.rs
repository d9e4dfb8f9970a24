//! Product entity
//!
//! The catalog itself is owned by the storefront; this table exists because
//! provisioning seeds catalog defaults and because it is tenant-owned data
//! governed by the row-level security policies. Queries against it observe
//! the current RLS binding: unbound sessions read zero rows.

use sea_orm::entity::prelude::*;
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub uuid: Uuid,
    /// Owning tenant; compared against `app.current_tenant` by the RLS policy
    pub tenant_uuid: Uuid,
    pub name: String,
    pub price_cents: i64,
    pub created_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {
    fn new() -> Self {
        Self {
            uuid: Set(Uuid::new_v4()),
            created_at: Set(chrono::Utc::now()),
            ..ActiveModelTrait::default()
        }
    }
}
