//! Append-only audit log entity
//!
//! Rows are never updated or deleted; tenant references are weak (archiving
//! a tenant does not cascade here).

use sea_orm::entity::prelude::*;
use sea_orm::Set;
use serde::{Deserialize, Serialize};

use vitrine_api_types::{ApiId, UnifiedAuditEntry};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "audit_entries")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub timestamp: ChronoDateTimeUtc,
    pub actor_id: Option<i32>,
    pub actor_login: String,
    pub tenant_id: Option<i32>,
    pub action: String,
    pub resource_type: String,
    pub resource_id: Option<String>,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub success: bool,
    pub details: Json,
    pub request_id: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {
    fn new() -> Self {
        Self {
            timestamp: Set(chrono::Utc::now()),
            ..ActiveModelTrait::default()
        }
    }
}

impl From<Model> for UnifiedAuditEntry {
    fn from(model: Model) -> Self {
        UnifiedAuditEntry {
            timestamp: model.timestamp,
            actor_id: model.actor_id,
            actor_login: model.actor_login,
            tenant_id: model.tenant_id.map(ApiId::from_i32),
            action: model.action,
            resource_type: model.resource_type,
            resource_id: model.resource_id,
            ip: model.ip,
            user_agent: model.user_agent,
            success: model.success,
            details: model.details,
            request_id: model.request_id,
        }
    }
}
