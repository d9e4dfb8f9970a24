//! Audit repository: append-only writes, per-tenant time-ordered reads

use async_trait::async_trait;
use sea_orm::{ActiveModelBehavior, ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set};

use crate::connection::DatabaseConnection;
use crate::entities::{audit_entries, AuditEntries};
use crate::repositories::map_db_err;
use vitrine_api_types::{ListResponse, PaginationInput, UnifiedAuditEntry};
use vitrine_interfaces::{AuditRepository, DatabaseError};

#[derive(Clone)]
pub struct SeaOrmAuditRepository {
    db: DatabaseConnection,
}

impl SeaOrmAuditRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AuditRepository for SeaOrmAuditRepository {
    async fn append(&self, entry: UnifiedAuditEntry) -> Result<(), DatabaseError> {
        let mut model = audit_entries::ActiveModel::new();
        model.timestamp = Set(entry.timestamp);
        model.actor_id = Set(entry.actor_id);
        model.actor_login = Set(entry.actor_login);
        model.tenant_id = Set(entry.tenant_id.and_then(|id| id.as_i32()));
        model.action = Set(entry.action);
        model.resource_type = Set(entry.resource_type);
        model.resource_id = Set(entry.resource_id);
        model.ip = Set(entry.ip);
        model.user_agent = Set(entry.user_agent);
        model.success = Set(entry.success);
        model.details = Set(entry.details);
        model.request_id = Set(entry.request_id);

        model.insert(self.db.get_connection()).await.map_err(map_db_err)?;
        Ok(())
    }

    async fn list_for_tenant(
        &self,
        tenant_id: i32,
        pagination: PaginationInput,
    ) -> Result<ListResponse<UnifiedAuditEntry>, DatabaseError> {
        let paginator = AuditEntries::find()
            .filter(audit_entries::Column::TenantId.eq(tenant_id))
            .order_by_asc(audit_entries::Column::Timestamp)
            .paginate(self.db.get_connection(), pagination.limit.max(1));

        let total = paginator.num_items().await.map_err(map_db_err)?;
        let items = paginator
            .fetch_page(pagination.page.saturating_sub(1))
            .await
            .map_err(map_db_err)?;

        Ok(ListResponse::new(items.into_iter().map(Into::into).collect(), pagination, total))
    }
}
