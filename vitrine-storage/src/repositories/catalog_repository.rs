//! Catalog repository
//!
//! Product rows are RLS-governed, so every access here runs inside a
//! `TenantScope`: the insert satisfies the policy's WITH CHECK, and the
//! count observes exactly what a bound request would see.

use async_trait::async_trait;
use sea_orm::{ActiveModelBehavior, ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set};
use uuid::Uuid;

use crate::connection::DatabaseConnection;
use crate::entities::{products, Products};
use crate::repositories::map_db_err;
use crate::rls::TenantScope;
use vitrine_interfaces::database::ProductSummary;
use vitrine_interfaces::{CatalogRepository, DatabaseError};

const DEFAULT_PRODUCTS: &[(&str, i64)] = &[
    ("Sample Product", 1900),
    ("Sample Product 2", 4900),
    ("Gift Card", 2500),
];

#[derive(Clone)]
pub struct SeaOrmCatalogRepository {
    db: DatabaseConnection,
}

impl SeaOrmCatalogRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CatalogRepository for SeaOrmCatalogRepository {
    async fn ensure_default_products(&self, tenant_uuid: Uuid) -> Result<u32, DatabaseError> {
        let scope = TenantScope::begin(self.db.get_connection(), tenant_uuid)
            .await
            .map_err(map_db_err)?;

        let existing = Products::find()
            .filter(products::Column::TenantUuid.eq(tenant_uuid))
            .count(scope.transaction())
            .await
            .map_err(map_db_err)?;
        if existing > 0 {
            scope.commit().await.map_err(map_db_err)?;
            return Ok(0);
        }

        let mut seeded = 0;
        for (name, price_cents) in DEFAULT_PRODUCTS {
            let mut model = products::ActiveModel::new();
            model.tenant_uuid = Set(tenant_uuid);
            model.name = Set(name.to_string());
            model.price_cents = Set(*price_cents);
            model.insert(scope.transaction()).await.map_err(map_db_err)?;
            seeded += 1;
        }

        scope.commit().await.map_err(map_db_err)?;
        Ok(seeded)
    }

    async fn count_for_tenant(&self, tenant_uuid: Uuid) -> Result<u64, DatabaseError> {
        let scope = TenantScope::begin(self.db.get_connection(), tenant_uuid)
            .await
            .map_err(map_db_err)?;
        let count = Products::find()
            .filter(products::Column::TenantUuid.eq(tenant_uuid))
            .count(scope.transaction())
            .await
            .map_err(map_db_err)?;
        scope.commit().await.map_err(map_db_err)?;
        Ok(count)
    }

    async fn list_for_tenant(&self, tenant_uuid: Uuid) -> Result<Vec<ProductSummary>, DatabaseError> {
        let scope = TenantScope::begin(self.db.get_connection(), tenant_uuid)
            .await
            .map_err(map_db_err)?;
        let rows = Products::find()
            .filter(products::Column::TenantUuid.eq(tenant_uuid))
            .all(scope.transaction())
            .await
            .map_err(map_db_err)?;
        scope.commit().await.map_err(map_db_err)?;
        Ok(rows
            .into_iter()
            .map(|p| ProductSummary {
                name: p.name,
                price_cents: p.price_cents,
            })
            .collect())
    }
}
