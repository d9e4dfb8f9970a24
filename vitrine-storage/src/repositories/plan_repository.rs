//! Plan catalog repository

use async_trait::async_trait;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};

use crate::connection::DatabaseConnection;
use crate::entities::{plans, Plans};
use crate::repositories::map_db_err;
use vitrine_api_types::UnifiedPlan;
use vitrine_interfaces::{DatabaseError, PlanRepository};

#[derive(Clone)]
pub struct SeaOrmPlanRepository {
    db: DatabaseConnection,
}

impl SeaOrmPlanRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PlanRepository for SeaOrmPlanRepository {
    async fn find_by_code(&self, code: &str) -> Result<Option<UnifiedPlan>, DatabaseError> {
        let plan = Plans::find()
            .filter(plans::Column::Code.eq(code))
            .one(self.db.get_connection())
            .await
            .map_err(map_db_err)?;
        Ok(plan.map(Into::into))
    }

    async fn list(&self) -> Result<Vec<UnifiedPlan>, DatabaseError> {
        let plans = Plans::find()
            .order_by_asc(plans::Column::Code)
            .all(self.db.get_connection())
            .await
            .map_err(map_db_err)?;
        Ok(plans.into_iter().map(Into::into).collect())
    }
}
