//! Plan catalog entity, shared globally

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use vitrine_api_types::{ApiId, UnifiedPlan};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "plans")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub code: String,
    pub name: String,
    /// External price id for the monthly cycle; a cycle without one is not offered
    pub monthly_price_id: Option<String>,
    pub yearly_price_id: Option<String>,
    pub trial_days: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for UnifiedPlan {
    fn from(model: Model) -> Self {
        UnifiedPlan {
            id: ApiId::from_i32(model.id),
            code: model.code,
            name: model.name,
            monthly_price_id: model.monthly_price_id,
            yearly_price_id: model.yearly_price_id,
            trial_days: model.trial_days.max(0) as u32,
        }
    }
}
