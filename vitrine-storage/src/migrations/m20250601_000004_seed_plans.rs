//! Seed the built-in plan catalog
//!
//! Price ids are placeholders overwritten per environment by operations;
//! a plan whose price id stays NULL simply does not offer that cycle.

use sea_orm_migration::prelude::*;

use super::m20250601_000001_create_core_tables::Plans;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .exec_stmt(
                sea_query::Query::insert()
                    .into_table(Plans::Table)
                    .columns([Plans::Code, Plans::Name, Plans::MonthlyPriceId, Plans::YearlyPriceId, Plans::TrialDays])
                    .values_panic([
                        "starter".into(),
                        "Starter".into(),
                        "price_starter_monthly".into(),
                        "price_starter_yearly".into(),
                        14.into(),
                    ])
                    .values_panic([
                        "pro".into(),
                        "Pro".into(),
                        "price_pro_monthly".into(),
                        "price_pro_yearly".into(),
                        14.into(),
                    ])
                    .to_owned(),
            )
            .await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .exec_stmt(
                sea_query::Query::delete()
                    .from_table(Plans::Table)
                    .cond_where(Expr::col(Plans::Code).is_in(["starter", "pro"]))
                    .to_owned(),
            )
            .await?;
        Ok(())
    }
}
