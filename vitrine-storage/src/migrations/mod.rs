use sea_orm_migration::prelude::*;

mod m20250601_000001_create_core_tables;
mod m20250601_000002_create_indexes;
mod m20250601_000003_enable_rls;
mod m20250601_000004_seed_plans;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250601_000001_create_core_tables::Migration),
            Box::new(m20250601_000002_create_indexes::Migration),
            Box::new(m20250601_000003_enable_rls::Migration),
            Box::new(m20250601_000004_seed_plans::Migration),
        ]
    }
}
