//! Repository implementations over SeaORM
//!
//! Each repository implements its `vitrine-interfaces` trait and speaks
//! unified API types outward; entities never leave this module tree.

pub mod audit_repository;
pub mod catalog_repository;
pub mod job_repository;
pub mod plan_repository;
pub mod subscription_repository;
pub mod tenant_repository;
pub mod webhook_event_repository;

pub use audit_repository::SeaOrmAuditRepository;
pub use catalog_repository::SeaOrmCatalogRepository;
pub use job_repository::SeaOrmProvisioningJobRepository;
pub use plan_repository::SeaOrmPlanRepository;
pub use subscription_repository::SeaOrmSubscriptionRepository;
pub use tenant_repository::SeaOrmTenantRepository;
pub use webhook_event_repository::SeaOrmWebhookEventRepository;

use crate::connection::DatabaseConnection;
use sea_orm::{DbErr, SqlErr};
use vitrine_interfaces::{
    AuditRepository, CatalogRepository, DatabaseError, PlanRepository, ProvisioningJobRepository,
    RepositoryFactory, SubscriptionRepository, TenantRepository, WebhookEventRepository,
};

/// Map a SeaORM error onto the shared database error type
pub(crate) fn map_db_err(err: DbErr) -> DatabaseError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(message)) => DatabaseError::Constraint { message },
        Some(SqlErr::ForeignKeyConstraintViolation(message)) => DatabaseError::Constraint { message },
        _ => match err {
            DbErr::ConnectionAcquire(_) | DbErr::Conn(_) => DatabaseError::Connection {
                message: err.to_string(),
            },
            other => DatabaseError::Internal {
                message: other.to_string(),
            },
        },
    }
}

/// Repository factory backed by one shared database connection
#[derive(Clone)]
pub struct SeaOrmRepositoryFactory {
    tenants: SeaOrmTenantRepository,
    subscriptions: SeaOrmSubscriptionRepository,
    plans: SeaOrmPlanRepository,
    jobs: SeaOrmProvisioningJobRepository,
    audit: SeaOrmAuditRepository,
    webhook_events: SeaOrmWebhookEventRepository,
    catalog: SeaOrmCatalogRepository,
}

impl SeaOrmRepositoryFactory {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            tenants: SeaOrmTenantRepository::new(db.clone()),
            subscriptions: SeaOrmSubscriptionRepository::new(db.clone()),
            plans: SeaOrmPlanRepository::new(db.clone()),
            jobs: SeaOrmProvisioningJobRepository::new(db.clone()),
            audit: SeaOrmAuditRepository::new(db.clone()),
            webhook_events: SeaOrmWebhookEventRepository::new(db.clone()),
            catalog: SeaOrmCatalogRepository::new(db),
        }
    }
}

impl RepositoryFactory for SeaOrmRepositoryFactory {
    fn tenant_repository(&self) -> &dyn TenantRepository {
        &self.tenants
    }

    fn subscription_repository(&self) -> &dyn SubscriptionRepository {
        &self.subscriptions
    }

    fn plan_repository(&self) -> &dyn PlanRepository {
        &self.plans
    }

    fn job_repository(&self) -> &dyn ProvisioningJobRepository {
        &self.jobs
    }

    fn audit_repository(&self) -> &dyn AuditRepository {
        &self.audit
    }

    fn webhook_event_repository(&self) -> &dyn WebhookEventRepository {
        &self.webhook_events
    }

    fn catalog_repository(&self) -> &dyn CatalogRepository {
        &self.catalog
    }
}
