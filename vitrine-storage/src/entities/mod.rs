//! SeaORM entity definitions

pub mod audit_entries;
pub mod companies;
pub mod plans;
pub mod products;
pub mod provisioning_jobs;
pub mod subscriptions;
pub mod tenants;
pub mod webhook_events;

pub use audit_entries::Entity as AuditEntries;
pub use companies::Entity as Companies;
pub use plans::Entity as Plans;
pub use products::Entity as Products;
pub use provisioning_jobs::Entity as ProvisioningJobs;
pub use subscriptions::Entity as Subscriptions;
pub use tenants::Entity as Tenants;
pub use webhook_events::Entity as WebhookEvents;
