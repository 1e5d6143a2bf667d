//! Database migrations for the vendorkit registry.
//!
//! Only the central registry lives here. Tenant tables are created at runtime
//! by the provisioning endpoint and are never migrated.

pub use sea_orm_migration::prelude::*;

mod m2025_06_01_000001_create_vendors;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(m2025_06_01_000001_create_vendors::Migration)]
    }
}
