//! # Table Provisioning
//!
//! Turns a tenant's declarative table schema into physical tables and
//! foreign keys. Translation ([`plan`]) is pure; execution ([`executor`])
//! goes through the [`SchemaStore`] trait.

pub mod executor;
pub mod memory;
pub mod plan;
pub mod schema;
pub mod store;

pub use executor::{ProvisioningError, ProvisioningReport, apply_plan};
pub use memory::MemorySchemaStore;
pub use plan::{PlanError, ProvisioningPlan, plan_provisioning};
pub use schema::{FieldSpec, FieldType, RelationKind, RelationSpec, TableSchema, TableSpec};
pub use store::{PostgresSchemaStore, SchemaStore};

/// Provisions every table of `schema` under `slug`, then its foreign keys.
/// A schema whose generated names collide is rejected before any DDL runs.
pub async fn provision_tables(
    store: &dyn SchemaStore,
    slug: &str,
    schema: &TableSchema,
) -> Result<ProvisioningReport, ProvisioningError> {
    let plan = plan_provisioning(slug, schema)?;
    apply_plan(store, plan).await
}
