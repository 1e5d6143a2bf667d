//! Executes a [`ProvisioningPlan`] against a [`SchemaStore`].

use metrics::counter;
use sea_orm::DbErr;
use thiserror::Error;
use tracing::{debug, info};

use super::plan::{PlanError, ProvisioningPlan};
use super::store::SchemaStore;

/// Failure while planning or applying DDL. Work done before the failing
/// step is kept.
#[derive(Debug, Error)]
pub enum ProvisioningError {
    #[error("invalid schema: {0}")]
    Plan(#[from] PlanError),
    #[error("failed to create table {table}: {source}")]
    CreateTable {
        table: String,
        #[source]
        source: DbErr,
    },
    #[error("failed to add constraint {constraint}: {source}")]
    CreateForeignKey {
        constraint: String,
        #[source]
        source: DbErr,
    },
    #[error("schema catalog lookup failed: {0}")]
    Catalog(#[from] DbErr),
}

impl ProvisioningError {
    /// Message of the underlying store error, without our wrapping context.
    pub fn store_message(&self) -> String {
        match self {
            ProvisioningError::Plan(error) => error.to_string(),
            ProvisioningError::CreateTable { source, .. }
            | ProvisioningError::CreateForeignKey { source, .. }
            | ProvisioningError::Catalog(source) => source.to_string(),
        }
    }
}

/// What a provisioning run actually changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvisioningReport {
    pub tables_created: Vec<String>,
    pub tables_skipped: Vec<String>,
    pub constraints_created: Vec<String>,
    pub constraints_skipped: Vec<String>,
}

/// Applies the plan in two passes: every missing table first, then every
/// missing foreign key. Existing tables and constraints are skipped, so a
/// repeated call is a no-op. Nothing is rolled back on failure.
pub async fn apply_plan(
    store: &dyn SchemaStore,
    plan: ProvisioningPlan,
) -> Result<ProvisioningReport, ProvisioningError> {
    let mut report = ProvisioningReport::default();

    for table in plan.tables {
        if store.has_table(&table.table).await? {
            debug!(table = %table.table, "Table already exists, skipping");
            report.tables_skipped.push(table.table);
            continue;
        }

        store
            .create_table(&table.table, table.statement)
            .await
            .map_err(|source| ProvisioningError::CreateTable {
                table: table.table.clone(),
                source,
            })?;
        info!(table = %table.table, "Created table");
        report.tables_created.push(table.table);
    }

    for fk in plan.foreign_keys {
        if store.has_constraint(&fk.constraint).await? {
            debug!(constraint = %fk.constraint, "Constraint already exists, skipping");
            report.constraints_skipped.push(fk.constraint);
            continue;
        }

        store
            .create_foreign_key(&fk.constraint, fk.statement)
            .await
            .map_err(|source| ProvisioningError::CreateForeignKey {
                constraint: fk.constraint.clone(),
                source,
            })?;
        info!(
            constraint = %fk.constraint,
            table = %fk.table,
            column = %fk.column,
            references = %format!("{}.{}", fk.target_table, fk.target_column),
            "Added foreign key"
        );
        report.constraints_created.push(fk.constraint);
    }

    counter!("provisioning_tables_created_total").increment(report.tables_created.len() as u64);
    counter!("provisioning_constraints_created_total")
        .increment(report.constraints_created.len() as u64);

    Ok(report)
}
