//! In-memory [`SchemaStore`] fake for unit and router tests. Production
//! code always goes through [`super::PostgresSchemaStore`].

use std::collections::BTreeSet;
use std::sync::Mutex;

use async_trait::async_trait;
use sea_orm::DbErr;
use sea_orm::sea_query::{ForeignKeyCreateStatement, TableCreateStatement};

use super::store::SchemaStore;

#[derive(Debug, Default)]
struct Catalog {
    tables: BTreeSet<String>,
    constraints: BTreeSet<String>,
    operations: Vec<String>,
}

/// Keeps table and constraint names in memory. Failures can be injected for
/// specific names to exercise partial-provisioning paths.
#[derive(Debug, Default)]
pub struct MemorySchemaStore {
    catalog: Mutex<Catalog>,
    failing_tables: BTreeSet<String>,
    failing_constraints: BTreeSet<String>,
}

impl MemorySchemaStore {
    /// Make `create_table` fail for this table name.
    pub fn fail_on_table(mut self, table: &str) -> Self {
        self.failing_tables.insert(table.to_string());
        self
    }

    /// Make `create_foreign_key` fail for this constraint name.
    pub fn fail_on_constraint(mut self, constraint: &str) -> Self {
        self.failing_constraints.insert(constraint.to_string());
        self
    }

    pub fn table_count(&self) -> usize {
        self.lock().tables.len()
    }

    pub fn constraint_count(&self) -> usize {
        self.lock().constraints.len()
    }

    pub fn tables(&self) -> Vec<String> {
        self.lock().tables.iter().cloned().collect()
    }

    /// Mutating operations in the order they were applied.
    pub fn operations(&self) -> Vec<String> {
        self.lock().operations.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Catalog> {
        self.catalog
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
    }
}

#[async_trait]
impl SchemaStore for MemorySchemaStore {
    async fn has_table(&self, table: &str) -> Result<bool, DbErr> {
        Ok(self.lock().tables.contains(table))
    }

    async fn create_table(
        &self,
        table: &str,
        _statement: TableCreateStatement,
    ) -> Result<(), DbErr> {
        if self.failing_tables.contains(table) {
            return Err(DbErr::Custom(format!("injected failure creating {table}")));
        }

        let mut catalog = self.lock();
        if !catalog.tables.insert(table.to_string()) {
            return Err(DbErr::Custom(format!("relation \"{table}\" already exists")));
        }
        catalog.operations.push(format!("create_table {table}"));
        Ok(())
    }

    async fn has_constraint(&self, constraint: &str) -> Result<bool, DbErr> {
        Ok(self.lock().constraints.contains(constraint))
    }

    async fn create_foreign_key(
        &self,
        constraint: &str,
        _statement: ForeignKeyCreateStatement,
    ) -> Result<(), DbErr> {
        if self.failing_constraints.contains(constraint) {
            return Err(DbErr::Custom(format!(
                "injected failure adding {constraint}"
            )));
        }

        let mut catalog = self.lock();
        if !catalog.constraints.insert(constraint.to_string()) {
            return Err(DbErr::Custom(format!(
                "constraint \"{constraint}\" already exists"
            )));
        }
        catalog.operations.push(format!("create_foreign_key {constraint}"));
        Ok(())
    }
}
