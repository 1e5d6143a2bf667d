//! Schema store abstraction used by the provisioning executor.
//!
//! The trait mirrors the handful of catalog operations the two-pass algorithm
//! needs. [`PostgresSchemaStore`] implements it over a SeaORM connection; tests
//! substitute an in-memory catalog.

use async_trait::async_trait;
use sea_orm::sea_query::{ForeignKeyCreateStatement, TableCreateStatement};
use sea_orm::{ConnectionTrait, DatabaseBackend, DatabaseConnection, DbErr, Statement};
use sea_orm_migration::SchemaManager;

/// Catalog operations against the relational store.
#[async_trait]
pub trait SchemaStore: Send + Sync {
    /// Whether a table with this exact name exists.
    async fn has_table(&self, table: &str) -> Result<bool, DbErr>;

    /// Creates `table` from its DDL statement.
    async fn create_table(&self, table: &str, statement: TableCreateStatement)
    -> Result<(), DbErr>;

    /// Whether a constraint with this exact name exists.
    async fn has_constraint(&self, constraint: &str) -> Result<bool, DbErr>;

    /// Adds the foreign-key constraint named `constraint` to an existing table.
    async fn create_foreign_key(
        &self,
        constraint: &str,
        statement: ForeignKeyCreateStatement,
    ) -> Result<(), DbErr>;
}

/// [`SchemaStore`] backed by a Postgres connection pool.
#[derive(Clone)]
pub struct PostgresSchemaStore {
    db: DatabaseConnection,
}

impl PostgresSchemaStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn manager(&self) -> SchemaManager<'_> {
        SchemaManager::new(&self.db)
    }
}

const CONSTRAINT_EXISTS_SQL: &str = "SELECT COUNT(*) AS count FROM pg_constraint WHERE conname = $1";

#[async_trait]
impl SchemaStore for PostgresSchemaStore {
    async fn has_table(&self, table: &str) -> Result<bool, DbErr> {
        self.manager().has_table(table).await
    }

    async fn create_table(
        &self,
        _table: &str,
        statement: TableCreateStatement,
    ) -> Result<(), DbErr> {
        self.manager().create_table(statement).await
    }

    async fn has_constraint(&self, constraint: &str) -> Result<bool, DbErr> {
        let stmt = Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            CONSTRAINT_EXISTS_SQL,
            [constraint.into()],
        );

        let count: i64 = match self.db.query_one(stmt).await? {
            Some(row) => row.try_get("", "count")?,
            None => 0,
        };

        Ok(count > 0)
    }

    async fn create_foreign_key(
        &self,
        _constraint: &str,
        statement: ForeignKeyCreateStatement,
    ) -> Result<(), DbErr> {
        self.manager().create_foreign_key(statement).await
    }
}
