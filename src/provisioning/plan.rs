//! Pure translation from a [`TableSchema`] into an ordered DDL plan.
//!
//! Nothing here touches a database. The plan lists every table first and
//! every foreign key second, so executing it in order never references a
//! table that does not exist yet.

use std::collections::BTreeSet;

use sea_orm::sea_query::{
    Alias, ColumnDef, Expr, ForeignKey, ForeignKeyAction, ForeignKeyCreateStatement, Table,
    TableCreateStatement,
};

use thiserror::Error;

use super::schema::{
    FieldSpec, FieldType, TableSchema, foreign_key_name, normalize_slug, physical_table_name,
};

pub const ID_COLUMN: &str = "id";
pub const CREATED_AT_COLUMN: &str = "created_at";
pub const UPDATED_AT_COLUMN: &str = "updated_at";

/// Table creation step (pass 1).
#[derive(Debug, Clone)]
pub struct TablePlan {
    /// Physical, slug-prefixed table name
    pub table: String,
    pub statement: TableCreateStatement,
}

/// Foreign key step (pass 2).
#[derive(Debug, Clone)]
pub struct ForeignKeyPlan {
    /// Deterministic constraint name used for the idempotency check
    pub constraint: String,
    pub table: String,
    pub column: String,
    pub target_table: String,
    pub target_column: String,
    pub statement: ForeignKeyCreateStatement,
}

/// Ordered DDL operations for one provisioning request.
#[derive(Debug, Clone)]
pub struct ProvisioningPlan {
    pub prefix: String,
    pub tables: Vec<TablePlan>,
    pub foreign_keys: Vec<ForeignKeyPlan>,
}

/// Schema that cannot be mapped onto distinct physical identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    #[error("table '{declared}' maps to physical name {physical} which is already taken")]
    DuplicateTable { declared: String, physical: String },
    #[error("relation field '{table}.{field}' maps to constraint {constraint} which is already taken")]
    DuplicateConstraint {
        table: String,
        field: String,
        constraint: String,
    },
}

impl PlanError {
    /// The generated identifier that collided.
    pub fn identifier(&self) -> &str {
        match self {
            PlanError::DuplicateTable { physical, .. } => physical,
            PlanError::DuplicateConstraint { constraint, .. } => constraint,
        }
    }
}

/// Builds the plan for `slug`. Relation targets are resolved inside the same
/// tenant namespace but are not checked for existence in `schema`.
///
/// Every physical table and constraint name in the plan is distinct. Names
/// that collide after truncation are rejected, since the existence checks
/// would otherwise skip the later one.
pub fn plan_provisioning(slug: &str, schema: &TableSchema) -> Result<ProvisioningPlan, PlanError> {
    let prefix = normalize_slug(slug);

    let mut seen_tables = BTreeSet::new();
    let mut tables = Vec::with_capacity(schema.tables.len());
    for table in &schema.tables {
        let name = physical_table_name(&prefix, &table.name);
        if !seen_tables.insert(name.clone()) {
            return Err(PlanError::DuplicateTable {
                declared: table.name.clone(),
                physical: name,
            });
        }
        tables.push(TablePlan {
            statement: create_table_statement(&name, &table.fields),
            table: name,
        });
    }

    let mut seen_constraints = BTreeSet::new();
    let mut foreign_keys = Vec::new();
    for table in &schema.tables {
        let table_name = physical_table_name(&prefix, &table.name);
        for field in &table.fields {
            let Some(relation) = field.belongs_to() else {
                continue;
            };
            let target_table = physical_table_name(&prefix, &relation.target_table);
            let constraint = foreign_key_name(&table_name, &field.name);
            if !seen_constraints.insert(constraint.clone()) {
                return Err(PlanError::DuplicateConstraint {
                    table: table.name.clone(),
                    field: field.name.clone(),
                    constraint,
                });
            }
            let statement = ForeignKey::create()
                .name(constraint.as_str())
                .from(Alias::new(table_name.as_str()), Alias::new(field.name.as_str()))
                .to(
                    Alias::new(target_table.as_str()),
                    Alias::new(relation.target_column.as_str()),
                )
                .on_delete(ForeignKeyAction::SetNull)
                .to_owned();

            foreign_keys.push(ForeignKeyPlan {
                constraint,
                table: table_name.clone(),
                column: field.name.clone(),
                target_table,
                target_column: relation.target_column.clone(),
                statement,
            });
        }
    }

    Ok(ProvisioningPlan {
        prefix,
        tables,
        foreign_keys,
    })
}

fn create_table_statement(table: &str, fields: &[FieldSpec]) -> TableCreateStatement {
    let mut statement = Table::create();
    statement
        .table(Alias::new(table))
        .col(
            ColumnDef::new(Alias::new(ID_COLUMN))
                .uuid()
                .not_null()
                .primary_key()
                .default(Expr::cust("gen_random_uuid()")),
        )
        .col(
            ColumnDef::new(Alias::new(CREATED_AT_COLUMN))
                .timestamp_with_time_zone()
                .default(Expr::current_timestamp()),
        )
        .col(
            ColumnDef::new(Alias::new(UPDATED_AT_COLUMN))
                .timestamp_with_time_zone()
                .default(Expr::current_timestamp()),
        );

    for field in fields {
        statement.col(&mut column_def(field));
    }

    statement.to_owned()
}

/// Translates one declared field. Relation fields get a plain column here;
/// their constraint is added in the second pass.
fn column_def(field: &FieldSpec) -> ColumnDef {
    let mut column = ColumnDef::new(Alias::new(field.name.as_str()));
    match field.field_type {
        FieldType::Text => column.text(),
        FieldType::Number => column.integer(),
        FieldType::Boolean => column.boolean(),
        FieldType::Date => column.timestamp_with_time_zone(),
        FieldType::Uuid => column.uuid(),
    };
    if field.required {
        column.not_null();
    }
    if field.unique {
        column.unique_key();
    }
    column
}
