//! Migration to create the vendors registry table.
//!
//! Every successful table provisioning call records one row here, holding the
//! owning user, the tenant slug and the submitted schema document.

use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::DatabaseBackend;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let mut id = ColumnDef::new(Vendors::Id);
        id.uuid().not_null().primary_key();
        // SQLite has no gen_random_uuid(); callers supply ids there.
        if manager.get_database_backend() == DatabaseBackend::Postgres {
            id.default(Expr::cust("gen_random_uuid()"));
        }

        manager
            .create_table(
                Table::create()
                    .table(Vendors::Table)
                    .if_not_exists()
                    .col(&mut id)
                    .col(ColumnDef::new(Vendors::UserId).text().not_null())
                    .col(ColumnDef::new(Vendors::Slug).text().not_null())
                    .col(ColumnDef::new(Vendors::Schema).json_binary().not_null())
                    .col(
                        ColumnDef::new(Vendors::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_vendors_slug")
                    .table(Vendors::Table)
                    .col(Vendors::Slug)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_vendors_slug").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Vendors::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Vendors {
    Table,
    Id,
    UserId,
    Slug,
    Schema,
    CreatedAt,
}
