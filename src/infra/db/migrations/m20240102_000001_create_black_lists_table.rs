//! Migration: Create black_lists table.
//!
//! No unique constraint on `domain`; duplicate labels are tolerated.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(BlackLists::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(BlackLists::Id).uuid().not_null().primary_key())
                    .col(
                        ColumnDef::new(BlackLists::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(BlackLists::Domain).string().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_black_lists_domain")
                    .table(BlackLists::Table)
                    .col(BlackLists::Domain)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_black_lists_domain")
                    .table(BlackLists::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(BlackLists::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum BlackLists {
    Table,
    Id,
    CreatedAt,
    Domain,
}
