//! Create relation table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Relation::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Relation::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Relation::Kind).string_len(16).not_null())
                    .col(ColumnDef::new(Relation::SourceId).string_len(32).not_null())
                    .col(ColumnDef::new(Relation::TargetId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(Relation::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_relation_source")
                            .from(Relation::Table, Relation::SourceId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_relation_target")
                            .from(Relation::Table, Relation::TargetId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (kind, source_id, target_id) - backs idempotent adds
        manager
            .create_index(
                Index::create()
                    .name("idx_relation_kind_source_target")
                    .table(Relation::Table)
                    .col(Relation::Kind)
                    .col(Relation::SourceId)
                    .col(Relation::TargetId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: (kind, source_id) for forward lookups
        manager
            .create_index(
                Index::create()
                    .name("idx_relation_kind_source")
                    .table(Relation::Table)
                    .col(Relation::Kind)
                    .col(Relation::SourceId)
                    .to_owned(),
            )
            .await?;

        // Index: (kind, target_id) for reverse lookups
        manager
            .create_index(
                Index::create()
                    .name("idx_relation_kind_target")
                    .table(Relation::Table)
                    .col(Relation::Kind)
                    .col(Relation::TargetId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Relation::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Relation {
    Table,
    Id,
    Kind,
    SourceId,
    TargetId,
    CreatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
