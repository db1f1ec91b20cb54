//! Create feed and `feed_source` tables.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create feed table
        manager
            .create_table(
                Table::create()
                    .table(Feed::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Feed::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Feed::OwnerId).string_len(32).not_null())
                    .col(ColumnDef::new(Feed::Name).string_len(128).not_null())
                    .col(
                        ColumnDef::new(Feed::SortOrder)
                            .string_len(16)
                            .not_null()
                            .default("recency"),
                    )
                    .col(
                        ColumnDef::new(Feed::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_feed_owner")
                            .from(Feed::Table, Feed::OwnerId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: feeds are keyed by (owner_id, name)
        manager
            .create_index(
                Index::create()
                    .name("idx_feed_owner_name")
                    .table(Feed::Table)
                    .col(Feed::OwnerId)
                    .col(Feed::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Create feed_source table
        manager
            .create_table(
                Table::create()
                    .table(FeedSource::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FeedSource::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(FeedSource::FeedId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(FeedSource::AccountId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FeedSource::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_feed_source_feed")
                            .from(FeedSource::Table, FeedSource::FeedId)
                            .to(Feed::Table, Feed::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_feed_source_account")
                            .from(FeedSource::Table, FeedSource::AccountId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique constraint on (feed_id, account_id) - backs idempotent adds
        manager
            .create_index(
                Index::create()
                    .name("idx_feed_source_unique")
                    .table(FeedSource::Table)
                    .col(FeedSource::FeedId)
                    .col(FeedSource::AccountId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index on account_id for removal cascades
        manager
            .create_index(
                Index::create()
                    .name("idx_feed_source_account_id")
                    .table(FeedSource::Table)
                    .col(FeedSource::AccountId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(FeedSource::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Feed::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Feed {
    Table,
    Id,
    OwnerId,
    Name,
    SortOrder,
    CreatedAt,
}

#[derive(Iden)]
enum FeedSource {
    Table,
    Id,
    FeedId,
    AccountId,
    CreatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
