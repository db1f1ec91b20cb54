//! Create `content_group` and its membership tables.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create content_group table
        manager
            .create_table(
                Table::create()
                    .table(ContentGroup::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ContentGroup::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ContentGroup::Name).string_len(128).not_null())
                    .col(ColumnDef::new(ContentGroup::Description).text())
                    .col(
                        ColumnDef::new(ContentGroup::OwnerId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ContentGroup::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_content_group_owner")
                            .from(ContentGroup::Table, ContentGroup::OwnerId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: group names are globally unique
        manager
            .create_index(
                Index::create()
                    .name("idx_content_group_name")
                    .table(ContentGroup::Table)
                    .col(ContentGroup::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index on owner_id
        manager
            .create_index(
                Index::create()
                    .name("idx_content_group_owner_id")
                    .table(ContentGroup::Table)
                    .col(ContentGroup::OwnerId)
                    .to_owned(),
            )
            .await?;

        // Create group_moderator table
        manager
            .create_table(
                Table::create()
                    .table(GroupModerator::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(GroupModerator::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(GroupModerator::GroupId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(GroupModerator::UserId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(GroupModerator::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_group_moderator_group")
                            .from(GroupModerator::Table, GroupModerator::GroupId)
                            .to(ContentGroup::Table, ContentGroup::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_group_moderator_user")
                            .from(GroupModerator::Table, GroupModerator::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique constraint on (group_id, user_id)
        manager
            .create_index(
                Index::create()
                    .name("idx_group_moderator_unique")
                    .table(GroupModerator::Table)
                    .col(GroupModerator::GroupId)
                    .col(GroupModerator::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index on user_id
        manager
            .create_index(
                Index::create()
                    .name("idx_group_moderator_user_id")
                    .table(GroupModerator::Table)
                    .col(GroupModerator::UserId)
                    .to_owned(),
            )
            .await?;

        // Create group_follower table
        manager
            .create_table(
                Table::create()
                    .table(GroupFollower::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(GroupFollower::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(GroupFollower::GroupId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(GroupFollower::UserId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(GroupFollower::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_group_follower_group")
                            .from(GroupFollower::Table, GroupFollower::GroupId)
                            .to(ContentGroup::Table, ContentGroup::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_group_follower_user")
                            .from(GroupFollower::Table, GroupFollower::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique constraint on (group_id, user_id)
        manager
            .create_index(
                Index::create()
                    .name("idx_group_follower_unique")
                    .table(GroupFollower::Table)
                    .col(GroupFollower::GroupId)
                    .col(GroupFollower::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index on user_id (for listing the groups a user follows)
        manager
            .create_index(
                Index::create()
                    .name("idx_group_follower_user_id")
                    .table(GroupFollower::Table)
                    .col(GroupFollower::UserId)
                    .to_owned(),
            )
            .await?;

        // Create group_account table
        manager
            .create_table(
                Table::create()
                    .table(GroupAccount::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(GroupAccount::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(GroupAccount::GroupId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(GroupAccount::UserId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(GroupAccount::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_group_account_group")
                            .from(GroupAccount::Table, GroupAccount::GroupId)
                            .to(ContentGroup::Table, ContentGroup::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_group_account_user")
                            .from(GroupAccount::Table, GroupAccount::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique constraint on (group_id, user_id)
        manager
            .create_index(
                Index::create()
                    .name("idx_group_account_unique")
                    .table(GroupAccount::Table)
                    .col(GroupAccount::GroupId)
                    .col(GroupAccount::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index on user_id
        manager
            .create_index(
                Index::create()
                    .name("idx_group_account_user_id")
                    .table(GroupAccount::Table)
                    .col(GroupAccount::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(GroupAccount::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(GroupFollower::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(GroupModerator::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ContentGroup::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum ContentGroup {
    Table,
    Id,
    Name,
    Description,
    OwnerId,
    CreatedAt,
}

#[derive(Iden)]
enum GroupModerator {
    Table,
    Id,
    GroupId,
    UserId,
    CreatedAt,
}

#[derive(Iden)]
enum GroupFollower {
    Table,
    Id,
    GroupId,
    UserId,
    CreatedAt,
}

#[derive(Iden)]
enum GroupAccount {
    Table,
    Id,
    GroupId,
    UserId,
    CreatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
