//! Content group entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Content group entity.
///
/// The moderator, follower, and account sets live in their own join tables
/// (`group_moderator`, `group_follower`, `group_account`); this row carries
/// only the identity of the group. Group names are globally unique and
/// immutable, and share a namespace with usernames.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "content_group")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(unique)]
    pub name: String,

    #[sea_orm(column_type = "Text")]
    pub description: String,

    #[sea_orm(indexed)]
    pub owner_id: String,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::OwnerId",
        to = "super::user::Column::Id"
    )]
    Owner,

    #[sea_orm(has_many = "super::group_moderator::Entity")]
    Moderators,

    #[sea_orm(has_many = "super::group_follower::Entity")]
    Followers,

    #[sea_orm(has_many = "super::group_account::Entity")]
    Accounts,
}

impl ActiveModelBehavior for ActiveModel {}
