//! Feed entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// How a materialized feed is ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum SortOrder {
    /// Newest modification first.
    #[sea_orm(string_value = "recency")]
    Recency,
    /// Oldest modification first.
    #[sea_orm(string_value = "recency_rev")]
    RecencyReversed,
    /// Most-liked first, recency as tie-break.
    #[sea_orm(string_value = "engagement")]
    Engagement,
}

impl Default for SortOrder {
    fn default() -> Self {
        Self::Recency
    }
}

/// Feed entity: a named, per-user materialized view definition.
///
/// The source-account set lives in `feed_source`. `(owner_id, name)` is
/// unique. A feed sharing its name with a group the owner follows is that
/// group's projection for the owner and is maintained by fan-out; the
/// canonical feeds (`following`, `friends`, `favorites`) are maintained by
/// relation mutations instead.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "feed")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(indexed)]
    pub owner_id: String,

    pub name: String,

    pub sort_order: SortOrder,

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

    #[sea_orm(has_many = "super::feed_source::Entity")]
    Sources,
}

impl ActiveModelBehavior for ActiveModel {}
