//! Relation (edge) entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Kind of a directed user-to-user edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum RelationKind {
    #[sea_orm(string_value = "follow")]
    Follow,
    #[sea_orm(string_value = "friend")]
    Friend,
    #[sea_orm(string_value = "favorite")]
    Favorite,
}

impl RelationKind {
    /// Name of the canonical feed this edge kind is mirrored into.
    #[must_use]
    pub const fn canonical_feed_name(self) -> &'static str {
        match self {
            Self::Follow => "following",
            Self::Friend => "friends",
            Self::Favorite => "favorites",
        }
    }
}

/// Directed edge between two users.
///
/// One row is the single source of truth for both traversal directions;
/// `source_id` and `target_id` are each indexed so forward and reverse
/// lookups are symmetric. A `(kind, source, target)` unique key gives the
/// edge set semantics.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "relation")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub kind: RelationKind,

    /// User the edge points from.
    #[sea_orm(indexed)]
    pub source_id: String,

    /// User the edge points to.
    #[sea_orm(indexed)]
    pub target_id: String,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::SourceId",
        to = "super::user::Column::Id"
    )]
    SourceUser,

    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::TargetId",
        to = "super::user::Column::Id"
    )]
    TargetUser,
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_feed_names() {
        assert_eq!(RelationKind::Follow.canonical_feed_name(), "following");
        assert_eq!(RelationKind::Friend.canonical_feed_name(), "friends");
        assert_eq!(RelationKind::Favorite.canonical_feed_name(), "favorites");
    }
}
