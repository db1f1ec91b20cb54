//! User entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// User entity.
///
/// Identity itself (credentials, sessions) lives outside the core; this row
/// exists so names can be resolved to stable identifiers and back.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Unique handle.
    #[sea_orm(unique)]
    pub username: String,

    /// Lowercased handle for case-insensitive lookup.
    #[sea_orm(indexed)]
    pub username_lower: String,

    /// Display name shown in materialized feeds.
    #[sea_orm(nullable)]
    pub display_name: Option<String>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
