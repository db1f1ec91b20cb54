//! Relation (edge) repository.

use std::sync::Arc;

use crate::entities::{Relation, relation, relation::RelationKind};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
};
use tidepool_common::{AppError, AppResult};

/// Relation repository for edge storage.
///
/// Edges are rows with a `(kind, source, target)` unique key; adds are
/// conflict-guarded and removes unconditional, so every mutation is an
/// idempotent single statement.
#[derive(Clone)]
pub struct RelationRepository {
    db: Arc<DatabaseConnection>,
}

impl RelationRepository {
    /// Create a new relation repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Insert an edge; a no-op if it already exists.
    pub async fn create(&self, model: relation::ActiveModel) -> AppResult<()> {
        Relation::insert(model)
            .on_conflict(
                OnConflict::columns([
                    relation::Column::Kind,
                    relation::Column::SourceId,
                    relation::Column::TargetId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Delete an edge; a no-op if it does not exist.
    pub async fn delete(&self, kind: RelationKind, source_id: &str, target_id: &str) -> AppResult<()> {
        Relation::delete_many()
            .filter(relation::Column::Kind.eq(kind))
            .filter(relation::Column::SourceId.eq(source_id))
            .filter(relation::Column::TargetId.eq(target_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Check whether an edge exists.
    pub async fn exists(
        &self,
        kind: RelationKind,
        source_id: &str,
        target_id: &str,
    ) -> AppResult<bool> {
        let count = Relation::find()
            .filter(relation::Column::Kind.eq(kind))
            .filter(relation::Column::SourceId.eq(source_id))
            .filter(relation::Column::TargetId.eq(target_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(count > 0)
    }

    /// Edges of a kind pointing from a user. Unknown users yield an empty
    /// list, never an error.
    pub async fn find_forward(
        &self,
        kind: RelationKind,
        source_id: &str,
    ) -> AppResult<Vec<relation::Model>> {
        Relation::find()
            .filter(relation::Column::Kind.eq(kind))
            .filter(relation::Column::SourceId.eq(source_id))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Edges of a kind pointing at a user.
    pub async fn find_reverse(
        &self,
        kind: RelationKind,
        target_id: &str,
    ) -> AppResult<Vec<relation::Model>> {
        Relation::find()
            .filter(relation::Column::Kind.eq(kind))
            .filter(relation::Column::TargetId.eq(target_id))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Remove every edge touching a user, in either direction and of every
    /// kind. Used when a user account is deleted.
    pub async fn delete_all_for_user(&self, user_id: &str) -> AppResult<u64> {
        let result = Relation::delete_many()
            .filter(
                Condition::any()
                    .add(relation::Column::SourceId.eq(user_id))
                    .add(relation::Column::TargetId.eq(user_id)),
            )
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }
}
