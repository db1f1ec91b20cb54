//! Feed repository.

use std::sync::Arc;

use crate::entities::{Feed, FeedSource, feed, feed_source};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
};
use tidepool_common::{AppError, AppResult};

/// Feed repository.
///
/// Feeds are keyed by `(owner_id, name)`; the source-account set lives in
/// `feed_source` with a `(feed_id, account_id)` unique key. Source
/// mutations are conflict-guarded single statements: concurrent fan-out
/// events against the same feed serialize at the row level and repeated
/// application converges on the same set.
#[derive(Clone)]
pub struct FeedRepository {
    db: Arc<DatabaseConnection>,
}

impl FeedRepository {
    /// Create a new feed repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a feed by owner and name.
    pub async fn find_by_owner_and_name(
        &self,
        owner_id: &str,
        name: &str,
    ) -> AppResult<Option<feed::Model>> {
        Feed::find()
            .filter(feed::Column::OwnerId.eq(owner_id))
            .filter(feed::Column::Name.eq(name))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a feed by owner and name, returning an error if not found.
    pub async fn get_by_owner_and_name(&self, owner_id: &str, name: &str) -> AppResult<feed::Model> {
        self.find_by_owner_and_name(owner_id, name)
            .await?
            .ok_or_else(|| AppError::FeedNotFound(name.to_string()))
    }

    /// Create a new feed row.
    pub async fn create(&self, model: feed::ActiveModel) -> AppResult<feed::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a feed row (sort order changes).
    pub async fn update(&self, model: feed::ActiveModel) -> AppResult<feed::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Feeds owned by a user.
    pub async fn find_by_owner(&self, owner_id: &str) -> AppResult<Vec<feed::Model>> {
        Feed::find()
            .filter(feed::Column::OwnerId.eq(owner_id))
            .order_by_asc(feed::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a feed and its source rows. Returns whether a feed existed.
    pub async fn delete(&self, feed_id: &str) -> AppResult<bool> {
        FeedSource::delete_many()
            .filter(feed_source::Column::FeedId.eq(feed_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let result = Feed::delete_by_id(feed_id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected > 0)
    }

    /// Delete all feeds owned by a user (account deletion cascade).
    pub async fn delete_all_by_owner(&self, owner_id: &str) -> AppResult<()> {
        let feeds = self.find_by_owner(owner_id).await?;
        for f in feeds {
            self.delete(&f.id).await?;
        }
        Ok(())
    }

    // ==================== Source accounts ====================

    /// Add a source account to a feed; a no-op if already present.
    pub async fn add_source(&self, model: feed_source::ActiveModel) -> AppResult<()> {
        FeedSource::insert(model)
            .on_conflict(
                OnConflict::columns([
                    feed_source::Column::FeedId,
                    feed_source::Column::AccountId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Remove a source account from a feed; a no-op if absent.
    pub async fn remove_source(&self, feed_id: &str, account_id: &str) -> AppResult<()> {
        FeedSource::delete_many()
            .filter(feed_source::Column::FeedId.eq(feed_id))
            .filter(feed_source::Column::AccountId.eq(account_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Remove an account from every feed that sources it (account deletion
    /// cascade).
    pub async fn remove_source_everywhere(&self, account_id: &str) -> AppResult<u64> {
        let result = FeedSource::delete_many()
            .filter(feed_source::Column::AccountId.eq(account_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }

    /// Source account IDs of a feed.
    pub async fn find_source_ids(&self, feed_id: &str) -> AppResult<Vec<String>> {
        let rows = FeedSource::find()
            .filter(feed_source::Column::FeedId.eq(feed_id))
            .order_by_asc(feed_source::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(rows.into_iter().map(|s| s.account_id).collect())
    }

    /// Check whether a feed sources an account.
    pub async fn has_source(&self, feed_id: &str, account_id: &str) -> AppResult<bool> {
        let row = FeedSource::find()
            .filter(feed_source::Column::FeedId.eq(feed_id))
            .filter(feed_source::Column::AccountId.eq(account_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(row.is_some())
    }
}
