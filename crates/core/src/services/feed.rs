//! Feed service.

use sea_orm::Set;
use tidepool_common::{AppError, AppResult, IdGenerator};
use tidepool_db::{
    entities::{feed, feed::SortOrder, feed_source},
    repositories::FeedRepository,
};

const MAX_FEED_NAME_LENGTH: usize = 64;

/// Feed service for managing named per-user feeds.
#[derive(Clone)]
pub struct FeedService {
    feed_repo: FeedRepository,
    id_gen: IdGenerator,
}

impl FeedService {
    /// Create a new feed service.
    #[must_use]
    pub const fn new(feed_repo: FeedRepository) -> Self {
        Self {
            feed_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a feed.
    pub async fn create(
        &self,
        owner_id: &str,
        name: &str,
        sort_order: SortOrder,
    ) -> AppResult<feed::Model> {
        let name = validate_feed_name(name)?;

        if self
            .feed_repo
            .find_by_owner_and_name(owner_id, name)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(format!(
                "Feed {name} already exists for this user"
            )));
        }

        let model = feed::ActiveModel {
            id: Set(self.id_gen.generate()),
            owner_id: Set(owner_id.to_string()),
            name: Set(name.to_string()),
            sort_order: Set(sort_order),
            created_at: Set(chrono::Utc::now().into()),
        };
        match self.feed_repo.create(model).await {
            Ok(feed) => Ok(feed),
            Err(e) => {
                // The insert can lose a race against a concurrent create of
                // the same (owner, name). If the row exists now, report the
                // duplicate rather than a database failure.
                if self
                    .feed_repo
                    .find_by_owner_and_name(owner_id, name)
                    .await?
                    .is_some()
                {
                    return Err(AppError::Conflict(format!(
                        "Feed {name} already exists for this user"
                    )));
                }
                Err(e)
            }
        }
    }

    /// Get a feed by owner and name.
    pub async fn find(&self, owner_id: &str, name: &str) -> AppResult<feed::Model> {
        self.feed_repo.get_by_owner_and_name(owner_id, name).await
    }

    /// Delete a feed and its source set.
    pub async fn delete(&self, owner_id: &str, name: &str) -> AppResult<()> {
        let feed = self.feed_repo.get_by_owner_and_name(owner_id, name).await?;
        self.feed_repo.delete(&feed.id).await?;
        Ok(())
    }

    /// Add an account to a feed's source set; a no-op if already present.
    pub async fn add_source_account(
        &self,
        owner_id: &str,
        name: &str,
        account_id: &str,
    ) -> AppResult<()> {
        let feed = self.feed_repo.get_by_owner_and_name(owner_id, name).await?;

        let model = feed_source::ActiveModel {
            id: Set(self.id_gen.generate()),
            feed_id: Set(feed.id),
            account_id: Set(account_id.to_string()),
            created_at: Set(chrono::Utc::now().into()),
        };
        self.feed_repo.add_source(model).await
    }

    /// Remove an account from a feed's source set; a no-op if absent.
    pub async fn remove_source_account(
        &self,
        owner_id: &str,
        name: &str,
        account_id: &str,
    ) -> AppResult<()> {
        let feed = self.feed_repo.get_by_owner_and_name(owner_id, name).await?;
        self.feed_repo.remove_source(&feed.id, account_id).await
    }

    /// Change a feed's sort order.
    pub async fn set_sort_order(
        &self,
        owner_id: &str,
        name: &str,
        sort_order: SortOrder,
    ) -> AppResult<feed::Model> {
        let feed = self.feed_repo.get_by_owner_and_name(owner_id, name).await?;

        let mut model: feed::ActiveModel = feed.into();
        model.sort_order = Set(sort_order);
        self.feed_repo.update(model).await
    }

    /// Check whether a feed sources an account.
    pub async fn contains_source(
        &self,
        owner_id: &str,
        name: &str,
        account_id: &str,
    ) -> AppResult<bool> {
        let feed = self.feed_repo.get_by_owner_and_name(owner_id, name).await?;
        self.feed_repo.has_source(&feed.id, account_id).await
    }

    /// Feeds owned by a user.
    pub async fn list_for_owner(&self, owner_id: &str) -> AppResult<Vec<feed::Model>> {
        self.feed_repo.find_by_owner(owner_id).await
    }
}

fn validate_feed_name(name: &str) -> AppResult<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("Feed name is required".to_string()));
    }
    if name.len() > MAX_FEED_NAME_LENGTH {
        return Err(AppError::BadRequest("Feed name too long".to_string()));
    }
    Ok(name)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn test_feed(id: &str, owner_id: &str, name: &str) -> feed::Model {
        feed::Model {
            id: id.to_string(),
            owner_id: owner_id.to_string(),
            name: name.to_string(),
            sort_order: SortOrder::Recency,
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_create_rejects_empty_name() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = FeedService::new(FeedRepository::new(db));

        let result = service.create("u1", "   ", SortOrder::Recency).await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_name() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_feed("f1", "u1", "news")]])
                .into_connection(),
        );
        let service = FeedService::new(FeedRepository::new(db));

        let result = service.create("u1", "news", SortOrder::Recency).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_create_lost_race_reports_conflict() {
        // The duplicate check misses, the insert hits the unique key, and
        // the re-check finds the row a concurrent create won with.
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<feed::Model>::new()])
                .append_query_errors([sea_orm::DbErr::Custom(
                    "duplicate key value violates unique constraint \"idx_feed_owner_name\""
                        .to_string(),
                )])
                .append_query_results([[test_feed("f1", "u1", "news")]])
                .into_connection(),
        );
        let service = FeedService::new(FeedRepository::new(db));

        let result = service.create("u1", "news", SortOrder::Recency).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_create() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<feed::Model>::new()])
                .append_query_results([[test_feed("f1", "u1", "news")]])
                .into_connection(),
        );
        let service = FeedService::new(FeedRepository::new(db));

        let feed = service
            .create("u1", "news", SortOrder::Recency)
            .await
            .unwrap();
        assert_eq!(feed.name, "news");
    }

    #[tokio::test]
    async fn test_add_source_account_missing_feed() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<feed::Model>::new()])
                .into_connection(),
        );
        let service = FeedService::new(FeedRepository::new(db));

        let result = service.add_source_account("u1", "missing", "a1").await;
        assert!(matches!(result, Err(AppError::FeedNotFound(_))));
    }

    #[tokio::test]
    async fn test_add_source_account() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_feed("f1", "u1", "news")]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );
        let service = FeedService::new(FeedRepository::new(db));

        let result = service.add_source_account("u1", "news", "a1").await;
        assert!(result.is_ok());
    }
}
