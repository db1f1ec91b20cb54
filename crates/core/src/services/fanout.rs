//! Fan-out service.
//!
//! Propagates group and relation mutations into follower feeds at write
//! time. Every step is an idempotent set mutation, so partial failures are
//! retryable and repeated application converges on the same feed state.

use sea_orm::Set;
use tidepool_common::{AppResult, IdGenerator};
use tidepool_db::{
    entities::{feed, feed_source, relation::RelationKind},
    repositories::FeedRepository,
};

/// Fan-out service for write-time feed maintenance.
#[derive(Clone)]
pub struct FanoutService {
    feed_repo: FeedRepository,
    id_gen: IdGenerator,
}

impl FanoutService {
    /// Create a new fan-out service.
    #[must_use]
    pub const fn new(feed_repo: FeedRepository) -> Self {
        Self {
            feed_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Get a user's feed by name, creating it empty if absent.
    ///
    /// A concurrent create can win the race on the `(owner, name)` unique
    /// key; in that case the insert fails and the feed is re-read, so both
    /// callers converge on the surviving row.
    pub async fn ensure_feed(&self, owner_id: &str, name: &str) -> AppResult<feed::Model> {
        if let Some(existing) = self.feed_repo.find_by_owner_and_name(owner_id, name).await? {
            return Ok(existing);
        }

        let model = feed::ActiveModel {
            id: Set(self.id_gen.generate()),
            owner_id: Set(owner_id.to_string()),
            name: Set(name.to_string()),
            sort_order: Set(feed::SortOrder::default()),
            created_at: Set(chrono::Utc::now().into()),
        };

        match self.feed_repo.create(model).await {
            Ok(created) => Ok(created),
            Err(e) => {
                // Lost the race: the row exists now. Anything else is a
                // genuine failure.
                if let Some(winner) =
                    self.feed_repo.find_by_owner_and_name(owner_id, name).await?
                {
                    Ok(winner)
                } else {
                    Err(e)
                }
            }
        }
    }

    /// Seed a new follower's feed from a snapshot of the group's accounts.
    ///
    /// Creates the feed if absent and adds each snapshot account. Accounts
    /// added to the group concurrently are delivered by their own fan-out,
    /// not by this snapshot.
    pub async fn on_group_followed(
        &self,
        user_id: &str,
        name: &str,
        account_ids: &[String],
    ) -> AppResult<()> {
        let feed = self.ensure_feed(user_id, name).await?;

        for account_id in account_ids {
            self.add_source(&feed.id, account_id).await?;
        }

        tracing::debug!(%user_id, %name, accounts = account_ids.len(), "seeded follower feed");
        Ok(())
    }

    /// Drop a follower's feed for a group they no longer follow. A missing
    /// feed is a no-op.
    pub async fn on_group_unfollowed(&self, user_id: &str, name: &str) -> AppResult<()> {
        if let Some(feed) = self.feed_repo.find_by_owner_and_name(user_id, name).await? {
            self.feed_repo.delete(&feed.id).await?;
            tracing::debug!(%user_id, %name, "deleted follower feed");
        }
        Ok(())
    }

    /// Deliver a group account addition into one follower's feed.
    ///
    /// Skips silently when the follower's feed no longer exists (they
    /// unfollowed while the fan-out was in flight).
    pub async fn push_account_added(
        &self,
        user_id: &str,
        name: &str,
        account_id: &str,
    ) -> AppResult<()> {
        let Some(feed) = self.feed_repo.find_by_owner_and_name(user_id, name).await? else {
            tracing::debug!(%user_id, %name, "no feed to deliver account addition into");
            return Ok(());
        };

        self.add_source(&feed.id, account_id).await
    }

    /// Deliver a group account removal into one follower's feed. Skips
    /// silently when the feed no longer exists.
    pub async fn push_account_removed(
        &self,
        user_id: &str,
        name: &str,
        account_id: &str,
    ) -> AppResult<()> {
        let Some(feed) = self.feed_repo.find_by_owner_and_name(user_id, name).await? else {
            tracing::debug!(%user_id, %name, "no feed to deliver account removal into");
            return Ok(());
        };

        self.feed_repo.remove_source(&feed.id, account_id).await
    }

    /// Mirror a new relation edge into the source user's canonical feed,
    /// creating the feed lazily.
    pub async fn on_relation_added(
        &self,
        user_id: &str,
        kind: RelationKind,
        target_id: &str,
    ) -> AppResult<()> {
        let feed = self.ensure_feed(user_id, kind.canonical_feed_name()).await?;
        self.add_source(&feed.id, target_id).await
    }

    /// Mirror a relation edge removal out of the source user's canonical
    /// feed. The feed is materialized if absent so that repeated calls
    /// converge on the same state.
    pub async fn on_relation_removed(
        &self,
        user_id: &str,
        kind: RelationKind,
        target_id: &str,
    ) -> AppResult<()> {
        let feed = self.ensure_feed(user_id, kind.canonical_feed_name()).await?;
        self.feed_repo.remove_source(&feed.id, target_id).await
    }

    async fn add_source(&self, feed_id: &str, account_id: &str) -> AppResult<()> {
        let model = feed_source::ActiveModel {
            id: Set(self.id_gen.generate()),
            feed_id: Set(feed_id.to_string()),
            account_id: Set(account_id.to_string()),
            created_at: Set(chrono::Utc::now().into()),
        };
        self.feed_repo.add_source(model).await
    }
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
            sort_order: feed::SortOrder::Recency,
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_ensure_feed_returns_existing() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_feed("f1", "u1", "following")]])
                .into_connection(),
        );

        let service = FanoutService::new(FeedRepository::new(db));
        let feed = service.ensure_feed("u1", "following").await.unwrap();

        assert_eq!(feed.id, "f1");
    }

    #[tokio::test]
    async fn test_ensure_feed_creates_when_absent() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                // Lookup misses, then the insert round-trips the new row.
                .append_query_results([Vec::<feed::Model>::new()])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .append_query_results([[test_feed("f2", "u1", "news")]])
                .into_connection(),
        );

        let service = FanoutService::new(FeedRepository::new(db));
        let feed = service.ensure_feed("u1", "news").await.unwrap();

        assert_eq!(feed.name, "news");
    }

    #[tokio::test]
    async fn test_push_account_added_skips_missing_feed() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<feed::Model>::new()])
                .into_connection(),
        );

        let service = FanoutService::new(FeedRepository::new(db));
        let result = service.push_account_added("u1", "gone", "a1").await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_on_group_unfollowed_missing_feed_is_noop() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<feed::Model>::new()])
                .into_connection(),
        );

        let service = FanoutService::new(FeedRepository::new(db));
        let result = service.on_group_unfollowed("u1", "gone").await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_on_group_followed_seeds_snapshot() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_feed("f1", "u1", "tech")]])
                .append_exec_results([
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                ])
                .into_connection(),
        );

        let service = FanoutService::new(FeedRepository::new(db));
        let snapshot = vec!["a1".to_string(), "a2".to_string()];
        let result = service.on_group_followed("u1", "tech", &snapshot).await;

        assert!(result.is_ok());
    }
}
