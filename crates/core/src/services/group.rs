//! Content group service.
//!
//! Groups are curated account collections. Followers hold a same-named feed
//! maintained by fan-out: account changes are pushed into every follower's
//! feed at write time, follower-by-follower. A failed delivery is logged and
//! returned only after the remaining followers have been attempted; every
//! delivery is idempotent, so retrying the same call converges.

use crate::services::fanout::FanoutService;
use sea_orm::Set;
use tidepool_common::{AppError, AppResult, IdGenerator};
use tidepool_db::{
    entities::{content_group, group_account, group_follower, group_moderator},
    repositories::{GroupRepository, UserRepository},
};

const MAX_GROUP_NAME_LENGTH: usize = 64;

/// Input for creating a group.
pub struct CreateGroupInput {
    pub name: String,
    pub description: String,
}

/// Content group service.
#[derive(Clone)]
pub struct GroupService {
    group_repo: GroupRepository,
    user_repo: UserRepository,
    fanout: FanoutService,
    id_gen: IdGenerator,
}

impl GroupService {
    /// Create a new group service.
    #[must_use]
    pub const fn new(
        group_repo: GroupRepository,
        user_repo: UserRepository,
        fanout: FanoutService,
    ) -> Self {
        Self {
            group_repo,
            user_repo,
            fanout,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a group.
    ///
    /// Group names share a namespace with usernames, so a name held by
    /// either is a conflict. The owner becomes the first moderator and the
    /// first follower, with an empty feed created for them.
    ///
    /// A name held by a group the caller already owns is not a conflict:
    /// the seeding steps are re-run instead, so a create that stopped
    /// between the group insert and the owner seeding is completed by
    /// retrying the same call.
    pub async fn create(
        &self,
        owner_id: &str,
        input: CreateGroupInput,
    ) -> AppResult<content_group::Model> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(AppError::BadRequest("Group name is required".to_string()));
        }
        if name.len() > MAX_GROUP_NAME_LENGTH {
            return Err(AppError::BadRequest("Group name too long".to_string()));
        }

        if let Some(existing) = self.group_repo.find_by_name(name).await? {
            if existing.owner_id != owner_id {
                return Err(AppError::Conflict(format!(
                    "Group name {name} is already taken"
                )));
            }
            // Same owner retrying: every seeding step is conflict-guarded,
            // so this is a no-op on a completed create and finishes a
            // partial one.
            self.seed_owner(&existing, owner_id).await?;
            return Ok(existing);
        }
        if self.user_repo.username_exists(name).await? {
            return Err(AppError::Conflict(format!(
                "Name {name} is already taken by a user"
            )));
        }

        self.user_repo.get_by_id(owner_id).await?;

        let group = self
            .group_repo
            .create(content_group::ActiveModel {
                id: Set(self.id_gen.generate()),
                name: Set(name.to_string()),
                description: Set(input.description),
                owner_id: Set(owner_id.to_string()),
                created_at: Set(chrono::Utc::now().into()),
            })
            .await?;

        self.seed_owner(&group, owner_id).await?;

        tracing::debug!(%owner_id, %name, "created group");
        Ok(group)
    }

    /// Seed the owner into the moderator and follower sets and create
    /// their feed. Idempotent; the feed is seeded from the group's current
    /// accounts, which is empty on a fresh create.
    async fn seed_owner(&self, group: &content_group::Model, owner_id: &str) -> AppResult<()> {
        self.group_repo
            .add_moderator(group_moderator::ActiveModel {
                id: Set(self.id_gen.generate()),
                group_id: Set(group.id.clone()),
                user_id: Set(owner_id.to_string()),
                created_at: Set(chrono::Utc::now().into()),
            })
            .await?;

        self.group_repo
            .add_follower(group_follower::ActiveModel {
                id: Set(self.id_gen.generate()),
                group_id: Set(group.id.clone()),
                user_id: Set(owner_id.to_string()),
                created_at: Set(chrono::Utc::now().into()),
            })
            .await?;

        let snapshot = self.group_repo.find_account_ids(&group.id).await?;
        self.fanout
            .on_group_followed(owner_id, &group.name, &snapshot)
            .await
    }

    /// Get a group by name.
    pub async fn find(&self, name: &str) -> AppResult<content_group::Model> {
        self.group_repo.get_by_name(name).await
    }

    /// Delete a group. Owner only.
    ///
    /// Cascade order: every follower's feed and follower row go first, the
    /// group row last, so a partially-failed delete can be retried.
    pub async fn delete(&self, name: &str, caller_id: &str) -> AppResult<()> {
        let group = self.group_repo.get_by_name(name).await?;
        if group.owner_id != caller_id {
            return Err(AppError::Forbidden(
                "Only the owner can delete a group".to_string(),
            ));
        }

        let follower_ids = self.group_repo.find_follower_ids(&group.id).await?;
        let mut first_err: Option<AppError> = None;

        for follower_id in &follower_ids {
            let result = async {
                self.fanout.on_group_unfollowed(follower_id, name).await?;
                self.group_repo.remove_follower(&group.id, follower_id).await
            }
            .await;

            if let Err(e) = result {
                tracing::warn!(%name, %follower_id, error = %e, "group delete cascade step failed");
                first_err.get_or_insert(e);
            }
        }

        if let Some(e) = first_err {
            return Err(e);
        }

        self.group_repo.delete(&group.id).await?;
        tracing::debug!(%name, followers = follower_ids.len(), "deleted group");
        Ok(())
    }

    // ==================== Moderators ====================

    /// Add a moderator by username. Owner only.
    pub async fn add_moderator(
        &self,
        name: &str,
        caller_id: &str,
        username: &str,
    ) -> AppResult<()> {
        let group = self.group_repo.get_by_name(name).await?;
        if group.owner_id != caller_id {
            return Err(AppError::Forbidden(
                "Only the owner can manage moderators".to_string(),
            ));
        }

        let target = self.user_repo.get_by_username(username).await?;

        self.group_repo
            .add_moderator(group_moderator::ActiveModel {
                id: Set(self.id_gen.generate()),
                group_id: Set(group.id),
                user_id: Set(target.id),
                created_at: Set(chrono::Utc::now().into()),
            })
            .await
    }

    /// Remove a moderator by username. Owner only; the owner's own
    /// moderator role cannot be removed.
    pub async fn remove_moderator(
        &self,
        name: &str,
        caller_id: &str,
        username: &str,
    ) -> AppResult<()> {
        let group = self.group_repo.get_by_name(name).await?;
        if group.owner_id != caller_id {
            return Err(AppError::Forbidden(
                "Only the owner can manage moderators".to_string(),
            ));
        }

        let target = self.user_repo.get_by_username(username).await?;
        if target.id == group.owner_id {
            return Err(AppError::BadRequest(
                "The owner cannot be removed from moderators".to_string(),
            ));
        }

        self.group_repo.remove_moderator(&group.id, &target.id).await
    }

    /// Check whether a user owns the group.
    pub async fn is_owner(&self, name: &str, user_id: &str) -> AppResult<bool> {
        let group = self.group_repo.get_by_name(name).await?;
        Ok(group.owner_id == user_id)
    }

    /// Check whether a user moderates the group.
    pub async fn is_moderator(&self, name: &str, user_id: &str) -> AppResult<bool> {
        let group = self.group_repo.get_by_name(name).await?;
        self.group_repo.is_moderator(&group.id, user_id).await
    }

    // ==================== Accounts ====================

    /// Add an account to the group. Moderator only.
    ///
    /// The addition fans out into every follower's feed.
    pub async fn add_account(&self, name: &str, caller_id: &str, username: &str) -> AppResult<()> {
        let group = self.group_repo.get_by_name(name).await?;
        if !self.group_repo.is_moderator(&group.id, caller_id).await? {
            return Err(AppError::Forbidden(
                "Only moderators can manage group accounts".to_string(),
            ));
        }

        let account = self.user_repo.get_by_username(username).await?;

        self.group_repo
            .add_account(group_account::ActiveModel {
                id: Set(self.id_gen.generate()),
                group_id: Set(group.id.clone()),
                user_id: Set(account.id.clone()),
                created_at: Set(chrono::Utc::now().into()),
            })
            .await?;

        let follower_ids = self.group_repo.find_follower_ids(&group.id).await?;
        let mut first_err: Option<AppError> = None;

        for follower_id in &follower_ids {
            if let Err(e) = self
                .fanout
                .push_account_added(follower_id, name, &account.id)
                .await
            {
                tracing::warn!(%name, %follower_id, error = %e, "account-added fan-out step failed");
                first_err.get_or_insert(e);
            }
        }

        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Remove an account from the group. Moderator only.
    ///
    /// The removal fans out into every follower's feed.
    pub async fn remove_account(
        &self,
        name: &str,
        caller_id: &str,
        username: &str,
    ) -> AppResult<()> {
        let group = self.group_repo.get_by_name(name).await?;
        if !self.group_repo.is_moderator(&group.id, caller_id).await? {
            return Err(AppError::Forbidden(
                "Only moderators can manage group accounts".to_string(),
            ));
        }

        let account = self.user_repo.get_by_username(username).await?;

        self.group_repo.remove_account(&group.id, &account.id).await?;

        let follower_ids = self.group_repo.find_follower_ids(&group.id).await?;
        let mut first_err: Option<AppError> = None;

        for follower_id in &follower_ids {
            if let Err(e) = self
                .fanout
                .push_account_removed(follower_id, name, &account.id)
                .await
            {
                tracing::warn!(%name, %follower_id, error = %e, "account-removed fan-out step failed");
                first_err.get_or_insert(e);
            }
        }

        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    // ==================== Followers ====================

    /// Follow a group.
    ///
    /// Seeds the follower's feed from a snapshot of the group's current
    /// accounts. Following an already-followed group converges on the same
    /// state.
    pub async fn add_follower(&self, name: &str, user_id: &str) -> AppResult<()> {
        let group = self.group_repo.get_by_name(name).await?;
        self.user_repo.get_by_id(user_id).await?;

        self.group_repo
            .add_follower(group_follower::ActiveModel {
                id: Set(self.id_gen.generate()),
                group_id: Set(group.id.clone()),
                user_id: Set(user_id.to_string()),
                created_at: Set(chrono::Utc::now().into()),
            })
            .await?;

        let snapshot = self.group_repo.find_account_ids(&group.id).await?;
        self.fanout
            .on_group_followed(user_id, name, &snapshot)
            .await
    }

    /// Unfollow a group, deleting the follower's feed for it.
    pub async fn remove_follower(&self, name: &str, user_id: &str) -> AppResult<()> {
        let group = self.group_repo.get_by_name(name).await?;

        self.group_repo.remove_follower(&group.id, user_id).await?;
        self.fanout.on_group_unfollowed(user_id, name).await
    }

    /// Follower IDs of a group.
    pub async fn list_followers(&self, name: &str) -> AppResult<Vec<String>> {
        let group = self.group_repo.get_by_name(name).await?;
        self.group_repo.find_follower_ids(&group.id).await
    }

    /// Source account IDs of a group.
    pub async fn list_accounts(&self, name: &str) -> AppResult<Vec<String>> {
        let group = self.group_repo.get_by_name(name).await?;
        self.group_repo.find_account_ids(&group.id).await
    }

    /// Moderator IDs of a group.
    pub async fn list_moderators(&self, name: &str) -> AppResult<Vec<String>> {
        let group = self.group_repo.get_by_name(name).await?;
        self.group_repo.find_moderator_ids(&group.id).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;
    use tidepool_db::entities::{feed, user};
    use tidepool_db::repositories::FeedRepository;

    fn test_group(id: &str, name: &str, owner_id: &str) -> content_group::Model {
        content_group::Model {
            id: id.to_string(),
            name: name.to_string(),
            description: String::new(),
            owner_id: owner_id.to_string(),
            created_at: Utc::now().into(),
        }
    }

    fn test_user(id: &str, username: &str) -> user::Model {
        user::Model {
            id: id.to_string(),
            username: username.to_string(),
            username_lower: username.to_lowercase(),
            display_name: None,
            created_at: Utc::now().into(),
        }
    }

    fn test_feed(id: &str, owner_id: &str, name: &str) -> feed::Model {
        feed::Model {
            id: id.to_string(),
            owner_id: owner_id.to_string(),
            name: name.to_string(),
            sort_order: feed::SortOrder::Recency,
            created_at: Utc::now().into(),
        }
    }

    fn ok_exec() -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected: 1,
        }
    }

    fn service(
        group_db: Arc<sea_orm::DatabaseConnection>,
        user_db: Arc<sea_orm::DatabaseConnection>,
        feed_db: Arc<sea_orm::DatabaseConnection>,
    ) -> GroupService {
        GroupService::new(
            GroupRepository::new(group_db),
            UserRepository::new(user_db),
            FanoutService::new(FeedRepository::new(feed_db)),
        )
    }

    #[tokio::test]
    async fn test_create_rejects_empty_name() {
        let group_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let user_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let feed_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let result = service(group_db, user_db, feed_db)
            .create(
                "u1",
                CreateGroupInput {
                    name: "  ".to_string(),
                    description: String::new(),
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_create_rejects_name_held_by_user() {
        // Group name free, username taken.
        let group_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<content_group::Model>::new()])
                .into_connection(),
        );
        let user_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![maplit::btreemap! {
                    "num_items" => sea_orm::Value::from(1i64),
                }]])
                .into_connection(),
        );
        let feed_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let result = service(group_db, user_db, feed_db)
            .create(
                "u1",
                CreateGroupInput {
                    name: "alice".to_string(),
                    description: String::new(),
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_create_rejects_name_held_by_other_owner() {
        let group_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_group("g1", "tech", "u1")]])
                .into_connection(),
        );
        let user_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let feed_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let result = service(group_db, user_db, feed_db)
            .create(
                "u2",
                CreateGroupInput {
                    name: "tech".to_string(),
                    description: String::new(),
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_create_retry_completes_partial_create() {
        // The group row exists from an interrupted create by the same
        // owner. Retrying re-seeds the moderator row, the follower row and
        // the owner's feed instead of reporting a conflict.
        let group_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_group("g1", "tech", "u1")]])
                .append_exec_results([ok_exec(), ok_exec()])
                .append_query_results([Vec::<tidepool_db::entities::group_account::Model>::new()])
                .into_connection(),
        );
        let user_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        // The owner's feed is missing and gets created.
        let feed_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<feed::Model>::new()])
                .append_query_results([[test_feed("f1", "u1", "tech")]])
                .into_connection(),
        );

        let group = service(group_db, user_db, feed_db)
            .create(
                "u1",
                CreateGroupInput {
                    name: "tech".to_string(),
                    description: String::new(),
                },
            )
            .await
            .unwrap();

        assert_eq!(group.id, "g1");
    }

    #[tokio::test]
    async fn test_group_lifecycle_fans_out_to_owner_and_follower_feeds() {
        // Create the group, add an account, gain a follower, then remove
        // the account again. Both the owner's and the follower's feeds
        // must receive the account and must lose it.
        let moderator_row = tidepool_db::entities::group_moderator::Model {
            id: "m1".to_string(),
            group_id: "g1".to_string(),
            user_id: "u1".to_string(),
            created_at: Utc::now().into(),
        };
        let follower_row = |id: &str, user_id: &str| tidepool_db::entities::group_follower::Model {
            id: id.to_string(),
            group_id: "g1".to_string(),
            user_id: user_id.to_string(),
            created_at: Utc::now().into(),
        };

        let group_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                // create: name free, insert, owner seeding snapshot
                .append_query_results([Vec::<content_group::Model>::new()])
                .append_query_results([[test_group("g1", "tech", "u1")]])
                .append_exec_results([ok_exec(), ok_exec()])
                .append_query_results([Vec::<tidepool_db::entities::group_account::Model>::new()])
                // add_account: lookup, moderator check, insert, followers
                .append_query_results([[test_group("g1", "tech", "u1")]])
                .append_query_results([[moderator_row.clone()]])
                .append_exec_results([ok_exec()])
                .append_query_results([vec![follower_row("gf1", "u1")]])
                // add_follower: lookup, insert, snapshot
                .append_query_results([[test_group("g1", "tech", "u1")]])
                .append_exec_results([ok_exec()])
                .append_query_results([vec![tidepool_db::entities::group_account::Model {
                    id: "a1".to_string(),
                    group_id: "g1".to_string(),
                    user_id: "u2".to_string(),
                    created_at: Utc::now().into(),
                }]])
                // remove_account: lookup, moderator check, delete, followers
                .append_query_results([[test_group("g1", "tech", "u1")]])
                .append_query_results([[moderator_row]])
                .append_exec_results([ok_exec()])
                .append_query_results([vec![
                    follower_row("gf1", "u1"),
                    follower_row("gf2", "u3"),
                ]])
                .into_connection(),
        );
        let user_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                // create: username namespace free, owner exists
                .append_query_results([vec![maplit::btreemap! {
                    "num_items" => sea_orm::Value::from(0i64),
                }]])
                .append_query_results([[test_user("u1", "ursula")]])
                // add_account resolves alice, add_follower resolves vic
                .append_query_results([[test_user("u2", "alice")]])
                .append_query_results([[test_user("u3", "vic")]])
                // remove_account resolves alice again
                .append_query_results([[test_user("u2", "alice")]])
                .into_connection(),
        );
        let feed_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                // create: owner's feed created empty
                .append_query_results([Vec::<feed::Model>::new()])
                .append_query_results([[test_feed("f1", "u1", "tech")]])
                // add_account: alice lands in the owner's feed
                .append_query_results([[test_feed("f1", "u1", "tech")]])
                .append_exec_results([ok_exec()])
                // add_follower: vic's feed created and seeded with alice
                .append_query_results([Vec::<feed::Model>::new()])
                .append_query_results([[test_feed("f2", "u3", "tech")]])
                .append_exec_results([ok_exec()])
                // remove_account: alice leaves both feeds
                .append_query_results([[test_feed("f1", "u1", "tech")]])
                .append_exec_results([ok_exec()])
                .append_query_results([[test_feed("f2", "u3", "tech")]])
                .append_exec_results([ok_exec()])
                .into_connection(),
        );

        let svc = service(group_db, user_db, feed_db.clone());

        svc.create(
            "u1",
            CreateGroupInput {
                name: "tech".to_string(),
                description: String::new(),
            },
        )
        .await
        .unwrap();
        svc.add_account("tech", "u1", "alice").await.unwrap();
        svc.add_follower("tech", "u3").await.unwrap();
        svc.remove_account("tech", "u1", "alice").await.unwrap();

        drop(svc);
        let log = Arc::try_unwrap(feed_db).ok().unwrap().into_transaction_log();
        let statements: Vec<String> = log.iter().map(|t| format!("{t:?}")).collect();
        let source_inserts = statements
            .iter()
            .filter(|s| s.contains("INSERT") && s.contains("feed_source"))
            .count();
        let source_deletes = statements
            .iter()
            .filter(|s| s.contains("DELETE") && s.contains("feed_source"))
            .count();

        // One delivery into each of the two feeds, one eviction from each.
        assert_eq!(source_inserts, 2);
        assert_eq!(source_deletes, 2);
    }

    #[tokio::test]
    async fn test_delete_forbidden_for_non_owner() {
        let group_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_group("g1", "tech", "u1")]])
                .into_connection(),
        );
        let user_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let feed_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let result = service(group_db, user_db, feed_db).delete("tech", "u2").await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_delete_cascades_follower_feeds() {
        let group_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_group("g1", "tech", "u1")]])
                .append_query_results([vec![
                    tidepool_db::entities::group_follower::Model {
                        id: "gf1".to_string(),
                        group_id: "g1".to_string(),
                        user_id: "u2".to_string(),
                        created_at: Utc::now().into(),
                    },
                ]])
                // remove_follower, then the four deletes of the group cascade
                .append_exec_results([ok_exec(), ok_exec(), ok_exec(), ok_exec(), ok_exec()])
                .into_connection(),
        );
        let user_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        // Follower's feed found, then its sources and the feed row deleted.
        let feed_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_feed("f1", "u2", "tech")]])
                .append_exec_results([ok_exec(), ok_exec()])
                .into_connection(),
        );

        let result = service(group_db, user_db, feed_db).delete("tech", "u1").await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_is_owner_false_for_other_user() {
        let group_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_group("g1", "tech", "u1")]])
                .into_connection(),
        );
        let user_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let feed_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let result = service(group_db, user_db, feed_db)
            .is_owner("tech", "u2")
            .await
            .unwrap();

        assert!(!result);
    }

    #[tokio::test]
    async fn test_add_account_forbidden_for_non_moderator() {
        let group_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_group("g1", "tech", "u1")]])
                .append_query_results([Vec::<tidepool_db::entities::group_moderator::Model>::new()])
                .into_connection(),
        );
        let user_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let feed_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let result = service(group_db, user_db, feed_db)
            .add_account("tech", "u2", "celeb")
            .await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_add_account_fans_out_to_followers() {
        let group_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_group("g1", "tech", "u1")]])
                .append_query_results([[tidepool_db::entities::group_moderator::Model {
                    id: "m1".to_string(),
                    group_id: "g1".to_string(),
                    user_id: "u1".to_string(),
                    created_at: Utc::now().into(),
                }]])
                .append_exec_results([ok_exec()])
                .append_query_results([vec![tidepool_db::entities::group_follower::Model {
                    id: "gf1".to_string(),
                    group_id: "g1".to_string(),
                    user_id: "u2".to_string(),
                    created_at: Utc::now().into(),
                }]])
                .into_connection(),
        );
        let user_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_user("u3", "celeb")]])
                .into_connection(),
        );
        // The one follower's feed exists; the account lands in it.
        let feed_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_feed("f1", "u2", "tech")]])
                .append_exec_results([ok_exec()])
                .into_connection(),
        );

        let result = service(group_db, user_db, feed_db)
            .add_account("tech", "u1", "celeb")
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_add_follower_seeds_from_snapshot() {
        let group_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_group("g1", "tech", "u1")]])
                .append_exec_results([ok_exec()])
                .append_query_results([vec![tidepool_db::entities::group_account::Model {
                    id: "a1".to_string(),
                    group_id: "g1".to_string(),
                    user_id: "u9".to_string(),
                    created_at: Utc::now().into(),
                }]])
                .into_connection(),
        );
        let user_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_user("u2", "bob")]])
                .into_connection(),
        );
        // Feed lookup misses, the feed is created, the snapshot account added.
        let feed_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<feed::Model>::new()])
                .append_query_results([[test_feed("f1", "u2", "tech")]])
                .append_exec_results([ok_exec()])
                .into_connection(),
        );

        let result = service(group_db, user_db, feed_db)
            .add_follower("tech", "u2")
            .await;

        assert!(result.is_ok());
    }
}
