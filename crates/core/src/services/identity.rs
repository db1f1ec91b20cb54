//! Identity service.
//!
//! Resolves usernames to IDs and back, owns the shared user/group name
//! namespace check, and drives the user-account lifecycle: registration
//! creates the three canonical feeds, deletion cascades through edges,
//! feeds and posts.

use crate::services::fanout::FanoutService;
use crate::services::post::PostService;
use crate::services::relation::RelationService;
use sea_orm::Set;
use tidepool_common::{AppError, AppResult, IdGenerator};
use tidepool_db::{
    entities::{relation::RelationKind, user},
    repositories::{FeedRepository, GroupRepository, UserRepository},
};

const MAX_USERNAME_LENGTH: usize = 64;

/// Identity service for username resolution and account lifecycle.
#[derive(Clone)]
pub struct IdentityService {
    user_repo: UserRepository,
    group_repo: GroupRepository,
    feed_repo: FeedRepository,
    fanout: FanoutService,
    relations: RelationService,
    posts: PostService,
    id_gen: IdGenerator,
}

impl IdentityService {
    /// Create a new identity service.
    #[must_use]
    pub const fn new(
        user_repo: UserRepository,
        group_repo: GroupRepository,
        feed_repo: FeedRepository,
        fanout: FanoutService,
        relations: RelationService,
        posts: PostService,
    ) -> Self {
        Self {
            user_repo,
            group_repo,
            feed_repo,
            fanout,
            relations,
            posts,
            id_gen: IdGenerator::new(),
        }
    }

    /// Resolve a username to a user ID.
    pub async fn resolve_user_id(&self, username: &str) -> AppResult<String> {
        let user = self.user_repo.get_by_username(username).await?;
        Ok(user.id)
    }

    /// Resolve a user ID to a display name, falling back to the username.
    pub async fn resolve_display_name(&self, user_id: &str) -> AppResult<String> {
        let user = self.user_repo.get_by_id(user_id).await?;
        Ok(user.display_name.unwrap_or(user.username))
    }

    /// Check whether a name is held by any user or group. Usernames and
    /// group names share one namespace.
    pub async fn is_name_taken(&self, name: &str) -> AppResult<bool> {
        if self.user_repo.username_exists(name).await? {
            return Ok(true);
        }
        self.group_repo.name_exists(name).await
    }

    /// Register a user, creating their three canonical feeds.
    pub async fn register_user(
        &self,
        username: &str,
        display_name: Option<String>,
    ) -> AppResult<user::Model> {
        let username = username.trim();
        if username.is_empty() {
            return Err(AppError::BadRequest("Username is required".to_string()));
        }
        if username.len() > MAX_USERNAME_LENGTH {
            return Err(AppError::BadRequest("Username too long".to_string()));
        }
        if self.is_name_taken(username).await? {
            return Err(AppError::Conflict(format!(
                "Name {username} is already taken"
            )));
        }

        let user = self
            .user_repo
            .create(user::ActiveModel {
                id: Set(self.id_gen.generate()),
                username: Set(username.to_string()),
                username_lower: Set(username.to_lowercase()),
                display_name: Set(display_name),
                created_at: Set(chrono::Utc::now().into()),
            })
            .await?;

        for kind in [
            RelationKind::Follow,
            RelationKind::Friend,
            RelationKind::Favorite,
        ] {
            self.fanout
                .ensure_feed(&user.id, kind.canonical_feed_name())
                .await?;
        }

        tracing::debug!(%username, id = %user.id, "registered user");
        Ok(user)
    }

    /// Delete a user account.
    ///
    /// Cascade: groups the user owns (with every follower's feed), relation
    /// edges in both directions, the user's own feeds, their appearances in
    /// other users' feeds, their group follows (with the matching feeds
    /// already gone), and their posts. Every step is idempotent, so a
    /// failed deletion can be retried. Remaining group moderator and
    /// account rows fall to the schema's foreign-key cascade.
    pub async fn delete_user(&self, user_id: &str) -> AppResult<()> {
        let user = self.user_repo.get_by_id(user_id).await?;

        // Owned groups die with the owner. Run the same follower cascade a
        // direct group delete performs, so no follower is left with an
        // orphaned feed for a group that no longer exists.
        for group in self.group_repo.find_by_owner(user_id).await? {
            for follower_id in self.group_repo.find_follower_ids(&group.id).await? {
                self.fanout
                    .on_group_unfollowed(&follower_id, &group.name)
                    .await?;
                self.group_repo
                    .remove_follower(&group.id, &follower_id)
                    .await?;
            }
            self.group_repo.delete(&group.id).await?;
            tracing::debug!(%user_id, group = %group.name, "deleted owned group");
        }

        self.relations.delete_all_for_user(user_id).await?;
        self.feed_repo.delete_all_by_owner(user_id).await?;

        let evicted = self.feed_repo.remove_source_everywhere(user_id).await?;
        tracing::debug!(%user_id, evicted, "removed user from other feeds");

        for group_id in self.group_repo.find_followed_group_ids(user_id).await? {
            self.group_repo.remove_follower(&group_id, user_id).await?;
        }

        self.posts.delete_all_by_author(user_id).await?;
        self.user_repo.delete(user_id).await?;

        tracing::debug!(username = %user.username, %user_id, "deleted user");
        Ok(())
    }
}
