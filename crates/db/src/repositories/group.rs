//! Content group repository.

use std::sync::Arc;

use crate::entities::{
    ContentGroup, GroupAccount, GroupFollower, GroupModerator, content_group, group_account,
    group_follower, group_moderator,
};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder,
};
use tidepool_common::{AppError, AppResult};

/// Content group repository.
///
/// The group row carries identity; the moderator/follower/account sets are
/// join tables with `(group_id, user_id)` unique keys. Set mutations are
/// conflict-guarded single statements, so they are idempotent and serialize
/// per row without application locks.
#[derive(Clone)]
pub struct GroupRepository {
    db: Arc<DatabaseConnection>,
}

impl GroupRepository {
    /// Create a new group repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a group by name.
    pub async fn find_by_name(&self, name: &str) -> AppResult<Option<content_group::Model>> {
        ContentGroup::find()
            .filter(content_group::Column::Name.eq(name))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a group by name, returning an error if not found.
    pub async fn get_by_name(&self, name: &str) -> AppResult<content_group::Model> {
        self.find_by_name(name)
            .await?
            .ok_or_else(|| AppError::GroupNotFound(name.to_string()))
    }

    /// Groups owned by a user.
    pub async fn find_by_owner(&self, owner_id: &str) -> AppResult<Vec<content_group::Model>> {
        ContentGroup::find()
            .filter(content_group::Column::OwnerId.eq(owner_id))
            .order_by_asc(content_group::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Check whether a group name is taken.
    pub async fn name_exists(&self, name: &str) -> AppResult<bool> {
        let count = ContentGroup::find()
            .filter(content_group::Column::Name.eq(name))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(count > 0)
    }

    /// Create a new group row.
    pub async fn create(&self, model: content_group::ActiveModel) -> AppResult<content_group::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a group row and its member sets.
    ///
    /// Follower feeds must already have been cleaned up by the caller; this
    /// is the final step of the deletion cascade.
    pub async fn delete(&self, group_id: &str) -> AppResult<()> {
        GroupModerator::delete_many()
            .filter(group_moderator::Column::GroupId.eq(group_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        GroupFollower::delete_many()
            .filter(group_follower::Column::GroupId.eq(group_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        GroupAccount::delete_many()
            .filter(group_account::Column::GroupId.eq(group_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        ContentGroup::delete_by_id(group_id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }

    // ==================== Moderators ====================

    /// Add a moderator; a no-op if already present.
    pub async fn add_moderator(&self, model: group_moderator::ActiveModel) -> AppResult<()> {
        GroupModerator::insert(model)
            .on_conflict(
                OnConflict::columns([
                    group_moderator::Column::GroupId,
                    group_moderator::Column::UserId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Remove a moderator; a no-op if absent.
    pub async fn remove_moderator(&self, group_id: &str, user_id: &str) -> AppResult<()> {
        GroupModerator::delete_many()
            .filter(group_moderator::Column::GroupId.eq(group_id))
            .filter(group_moderator::Column::UserId.eq(user_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Check moderator membership. Inspects the actual row, so a missing
    /// pair is `false` rather than a truthy empty result.
    pub async fn is_moderator(&self, group_id: &str, user_id: &str) -> AppResult<bool> {
        let row = GroupModerator::find()
            .filter(group_moderator::Column::GroupId.eq(group_id))
            .filter(group_moderator::Column::UserId.eq(user_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(row.is_some())
    }

    /// Moderator IDs of a group.
    pub async fn find_moderator_ids(&self, group_id: &str) -> AppResult<Vec<String>> {
        let rows = GroupModerator::find()
            .filter(group_moderator::Column::GroupId.eq(group_id))
            .order_by_asc(group_moderator::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(rows.into_iter().map(|m| m.user_id).collect())
    }

    // ==================== Followers ====================

    /// Add a follower; a no-op if already present.
    pub async fn add_follower(&self, model: group_follower::ActiveModel) -> AppResult<()> {
        GroupFollower::insert(model)
            .on_conflict(
                OnConflict::columns([
                    group_follower::Column::GroupId,
                    group_follower::Column::UserId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Remove a follower; a no-op if absent.
    pub async fn remove_follower(&self, group_id: &str, user_id: &str) -> AppResult<()> {
        GroupFollower::delete_many()
            .filter(group_follower::Column::GroupId.eq(group_id))
            .filter(group_follower::Column::UserId.eq(user_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Check follower membership.
    pub async fn is_follower(&self, group_id: &str, user_id: &str) -> AppResult<bool> {
        let row = GroupFollower::find()
            .filter(group_follower::Column::GroupId.eq(group_id))
            .filter(group_follower::Column::UserId.eq(user_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(row.is_some())
    }

    /// Follower IDs of a group.
    pub async fn find_follower_ids(&self, group_id: &str) -> AppResult<Vec<String>> {
        let rows = GroupFollower::find()
            .filter(group_follower::Column::GroupId.eq(group_id))
            .order_by_asc(group_follower::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(rows.into_iter().map(|m| m.user_id).collect())
    }

    /// Group IDs a user follows.
    pub async fn find_followed_group_ids(&self, user_id: &str) -> AppResult<Vec<String>> {
        let rows = GroupFollower::find()
            .filter(group_follower::Column::UserId.eq(user_id))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(rows.into_iter().map(|m| m.group_id).collect())
    }

    // ==================== Source accounts ====================

    /// Add a source account; a no-op if already present.
    pub async fn add_account(&self, model: group_account::ActiveModel) -> AppResult<()> {
        GroupAccount::insert(model)
            .on_conflict(
                OnConflict::columns([
                    group_account::Column::GroupId,
                    group_account::Column::UserId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Remove a source account; a no-op if absent.
    pub async fn remove_account(&self, group_id: &str, user_id: &str) -> AppResult<()> {
        GroupAccount::delete_many()
            .filter(group_account::Column::GroupId.eq(group_id))
            .filter(group_account::Column::UserId.eq(user_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Source account IDs of a group.
    pub async fn find_account_ids(&self, group_id: &str) -> AppResult<Vec<String>> {
        let rows = GroupAccount::find()
            .filter(group_account::Column::GroupId.eq(group_id))
            .order_by_asc(group_account::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(rows.into_iter().map(|m| m.user_id).collect())
    }
}
