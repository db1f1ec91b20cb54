//! Post service.

use sea_orm::Set;
use tidepool_common::{AppError, AppResult, IdGenerator};
use tidepool_db::{
    entities::{post, post_like},
    repositories::{PostRepository, UserRepository},
};

const MAX_POST_LENGTH: usize = 560;

/// Post service for authoring and engagement.
#[derive(Clone)]
pub struct PostService {
    post_repo: PostRepository,
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

impl PostService {
    /// Create a new post service.
    #[must_use]
    pub const fn new(post_repo: PostRepository, user_repo: UserRepository) -> Self {
        Self {
            post_repo,
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a post.
    pub async fn create_post(&self, author_id: &str, content: &str) -> AppResult<post::Model> {
        let content = validate_content(content)?;
        self.user_repo.get_by_id(author_id).await?;

        let model = post::ActiveModel {
            id: Set(self.id_gen.generate()),
            author_id: Set(author_id.to_string()),
            content: Set(content.to_string()),
            created_at: Set(chrono::Utc::now().into()),
            updated_at: Set(None),
        };
        self.post_repo.create(model).await
    }

    /// Edit a post's content. Author only; bumps the modification timestamp.
    pub async fn update_post(
        &self,
        post_id: &str,
        author_id: &str,
        content: &str,
    ) -> AppResult<post::Model> {
        let content = validate_content(content)?;

        let existing = self.post_repo.get_by_id(post_id).await?;
        if existing.author_id != author_id {
            return Err(AppError::Forbidden("Not your post".to_string()));
        }

        let mut model: post::ActiveModel = existing.into();
        model.content = Set(content.to_string());
        model.updated_at = Set(Some(chrono::Utc::now().into()));
        self.post_repo.update(model).await
    }

    /// Delete a post. Author only.
    pub async fn delete_post(&self, post_id: &str, author_id: &str) -> AppResult<()> {
        let existing = self.post_repo.get_by_id(post_id).await?;
        if existing.author_id != author_id {
            return Err(AppError::Forbidden("Not your post".to_string()));
        }
        self.post_repo.delete(post_id).await
    }

    /// Delete every post by an author. Part of the account deletion cascade.
    pub async fn delete_all_by_author(&self, author_id: &str) -> AppResult<()> {
        self.post_repo.delete_all_by_author(author_id).await
    }

    /// Like a post. Liking twice is a no-op.
    pub async fn like(&self, post_id: &str, user_id: &str) -> AppResult<()> {
        self.post_repo.get_by_id(post_id).await?;
        self.user_repo.get_by_id(user_id).await?;

        let model = post_like::ActiveModel {
            id: Set(self.id_gen.generate()),
            post_id: Set(post_id.to_string()),
            user_id: Set(user_id.to_string()),
            created_at: Set(chrono::Utc::now().into()),
        };
        self.post_repo.add_like(model).await
    }

    /// Remove a like. Removing a missing like is a no-op.
    pub async fn unlike(&self, post_id: &str, user_id: &str) -> AppResult<()> {
        self.post_repo.get_by_id(post_id).await?;
        self.post_repo.remove_like(post_id, user_id).await
    }

    /// Check whether a user has liked a post.
    pub async fn has_liked(&self, post_id: &str, user_id: &str) -> AppResult<bool> {
        self.post_repo.has_liked(post_id, user_id).await
    }

    /// Engagement count of a post.
    pub async fn like_count(&self, post_id: &str) -> AppResult<u64> {
        self.post_repo.count_likes(post_id).await
    }

    /// Usernames of the users who liked a post.
    pub async fn likers(&self, post_id: &str) -> AppResult<Vec<String>> {
        let ids = self.post_repo.find_liker_ids(post_id).await?;
        let users = self.user_repo.find_by_ids(&ids).await?;
        Ok(users.into_iter().map(|u| u.username).collect())
    }
}

fn validate_content(content: &str) -> AppResult<&str> {
    let content = content.trim();
    if content.is_empty() {
        return Err(AppError::BadRequest("Post content is required".to_string()));
    }
    if content.chars().count() > MAX_POST_LENGTH {
        return Err(AppError::BadRequest(format!(
            "Post content must be at most {MAX_POST_LENGTH} characters"
        )));
    }
    Ok(content)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;
    use tidepool_db::entities::user;

    fn test_post(id: &str, author_id: &str) -> post::Model {
        post::Model {
            id: id.to_string(),
            author_id: author_id.to_string(),
            content: "hello".to_string(),
            created_at: Utc::now().into(),
            updated_at: None,
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

    #[tokio::test]
    async fn test_create_post_rejects_empty_content() {
        let post_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let user_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let service = PostService::new(PostRepository::new(post_db), UserRepository::new(user_db));
        let result = service.create_post("u1", "  ").await;

        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_create_post_rejects_overlong_content() {
        let post_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let user_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let service = PostService::new(PostRepository::new(post_db), UserRepository::new(user_db));
        let result = service.create_post("u1", &"x".repeat(561)).await;

        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_update_post_forbidden_for_non_author() {
        let post_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_post("p1", "u1")]])
                .into_connection(),
        );
        let user_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let service = PostService::new(PostRepository::new(post_db), UserRepository::new(user_db));
        let result = service.update_post("p1", "u2", "edited").await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_like_is_idempotent() {
        let post_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_post("p1", "u1")]])
                // Conflict-guarded insert affecting 0 rows is still success.
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );
        let user_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_user("u2", "bob")]])
                .into_connection(),
        );

        let service = PostService::new(PostRepository::new(post_db), UserRepository::new(user_db));
        let result = service.like("p1", "u2").await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_likers_resolves_usernames() {
        let post_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![post_like::Model {
                    id: "l1".to_string(),
                    post_id: "p1".to_string(),
                    user_id: "u2".to_string(),
                    created_at: Utc::now().into(),
                }]])
                .into_connection(),
        );
        let user_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_user("u2", "bob")]])
                .into_connection(),
        );

        let service = PostService::new(PostRepository::new(post_db), UserRepository::new(user_db));
        let likers = service.likers("p1").await.unwrap();

        assert_eq!(likers, vec!["bob".to_string()]);
    }
}
