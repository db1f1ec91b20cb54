//! Relation service.

use crate::services::fanout::FanoutService;
use sea_orm::Set;
use tidepool_common::{AppError, AppResult, IdGenerator};
use tidepool_db::{
    entities::{relation, relation::RelationKind},
    repositories::{RelationRepository, UserRepository},
};

/// Relation service for directed user-to-user edges.
///
/// Every edge mutation is mirrored into the source user's canonical feed
/// ("following", "friends" or "favorites") at write time, so feed reads
/// never consult the edge set.
#[derive(Clone)]
pub struct RelationService {
    relation_repo: RelationRepository,
    user_repo: UserRepository,
    fanout: FanoutService,
    id_gen: IdGenerator,
}

impl RelationService {
    /// Create a new relation service.
    #[must_use]
    pub const fn new(
        relation_repo: RelationRepository,
        user_repo: UserRepository,
        fanout: FanoutService,
    ) -> Self {
        Self {
            relation_repo,
            user_repo,
            fanout,
            id_gen: IdGenerator::new(),
        }
    }

    /// Add an edge. Re-adding an existing edge is a no-op.
    ///
    /// Both endpoints must exist; validation failures surface before any
    /// mutation.
    pub async fn add_edge(
        &self,
        kind: RelationKind,
        source_id: &str,
        target_id: &str,
    ) -> AppResult<()> {
        if source_id == target_id {
            return Err(AppError::BadRequest(
                "Cannot relate a user to themselves".to_string(),
            ));
        }

        self.user_repo.get_by_id(source_id).await?;
        self.user_repo.get_by_id(target_id).await?;

        let model = relation::ActiveModel {
            id: Set(self.id_gen.generate()),
            kind: Set(kind),
            source_id: Set(source_id.to_string()),
            target_id: Set(target_id.to_string()),
            created_at: Set(chrono::Utc::now().into()),
        };
        self.relation_repo.create(model).await?;

        self.fanout
            .on_relation_added(source_id, kind, target_id)
            .await
    }

    /// Remove an edge. Removing a missing edge is a no-op.
    pub async fn remove_edge(
        &self,
        kind: RelationKind,
        source_id: &str,
        target_id: &str,
    ) -> AppResult<()> {
        self.user_repo.get_by_id(source_id).await?;
        self.user_repo.get_by_id(target_id).await?;

        self.relation_repo.delete(kind, source_id, target_id).await?;

        self.fanout
            .on_relation_removed(source_id, kind, target_id)
            .await
    }

    /// Check whether an edge exists.
    pub async fn has_edge(
        &self,
        kind: RelationKind,
        source_id: &str,
        target_id: &str,
    ) -> AppResult<bool> {
        self.relation_repo.exists(kind, source_id, target_id).await
    }

    /// IDs of users an edge of this kind points at from `source_id`.
    /// Unknown users yield an empty list.
    pub async fn list_forward(&self, kind: RelationKind, source_id: &str) -> AppResult<Vec<String>> {
        let edges = self.relation_repo.find_forward(kind, source_id).await?;
        Ok(edges.into_iter().map(|e| e.target_id).collect())
    }

    /// IDs of users with an edge of this kind pointing at `target_id`.
    pub async fn list_reverse(&self, kind: RelationKind, target_id: &str) -> AppResult<Vec<String>> {
        let edges = self.relation_repo.find_reverse(kind, target_id).await?;
        Ok(edges.into_iter().map(|e| e.source_id).collect())
    }

    /// Remove every edge touching a user, in both directions and of every
    /// kind. Part of the account deletion cascade.
    pub async fn delete_all_for_user(&self, user_id: &str) -> AppResult<u64> {
        let removed = self.relation_repo.delete_all_for_user(user_id).await?;
        tracing::debug!(%user_id, removed, "removed relation edges for user");
        Ok(removed)
    }
}
