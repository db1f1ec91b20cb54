//! Timeline service.
//!
//! Read-time materialization of feeds. The write path keeps each feed's
//! source-account set current; this service resolves that set into an
//! ordered, denormalized view on every call. Nothing is cached.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::Serialize;
use tidepool_common::AppResult;
use tidepool_db::{
    entities::{feed::SortOrder, post},
    repositories::{FeedRepository, PostRepository, UserRepository},
};

/// One post in a materialized feed.
#[derive(Debug, Clone, Serialize)]
pub struct FeedPostView {
    pub post_id: String,
    pub author_id: String,
    pub author_name: String,
    pub content: String,
    /// RFC 3339.
    pub created_at: String,
    /// RFC 3339; equals `created_at` when the post was never edited.
    pub modified_at: String,
    pub like_count: u64,
}

/// A materialized feed.
#[derive(Debug, Clone, Serialize)]
pub struct FeedView {
    pub name: String,
    pub sort_order: SortOrder,
    /// Usernames of the feed's source accounts.
    pub sources: Vec<String>,
    pub posts: Vec<FeedPostView>,
}

/// Timeline service for feed materialization.
#[derive(Clone)]
pub struct TimelineService {
    feed_repo: FeedRepository,
    post_repo: PostRepository,
    user_repo: UserRepository,
}

impl TimelineService {
    /// Create a new timeline service.
    #[must_use]
    pub const fn new(
        feed_repo: FeedRepository,
        post_repo: PostRepository,
        user_repo: UserRepository,
    ) -> Self {
        Self {
            feed_repo,
            post_repo,
            user_repo,
        }
    }

    /// Materialize a feed into an ordered view.
    ///
    /// An empty source set yields an empty view; a missing feed surfaces as
    /// `FeedNotFound`.
    pub async fn materialize(&self, owner_id: &str, name: &str) -> AppResult<FeedView> {
        let feed = self.feed_repo.get_by_owner_and_name(owner_id, name).await?;
        let source_ids = self.feed_repo.find_source_ids(&feed.id).await?;

        let users = self.user_repo.find_by_ids(&source_ids).await?;
        let names: HashMap<String, (String, Option<String>)> = users
            .into_iter()
            .map(|u| (u.id, (u.username, u.display_name)))
            .collect();

        let sources = source_ids
            .iter()
            .filter_map(|id| names.get(id).map(|(username, _)| username.clone()))
            .collect();

        let posts = self.post_repo.find_by_authors(&source_ids).await?;
        let post_ids: Vec<String> = posts.iter().map(|p| p.id.clone()).collect();
        let like_counts = self.post_repo.count_likes_for(&post_ids).await?;

        let mut ranked: Vec<(post::Model, u64)> = posts
            .into_iter()
            .map(|p| {
                let likes = like_counts.get(&p.id).copied().unwrap_or(0);
                (p, likes)
            })
            .collect();
        sort_ranked(&mut ranked, feed.sort_order);

        let views = ranked
            .into_iter()
            .map(|(p, likes)| {
                let author_name = names
                    .get(&p.author_id)
                    .map(|(username, display_name)| {
                        display_name.clone().unwrap_or_else(|| username.clone())
                    })
                    .unwrap_or_else(|| p.author_id.clone());
                let modified = p.modified_at();
                FeedPostView {
                    post_id: p.id,
                    author_id: p.author_id,
                    author_name,
                    content: p.content,
                    created_at: p.created_at.to_rfc3339(),
                    modified_at: modified.to_rfc3339(),
                    like_count: likes,
                }
            })
            .collect();

        Ok(FeedView {
            name: feed.name,
            sort_order: feed.sort_order,
            sources,
            posts: views,
        })
    }
}

/// Recency ordering: newest modification first, creation time then post ID
/// breaking ties. IDs are ULIDs, so the final tie-break is still
/// chronological and the whole key is total — repeated materializations of
/// the same data always agree.
fn cmp_recency(a: &post::Model, b: &post::Model) -> Ordering {
    b.modified_at()
        .cmp(&a.modified_at())
        .then_with(|| b.created_at.cmp(&a.created_at))
        .then_with(|| b.id.cmp(&a.id))
}

fn sort_ranked(ranked: &mut [(post::Model, u64)], order: SortOrder) {
    match order {
        SortOrder::Recency => ranked.sort_by(|(a, _), (b, _)| cmp_recency(a, b)),
        SortOrder::RecencyReversed => ranked.sort_by(|(a, _), (b, _)| cmp_recency(b, a)),
        SortOrder::Engagement => ranked.sort_by(|(a, a_likes), (b, b_likes)| {
            b_likes.cmp(a_likes).then_with(|| cmp_recency(a, b))
        }),
    }
}
