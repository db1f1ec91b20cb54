//! Database entities.

#![allow(missing_docs)]

pub mod content_group;
pub mod feed;
pub mod feed_source;
pub mod group_account;
pub mod group_follower;
pub mod group_moderator;
pub mod post;
pub mod post_like;
pub mod relation;
pub mod user;

pub use content_group::Entity as ContentGroup;
pub use feed::Entity as Feed;
pub use feed_source::Entity as FeedSource;
pub use group_account::Entity as GroupAccount;
pub use group_follower::Entity as GroupFollower;
pub use group_moderator::Entity as GroupModerator;
pub use post::Entity as Post;
pub use post_like::Entity as PostLike;
pub use relation::Entity as Relation;
pub use user::Entity as User;
