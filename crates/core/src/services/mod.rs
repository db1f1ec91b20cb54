//! Business logic services.

#![allow(missing_docs)]

pub mod fanout;
pub mod feed;
pub mod group;
pub mod identity;
pub mod post;
pub mod relation;
pub mod timeline;

pub use fanout::FanoutService;
pub use feed::FeedService;
pub use group::{CreateGroupInput, GroupService};
pub use identity::IdentityService;
pub use post::PostService;
pub use relation::RelationService;
pub use timeline::{FeedPostView, FeedView, TimelineService};
