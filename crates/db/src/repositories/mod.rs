//! Database repositories.

pub mod feed;
pub mod group;
pub mod post;
pub mod relation;
pub mod user;

pub use feed::FeedRepository;
pub use group::GroupRepository;
pub use post::PostRepository;
pub use relation::RelationRepository;
pub use user::UserRepository;
