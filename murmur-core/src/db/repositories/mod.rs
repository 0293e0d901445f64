mod user_repository;
mod post_repository;
mod follow_repository;
mod like_repository;
mod reply_repository;
mod dm_repository;
mod moderation_repository;

pub use user_repository::UserRepository;
pub use post_repository::PostRepository;
pub use follow_repository::FollowRepository;
pub use like_repository::LikeRepository;
pub use reply_repository::ReplyRepository;
pub use dm_repository::DirectMessageRepository;
pub use moderation_repository::ModerationRepository;

pub(crate) use post_repository::post_exists;
pub(crate) use user_repository::user_exists;
