//! Repository Implementations
//!
//! PostgreSQL implementations of the domain repository traits. Typing
//! indicators live in Redis (see [`crate::infrastructure::cache`]).
//!
//! ## Usage Example
//!
//! ```rust,ignore
//! let pool = create_pool(&settings.database).await?;
//! let redis = create_redis_client(&settings.redis).await?;
//! let repos = pg_repositories(pool, redis, settings.typing.ttl_secs);
//! ```

pub mod channel_repository;
pub mod direct_message_repository;
pub mod friend_repository;
pub mod invite_repository;
pub mod member_repository;
pub mod message_repository;
pub mod server_repository;
pub mod user_repository;

pub use channel_repository::PgChannelRepository;
pub use direct_message_repository::PgDirectMessageRepository;
pub use friend_repository::PgFriendRepository;
pub use invite_repository::PgInviteRepository;
pub use member_repository::PgMemberRepository;
pub use message_repository::PgMessageRepository;
pub use server_repository::PgServerRepository;
pub use user_repository::PgUserRepository;

use std::sync::Arc;

use redis::aio::ConnectionManager;
use sqlx::PgPool;

use crate::domain::Repositories;
use crate::infrastructure::cache::RedisTypingRepository;
use crate::shared::error::AppError;

/// Map a unique-constraint violation to `AlreadyExists`.
pub(crate) fn map_unique_violation(e: sqlx::Error, message: &str) -> AppError {
    match &e {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            AppError::AlreadyExists(message.to_string())
        }
        _ => AppError::Database(e),
    }
}

/// Postgres-backed repositories with Redis typing indicators.
pub fn pg_repositories(pool: PgPool, redis: ConnectionManager, typing_ttl: u64) -> Repositories {
    Repositories {
        users: Arc::new(PgUserRepository::new(pool.clone())),
        servers: Arc::new(PgServerRepository::new(pool.clone())),
        channels: Arc::new(PgChannelRepository::new(pool.clone())),
        members: Arc::new(PgMemberRepository::new(pool.clone())),
        invites: Arc::new(PgInviteRepository::new(pool.clone())),
        friends: Arc::new(PgFriendRepository::new(pool.clone())),
        direct_messages: Arc::new(PgDirectMessageRepository::new(pool.clone())),
        messages: Arc::new(PgMessageRepository::new(pool)),
        // Idle conversation keys outlive the longest indicator a little.
        typing: Arc::new(RedisTypingRepository::new(redis, typing_ttl * 2)),
    }
}
