//! Cache Module
//!
//! Redis connection management and the Redis-backed typing indicator store.

mod typing_cache;

pub use typing_cache::RedisTypingRepository;

use redis::aio::ConnectionManager;
use redis::Client;
use tracing::{info, instrument};

use crate::config::RedisSettings;

/// Creates a Redis connection manager with automatic reconnection.
#[instrument(skip(settings), fields(url = %settings.url))]
pub async fn create_redis_client(
    settings: &RedisSettings,
) -> Result<ConnectionManager, redis::RedisError> {
    info!("Connecting to Redis...");
    let client = Client::open(settings.url.as_str())?;
    let manager = ConnectionManager::new(client).await?;
    info!("Redis connection established");
    Ok(manager)
}

/// Cache key prefixes.
pub mod keys {
    use crate::domain::ConversationTarget;

    /// Prefix for conversation typing sets (e.g., "typing:channel:123")
    pub const TYPING: &str = "typing:";

    /// Typing set key for a conversation
    #[inline]
    pub fn typing(target: ConversationTarget) -> String {
        format!("{}{}", TYPING, target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ConversationTarget;

    #[test]
    fn test_typing_keys_separate_kinds() {
        assert_eq!(
            keys::typing(ConversationTarget::Channel(7)),
            "typing:channel:7"
        );
        assert_ne!(
            keys::typing(ConversationTarget::Channel(7)),
            keys::typing(ConversationTarget::DirectMessage(7))
        );
    }
}
