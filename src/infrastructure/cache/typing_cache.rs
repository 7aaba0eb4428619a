//! Typing Indicator Cache
//!
//! Redis-backed [`TypingRepository`]. Each conversation owns one sorted set
//! whose members are user ids scored by expiry (Unix millis). Expired
//! members are pruned on read and the whole key carries a TTL so idle
//! conversations vanish on their own.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use super::keys;
use crate::domain::{ConversationTarget, TypingIndicator, TypingRepository};
use crate::shared::error::AppError;

/// Typing indicator store on Redis.
#[derive(Clone)]
pub struct RedisTypingRepository {
    redis: ConnectionManager,
    key_ttl: u64,
}

impl RedisTypingRepository {
    /// `key_ttl` bounds how long an idle conversation key survives.
    pub fn new(redis: ConnectionManager, key_ttl: u64) -> Self {
        Self {
            redis,
            key_ttl: key_ttl.max(1),
        }
    }
}

#[async_trait]
impl TypingRepository for RedisTypingRepository {
    async fn upsert(&self, indicator: &TypingIndicator) -> Result<(), AppError> {
        let key = keys::typing(indicator.target);
        let mut conn = self.redis.clone();

        conn.zadd::<_, _, _, ()>(
            &key,
            indicator.user_id,
            indicator.expires_at.timestamp_millis(),
        )
        .await?;
        conn.expire::<_, ()>(&key, self.key_ttl as i64).await?;

        Ok(())
    }

    async fn find_active(
        &self,
        target: ConversationTarget,
        now: DateTime<Utc>,
    ) -> Result<Vec<TypingIndicator>, AppError> {
        let key = keys::typing(target);
        let now_ms = now.timestamp_millis();
        let mut conn = self.redis.clone();

        conn.zrembyscore::<_, _, _, ()>(&key, "-inf", now_ms).await?;
        let members: Vec<(i64, i64)> = conn
            .zrangebyscore_withscores(&key, format!("({}", now_ms), "+inf")
            .await?;

        Ok(members
            .into_iter()
            .filter_map(|(user_id, expires_ms)| {
                Utc.timestamp_millis_opt(expires_ms)
                    .single()
                    .map(|expires_at| TypingIndicator {
                        user_id,
                        target,
                        expires_at,
                    })
            })
            .collect())
    }

    async fn remove(&self, user_id: i64, target: ConversationTarget) -> Result<bool, AppError> {
        let mut conn = self.redis.clone();
        let removed: i64 = conn.zrem(keys::typing(target), user_id).await?;
        Ok(removed > 0)
    }

    async fn clear_target(&self, target: ConversationTarget) -> Result<(), AppError> {
        let mut conn = self.redis.clone();
        conn.del::<_, ()>(keys::typing(target)).await?;
        Ok(())
    }
}
