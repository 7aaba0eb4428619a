//! Direct message conversation entity and repository trait.
//!
//! Maps to the `direct_messages` and `direct_message_members` tables.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::error::AppError;

/// A private two-party conversation.
///
/// Maps to the `direct_messages` table:
/// - id: BIGINT PRIMARY KEY (Snowflake ID)
/// - created_at: TIMESTAMPTZ NOT NULL DEFAULT NOW()
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectMessage {
    pub id: i64,
    pub created_at: DateTime<Utc>,
}

/// Maps to the `direct_message_members` table:
/// - direct_message_id: BIGINT NOT NULL REFERENCES direct_messages(id) (composite PK)
/// - user_id: BIGINT NOT NULL REFERENCES users(id) (composite PK)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectMessageMember {
    pub direct_message_id: i64,
    pub user_id: i64,
}

/// Repository trait for DirectMessage data access operations.
#[async_trait]
pub trait DirectMessageRepository: Send + Sync {
    /// Find a conversation by its ID.
    async fn find_by_id(&self, id: i64) -> Result<Option<DirectMessage>, AppError>;

    /// User IDs participating in a conversation.
    async fn find_members(&self, direct_message_id: i64) -> Result<Vec<i64>, AppError>;

    /// Check if a user participates in a conversation.
    async fn is_member(&self, direct_message_id: i64, user_id: i64) -> Result<bool, AppError>;

    /// Conversations a user participates in.
    async fn find_by_user(&self, user_id: i64) -> Result<Vec<DirectMessage>, AppError>;

    /// Return the conversation between `a` and `b`, creating it with
    /// `new_id` if none exists. Concurrent callers observe the same row.
    async fn find_or_create_between(
        &self,
        new_id: i64,
        a: i64,
        b: i64,
    ) -> Result<DirectMessage, AppError>;
}
