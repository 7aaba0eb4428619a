//! Message entity and repository trait.
//!
//! Maps to the `messages` table in the database schema.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::ConversationTarget;
use crate::shared::error::AppError;

/// Represents a message in a channel or direct message.
///
/// Maps to the `messages` table:
/// - id: BIGINT PRIMARY KEY (Snowflake ID)
/// - sender_id: BIGINT NOT NULL REFERENCES users(id)
/// - content: TEXT NOT NULL
/// - target_kind: VARCHAR(16) NOT NULL ('channel' | 'direct_message')
/// - target_id: BIGINT NOT NULL
/// - attachment_id: TEXT NULL
/// - deleted: BOOLEAN NOT NULL DEFAULT FALSE
/// - deleted_reason: TEXT NULL
/// - created_at: TIMESTAMPTZ NOT NULL DEFAULT NOW()
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Snowflake ID (primary key); ordering by id is ordering by creation
    pub id: i64,

    /// Author
    pub sender_id: i64,

    /// Message text
    pub content: String,

    /// Conversation this message belongs to
    pub target: ConversationTarget,

    /// Stored file id of an attachment
    pub attachment_id: Option<String>,

    /// Set by moderation; the row stays but the content is hidden
    pub deleted: bool,

    /// Why moderation removed the message
    pub deleted_reason: Option<String>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Check if a user is the author of this message.
    pub fn is_author(&self, user_id: i64) -> bool {
        self.sender_id == user_id
    }
}

/// Repository trait for Message data access operations.
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Find a message by its Snowflake ID.
    async fn find_by_id(&self, id: i64) -> Result<Option<Message>, AppError>;

    /// All messages of a conversation, oldest first.
    async fn find_by_target(&self, target: ConversationTarget) -> Result<Vec<Message>, AppError>;

    /// Create a new message.
    async fn create(&self, message: &Message) -> Result<Message, AppError>;

    /// Hard delete a message.
    async fn delete(&self, id: i64) -> Result<(), AppError>;

    /// Soft delete a message with a moderation reason.
    async fn mark_deleted(&self, id: i64, reason: &str) -> Result<(), AppError>;
}
