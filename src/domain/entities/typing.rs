//! Typing indicator entity and repository trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::ConversationTarget;
use crate::shared::error::AppError;

/// Ephemeral marker that a user is typing in a conversation.
///
/// At most one indicator exists per `(user_id, target)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypingIndicator {
    pub user_id: i64,
    pub target: ConversationTarget,
    pub expires_at: DateTime<Utc>,
}

impl TypingIndicator {
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

/// Storage for typing indicators.
#[async_trait]
pub trait TypingRepository: Send + Sync {
    /// Insert or refresh the indicator for `(user_id, target)`.
    async fn upsert(&self, indicator: &TypingIndicator) -> Result<(), AppError>;

    /// Indicators on `target` that have not expired at `now`.
    async fn find_active(
        &self,
        target: ConversationTarget,
        now: DateTime<Utc>,
    ) -> Result<Vec<TypingIndicator>, AppError>;

    /// Remove the indicator for `(user_id, target)`. Returns whether one
    /// existed.
    async fn remove(&self, user_id: i64, target: ConversationTarget) -> Result<bool, AppError>;

    /// Drop every indicator of a conversation.
    async fn clear_target(&self, target: ConversationTarget) -> Result<(), AppError>;
}
