//! Typing Service
//!
//! Ephemeral "is typing" indicators for channels and direct messages.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tracing::debug;

use crate::domain::services::{AccessError, AccessGuard};
use crate::domain::{ConversationTarget, TypingIndicator, TypingRepository, UserRepository};
use crate::shared::error::AppError;

/// Typing service trait
#[async_trait]
pub trait TypingService: Send + Sync {
    /// Set or refresh the caller's indicator on `target`.
    async fn upsert(&self, user_id: i64, target: ConversationTarget) -> Result<(), TypingError>;

    /// Usernames currently typing on `target`, excluding the caller.
    async fn list(&self, user_id: i64, target: ConversationTarget)
        -> Result<Vec<String>, TypingError>;

    /// Clear a user's indicator. Idempotent.
    async fn remove(&self, user_id: i64, target: ConversationTarget) -> Result<(), AppError>;

    /// Drop all indicators of a conversation that is going away.
    async fn clear_target(&self, target: ConversationTarget) -> Result<(), AppError>;
}

/// Typing service errors
#[derive(Debug, thiserror::Error)]
pub enum TypingError {
    #[error(transparent)]
    Access(#[from] AccessError),

    #[error(transparent)]
    Store(#[from] AppError),
}

impl From<TypingError> for AppError {
    fn from(err: TypingError) -> Self {
        match err {
            TypingError::Access(e) => e.into(),
            TypingError::Store(e) => e,
        }
    }
}

/// TypingService implementation
pub struct TypingServiceImpl {
    typing_repo: Arc<dyn TypingRepository>,
    user_repo: Arc<dyn UserRepository>,
    guard: AccessGuard,
    ttl: Duration,
}

impl TypingServiceImpl {
    pub fn new(
        typing_repo: Arc<dyn TypingRepository>,
        user_repo: Arc<dyn UserRepository>,
        guard: AccessGuard,
        ttl_secs: u64,
    ) -> Self {
        Self {
            typing_repo,
            user_repo,
            guard,
            ttl: Duration::seconds(ttl_secs as i64),
        }
    }
}

#[async_trait]
impl TypingService for TypingServiceImpl {
    async fn upsert(&self, user_id: i64, target: ConversationTarget) -> Result<(), TypingError> {
        self.guard.assert_conversation_member(user_id, target).await?;

        let indicator = TypingIndicator {
            user_id,
            target,
            expires_at: Utc::now() + self.ttl,
        };
        self.typing_repo.upsert(&indicator).await?;
        Ok(())
    }

    async fn list(
        &self,
        user_id: i64,
        target: ConversationTarget,
    ) -> Result<Vec<String>, TypingError> {
        self.guard.assert_conversation_member(user_id, target).await?;

        let user_ids: Vec<i64> = self
            .typing_repo
            .find_active(target, Utc::now())
            .await?
            .into_iter()
            .map(|i| i.user_id)
            .filter(|id| *id != user_id)
            .collect();

        if user_ids.is_empty() {
            return Ok(Vec::new());
        }

        let users = self.user_repo.find_by_ids(&user_ids).await?;
        Ok(users.into_iter().map(|u| u.username).collect())
    }

    async fn remove(&self, user_id: i64, target: ConversationTarget) -> Result<(), AppError> {
        let removed = self.typing_repo.remove(user_id, target).await?;
        debug!(user_id, %target, removed, "Cleared typing indicator");
        Ok(())
    }

    async fn clear_target(&self, target: ConversationTarget) -> Result<(), AppError> {
        self.typing_repo.clear_target(target).await
    }
}
