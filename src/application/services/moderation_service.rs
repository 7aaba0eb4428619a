//! Moderation Service
//!
//! Post-hoc content check run as a background job after a message is sent.
//! Flagged messages are soft-deleted.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, instrument};

use crate::domain::MessageRepository;
use crate::shared::error::AppError;

/// Result of a moderation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModerationVerdict {
    Clean,
    Flagged,
    /// The message was deleted before the job ran.
    Missing,
}

/// Moderation service trait
#[async_trait]
pub trait ModerationService: Send + Sync {
    async fn run(&self, message_id: i64) -> Result<ModerationVerdict, AppError>;
}

/// Case-insensitive blocked-term matcher.
#[derive(Debug, Clone, Default)]
pub struct KeywordClassifier {
    terms: Vec<String>,
}

impl KeywordClassifier {
    pub fn new<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            terms: terms
                .into_iter()
                .map(|t| t.as_ref().trim().to_lowercase())
                .filter(|t| !t.is_empty())
                .collect(),
        }
    }

    pub fn is_flagged(&self, content: &str) -> bool {
        let content = content.to_lowercase();
        self.terms.iter().any(|term| content.contains(term.as_str()))
    }
}

/// ModerationService implementation
pub struct ModerationServiceImpl {
    message_repo: Arc<dyn MessageRepository>,
    classifier: KeywordClassifier,
    reason: String,
}

impl ModerationServiceImpl {
    pub fn new(
        message_repo: Arc<dyn MessageRepository>,
        classifier: KeywordClassifier,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            message_repo,
            classifier,
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl ModerationService for ModerationServiceImpl {
    #[instrument(skip(self))]
    async fn run(&self, message_id: i64) -> Result<ModerationVerdict, AppError> {
        let Some(message) = self.message_repo.find_by_id(message_id).await? else {
            return Ok(ModerationVerdict::Missing);
        };

        if message.deleted || !self.classifier.is_flagged(&message.content) {
            return Ok(ModerationVerdict::Clean);
        }

        self.message_repo
            .mark_deleted(message_id, &self.reason)
            .await?;
        info!(message_id, sender_id = message.sender_id, "Message removed by moderation");

        Ok(ModerationVerdict::Flagged)
    }
}
