//! Message Service
//!
//! Handles message listing, sending and deletion for channels and direct
//! messages. Sending queues the typing-clear and moderation jobs.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{instrument, warn};

use crate::application::dto::response::MessageResponse;
use crate::application::jobs::{Job, JobDispatcher, JobTicket};
use crate::domain::services::{AccessError, AccessGuard};
use crate::domain::traits::FileStorage;
use crate::domain::{ConversationTarget, Message, MessageRepository, UserRepository};
use crate::shared::error::AppError;
use crate::shared::snowflake::SnowflakeGenerator;

/// Longest accepted message body, in characters.
pub const MAX_CONTENT_LENGTH: usize = 4000;

/// Message service trait
#[async_trait]
pub trait MessageService: Send + Sync {
    /// All messages of a conversation with sender and attachment resolved.
    async fn list(
        &self,
        user_id: i64,
        target: ConversationTarget,
    ) -> Result<Vec<MessageResponse>, MessageError>;

    /// Send a message.
    async fn create(
        &self,
        user_id: i64,
        request: CreateMessageDto,
    ) -> Result<CreatedMessage, MessageError>;

    /// Delete one of the caller's own messages.
    async fn remove(&self, user_id: i64, message_id: i64) -> Result<(), MessageError>;
}

/// Send message request
#[derive(Debug, Clone)]
pub struct CreateMessageDto {
    pub target: ConversationTarget,
    pub content: String,
    pub attachment_id: Option<String>,
}

/// A sent message plus tickets for its follow-up jobs.
pub struct CreatedMessage {
    pub message: Message,
    pub jobs: Vec<JobTicket>,
}

/// Message service errors
#[derive(Debug, thiserror::Error)]
pub enum MessageError {
    #[error("Message not found")]
    NotFound,

    #[error("You are not authorized to delete this message")]
    NotAuthor,

    #[error("Message content cannot be empty")]
    EmptyContent,

    #[error("Message content exceeds 4000 characters")]
    ContentTooLong,

    #[error("Attachment is not an unused upload of yours")]
    InvalidAttachment,

    #[error(transparent)]
    Access(#[from] AccessError),

    #[error(transparent)]
    Store(#[from] AppError),
}

impl From<MessageError> for AppError {
    fn from(err: MessageError) -> Self {
        match err {
            MessageError::NotFound => AppError::NotFound(err.to_string()),
            MessageError::NotAuthor => AppError::Forbidden(err.to_string()),
            MessageError::EmptyContent
            | MessageError::ContentTooLong
            | MessageError::InvalidAttachment => AppError::InvalidInput(err.to_string()),
            MessageError::Access(e) => e.into(),
            MessageError::Store(e) => e,
        }
    }
}

/// MessageService implementation
pub struct MessageServiceImpl {
    message_repo: Arc<dyn MessageRepository>,
    user_repo: Arc<dyn UserRepository>,
    files: Arc<dyn FileStorage>,
    guard: AccessGuard,
    jobs: JobDispatcher,
    id_generator: Arc<SnowflakeGenerator>,
}

impl MessageServiceImpl {
    pub fn new(
        message_repo: Arc<dyn MessageRepository>,
        user_repo: Arc<dyn UserRepository>,
        files: Arc<dyn FileStorage>,
        guard: AccessGuard,
        jobs: JobDispatcher,
        id_generator: Arc<SnowflakeGenerator>,
    ) -> Self {
        Self {
            message_repo,
            user_repo,
            files,
            guard,
            jobs,
            id_generator,
        }
    }

    fn validate_content(content: &str) -> Result<(), MessageError> {
        if content.trim().is_empty() {
            return Err(MessageError::EmptyContent);
        }
        if content.chars().count() > MAX_CONTENT_LENGTH {
            return Err(MessageError::ContentTooLong);
        }
        Ok(())
    }
}

#[async_trait]
impl MessageService for MessageServiceImpl {
    async fn list(
        &self,
        user_id: i64,
        target: ConversationTarget,
    ) -> Result<Vec<MessageResponse>, MessageError> {
        self.guard.assert_conversation_member(user_id, target).await?;

        let messages = self.message_repo.find_by_target(target).await?;

        let mut sender_ids: Vec<i64> = messages.iter().map(|m| m.sender_id).collect();
        sender_ids.sort_unstable();
        sender_ids.dedup();
        let senders: HashMap<i64, _> = self
            .user_repo
            .find_by_ids(&sender_ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();

        let mut responses = Vec::with_capacity(messages.len());
        for message in messages {
            let attachment_url = match message.attachment_id.as_deref() {
                Some(file_id) if !message.deleted => self.files.get_url(file_id).await?,
                _ => None,
            };
            let sender = senders.get(&message.sender_id).cloned();
            responses.push(MessageResponse::new(message, sender, attachment_url));
        }

        Ok(responses)
    }

    #[instrument(skip(self, request), fields(target = %request.target))]
    async fn create(
        &self,
        user_id: i64,
        request: CreateMessageDto,
    ) -> Result<CreatedMessage, MessageError> {
        self.guard
            .assert_conversation_member(user_id, request.target)
            .await?;
        Self::validate_content(&request.content)?;

        if let Some(file_id) = request.attachment_id.as_deref() {
            if !self.files.claim(file_id, user_id).await? {
                return Err(MessageError::InvalidAttachment);
            }
        }

        let message = Message {
            id: self.id_generator.generate(),
            sender_id: user_id,
            content: request.content,
            target: request.target,
            attachment_id: request.attachment_id,
            deleted: false,
            deleted_reason: None,
            created_at: Utc::now(),
        };
        let message = self.message_repo.create(&message).await?;

        let jobs = vec![
            self.jobs.submit(Job::ClearTyping {
                user_id,
                target: message.target,
            }),
            self.jobs.submit(Job::Moderate {
                message_id: message.id,
            }),
        ];

        Ok(CreatedMessage { message, jobs })
    }

    async fn remove(&self, user_id: i64, message_id: i64) -> Result<(), MessageError> {
        let message = self
            .message_repo
            .find_by_id(message_id)
            .await?
            .ok_or(MessageError::NotFound)?;

        if !message.is_author(user_id) {
            return Err(MessageError::NotAuthor);
        }

        self.message_repo.delete(message_id).await?;

        if let Some(file_id) = message.attachment_id.as_deref() {
            if let Err(e) = self.files.delete(file_id).await {
                warn!(message_id, file_id, error = %e, "Failed to delete attachment");
            }
        }

        Ok(())
    }
}
