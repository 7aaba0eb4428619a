//! Message Repository Implementation
//!
//! PostgreSQL implementation of the MessageRepository trait. The
//! conversation target is stored as `(target_kind, target_id)`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::{ConversationTarget, Message, MessageRepository};
use crate::shared::error::AppError;

#[derive(Debug, sqlx::FromRow)]
struct MessageRow {
    id: i64,
    sender_id: i64,
    content: String,
    target_kind: String,
    target_id: i64,
    attachment_id: Option<String>,
    deleted: bool,
    deleted_reason: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<MessageRow> for Message {
    type Error = AppError;

    fn try_from(row: MessageRow) -> Result<Self, Self::Error> {
        let target = ConversationTarget::from_columns(&row.target_kind, row.target_id)
            .ok_or_else(|| {
                AppError::Internal(format!("Unknown message target '{}'", row.target_kind))
            })?;
        Ok(Message {
            id: row.id,
            sender_id: row.sender_id,
            content: row.content,
            target,
            attachment_id: row.attachment_id,
            deleted: row.deleted,
            deleted_reason: row.deleted_reason,
            created_at: row.created_at,
        })
    }
}

/// PostgreSQL message repository implementation.
#[derive(Clone)]
pub struct PgMessageRepository {
    pool: PgPool,
}

impl PgMessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageRepository for PgMessageRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Message>, AppError> {
        sqlx::query_as::<_, MessageRow>(
            r#"
            SELECT id, sender_id, content, target_kind, target_id, attachment_id,
                   deleted, deleted_reason, created_at
            FROM messages
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .map(Message::try_from)
        .transpose()
    }

    async fn find_by_target(&self, target: ConversationTarget) -> Result<Vec<Message>, AppError> {
        let rows = sqlx::query_as::<_, MessageRow>(
            r#"
            SELECT id, sender_id, content, target_kind, target_id, attachment_id,
                   deleted, deleted_reason, created_at
            FROM messages
            WHERE target_kind = $1 AND target_id = $2
            ORDER BY id
            "#,
        )
        .bind(target.kind().as_str())
        .bind(target.id())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Message::try_from).collect()
    }

    async fn create(&self, message: &Message) -> Result<Message, AppError> {
        sqlx::query_as::<_, MessageRow>(
            r#"
            INSERT INTO messages (id, sender_id, content, target_kind, target_id,
                                  attachment_id, deleted, deleted_reason, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, sender_id, content, target_kind, target_id, attachment_id,
                      deleted, deleted_reason, created_at
            "#,
        )
        .bind(message.id)
        .bind(message.sender_id)
        .bind(&message.content)
        .bind(message.target.kind().as_str())
        .bind(message.target.id())
        .bind(&message.attachment_id)
        .bind(message.deleted)
        .bind(&message.deleted_reason)
        .bind(message.created_at)
        .fetch_one(&self.pool)
        .await?
        .try_into()
    }

    async fn delete(&self, id: i64) -> Result<(), AppError> {
        sqlx::query("DELETE FROM messages WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn mark_deleted(&self, id: i64, reason: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE messages SET deleted = TRUE, deleted_reason = $2 WHERE id = $1")
            .bind(id)
            .bind(reason)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
