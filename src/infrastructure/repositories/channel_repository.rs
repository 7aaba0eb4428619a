//! Channel Repository Implementation
//!
//! PostgreSQL implementation of the ChannelRepository trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};

use super::map_unique_violation;
use crate::domain::{Channel, ChannelRepository, TargetKind};
use crate::shared::error::AppError;

#[derive(Debug, sqlx::FromRow)]
struct ChannelRow {
    id: i64,
    server_id: i64,
    name: String,
    created_at: DateTime<Utc>,
}

impl From<ChannelRow> for Channel {
    fn from(row: ChannelRow) -> Self {
        Channel {
            id: row.id,
            server_id: row.server_id,
            name: row.name,
            created_at: row.created_at,
        }
    }
}

/// Delete the messages of `channel_ids` inside `tx`, returning the
/// attachment ids they referenced.
pub(super) async fn delete_channel_messages(
    tx: &mut Transaction<'_, Postgres>,
    channel_ids: &[i64],
) -> Result<Vec<String>, AppError> {
    if channel_ids.is_empty() {
        return Ok(Vec::new());
    }

    let attachments = sqlx::query_scalar::<_, Option<String>>(
        r#"
        DELETE FROM messages
        WHERE target_kind = $1 AND target_id = ANY($2)
        RETURNING attachment_id
        "#,
    )
    .bind(TargetKind::Channel.as_str())
    .bind(channel_ids)
    .fetch_all(&mut **tx)
    .await?;

    Ok(attachments.into_iter().flatten().collect())
}

/// PostgreSQL channel repository implementation.
#[derive(Clone)]
pub struct PgChannelRepository {
    pool: PgPool,
}

impl PgChannelRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChannelRepository for PgChannelRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Channel>, AppError> {
        let row = sqlx::query_as::<_, ChannelRow>(
            "SELECT id, server_id, name, created_at FROM channels WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Channel::from))
    }

    async fn find_by_server(&self, server_id: i64) -> Result<Vec<Channel>, AppError> {
        let rows = sqlx::query_as::<_, ChannelRow>(
            r#"
            SELECT id, server_id, name, created_at
            FROM channels
            WHERE server_id = $1
            ORDER BY id
            "#,
        )
        .bind(server_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Channel::from).collect())
    }

    async fn find_by_server_and_name(
        &self,
        server_id: i64,
        name: &str,
    ) -> Result<Option<Channel>, AppError> {
        let row = sqlx::query_as::<_, ChannelRow>(
            r#"
            SELECT id, server_id, name, created_at
            FROM channels
            WHERE server_id = $1 AND name = $2
            "#,
        )
        .bind(server_id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Channel::from))
    }

    async fn create(&self, channel: &Channel) -> Result<Channel, AppError> {
        let row = sqlx::query_as::<_, ChannelRow>(
            r#"
            INSERT INTO channels (id, server_id, name, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, server_id, name, created_at
            "#,
        )
        .bind(channel.id)
        .bind(channel.server_id)
        .bind(&channel.name)
        .bind(channel.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "Channel already exists"))?;

        Ok(row.into())
    }

    async fn delete_cascade(&self, id: i64) -> Result<Vec<String>, AppError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("DELETE FROM channels WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Channel not found".into()));
        }

        let attachments = delete_channel_messages(&mut tx, &[id]).await?;
        tx.commit().await?;

        Ok(attachments)
    }
}
