//! Server Repository Implementation
//!
//! PostgreSQL implementation of server operations, including the
//! transactional create and cascade delete.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::debug;

use super::{channel_repository::delete_channel_messages, map_unique_violation};
use crate::domain::{Channel, Server, ServerRemoval, ServerRepository};
use crate::shared::error::AppError;

#[derive(Debug, sqlx::FromRow)]
struct ServerRow {
    id: i64,
    name: String,
    owner_id: i64,
    icon_id: Option<String>,
    default_channel_id: Option<i64>,
    created_at: DateTime<Utc>,
}

impl ServerRow {
    fn into_server(self) -> Server {
        Server {
            id: self.id,
            name: self.name,
            owner_id: self.owner_id,
            icon_id: self.icon_id,
            default_channel_id: self.default_channel_id,
            created_at: self.created_at,
        }
    }
}

/// PostgreSQL server repository implementation.
#[derive(Clone)]
pub struct PgServerRepository {
    pool: PgPool,
}

impl PgServerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ServerRepository for PgServerRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Server>, AppError> {
        let row = sqlx::query_as::<_, ServerRow>(
            r#"
            SELECT id, name, owner_id, icon_id, default_channel_id, created_at
            FROM servers
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(ServerRow::into_server))
    }

    async fn find_by_member(&self, user_id: i64) -> Result<Vec<Server>, AppError> {
        let rows = sqlx::query_as::<_, ServerRow>(
            r#"
            SELECT s.id, s.name, s.owner_id, s.icon_id, s.default_channel_id, s.created_at
            FROM servers s
            INNER JOIN members m ON m.server_id = s.id
            WHERE m.user_id = $1
            ORDER BY m.joined_at, s.id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ServerRow::into_server).collect())
    }

    /// Server, default channel and owner membership in one transaction.
    async fn create_with_default_channel(
        &self,
        server: &Server,
        channel: &Channel,
    ) -> Result<Server, AppError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, ServerRow>(
            r#"
            INSERT INTO servers (id, name, owner_id, icon_id, default_channel_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, name, owner_id, icon_id, default_channel_id, created_at
            "#,
        )
        .bind(server.id)
        .bind(&server.name)
        .bind(server.owner_id)
        .bind(&server.icon_id)
        .bind(channel.id)
        .bind(server.created_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_unique_violation(e, "Server already exists"))?;

        sqlx::query(
            r#"
            INSERT INTO channels (id, server_id, name, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(channel.id)
        .bind(server.id)
        .bind(&channel.name)
        .bind(channel.created_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO members (server_id, user_id, joined_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (server_id, user_id) DO NOTHING
            "#,
        )
        .bind(server.id)
        .bind(server.owner_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(row.into_server())
    }

    async fn delete_cascade(&self, id: i64) -> Result<ServerRemoval, AppError> {
        let mut tx = self.pool.begin().await?;

        let icon_id = sqlx::query_scalar::<_, Option<String>>(
            "SELECT icon_id FROM servers WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Server not found".into()))?;

        let channel_ids =
            sqlx::query_scalar::<_, i64>("SELECT id FROM channels WHERE server_id = $1")
                .bind(id)
                .fetch_all(&mut *tx)
                .await?;

        let attachment_ids = delete_channel_messages(&mut tx, &channel_ids).await?;

        // Channels, members and invites follow through ON DELETE CASCADE.
        sqlx::query("DELETE FROM servers WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        debug!(
            server_id = id,
            channels = channel_ids.len(),
            attachments = attachment_ids.len(),
            "Server rows removed"
        );

        Ok(ServerRemoval {
            channel_ids,
            attachment_ids,
            icon_id,
        })
    }
}
