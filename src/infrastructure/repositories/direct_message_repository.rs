//! Direct Message Repository Implementation
//!
//! PostgreSQL implementation of two-party conversations. Opening a DM takes
//! a transaction-scoped advisory lock on the user pair so two concurrent
//! opens cannot create duplicate conversations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::{DirectMessage, DirectMessageRepository};
use crate::shared::error::AppError;

#[derive(Debug, sqlx::FromRow)]
struct DirectMessageRow {
    id: i64,
    created_at: DateTime<Utc>,
}

impl From<DirectMessageRow> for DirectMessage {
    fn from(row: DirectMessageRow) -> Self {
        DirectMessage {
            id: row.id,
            created_at: row.created_at,
        }
    }
}

/// PostgreSQL direct message repository implementation.
#[derive(Clone)]
pub struct PgDirectMessageRepository {
    pool: PgPool,
}

impl PgDirectMessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DirectMessageRepository for PgDirectMessageRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<DirectMessage>, AppError> {
        let row = sqlx::query_as::<_, DirectMessageRow>(
            "SELECT id, created_at FROM direct_messages WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(DirectMessage::from))
    }

    async fn find_members(&self, direct_message_id: i64) -> Result<Vec<i64>, AppError> {
        let members = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT user_id
            FROM direct_message_members
            WHERE direct_message_id = $1
            ORDER BY user_id
            "#,
        )
        .bind(direct_message_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(members)
    }

    async fn is_member(&self, direct_message_id: i64, user_id: i64) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM direct_message_members
                WHERE direct_message_id = $1 AND user_id = $2
            )
            "#,
        )
        .bind(direct_message_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn find_by_user(&self, user_id: i64) -> Result<Vec<DirectMessage>, AppError> {
        let rows = sqlx::query_as::<_, DirectMessageRow>(
            r#"
            SELECT dm.id, dm.created_at
            FROM direct_messages dm
            INNER JOIN direct_message_members m ON m.direct_message_id = dm.id
            WHERE m.user_id = $1
            ORDER BY dm.id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(DirectMessage::from).collect())
    }

    async fn find_or_create_between(
        &self,
        new_id: i64,
        a: i64,
        b: i64,
    ) -> Result<DirectMessage, AppError> {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT pg_advisory_xact_lock($1, $2)")
            .bind(low as i32 ^ (low >> 32) as i32)
            .bind(high as i32 ^ (high >> 32) as i32)
            .execute(&mut *tx)
            .await?;

        let existing = sqlx::query_as::<_, DirectMessageRow>(
            r#"
            SELECT dm.id, dm.created_at
            FROM direct_messages dm
            INNER JOIN direct_message_members ma
                ON ma.direct_message_id = dm.id AND ma.user_id = $1
            INNER JOIN direct_message_members mb
                ON mb.direct_message_id = dm.id AND mb.user_id = $2
            ORDER BY dm.id
            LIMIT 1
            "#,
        )
        .bind(low)
        .bind(high)
        .fetch_optional(&mut *tx)
        .await?;

        if let Some(row) = existing {
            tx.commit().await?;
            return Ok(row.into());
        }

        let row = sqlx::query_as::<_, DirectMessageRow>(
            r#"
            INSERT INTO direct_messages (id, created_at)
            VALUES ($1, NOW())
            RETURNING id, created_at
            "#,
        )
        .bind(new_id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO direct_message_members (direct_message_id, user_id)
            VALUES ($1, $2), ($1, $3)
            "#,
        )
        .bind(new_id)
        .bind(low)
        .bind(high)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(row.into())
    }
}
