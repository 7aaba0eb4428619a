//! Friend Repository Implementation
//!
//! PostgreSQL implementation of friendships. A unique index on the
//! unordered user pair keeps one row per pair.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::map_unique_violation;
use crate::domain::{Friend, FriendRepository, FriendStatus};
use crate::shared::error::AppError;

#[derive(Debug, sqlx::FromRow)]
struct FriendRow {
    id: i64,
    user1_id: i64,
    user2_id: i64,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<FriendRow> for Friend {
    type Error = AppError;

    fn try_from(row: FriendRow) -> Result<Self, Self::Error> {
        let status = FriendStatus::parse(&row.status).ok_or_else(|| {
            AppError::Internal(format!("Unknown friend status '{}'", row.status))
        })?;
        Ok(Friend {
            id: row.id,
            user1_id: row.user1_id,
            user2_id: row.user2_id,
            status,
            created_at: row.created_at,
        })
    }
}

fn into_friends(rows: Vec<FriendRow>) -> Result<Vec<Friend>, AppError> {
    rows.into_iter().map(Friend::try_from).collect()
}

/// PostgreSQL friend repository implementation.
#[derive(Clone)]
pub struct PgFriendRepository {
    pool: PgPool,
}

impl PgFriendRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FriendRepository for PgFriendRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Friend>, AppError> {
        sqlx::query_as::<_, FriendRow>(
            "SELECT id, user1_id, user2_id, status, created_at FROM friends WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .map(Friend::try_from)
        .transpose()
    }

    async fn find_between(&self, a: i64, b: i64) -> Result<Option<Friend>, AppError> {
        sqlx::query_as::<_, FriendRow>(
            r#"
            SELECT id, user1_id, user2_id, status, created_at
            FROM friends
            WHERE (user1_id = $1 AND user2_id = $2) OR (user1_id = $2 AND user2_id = $1)
            "#,
        )
        .bind(a)
        .bind(b)
        .fetch_optional(&self.pool)
        .await?
        .map(Friend::try_from)
        .transpose()
    }

    async fn find_by_user1_status(
        &self,
        user_id: i64,
        status: FriendStatus,
    ) -> Result<Vec<Friend>, AppError> {
        let rows = sqlx::query_as::<_, FriendRow>(
            r#"
            SELECT id, user1_id, user2_id, status, created_at
            FROM friends
            WHERE user1_id = $1 AND status = $2
            ORDER BY id
            "#,
        )
        .bind(user_id)
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await?;

        into_friends(rows)
    }

    async fn find_by_user2_status(
        &self,
        user_id: i64,
        status: FriendStatus,
    ) -> Result<Vec<Friend>, AppError> {
        let rows = sqlx::query_as::<_, FriendRow>(
            r#"
            SELECT id, user1_id, user2_id, status, created_at
            FROM friends
            WHERE user2_id = $1 AND status = $2
            ORDER BY id
            "#,
        )
        .bind(user_id)
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await?;

        into_friends(rows)
    }

    async fn create(&self, friend: &Friend) -> Result<Friend, AppError> {
        let row = sqlx::query_as::<_, FriendRow>(
            r#"
            INSERT INTO friends (id, user1_id, user2_id, status, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user1_id, user2_id, status, created_at
            "#,
        )
        .bind(friend.id)
        .bind(friend.user1_id)
        .bind(friend.user2_id)
        .bind(friend.status.as_str())
        .bind(friend.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "Friend request already exists"))?;

        row.try_into()
    }

    async fn update(&self, friend: &Friend) -> Result<Friend, AppError> {
        sqlx::query_as::<_, FriendRow>(
            r#"
            UPDATE friends
            SET user1_id = $2, user2_id = $3, status = $4
            WHERE id = $1
            RETURNING id, user1_id, user2_id, status, created_at
            "#,
        )
        .bind(friend.id)
        .bind(friend.user1_id)
        .bind(friend.user2_id)
        .bind(friend.status.as_str())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Friend request not found".into()))?
        .try_into()
    }
}
