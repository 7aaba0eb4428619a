//! Invite Repository Implementation
//!
//! PostgreSQL implementation of server invites. Redemption inserts the
//! membership and bumps `uses` in one transaction, guarded so concurrent
//! joins can never push `uses` past `max_uses`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::debug;

use crate::domain::{Invite, InviteRedemption, InviteRepository};
use crate::shared::error::AppError;

#[derive(Debug, sqlx::FromRow)]
struct InviteRow {
    id: i64,
    server_id: i64,
    expires_at: Option<DateTime<Utc>>,
    max_uses: Option<i32>,
    uses: i32,
    created_at: DateTime<Utc>,
}

impl From<InviteRow> for Invite {
    fn from(row: InviteRow) -> Self {
        Invite {
            id: row.id,
            server_id: row.server_id,
            expires_at: row.expires_at,
            max_uses: row.max_uses,
            uses: row.uses,
            created_at: row.created_at,
        }
    }
}

/// PostgreSQL invite repository implementation.
#[derive(Clone)]
pub struct PgInviteRepository {
    pool: PgPool,
}

impl PgInviteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InviteRepository for PgInviteRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Invite>, AppError> {
        let row = sqlx::query_as::<_, InviteRow>(
            r#"
            SELECT id, server_id, expires_at, max_uses, uses, created_at
            FROM invites
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Invite::from))
    }

    async fn create(&self, invite: &Invite) -> Result<Invite, AppError> {
        let row = sqlx::query_as::<_, InviteRow>(
            r#"
            INSERT INTO invites (id, server_id, expires_at, max_uses, uses, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, server_id, expires_at, max_uses, uses, created_at
            "#,
        )
        .bind(invite.id)
        .bind(invite.server_id)
        .bind(invite.expires_at)
        .bind(invite.max_uses)
        .bind(invite.uses)
        .bind(invite.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
                AppError::NotFound("Server not found".into())
            }
            _ => AppError::Database(e),
        })?;

        Ok(row.into())
    }

    async fn redeem(
        &self,
        id: i64,
        user_id: i64,
        now: DateTime<Utc>,
    ) -> Result<InviteRedemption, AppError> {
        let mut tx = self.pool.begin().await?;

        let server_id =
            sqlx::query_scalar::<_, i64>("SELECT server_id FROM invites WHERE id = $1")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| AppError::NotFound("Invite not found".into()))?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO members (server_id, user_id, joined_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (server_id, user_id) DO NOTHING
            "#,
        )
        .bind(server_id)
        .bind(user_id)
        .bind(now)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if inserted == 0 {
            return Ok(InviteRedemption::AlreadyMember);
        }

        let claimed = sqlx::query(
            r#"
            UPDATE invites
            SET uses = uses + 1
            WHERE id = $1
              AND (max_uses IS NULL OR uses < max_uses)
              AND (expires_at IS NULL OR expires_at >= $2)
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if claimed == 0 {
            // Dropping the transaction rolls back the membership insert.
            debug!(invite_id = id, user_id, "Invite exhausted during redemption");
            return Ok(InviteRedemption::Unavailable);
        }

        tx.commit().await?;
        Ok(InviteRedemption::Joined)
    }
}
