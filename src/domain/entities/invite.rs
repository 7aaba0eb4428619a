//! Server Invite entity and repository trait.
//!
//! Maps to the `invites` table in the database schema.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::error::AppError;

/// Represents a server invite.
///
/// Maps to the `invites` table:
/// - id: BIGINT PRIMARY KEY (Snowflake ID)
/// - server_id: BIGINT NOT NULL REFERENCES servers(id)
/// - expires_at: TIMESTAMPTZ NULL (never expires when NULL)
/// - max_uses: INTEGER NULL (unlimited when NULL)
/// - uses: INTEGER NOT NULL DEFAULT 0, CHECK (max_uses IS NULL OR uses <= max_uses)
/// - created_at: TIMESTAMPTZ NOT NULL DEFAULT NOW()
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invite {
    /// Snowflake ID, also the shareable invite code
    pub id: i64,

    /// Server ID this invite is for
    pub server_id: i64,

    /// Expiration timestamp (None if never expires)
    pub expires_at: Option<DateTime<Utc>>,

    /// Maximum number of uses (None if unlimited)
    pub max_uses: Option<i32>,

    /// Current number of times this invite was used
    pub uses: i32,

    /// When the invite was created
    pub created_at: DateTime<Utc>,
}

impl Invite {
    /// Check if the invite has expired at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expires_at, Some(expires_at) if expires_at < now)
    }

    /// Check if the invite has reached its maximum uses.
    pub fn is_maxed_out(&self) -> bool {
        matches!(self.max_uses, Some(max) if self.uses >= max)
    }

    /// Check if the invite is still valid (not expired and not maxed out).
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        !self.is_expired_at(now) && !self.is_maxed_out()
    }
}

/// Outcome of redeeming an invite for a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InviteRedemption {
    /// A membership row was inserted and the use counter incremented.
    Joined,
    /// The user was already a member; nothing changed.
    AlreadyMember,
    /// The invite expired or ran out of uses before it could be consumed.
    Unavailable,
}

/// Repository trait for Invite data access operations.
#[async_trait]
pub trait InviteRepository: Send + Sync {
    /// Find an invite by its ID.
    async fn find_by_id(&self, id: i64) -> Result<Option<Invite>, AppError>;

    /// Create a new invite.
    async fn create(&self, invite: &Invite) -> Result<Invite, AppError>;

    /// Add `user_id` to the invite's server and count the use, atomically.
    ///
    /// The counter is only incremented when a membership row is inserted and
    /// never past `max_uses`.
    async fn redeem(
        &self,
        id: i64,
        user_id: i64,
        now: DateTime<Utc>,
    ) -> Result<InviteRedemption, AppError>;
}
