//! Friendship entity and repository trait.
//!
//! Maps to the `friends` table in the database schema.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::error::AppError;

/// Friendship status matching the `status` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FriendStatus {
    Pending,
    Accepted,
    Rejected,
}

impl FriendStatus {
    /// Parse from the database representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "accepted" => Some(Self::Accepted),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }
}

/// A friendship between two users.
///
/// `user1` is always the requester and `user2` the recipient.
///
/// Maps to the `friends` table:
/// - id: BIGINT PRIMARY KEY (Snowflake ID)
/// - user1_id: BIGINT NOT NULL REFERENCES users(id)
/// - user2_id: BIGINT NOT NULL REFERENCES users(id)
/// - status: VARCHAR(16) NOT NULL
/// - created_at: TIMESTAMPTZ NOT NULL DEFAULT NOW()
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Friend {
    pub id: i64,
    pub user1_id: i64,
    pub user2_id: i64,
    pub status: FriendStatus,
    pub created_at: DateTime<Utc>,
}

impl Friend {
    /// Whether `user_id` is one of the two parties.
    pub fn involves(&self, user_id: i64) -> bool {
        self.user1_id == user_id || self.user2_id == user_id
    }

    /// The party that is not `user_id`.
    pub fn other_party(&self, user_id: i64) -> Option<i64> {
        if self.user1_id == user_id {
            Some(self.user2_id)
        } else if self.user2_id == user_id {
            Some(self.user1_id)
        } else {
            None
        }
    }
}

/// Repository trait for Friend data access operations.
#[async_trait]
pub trait FriendRepository: Send + Sync {
    /// Find a friendship by its ID.
    async fn find_by_id(&self, id: i64) -> Result<Option<Friend>, AppError>;

    /// Find the friendship between two users, in either direction.
    async fn find_between(&self, a: i64, b: i64) -> Result<Option<Friend>, AppError>;

    /// Friendships sent by `user_id` with the given status.
    async fn find_by_user1_status(
        &self,
        user_id: i64,
        status: FriendStatus,
    ) -> Result<Vec<Friend>, AppError>;

    /// Friendships received by `user_id` with the given status.
    async fn find_by_user2_status(
        &self,
        user_id: i64,
        status: FriendStatus,
    ) -> Result<Vec<Friend>, AppError>;

    /// Create a friendship row.
    async fn create(&self, friend: &Friend) -> Result<Friend, AppError>;

    /// Persist parties and status of an existing friendship.
    async fn update(&self, friend: &Friend) -> Result<Friend, AppError>;
}
