//! Server Member entity and repository trait.
//!
//! Maps to the `members` table in the database schema.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::error::AppError;

/// Represents a user's membership in a server.
///
/// Membership is binary; the only elevated position is server ownership,
/// which lives on the server row.
///
/// Maps to the `members` table:
/// - server_id: BIGINT NOT NULL REFERENCES servers(id) (composite PK)
/// - user_id: BIGINT NOT NULL REFERENCES users(id) (composite PK)
/// - joined_at: TIMESTAMPTZ NOT NULL DEFAULT NOW()
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    /// Server ID (part of composite primary key)
    pub server_id: i64,

    /// User ID (part of composite primary key)
    pub user_id: i64,

    /// When the user joined the server
    pub joined_at: DateTime<Utc>,
}

impl Member {
    /// Create a new member with just the required fields.
    pub fn new(server_id: i64, user_id: i64) -> Self {
        Self {
            server_id,
            user_id,
            joined_at: Utc::now(),
        }
    }
}

/// Repository trait for Member data access operations.
#[async_trait]
pub trait MemberRepository: Send + Sync {
    /// Find all members of a server, in join order.
    async fn find_by_server(&self, server_id: i64) -> Result<Vec<Member>, AppError>;

    /// Check if a user is a member of a server.
    async fn is_member(&self, server_id: i64, user_id: i64) -> Result<bool, AppError>;
}
