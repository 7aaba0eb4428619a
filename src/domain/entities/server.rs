//! Server entity and repository trait.
//!
//! Maps to the `servers` table in the database schema.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Channel;
use crate::shared::error::AppError;

/// Represents a server in the chat system.
///
/// A server is a community space containing channels and members.
///
/// Maps to the `servers` table:
/// - id: BIGINT PRIMARY KEY (Snowflake ID)
/// - name: VARCHAR(100) NOT NULL
/// - owner_id: BIGINT NOT NULL REFERENCES users(id)
/// - icon_id: TEXT NULL (stored file id)
/// - default_channel_id: BIGINT NULL REFERENCES channels(id)
/// - created_at: TIMESTAMPTZ NOT NULL DEFAULT NOW()
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Server {
    /// Snowflake ID (primary key)
    pub id: i64,

    /// Server name (1-100 characters)
    pub name: String,

    /// User ID of the server owner
    pub owner_id: i64,

    /// Stored file id of the server icon
    pub icon_id: Option<String>,

    /// Channel that can never be deleted
    pub default_channel_id: Option<i64>,

    /// Server creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Server {
    /// Check if a user is the owner of this server.
    pub fn is_owner(&self, user_id: i64) -> bool {
        self.owner_id == user_id
    }

    /// Check if a channel is this server's default channel.
    pub fn is_default_channel(&self, channel_id: i64) -> bool {
        self.default_channel_id == Some(channel_id)
    }
}

/// What a cascading server delete removed, for cleanup outside the
/// storage transaction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServerRemoval {
    /// Channels that were deleted
    pub channel_ids: Vec<i64>,

    /// Attachment file ids of the deleted messages
    pub attachment_ids: Vec<String>,

    /// Icon file id of the deleted server
    pub icon_id: Option<String>,
}

/// Repository trait for Server data access operations.
#[async_trait]
pub trait ServerRepository: Send + Sync {
    /// Find a server by its Snowflake ID.
    async fn find_by_id(&self, id: i64) -> Result<Option<Server>, AppError>;

    /// Find all servers a user is a member of.
    async fn find_by_member(&self, user_id: i64) -> Result<Vec<Server>, AppError>;

    /// Create a server together with its default channel and the owner's
    /// membership, all in one unit.
    async fn create_with_default_channel(
        &self,
        server: &Server,
        channel: &Channel,
    ) -> Result<Server, AppError>;

    /// Delete a server and everything that hangs off it: messages of its
    /// channels, channels, memberships and invites.
    async fn delete_cascade(&self, id: i64) -> Result<ServerRemoval, AppError>;
}
