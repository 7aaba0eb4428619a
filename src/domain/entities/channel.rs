//! Channel entity and repository trait.
//!
//! Maps to the `channels` table in the database schema.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::error::AppError;

/// Name given to the channel every new server starts with.
pub const DEFAULT_CHANNEL_NAME: &str = "general";

/// Represents a text channel inside a server.
///
/// Maps to the `channels` table:
/// - id: BIGINT PRIMARY KEY (Snowflake ID)
/// - server_id: BIGINT NOT NULL REFERENCES servers(id)
/// - name: VARCHAR(100) NOT NULL, UNIQUE (server_id, name)
/// - created_at: TIMESTAMPTZ NOT NULL DEFAULT NOW()
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    /// Snowflake ID (primary key)
    pub id: i64,

    /// Owning server
    pub server_id: i64,

    /// Channel name, unique within the server
    pub name: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Channel {
    pub fn new(id: i64, server_id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            server_id,
            name: name.into(),
            created_at: Utc::now(),
        }
    }
}

/// Repository trait for Channel data access operations.
#[async_trait]
pub trait ChannelRepository: Send + Sync {
    /// Find a channel by its Snowflake ID.
    async fn find_by_id(&self, id: i64) -> Result<Option<Channel>, AppError>;

    /// Find all channels of a server, oldest first.
    async fn find_by_server(&self, server_id: i64) -> Result<Vec<Channel>, AppError>;

    /// Unique lookup on `(server_id, name)`.
    async fn find_by_server_and_name(
        &self,
        server_id: i64,
        name: &str,
    ) -> Result<Option<Channel>, AppError>;

    /// Create a channel. A duplicate name yields `AlreadyExists`.
    async fn create(&self, channel: &Channel) -> Result<Channel, AppError>;

    /// Delete a channel and its messages. Returns the attachment file ids of
    /// the removed messages.
    async fn delete_cascade(&self, id: i64) -> Result<Vec<String>, AppError>;
}
