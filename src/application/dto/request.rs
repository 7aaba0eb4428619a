//! Request DTOs
//!
//! Data structures for API request bodies.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use validator::Validate;

use crate::domain::{ConversationTarget, FriendStatus, TargetKind};
use crate::shared::error::AppError;
use crate::shared::validation::parse_id;

/// Create server request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateServerRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    /// Id of an uploaded file to use as icon
    pub icon_id: Option<String>,
}

/// Create channel request. The name is checked after the owner guard.
#[derive(Debug, Deserialize)]
pub struct CreateChannelRequest {
    pub name: String,
}

/// Create invite request. Limits are checked after the membership guard.
#[derive(Debug, Default, Deserialize)]
pub struct CreateInviteRequest {
    pub expires_at: Option<DateTime<Utc>>,
    pub max_uses: Option<i32>,
}

/// Send friend request
#[derive(Debug, Deserialize, Validate)]
pub struct FriendRequestRequest {
    #[validate(length(min = 1, max = 64, message = "Username must be 1-64 characters"))]
    pub username: String,
}

/// Change a friendship status
#[derive(Debug, Deserialize)]
pub struct UpdateFriendStatusRequest {
    pub status: FriendStatus,
}

/// Open (find or create) a direct message
#[derive(Debug, Deserialize)]
pub struct OpenDirectMessageRequest {
    pub user_id: String,
}

/// Send a message
#[derive(Debug, Deserialize)]
pub struct CreateMessageRequest {
    pub target: ConversationTarget,
    pub content: String,

    pub attachment_id: Option<String>,
}

/// Typing indicator refresh
#[derive(Debug, Deserialize)]
pub struct TypingRequest {
    pub target: ConversationTarget,
}

/// Conversation selector in query strings: `?kind=channel&id=123`
#[derive(Debug, Deserialize)]
pub struct TargetQuery {
    pub kind: String,
    pub id: String,
}

impl TargetQuery {
    /// Resolve into a conversation target.
    pub fn target(&self) -> Result<ConversationTarget, AppError> {
        let kind = TargetKind::parse(&self.kind).ok_or_else(|| {
            AppError::InvalidInput(format!("Unknown target kind '{}'", self.kind))
        })?;
        Ok(ConversationTarget::from_parts(kind, parse_id(&self.id, "target")?))
    }
}

/// Change own privacy flag
#[derive(Debug, Deserialize)]
pub struct SetPrivacyRequest {
    pub is_private: bool,
}

/// Admin: set a user's email
#[derive(Debug, Deserialize, Validate)]
pub struct SetEmailRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

/// Admin: message a user directly
#[derive(Debug, Deserialize, Validate)]
pub struct AdminDirectMessageRequest {
    pub user_id: String,

    #[validate(length(min = 1, max = 4000, message = "Content must be 1-4000 characters"))]
    pub content: String,
}

/// Voice token query: `?serverId=123`
#[derive(Debug, Deserialize)]
pub struct VoiceTokenQuery {
    #[serde(rename = "serverId")]
    pub server_id: Option<String>,
}
