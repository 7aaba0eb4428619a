//! Response DTOs
//!
//! Data structures for API response bodies. Snowflake ids are rendered as
//! strings so JavaScript clients keep full precision.

use serde::Serialize;

use crate::domain::{
    Channel, ConversationTarget, Friend, FriendStatus, Invite, Message, Server, User,
};

/// User response
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub image: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub role: String,
    pub is_private: bool,
    pub created_at: String,
}

impl UserResponse {
    /// Email is only included for the account owner and admins.
    pub fn from_user(user: User, include_email: bool) -> Self {
        Self {
            id: user.id.to_string(),
            username: user.username,
            image: user.image,
            email: if include_email { user.email } else { None },
            role: user.role.as_str().to_string(),
            is_private: user.is_private,
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

/// Boolean answer for the admin check
#[derive(Debug, Serialize)]
pub struct IsAdminResponse {
    pub is_admin: bool,
}

/// Server response
#[derive(Debug, Clone, Serialize)]
pub struct ServerResponse {
    pub id: String,
    pub name: String,
    pub owner_id: String,
    pub icon_url: Option<String>,
    pub default_channel_id: Option<String>,
    pub created_at: String,
}

impl ServerResponse {
    pub fn from_server(server: Server, icon_url: Option<String>) -> Self {
        Self {
            id: server.id.to_string(),
            name: server.name,
            owner_id: server.owner_id.to_string(),
            icon_url,
            default_channel_id: server.default_channel_id.map(|id| id.to_string()),
            created_at: server.created_at.to_rfc3339(),
        }
    }
}

/// Result of creating a server
#[derive(Debug, Clone, Serialize)]
pub struct CreatedServerResponse {
    pub server_id: String,
    pub default_channel_id: String,
}

/// Channel response
#[derive(Debug, Clone, Serialize)]
pub struct ChannelResponse {
    pub id: String,
    pub server_id: String,
    pub name: String,
    pub created_at: String,
}

impl From<Channel> for ChannelResponse {
    fn from(channel: Channel) -> Self {
        Self {
            id: channel.id.to_string(),
            server_id: channel.server_id.to_string(),
            name: channel.name,
            created_at: channel.created_at.to_rfc3339(),
        }
    }
}

/// Bare id of a created row
#[derive(Debug, Clone, Serialize)]
pub struct IdResponse {
    pub id: String,
}

impl IdResponse {
    pub fn new(id: i64) -> Self {
        Self { id: id.to_string() }
    }
}

/// Invite response
#[derive(Debug, Clone, Serialize)]
pub struct InviteResponse {
    pub id: String,
    pub server_id: String,
    pub expires_at: Option<String>,
    pub max_uses: Option<i32>,
    pub uses: i32,
    pub created_at: String,
}

impl From<Invite> for InviteResponse {
    fn from(invite: Invite) -> Self {
        Self {
            id: invite.id.to_string(),
            server_id: invite.server_id.to_string(),
            expires_at: invite.expires_at.map(|t| t.to_rfc3339()),
            max_uses: invite.max_uses,
            uses: invite.uses,
            created_at: invite.created_at.to_rfc3339(),
        }
    }
}

/// Invite preview with its target server
#[derive(Debug, Clone, Serialize)]
pub struct InvitePreviewResponse {
    pub invite: InviteResponse,
    pub server: ServerResponse,
}

/// Result of joining through an invite
#[derive(Debug, Clone, Serialize)]
pub struct JoinInviteResponse {
    pub server_id: String,
    /// False when the caller already was a member
    pub joined: bool,
}

/// Friendship with the other party resolved
#[derive(Debug, Clone, Serialize)]
pub struct FriendResponse {
    pub id: String,
    pub status: FriendStatus,
    pub user: UserResponse,
    pub created_at: String,
}

impl FriendResponse {
    pub fn new(friend: Friend, other: User) -> Self {
        Self {
            id: friend.id.to_string(),
            status: friend.status,
            user: UserResponse::from_user(other, false),
            created_at: friend.created_at.to_rfc3339(),
        }
    }
}

/// Direct message with the other participant resolved
#[derive(Debug, Clone, Serialize)]
pub struct DirectMessageResponse {
    pub id: String,
    pub user: UserResponse,
    pub created_at: String,
}

/// Message response
#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub id: String,
    pub target: ConversationTarget,
    pub content: String,
    pub sender: Option<UserResponse>,
    pub attachment_id: Option<String>,
    pub attachment_url: Option<String>,
    pub deleted: bool,
    pub deleted_reason: Option<String>,
    pub created_at: String,
}

impl MessageResponse {
    /// Content of soft-deleted messages is withheld.
    pub fn new(message: Message, sender: Option<User>, attachment_url: Option<String>) -> Self {
        let content = if message.deleted {
            String::new()
        } else {
            message.content
        };

        Self {
            id: message.id.to_string(),
            target: message.target,
            content,
            sender: sender.map(|u| UserResponse::from_user(u, false)),
            attachment_id: message.attachment_id,
            attachment_url,
            deleted: message.deleted,
            deleted_reason: message.deleted_reason,
            created_at: message.created_at.to_rfc3339(),
        }
    }
}

/// Signed upload location
#[derive(Debug, Clone, Serialize)]
pub struct UploadUrlResponse {
    pub url: String,
    pub expires_at: String,
}

/// Id of an uploaded file
#[derive(Debug, Clone, Serialize)]
pub struct StoredFileResponse {
    #[serde(rename = "storageId")]
    pub storage_id: String,
}

/// Media-room access token
#[derive(Debug, Clone, Serialize)]
pub struct VoiceTokenResponse {
    pub token: String,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_deleted_message_hides_content() {
        let message = Message {
            id: 7,
            sender_id: 1,
            content: "spam".into(),
            target: ConversationTarget::Channel(3),
            attachment_id: None,
            deleted: true,
            deleted_reason: Some("flagged".into()),
            created_at: Utc::now(),
        };
        let response = MessageResponse::new(message, None, None);
        assert_eq!(response.content, "");
        assert!(response.deleted);
    }

    #[test]
    fn test_user_response_omits_email_for_others() {
        let user = User {
            id: 1,
            email: Some("a@example.com".into()),
            ..Default::default()
        };
        let json = serde_json::to_value(UserResponse::from_user(user, false)).unwrap();
        assert!(json.get("email").is_none());
        assert_eq!(json["id"], "1");
    }
}
