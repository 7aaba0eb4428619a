//! Authorization guards shared by every handler.

use std::collections::HashSet;
use std::sync::Arc;

use crate::domain::entities::{
    ChannelRepository, DirectMessageRepository, MemberRepository, Server, ServerRepository, User,
    UserRole,
};
use crate::domain::repositories::Repositories;
use crate::domain::value_objects::ConversationTarget;
use crate::shared::error::AppError;

/// Guard failures.
#[derive(Debug, thiserror::Error)]
pub enum AccessError {
    #[error("Server not found")]
    ServerNotFound,

    #[error("Channel not found")]
    ChannelNotFound,

    #[error("Direct message not found")]
    DirectMessageNotFound,

    #[error("You are not a member of this server")]
    NotServerMember,

    #[error("You are not the owner of this server")]
    NotServerOwner,

    #[error("You are not a member of this direct message")]
    NotDirectMessageMember,

    #[error("Admin access required")]
    NotAdmin,

    #[error(transparent)]
    Store(#[from] AppError),
}

impl From<AccessError> for AppError {
    fn from(err: AccessError) -> Self {
        match err {
            AccessError::ServerNotFound
            | AccessError::ChannelNotFound
            | AccessError::DirectMessageNotFound => AppError::NotFound(err.to_string()),
            AccessError::NotServerMember
            | AccessError::NotServerOwner
            | AccessError::NotDirectMessageMember
            | AccessError::NotAdmin => AppError::Forbidden(err.to_string()),
            AccessError::Store(e) => e,
        }
    }
}

/// Membership and ownership checks against the repositories.
#[derive(Clone)]
pub struct AccessGuard {
    servers: Arc<dyn ServerRepository>,
    members: Arc<dyn MemberRepository>,
    channels: Arc<dyn ChannelRepository>,
    direct_messages: Arc<dyn DirectMessageRepository>,
}

impl AccessGuard {
    pub fn new(repos: &Repositories) -> Self {
        Self {
            servers: repos.servers.clone(),
            members: repos.members.clone(),
            channels: repos.channels.clone(),
            direct_messages: repos.direct_messages.clone(),
        }
    }

    /// Require a membership row for `(server_id, user_id)`.
    pub async fn assert_server_member(
        &self,
        user_id: i64,
        server_id: i64,
    ) -> Result<(), AccessError> {
        if self.members.is_member(server_id, user_id).await? {
            Ok(())
        } else {
            Err(AccessError::NotServerMember)
        }
    }

    /// Require that the server exists and `user_id` owns it.
    pub async fn assert_server_owner(
        &self,
        user_id: i64,
        server_id: i64,
    ) -> Result<Server, AccessError> {
        let server = self
            .servers
            .find_by_id(server_id)
            .await?
            .ok_or(AccessError::ServerNotFound)?;

        if !server.is_owner(user_id) {
            return Err(AccessError::NotServerOwner);
        }

        Ok(server)
    }

    /// Require membership of the channel's server or of the direct message.
    pub async fn assert_conversation_member(
        &self,
        user_id: i64,
        target: ConversationTarget,
    ) -> Result<(), AccessError> {
        match target {
            ConversationTarget::Channel(channel_id) => {
                let channel = self
                    .channels
                    .find_by_id(channel_id)
                    .await?
                    .ok_or(AccessError::ChannelNotFound)?;
                self.assert_server_member(user_id, channel.server_id).await
            }
            ConversationTarget::DirectMessage(dm_id) => {
                self.direct_messages
                    .find_by_id(dm_id)
                    .await?
                    .ok_or(AccessError::DirectMessageNotFound)?;
                if self.direct_messages.is_member(dm_id, user_id).await? {
                    Ok(())
                } else {
                    Err(AccessError::NotDirectMessageMember)
                }
            }
        }
    }

    /// The single admin gate.
    pub fn require_admin(user: &User) -> Result<(), AccessError> {
        if user.is_admin() {
            Ok(())
        } else {
            Err(AccessError::NotAdmin)
        }
    }
}

/// Emails that are granted the admin role.
#[derive(Debug, Clone, Default)]
pub struct AdminAllowList {
    emails: HashSet<String>,
}

impl AdminAllowList {
    pub fn new<I, S>(emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            emails: emails
                .into_iter()
                .map(|e| e.as_ref().trim().to_lowercase())
                .filter(|e| !e.is_empty())
                .collect(),
        }
    }

    /// Role for a user with the given email.
    pub fn role_for(&self, email: Option<&str>) -> UserRole {
        match email {
            Some(email) if self.emails.contains(&email.trim().to_lowercase()) => UserRole::Admin,
            _ => UserRole::User,
        }
    }
}
