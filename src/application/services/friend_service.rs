//! Friend Service
//!
//! Friend requests and their status changes.
//!
//! Status rules: only the two parties may change a friendship; the
//! requester cannot accept their own pending request; setting the current
//! status again is a no-op. Any other transition is allowed, so a rejected
//! pair can be accepted later.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{info, instrument};

use crate::application::dto::response::FriendResponse;
use crate::domain::{Friend, FriendRepository, FriendStatus, UserRepository};
use crate::shared::error::AppError;
use crate::shared::snowflake::SnowflakeGenerator;

/// Friend service trait
#[async_trait]
pub trait FriendService: Send + Sync {
    /// Accepted friendships of the caller, each with the other user.
    async fn list_accepted(&self, user_id: i64) -> Result<Vec<FriendResponse>, FriendError>;

    /// Incoming pending requests, each with the requester.
    async fn list_pending(&self, user_id: i64) -> Result<Vec<FriendResponse>, FriendError>;

    /// Send a friend request to `username`.
    async fn request(&self, user_id: i64, username: &str) -> Result<FriendResponse, FriendError>;

    /// Change the status of a friendship the caller is part of.
    async fn update_status(
        &self,
        user_id: i64,
        friend_id: i64,
        status: FriendStatus,
    ) -> Result<(), FriendError>;
}

/// Friend service errors
#[derive(Debug, thiserror::Error)]
pub enum FriendError {
    #[error("Friend request not found")]
    NotFound,

    #[error("User not found")]
    UserNotFound,

    #[error("You cannot send a friend request to yourself")]
    SelfRequest,

    #[error("Friend request already exists")]
    AlreadyExists,

    #[error("You are not part of this friendship")]
    NotParticipant,

    #[error("You cannot accept your own friend request")]
    CannotAcceptOwnRequest,

    #[error(transparent)]
    Store(#[from] AppError),
}

impl From<FriendError> for AppError {
    fn from(err: FriendError) -> Self {
        match err {
            FriendError::NotFound | FriendError::UserNotFound => AppError::NotFound(err.to_string()),
            FriendError::SelfRequest => AppError::InvalidInput(err.to_string()),
            FriendError::AlreadyExists => AppError::AlreadyExists(err.to_string()),
            FriendError::NotParticipant | FriendError::CannotAcceptOwnRequest => {
                AppError::Forbidden(err.to_string())
            }
            FriendError::Store(e) => e,
        }
    }
}

/// Decide whether `user_id` may move `friend` to `status`.
///
/// Returns `Ok(false)` when nothing needs to change.
pub fn check_transition(
    friend: &Friend,
    user_id: i64,
    status: FriendStatus,
) -> Result<bool, FriendError> {
    if !friend.involves(user_id) {
        return Err(FriendError::NotParticipant);
    }
    if friend.status == status {
        return Ok(false);
    }
    if friend.status == FriendStatus::Pending
        && status == FriendStatus::Accepted
        && friend.user1_id == user_id
    {
        return Err(FriendError::CannotAcceptOwnRequest);
    }
    Ok(true)
}

/// FriendService implementation
pub struct FriendServiceImpl {
    friend_repo: Arc<dyn FriendRepository>,
    user_repo: Arc<dyn UserRepository>,
    id_generator: Arc<SnowflakeGenerator>,
}

impl FriendServiceImpl {
    pub fn new(
        friend_repo: Arc<dyn FriendRepository>,
        user_repo: Arc<dyn UserRepository>,
        id_generator: Arc<SnowflakeGenerator>,
    ) -> Self {
        Self {
            friend_repo,
            user_repo,
            id_generator,
        }
    }

    async fn resolve(
        &self,
        user_id: i64,
        friends: Vec<Friend>,
    ) -> Result<Vec<FriendResponse>, AppError> {
        let mut responses = Vec::with_capacity(friends.len());
        for friend in friends {
            let Some(other_id) = friend.other_party(user_id) else {
                continue;
            };
            if let Some(other) = self.user_repo.find_by_id(other_id).await? {
                responses.push(FriendResponse::new(friend, other));
            }
        }
        Ok(responses)
    }
}

#[async_trait]
impl FriendService for FriendServiceImpl {
    async fn list_accepted(&self, user_id: i64) -> Result<Vec<FriendResponse>, FriendError> {
        let mut friends = self
            .friend_repo
            .find_by_user1_status(user_id, FriendStatus::Accepted)
            .await?;
        friends.extend(
            self.friend_repo
                .find_by_user2_status(user_id, FriendStatus::Accepted)
                .await?,
        );
        friends.sort_by_key(|f| f.id);

        Ok(self.resolve(user_id, friends).await?)
    }

    async fn list_pending(&self, user_id: i64) -> Result<Vec<FriendResponse>, FriendError> {
        let friends = self
            .friend_repo
            .find_by_user2_status(user_id, FriendStatus::Pending)
            .await?;

        Ok(self.resolve(user_id, friends).await?)
    }

    #[instrument(skip(self))]
    async fn request(&self, user_id: i64, username: &str) -> Result<FriendResponse, FriendError> {
        let recipient = self
            .user_repo
            .find_by_username(username)
            .await?
            .ok_or(FriendError::UserNotFound)?;

        if recipient.id == user_id {
            return Err(FriendError::SelfRequest);
        }

        let friend = match self.friend_repo.find_between(user_id, recipient.id).await? {
            Some(existing) if existing.status != FriendStatus::Rejected => {
                return Err(FriendError::AlreadyExists);
            }
            Some(mut rejected) => {
                rejected.user1_id = user_id;
                rejected.user2_id = recipient.id;
                rejected.status = FriendStatus::Pending;
                self.friend_repo.update(&rejected).await?
            }
            None => {
                let friend = Friend {
                    id: self.id_generator.generate(),
                    user1_id: user_id,
                    user2_id: recipient.id,
                    status: FriendStatus::Pending,
                    created_at: Utc::now(),
                };
                self.friend_repo.create(&friend).await?
            }
        };

        info!(friend_id = friend.id, recipient_id = recipient.id, "Friend request sent");
        Ok(FriendResponse::new(friend, recipient))
    }

    async fn update_status(
        &self,
        user_id: i64,
        friend_id: i64,
        status: FriendStatus,
    ) -> Result<(), FriendError> {
        let mut friend = self
            .friend_repo
            .find_by_id(friend_id)
            .await?
            .ok_or(FriendError::NotFound)?;

        if !check_transition(&friend, user_id, status)? {
            return Ok(());
        }

        friend.status = status;
        self.friend_repo.update(&friend).await?;
        Ok(())
    }
}
