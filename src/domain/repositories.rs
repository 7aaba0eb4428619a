//! Bundle of repository handles shared by the application services.

use std::sync::Arc;

use super::entities::{
    ChannelRepository, DirectMessageRepository, FriendRepository, InviteRepository,
    MemberRepository, MessageRepository, ServerRepository, TypingRepository, UserRepository,
};

/// One handle per aggregate. Cloning is cheap.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub servers: Arc<dyn ServerRepository>,
    pub channels: Arc<dyn ChannelRepository>,
    pub members: Arc<dyn MemberRepository>,
    pub invites: Arc<dyn InviteRepository>,
    pub friends: Arc<dyn FriendRepository>,
    pub direct_messages: Arc<dyn DirectMessageRepository>,
    pub messages: Arc<dyn MessageRepository>,
    pub typing: Arc<dyn TypingRepository>,
}
