//! Application Services
//!
//! Business logic services that coordinate domain operations.
//!
//! ## Available Services
//!
//! - **IdentityService**: Bearer token verification and user provisioning
//! - **UserService**: Profile sync, directory, privacy, admin operations
//! - **ServerService**: Server management and cascading deletion
//! - **ChannelService**: Channel operations
//! - **InviteService**: Server invites
//! - **FriendService**: Friend requests
//! - **DirectMessageService**: Two-party conversations
//! - **MessageService**: Message CRUD and job dispatch
//! - **TypingService**: Typing indicators
//! - **ModerationService**: Post-hoc content moderation
//! - **VoiceService**: Media-room token minting

pub mod channel_service;
pub mod direct_message_service;
pub mod friend_service;
pub mod identity_service;
pub mod invite_service;
pub mod message_service;
pub mod moderation_service;
pub mod server_service;
pub mod typing_service;
pub mod user_service;
pub mod voice_service;

pub use channel_service::{ChannelError, ChannelService, ChannelServiceImpl};
pub use direct_message_service::{
    DirectMessageError, DirectMessageService, DirectMessageServiceImpl,
};
pub use friend_service::{FriendError, FriendService, FriendServiceImpl};
pub use identity_service::{
    AuthenticatedUser, IdentityError, IdentityService, IdentityServiceImpl,
};
pub use invite_service::{CreateInviteDto, InviteError, InviteService, InviteServiceImpl};
pub use message_service::{
    CreateMessageDto, CreatedMessage, MessageError, MessageService, MessageServiceImpl,
};
pub use moderation_service::{
    KeywordClassifier, ModerationService, ModerationServiceImpl, ModerationVerdict,
};
pub use server_service::{CreateServerDto, ServerError, ServerService, ServerServiceImpl};
pub use typing_service::{TypingError, TypingService, TypingServiceImpl};
pub use user_service::{UpsertUserDto, UserError, UserService, UserServiceImpl};
pub use voice_service::{VoiceError, VoiceService, VoiceServiceImpl};
