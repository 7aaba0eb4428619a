//! # Domain Entities
//!
//! Core domain entities representing the main business objects of the chat backend.
//! All entities map directly to their corresponding database tables.
//!
//! ## Core Entities
//!
//! - **User**: Account provisioned from the identity provider
//! - **Server**: A community that contains channels and members
//! - **Channel**: A text channel within a server
//! - **Member**: A user's membership in a specific server
//! - **Message**: A message sent to a channel or direct message
//!
//! ## Supporting Entities
//!
//! - **Invite**: Server invites with usage tracking
//! - **Friend**: Friend requests and friendships
//! - **DirectMessage**: Private two-party conversations
//! - **TypingIndicator**: Ephemeral "is typing" markers
//!
//! ## Repository Traits
//!
//! Each entity has an associated repository trait defining data access operations.
//! These traits are implemented in the infrastructure layer, following the
//! dependency inversion principle.

mod channel;
mod direct_message;
mod friend;
mod invite;
mod member;
mod message;
mod server;
mod typing;
mod user;

pub use channel::{Channel, ChannelRepository, DEFAULT_CHANNEL_NAME};
pub use direct_message::{DirectMessage, DirectMessageMember, DirectMessageRepository};
pub use friend::{Friend, FriendRepository, FriendStatus};
pub use invite::{Invite, InviteRedemption, InviteRepository};
pub use member::{Member, MemberRepository};
pub use message::{Message, MessageRepository};
pub use server::{Server, ServerRemoval, ServerRepository};
pub use typing::{TypingIndicator, TypingRepository};
pub use user::{User, UserRepository, UserRole};
