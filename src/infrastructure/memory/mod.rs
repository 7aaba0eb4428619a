//! In-memory storage backend
//!
//! Implements every repository trait over one set of tables behind a single
//! lock, so compound operations are atomic the same way a database
//! transaction would make them. Used by tests and `storage.backend = "memory"`.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::domain::{
    Channel, ChannelRepository, ConversationTarget, DirectMessage, DirectMessageRepository,
    Friend, FriendRepository, FriendStatus, Invite, InviteRedemption, InviteRepository, Member,
    MemberRepository, Message, MessageRepository, Repositories, Server, ServerRemoval,
    ServerRepository, TypingIndicator, TypingRepository, User, UserRepository,
};
use crate::shared::error::AppError;

#[derive(Default)]
struct Tables {
    users: HashMap<i64, User>,
    servers: HashMap<i64, Server>,
    channels: BTreeMap<i64, Channel>,
    members: BTreeMap<(i64, i64), Member>,
    invites: HashMap<i64, Invite>,
    friends: BTreeMap<i64, Friend>,
    direct_messages: HashMap<i64, DirectMessage>,
    dm_members: BTreeSet<(i64, i64)>,
    messages: BTreeMap<i64, Message>,
    typing: HashMap<(i64, ConversationTarget), TypingIndicator>,
}

impl Tables {
    /// Remove the messages of a conversation, returning their attachments.
    fn purge_messages(&mut self, target: ConversationTarget) -> Vec<String> {
        let ids: Vec<i64> = self
            .messages
            .values()
            .filter(|m| m.target == target)
            .map(|m| m.id)
            .collect();

        ids.into_iter()
            .filter_map(|id| self.messages.remove(&id))
            .filter_map(|m| m.attachment_id)
            .collect()
    }

    fn purge_typing(&mut self, target: ConversationTarget) {
        self.typing.retain(|(_, t), _| *t != target);
    }
}

/// Shared in-memory store.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Repository handles that all point at `store`.
    pub fn repositories(store: Arc<Self>) -> Repositories {
        Repositories {
            users: store.clone(),
            servers: store.clone(),
            channels: store.clone(),
            members: store.clone(),
            invites: store.clone(),
            friends: store.clone(),
            direct_messages: store.clone(),
            messages: store.clone(),
            typing: store,
        }
    }
}

fn not_found(what: &str) -> AppError {
    AppError::NotFound(format!("{} not found", what))
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        Ok(self.tables.read().users.get(&id).cloned())
    }

    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<User>, AppError> {
        let tables = self.tables.read();
        Ok(ids
            .iter()
            .filter_map(|id| tables.users.get(id).cloned())
            .collect())
    }

    async fn find_by_external_id(&self, external_id: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .tables
            .read()
            .users
            .values()
            .find(|u| u.external_id == external_id)
            .cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let tables = self.tables.read();
        let mut matches: Vec<&User> = tables
            .users
            .values()
            .filter(|u| u.username == username)
            .collect();
        matches.sort_by_key(|u| u.id);
        Ok(matches.first().map(|u| (*u).clone()))
    }

    async fn list_all(&self) -> Result<Vec<User>, AppError> {
        let mut users: Vec<User> = self.tables.read().users.values().cloned().collect();
        users.sort_by_key(|u| u.id);
        Ok(users)
    }

    async fn list_by_privacy(&self, is_private: bool) -> Result<Vec<User>, AppError> {
        let mut users: Vec<User> = self
            .tables
            .read()
            .users
            .values()
            .filter(|u| u.is_private == is_private)
            .cloned()
            .collect();
        users.sort_by_key(|u| u.id);
        Ok(users)
    }

    async fn create(&self, user: &User) -> Result<User, AppError> {
        let mut tables = self.tables.write();
        if tables
            .users
            .values()
            .any(|u| u.external_id == user.external_id)
        {
            return Err(AppError::AlreadyExists("User already exists".into()));
        }
        tables.users.insert(user.id, user.clone());
        Ok(user.clone())
    }

    async fn update(&self, user: &User) -> Result<User, AppError> {
        let mut tables = self.tables.write();
        let stored = tables.users.get_mut(&user.id).ok_or_else(|| not_found("User"))?;
        stored.username = user.username.clone();
        stored.image = user.image.clone();
        stored.email = user.email.clone();
        stored.role = user.role;
        Ok(stored.clone())
    }

    async fn set_privacy(&self, id: i64, is_private: bool) -> Result<User, AppError> {
        let mut tables = self.tables.write();
        let stored = tables.users.get_mut(&id).ok_or_else(|| not_found("User"))?;
        stored.is_private = is_private;
        Ok(stored.clone())
    }

    async fn delete(&self, id: i64) -> Result<(), AppError> {
        let mut tables = self.tables.write();
        tables.users.remove(&id);
        tables.members.retain(|(_, user_id), _| *user_id != id);
        tables.friends.retain(|_, f| !f.involves(id));
        tables.typing.retain(|(user_id, _), _| *user_id != id);
        Ok(())
    }
}

#[async_trait]
impl ServerRepository for MemoryStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<Server>, AppError> {
        Ok(self.tables.read().servers.get(&id).cloned())
    }

    async fn find_by_member(&self, user_id: i64) -> Result<Vec<Server>, AppError> {
        let tables = self.tables.read();
        let mut memberships: Vec<&Member> = tables
            .members
            .values()
            .filter(|m| m.user_id == user_id)
            .collect();
        memberships.sort_by_key(|m| (m.joined_at, m.server_id));

        Ok(memberships
            .into_iter()
            .filter_map(|m| tables.servers.get(&m.server_id).cloned())
            .collect())
    }

    async fn create_with_default_channel(
        &self,
        server: &Server,
        channel: &Channel,
    ) -> Result<Server, AppError> {
        let mut tables = self.tables.write();

        let mut server = server.clone();
        server.default_channel_id = Some(channel.id);

        tables.servers.insert(server.id, server.clone());
        tables.channels.insert(channel.id, channel.clone());
        tables.members.insert(
            (server.id, server.owner_id),
            Member::new(server.id, server.owner_id),
        );

        Ok(server)
    }

    async fn delete_cascade(&self, id: i64) -> Result<ServerRemoval, AppError> {
        let mut tables = self.tables.write();

        let Some(server) = tables.servers.remove(&id) else {
            return Err(not_found("Server"));
        };

        let channel_ids: Vec<i64> = tables
            .channels
            .values()
            .filter(|c| c.server_id == id)
            .map(|c| c.id)
            .collect();

        let mut attachment_ids = Vec::new();
        for channel_id in &channel_ids {
            let target = ConversationTarget::Channel(*channel_id);
            attachment_ids.extend(tables.purge_messages(target));
            tables.purge_typing(target);
            tables.channels.remove(channel_id);
        }

        tables.members.retain(|(server_id, _), _| *server_id != id);
        tables.invites.retain(|_, invite| invite.server_id != id);

        Ok(ServerRemoval {
            channel_ids,
            attachment_ids,
            icon_id: server.icon_id,
        })
    }
}

#[async_trait]
impl ChannelRepository for MemoryStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<Channel>, AppError> {
        Ok(self.tables.read().channels.get(&id).cloned())
    }

    async fn find_by_server(&self, server_id: i64) -> Result<Vec<Channel>, AppError> {
        Ok(self
            .tables
            .read()
            .channels
            .values()
            .filter(|c| c.server_id == server_id)
            .cloned()
            .collect())
    }

    async fn find_by_server_and_name(
        &self,
        server_id: i64,
        name: &str,
    ) -> Result<Option<Channel>, AppError> {
        Ok(self
            .tables
            .read()
            .channels
            .values()
            .find(|c| c.server_id == server_id && c.name == name)
            .cloned())
    }

    async fn create(&self, channel: &Channel) -> Result<Channel, AppError> {
        let mut tables = self.tables.write();
        if tables
            .channels
            .values()
            .any(|c| c.server_id == channel.server_id && c.name == channel.name)
        {
            return Err(AppError::AlreadyExists("Channel already exists".into()));
        }
        tables.channels.insert(channel.id, channel.clone());
        Ok(channel.clone())
    }

    async fn delete_cascade(&self, id: i64) -> Result<Vec<String>, AppError> {
        let mut tables = self.tables.write();
        if tables.channels.remove(&id).is_none() {
            return Err(not_found("Channel"));
        }
        let target = ConversationTarget::Channel(id);
        let attachments = tables.purge_messages(target);
        tables.purge_typing(target);
        Ok(attachments)
    }
}

#[async_trait]
impl MemberRepository for MemoryStore {
    async fn find_by_server(&self, server_id: i64) -> Result<Vec<Member>, AppError> {
        let mut members: Vec<Member> = self
            .tables
            .read()
            .members
            .values()
            .filter(|m| m.server_id == server_id)
            .cloned()
            .collect();
        members.sort_by_key(|m| (m.joined_at, m.user_id));
        Ok(members)
    }

    async fn is_member(&self, server_id: i64, user_id: i64) -> Result<bool, AppError> {
        Ok(self
            .tables
            .read()
            .members
            .contains_key(&(server_id, user_id)))
    }
}

#[async_trait]
impl InviteRepository for MemoryStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<Invite>, AppError> {
        Ok(self.tables.read().invites.get(&id).cloned())
    }

    async fn create(&self, invite: &Invite) -> Result<Invite, AppError> {
        self.tables
            .write()
            .invites
            .insert(invite.id, invite.clone());
        Ok(invite.clone())
    }

    async fn redeem(
        &self,
        id: i64,
        user_id: i64,
        now: DateTime<Utc>,
    ) -> Result<InviteRedemption, AppError> {
        let mut tables = self.tables.write();

        let invite = tables.invites.get(&id).cloned().ok_or_else(|| not_found("Invite"))?;
        if tables.members.contains_key(&(invite.server_id, user_id)) {
            return Ok(InviteRedemption::AlreadyMember);
        }
        if !invite.is_valid_at(now) {
            return Ok(InviteRedemption::Unavailable);
        }
        if !tables.servers.contains_key(&invite.server_id) {
            return Err(not_found("Server"));
        }

        tables.members.insert(
            (invite.server_id, user_id),
            Member::new(invite.server_id, user_id),
        );
        if let Some(stored) = tables.invites.get_mut(&id) {
            stored.uses += 1;
        }

        Ok(InviteRedemption::Joined)
    }
}

#[async_trait]
impl FriendRepository for MemoryStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<Friend>, AppError> {
        Ok(self.tables.read().friends.get(&id).cloned())
    }

    async fn find_between(&self, a: i64, b: i64) -> Result<Option<Friend>, AppError> {
        Ok(self
            .tables
            .read()
            .friends
            .values()
            .find(|f| {
                (f.user1_id == a && f.user2_id == b) || (f.user1_id == b && f.user2_id == a)
            })
            .cloned())
    }

    async fn find_by_user1_status(
        &self,
        user_id: i64,
        status: FriendStatus,
    ) -> Result<Vec<Friend>, AppError> {
        Ok(self
            .tables
            .read()
            .friends
            .values()
            .filter(|f| f.user1_id == user_id && f.status == status)
            .cloned()
            .collect())
    }

    async fn find_by_user2_status(
        &self,
        user_id: i64,
        status: FriendStatus,
    ) -> Result<Vec<Friend>, AppError> {
        Ok(self
            .tables
            .read()
            .friends
            .values()
            .filter(|f| f.user2_id == user_id && f.status == status)
            .cloned()
            .collect())
    }

    async fn create(&self, friend: &Friend) -> Result<Friend, AppError> {
        let mut tables = self.tables.write();
        let duplicate = tables.friends.values().any(|f| {
            (f.user1_id == friend.user1_id && f.user2_id == friend.user2_id)
                || (f.user1_id == friend.user2_id && f.user2_id == friend.user1_id)
        });
        if duplicate {
            return Err(AppError::AlreadyExists("Friend request already exists".into()));
        }
        tables.friends.insert(friend.id, friend.clone());
        Ok(friend.clone())
    }

    async fn update(&self, friend: &Friend) -> Result<Friend, AppError> {
        let mut tables = self.tables.write();
        let stored = tables
            .friends
            .get_mut(&friend.id)
            .ok_or_else(|| not_found("Friend request"))?;
        stored.user1_id = friend.user1_id;
        stored.user2_id = friend.user2_id;
        stored.status = friend.status;
        Ok(stored.clone())
    }
}

#[async_trait]
impl DirectMessageRepository for MemoryStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<DirectMessage>, AppError> {
        Ok(self.tables.read().direct_messages.get(&id).cloned())
    }

    async fn find_members(&self, direct_message_id: i64) -> Result<Vec<i64>, AppError> {
        Ok(self
            .tables
            .read()
            .dm_members
            .range((direct_message_id, i64::MIN)..=(direct_message_id, i64::MAX))
            .map(|(_, user_id)| *user_id)
            .collect())
    }

    async fn is_member(&self, direct_message_id: i64, user_id: i64) -> Result<bool, AppError> {
        Ok(self
            .tables
            .read()
            .dm_members
            .contains(&(direct_message_id, user_id)))
    }

    async fn find_by_user(&self, user_id: i64) -> Result<Vec<DirectMessage>, AppError> {
        let tables = self.tables.read();
        Ok(tables
            .dm_members
            .iter()
            .filter(|(_, member)| *member == user_id)
            .filter_map(|(dm_id, _)| tables.direct_messages.get(dm_id).cloned())
            .collect())
    }

    async fn find_or_create_between(
        &self,
        new_id: i64,
        a: i64,
        b: i64,
    ) -> Result<DirectMessage, AppError> {
        let mut tables = self.tables.write();

        let existing = tables
            .dm_members
            .iter()
            .filter(|(_, user_id)| *user_id == a)
            .map(|(dm_id, _)| *dm_id)
            .find(|dm_id| tables.dm_members.contains(&(*dm_id, b)));

        if let Some(dm) = existing.and_then(|id| tables.direct_messages.get(&id).cloned()) {
            return Ok(dm);
        }

        let dm = DirectMessage {
            id: new_id,
            created_at: Utc::now(),
        };
        tables.direct_messages.insert(dm.id, dm.clone());
        tables.dm_members.insert((dm.id, a));
        tables.dm_members.insert((dm.id, b));
        Ok(dm)
    }
}

#[async_trait]
impl MessageRepository for MemoryStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<Message>, AppError> {
        Ok(self.tables.read().messages.get(&id).cloned())
    }

    async fn find_by_target(&self, target: ConversationTarget) -> Result<Vec<Message>, AppError> {
        Ok(self
            .tables
            .read()
            .messages
            .values()
            .filter(|m| m.target == target)
            .cloned()
            .collect())
    }

    async fn create(&self, message: &Message) -> Result<Message, AppError> {
        self.tables
            .write()
            .messages
            .insert(message.id, message.clone());
        Ok(message.clone())
    }

    async fn delete(&self, id: i64) -> Result<(), AppError> {
        self.tables.write().messages.remove(&id);
        Ok(())
    }

    async fn mark_deleted(&self, id: i64, reason: &str) -> Result<(), AppError> {
        let mut tables = self.tables.write();
        if let Some(message) = tables.messages.get_mut(&id) {
            message.deleted = true;
            message.deleted_reason = Some(reason.to_string());
        }
        Ok(())
    }
}

#[async_trait]
impl TypingRepository for MemoryStore {
    async fn upsert(&self, indicator: &TypingIndicator) -> Result<(), AppError> {
        self.tables
            .write()
            .typing
            .insert((indicator.user_id, indicator.target), indicator.clone());
        Ok(())
    }

    async fn find_active(
        &self,
        target: ConversationTarget,
        now: DateTime<Utc>,
    ) -> Result<Vec<TypingIndicator>, AppError> {
        let mut active: Vec<TypingIndicator> = self
            .tables
            .read()
            .typing
            .values()
            .filter(|i| i.target == target && i.is_active_at(now))
            .cloned()
            .collect();
        active.sort_by_key(|i| i.user_id);
        Ok(active)
    }

    async fn remove(&self, user_id: i64, target: ConversationTarget) -> Result<bool, AppError> {
        Ok(self
            .tables
            .write()
            .typing
            .remove(&(user_id, target))
            .is_some())
    }

    async fn clear_target(&self, target: ConversationTarget) -> Result<(), AppError> {
        self.tables.write().purge_typing(target);
        Ok(())
    }
}
