//! In-memory identity registry.
//!
//! Backs the CLI (loaded from a JSON snapshot) and the test suites. Implements
//! both [`IdentityRegistry`] and [`ChatMaterializer`].

use std::{
    collections::{HashMap, HashSet},
    fs,
    path::Path,
    sync::{Mutex, MutexGuard},
};

use serde::Deserialize;

use crate::{
    domain::{
        BotData, ChannelId, ChannelPermissions, Chat, ChatId, DialogId, UserId,
    },
    errors::Error,
    ports::{ChatMaterializer, IdentityRegistry},
    program::ProgramInfo,
    wire::{ChatRecord, InputPeer, InputUser, User},
    Result,
};

/// Remote error messages that mean the caller lost access to a dialog.
const ACCESS_LOST_ERRORS: &[&str] = &["CHANNEL_PRIVATE", "CHANNEL_INVALID", "CHAT_FORBIDDEN"];

/// Title of the caller's own dialog when the snapshot has no record for it.
const SELF_DIALOG_TITLE: &str = "Saved Messages";

#[derive(Clone, Debug, Default, Deserialize)]
pub struct RegistrySnapshot {
    pub my_user_id: i64,
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub chats: Vec<ChatRecord>,
}

#[derive(Clone, Debug)]
struct ChannelEntry {
    access_hash: i64,
    title: String,
    broadcast: bool,
    permissions: ChannelPermissions,
}

#[derive(Debug, Default)]
struct RegistryState {
    users: HashMap<UserId, User>,
    chats: HashMap<ChatId, String>,
    channels: HashMap<ChannelId, ChannelEntry>,
    inaccessible: HashSet<DialogId>,
    programs: HashMap<UserId, ProgramInfo>,
    dialogs: HashSet<DialogId>,
    dialog_errors: Vec<(DialogId, String)>,
}

#[derive(Debug)]
pub struct InMemoryRegistry {
    my_user_id: UserId,
    state: Mutex<RegistryState>,
}

impl InMemoryRegistry {
    pub fn new(my_user_id: UserId) -> Self {
        Self {
            my_user_id,
            state: Mutex::new(RegistryState::default()),
        }
    }

    pub fn from_snapshot(snapshot: RegistrySnapshot) -> Self {
        let registry = Self::new(UserId(snapshot.my_user_id));
        registry.on_get_users(snapshot.users, "snapshot");
        registry.on_get_chats(snapshot.chats, "snapshot");
        registry
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        let snapshot: RegistrySnapshot = serde_json::from_str(&raw)?;
        Ok(Self::from_snapshot(snapshot))
    }

    pub fn add_user(&self, user: User) {
        self.on_get_users(vec![user], "add_user");
    }

    pub fn add_chat(&self, chat: ChatRecord) {
        self.on_get_chats(vec![chat], "add_chat");
    }

    /// Last program info received for a bot.
    pub fn program_info(&self, bot_id: UserId) -> Option<ProgramInfo> {
        self.state().programs.get(&bot_id).cloned()
    }

    /// Dialog errors reported so far, with the source that reported them.
    pub fn dialog_errors(&self) -> Vec<(DialogId, String)> {
        self.state().dialog_errors.clone()
    }

    pub fn is_materialized(&self, dialog_id: DialogId) -> bool {
        self.state().dialogs.contains(&dialog_id)
    }

    fn state(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl IdentityRegistry for InMemoryRegistry {
    fn my_user_id(&self) -> UserId {
        self.my_user_id
    }

    fn check_dialog_access(&self, dialog_id: DialogId, allow_secret_chats: bool) -> Result<()> {
        let st = self.state();
        let known = match dialog_id {
            DialogId::User(id) => id == self.my_user_id || st.users.contains_key(&id),
            DialogId::Chat(id) => st.chats.contains_key(&id),
            DialogId::Channel(id) => st.channels.contains_key(&id),
            DialogId::SecretChat(_) => {
                if !allow_secret_chats {
                    return Err(Error::Access("Not supported in secret chats".to_string()));
                }
                false
            }
            DialogId::None => {
                return Err(Error::Access("Invalid chat identifier specified".to_string()))
            }
        };
        if !known {
            return Err(Error::Access("Chat not found".to_string()));
        }
        if st.inaccessible.contains(&dialog_id) {
            return Err(Error::Access("Can't access the chat".to_string()));
        }
        Ok(())
    }

    fn bot_data(&self, user_id: UserId) -> Result<BotData> {
        let st = self.state();
        let Some(user) = st.users.get(&user_id) else {
            return Err(Error::NotFound("Bot not found".to_string()));
        };
        if !user.bot {
            return Err(Error::Eligibility("User is not a bot".to_string()));
        }
        Ok(BotData {
            can_be_edited: user.bot_can_edit,
        })
    }

    fn is_broadcast_channel(&self, channel_id: ChannelId) -> bool {
        self.state()
            .channels
            .get(&channel_id)
            .map(|c| c.broadcast)
            .unwrap_or(false)
    }

    fn channel_permissions(&self, channel_id: ChannelId) -> ChannelPermissions {
        self.state()
            .channels
            .get(&channel_id)
            .map(|c| c.permissions)
            .unwrap_or_default()
    }

    fn have_user(&self, user_id: UserId) -> bool {
        user_id == self.my_user_id || self.state().users.contains_key(&user_id)
    }

    fn input_user(&self, user_id: UserId) -> Result<InputUser> {
        if user_id == self.my_user_id {
            return Ok(InputUser {
                user_id: user_id.0,
                access_hash: 0,
            });
        }
        self.state()
            .users
            .get(&user_id)
            .map(|u| InputUser {
                user_id: u.id,
                access_hash: u.access_hash,
            })
            .ok_or_else(|| Error::Access("Have no access to the user".to_string()))
    }

    fn input_peer(&self, dialog_id: DialogId) -> Result<InputPeer> {
        let st = self.state();
        if st.inaccessible.contains(&dialog_id) {
            return Err(Error::Access("Have no access to the chat".to_string()));
        }
        let peer = match dialog_id {
            DialogId::User(id) if id == self.my_user_id => Some(InputPeer::SelfPeer),
            DialogId::User(id) => st.users.get(&id).map(|u| InputPeer::User {
                user_id: u.id,
                access_hash: u.access_hash,
            }),
            DialogId::Chat(id) => st
                .chats
                .contains_key(&id)
                .then_some(InputPeer::Chat { chat_id: id.0 }),
            DialogId::Channel(id) => st.channels.get(&id).map(|c| InputPeer::Channel {
                channel_id: id.0,
                access_hash: c.access_hash,
            }),
            DialogId::SecretChat(_) | DialogId::None => None,
        };
        peer.ok_or_else(|| Error::Access("Have no access to the chat".to_string()))
    }

    fn on_get_users(&self, users: Vec<User>, source: &str) {
        let mut st = self.state();
        for user in users {
            let id = UserId(user.id);
            if !id.is_valid() {
                tracing::error!(user_id = user.id, source, "receive invalid user");
                continue;
            }
            st.users.insert(id, user);
        }
    }

    fn on_get_chats(&self, chats: Vec<ChatRecord>, source: &str) {
        let mut st = self.state();
        for chat in chats {
            match chat {
                ChatRecord::Chat { id, title } => {
                    st.chats.insert(ChatId(id), title);
                }
                ChatRecord::Channel {
                    id,
                    access_hash,
                    title,
                    broadcast,
                    creator,
                    can_post_messages,
                } => {
                    st.channels.insert(
                        ChannelId(id),
                        ChannelEntry {
                            access_hash,
                            title,
                            broadcast,
                            permissions: ChannelPermissions {
                                is_creator: creator,
                                can_post_messages,
                            },
                        },
                    );
                }
            }
        }
        tracing::trace!(source, "chats ingested");
    }

    fn on_update_bot_program(&self, bot_id: UserId, info: ProgramInfo) {
        self.state().programs.insert(bot_id, info);
    }

    fn on_dialog_error(&self, dialog_id: DialogId, error: &Error, source: &str) {
        let mut st = self.state();
        if let Error::Remote(remote) = error {
            if ACCESS_LOST_ERRORS.contains(&remote.message.as_str()) {
                tracing::info!(%dialog_id, source, error = %remote, "lost access to dialog");
                st.inaccessible.insert(dialog_id);
            }
        }
        st.dialog_errors.push((dialog_id, source.to_string()));
    }
}

impl ChatMaterializer for InMemoryRegistry {
    fn materialize(&self, dialog_id: DialogId, source: &str) -> Result<Chat> {
        let mut st = self.state();
        let title = match dialog_id {
            DialogId::User(id) => match st.users.get(&id) {
                Some(user) => Some(user.first_name.clone()),
                None if id == self.my_user_id => Some(SELF_DIALOG_TITLE.to_string()),
                None => None,
            },
            DialogId::Chat(id) => st.chats.get(&id).cloned(),
            DialogId::Channel(id) => st.channels.get(&id).map(|c| c.title.clone()),
            DialogId::SecretChat(_) | DialogId::None => None,
        };
        let Some(title) = title else {
            tracing::error!(%dialog_id, source, "can't materialize unknown dialog");
            return Err(Error::NotFound("Chat not found".to_string()));
        };
        st.dialogs.insert(dialog_id);
        Ok(Chat {
            id: dialog_id,
            title,
        })
    }
}
