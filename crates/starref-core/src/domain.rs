use serde::{Deserialize, Serialize};

/// Telegram user id (numeric). Bots are users too.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl UserId {
    pub const MAX: i64 = (1 << 40) - 1;

    pub fn is_valid(self) -> bool {
        0 < self.0 && self.0 <= Self::MAX
    }
}

/// Basic group id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(pub i64);

/// Channel or supergroup id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(pub i64);

/// Secret chat id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecretChatId(pub i32);

/// Conversation target, tagged by kind.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum DialogId {
    User(UserId),
    Chat(ChatId),
    Channel(ChannelId),
    SecretChat(SecretChatId),
    #[default]
    None,
}

impl DialogId {
    pub fn kind(&self) -> DialogKind {
        match self {
            DialogId::User(_) => DialogKind::User,
            DialogId::Chat(_) => DialogKind::Chat,
            DialogId::Channel(_) => DialogKind::Channel,
            DialogId::SecretChat(_) => DialogKind::SecretChat,
            DialogId::None => DialogKind::None,
        }
    }

    pub fn user_id(&self) -> Option<UserId> {
        match self {
            DialogId::User(id) => Some(*id),
            _ => None,
        }
    }

    /// Parse `user:<id>`, `chat:<id>`, `channel:<id>` or `secret:<id>`.
    pub fn parse(s: &str) -> Option<Self> {
        let (kind, id) = s.trim().split_once(':')?;
        let id = id.trim();
        match kind.trim() {
            "user" => id.parse().ok().map(|v| DialogId::User(UserId(v))),
            "chat" => id.parse().ok().map(|v| DialogId::Chat(ChatId(v))),
            "channel" => id.parse().ok().map(|v| DialogId::Channel(ChannelId(v))),
            "secret" => id.parse().ok().map(|v| DialogId::SecretChat(SecretChatId(v))),
            _ => None,
        }
    }
}

impl std::fmt::Display for DialogId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DialogId::User(id) => write!(f, "user {}", id.0),
            DialogId::Chat(id) => write!(f, "chat {}", id.0),
            DialogId::Channel(id) => write!(f, "channel {}", id.0),
            DialogId::SecretChat(id) => write!(f, "secret chat {}", id.0),
            DialogId::None => write!(f, "invalid dialog"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DialogKind {
    User,
    Chat,
    Channel,
    SecretChat,
    None,
}

/// Bot data the registry holds for a bot user.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BotData {
    pub can_be_edited: bool,
}

/// Administrator rights the caller holds in a channel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ChannelPermissions {
    pub is_creator: bool,
    pub can_post_messages: bool,
}

impl ChannelPermissions {
    pub fn can_post_messages(&self) -> bool {
        self.is_creator || self.can_post_messages
    }
}

/// Durable conversation handle handed back to the caller.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Chat {
    pub id: DialogId,
    pub title: String,
}
