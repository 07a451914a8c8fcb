//! Wire-level request and response shapes exchanged with the remote service.
//!
//! Requests are tagged by their remote method name; responses are decoded from
//! the JSON packet handed back by the [`crate::ports::Dispatcher`].

use serde::{Deserialize, Serialize};

use crate::domain::{ChannelId, ChatId, DialogId, UserId};

/// Resolved wire reference to a user.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputUser {
    pub user_id: i64,
    pub access_hash: i64,
}

/// Resolved wire reference to a conversation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "@type")]
pub enum InputPeer {
    #[serde(rename = "inputPeerSelf")]
    SelfPeer,
    #[serde(rename = "inputPeerUser")]
    User { user_id: i64, access_hash: i64 },
    #[serde(rename = "inputPeerChat")]
    Chat { chat_id: i64 },
    #[serde(rename = "inputPeerChannel")]
    Channel { channel_id: i64, access_hash: i64 },
}

/// One outbound request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "@type")]
pub enum Request {
    #[serde(rename = "bots.updateStarRefProgram")]
    UpdateStarRefProgram {
        bot: InputUser,
        commission_permille: i32,
        #[serde(skip_serializing_if = "Option::is_none")]
        duration_months: Option<i32>,
    },

    #[serde(rename = "contacts.resolveUsername")]
    ResolveUsername { username: String, referer: String },

    #[serde(rename = "payments.getSuggestedStarRefBots")]
    GetSuggestedStarRefBots {
        order_by_revenue: bool,
        order_by_date: bool,
        peer: InputPeer,
        offset: String,
        limit: i32,
    },

    #[serde(rename = "payments.connectStarRefBot")]
    ConnectStarRefBot { peer: InputPeer, bot: InputUser },

    #[serde(rename = "payments.editConnectedStarRefBot")]
    EditConnectedStarRefBot {
        revoked: bool,
        peer: InputPeer,
        link: String,
    },

    #[serde(rename = "payments.getConnectedStarRefBot")]
    GetConnectedStarRefBot { peer: InputPeer, bot: InputUser },

    #[serde(rename = "payments.getConnectedStarRefBots")]
    GetConnectedStarRefBots {
        peer: InputPeer,
        #[serde(skip_serializing_if = "Option::is_none")]
        offset_date: Option<i32>,
        #[serde(skip_serializing_if = "Option::is_none")]
        offset_link: Option<String>,
        limit: i32,
    },
}

impl Request {
    pub fn method(&self) -> &'static str {
        match self {
            Request::UpdateStarRefProgram { .. } => "bots.updateStarRefProgram",
            Request::ResolveUsername { .. } => "contacts.resolveUsername",
            Request::GetSuggestedStarRefBots { .. } => "payments.getSuggestedStarRefBots",
            Request::ConnectStarRefBot { .. } => "payments.connectStarRefBot",
            Request::EditConnectedStarRefBot { .. } => "payments.editConnectedStarRefBot",
            Request::GetConnectedStarRefBot { .. } => "payments.getConnectedStarRefBot",
            Request::GetConnectedStarRefBots { .. } => "payments.getConnectedStarRefBots",
        }
    }
}

// ============== Responses ==============

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct StarsAmount {
    pub amount: i64,
    #[serde(default)]
    pub nanos: i32,
}

/// `starRefProgram`: a bot's affiliate program as advertised.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct StarRefProgram {
    pub bot_id: i64,
    pub commission_permille: i32,
    #[serde(default)]
    pub duration_months: i32,
    #[serde(default)]
    pub end_date: i32,
    #[serde(default)]
    pub daily_revenue_per_user: Option<StarsAmount>,
}

/// `connectedBotStarRef`: a referral link a dialog holds for a bot.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ConnectedBotStarRef {
    pub url: String,
    pub date: i32,
    pub bot_id: i64,
    pub commission_permille: i32,
    #[serde(default)]
    pub duration_months: i32,
    #[serde(default)]
    pub participants: i64,
    #[serde(default)]
    pub revenue: i64,
    #[serde(default)]
    pub revoked: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub access_hash: i64,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub bot: bool,
    #[serde(default)]
    pub bot_can_edit: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(tag = "@type")]
pub enum ChatRecord {
    #[serde(rename = "chat")]
    Chat {
        id: i64,
        #[serde(default)]
        title: String,
    },
    #[serde(rename = "channel")]
    Channel {
        id: i64,
        #[serde(default)]
        access_hash: i64,
        #[serde(default)]
        title: String,
        #[serde(default)]
        broadcast: bool,
        #[serde(default)]
        creator: bool,
        #[serde(default)]
        can_post_messages: bool,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(tag = "@type")]
pub enum Peer {
    #[serde(rename = "peerUser")]
    User { user_id: i64 },
    #[serde(rename = "peerChat")]
    Chat { chat_id: i64 },
    #[serde(rename = "peerChannel")]
    Channel { channel_id: i64 },
}

impl From<Peer> for DialogId {
    fn from(p: Peer) -> Self {
        match p {
            Peer::User { user_id } => DialogId::User(UserId(user_id)),
            Peer::Chat { chat_id } => DialogId::Chat(ChatId(chat_id)),
            Peer::Channel { channel_id } => DialogId::Channel(ChannelId(channel_id)),
        }
    }
}

/// `contacts.resolvedPeer`
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ResolvedPeer {
    pub peer: Peer,
    #[serde(default)]
    pub chats: Vec<ChatRecord>,
    #[serde(default)]
    pub users: Vec<User>,
}

/// `payments.suggestedStarRefBots`
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct SuggestedStarRefBots {
    pub count: i32,
    #[serde(default)]
    pub suggested_bots: Vec<StarRefProgram>,
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub next_offset: String,
}

/// `payments.connectedStarRefBots`
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ConnectedStarRefBots {
    pub count: i32,
    #[serde(default)]
    pub connected_bots: Vec<ConnectedBotStarRef>,
    #[serde(default)]
    pub users: Vec<User>,
}
