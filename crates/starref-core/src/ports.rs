use async_trait::async_trait;

use crate::{
    domain::{BotData, ChannelId, ChannelPermissions, Chat, DialogId, UserId},
    program::ProgramInfo,
    wire::{ChatRecord, InputPeer, InputUser, Request, User},
    Error, Result,
};

/// Hexagonal port for the session's identity registries (users, chats, channels).
///
/// All mutation of identity state goes through this API. Adapters only read
/// from it, feed it records seen in responses, and report dialog errors.
/// Every check and lookup here asks for read access to the dialog.
pub trait IdentityRegistry: Send + Sync {
    /// The caller's own user id.
    fn my_user_id(&self) -> UserId;

    fn check_dialog_access(&self, dialog_id: DialogId, allow_secret_chats: bool) -> Result<()>;

    /// Fails if the user is unknown or is not a bot.
    fn bot_data(&self, user_id: UserId) -> Result<BotData>;

    fn is_broadcast_channel(&self, channel_id: ChannelId) -> bool;
    fn channel_permissions(&self, channel_id: ChannelId) -> ChannelPermissions;

    fn have_user(&self, user_id: UserId) -> bool;

    /// Resolve a wire reference. Never blocks.
    fn input_user(&self, user_id: UserId) -> Result<InputUser>;
    fn input_peer(&self, dialog_id: DialogId) -> Result<InputPeer>;

    fn on_get_users(&self, users: Vec<User>, source: &str);
    fn on_get_chats(&self, chats: Vec<ChatRecord>, source: &str);
    fn on_update_bot_program(&self, bot_id: UserId, info: ProgramInfo);

    /// Called before a dialog-scoped error reaches the caller, so cached access
    /// state for the dialog can be invalidated first.
    fn on_dialog_error(&self, dialog_id: DialogId, error: &Error, source: &str);
}

/// Hexagonal port for the transport.
///
/// One call, one outcome: the raw response packet or the failure status.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    async fn send(&self, request: Request) -> Result<Vec<u8>>;
}

/// Produces durable conversation handles for resolved dialogs.
pub trait ChatMaterializer: Send + Sync {
    /// Create the dialog if it doesn't exist yet and return its handle.
    fn materialize(&self, dialog_id: DialogId, source: &str) -> Result<Chat>;
}
