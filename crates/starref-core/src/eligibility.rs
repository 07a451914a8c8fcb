//! Who may host an affiliate program or be referred by one.
//!
//! Both checks are synchronous and run before anything is dispatched.

use crate::{
    domain::DialogId,
    errors::Error,
    ports::IdentityRegistry,
    program::ProgramParameters,
    Result,
};

/// Check that `dialog_id` may connect to affiliate programs: the caller itself,
/// a bot the caller can edit, or a broadcast channel the caller can post to.
///
/// Panics on secret chats and invalid dialogs: the access check rejects both,
/// so reaching the match with them is a registry bug.
pub fn check_referable_dialog(registry: &dyn IdentityRegistry, dialog_id: DialogId) -> Result<()> {
    registry.check_dialog_access(dialog_id, false)?;
    match dialog_id {
        DialogId::User(user_id) => {
            if user_id == registry.my_user_id() {
                return Ok(());
            }
            if registry.bot_data(user_id)?.can_be_edited {
                return Ok(());
            }
            Err(Error::Eligibility("The bot isn't owned".to_string()))
        }
        DialogId::Chat(_) => Err(Error::Eligibility(
            "The chat must be a channel chat".to_string(),
        )),
        DialogId::Channel(channel_id) => {
            if !registry.is_broadcast_channel(channel_id) {
                return Err(Error::Eligibility(
                    "The chat must be a channel chat".to_string(),
                ));
            }
            if !registry.channel_permissions(channel_id).can_post_messages() {
                return Err(Error::Eligibility(
                    "Not enough rights in the chat".to_string(),
                ));
            }
            Ok(())
        }
        DialogId::SecretChat(_) | DialogId::None => {
            unreachable!("{dialog_id} passed the access check for affiliate programs")
        }
    }
}

/// Check that the caller may set the affiliate program of `dialog_id` to
/// `parameters`. Only editable bots can host programs; the zero sentinel is
/// accepted and ends the program.
pub fn check_program_owner(
    registry: &dyn IdentityRegistry,
    dialog_id: DialogId,
    parameters: &ProgramParameters,
) -> Result<()> {
    if !parameters.is_valid() && !parameters.is_sentinel() {
        return Err(Error::Validation(
            "Invalid affiliate parameters specified".to_string(),
        ));
    }
    match dialog_id {
        DialogId::User(user_id) => {
            if registry.bot_data(user_id)?.can_be_edited {
                return Ok(());
            }
            Err(Error::Eligibility("The bot isn't owned".to_string()))
        }
        DialogId::Chat(_) | DialogId::Channel(_) | DialogId::SecretChat(_) | DialogId::None => Err(
            Error::Eligibility("The chat can't have affiliate program".to_string()),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{ChannelId, ChatId, SecretChatId, UserId},
        registry::InMemoryRegistry,
        wire::{ChatRecord, User},
    };

    const ME: i64 = 1;

    fn registry() -> InMemoryRegistry {
        let r = InMemoryRegistry::new(UserId(ME));
        r.add_user(User {
            id: 10,
            access_hash: 100,
            first_name: "Owned".into(),
            bot: true,
            bot_can_edit: true,
            ..Default::default()
        });
        r.add_user(User {
            id: 11,
            access_hash: 110,
            first_name: "Foreign".into(),
            bot: true,
            ..Default::default()
        });
        r.add_user(User {
            id: 12,
            first_name: "Alice".into(),
            ..Default::default()
        });
        r.add_chat(ChatRecord::Chat {
            id: 20,
            title: "Group".into(),
        });
        for (id, broadcast, creator, can_post) in [
            (30, true, false, true),
            (31, true, true, false),
            (32, true, false, false),
            (33, false, true, true),
        ] {
            r.add_chat(ChatRecord::Channel {
                id,
                access_hash: id * 10,
                title: format!("c{id}"),
                broadcast,
                creator,
                can_post_messages: can_post,
            });
        }
        r
    }

    fn eligibility_message(r: &InMemoryRegistry, dialog_id: DialogId) -> Option<String> {
        match check_referable_dialog(r, dialog_id) {
            Ok(()) => None,
            Err(Error::Eligibility(m)) => Some(m),
            Err(other) => panic!("unexpected error kind: {other:?}"),
        }
    }

    #[test]
    fn self_and_owned_bots_are_referable() {
        let r = registry();
        assert!(check_referable_dialog(&r, DialogId::User(UserId(ME))).is_ok());
        assert!(check_referable_dialog(&r, DialogId::User(UserId(10))).is_ok());
        assert_eq!(
            eligibility_message(&r, DialogId::User(UserId(11))).as_deref(),
            Some("The bot isn't owned")
        );
    }

    #[test]
    fn plain_users_fail_through_bot_lookup() {
        let r = registry();
        let err = check_referable_dialog(&r, DialogId::User(UserId(12))).unwrap_err();
        assert_eq!(err.to_string(), "User is not a bot");
    }

    #[test]
    fn basic_groups_are_never_referable() {
        let r = registry();
        assert_eq!(
            eligibility_message(&r, DialogId::Chat(ChatId(20))).as_deref(),
            Some("The chat must be a channel chat")
        );
    }

    #[test]
    fn channels_need_broadcast_and_post_rights() {
        let r = registry();
        assert!(check_referable_dialog(&r, DialogId::Channel(ChannelId(30))).is_ok());
        assert!(check_referable_dialog(&r, DialogId::Channel(ChannelId(31))).is_ok());
        assert_eq!(
            eligibility_message(&r, DialogId::Channel(ChannelId(32))).as_deref(),
            Some("Not enough rights in the chat")
        );
        assert_eq!(
            eligibility_message(&r, DialogId::Channel(ChannelId(33))).as_deref(),
            Some("The chat must be a channel chat")
        );
    }

    #[test]
    fn unknown_dialog_fails_access_check_first() {
        let r = registry();
        let err = check_referable_dialog(&r, DialogId::Channel(ChannelId(99))).unwrap_err();
        assert!(matches!(err, Error::Access(_)));
        let err = check_referable_dialog(&r, DialogId::SecretChat(SecretChatId(1))).unwrap_err();
        assert!(matches!(err, Error::Access(_)));
    }

    struct PermissiveRegistry(InMemoryRegistry);

    impl IdentityRegistry for PermissiveRegistry {
        fn my_user_id(&self) -> UserId {
            self.0.my_user_id()
        }
        fn check_dialog_access(&self, _: DialogId, _: bool) -> Result<()> {
            Ok(())
        }
        fn bot_data(&self, user_id: UserId) -> Result<crate::domain::BotData> {
            self.0.bot_data(user_id)
        }
        fn is_broadcast_channel(&self, channel_id: ChannelId) -> bool {
            self.0.is_broadcast_channel(channel_id)
        }
        fn channel_permissions(&self, channel_id: ChannelId) -> crate::domain::ChannelPermissions {
            self.0.channel_permissions(channel_id)
        }
        fn have_user(&self, user_id: UserId) -> bool {
            self.0.have_user(user_id)
        }
        fn input_user(&self, user_id: UserId) -> Result<crate::wire::InputUser> {
            self.0.input_user(user_id)
        }
        fn input_peer(&self, d: DialogId) -> Result<crate::wire::InputPeer> {
            self.0.input_peer(d)
        }
        fn on_get_users(&self, users: Vec<User>, source: &str) {
            self.0.on_get_users(users, source)
        }
        fn on_get_chats(&self, chats: Vec<ChatRecord>, source: &str) {
            self.0.on_get_chats(chats, source)
        }
        fn on_update_bot_program(&self, bot_id: UserId, info: crate::program::ProgramInfo) {
            self.0.on_update_bot_program(bot_id, info)
        }
        fn on_dialog_error(&self, d: DialogId, e: &Error, source: &str) {
            self.0.on_dialog_error(d, e, source)
        }
    }

    #[test]
    #[should_panic(expected = "passed the access check")]
    fn secret_chat_past_access_check_is_fatal() {
        let r = PermissiveRegistry(registry());
        let _ = check_referable_dialog(&r, DialogId::SecretChat(SecretChatId(1)));
    }

    #[test]
    fn program_owner_accepts_sentinel_and_valid_parameters() {
        let r = registry();
        let bot = DialogId::User(UserId(10));
        assert!(check_program_owner(&r, bot, &ProgramParameters::default()).is_ok());
        assert!(check_program_owner(&r, bot, &ProgramParameters::new(100, 12)).is_ok());
    }

    #[test]
    fn program_owner_rejects_invalid_parameters_before_ownership() {
        let r = registry();
        let err = check_program_owner(
            &r,
            DialogId::Chat(ChatId(20)),
            &ProgramParameters::new(0, 5),
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "Invalid affiliate parameters specified");
    }

    #[test]
    fn sentinel_is_rejected_only_by_ownership() {
        let r = registry();
        let sentinel = ProgramParameters::default();
        let err = check_program_owner(&r, DialogId::User(UserId(11)), &sentinel).unwrap_err();
        assert_eq!(err.to_string(), "The bot isn't owned");
        let err = check_program_owner(&r, DialogId::Channel(ChannelId(30)), &sentinel).unwrap_err();
        assert_eq!(err.to_string(), "The chat can't have affiliate program");
    }

    #[test]
    fn program_owner_must_be_a_known_bot() {
        let r = registry();
        let err = check_program_owner(
            &r,
            DialogId::User(UserId(ME)),
            &ProgramParameters::new(100, 0),
        )
        .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }
}
