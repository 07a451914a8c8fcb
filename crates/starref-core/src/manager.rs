use std::sync::Arc;

use crate::{
    cursor::PaginationCursor,
    domain::{Chat, DialogId, UserId},
    eligibility::{check_program_owner, check_referable_dialog},
    errors::Error,
    ports::{ChatMaterializer, Dispatcher, IdentityRegistry},
    program::{
        ChatAffiliateProgram, ChatAffiliatePrograms, FoundAffiliatePrograms, ProgramParameters,
        ProgramSortOrder,
    },
    queries::{
        run, ConnectProgramQuery, GetConnectionQuery, ListConnectionsQuery, ResolveProgramQuery,
        RevokeConnectionQuery, SearchProgramsQuery, UpdateProgramQuery,
    },
    Result,
};

/// Public entry point for affiliate program operations.
///
/// Every operation validates locally first and fails without touching the
/// network when the request can't succeed. Each call dispatches at most one
/// request and resolves exactly once. Dropping the returned future before it
/// resolves abandons the request; nothing is reported to the registry then.
#[derive(Clone)]
pub struct AffiliateProgramManager {
    registry: Arc<dyn IdentityRegistry>,
    materializer: Arc<dyn ChatMaterializer>,
    dispatcher: Arc<dyn Dispatcher>,
}

impl AffiliateProgramManager {
    pub fn new(
        registry: Arc<dyn IdentityRegistry>,
        materializer: Arc<dyn ChatMaterializer>,
        dispatcher: Arc<dyn Dispatcher>,
    ) -> Self {
        Self {
            registry,
            materializer,
            dispatcher,
        }
    }

    /// Create, change or end (with the zero sentinel) the program of an owned bot.
    pub async fn set_program(
        &self,
        dialog_id: DialogId,
        parameters: ProgramParameters,
    ) -> Result<()> {
        check_program_owner(self.registry.as_ref(), dialog_id, &parameters)?;
        let Some(bot_user_id) = dialog_id.user_id() else {
            unreachable!("program owner check accepted {dialog_id}");
        };
        let bot = self.registry.input_user(bot_user_id)?;

        let query = UpdateProgramQuery::new(self.registry.as_ref(), bot_user_id, bot, parameters);
        run(self.dispatcher.as_ref(), query).await
    }

    /// Resolve a bot by username and referral code, opening its chat.
    pub async fn resolve_program(&self, username: &str, referrer: &str) -> Result<Chat> {
        let query = ResolveProgramQuery::new(
            self.registry.as_ref(),
            self.materializer.as_ref(),
            username,
            referrer,
        );
        run(self.dispatcher.as_ref(), query).await
    }

    /// Search programs `dialog_id` could connect to. `offset` is the opaque
    /// `next_offset` of a previous page, or empty.
    pub async fn search_programs(
        &self,
        dialog_id: DialogId,
        sort_order: ProgramSortOrder,
        offset: &str,
        limit: i32,
    ) -> Result<FoundAffiliatePrograms> {
        check_referable_dialog(self.registry.as_ref(), dialog_id)?;
        check_limit(limit)?;
        let peer = self.registry.input_peer(dialog_id)?;

        let query = SearchProgramsQuery::new(
            self.registry.as_ref(),
            dialog_id,
            peer,
            sort_order,
            offset,
            limit,
        );
        run(self.dispatcher.as_ref(), query).await
    }

    pub async fn connect_program(
        &self,
        dialog_id: DialogId,
        bot_user_id: UserId,
    ) -> Result<ChatAffiliateProgram> {
        check_referable_dialog(self.registry.as_ref(), dialog_id)?;
        let bot = self.registry.input_user(bot_user_id)?;
        let peer = self.registry.input_peer(dialog_id)?;

        let query = ConnectProgramQuery::new(self.registry.as_ref(), dialog_id, peer, bot);
        run(self.dispatcher.as_ref(), query).await
    }

    /// Revoke the referral link `url` held by `dialog_id`.
    pub async fn revoke_program(
        &self,
        dialog_id: DialogId,
        url: &str,
    ) -> Result<ChatAffiliateProgram> {
        check_referable_dialog(self.registry.as_ref(), dialog_id)?;
        let peer = self.registry.input_peer(dialog_id)?;

        let query = RevokeConnectionQuery::new(self.registry.as_ref(), dialog_id, peer, url);
        run(self.dispatcher.as_ref(), query).await
    }

    /// The connection of `dialog_id` to one bot's program, if any.
    pub async fn get_connected_program(
        &self,
        dialog_id: DialogId,
        bot_user_id: UserId,
    ) -> Result<Option<ChatAffiliateProgram>> {
        check_referable_dialog(self.registry.as_ref(), dialog_id)?;
        let bot = self.registry.input_user(bot_user_id)?;
        let peer = self.registry.input_peer(dialog_id)?;

        let query = GetConnectionQuery::new(self.registry.as_ref(), dialog_id, peer, bot);
        run(self.dispatcher.as_ref(), query).await
    }

    /// One page of the programs `dialog_id` is connected to.
    pub async fn get_connected_programs(
        &self,
        dialog_id: DialogId,
        offset: &str,
        limit: i32,
    ) -> Result<ChatAffiliatePrograms> {
        check_referable_dialog(self.registry.as_ref(), dialog_id)?;
        check_limit(limit)?;
        let offset = PaginationCursor::decode(offset)?;
        let peer = self.registry.input_peer(dialog_id)?;

        let query =
            ListConnectionsQuery::new(self.registry.as_ref(), dialog_id, peer, offset, limit);
        run(self.dispatcher.as_ref(), query).await
    }
}

fn check_limit(limit: i32) -> Result<()> {
    if limit <= 0 {
        return Err(Error::Validation("Limit must be positive".to_string()));
    }
    Ok(())
}
