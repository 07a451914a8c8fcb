//! One-shot query adapters for the affiliate program API.
//!
//! Each adapter is built with everything it needs, dispatched once through
//! [`run`], and then consumed by exactly one of `on_result` / `on_error`.
//! Both take `self` by value, so an adapter cannot settle twice.

use serde::de::DeserializeOwned;

use crate::{
    cursor::{self, PaginationCursor},
    domain::{Chat, DialogId, DialogKind, UserId},
    errors::Error,
    ports::{ChatMaterializer, Dispatcher, IdentityRegistry},
    program::{
        ChatAffiliateProgram, ChatAffiliatePrograms, ConnectedProgramRef, FoundAffiliatePrograms,
        ProgramInfo, ProgramParameters, ProgramSortOrder, SuggestedProgramRef,
    },
    wire::{
        ConnectedStarRefBots, InputPeer, InputUser, Request, ResolvedPeer, StarRefProgram,
        SuggestedStarRefBots,
    },
    Result,
};

pub(crate) trait Query: Sized + Send {
    const NAME: &'static str;

    type Response: DeserializeOwned + std::fmt::Debug;
    type Output;

    fn request(&self) -> Request;
    fn on_result(self, response: Self::Response) -> Result<Self::Output>;
    fn on_error(self, error: Error) -> Error;
}

/// Dispatch `query` and settle it with the single outcome.
pub(crate) async fn run<Q: Query>(dispatcher: &dyn Dispatcher, query: Q) -> Result<Q::Output> {
    let request = query.request();
    tracing::debug!(query = Q::NAME, method = request.method(), "send query");

    let packet = match dispatcher.send(request).await {
        Ok(packet) => packet,
        Err(e) => return Err(query.on_error(e)),
    };
    match serde_json::from_slice::<Q::Response>(&packet) {
        Ok(response) => {
            tracing::debug!(query = Q::NAME, ?response, "receive result");
            query.on_result(response)
        }
        Err(e) => Err(query.on_error(Error::from(e))),
    }
}

/// Report a dialog-scoped failure to the registry, then hand it back.
fn dialog_error(
    registry: &dyn IdentityRegistry,
    dialog_id: DialogId,
    error: Error,
    source: &str,
) -> Error {
    registry.on_dialog_error(dialog_id, &error, source);
    error
}

/// Never report fewer items than were returned.
fn reconcile_total_count(reported: i32, kept: usize) -> i32 {
    let kept = i32::try_from(kept).unwrap_or(i32::MAX);
    if reported < kept {
        tracing::error!(
            total_count = reported,
            kept,
            "receive total count smaller than number of affiliate programs"
        );
        return kept;
    }
    reported
}

/// Take the one connection a single-record response must carry.
fn single_connection(
    registry: &dyn IdentityRegistry,
    dialog_id: DialogId,
    response: ConnectedStarRefBots,
    source: &str,
) -> Result<ChatAffiliateProgram> {
    let ConnectedStarRefBots {
        connected_bots,
        users,
        ..
    } = response;
    let Ok([record]) = <[_; 1]>::try_from(connected_bots) else {
        tracing::error!(query = source, %dialog_id, "receive wrong number of connected bots");
        return Err(Error::invalid_response());
    };

    registry.on_get_users(users, source);

    let program = ConnectedProgramRef::from(record);
    if !program.is_valid() {
        tracing::error!(query = source, %dialog_id, "receive invalid connected affiliate program");
        return Err(Error::invalid_response());
    }
    Ok(program.into_chat_program())
}

// ============== Set program ==============

pub(crate) struct UpdateProgramQuery<'a> {
    registry: &'a dyn IdentityRegistry,
    bot_id: UserId,
    bot: InputUser,
    parameters: ProgramParameters,
}

impl<'a> UpdateProgramQuery<'a> {
    pub fn new(
        registry: &'a dyn IdentityRegistry,
        bot_id: UserId,
        bot: InputUser,
        parameters: ProgramParameters,
    ) -> Self {
        Self {
            registry,
            bot_id,
            bot,
            parameters,
        }
    }
}

impl Query for UpdateProgramQuery<'_> {
    const NAME: &'static str = "UpdateStarRefProgramQuery";

    type Response = StarRefProgram;
    type Output = ();

    fn request(&self) -> Request {
        let months = self.parameters.duration_months();
        Request::UpdateStarRefProgram {
            bot: self.bot,
            commission_permille: self.parameters.commission_permille(),
            duration_months: (months != 0).then_some(months),
        }
    }

    fn on_result(self, response: StarRefProgram) -> Result<()> {
        self.registry
            .on_update_bot_program(self.bot_id, ProgramInfo::from(&response));
        Ok(())
    }

    fn on_error(self, error: Error) -> Error {
        error
    }
}

// ============== Resolve program ==============

pub(crate) struct ResolveProgramQuery<'a> {
    registry: &'a dyn IdentityRegistry,
    materializer: &'a dyn ChatMaterializer,
    username: String,
    referrer: String,
}

impl<'a> ResolveProgramQuery<'a> {
    pub fn new(
        registry: &'a dyn IdentityRegistry,
        materializer: &'a dyn ChatMaterializer,
        username: impl Into<String>,
        referrer: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            materializer,
            username: username.into(),
            referrer: referrer.into(),
        }
    }
}

impl Query for ResolveProgramQuery<'_> {
    const NAME: &'static str = "ResolveReferralProgramQuery";

    type Response = ResolvedPeer;
    type Output = Chat;

    fn request(&self) -> Request {
        Request::ResolveUsername {
            username: self.username.clone(),
            referer: self.referrer.clone(),
        }
    }

    fn on_result(self, response: ResolvedPeer) -> Result<Chat> {
        self.registry.on_get_users(response.users, Self::NAME);
        self.registry.on_get_chats(response.chats, Self::NAME);

        let dialog_id = DialogId::from(response.peer);
        let known_user = dialog_id.kind() == DialogKind::User
            && dialog_id
                .user_id()
                .is_some_and(|user_id| self.registry.have_user(user_id));
        if !known_user {
            return Err(self.on_error(Error::NotFound("Chat not found".to_string())));
        }

        self.materializer.materialize(dialog_id, Self::NAME)
    }

    fn on_error(self, error: Error) -> Error {
        error
    }
}

// ============== Search suggested programs ==============

pub(crate) struct SearchProgramsQuery<'a> {
    registry: &'a dyn IdentityRegistry,
    dialog_id: DialogId,
    peer: InputPeer,
    sort_order: ProgramSortOrder,
    offset: String,
    limit: i32,
}

impl<'a> SearchProgramsQuery<'a> {
    pub fn new(
        registry: &'a dyn IdentityRegistry,
        dialog_id: DialogId,
        peer: InputPeer,
        sort_order: ProgramSortOrder,
        offset: impl Into<String>,
        limit: i32,
    ) -> Self {
        Self {
            registry,
            dialog_id,
            peer,
            sort_order,
            offset: offset.into(),
            limit,
        }
    }
}

impl Query for SearchProgramsQuery<'_> {
    const NAME: &'static str = "GetSuggestedStarRefBotsQuery";

    type Response = SuggestedStarRefBots;
    type Output = FoundAffiliatePrograms;

    fn request(&self) -> Request {
        Request::GetSuggestedStarRefBots {
            order_by_revenue: self.sort_order == ProgramSortOrder::Revenue,
            order_by_date: self.sort_order == ProgramSortOrder::Date,
            peer: self.peer,
            offset: self.offset.clone(),
            limit: self.limit,
        }
    }

    fn on_result(self, response: SuggestedStarRefBots) -> Result<FoundAffiliatePrograms> {
        self.registry.on_get_users(response.users, Self::NAME);

        let mut programs = Vec::with_capacity(response.suggested_bots.len());
        for raw in response.suggested_bots {
            let program = SuggestedProgramRef::from(raw);
            if !program.is_valid() {
                tracing::error!(dialog_id = %self.dialog_id, "receive invalid affiliate program");
                continue;
            }
            programs.push(program.into_found_program());
        }

        Ok(FoundAffiliatePrograms {
            total_count: reconcile_total_count(response.count, programs.len()),
            programs,
            next_offset: response.next_offset,
        })
    }

    fn on_error(self, error: Error) -> Error {
        dialog_error(self.registry, self.dialog_id, error, Self::NAME)
    }
}

// ============== Connect program ==============

pub(crate) struct ConnectProgramQuery<'a> {
    registry: &'a dyn IdentityRegistry,
    dialog_id: DialogId,
    peer: InputPeer,
    bot: InputUser,
}

impl<'a> ConnectProgramQuery<'a> {
    pub fn new(
        registry: &'a dyn IdentityRegistry,
        dialog_id: DialogId,
        peer: InputPeer,
        bot: InputUser,
    ) -> Self {
        Self {
            registry,
            dialog_id,
            peer,
            bot,
        }
    }
}

impl Query for ConnectProgramQuery<'_> {
    const NAME: &'static str = "ConnectStarRefBotQuery";

    type Response = ConnectedStarRefBots;
    type Output = ChatAffiliateProgram;

    fn request(&self) -> Request {
        Request::ConnectStarRefBot {
            peer: self.peer,
            bot: self.bot,
        }
    }

    fn on_result(self, response: ConnectedStarRefBots) -> Result<ChatAffiliateProgram> {
        single_connection(self.registry, self.dialog_id, response, Self::NAME)
            .map_err(|e| self.on_error(e))
    }

    fn on_error(self, error: Error) -> Error {
        dialog_error(self.registry, self.dialog_id, error, Self::NAME)
    }
}

// ============== Revoke connection ==============

pub(crate) struct RevokeConnectionQuery<'a> {
    registry: &'a dyn IdentityRegistry,
    dialog_id: DialogId,
    peer: InputPeer,
    url: String,
}

impl<'a> RevokeConnectionQuery<'a> {
    pub fn new(
        registry: &'a dyn IdentityRegistry,
        dialog_id: DialogId,
        peer: InputPeer,
        url: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            dialog_id,
            peer,
            url: url.into(),
        }
    }
}

impl Query for RevokeConnectionQuery<'_> {
    const NAME: &'static str = "EditConnectedStarRefBotQuery";

    type Response = ConnectedStarRefBots;
    type Output = ChatAffiliateProgram;

    fn request(&self) -> Request {
        Request::EditConnectedStarRefBot {
            revoked: true,
            peer: self.peer,
            link: self.url.clone(),
        }
    }

    fn on_result(self, response: ConnectedStarRefBots) -> Result<ChatAffiliateProgram> {
        single_connection(self.registry, self.dialog_id, response, Self::NAME)
            .map_err(|e| self.on_error(e))
    }

    fn on_error(self, error: Error) -> Error {
        dialog_error(self.registry, self.dialog_id, error, Self::NAME)
    }
}

// ============== Get single connection ==============

pub(crate) struct GetConnectionQuery<'a> {
    registry: &'a dyn IdentityRegistry,
    dialog_id: DialogId,
    peer: InputPeer,
    bot: InputUser,
}

impl<'a> GetConnectionQuery<'a> {
    pub fn new(
        registry: &'a dyn IdentityRegistry,
        dialog_id: DialogId,
        peer: InputPeer,
        bot: InputUser,
    ) -> Self {
        Self {
            registry,
            dialog_id,
            peer,
            bot,
        }
    }
}

impl Query for GetConnectionQuery<'_> {
    const NAME: &'static str = "GetConnectedStarRefBotQuery";

    type Response = ConnectedStarRefBots;
    type Output = Option<ChatAffiliateProgram>;

    fn request(&self) -> Request {
        Request::GetConnectedStarRefBot {
            peer: self.peer,
            bot: self.bot,
        }
    }

    fn on_result(self, response: ConnectedStarRefBots) -> Result<Option<ChatAffiliateProgram>> {
        if response.connected_bots.is_empty() {
            return Ok(None);
        }
        single_connection(self.registry, self.dialog_id, response, Self::NAME)
            .map(Some)
            .map_err(|e| self.on_error(e))
    }

    fn on_error(self, error: Error) -> Error {
        dialog_error(self.registry, self.dialog_id, error, Self::NAME)
    }
}

// ============== List connections ==============

pub(crate) struct ListConnectionsQuery<'a> {
    registry: &'a dyn IdentityRegistry,
    dialog_id: DialogId,
    peer: InputPeer,
    /// `None` starts from the top of the list.
    offset: Option<PaginationCursor>,
    limit: i32,
}

impl<'a> ListConnectionsQuery<'a> {
    pub fn new(
        registry: &'a dyn IdentityRegistry,
        dialog_id: DialogId,
        peer: InputPeer,
        offset: Option<PaginationCursor>,
        limit: i32,
    ) -> Self {
        Self {
            registry,
            dialog_id,
            peer,
            offset,
            limit,
        }
    }
}

impl Query for ListConnectionsQuery<'_> {
    const NAME: &'static str = "GetConnectedStarRefBotsQuery";

    type Response = ConnectedStarRefBots;
    type Output = ChatAffiliatePrograms;

    fn request(&self) -> Request {
        let (offset_date, offset_link) = match &self.offset {
            Some(cursor) => (Some(cursor.date), Some(cursor.url.clone())),
            None => (None, None),
        };
        Request::GetConnectedStarRefBots {
            peer: self.peer,
            offset_date,
            offset_link,
            limit: self.limit,
        }
    }

    fn on_result(self, response: ConnectedStarRefBots) -> Result<ChatAffiliatePrograms> {
        self.registry.on_get_users(response.users, Self::NAME);

        let mut programs = Vec::with_capacity(response.connected_bots.len());
        let mut next_offset = String::new();
        for raw in response.connected_bots {
            // The cursor follows the raw list, including records dropped below.
            next_offset = cursor::encode(raw.date, &raw.url);
            let program = ConnectedProgramRef::from(raw);
            if !program.is_valid() {
                tracing::error!(
                    dialog_id = %self.dialog_id,
                    "receive invalid connected affiliate program"
                );
                continue;
            }
            programs.push(program.into_chat_program());
        }

        Ok(ChatAffiliatePrograms {
            total_count: reconcile_total_count(response.count, programs.len()),
            programs,
            next_offset,
        })
    }

    fn on_error(self, error: Error) -> Error {
        dialog_error(self.registry, self.dialog_id, error, Self::NAME)
    }
}
