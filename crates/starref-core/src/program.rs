//! Affiliate program value objects.
//!
//! Raw wire records are converted into `*Ref` values first; only refs that pass
//! `is_valid()` are turned into the result objects handed back to callers.

use serde::Serialize;

use crate::{
    domain::UserId,
    wire::{ConnectedBotStarRef, StarRefProgram, StarsAmount},
};

/// Commission rate and duration of an affiliate program.
///
/// `ProgramParameters::default()` is the "no program" sentinel used to end a
/// bot's program.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub struct ProgramParameters {
    commission_permille: i32,
    duration_months: i32,
}

impl ProgramParameters {
    pub const MIN_COMMISSION_PERMILLE: i32 = 1;
    pub const MAX_COMMISSION_PERMILLE: i32 = 999;
    pub const MAX_DURATION_MONTHS: i32 = 36;

    pub fn new(commission_permille: i32, duration_months: i32) -> Self {
        Self {
            commission_permille,
            duration_months,
        }
    }

    pub fn commission_permille(&self) -> i32 {
        self.commission_permille
    }

    /// Zero means the program has no time limit.
    pub fn duration_months(&self) -> i32 {
        self.duration_months
    }

    pub fn is_sentinel(&self) -> bool {
        *self == Self::default()
    }

    pub fn is_valid(&self) -> bool {
        (Self::MIN_COMMISSION_PERMILLE..=Self::MAX_COMMISSION_PERMILLE)
            .contains(&self.commission_permille)
            && (0..=Self::MAX_DURATION_MONTHS).contains(&self.duration_months)
    }
}

/// Star amount with fractional part.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct StarAmount {
    pub star_count: i64,
    pub nanostar_count: i32,
}

impl From<StarsAmount> for StarAmount {
    fn from(a: StarsAmount) -> Self {
        if a.amount < 0 || a.nanos < 0 {
            tracing::error!(amount = a.amount, nanos = a.nanos, "receive negative star amount");
            return Self::default();
        }
        Self {
            star_count: a.amount,
            nanostar_count: a.nanos,
        }
    }
}

/// Non-negative star count from a raw wire value.
pub fn star_count(raw: i64) -> i64 {
    if raw < 0 {
        tracing::error!(raw, "receive negative star count");
        return 0;
    }
    raw
}

/// An affiliate program as advertised by its bot.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ProgramInfo {
    pub parameters: ProgramParameters,
    /// Unix time the program ends; zero if it is active.
    pub end_date: i32,
    pub daily_revenue_per_user: StarAmount,
}

impl ProgramInfo {
    pub fn is_valid(&self) -> bool {
        self.parameters.is_valid()
    }
}

impl From<&StarRefProgram> for ProgramInfo {
    fn from(p: &StarRefProgram) -> Self {
        Self {
            parameters: ProgramParameters::new(p.commission_permille, p.duration_months),
            end_date: p.end_date,
            daily_revenue_per_user: p.daily_revenue_per_user.map(Into::into).unwrap_or_default(),
        }
    }
}

/// A bot offering an affiliate program, from a search result.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SuggestedProgramRef {
    bot_id: UserId,
    info: ProgramInfo,
}

impl SuggestedProgramRef {
    pub fn is_valid(&self) -> bool {
        self.bot_id.is_valid() && self.info.is_valid()
    }

    pub fn into_found_program(self) -> FoundAffiliateProgram {
        debug_assert!(self.is_valid());
        FoundAffiliateProgram {
            bot_user_id: self.bot_id,
            info: self.info,
        }
    }
}

impl From<StarRefProgram> for SuggestedProgramRef {
    fn from(p: StarRefProgram) -> Self {
        Self {
            bot_id: UserId(p.bot_id),
            info: ProgramInfo::from(&p),
        }
    }
}

/// A referral link a dialog holds for some bot's program.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConnectedProgramRef {
    url: String,
    created_at: i32,
    bot_id: UserId,
    parameters: ProgramParameters,
    participant_count: i64,
    revenue_star_count: i64,
    is_revoked: bool,
}

impl ConnectedProgramRef {
    pub fn is_valid(&self) -> bool {
        !self.url.is_empty() && self.bot_id.is_valid()
    }

    pub fn into_chat_program(self) -> ChatAffiliateProgram {
        debug_assert!(self.is_valid());
        ChatAffiliateProgram {
            url: self.url,
            bot_user_id: self.bot_id,
            parameters: self.parameters,
            connection_date: self.created_at,
            is_disconnected: self.is_revoked,
            user_count: self.participant_count,
            revenue_star_count: self.revenue_star_count,
        }
    }
}

impl From<ConnectedBotStarRef> for ConnectedProgramRef {
    fn from(r: ConnectedBotStarRef) -> Self {
        Self {
            url: r.url,
            created_at: r.date,
            bot_id: UserId(r.bot_id),
            parameters: ProgramParameters::new(r.commission_permille, r.duration_months),
            participant_count: r.participants,
            revenue_star_count: star_count(r.revenue),
            is_revoked: r.revoked,
        }
    }
}

// ============== Results ==============

/// Sort order for suggested programs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ProgramSortOrder {
    #[default]
    Profitability,
    Date,
    Revenue,
}

impl std::str::FromStr for ProgramSortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "profitability" => Ok(Self::Profitability),
            "date" => Ok(Self::Date),
            "revenue" => Ok(Self::Revenue),
            other => Err(format!("unknown sort order: {other}")),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FoundAffiliateProgram {
    pub bot_user_id: UserId,
    pub info: ProgramInfo,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct FoundAffiliatePrograms {
    pub total_count: i32,
    pub programs: Vec<FoundAffiliateProgram>,
    pub next_offset: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ChatAffiliateProgram {
    pub url: String,
    pub bot_user_id: UserId,
    pub parameters: ProgramParameters,
    pub connection_date: i32,
    pub is_disconnected: bool,
    pub user_count: i64,
    pub revenue_star_count: i64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ChatAffiliatePrograms {
    pub total_count: i32,
    pub programs: Vec<ChatAffiliateProgram>,
    pub next_offset: String,
}
