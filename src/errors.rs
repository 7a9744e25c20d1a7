//! Unified error type for the bot.
//!
//! Domain validation failures (bad amounts, self transfers, illegal ticket transitions) carry
//! enough context for the dispatch boundary to render a user-facing message; infrastructure
//! failures wrap the underlying library error.

use crate::core::tickets::TicketState;
use thiserror::Error;

/// Every failure the bot can surface from core logic or the Discord layer.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid or missing configuration value
    #[error("Configuration error: {message}")]
    Config {
        /// What was wrong
        message: String,
    },

    /// `DISCORD_TOKEN` was not present in the environment
    #[error("DISCORD_TOKEN is not set")]
    MissingToken,

    /// Amount was zero or negative where a positive amount is required
    #[error("Invalid amount: {amount}")]
    InvalidAmount {
        /// The rejected amount
        amount: i64,
    },

    /// Sender balance is lower than the requested transfer
    #[error("Insufficient funds: balance is {current}, needed {required}")]
    InsufficientFunds {
        /// Balance at the time of the attempt
        current: i64,
        /// Amount requested
        required: i64,
    },

    /// Sender and receiver are the same account
    #[error("You cannot transfer credits to yourself")]
    SelfTransfer,

    /// A bot account took part in an economy operation
    #[error("Bot accounts cannot hold credits")]
    BotAccount,

    /// The guild has not run ticket setup
    #[error("Ticket system is not configured for guild {guild_id}")]
    TicketsNotConfigured {
        /// Guild that was looked up
        guild_id: u64,
    },

    /// Claim attempted on a ticket that already has a claimant
    #[error("Ticket is already claimed by <@{claimant}>")]
    AlreadyClaimed {
        /// The existing claimant
        claimant: u64,
    },

    /// A ticket action that is not valid in the ticket's current state
    #[error("Cannot {action} a ticket that is {from}")]
    InvalidTransition {
        /// State the ticket was in
        from: TicketState,
        /// Attempted action
        action: &'static str,
    },

    /// Alias text that cannot be matched as a single command word
    #[error("Alias `{alias}` must be a single word")]
    InvalidAlias {
        /// The rejected alias text
        alias: String,
    },

    /// Discord snowflake that does not fit the signed column type
    #[error("ID {id} is out of range for storage")]
    IdOutOfRange {
        /// The offending id
        id: u64,
    },

    /// Database error from `SeaORM`
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Formatting into a `String` failed
    #[error("Formatting error: {0}")]
    Fmt(#[from] std::fmt::Error),

    /// Config file could not be parsed
    #[error("Config file error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Serenity/Poise error
    #[error("Discord error: {0}")]
    #[allow(clippy::enum_variant_names)]
    FrameworkError(Box<poise::serenity_prelude::Error>),
}

impl From<poise::serenity_prelude::Error> for Error {
    fn from(value: poise::serenity_prelude::Error) -> Self {
        Self::FrameworkError(Box::new(value))
    }
}

impl Error {
    /// Whether this error is a user-facing rejection rather than a failure.
    ///
    /// Rejections are shown to the invoking user verbatim; everything else is logged and
    /// replaced with a generic notice.
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::InvalidAmount { .. }
                | Self::InsufficientFunds { .. }
                | Self::SelfTransfer
                | Self::BotAccount
                | Self::TicketsNotConfigured { .. }
                | Self::AlreadyClaimed { .. }
                | Self::InvalidTransition { .. }
                | Self::InvalidAlias { .. }
        )
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
