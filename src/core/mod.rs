//! Core business logic.
//!
//! Nothing in here talks to Discord directly. Functions take plain snowflake values (`u64`)
//! and a `SeaORM` connection, so the bot layer is the only place that knows about serenity types.

use crate::errors::{Error, Result};

/// Moderator attribution from the audit trail
pub mod audit;
/// Guild-scoped command aliases
pub mod aliases;
/// Link filter for auto-moderation
pub mod automod;
/// Duplicate-event suppression and the recent-message cache
pub mod dedup;
/// Credit ledger
pub mod economy;
/// Game state machines
pub mod games;
/// Log channel map and by-name fallback
pub mod log_channels;
/// Ticket configuration, counter, state machine and transcripts
pub mod tickets;
/// Moderation warnings
pub mod warnings;

/// Converts a Discord snowflake into the signed column type used by the store.
pub fn db_id(id: u64) -> Result<i64> {
    i64::try_from(id).map_err(|_| Error::IdOutOfRange { id })
}

/// Converts a stored id back into a snowflake.
#[must_use]
#[allow(clippy::cast_sign_loss)]
pub const fn snowflake(id: i64) -> u64 {
    // Stored ids only ever come from `db_id`, so they are never negative
    id as u64
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_db_id_round_trip() {
        let id = 1_234_567_890_123_456_789_u64;
        assert_eq!(snowflake(db_id(id).unwrap()), id);
    }

    #[test]
    fn test_db_id_rejects_overflow() {
        assert!(matches!(db_id(u64::MAX), Err(Error::IdOutOfRange { .. })));
    }
}
