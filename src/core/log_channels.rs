//! Per-guild log channel map.
//!
//! Six categories can each point at their own channel. A category without a stored channel
//! falls back to the first channel whose name is one of [`FALLBACK_NAMES`].

use crate::{
    core::{db_id, snowflake},
    entities::{LoggingSettings, logging_settings},
    errors::Result,
};
use sea_orm::{Set, Value, prelude::*};
use std::fmt;

/// Channel names used when a category has no configured channel, in order of preference
pub const FALLBACK_NAMES: [&str; 3] = ["logs", "log", "بصمة"];

/// Kinds of activity that can be routed to separate channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogCategory {
    /// Message deletes and edits
    Message,
    /// Member role changes
    Role,
    /// Server-level changes
    Server,
    /// Channel changes
    Room,
    /// Voice activity
    Voice,
    /// Moderator actions
    Moderation,
}

impl LogCategory {
    /// All categories
    pub const ALL: [Self; 6] = [
        Self::Message,
        Self::Role,
        Self::Server,
        Self::Room,
        Self::Voice,
        Self::Moderation,
    ];

    const fn column(self) -> logging_settings::Column {
        match self {
            Self::Message => logging_settings::Column::MsgLogId,
            Self::Role => logging_settings::Column::RoleLogId,
            Self::Server => logging_settings::Column::ServerLogId,
            Self::Room => logging_settings::Column::RoomLogId,
            Self::Voice => logging_settings::Column::VoiceLogId,
            Self::Moderation => logging_settings::Column::ModLogId,
        }
    }

    /// Stored channel for this category in `settings`
    #[must_use]
    pub const fn stored(self, settings: &logging_settings::Model) -> Option<u64> {
        let id = match self {
            Self::Message => settings.msg_log_id,
            Self::Role => settings.role_log_id,
            Self::Server => settings.server_log_id,
            Self::Room => settings.room_log_id,
            Self::Voice => settings.voice_log_id,
            Self::Moderation => settings.mod_log_id,
        };
        match id {
            Some(id) => Some(snowflake(id)),
            None => None,
        }
    }
}

impl fmt::Display for LogCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Message => "messages",
            Self::Role => "roles",
            Self::Server => "server",
            Self::Room => "rooms",
            Self::Voice => "voice",
            Self::Moderation => "moderation",
        };
        f.write_str(name)
    }
}

/// Stores `channel_id` as the log channel for `category`, keeping the other categories.
pub async fn set_log_channel(
    db: &DatabaseConnection,
    guild_id: u64,
    category: LogCategory,
    channel_id: u64,
) -> Result<logging_settings::Model> {
    let id = db_id(guild_id)?;
    let channel: Value = Some(db_id(channel_id)?).into();

    let existing = LoggingSettings::find_by_id(id).one(db).await?;
    let mut active: logging_settings::ActiveModel = match existing {
        Some(settings) => settings.into(),
        None => logging_settings::ActiveModel {
            guild_id: Set(id),
            ..Default::default()
        }
        .insert(db)
        .await?
        .into(),
    };

    active.set(category.column(), channel);
    active.update(db).await.map_err(Into::into)
}

/// All stored log channels for a guild (all empty if never configured).
pub async fn get_settings(db: &DatabaseConnection, guild_id: u64) -> Result<logging_settings::Model> {
    let id = db_id(guild_id)?;
    Ok(LoggingSettings::find_by_id(id)
        .one(db)
        .await?
        .unwrap_or(logging_settings::Model {
            guild_id: id,
            ..Default::default()
        }))
}

/// Picks the fallback channel from `(id, name)` pairs.
#[must_use]
pub fn fallback_channel<'a, I>(channels: I) -> Option<u64>
where
    I: IntoIterator<Item = (u64, &'a str)>,
{
    let channels: Vec<(u64, &str)> = channels.into_iter().collect();
    FALLBACK_NAMES.iter().find_map(|wanted| {
        channels
            .iter()
            .find(|(_, name)| name == wanted)
            .map(|(id, _)| *id)
    })
}

/// Resolves the channel for `category`: stored value first, then the by-name fallback.
pub async fn resolve<'a, I>(
    db: &DatabaseConnection,
    guild_id: u64,
    category: LogCategory,
    channels: I,
) -> Result<Option<u64>>
where
    I: IntoIterator<Item = (u64, &'a str)>,
{
    let settings = get_settings(db, guild_id).await?;
    Ok(category
        .stored(&settings)
        .or_else(|| fallback_channel(channels)))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    const GUILD: u64 = 3;

    #[tokio::test]
    async fn test_set_log_channel_keeps_other_categories() -> Result<()> {
        let db = setup_test_db().await?;

        set_log_channel(&db, GUILD, LogCategory::Message, 100).await?;
        let settings = set_log_channel(&db, GUILD, LogCategory::Voice, 200).await?;

        assert_eq!(LogCategory::Message.stored(&settings), Some(100));
        assert_eq!(LogCategory::Voice.stored(&settings), Some(200));
        assert_eq!(LogCategory::Moderation.stored(&settings), None);
        Ok(())
    }

    #[tokio::test]
    async fn test_set_log_channel_overwrites_category() -> Result<()> {
        let db = setup_test_db().await?;

        set_log_channel(&db, GUILD, LogCategory::Role, 1).await?;
        let settings = set_log_channel(&db, GUILD, LogCategory::Role, 2).await?;
        assert_eq!(LogCategory::Role.stored(&settings), Some(2));
        Ok(())
    }

    #[tokio::test]
    async fn test_resolve_prefers_stored_channel() -> Result<()> {
        let db = setup_test_db().await?;
        let channels = [(7, "logs"), (8, "general")];

        let before = resolve(&db, GUILD, LogCategory::Server, channels).await?;
        assert_eq!(before, Some(7), "falls back to the logs channel");

        set_log_channel(&db, GUILD, LogCategory::Server, 9).await?;
        let after = resolve(&db, GUILD, LogCategory::Server, channels).await?;
        assert_eq!(after, Some(9));
        Ok(())
    }

    #[test]
    fn test_fallback_order() {
        assert_eq!(fallback_channel([(1, "log"), (2, "logs")]), Some(2));
        assert_eq!(fallback_channel([(1, "بصمة"), (2, "chat")]), Some(1));
        assert_eq!(fallback_channel([(1, "chat")]), None);
    }
}
