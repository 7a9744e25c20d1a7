//! Command aliases.
//!
//! Admins register guild-scoped alternative names for commands (for example `طرد` for `kick`).
//! Before a text message reaches the command parser, its first token is checked against the
//! guild's aliases, with or without the prefix, and rewritten to `prefix + command` on a match.

use crate::{
    core::db_id,
    entities::{CommandAlias, command_alias},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*, sea_query::OnConflict};

/// Rewrites `content` if its first token is a registered alias.
///
/// A token starting with `prefix` is looked up with the prefix stripped; otherwise the whole
/// token is the candidate, so aliases also work without the prefix. Returns `None` when nothing
/// matches and the message should be left alone.
#[must_use]
pub fn rewrite<'a, I>(content: &str, prefix: &str, aliases: I) -> Option<String>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let first_word = content.split_whitespace().next()?;
    let candidate = if first_word.starts_with(prefix) {
        first_word.strip_prefix(prefix)?
    } else {
        first_word
    };
    if candidate.is_empty() {
        return None;
    }

    let (_, command) = aliases
        .into_iter()
        .find(|(alias, _)| *alias == candidate)?;

    // The first word starts at the beginning of the trimmed content
    let rest_start = content.find(first_word)? + first_word.len();
    Some(format!("{prefix}{command}{}", &content[rest_start..]))
}

/// Adds an alias, replacing any existing mapping for the same text.
pub async fn add_alias(
    db: &DatabaseConnection,
    guild_id: u64,
    alias: &str,
    command_name: &str,
) -> Result<command_alias::Model> {
    let alias = alias.trim();
    if alias.is_empty() || alias.contains(char::is_whitespace) {
        return Err(Error::InvalidAlias {
            alias: alias.to_string(),
        });
    }

    let model = command_alias::ActiveModel {
        guild_id: Set(db_id(guild_id)?),
        alias: Set(alias.to_string()),
        command_name: Set(command_name.to_string()),
    };

    CommandAlias::insert(model)
        .on_conflict(
            OnConflict::columns([command_alias::Column::GuildId, command_alias::Column::Alias])
                .update_column(command_alias::Column::CommandName)
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;

    Ok(command_alias::Model {
        guild_id: db_id(guild_id)?,
        alias: alias.to_string(),
        command_name: command_name.to_string(),
    })
}

/// Removes an alias. Returns whether it existed.
pub async fn remove_alias(db: &DatabaseConnection, guild_id: u64, alias: &str) -> Result<bool> {
    let result = CommandAlias::delete_many()
        .filter(command_alias::Column::GuildId.eq(db_id(guild_id)?))
        .filter(command_alias::Column::Alias.eq(alias.trim()))
        .exec(db)
        .await?;
    Ok(result.rows_affected > 0)
}

/// All aliases registered in a guild, alphabetically.
pub async fn list_aliases(
    db: &DatabaseConnection,
    guild_id: u64,
) -> Result<Vec<command_alias::Model>> {
    CommandAlias::find()
        .filter(command_alias::Column::GuildId.eq(db_id(guild_id)?))
        .order_by_asc(command_alias::Column::Alias)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Looks up the guild's aliases and rewrites `content` if one matches.
pub async fn resolve(
    db: &DatabaseConnection,
    guild_id: u64,
    content: &str,
    prefix: &str,
) -> Result<Option<String>> {
    let aliases = list_aliases(db, guild_id).await?;
    Ok(rewrite(
        content,
        prefix,
        aliases
            .iter()
            .map(|a| (a.alias.as_str(), a.command_name.as_str())),
    ))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    const GUILD: u64 = 77;
    const ALIASES: [(&str, &str); 2] = [("طرد", "kick"), ("حظر", "ban")];

    #[test]
    fn test_rewrite_without_prefix() {
        let rewritten = rewrite("طرد <@123> spamming", "!", ALIASES);
        assert_eq!(rewritten.as_deref(), Some("!kick <@123> spamming"));
    }

    #[test]
    fn test_rewrite_with_prefix() {
        let rewritten = rewrite("!حظر <@123>", "!", ALIASES);
        assert_eq!(rewritten.as_deref(), Some("!ban <@123>"));
    }

    #[test]
    fn test_rewrite_alias_only() {
        assert_eq!(rewrite("طرد", "!", ALIASES).as_deref(), Some("!kick"));
    }

    #[test]
    fn test_rewrite_no_match_leaves_message() {
        assert_eq!(rewrite("hello there", "!", ALIASES), None);
        assert_eq!(rewrite("!kick <@1>", "!", ALIASES), None);
        assert_eq!(rewrite("", "!", ALIASES), None);
        assert_eq!(rewrite("! طرد", "!", ALIASES), None, "bare prefix is not an alias");
    }

    #[test]
    fn test_rewrite_ignores_leading_whitespace() {
        let rewritten = rewrite("  !طرد <@9>", "!", ALIASES);
        assert_eq!(rewritten.as_deref(), Some("!kick <@9>"));

        let bare = rewrite("\tحظر", "!", ALIASES);
        assert_eq!(bare.as_deref(), Some("!ban"));
    }

    #[test]
    fn test_rewrite_multi_char_prefix() {
        let rewritten = rewrite("t!طرد <@5>", "t!", ALIASES);
        assert_eq!(rewritten.as_deref(), Some("t!kick <@5>"));
    }

    #[tokio::test]
    async fn test_alias_round_trip_matches_canonical_command() -> Result<()> {
        let db = setup_test_db().await?;
        add_alias(&db, GUILD, "طرد", "kick").await?;

        let rewritten = resolve(&db, GUILD, "طرد @user", "!").await?;
        assert_eq!(rewritten.as_deref(), Some("!kick @user"));

        // Aliases are per guild
        let other = resolve(&db, GUILD + 1, "طرد @user", "!").await?;
        assert_eq!(other, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_add_alias_replaces_mapping() -> Result<()> {
        let db = setup_test_db().await?;
        add_alias(&db, GUILD, "x", "kick").await?;
        add_alias(&db, GUILD, "x", "ban").await?;

        let aliases = list_aliases(&db, GUILD).await?;
        assert_eq!(aliases.len(), 1);
        assert_eq!(aliases[0].command_name, "ban");
        Ok(())
    }

    #[tokio::test]
    async fn test_remove_alias() -> Result<()> {
        let db = setup_test_db().await?;
        add_alias(&db, GUILD, "طرد", "kick").await?;

        assert!(remove_alias(&db, GUILD, "طرد").await?);
        assert!(!remove_alias(&db, GUILD, "طرد").await?, "already removed");
        assert!(list_aliases(&db, GUILD).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_add_alias_rejects_multiple_words() -> Result<()> {
        let db = setup_test_db().await?;
        let result = add_alias(&db, GUILD, "two words", "kick").await;
        match result {
            Err(error @ Error::InvalidAlias { .. }) => {
                assert!(error.is_rejection(), "shown to the admin, not logged as a failure");
                assert_eq!(error.to_string(), "Alias `two words` must be a single word");
            }
            other => panic!("expected InvalidAlias, got {other:?}"),
        }
        assert!(list_aliases(&db, GUILD).await?.is_empty());
        Ok(())
    }
}
