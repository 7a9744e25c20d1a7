//! Autocomplete handlers for the alias commands.
//!
//! `add-alias` suggests registered command names and `remove-alias` suggests the guild's
//! existing aliases, so admins don't have to remember either list.

use crate::{bot::Context, core::aliases};

/// Discord shows at most this many suggestions
const MAX_SUGGESTIONS: usize = 25;

/// Suggests registered command names containing `partial`.
pub async fn autocomplete_command_name(ctx: Context<'_>, partial: &str) -> Vec<String> {
    let partial_lower = partial.to_lowercase();
    let mut matching: Vec<String> = ctx
        .framework()
        .options()
        .commands
        .iter()
        .map(|c| c.name.clone())
        .filter(|name| name.contains(&partial_lower))
        .collect();

    matching.sort();
    matching.truncate(MAX_SUGGESTIONS);
    matching
}

/// Suggests this guild's aliases containing `partial`.
pub async fn autocomplete_alias(ctx: Context<'_>, partial: &str) -> Vec<String> {
    let Some(guild_id) = ctx.guild_id() else {
        return Vec::new();
    };

    // Lookup errors just mean no suggestions
    let Ok(registered) = aliases::list_aliases(&ctx.data().database, guild_id.get()).await else {
        return Vec::new();
    };

    registered
        .into_iter()
        .map(|a| a.alias)
        .filter(|alias| alias.contains(partial))
        .take(MAX_SUGGESTIONS)
        .collect()
}
