//! Alias dispatch.
//!
//! Poise only knows the registered command names. When a guild message starts with one of the
//! guild's aliases (with or without the prefix), the message is rewritten to
//! `prefix + command ...` and handed to poise's prefix dispatcher, so the aliased command runs
//! exactly as if it had been typed out.

use crate::{
    bot::BotData,
    core::aliases,
    errors::{Error, Result},
};
use poise::serenity_prelude as serenity;
use std::any::Any;
use tracing::debug;

/// Whether `word` (prefix already stripped) is a command poise will dispatch on its own.
fn is_registered(framework: poise::FrameworkContext<'_, BotData, Error>, word: &str) -> bool {
    framework
        .options
        .commands
        .iter()
        .any(|c| c.name == word || c.aliases.iter().any(|a| a == word))
}

/// Runs the aliased command if `message` starts with a registered alias.
pub async fn dispatch_alias(
    ctx: &serenity::Context,
    framework: poise::FrameworkContext<'_, BotData, Error>,
    data: &BotData,
    message: &serenity::Message,
) -> Result<()> {
    let Some(guild_id) = message.guild_id else {
        return Ok(());
    };
    let prefix = data.config.prefix.as_str();

    let Some(first_word) = message.content.split_whitespace().next() else {
        return Ok(());
    };
    if is_registered(framework, first_word.strip_prefix(prefix).unwrap_or(first_word)) {
        return Ok(());
    }

    let Some(rewritten) =
        aliases::resolve(&data.database, guild_id.get(), &message.content, prefix).await?
    else {
        return Ok(());
    };
    debug!("Alias in guild {guild_id}: '{first_word}' -> '{rewritten}'");

    let mut aliased = message.clone();
    aliased.content = rewritten;

    let invocation_data = tokio::sync::Mutex::new(Box::new(()) as Box<dyn Any + Send + Sync>);
    let mut parent_commands = Vec::new();
    if let Err(error) = poise::dispatch_message(
        framework,
        ctx,
        &aliased,
        poise::MessageDispatchTrigger::MessageCreate,
        &invocation_data,
        &mut parent_commands,
    )
    .await
    {
        (framework.options.on_error)(error).await;
    }
    Ok(())
}
