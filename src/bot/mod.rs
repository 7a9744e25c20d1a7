//! Bot layer - Discord-specific interface, commands and gateway handlers
//!
//! This module wires the framework-agnostic [`crate::core`] logic into poise: it owns the shared
//! [`BotData`], the error boundary every command and event passes through, and the client
//! startup in [`run_bot`].

/// Discord command implementations (moderation, economy, games, general, admin, tickets)
pub mod commands;
/// Gateway event and component interaction handlers
pub mod handlers;

use crate::{
    config::AppConfig,
    core::{
        audit::AuditCorrelator,
        dedup::{DedupCache, RecentMessages},
        tickets::TicketRegistry,
    },
    errors::{Error, Result},
};
use poise::serenity_prelude as serenity;
use sea_orm::DatabaseConnection;
use std::time::Duration;
use tracing::{error, info, instrument, warn};

/// Shared data available to all bot commands and handlers.
pub struct BotData {
    /// Database connection for all database operations
    pub database: DatabaseConnection,
    /// Prefix, database URL and tunables
    pub config: AppConfig,
    /// Suppresses duplicate delete/edit log entries
    pub dedup: DedupCache,
    /// Recently seen messages, so deletes can still be logged with their content
    pub recent: RecentMessages,
    /// Open tickets by channel id
    pub tickets: TicketRegistry,
    /// Audit-trail attribution for activity logs
    pub correlator: AuditCorrelator,
}

impl BotData {
    /// Creates the shared state from the loaded configuration.
    #[must_use]
    pub fn new(database: DatabaseConnection, config: AppConfig) -> Self {
        let logging = &config.tunables.logging;
        let dedup = DedupCache::with_window(Duration::from_secs(logging.dedup_window_secs));
        let recent = RecentMessages::with_capacity(logging.recent_message_capacity);
        Self {
            database,
            config,
            dedup,
            recent,
            tickets: TicketRegistry::default(),
            correlator: AuditCorrelator::default(),
        }
    }
}

/// Command context used throughout the bot
pub type Context<'a> = poise::Context<'a, BotData, Error>;

/// Formats a remaining wait as `Hh Mm Ss`.
#[must_use]
pub fn format_remaining(remaining: Duration) -> String {
    let secs = remaining.as_secs();
    format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
}

async fn on_error(error: poise::FrameworkError<'_, BotData, Error>) {
    match error {
        poise::FrameworkError::Setup { error, .. } => {
            error!("Failed to start bot: {error:?}");
        }
        poise::FrameworkError::Command { error, ctx, .. } => {
            let reply = if error.is_rejection() {
                format!("❌ {error}")
            } else {
                error!("Error in command `{}`: {error:?}", ctx.command().name);
                "❌ Something went wrong while running this command.".to_string()
            };
            if let Err(e) = ctx.say(reply).await {
                error!("Failed to send error message: {e}");
            }
        }
        poise::FrameworkError::CooldownHit {
            remaining_cooldown,
            ctx,
            ..
        } => {
            let reply = format!("⏳ Try again in `{}`", format_remaining(remaining_cooldown));
            if let Err(e) = ctx.say(reply).await {
                warn!("Failed to send cooldown notice: {e}");
            }
        }
        poise::FrameworkError::MissingUserPermissions { ctx, .. } => {
            if let Err(e) = ctx
                .say("❌ You don't have the permissions required for this command.")
                .await
            {
                warn!("Failed to send permission denial: {e}");
            }
        }
        poise::FrameworkError::ArgumentParse { error, ctx, .. } => {
            let reply = format!(
                "❌ Couldn't read the command arguments ({error}). Check the member or number and try again."
            );
            if let Err(e) = ctx.say(reply).await {
                warn!("Failed to send argument error: {e}");
            }
        }
        // Unregistered words after the prefix are either aliases (rewritten and dispatched by
        // the message handler) or plain chat
        poise::FrameworkError::UnknownCommand { .. } => {}
        poise::FrameworkError::EventHandler { error, event, .. } => {
            error!("Error while handling {}: {error:?}", event.snake_case_name());
        }
        error => {
            if let Err(e) = poise::builtins::on_error(error).await {
                error!("Error while handling error: {e}");
            }
        }
    }
}

/// Every command the bot registers.
#[must_use]
pub fn all_commands() -> Vec<poise::Command<BotData, Error>> {
    vec![
        // Moderation
        commands::kick(),
        commands::ban(),
        commands::unban(),
        commands::purge(),
        commands::mute(),
        commands::unmute(),
        commands::lock(),
        commands::unlock(),
        commands::warn(),
        commands::warnings(),
        commands::clearwarns(),
        commands::say(),
        commands::slowmode(),
        commands::nick(),
        // Economy
        commands::credits(),
        commands::daily(),
        commands::give(),
        // Games
        commands::rps(),
        commands::coin(),
        commands::roll(),
        commands::math(),
        commands::slots(),
        commands::roulette(),
        commands::fast(),
        commands::guess(),
        commands::xo(),
        // General
        commands::help(),
        commands::ping(),
        commands::avatar(),
        commands::user(),
        commands::server(),
        // Admin
        commands::broadcast(),
        commands::add_alias(),
        commands::remove_alias(),
        commands::sync(),
        commands::set_log(),
        // Tickets
        commands::ticket(),
    ]
}

/// Connects to Discord and runs until the client stops.
#[instrument(skip_all)]
pub async fn run_bot(token: String, config: AppConfig, database: DatabaseConnection) -> Result<()> {
    let prefix = config.prefix.clone();

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: all_commands(),
            prefix_options: poise::PrefixFrameworkOptions {
                prefix: Some(prefix),
                ..Default::default()
            },
            on_error: |error| Box::pin(on_error(error)),
            event_handler: |ctx, event, framework, data| {
                Box::pin(handlers::events::event_handler(ctx, event, framework, data))
            },
            ..Default::default()
        })
        .setup(|ctx, ready, framework| {
            Box::pin(async move {
                info!("Logged in as {}", ready.user.name);
                info!("Registering commands globally...");
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                Ok(BotData::new(database, config))
            })
        })
        .build();

    let intents = serenity::GatewayIntents::non_privileged()
        | serenity::GatewayIntents::GUILD_MEMBERS
        | serenity::GatewayIntents::MESSAGE_CONTENT;

    info!("Setting up Serenity client for Poise framework...");
    let mut client = serenity::Client::builder(&token, intents)
        .framework(framework)
        .await
        .inspect_err(|e| error!("Error creating client: {e:?}"))?;

    info!("Starting bot client...");
    client
        .start()
        .await
        .inspect_err(|e| error!("Client error: {e:?}"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_remaining() {
        assert_eq!(format_remaining(Duration::from_secs(0)), "0h 0m 0s");
        assert_eq!(format_remaining(Duration::from_secs(3_725)), "1h 2m 5s");
        assert_eq!(format_remaining(Duration::from_secs(86_399)), "23h 59m 59s");
    }

    #[test]
    fn test_command_names_are_unique() {
        let commands = all_commands();
        let mut names: Vec<&str> = commands.iter().map(|c| c.name.as_str()).collect();
        let total = names.len();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), total);
        assert!(names.contains(&"add-alias"));
        assert!(names.contains(&"set-log"));
    }
}
