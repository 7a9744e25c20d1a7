//! Server configuration commands - aliases, log channels, command sync and broadcast.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{
            Context,
            handlers::autocomplete::{autocomplete_alias, autocomplete_command_name},
        },
        core::{aliases, log_channels::LogCategory},
        errors::Result,
    };
    use poise::{
        futures_util::StreamExt,
        serenity_prelude::{self as serenity, Mentionable},
    };
    use std::time::Duration;
    use tracing::{info, warn};

    /// Pause between broadcast DMs
    const BROADCAST_PACING: Duration = Duration::from_secs(1);

    /// Log categories as offered in the slash command.
    #[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
    pub enum LogKind {
        #[name = "messages"]
        Messages,
        #[name = "roles"]
        Roles,
        #[name = "server"]
        Server,
        #[name = "rooms"]
        Rooms,
        #[name = "voice"]
        Voice,
        #[name = "moderation"]
        Moderation,
    }

    impl From<LogKind> for LogCategory {
        fn from(kind: LogKind) -> Self {
            match kind {
                LogKind::Messages => Self::Message,
                LogKind::Roles => Self::Role,
                LogKind::Server => Self::Server,
                LogKind::Rooms => Self::Room,
                LogKind::Voice => Self::Voice,
                LogKind::Moderation => Self::Moderation,
            }
        }
    }

    /// DMs a message to every member of the server.
    #[poise::command(
        slash_command,
        guild_only,
        required_permissions = "ADMINISTRATOR",
        default_member_permissions = "ADMINISTRATOR"
    )]
    pub async fn broadcast(
        ctx: Context<'_>,
        #[description = "Message to send"] message: String,
    ) -> Result<()> {
        let Some(guild_id) = ctx.guild_id() else {
            return Ok(());
        };
        ctx.defer_ephemeral().await?;

        let guild_name = ctx
            .guild()
            .map_or_else(|| "the server".to_string(), |g| g.name.clone());
        let embed = serenity::CreateEmbed::new()
            .title(format!("📢 Message from {guild_name}"))
            .description(&message)
            .colour(serenity::Colour::BLUE);

        let mut sent = 0_u32;
        let mut failed = 0_u32;
        let mut members = guild_id.members_iter(ctx).boxed();
        while let Some(member) = members.next().await {
            let member = match member {
                Ok(member) => member,
                Err(e) => {
                    warn!("Stopped listing members of guild {guild_id}: {e}");
                    break;
                }
            };
            if member.user.bot {
                continue;
            }

            // Closed DMs are expected; count them and move on
            match member
                .user
                .direct_message(ctx, serenity::CreateMessage::new().embed(embed.clone()))
                .await
            {
                Ok(_) => sent += 1,
                Err(_) => failed += 1,
            }
            tokio::time::sleep(BROADCAST_PACING).await;
        }

        info!("Broadcast in guild {guild_id}: {sent} sent, {failed} failed");
        ctx.say(format!(
            "✅ Broadcast finished.\nSent: `{sent}`\nFailed: `{failed}`"
        ))
        .await?;
        Ok(())
    }

    /// Adds another name for a command in this server.
    #[poise::command(
        slash_command,
        prefix_command,
        guild_only,
        rename = "add-alias",
        required_permissions = "ADMINISTRATOR"
    )]
    pub async fn add_alias(
        ctx: Context<'_>,
        #[description = "Command to alias"]
        #[autocomplete = "autocomplete_command_name"]
        command: String,
        #[description = "New name (one word)"] alias: String,
    ) -> Result<()> {
        let Some(guild_id) = ctx.guild_id() else {
            return Ok(());
        };

        let command = command.trim().to_lowercase();
        let exists = ctx
            .framework()
            .options()
            .commands
            .iter()
            .any(|c| c.name == command);
        if !exists {
            ctx.say(format!("❌ There is no command named `{command}`."))
                .await?;
            return Ok(());
        }

        let saved =
            aliases::add_alias(&ctx.data().database, guild_id.get(), &alias, &command).await?;
        info!(
            "Alias '{}' -> '{}' added in guild {guild_id}",
            saved.alias, saved.command_name
        );
        ctx.say(format!(
            "✅ `{}` now runs `{}`.",
            saved.alias, saved.command_name
        ))
        .await?;
        Ok(())
    }

    /// Removes a command alias from this server.
    #[poise::command(
        slash_command,
        prefix_command,
        guild_only,
        rename = "remove-alias",
        required_permissions = "ADMINISTRATOR"
    )]
    pub async fn remove_alias(
        ctx: Context<'_>,
        #[description = "Alias to remove"]
        #[autocomplete = "autocomplete_alias"]
        alias: String,
    ) -> Result<()> {
        let Some(guild_id) = ctx.guild_id() else {
            return Ok(());
        };

        if aliases::remove_alias(&ctx.data().database, guild_id.get(), &alias).await? {
            ctx.say(format!("✅ Alias `{}` removed.", alias.trim()))
                .await?;
        } else {
            ctx.say(format!("❌ There is no alias `{}`.", alias.trim()))
                .await?;
        }
        Ok(())
    }

    /// Re-registers the slash commands in this server.
    #[poise::command(
        slash_command,
        prefix_command,
        guild_only,
        required_permissions = "ADMINISTRATOR"
    )]
    pub async fn sync(ctx: Context<'_>) -> Result<()> {
        let Some(guild_id) = ctx.guild_id() else {
            return Ok(());
        };

        let commands = &ctx.framework().options().commands;
        poise::builtins::register_in_guild(ctx, commands, guild_id).await?;
        info!("Registered {} commands in guild {guild_id}", commands.len());
        ctx.say(format!("✅ Synced {} commands.", commands.len()))
            .await?;
        Ok(())
    }

    /// Sets the channel that receives one kind of activity log.
    #[poise::command(
        slash_command,
        prefix_command,
        guild_only,
        rename = "set-log",
        required_permissions = "ADMINISTRATOR"
    )]
    pub async fn set_log(
        ctx: Context<'_>,
        #[description = "Kind of activity"] kind: LogKind,
        #[description = "Channel to log into"]
        #[channel_types("Text")]
        channel: serenity::GuildChannel,
    ) -> Result<()> {
        let Some(guild_id) = ctx.guild_id() else {
            return Ok(());
        };

        let category = LogCategory::from(kind);
        crate::core::log_channels::set_log_channel(
            &ctx.data().database,
            guild_id.get(),
            category,
            channel.id.get(),
        )
        .await?;
        ctx.say(format!(
            "✅ {category} logs will go to {}.",
            channel.mention()
        ))
        .await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
