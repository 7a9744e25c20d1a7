//! Moderation commands - kick, ban, timeouts, channel locks, purge and warnings.
//!
//! Every command declares the Discord permission it needs; poise rejects invocations from
//! members without it before the body runs. Warnings are stored through
//! [`crate::core::warnings`] and mirrored into the moderation log.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{Context, handlers::activity_log},
        core::{log_channels::LogCategory, warnings},
        errors::{Error, Result},
    };
    use chrono::Utc;
    use poise::serenity_prelude::{self as serenity, Mentionable};
    use std::time::Duration;

    const NO_REASON: &str = "No reason given";
    /// Longest timeout Discord accepts, in minutes (28 days)
    const MAX_MUTE_MINUTES: u32 = 28 * 24 * 60;
    /// Longest slowmode Discord accepts, in seconds
    const MAX_SLOWMODE_SECS: u16 = 21_600;
    const PURGE_NOTICE_TTL: Duration = Duration::from_secs(5);

    fn guild_id(ctx: Context<'_>) -> Result<serenity::GuildId> {
        ctx.guild_id().ok_or_else(|| Error::Config {
            message: "This command only works in a server".to_string(),
        })
    }

    /// Kicks a member from the server.
    #[poise::command(
        slash_command,
        prefix_command,
        guild_only,
        required_permissions = "KICK_MEMBERS"
    )]
    pub async fn kick(
        ctx: Context<'_>,
        #[description = "Member to kick"] member: serenity::Member,
        #[description = "Reason"]
        #[rest]
        reason: Option<String>,
    ) -> Result<()> {
        match reason.as_deref() {
            Some(reason) => member.kick_with_reason(ctx, reason).await?,
            None => member.kick(ctx).await?,
        }
        ctx.say(format!(
            "✅ Kicked {} for: {}",
            member.mention(),
            reason.as_deref().unwrap_or(NO_REASON)
        ))
        .await?;
        Ok(())
    }

    /// Bans a member from the server.
    #[poise::command(
        slash_command,
        prefix_command,
        guild_only,
        required_permissions = "BAN_MEMBERS"
    )]
    pub async fn ban(
        ctx: Context<'_>,
        #[description = "Member to ban"] member: serenity::Member,
        #[description = "Reason"]
        #[rest]
        reason: Option<String>,
    ) -> Result<()> {
        match reason.as_deref() {
            Some(reason) => member.ban_with_reason(ctx, 0, reason).await?,
            None => member.ban(ctx, 0).await?,
        }
        ctx.say(format!(
            "⛔ Banned {} for: {}",
            member.mention(),
            reason.as_deref().unwrap_or(NO_REASON)
        ))
        .await?;
        Ok(())
    }

    /// Lifts a ban by user id.
    #[poise::command(
        slash_command,
        prefix_command,
        guild_only,
        required_permissions = "BAN_MEMBERS"
    )]
    pub async fn unban(
        ctx: Context<'_>,
        #[description = "ID of the banned user"] user_id: serenity::UserId,
    ) -> Result<()> {
        let guild_id = guild_id(ctx)?;
        match guild_id.unban(ctx, user_id).await {
            Ok(()) => {
                ctx.say(format!("✅ Unbanned {}", user_id.mention())).await?;
            }
            Err(e) => {
                tracing::warn!("Unban of {user_id} in {guild_id} failed: {e}");
                ctx.say(format!("❌ Could not unban {}: {e}", user_id.mention()))
                    .await?;
            }
        }
        Ok(())
    }

    /// Deletes the most recent messages in this channel.
    #[poise::command(
        slash_command,
        prefix_command,
        guild_only,
        aliases("clear"),
        required_permissions = "MANAGE_MESSAGES"
    )]
    pub async fn purge(
        ctx: Context<'_>,
        #[description = "How many messages to delete (1-99)"]
        #[min = 1]
        #[max = 99]
        amount: u8,
    ) -> Result<()> {
        if !(1..=99).contains(&amount) {
            ctx.say("❌ Amount must be between 1 and 99").await?;
            return Ok(());
        }

        // A prefix invocation also removes the command message itself
        let limit = match ctx {
            poise::Context::Prefix(_) => amount + 1,
            poise::Context::Application(_) => {
                ctx.defer_ephemeral().await?;
                amount
            }
        };

        let messages = ctx
            .channel_id()
            .messages(ctx, serenity::GetMessages::new().limit(limit))
            .await?;
        let ids: Vec<serenity::MessageId> = messages.iter().map(|m| m.id).collect();
        if !ids.is_empty() {
            ctx.channel_id().delete_messages(ctx, ids).await?;
        }

        let notice = ctx.say(format!("🧹 Deleted {amount} messages.")).await?;
        tokio::time::sleep(PURGE_NOTICE_TTL).await;
        if let Err(e) = notice.delete(ctx).await {
            tracing::debug!("Purge notice already gone: {e}");
        }
        Ok(())
    }

    /// Times a member out for a number of minutes.
    #[poise::command(
        slash_command,
        prefix_command,
        guild_only,
        required_permissions = "MODERATE_MEMBERS"
    )]
    pub async fn mute(
        ctx: Context<'_>,
        #[description = "Member to mute"] member: serenity::Member,
        #[description = "Duration in minutes"] minutes: u32,
        #[description = "Reason"]
        #[rest]
        reason: Option<String>,
    ) -> Result<()> {
        if minutes == 0 || minutes > MAX_MUTE_MINUTES {
            ctx.say(format!(
                "❌ Duration must be between 1 and {MAX_MUTE_MINUTES} minutes"
            ))
            .await?;
            return Ok(());
        }

        let reason = reason.unwrap_or_else(|| NO_REASON.to_string());
        let until = Utc::now().timestamp() + i64::from(minutes) * 60;
        let until = serenity::Timestamp::from_unix_timestamp(until).map_err(|e| Error::Config {
            message: format!("Invalid timeout end: {e}"),
        })?;

        guild_id(ctx)?
            .edit_member(
                ctx,
                member.user.id,
                serenity::EditMember::new()
                    .disable_communication_until_datetime(until)
                    .audit_log_reason(&reason),
            )
            .await?;

        ctx.say(format!(
            "🔇 Muted {} for {minutes} minutes. Reason: {reason}",
            member.mention()
        ))
        .await?;
        Ok(())
    }

    /// Removes a member's timeout.
    #[poise::command(
        slash_command,
        prefix_command,
        guild_only,
        required_permissions = "MODERATE_MEMBERS"
    )]
    pub async fn unmute(
        ctx: Context<'_>,
        #[description = "Member to unmute"] member: serenity::Member,
    ) -> Result<()> {
        guild_id(ctx)?
            .edit_member(
                ctx,
                member.user.id,
                serenity::EditMember::new().enable_communication(),
            )
            .await?;
        ctx.say(format!("🔊 Unmuted {}", member.mention())).await?;
        Ok(())
    }

    /// Sets whether `@everyone` may send messages here, keeping the rest of its overwrite.
    async fn set_everyone_send(ctx: Context<'_>, allow: bool) -> Result<()> {
        let guild_id = guild_id(ctx)?;
        let everyone = guild_id.everyone_role();
        let target = serenity::PermissionOverwriteType::Role(everyone);

        let existing = ctx.guild_channel().await.and_then(|channel| {
            channel
                .permission_overwrites
                .into_iter()
                .find(|overwrite| overwrite.kind == target)
        });
        let (mut allowed, mut denied) = existing
            .map(|o| (o.allow, o.deny))
            .unwrap_or((serenity::Permissions::empty(), serenity::Permissions::empty()));

        let send = serenity::Permissions::SEND_MESSAGES;
        allowed.set(send, allow);
        denied.set(send, !allow);

        ctx.channel_id()
            .create_permission(
                ctx,
                serenity::PermissionOverwrite {
                    allow: allowed,
                    deny: denied,
                    kind: target,
                },
            )
            .await?;
        Ok(())
    }

    /// Stops members from writing in this channel.
    #[poise::command(
        slash_command,
        prefix_command,
        guild_only,
        required_permissions = "MANAGE_CHANNELS"
    )]
    pub async fn lock(ctx: Context<'_>) -> Result<()> {
        set_everyone_send(ctx, false).await?;
        ctx.say(format!("🔒 Locked {}", ctx.channel_id().mention()))
            .await?;
        Ok(())
    }

    /// Lets members write in this channel again.
    #[poise::command(
        slash_command,
        prefix_command,
        guild_only,
        required_permissions = "MANAGE_CHANNELS"
    )]
    pub async fn unlock(ctx: Context<'_>) -> Result<()> {
        set_everyone_send(ctx, true).await?;
        ctx.say(format!("🔓 Unlocked {}", ctx.channel_id().mention()))
            .await?;
        Ok(())
    }

    /// Warns a member and records it.
    #[poise::command(
        slash_command,
        prefix_command,
        guild_only,
        required_permissions = "MODERATE_MEMBERS"
    )]
    pub async fn warn(
        ctx: Context<'_>,
        #[description = "Member to warn"] member: serenity::Member,
        #[description = "Reason"]
        #[rest]
        reason: Option<String>,
    ) -> Result<()> {
        let guild_id = guild_id(ctx)?;
        let reason = reason
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| NO_REASON.to_string());

        warnings::add_warning(
            &ctx.data().database,
            guild_id.get(),
            member.user.id.get(),
            ctx.author().id.get(),
            &reason,
            Utc::now(),
        )
        .await?;

        let embed = serenity::CreateEmbed::new()
            .title("⚠️ New warning")
            .colour(serenity::Colour::GOLD)
            .author(serenity::CreateEmbedAuthor::new(member.user.tag()).icon_url(member.face()))
            .field("By", ctx.author().mention().to_string(), true)
            .field("Reason", reason.as_str(), true)
            .footer(serenity::CreateEmbedFooter::new(format!(
                "ID: {}",
                member.user.id
            )))
            .timestamp(serenity::Timestamp::now());
        activity_log::post(
            ctx.serenity_context(),
            ctx.data(),
            guild_id,
            LogCategory::Moderation,
            embed,
        )
        .await;

        ctx.say(format!("⚠️ Warned {}. Reason: {reason}", member.mention()))
            .await?;
        Ok(())
    }

    /// Lists a member's warnings.
    #[poise::command(
        slash_command,
        prefix_command,
        guild_only,
        required_permissions = "MODERATE_MEMBERS"
    )]
    pub async fn warnings(
        ctx: Context<'_>,
        #[description = "Member to look up"] member: serenity::Member,
    ) -> Result<()> {
        let guild_id = guild_id(ctx)?;
        let warns =
            warnings::list_warnings(&ctx.data().database, guild_id.get(), member.user.id.get())
                .await?;

        if warns.is_empty() {
            ctx.say(format!("✅ {} has no warnings.", member.mention()))
                .await?;
            return Ok(());
        }

        let mut embed = serenity::CreateEmbed::new()
            .title(format!("📋 Warnings for {}", member.user.tag()))
            .colour(serenity::Colour::ORANGE);
        // Discord caps embeds at 25 fields
        for (i, warn) in warns.iter().enumerate().take(25) {
            embed = embed.field(
                format!("Warning {}", i + 1),
                format!(
                    "**By:** <@{}>\n**Reason:** {}\n**When:** <t:{}:R>",
                    warn.moderator_id,
                    warn.reason,
                    warn.timestamp.timestamp()
                ),
                false,
            );
        }

        ctx.send(poise::CreateReply::default().embed(embed)).await?;
        Ok(())
    }

    /// Deletes every warning a member has.
    #[poise::command(
        slash_command,
        prefix_command,
        guild_only,
        required_permissions = "ADMINISTRATOR"
    )]
    pub async fn clearwarns(
        ctx: Context<'_>,
        #[description = "Member to clear"] member: serenity::Member,
    ) -> Result<()> {
        let guild_id = guild_id(ctx)?;
        let removed =
            warnings::clear_warnings(&ctx.data().database, guild_id.get(), member.user.id.get())
                .await?;
        ctx.say(format!(
            "✅ Cleared {removed} warning(s) for {}.",
            member.mention()
        ))
        .await?;
        Ok(())
    }

    /// Makes the bot repeat a message.
    #[poise::command(
        slash_command,
        prefix_command,
        guild_only,
        required_permissions = "MANAGE_MESSAGES"
    )]
    pub async fn say(
        ctx: Context<'_>,
        #[description = "What to say"]
        #[rest]
        message: String,
    ) -> Result<()> {
        match ctx {
            poise::Context::Prefix(prefix_ctx) => {
                if let Err(e) = prefix_ctx.msg.delete(ctx).await {
                    tracing::warn!("Could not remove say invocation: {e}");
                }
                ctx.channel_id().say(ctx, message).await?;
            }
            poise::Context::Application(_) => {
                ctx.say(message).await?;
            }
        }
        Ok(())
    }

    /// Sets slowmode for this channel.
    #[poise::command(
        slash_command,
        prefix_command,
        guild_only,
        required_permissions = "MANAGE_CHANNELS"
    )]
    pub async fn slowmode(
        ctx: Context<'_>,
        #[description = "Seconds between messages (0 disables)"]
        #[max = 21600]
        seconds: u16,
    ) -> Result<()> {
        if seconds > MAX_SLOWMODE_SECS {
            ctx.say(format!(
                "❌ Slowmode can be at most {MAX_SLOWMODE_SECS} seconds"
            ))
            .await?;
            return Ok(());
        }
        ctx.channel_id()
            .edit(ctx, serenity::EditChannel::new().rate_limit_per_user(seconds))
            .await?;
        ctx.say(format!("⏳ Slowmode set to {seconds} seconds.")).await?;
        Ok(())
    }

    /// Changes or resets a member's nickname.
    #[poise::command(
        slash_command,
        prefix_command,
        guild_only,
        required_permissions = "MANAGE_NICKNAMES"
    )]
    pub async fn nick(
        ctx: Context<'_>,
        #[description = "Member to rename"] member: serenity::Member,
        #[description = "New nickname (empty resets it)"]
        #[rest]
        nickname: Option<String>,
    ) -> Result<()> {
        let nickname = nickname.map(|n| n.trim().to_string()).unwrap_or_default();
        guild_id(ctx)?
            .edit_member(
                ctx,
                member.user.id,
                serenity::EditMember::new().nickname(nickname.as_str()),
            )
            .await?;

        let shown = if nickname.is_empty() {
            "the default"
        } else {
            nickname.as_str()
        };
        ctx.say(format!("✅ Changed {}'s nickname to {shown}.", member.mention()))
            .await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
