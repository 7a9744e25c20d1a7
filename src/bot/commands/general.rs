//! General Discord commands - help, ping and the avatar/user/server info embeds.
//! None of these touch the database.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{bot::Context, errors::Result};
    use poise::serenity_prelude::{self as serenity, Mentionable};

    const INFO_COLOUR: u32 = 0x34_98db;

    /// Responds with "Pong!" to test bot connectivity.
    #[poise::command(slash_command, prefix_command)]
    pub async fn ping(ctx: Context<'_>) -> Result<()> {
        ctx.say("Pong!").await?;
        Ok(())
    }

    /// Displays help information about available commands.
    #[poise::command(slash_command, prefix_command)]
    pub async fn help(ctx: Context<'_>) -> Result<()> {
        let prefix = &ctx.data().config.prefix;
        let help_text = format!(
            "**Thex Help**\n\
            Every command works as `/name` or `{prefix}name`.\n\n\
            **Moderation**\n\
            • `kick`, `ban`, `unban`, `mute`, `unmute` - Member actions, with an optional reason.\n\
            • `purge <1-99>`, `lock`, `unlock`, `slowmode <seconds>`, `say <text>`, `nick`\n\
            • `warn`, `warnings`, `clearwarns` - Warning records.\n\n\
            **Economy**\n\
            • `credits [member]` - Shows a balance.\n\
            • `daily` - Claims the daily reward.\n\
            • `give <member> <amount>` - Sends credits.\n\n\
            **Games**\n\
            • `rps`, `coin`, `roll`, `slots`, `math`, `fast`, `guess`\n\
            • `xo <member>` - Tic-tac-toe.\n\
            • `roulette` - Group elimination game.\n\n\
            **General**\n\
            • `avatar`, `user`, `server`, `ping`, `help`\n\n\
            **Admin**\n\
            • `add-alias`, `remove-alias`, `set-log`, `sync`, `broadcast`\n\
            • `/ticket setup`, `/ticket panel` - Support tickets."
        );

        ctx.say(help_text).await?;
        Ok(())
    }

    /// Shows a member's avatar.
    #[poise::command(slash_command, prefix_command)]
    pub async fn avatar(
        ctx: Context<'_>,
        #[description = "Member (defaults to you)"] member: Option<serenity::User>,
    ) -> Result<()> {
        let user = member.as_ref().unwrap_or_else(|| ctx.author());
        let embed = serenity::CreateEmbed::new()
            .title(format!("Avatar of {}", user.display_name()))
            .image(user.face())
            .colour(INFO_COLOUR);
        ctx.send(poise::CreateReply::default().embed(embed)).await?;
        Ok(())
    }

    /// Shows account and membership details.
    #[poise::command(slash_command, prefix_command, guild_only)]
    pub async fn user(
        ctx: Context<'_>,
        #[description = "Member (defaults to you)"] member: Option<serenity::Member>,
    ) -> Result<()> {
        let member = match member {
            Some(member) => member,
            None => match ctx.author_member().await {
                Some(member) => member.into_owned(),
                None => {
                    ctx.say("❌ Couldn't load your member details.").await?;
                    return Ok(());
                }
            },
        };

        let joined = member
            .joined_at
            .map_or_else(|| "unknown".to_string(), |t| format!("<t:{}:R>", t.unix_timestamp()));
        let roles = if member.roles.is_empty() {
            "none".to_string()
        } else {
            member
                .roles
                .iter()
                .map(|r| r.mention().to_string())
                .collect::<Vec<_>>()
                .join(" ")
        };

        let embed = serenity::CreateEmbed::new()
            .title(member.user.display_name())
            .thumbnail(member.face())
            .field("ID", member.user.id.to_string(), true)
            .field(
                "Created",
                format!("<t:{}:R>", member.user.created_at().unix_timestamp()),
                true,
            )
            .field("Joined", joined, true)
            .field("Roles", roles, false)
            .colour(INFO_COLOUR);
        ctx.send(poise::CreateReply::default().embed(embed)).await?;
        Ok(())
    }

    /// Shows server details.
    #[poise::command(slash_command, prefix_command, guild_only)]
    pub async fn server(ctx: Context<'_>) -> Result<()> {
        // Build the embed while the cache guard is held, then release it before awaiting
        let embed = ctx.guild().map(|guild| {
            let mut embed = serenity::CreateEmbed::new()
                .title(guild.name.clone())
                .field("ID", guild.id.to_string(), true)
                .field("Owner", guild.owner_id.mention().to_string(), true)
                .field("Members", guild.member_count.to_string(), true)
                .field("Channels", guild.channels.len().to_string(), true)
                .field("Roles", guild.roles.len().to_string(), true)
                .field(
                    "Created",
                    format!("<t:{}:R>", guild.id.created_at().unix_timestamp()),
                    true,
                )
                .colour(INFO_COLOUR);
            if let Some(icon) = guild.icon_url() {
                embed = embed.thumbnail(icon);
            }
            embed
        });

        match embed {
            Some(embed) => {
                ctx.send(poise::CreateReply::default().embed(embed)).await?;
            }
            None => {
                ctx.say("❌ This server isn't cached yet, try again shortly.")
                    .await?;
            }
        }
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
