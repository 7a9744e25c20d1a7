//! Ticket commands - `/ticket setup` and `/ticket panel`.
//!
//! Everything after the panel is posted (opening, claiming, adding members, closing) happens
//! through its persistent controls, handled in [`crate::bot::handlers::interactions`].

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::Context,
        core::tickets::{self, SELECT_TYPE_ID, TicketKind, TicketSetup},
        errors::Result,
    };
    use poise::serenity_prelude::{self as serenity, Mentionable};
    use tracing::info;

    /// Parent command for the ticket system.
    #[poise::command(
        slash_command,
        guild_only,
        subcommands("ticket_setup", "ticket_panel"),
        required_permissions = "ADMINISTRATOR",
        default_member_permissions = "ADMINISTRATOR"
    )]
    pub async fn ticket(ctx: Context<'_>) -> Result<()> {
        let help_text = "Ticket system. Available subcommands:\n\
            `/ticket setup` - Configure the category, log channel and staff roles\n\
            `/ticket panel` - Post the panel members open tickets from";

        ctx.say(help_text).await?;
        Ok(())
    }

    fn role_line(role: Option<&serenity::Role>) -> String {
        role.map_or_else(|| "not set".to_string(), |r| r.mention().to_string())
    }

    /// Stores the ticket configuration for this server.
    #[poise::command(
        slash_command,
        rename = "setup",
        guild_only,
        required_permissions = "ADMINISTRATOR"
    )]
    #[allow(clippy::too_many_arguments)]
    pub async fn ticket_setup(
        ctx: Context<'_>,
        #[description = "Category new tickets are created in"]
        #[channel_types("Category")]
        category: serenity::GuildChannel,
        #[description = "General staff role"] staff_role: serenity::Role,
        #[description = "Channel for close logs and transcripts"]
        #[channel_types("Text")]
        logs_channel: Option<serenity::GuildChannel>,
        #[description = "Role reviewing staff applications"] staff_app_role: Option<serenity::Role>,
        #[description = "Role handling inquiries"] inquiry_role: Option<serenity::Role>,
        #[description = "Role handling complaints"] complaint_role: Option<serenity::Role>,
        #[description = "Role handling verification"] verification_role: Option<serenity::Role>,
    ) -> Result<()> {
        let Some(guild_id) = ctx.guild_id() else {
            return Ok(());
        };

        let setup = TicketSetup {
            guild_id: guild_id.get(),
            category_id: category.id.get(),
            logs_channel_id: logs_channel.as_ref().map(|c| c.id.get()),
            staff_role_id: staff_role.id.get(),
            staff_app_role_id: staff_app_role.as_ref().map(|r| r.id.get()),
            inquiry_role_id: inquiry_role.as_ref().map(|r| r.id.get()),
            complaint_role_id: complaint_role.as_ref().map(|r| r.id.get()),
            girl_verif_role_id: verification_role.as_ref().map(|r| r.id.get()),
        };
        tickets::save_settings(&ctx.data().database, setup).await?;
        info!("Ticket settings saved for guild {guild_id}");

        let embed = serenity::CreateEmbed::new()
            .title("✅ Ticket system configured")
            .field("Category", category.name.clone(), true)
            .field(
                "Logs",
                logs_channel
                    .as_ref()
                    .map_or_else(|| "not set".to_string(), |c| c.mention().to_string()),
                true,
            )
            .field("Staff", staff_role.mention().to_string(), true)
            .field("Staff applications", role_line(staff_app_role.as_ref()), true)
            .field("Inquiries", role_line(inquiry_role.as_ref()), true)
            .field("Complaints", role_line(complaint_role.as_ref()), true)
            .field("Verification", role_line(verification_role.as_ref()), true)
            .colour(serenity::Colour::DARK_GREEN);
        ctx.send(poise::CreateReply::default().embed(embed).ephemeral(true))
            .await?;
        Ok(())
    }

    /// Posts the ticket panel in this channel.
    #[poise::command(
        slash_command,
        rename = "panel",
        guild_only,
        required_permissions = "ADMINISTRATOR"
    )]
    pub async fn ticket_panel(ctx: Context<'_>) -> Result<()> {
        let Some(guild_id) = ctx.guild_id() else {
            return Ok(());
        };
        // Refuses with a clear message before posting a panel nobody can use
        tickets::require_settings(&ctx.data().database, guild_id.get()).await?;

        let options = TicketKind::ALL
            .into_iter()
            .map(|kind| {
                serenity::CreateSelectMenuOption::new(kind.label(), kind.value())
                    .description(kind.description())
                    .emoji(serenity::ReactionType::Unicode(kind.emoji().to_string()))
            })
            .collect();
        let menu = serenity::CreateSelectMenu::new(
            SELECT_TYPE_ID,
            serenity::CreateSelectMenuKind::String { options },
        )
        .placeholder("Choose the ticket type...");

        let embed = serenity::CreateEmbed::new()
            .title("🎫 Support tickets")
            .description(
                "Need help? Pick the kind of ticket you want to open from the menu below and a \
                 private channel will be created for you.",
            )
            .colour(serenity::Colour::BLURPLE);

        ctx.channel_id()
            .send_message(
                ctx,
                serenity::CreateMessage::new()
                    .embed(embed)
                    .components(vec![serenity::CreateActionRow::SelectMenu(menu)]),
            )
            .await?;
        ctx.send(
            poise::CreateReply::default()
                .content("✅ Panel posted.")
                .ephemeral(true),
        )
        .await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
