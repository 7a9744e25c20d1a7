//! Ticket controls.
//!
//! The panel selector and the buttons inside a ticket use fixed custom ids, so they keep working
//! after a restart: every press is routed here from the gateway handler by id. The lifecycle
//! transitions go through the [`TicketRegistry`](crate::core::tickets::TicketRegistry); a ticket
//! the registry doesn't know (restart, eviction) is rebuilt from its channel first.

use crate::{
    bot::BotData,
    core::tickets::{
        self, ADD_MEMBER_ID, CLAIM_ID, CLOSE_ID, ChannelSummary, SELECT_TYPE_ID, Ticket,
        TicketKind,
        permissions::{self, Access, OverwriteTarget, PlannedOverwrite, TicketRoles},
        transcript::{self, TranscriptLine},
    },
    entities::ticket_settings,
    errors::{Error, Result},
};
use chrono::DateTime;
use poise::{
    futures_util::StreamExt,
    serenity_prelude::{self as serenity, Mentionable},
};
use tracing::{debug, error, info, warn};

/// Name of the embed field that records who claimed a ticket
const CLAIMED_FIELD: &str = "Claimed by";

/// Shown for failures that are not the presser's doing
const FAILURE_NOTICE: &str = "❌ Something went wrong while handling this action.";

/// How a failed control press is reported back to the presser.
#[derive(Debug, Clone, PartialEq, Eq)]
enum FailureReply {
    /// Initial response; nothing has acknowledged the interaction yet
    Respond(String),
    /// Followup; the interaction was already deferred or answered
    Followup(String),
}

fn failure_reply(error: &Error, acknowledged: bool) -> FailureReply {
    let text = if error.is_rejection() {
        format!("❌ {error}")
    } else {
        FAILURE_NOTICE.to_string()
    };
    if acknowledged {
        FailureReply::Followup(text)
    } else {
        FailureReply::Respond(text)
    }
}

/// Replies to a component press with a message only the presser sees.
pub async fn respond_ephemeral(
    http: impl serenity::CacheHttp,
    interaction: &serenity::ComponentInteraction,
    text: &str,
) -> Result<()> {
    interaction
        .create_response(
            http,
            serenity::CreateInteractionResponse::Message(
                serenity::CreateInteractionResponseMessage::new()
                    .content(text)
                    .ephemeral(true),
            ),
        )
        .await?;
    Ok(())
}

/// Routes a component press on a ticket control. Other custom ids (game buttons, confirmation
/// prompts) belong to collectors and are ignored here.
///
/// A failed press always gets an ephemeral answer: the rejection text, or a generic notice once
/// the error has been logged.
pub async fn handle_component(
    ctx: &serenity::Context,
    data: &BotData,
    interaction: &serenity::ComponentInteraction,
) -> Result<()> {
    let result = match interaction.data.custom_id.as_str() {
        SELECT_TYPE_ID => open_ticket(ctx, data, interaction).await,
        CLAIM_ID => claim_ticket(ctx, data, interaction).await,
        ADD_MEMBER_ID => add_member(ctx, data, interaction).await,
        CLOSE_ID => close_ticket(ctx, data, interaction).await,
        _ => return Ok(()),
    };

    let Err(e) = result else {
        return Ok(());
    };
    if !e.is_rejection() {
        error!(
            "Ticket control `{}` failed: {e:?}",
            interaction.data.custom_id
        );
    }

    // A deferred or answered interaction has an original response to fetch
    let acknowledged = interaction.get_response(&ctx.http).await.is_ok();
    let sent = match failure_reply(&e, acknowledged) {
        FailureReply::Respond(text) => respond_ephemeral(ctx, interaction, &text).await,
        FailureReply::Followup(text) => interaction
            .create_followup(
                ctx,
                serenity::CreateInteractionResponseFollowup::new()
                    .content(text)
                    .ephemeral(true),
            )
            .await
            .map(|_| ())
            .map_err(Error::from),
    };
    if let Err(notify) = sent {
        warn!("Failed to report ticket control error: {notify}");
    }
    Ok(())
}

fn to_overwrite(planned: PlannedOverwrite) -> serenity::PermissionOverwrite {
    let participant = serenity::Permissions::VIEW_CHANNEL
        | serenity::Permissions::SEND_MESSAGES
        | serenity::Permissions::ATTACH_FILES
        | serenity::Permissions::READ_MESSAGE_HISTORY;

    let (allow, deny) = match planned.access {
        Access::Hidden => (
            serenity::Permissions::empty(),
            serenity::Permissions::VIEW_CHANNEL,
        ),
        Access::Participant => (participant, serenity::Permissions::empty()),
        Access::Manager => (
            participant
                | serenity::Permissions::MANAGE_CHANNELS
                | serenity::Permissions::MANAGE_MESSAGES,
            serenity::Permissions::empty(),
        ),
    };

    let kind = match planned.target {
        OverwriteTarget::Role(id) => serenity::PermissionOverwriteType::Role(id.into()),
        OverwriteTarget::Member(id) => serenity::PermissionOverwriteType::Member(id.into()),
    };

    serenity::PermissionOverwrite { allow, deny, kind }
}

/// Applies overwrites one by one; a failed grant is logged and skipped.
async fn apply_plan(
    ctx: &serenity::Context,
    channel_id: serenity::ChannelId,
    plan: Vec<PlannedOverwrite>,
) {
    for planned in plan {
        if let Err(e) = channel_id.create_permission(ctx, to_overwrite(planned)).await {
            warn!(
                "Failed to apply {:?} on ticket channel {channel_id}: {e}",
                planned.target
            );
        }
    }
}

/// Configured roles that still exist in the guild.
async fn live_roles(
    ctx: &serenity::Context,
    guild_id: serenity::GuildId,
    settings: &ticket_settings::Model,
) -> Result<TicketRoles> {
    let guild_roles = guild_id.roles(ctx).await?;
    Ok(TicketRoles::from_settings(settings)
        .retain_existing(|id| guild_roles.contains_key(&serenity::RoleId::new(id))))
}

fn is_staff(interaction: &serenity::ComponentInteraction, roles: &TicketRoles) -> bool {
    let Some(member) = &interaction.member else {
        return false;
    };
    let is_admin = member
        .permissions
        .is_some_and(|permissions| permissions.administrator());
    let member_roles: Vec<u64> = member.roles.iter().map(|r| r.get()).collect();
    roles.is_staff(&member_roles, is_admin)
}

fn control_rows(claimed: bool) -> Vec<serenity::CreateActionRow> {
    vec![serenity::CreateActionRow::Buttons(vec![
        serenity::CreateButton::new(CLAIM_ID)
            .label("Claim")
            .emoji('🙋')
            .style(serenity::ButtonStyle::Success)
            .disabled(claimed),
        serenity::CreateButton::new(ADD_MEMBER_ID)
            .label("Add member")
            .emoji('➕')
            .style(serenity::ButtonStyle::Primary),
        serenity::CreateButton::new(CLOSE_ID)
            .label("Close")
            .emoji('🔒')
            .style(serenity::ButtonStyle::Danger),
    ])]
}

/// The ticket behind the pressed control, rebuilt from the channel if the registry lost it.
async fn tracked_ticket(
    ctx: &serenity::Context,
    data: &BotData,
    interaction: &serenity::ComponentInteraction,
) -> Result<Option<Ticket>> {
    let channel_id = interaction.channel_id.get();
    if let Some(ticket) = data.tickets.get(channel_id) {
        return Ok(Some(ticket));
    }

    let Some(channel) = interaction.channel_id.to_channel(ctx).await?.guild() else {
        return Ok(None);
    };

    let control = interaction.message.embeds.first();
    let kind = control
        .and_then(|embed| embed.description.as_deref())
        .and_then(TicketKind::from_label_in);
    let claimant = control.and_then(|embed| {
        embed
            .fields
            .iter()
            .find(|field| field.name == CLAIMED_FIELD)
            .and_then(|field| tickets::parse_mention(&field.value))
    });

    let Some(ticket) =
        Ticket::from_channel(channel_id, &channel.name, channel.topic.as_deref(), kind, claimant)
    else {
        return Ok(None);
    };
    debug!("Rebuilt ticket #{} from channel {channel_id}", ticket.number);
    data.tickets.insert_if_absent(ticket);
    Ok(data.tickets.get(channel_id))
}

async fn open_ticket(
    ctx: &serenity::Context,
    data: &BotData,
    interaction: &serenity::ComponentInteraction,
) -> Result<()> {
    let Some(guild_id) = interaction.guild_id else {
        return Ok(());
    };
    let kind = match &interaction.data.kind {
        serenity::ComponentInteractionDataKind::StringSelect { values } => values
            .first()
            .map(String::as_str)
            .and_then(TicketKind::from_value),
        _ => None,
    };
    let Some(kind) = kind else {
        return Ok(());
    };

    let settings = tickets::require_settings(&data.database, guild_id.get()).await?;
    let category_id = crate::core::snowflake(settings.category_id);

    let channels = guild_id.channels(ctx).await?;
    if !channels.contains_key(&serenity::ChannelId::new(category_id)) {
        return respond_ephemeral(
            ctx,
            interaction,
            "❌ The ticket category no longer exists. Ask an admin to run `/ticket setup` again.",
        )
        .await;
    }

    let owner_id = interaction.user.id.get();
    let summaries: Vec<ChannelSummary> = channels
        .values()
        .map(|c| ChannelSummary {
            id: c.id.get(),
            parent_id: c.parent_id.map(serenity::ChannelId::get),
            topic: c.topic.clone(),
        })
        .collect();
    if let Some(existing) = tickets::find_open_ticket(&summaries, category_id, owner_id) {
        return respond_ephemeral(
            ctx,
            interaction,
            &format!("❌ You already have an open ticket: <#{existing}>"),
        )
        .await;
    }

    interaction.defer_ephemeral(ctx).await?;

    let roles = live_roles(ctx, guild_id, &settings).await?;
    let number = tickets::next_ticket_number(&data.database, guild_id.get()).await?;
    let bot_id = ctx.cache.current_user().id.get();
    let plan = permissions::open_plan(guild_id.get(), owner_id, bot_id, &roles, kind);

    let channel = guild_id
        .create_channel(
            ctx,
            serenity::CreateChannel::new(tickets::channel_name(number))
                .kind(serenity::ChannelType::Text)
                .category(serenity::ChannelId::new(category_id))
                .topic(owner_id.to_string())
                .permissions(plan.into_iter().map(to_overwrite)),
        )
        .await?;
    info!(
        "Opened ticket #{number:03} ({}) for {owner_id} in guild {guild_id}",
        kind.value()
    );

    let staff_mention = roles
        .for_kind(kind)
        .map(|role| format!(" <@&{role}>"))
        .unwrap_or_default();
    let embed = serenity::CreateEmbed::new()
        .title(format!("🎫 Ticket #{number:03}"))
        .description(format!(
            "Type: **{}**\nWelcome {}! Describe your request and staff will be with you shortly.",
            kind.label(),
            interaction.user.mention()
        ))
        .colour(serenity::Colour::BLURPLE);
    channel
        .send_message(
            ctx,
            serenity::CreateMessage::new()
                .content(format!("{}{staff_mention}", interaction.user.mention()))
                .embed(embed)
                .components(control_rows(false)),
        )
        .await?;

    data.tickets
        .insert(Ticket::open(channel.id.get(), owner_id, kind, number));

    interaction
        .edit_response(
            ctx,
            serenity::EditInteractionResponse::new()
                .content(format!("✅ Your ticket was created: {}", channel.mention())),
        )
        .await?;

    let notice_ttl = data.config.tunables.tickets.notice_ttl();
    let ctx = ctx.clone();
    let interaction = interaction.clone();
    tokio::spawn(async move {
        tokio::time::sleep(notice_ttl).await;
        if let Err(e) = interaction.delete_response(&ctx).await {
            debug!("Ticket notice already gone: {e}");
        }
    });
    Ok(())
}

async fn claim_ticket(
    ctx: &serenity::Context,
    data: &BotData,
    interaction: &serenity::ComponentInteraction,
) -> Result<()> {
    let Some(guild_id) = interaction.guild_id else {
        return Ok(());
    };
    let settings = tickets::require_settings(&data.database, guild_id.get()).await?;
    let roles = live_roles(ctx, guild_id, &settings).await?;
    if !is_staff(interaction, &roles) {
        return respond_ephemeral(ctx, interaction, "❌ Only staff can claim tickets.").await;
    }

    if tracked_ticket(ctx, data, interaction).await?.is_none() {
        return respond_ephemeral(ctx, interaction, "❌ This channel is not a ticket.").await;
    }

    let staff_id = interaction.user.id.get();
    let channel_id = interaction.channel_id;
    if let Some(outcome) = data
        .tickets
        .transition(channel_id.get(), |ticket| ticket.claim(staff_id))
    {
        outcome?;
    }
    info!("Ticket channel {channel_id} claimed by {staff_id}");

    apply_plan(ctx, channel_id, permissions::claim_plan(&roles, staff_id)).await;

    let embed = interaction
        .message
        .embeds
        .first()
        .cloned()
        .map(serenity::CreateEmbed::from)
        .unwrap_or_default()
        .field(CLAIMED_FIELD, interaction.user.mention().to_string(), false);
    interaction
        .create_response(
            ctx,
            serenity::CreateInteractionResponse::UpdateMessage(
                serenity::CreateInteractionResponseMessage::new()
                    .embed(embed)
                    .components(control_rows(true)),
            ),
        )
        .await?;

    channel_id
        .say(
            ctx,
            format!("🙋 {} claimed this ticket.", interaction.user.mention()),
        )
        .await?;
    Ok(())
}

async fn add_member(
    ctx: &serenity::Context,
    data: &BotData,
    interaction: &serenity::ComponentInteraction,
) -> Result<()> {
    let Some(guild_id) = interaction.guild_id else {
        return Ok(());
    };
    let settings = tickets::require_settings(&data.database, guild_id.get()).await?;
    let roles = live_roles(ctx, guild_id, &settings).await?;
    if !is_staff(interaction, &roles) {
        return respond_ephemeral(ctx, interaction, "❌ Only staff can add members.").await;
    }

    let Some(ticket) = tracked_ticket(ctx, data, interaction).await? else {
        return respond_ephemeral(ctx, interaction, "❌ This channel is not a ticket.").await;
    };
    ticket.ensure_accepts_members()?;

    let select_id = format!("{ADD_MEMBER_ID}:{}", interaction.id);
    let menu = serenity::CreateSelectMenu::new(
        &select_id,
        serenity::CreateSelectMenuKind::User {
            default_users: None,
        },
    )
    .placeholder("Pick the member to add...");
    interaction
        .create_response(
            ctx,
            serenity::CreateInteractionResponse::Message(
                serenity::CreateInteractionResponseMessage::new()
                    .content("Who should be added to this ticket?")
                    .components(vec![serenity::CreateActionRow::SelectMenu(menu)])
                    .ephemeral(true),
            ),
        )
        .await?;

    let Some(selection) = serenity::ComponentInteractionCollector::new(ctx)
        .custom_ids(vec![select_id])
        .author_id(interaction.user.id)
        .timeout(data.config.tunables.tickets.confirm_timeout())
        .await
    else {
        // The prompt may already be dismissed
        if let Err(e) = interaction
            .edit_response(
                ctx,
                serenity::EditInteractionResponse::new()
                    .content("⏰ No member was picked.")
                    .components(Vec::new()),
            )
            .await
        {
            debug!("Could not expire add-member prompt: {e}");
        }
        return Ok(());
    };

    let picked = match &selection.data.kind {
        serenity::ComponentInteractionDataKind::UserSelect { values } => values.first().copied(),
        _ => None,
    };
    let Some(user_id) = picked else {
        return Ok(());
    };

    let user = user_id.to_user(ctx).await?;
    if user.bot {
        return respond_ephemeral(ctx, &selection, "❌ Bots can't be added to tickets.").await;
    }

    apply_plan(
        ctx,
        interaction.channel_id,
        vec![permissions::member_grant(user_id.get())],
    )
    .await;
    selection
        .create_response(
            ctx,
            serenity::CreateInteractionResponse::UpdateMessage(
                serenity::CreateInteractionResponseMessage::new()
                    .content(format!("✅ Added {}.", user.mention()))
                    .components(Vec::new()),
            ),
        )
        .await?;
    interaction
        .channel_id
        .say(
            ctx,
            format!(
                "➕ {} was added to the ticket by {}.",
                user.mention(),
                interaction.user.mention()
            ),
        )
        .await?;
    Ok(())
}

async fn close_ticket(
    ctx: &serenity::Context,
    data: &BotData,
    interaction: &serenity::ComponentInteraction,
) -> Result<()> {
    let Some(guild_id) = interaction.guild_id else {
        return Ok(());
    };
    if tracked_ticket(ctx, data, interaction).await?.is_none() {
        return respond_ephemeral(ctx, interaction, "❌ This channel is not a ticket.").await;
    }

    let channel_id = interaction.channel_id;
    if let Some(outcome) = data
        .tickets
        .transition(channel_id.get(), |ticket| ticket.request_close())
    {
        outcome?;
    }

    let confirm_id = format!("close_confirm:{}", interaction.id);
    let cancel_id = format!("close_cancel:{}", interaction.id);
    interaction
        .create_response(
            ctx,
            serenity::CreateInteractionResponse::Message(
                serenity::CreateInteractionResponseMessage::new()
                    .content("Are you sure you want to close this ticket?")
                    .components(vec![serenity::CreateActionRow::Buttons(vec![
                        serenity::CreateButton::new(&confirm_id)
                            .label("Confirm")
                            .style(serenity::ButtonStyle::Danger),
                        serenity::CreateButton::new(&cancel_id)
                            .label("Cancel")
                            .style(serenity::ButtonStyle::Secondary),
                    ])])
                    .ephemeral(true),
            ),
        )
        .await?;

    let answer = serenity::ComponentInteractionCollector::new(ctx)
        .custom_ids(vec![confirm_id.clone(), cancel_id])
        .author_id(interaction.user.id)
        .timeout(data.config.tunables.tickets.confirm_timeout())
        .await;

    match answer {
        Some(press) if press.data.custom_id == confirm_id => {
            press
                .create_response(
                    ctx,
                    serenity::CreateInteractionResponse::UpdateMessage(
                        serenity::CreateInteractionResponseMessage::new()
                            .content("🔒 Closing the ticket...")
                            .components(Vec::new()),
                    ),
                )
                .await?;
            let ticket = data.tickets.get(channel_id.get());
            if let Some(outcome) = data
                .tickets
                .transition(channel_id.get(), |ticket| ticket.confirm_close())
            {
                outcome?;
            }
            archive_and_delete(ctx, data, guild_id, channel_id, ticket, &interaction.user).await
        }
        Some(press) => {
            cancel_pending_close(data, channel_id);
            press
                .create_response(
                    ctx,
                    serenity::CreateInteractionResponse::UpdateMessage(
                        serenity::CreateInteractionResponseMessage::new()
                            .content("Close cancelled.")
                            .components(Vec::new()),
                    ),
                )
                .await?;
            Ok(())
        }
        None => {
            cancel_pending_close(data, channel_id);
            if let Err(e) = interaction
                .edit_response(
                    ctx,
                    serenity::EditInteractionResponse::new()
                        .content("⏰ Close request timed out.")
                        .components(Vec::new()),
                )
                .await
            {
                debug!("Could not expire close prompt: {e}");
            }
            Ok(())
        }
    }
}

fn cancel_pending_close(data: &BotData, channel_id: serenity::ChannelId) {
    if let Some(Err(e)) = data
        .tickets
        .transition(channel_id.get(), |ticket| ticket.cancel_close())
    {
        debug!("Cancel close on {channel_id} was a no-op: {e}");
    }
}

/// Every message in the channel as transcript lines.
async fn collect_transcript(
    ctx: &serenity::Context,
    channel_id: serenity::ChannelId,
) -> Vec<TranscriptLine> {
    let mut lines = Vec::new();
    let mut messages = channel_id.messages_iter(ctx).boxed();
    while let Some(message) = messages.next().await {
        let message = match message {
            Ok(message) => message,
            Err(e) => {
                warn!("Transcript of {channel_id} is incomplete: {e}");
                break;
            }
        };

        let mut content = message.content.clone();
        for attachment in &message.attachments {
            if !content.is_empty() {
                content.push(' ');
            }
            content.push_str(&attachment.url);
        }
        lines.push(TranscriptLine {
            timestamp: DateTime::from_timestamp(message.timestamp.unix_timestamp(), 0)
                .unwrap_or_default(),
            author: message.author.name.clone(),
            content,
        });
    }
    // History arrives newest first
    lines.reverse();
    lines
}

async fn archive_and_delete(
    ctx: &serenity::Context,
    data: &BotData,
    guild_id: serenity::GuildId,
    channel_id: serenity::ChannelId,
    ticket: Option<Ticket>,
    closer: &serenity::User,
) -> Result<()> {
    let channel_name = ticket.as_ref().map_or_else(
        || channel_id.to_string(),
        |t| tickets::channel_name(t.number),
    );

    let settings = tickets::get_settings(&data.database, guild_id.get()).await?;
    if let Some(logs_id) = settings.as_ref().and_then(tickets::logs_channel) {
        let rendered = transcript::render(&collect_transcript(ctx, channel_id).await);
        let attachment = serenity::CreateAttachment::bytes(
            transcript::to_bytes(&rendered),
            transcript::file_name(&channel_name),
        );

        let mut embed = serenity::CreateEmbed::new()
            .title("🔒 Ticket closed")
            .field("Ticket", channel_name.clone(), true)
            .field("Closed by", closer.mention().to_string(), true)
            .timestamp(serenity::Timestamp::now())
            .colour(serenity::Colour::RED);
        if let Some(ticket) = &ticket {
            embed = embed
                .field("Owner", format!("<@{}>", ticket.owner_id), true)
                .field(
                    CLAIMED_FIELD,
                    ticket
                        .claimant()
                        .map_or_else(|| "nobody".to_string(), |id| format!("<@{id}>")),
                    true,
                );
        }

        if let Err(e) = serenity::ChannelId::new(logs_id)
            .send_message(
                ctx,
                serenity::CreateMessage::new()
                    .embed(embed)
                    .add_file(attachment),
            )
            .await
        {
            warn!("Failed to post transcript of {channel_name} to {logs_id}: {e}");
        }
    }

    let grace = data.config.tunables.tickets.close_grace();
    channel_id
        .say(
            ctx,
            format!("🔒 This ticket will be deleted in {} seconds.", grace.as_secs()),
        )
        .await?;
    tokio::time::sleep(grace).await;

    channel_id.delete(ctx).await?;
    data.tickets.remove(channel_id.get());
    info!("Ticket {channel_name} closed by {} and deleted", closer.id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hidden_overwrite_denies_view() {
        let overwrite = to_overwrite(PlannedOverwrite {
            target: OverwriteTarget::Role(5),
            access: Access::Hidden,
        });
        assert_eq!(overwrite.deny, serenity::Permissions::VIEW_CHANNEL);
        assert!(overwrite.allow.is_empty());
        assert_eq!(
            overwrite.kind,
            serenity::PermissionOverwriteType::Role(serenity::RoleId::new(5))
        );
    }

    #[test]
    fn test_participant_can_talk_and_attach() {
        let overwrite = to_overwrite(permissions::member_grant(9));
        assert!(overwrite.allow.view_channel());
        assert!(overwrite.allow.send_messages());
        assert!(overwrite.allow.attach_files());
        assert!(!overwrite.allow.manage_channels());
        assert_eq!(
            overwrite.kind,
            serenity::PermissionOverwriteType::Member(serenity::UserId::new(9))
        );
    }

    #[test]
    fn test_rejection_is_shown_to_presser() {
        let claimed = Error::AlreadyClaimed { claimant: 100 };
        let text = format!("❌ {claimed}");

        assert_eq!(
            failure_reply(&claimed, false),
            FailureReply::Respond(text.clone())
        );
        // Raised after the ticket channel creation was deferred
        assert_eq!(failure_reply(&claimed, true), FailureReply::Followup(text));
    }

    #[test]
    fn test_internal_failure_gets_generic_notice() {
        let broken = Error::Config {
            message: "ticket category missing".to_string(),
        };
        assert!(!broken.is_rejection());

        for acknowledged in [false, true] {
            let reply = failure_reply(&broken, acknowledged);
            let (FailureReply::Respond(text) | FailureReply::Followup(text)) = &reply;
            assert_eq!(text, FAILURE_NOTICE);
            assert!(!text.contains("ticket category"), "internal details stay in the log");
            assert_eq!(matches!(reply, FailureReply::Followup(_)), acknowledged);
        }
    }
}
