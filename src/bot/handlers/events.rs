//! Gateway event dispatch.
//!
//! Poise calls [`event_handler`] for every gateway event. Messages go through the recent-message
//! cache, the link filter and alias dispatch; component presses go to the ticket controls; the
//! rest feed the activity log.

use super::{activity_log, alias, interactions, welcome};
use crate::{
    bot::BotData,
    core::automod,
    errors::{Error, Result},
};
use poise::serenity_prelude::{self as serenity, Mentionable};
use std::time::Duration;
use tracing::{debug, info, warn};

/// How long the link warning stays up
const LINK_WARNING_TTL: Duration = Duration::from_secs(5);

/// Handles one gateway event.
#[allow(clippy::too_many_lines)]
pub async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    framework: poise::FrameworkContext<'_, BotData, Error>,
    data: &BotData,
) -> Result<()> {
    match event {
        serenity::FullEvent::Ready { data_about_bot } => {
            info!(
                "{} is connected to {} guilds",
                data_about_bot.user.name,
                data_about_bot.guilds.len()
            );
        }
        serenity::FullEvent::Message { new_message } => {
            on_message(ctx, framework, data, new_message).await?;
        }
        serenity::FullEvent::InteractionCreate { interaction } => {
            if let serenity::Interaction::Component(component) = interaction {
                interactions::handle_component(ctx, data, component).await?;
            }
        }
        serenity::FullEvent::MessageDelete {
            channel_id,
            deleted_message_id,
            guild_id,
        } => {
            activity_log::message_deleted(ctx, data, *guild_id, *channel_id, *deleted_message_id)
                .await;
        }
        serenity::FullEvent::MessageDeleteBulk {
            channel_id,
            multiple_deleted_messages_ids,
            guild_id,
        } => {
            activity_log::messages_bulk_deleted(
                ctx,
                data,
                *guild_id,
                *channel_id,
                multiple_deleted_messages_ids,
            )
            .await;
        }
        serenity::FullEvent::MessageUpdate { event, .. } => {
            activity_log::message_edited(ctx, data, event).await;
        }
        serenity::FullEvent::GuildMemberUpdate {
            old_if_available,
            event,
            ..
        } => {
            activity_log::member_updated(ctx, data, old_if_available.as_ref(), event).await;
        }
        serenity::FullEvent::GuildMemberAddition { new_member } => {
            welcome::greet(ctx, new_member).await;
            activity_log::member_joined(ctx, data, new_member).await;
        }
        serenity::FullEvent::GuildMemberRemoval { guild_id, user, .. } => {
            activity_log::member_left(ctx, data, *guild_id, user).await;
        }
        serenity::FullEvent::GuildBanAddition {
            guild_id,
            banned_user,
        } => {
            activity_log::ban_changed(ctx, data, *guild_id, banned_user, true).await;
        }
        serenity::FullEvent::GuildBanRemoval {
            guild_id,
            unbanned_user,
        } => {
            activity_log::ban_changed(ctx, data, *guild_id, unbanned_user, false).await;
        }
        serenity::FullEvent::GuildRoleCreate { new } => {
            activity_log::role_created(ctx, data, new).await;
        }
        serenity::FullEvent::GuildRoleDelete {
            guild_id,
            removed_role_id,
            removed_role_data_if_available,
        } => {
            activity_log::role_deleted(
                ctx,
                data,
                *guild_id,
                *removed_role_id,
                removed_role_data_if_available.as_ref(),
            )
            .await;
        }
        serenity::FullEvent::GuildRoleUpdate {
            old_data_if_available,
            new,
        } => {
            activity_log::role_updated(ctx, data, old_data_if_available.as_ref(), new).await;
        }
        serenity::FullEvent::ChannelCreate { channel } => {
            activity_log::channel_created_or_deleted(ctx, data, channel, true).await;
        }
        serenity::FullEvent::ChannelDelete { channel, .. } => {
            data.tickets.remove(channel.id.get());
            activity_log::channel_created_or_deleted(ctx, data, channel, false).await;
        }
        serenity::FullEvent::ChannelUpdate { old, new } => {
            activity_log::channel_updated(ctx, data, old.as_ref(), new).await;
        }
        serenity::FullEvent::VoiceStateUpdate { old, new } => {
            activity_log::voice_state_updated(ctx, data, old.as_ref(), new).await;
        }
        serenity::FullEvent::GuildUpdate {
            old_data_if_available,
            new_data,
        } => {
            activity_log::guild_updated(ctx, data, old_data_if_available.as_ref(), new_data).await;
        }
        serenity::FullEvent::InviteCreate { data: invite } => {
            activity_log::invite_created(ctx, data, invite).await;
        }
        serenity::FullEvent::InviteDelete { data: invite } => {
            activity_log::invite_deleted(ctx, data, invite).await;
        }
        serenity::FullEvent::WebhookUpdate {
            guild_id,
            belongs_to_channel_id,
        } => {
            activity_log::webhooks_updated(ctx, data, *guild_id, *belongs_to_channel_id).await;
        }
        serenity::FullEvent::GuildEmojisUpdate {
            guild_id,
            current_state,
        } => {
            activity_log::emojis_updated(ctx, data, *guild_id, current_state).await;
        }
        _ => {}
    }
    Ok(())
}

async fn on_message(
    ctx: &serenity::Context,
    framework: poise::FrameworkContext<'_, BotData, Error>,
    data: &BotData,
    message: &serenity::Message,
) -> Result<()> {
    if message.author.bot || message.guild_id.is_none() {
        return Ok(());
    }
    activity_log::remember_message(data, message);

    if automod::contains_link(&message.content) {
        // Unknown permissions (uncached member) count as exempt
        let exempt = message
            .author_permissions(ctx)
            .is_none_or(|permissions| permissions.manage_messages());
        if !exempt {
            remove_link(ctx, message).await;
            return Ok(());
        }
    }

    alias::dispatch_alias(ctx, framework, data, message).await
}

/// Deletes a message with a link and leaves a short-lived warning.
async fn remove_link(ctx: &serenity::Context, message: &serenity::Message) {
    if let Err(e) = message.delete(ctx).await {
        warn!("Failed to delete link message {}: {e}", message.id);
        return;
    }
    info!(
        "Removed link from {} in channel {}",
        message.author.id, message.channel_id
    );

    let warning = match message
        .channel_id
        .say(
            ctx,
            format!("🚫 {}, links are not allowed here.", message.author.mention()),
        )
        .await
    {
        Ok(warning) => warning,
        Err(e) => {
            warn!("Failed to post link warning: {e}");
            return;
        }
    };

    let ctx = ctx.clone();
    tokio::spawn(async move {
        tokio::time::sleep(LINK_WARNING_TTL).await;
        if let Err(e) = warning.delete(&ctx).await {
            debug!("Link warning already gone: {e}");
        }
    });
}
