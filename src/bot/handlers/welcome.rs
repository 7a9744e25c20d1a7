//! Welcome message for new members.

use poise::serenity_prelude::{self as serenity, Mentionable};
use tracing::{debug, warn};

/// Channel names that receive welcome messages, in order of preference
pub const WELCOME_CHANNELS: [&str; 3] = ["welcome", "ترحيب", "general"];

/// Picks the welcome channel from `(id, name)` pairs.
#[must_use]
pub fn welcome_channel<'a, I>(channels: I) -> Option<u64>
where
    I: IntoIterator<Item = (u64, &'a str)>,
{
    let channels: Vec<(u64, &str)> = channels.into_iter().collect();
    WELCOME_CHANNELS.iter().find_map(|wanted| {
        channels
            .iter()
            .find(|(_, name)| name == wanted)
            .map(|(id, _)| *id)
    })
}

/// Greets `member` in the guild's welcome channel, if it has one.
pub async fn greet(ctx: &serenity::Context, member: &serenity::Member) {
    let found = ctx.cache.guild(member.guild_id).map(|guild| {
        let channel = welcome_channel(
            guild
                .channels
                .values()
                .filter(|c| c.kind == serenity::ChannelType::Text)
                .map(|c| (c.id.get(), c.name.as_str())),
        );
        (channel, guild.name.clone(), guild.member_count)
    });
    let Some((Some(channel_id), guild_name, member_count)) = found else {
        debug!("No welcome channel in guild {}", member.guild_id);
        return;
    };

    let embed = serenity::CreateEmbed::new()
        .title(format!("Welcome to {guild_name}!"))
        .description(format!(
            "Hey {}, glad to have you here! 🎉\nYou are member **#{member_count}**.",
            member.mention()
        ))
        .thumbnail(member.face())
        .colour(serenity::Colour::BLURPLE);

    if let Err(e) = serenity::ChannelId::new(channel_id)
        .send_message(ctx, serenity::CreateMessage::new().embed(embed))
        .await
    {
        warn!("Failed to welcome {} in {channel_id}: {e}", member.user.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_welcome_channel_preference() {
        let channels = [(1, "general"), (2, "ترحيب"), (3, "chat")];
        assert_eq!(welcome_channel(channels), Some(2));
        assert_eq!(welcome_channel([(1, "general")]), Some(1));
        assert_eq!(welcome_channel([(1, "chat")]), None);
    }
}
