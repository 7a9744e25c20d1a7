//! Activity logging.
//!
//! Each listener turns one gateway event into an embed and posts it to the guild's log channel
//! for that [`LogCategory`]. Events Discord doesn't attribute (deletes, kicks, bans, timeouts,
//! role and channel changes, voice moves) go through the [`AuditCorrelator`] first; when it can't
//! find a matching audit entry the actor is shown as unknown. Listeners never fail: a log that
//! can't be posted is a warning, not an error.
//!
//! [`AuditCorrelator`]: crate::core::audit::AuditCorrelator

use crate::{
    bot::BotData,
    core::{
        audit::{self, Actor, Attribution, AuditAction, AuditRecord, AuditTrail, Subject},
        dedup::CachedMessage,
        log_channels::{self, LogCategory},
    },
    errors::Result,
};
use chrono::Utc;
use poise::serenity_prelude::{self as serenity, Mentionable};
use std::{collections::HashMap, future::Future};
use tracing::{debug, warn};

/// Longest text Discord accepts in an embed field
const FIELD_LIMIT: usize = 1024;
/// Shown for deletes the audit trail doesn't cover (authors deleting their own messages)
const UNKNOWN_DELETER: &str = "unknown (possibly the author)";

/// The guild audit trail, read through the HTTP client.
pub struct GuildAuditTrail<'a> {
    http: &'a serenity::Http,
}

impl<'a> GuildAuditTrail<'a> {
    /// Audit trail reader over `http`
    #[must_use]
    pub const fn new(http: &'a serenity::Http) -> Self {
        Self { http }
    }
}

fn serenity_action(action: AuditAction) -> serenity::audit_log::Action {
    use serenity::audit_log::{Action, ChannelAction, MemberAction, MessageAction, RoleAction};

    match action {
        AuditAction::MessageDelete => Action::Message(MessageAction::Delete),
        AuditAction::MessageBulkDelete => Action::Message(MessageAction::BulkDelete),
        AuditAction::MemberKick => Action::Member(MemberAction::Kick),
        AuditAction::MemberBanAdd => Action::Member(MemberAction::BanAdd),
        AuditAction::MemberBanRemove => Action::Member(MemberAction::BanRemove),
        AuditAction::MemberUpdate => Action::Member(MemberAction::Update),
        AuditAction::MemberRoleUpdate => Action::Member(MemberAction::RoleUpdate),
        AuditAction::MemberMove => Action::Member(MemberAction::MemberMove),
        AuditAction::MemberDisconnect => Action::Member(MemberAction::MemberDisconnect),
        AuditAction::RoleCreate => Action::Role(RoleAction::Create),
        AuditAction::RoleUpdate => Action::Role(RoleAction::Update),
        AuditAction::RoleDelete => Action::Role(RoleAction::Delete),
        AuditAction::ChannelCreate => Action::Channel(ChannelAction::Create),
        AuditAction::ChannelUpdate => Action::Channel(ChannelAction::Update),
        AuditAction::ChannelDelete => Action::Channel(ChannelAction::Delete),
    }
}

impl AuditTrail for GuildAuditTrail<'_> {
    fn latest(
        &self,
        guild_id: u64,
        action: AuditAction,
    ) -> impl Future<Output = Result<Option<AuditRecord>>> + Send {
        async move {
            let logs = serenity::GuildId::new(guild_id)
                .audit_logs(self.http, Some(serenity_action(action)), None, None, Some(1))
                .await?;

            Ok(logs.entries.into_iter().next().map(|entry| AuditRecord {
                actor_id: entry.user_id.get(),
                target_id: entry.target_id.map(|target| target.get()),
                created_at: audit::snowflake_time(entry.id.get()).unwrap_or_default(),
                reason: entry.reason,
            }))
        }
    }
}

async fn attribute(
    ctx: &serenity::Context,
    data: &BotData,
    guild_id: serenity::GuildId,
    action: AuditAction,
    subject: Subject,
) -> Attribution {
    let trail = GuildAuditTrail::new(&ctx.http);
    data.correlator
        .attribute(&trail, guild_id.get(), action, subject, Utc::now())
        .await
}

/// Posts `embed` to the guild's log channel for `category`, if there is one.
pub async fn post(
    ctx: &serenity::Context,
    data: &BotData,
    guild_id: serenity::GuildId,
    category: LogCategory,
    embed: serenity::CreateEmbed,
) {
    let channels: Vec<(u64, String)> = ctx
        .cache
        .guild(guild_id)
        .map(|guild| {
            guild
                .channels
                .values()
                .filter(|c| c.kind == serenity::ChannelType::Text)
                .map(|c| (c.id.get(), c.name.clone()))
                .collect()
        })
        .unwrap_or_default();

    let target = log_channels::resolve(
        &data.database,
        guild_id.get(),
        category,
        channels.iter().map(|(id, name)| (*id, name.as_str())),
    )
    .await;

    let channel_id = match target {
        Ok(Some(id)) => serenity::ChannelId::new(id),
        Ok(None) => {
            debug!("No {category} log channel in guild {guild_id}");
            return;
        }
        Err(e) => {
            warn!("Failed to resolve {category} log channel in guild {guild_id}: {e}");
            return;
        }
    };

    let message = serenity::CreateMessage::new().embed(embed.timestamp(serenity::Timestamp::now()));
    if let Err(e) = channel_id.send_message(ctx, message).await {
        warn!("Failed to post {category} log in {channel_id}: {e}");
    }
}

/// Shortens `text` to fit an embed field.
fn clip(text: &str) -> String {
    if text.is_empty() {
        return "*empty*".to_string();
    }
    if text.chars().count() <= FIELD_LIMIT {
        return text.to_string();
    }
    let mut clipped: String = text.chars().take(FIELD_LIMIT - 1).collect();
    clipped.push('…');
    clipped
}

fn with_reason(embed: serenity::CreateEmbed, attribution: &Attribution) -> serenity::CreateEmbed {
    match &attribution.reason {
        Some(reason) => embed.field("Reason", clip(reason), false),
        None => embed,
    }
}

/// Remembers a message so it can still be logged after it is edited or deleted.
pub fn remember_message(data: &BotData, message: &serenity::Message) {
    data.recent.remember(
        message.id.get(),
        CachedMessage {
            channel_id: message.channel_id.get(),
            author_id: message.author.id.get(),
            author_name: message.author.tag(),
            author_is_bot: message.author.bot,
            content: message.content.clone(),
        },
    );
}

/// Single message deleted.
pub async fn message_deleted(
    ctx: &serenity::Context,
    data: &BotData,
    guild_id: Option<serenity::GuildId>,
    channel_id: serenity::ChannelId,
    message_id: serenity::MessageId,
) {
    let Some(guild_id) = guild_id else {
        return;
    };
    if !data.dedup.first_delete(message_id.get()) {
        debug!("Duplicate delete of {message_id} ignored");
        return;
    }

    let cached = data.recent.take(message_id.get());
    if cached.as_ref().is_some_and(|m| m.author_is_bot) {
        return;
    }

    let (author, content, deleter) = match &cached {
        Some(message) => {
            let attribution = attribute(
                ctx,
                data,
                guild_id,
                AuditAction::MessageDelete,
                Subject::Id(message.author_id),
            )
            .await;
            (
                format!("<@{}> ({})", message.author_id, message.author_name),
                clip(&message.content),
                attribution.actor.mention_or(UNKNOWN_DELETER),
            )
        }
        None => (
            Actor::UNKNOWN.to_string(),
            "*not cached*".to_string(),
            UNKNOWN_DELETER.to_string(),
        ),
    };

    let embed = serenity::CreateEmbed::new()
        .title("🗑️ Message deleted")
        .colour(serenity::Colour::RED)
        .field("Author", author, true)
        .field("Channel", channel_id.mention().to_string(), true)
        .field("Deleted by", deleter, true)
        .field("Content", content, false);
    post(ctx, data, guild_id, LogCategory::Message, embed).await;
}

/// Bulk delete, logged as one entry.
pub async fn messages_bulk_deleted(
    ctx: &serenity::Context,
    data: &BotData,
    guild_id: Option<serenity::GuildId>,
    channel_id: serenity::ChannelId,
    message_ids: &[serenity::MessageId],
) {
    let Some(guild_id) = guild_id else {
        return;
    };
    for id in message_ids {
        data.recent.take(id.get());
    }

    let attribution = attribute(
        ctx,
        data,
        guild_id,
        AuditAction::MessageBulkDelete,
        Subject::Id(channel_id.get()),
    )
    .await;
    let embed = serenity::CreateEmbed::new()
        .title("🧹 Messages purged")
        .colour(serenity::Colour::DARK_RED)
        .description(format!(
            "**{}** messages were deleted in {}",
            message_ids.len(),
            channel_id.mention()
        ))
        .field("By", attribution.actor.to_string(), true);
    post(ctx, data, guild_id, LogCategory::Message, embed).await;
}

/// Message edited.
pub async fn message_edited(
    ctx: &serenity::Context,
    data: &BotData,
    event: &serenity::MessageUpdateEvent,
) {
    let Some(guild_id) = event.guild_id else {
        return;
    };
    // Embed-only updates carry no content
    let Some(after) = event.content.as_deref() else {
        return;
    };
    if event.author.as_ref().is_some_and(|a| a.bot) {
        return;
    }

    let before = data.recent.get(event.id.get());
    if before.as_ref().is_some_and(|m| m.author_is_bot) {
        return;
    }
    if before.as_ref().is_some_and(|m| m.content == after) {
        return;
    }
    if !data.dedup.first_edit(event.id.get(), after) {
        debug!("Duplicate edit of {} ignored", event.id);
        return;
    }

    let author_id = event
        .author
        .as_ref()
        .map(|a| a.id.get())
        .or_else(|| before.as_ref().map(|m| m.author_id));
    if let Some(mut cached) = before.clone() {
        cached.content = after.to_string();
        data.recent.remember(event.id.get(), cached);
    }

    let embed = serenity::CreateEmbed::new()
        .title("✏️ Message edited")
        .colour(serenity::Colour::ORANGE)
        .field(
            "Author",
            author_id.map_or_else(|| Actor::UNKNOWN.to_string(), |id| format!("<@{id}>")),
            true,
        )
        .field("Channel", event.channel_id.mention().to_string(), true)
        .field(
            "Before",
            before.map_or_else(|| "*not cached*".to_string(), |m| clip(&m.content)),
            false,
        )
        .field("After", clip(after), false)
        .field(
            "Jump",
            format!(
                "https://discord.com/channels/{guild_id}/{}/{}",
                event.channel_id, event.id
            ),
            false,
        );
    post(ctx, data, guild_id, LogCategory::Message, embed).await;
}

/// Roles present in `new` but not `old`, and the other way round.
fn role_diff(
    old: &[serenity::RoleId],
    new: &[serenity::RoleId],
) -> (Vec<serenity::RoleId>, Vec<serenity::RoleId>) {
    let added = new.iter().filter(|r| !old.contains(r)).copied().collect();
    let removed = old.iter().filter(|r| !new.contains(r)).copied().collect();
    (added, removed)
}

fn mention_roles(roles: &[serenity::RoleId]) -> String {
    roles
        .iter()
        .map(|r| r.mention().to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Timeout, role and nickname changes.
pub async fn member_updated(
    ctx: &serenity::Context,
    data: &BotData,
    old: Option<&serenity::Member>,
    event: &serenity::GuildMemberUpdateEvent,
) {
    // Without the previous state there is nothing to compare against
    let Some(old) = old else {
        return;
    };
    let guild_id = event.guild_id;
    let user = &event.user;

    if old.communication_disabled_until != event.communication_disabled_until {
        let attribution = attribute(
            ctx,
            data,
            guild_id,
            AuditAction::MemberUpdate,
            Subject::Id(user.id.get()),
        )
        .await;
        let active_until = event
            .communication_disabled_until
            .filter(|until| until.unix_timestamp() > Utc::now().timestamp());
        let embed = match active_until {
            Some(until) => serenity::CreateEmbed::new()
                .title("🔇 Member timed out")
                .colour(serenity::Colour::DARK_ORANGE)
                .field("Until", format!("<t:{}:f>", until.unix_timestamp()), true),
            None => serenity::CreateEmbed::new()
                .title("🔊 Timeout removed")
                .colour(serenity::Colour::DARK_GREEN),
        }
        .field("Member", user.mention().to_string(), true)
        .field("By", attribution.actor.to_string(), true);
        post(
            ctx,
            data,
            guild_id,
            LogCategory::Moderation,
            with_reason(embed, &attribution),
        )
        .await;
    }

    let (added, removed) = role_diff(&old.roles, &event.roles);
    if !added.is_empty() || !removed.is_empty() {
        let attribution = attribute(
            ctx,
            data,
            guild_id,
            AuditAction::MemberRoleUpdate,
            Subject::Id(user.id.get()),
        )
        .await;
        let mut embed = serenity::CreateEmbed::new()
            .title("🎭 Member roles changed")
            .colour(serenity::Colour::BLUE)
            .field("Member", user.mention().to_string(), true)
            .field("By", attribution.actor.to_string(), true);
        if !added.is_empty() {
            embed = embed.field("Added", mention_roles(&added), false);
        }
        if !removed.is_empty() {
            embed = embed.field("Removed", mention_roles(&removed), false);
        }
        post(ctx, data, guild_id, LogCategory::Role, embed).await;
    }

    if old.nick != event.nick {
        let embed = serenity::CreateEmbed::new()
            .title("📝 Nickname changed")
            .colour(serenity::Colour::TEAL)
            .field("Member", user.mention().to_string(), false)
            .field("Before", old.nick.as_deref().unwrap_or("*none*"), true)
            .field("After", event.nick.as_deref().unwrap_or("*none*"), true);
        post(ctx, data, guild_id, LogCategory::Server, embed).await;
    }
}

/// The parts of a voice state the voice log compares.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VoiceSnapshot {
    /// Connected channel
    pub channel: Option<u64>,
    /// Server muted
    pub mute: bool,
    /// Server deafened
    pub deaf: bool,
    /// Muted themselves
    pub self_mute: bool,
    /// Deafened themselves
    pub self_deaf: bool,
}

impl From<&serenity::VoiceState> for VoiceSnapshot {
    fn from(state: &serenity::VoiceState) -> Self {
        Self {
            channel: state.channel_id.map(serenity::ChannelId::get),
            mute: state.mute,
            deaf: state.deaf,
            self_mute: state.self_mute,
            self_deaf: state.self_deaf,
        }
    }
}

/// One thing that changed between two voice states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceChange {
    /// Connected to a channel
    Joined(u64),
    /// Disconnected (by themselves or a moderator)
    Left(u64),
    /// Switched channels
    Moved {
        /// Previous channel
        from: u64,
        /// New channel
        to: u64,
    },
    /// Server mute set or lifted
    ServerMute(bool),
    /// Server deafen set or lifted
    ServerDeaf(bool),
    /// Self mute toggled
    SelfMute(bool),
    /// Self deafen toggled
    SelfDeaf(bool),
}

/// Everything that changed from `old` to `new`. Channel changes come first; mute and deafen
/// flags are only compared while the member stays in the same channel.
#[must_use]
pub fn voice_changes(old: VoiceSnapshot, new: VoiceSnapshot) -> Vec<VoiceChange> {
    match (old.channel, new.channel) {
        (None, Some(to)) => return vec![VoiceChange::Joined(to)],
        (Some(from), None) => return vec![VoiceChange::Left(from)],
        (Some(from), Some(to)) if from != to => return vec![VoiceChange::Moved { from, to }],
        (None, None) => return Vec::new(),
        _ => {}
    }

    let mut changes = Vec::new();
    if old.mute != new.mute {
        changes.push(VoiceChange::ServerMute(new.mute));
    }
    if old.deaf != new.deaf {
        changes.push(VoiceChange::ServerDeaf(new.deaf));
    }
    if old.self_mute != new.self_mute {
        changes.push(VoiceChange::SelfMute(new.self_mute));
    }
    if old.self_deaf != new.self_deaf {
        changes.push(VoiceChange::SelfDeaf(new.self_deaf));
    }
    changes
}

/// Voice joins, leaves, moves, disconnects and mutes.
pub async fn voice_state_updated(
    ctx: &serenity::Context,
    data: &BotData,
    old: Option<&serenity::VoiceState>,
    new: &serenity::VoiceState,
) {
    let Some(guild_id) = new.guild_id else {
        return;
    };
    if new.member.as_ref().is_some_and(|m| m.user.bot) {
        return;
    }
    let user = new.user_id;
    let before = old.map(VoiceSnapshot::from).unwrap_or_default();

    for change in voice_changes(before, VoiceSnapshot::from(new)) {
        let (category, embed) = match change {
            VoiceChange::Joined(channel) => (
                LogCategory::Voice,
                serenity::CreateEmbed::new()
                    .title("🎙️ Joined voice")
                    .colour(serenity::Colour::DARK_GREEN)
                    .description(format!("{} joined <#{channel}>", user.mention())),
            ),
            VoiceChange::Left(channel) => {
                let attribution = attribute(
                    ctx,
                    data,
                    guild_id,
                    AuditAction::MemberDisconnect,
                    Subject::Untargeted,
                )
                .await;
                match attribution.actor {
                    Actor::User(moderator) => (
                        LogCategory::Moderation,
                        serenity::CreateEmbed::new()
                            .title("⛔ Disconnected from voice")
                            .colour(serenity::Colour::RED)
                            .description(format!(
                                "{} was disconnected from <#{channel}> by <@{moderator}>",
                                user.mention()
                            )),
                    ),
                    Actor::Unknown => (
                        LogCategory::Voice,
                        serenity::CreateEmbed::new()
                            .title("🔈 Left voice")
                            .colour(serenity::Colour::DARK_GREY)
                            .description(format!("{} left <#{channel}>", user.mention())),
                    ),
                }
            }
            VoiceChange::Moved { from, to } => {
                let attribution = attribute(
                    ctx,
                    data,
                    guild_id,
                    AuditAction::MemberMove,
                    Subject::Untargeted,
                )
                .await;
                let mut embed = serenity::CreateEmbed::new()
                    .title("🔀 Moved voice channel")
                    .colour(serenity::Colour::BLUE)
                    .description(format!("{}: <#{from}> ➜ <#{to}>", user.mention()));
                if let Actor::User(moderator) = attribution.actor {
                    embed = embed.field("Moved by", format!("<@{moderator}>"), true);
                }
                (LogCategory::Voice, embed)
            }
            VoiceChange::ServerMute(on) | VoiceChange::ServerDeaf(on) => {
                let attribution = attribute(
                    ctx,
                    data,
                    guild_id,
                    AuditAction::MemberUpdate,
                    Subject::Id(user.get()),
                )
                .await;
                let what = match (change, on) {
                    (VoiceChange::ServerMute(_), true) => "🔇 Server muted",
                    (VoiceChange::ServerMute(_), false) => "🔊 Server unmuted",
                    (_, true) => "🙉 Server deafened",
                    (_, false) => "👂 Server undeafened",
                };
                (
                    LogCategory::Moderation,
                    serenity::CreateEmbed::new()
                        .title(what)
                        .colour(serenity::Colour::DARK_ORANGE)
                        .field("Member", user.mention().to_string(), true)
                        .field("By", attribution.actor.to_string(), true),
                )
            }
            VoiceChange::SelfMute(on) | VoiceChange::SelfDeaf(on) => {
                let what = match (change, on) {
                    (VoiceChange::SelfMute(_), true) => "muted themselves",
                    (VoiceChange::SelfMute(_), false) => "unmuted themselves",
                    (_, true) => "deafened themselves",
                    (_, false) => "undeafened themselves",
                };
                (
                    LogCategory::Voice,
                    serenity::CreateEmbed::new()
                        .colour(serenity::Colour::LIGHT_GREY)
                        .description(format!("{} {what}", user.mention())),
                )
            }
        };
        post(ctx, data, guild_id, category, embed).await;
    }
}

/// Server name or icon changed.
pub async fn guild_updated(
    ctx: &serenity::Context,
    data: &BotData,
    old: Option<&serenity::Guild>,
    new: &serenity::PartialGuild,
) {
    let Some(old) = old else {
        return;
    };

    let mut embed = serenity::CreateEmbed::new()
        .title("🏠 Server updated")
        .colour(serenity::Colour::PURPLE);
    let mut changed = false;
    if old.name != new.name {
        embed = embed
            .field("Name before", old.name.clone(), true)
            .field("Name after", new.name.clone(), true);
        changed = true;
    }
    if old.icon != new.icon {
        embed = embed.field("Icon", "changed", false);
        if let Some(url) = new.icon_url() {
            embed = embed.thumbnail(url);
        }
        changed = true;
    }

    if changed {
        post(ctx, data, new.id, LogCategory::Server, embed).await;
    }
}

/// Member joined.
pub async fn member_joined(ctx: &serenity::Context, data: &BotData, member: &serenity::Member) {
    let embed = serenity::CreateEmbed::new()
        .title("📥 Member joined")
        .colour(serenity::Colour::DARK_GREEN)
        .thumbnail(member.face())
        .field("Member", member.user.mention().to_string(), true)
        .field(
            "Account created",
            format!("<t:{}:R>", member.user.created_at().unix_timestamp()),
            true,
        );
    post(ctx, data, member.guild_id, LogCategory::Server, embed).await;
}

/// Member left or was kicked.
pub async fn member_left(
    ctx: &serenity::Context,
    data: &BotData,
    guild_id: serenity::GuildId,
    user: &serenity::User,
) {
    let attribution = attribute(
        ctx,
        data,
        guild_id,
        AuditAction::MemberKick,
        Subject::Id(user.id.get()),
    )
    .await;

    match attribution.actor {
        Actor::User(moderator) => {
            let embed = serenity::CreateEmbed::new()
                .title("👢 Member kicked")
                .colour(serenity::Colour::ORANGE)
                .field("Member", format!("{} ({})", user.mention(), user.tag()), true)
                .field("By", format!("<@{moderator}>"), true);
            post(
                ctx,
                data,
                guild_id,
                LogCategory::Moderation,
                with_reason(embed, &attribution),
            )
            .await;
        }
        Actor::Unknown => {
            let embed = serenity::CreateEmbed::new()
                .title("📤 Member left")
                .colour(serenity::Colour::DARK_GREY)
                .field("Member", format!("{} ({})", user.mention(), user.tag()), true);
            post(ctx, data, guild_id, LogCategory::Server, embed).await;
        }
    }
}

/// Ban added or lifted.
pub async fn ban_changed(
    ctx: &serenity::Context,
    data: &BotData,
    guild_id: serenity::GuildId,
    user: &serenity::User,
    banned: bool,
) {
    let action = if banned {
        AuditAction::MemberBanAdd
    } else {
        AuditAction::MemberBanRemove
    };
    let attribution = attribute(ctx, data, guild_id, action, Subject::Id(user.id.get())).await;

    let embed = serenity::CreateEmbed::new()
        .title(if banned { "⛔ Member banned" } else { "✅ Member unbanned" })
        .colour(if banned {
            serenity::Colour::DARK_RED
        } else {
            serenity::Colour::DARK_GREEN
        })
        .field("Member", format!("{} ({})", user.mention(), user.tag()), true)
        .field("By", attribution.actor.to_string(), true);
    post(
        ctx,
        data,
        guild_id,
        LogCategory::Moderation,
        with_reason(embed, &attribution),
    )
    .await;
}

/// Role created.
pub async fn role_created(ctx: &serenity::Context, data: &BotData, role: &serenity::Role) {
    let attribution = attribute(
        ctx,
        data,
        role.guild_id,
        AuditAction::RoleCreate,
        Subject::Id(role.id.get()),
    )
    .await;
    let embed = serenity::CreateEmbed::new()
        .title("➕ Role created")
        .colour(role.colour)
        .field("Role", role.mention().to_string(), true)
        .field("By", attribution.actor.to_string(), true);
    post(ctx, data, role.guild_id, LogCategory::Role, embed).await;
}

/// Role deleted.
pub async fn role_deleted(
    ctx: &serenity::Context,
    data: &BotData,
    guild_id: serenity::GuildId,
    role_id: serenity::RoleId,
    role: Option<&serenity::Role>,
) {
    let attribution = attribute(
        ctx,
        data,
        guild_id,
        AuditAction::RoleDelete,
        Subject::Id(role_id.get()),
    )
    .await;
    let name = role.map_or_else(|| role_id.to_string(), |r| r.name.clone());
    let embed = serenity::CreateEmbed::new()
        .title("➖ Role deleted")
        .colour(serenity::Colour::RED)
        .field("Role", name, true)
        .field("By", attribution.actor.to_string(), true);
    post(ctx, data, guild_id, LogCategory::Role, embed).await;
}

/// Role name, colour or permissions changed.
pub async fn role_updated(
    ctx: &serenity::Context,
    data: &BotData,
    old: Option<&serenity::Role>,
    new: &serenity::Role,
) {
    let Some(old) = old else {
        return;
    };

    let mut changes = Vec::new();
    if old.name != new.name {
        changes.push(("Name", format!("{} ➜ {}", old.name, new.name)));
    }
    if old.colour != new.colour {
        changes.push((
            "Colour",
            format!("#{} ➜ #{}", old.colour.hex(), new.colour.hex()),
        ));
    }
    if old.permissions != new.permissions {
        let granted = new.permissions - old.permissions;
        let revoked = old.permissions - new.permissions;
        changes.push((
            "Permissions",
            clip(&format!(
                "granted: {}\nrevoked: {}",
                granted.get_permission_names().join(", "),
                revoked.get_permission_names().join(", ")
            )),
        ));
    }
    // Position shuffles and other churn are not logged
    if changes.is_empty() {
        return;
    }

    let attribution = attribute(
        ctx,
        data,
        new.guild_id,
        AuditAction::RoleUpdate,
        Subject::Id(new.id.get()),
    )
    .await;
    let mut embed = serenity::CreateEmbed::new()
        .title("🛠️ Role updated")
        .colour(new.colour)
        .field("Role", new.mention().to_string(), true)
        .field("By", attribution.actor.to_string(), true);
    for (name, value) in changes {
        embed = embed.field(name, value, false);
    }
    post(ctx, data, new.guild_id, LogCategory::Role, embed).await;
}

/// Channel created or deleted.
pub async fn channel_created_or_deleted(
    ctx: &serenity::Context,
    data: &BotData,
    channel: &serenity::GuildChannel,
    created: bool,
) {
    let action = if created {
        AuditAction::ChannelCreate
    } else {
        AuditAction::ChannelDelete
    };
    let attribution = attribute(
        ctx,
        data,
        channel.guild_id,
        action,
        Subject::Id(channel.id.get()),
    )
    .await;

    let embed = serenity::CreateEmbed::new()
        .title(if created { "📁 Channel created" } else { "🗑️ Channel deleted" })
        .colour(if created {
            serenity::Colour::DARK_GREEN
        } else {
            serenity::Colour::RED
        })
        .field("Channel", format!("#{}", channel.name), true)
        .field("By", attribution.actor.to_string(), true);
    post(ctx, data, channel.guild_id, LogCategory::Room, embed).await;
}

/// Channel renamed or moved to another category.
pub async fn channel_updated(
    ctx: &serenity::Context,
    data: &BotData,
    old: Option<&serenity::GuildChannel>,
    new: &serenity::GuildChannel,
) {
    let Some(old) = old else {
        return;
    };

    let mut changes = Vec::new();
    if old.name != new.name {
        changes.push(("Name", format!("#{} ➜ #{}", old.name, new.name)));
    }
    if old.parent_id != new.parent_id {
        let show = |parent: Option<serenity::ChannelId>| {
            parent.map_or_else(|| "none".to_string(), |id| id.mention().to_string())
        };
        changes.push((
            "Category",
            format!("{} ➜ {}", show(old.parent_id), show(new.parent_id)),
        ));
    }
    if changes.is_empty() {
        return;
    }

    let attribution = attribute(
        ctx,
        data,
        new.guild_id,
        AuditAction::ChannelUpdate,
        Subject::Id(new.id.get()),
    )
    .await;
    let mut embed = serenity::CreateEmbed::new()
        .title("🛠️ Channel updated")
        .colour(serenity::Colour::BLUE)
        .field("Channel", new.mention().to_string(), true)
        .field("By", attribution.actor.to_string(), true);
    for (name, value) in changes {
        embed = embed.field(name, value, false);
    }
    post(ctx, data, new.guild_id, LogCategory::Room, embed).await;
}

/// Invite created.
pub async fn invite_created(
    ctx: &serenity::Context,
    data: &BotData,
    event: &serenity::InviteCreateEvent,
) {
    let Some(guild_id) = event.guild_id else {
        return;
    };
    let embed = serenity::CreateEmbed::new()
        .title("🔗 Invite created")
        .colour(serenity::Colour::DARK_TEAL)
        .field("Code", event.code.clone(), true)
        .field("Channel", event.channel_id.mention().to_string(), true)
        .field(
            "By",
            event
                .inviter
                .as_ref()
                .map_or_else(|| Actor::UNKNOWN.to_string(), |u| u.mention().to_string()),
            true,
        );
    post(ctx, data, guild_id, LogCategory::Server, embed).await;
}

/// Invite deleted.
pub async fn invite_deleted(
    ctx: &serenity::Context,
    data: &BotData,
    event: &serenity::InviteDeleteEvent,
) {
    let Some(guild_id) = event.guild_id else {
        return;
    };
    let embed = serenity::CreateEmbed::new()
        .title("✂️ Invite deleted")
        .colour(serenity::Colour::DARK_GREY)
        .field("Code", event.code.clone(), true)
        .field("Channel", event.channel_id.mention().to_string(), true);
    post(ctx, data, guild_id, LogCategory::Server, embed).await;
}

/// Webhooks of a channel changed.
pub async fn webhooks_updated(
    ctx: &serenity::Context,
    data: &BotData,
    guild_id: serenity::GuildId,
    channel_id: serenity::ChannelId,
) {
    let embed = serenity::CreateEmbed::new()
        .title("🪝 Webhooks updated")
        .colour(serenity::Colour::DARK_PURPLE)
        .description(format!("Webhooks changed in {}", channel_id.mention()));
    post(ctx, data, guild_id, LogCategory::Server, embed).await;
}

/// Custom emoji list changed.
pub async fn emojis_updated(
    ctx: &serenity::Context,
    data: &BotData,
    guild_id: serenity::GuildId,
    emojis: &HashMap<serenity::EmojiId, serenity::Emoji>,
) {
    let embed = serenity::CreateEmbed::new()
        .title("😀 Emojis updated")
        .colour(serenity::Colour::GOLD)
        .description(format!("The server now has **{}** custom emojis", emojis.len()));
    post(ctx, data, guild_id, LogCategory::Server, embed).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn in_channel(channel: u64) -> VoiceSnapshot {
        VoiceSnapshot {
            channel: Some(channel),
            ..VoiceSnapshot::default()
        }
    }

    #[test]
    fn test_voice_channel_changes() {
        assert_eq!(
            voice_changes(VoiceSnapshot::default(), in_channel(1)),
            vec![VoiceChange::Joined(1)]
        );
        assert_eq!(
            voice_changes(in_channel(1), VoiceSnapshot::default()),
            vec![VoiceChange::Left(1)]
        );
        assert_eq!(
            voice_changes(in_channel(1), in_channel(2)),
            vec![VoiceChange::Moved { from: 1, to: 2 }]
        );
    }

    #[test]
    fn test_voice_flag_changes_in_same_channel() {
        let before = in_channel(1);
        let after = VoiceSnapshot {
            mute: true,
            self_deaf: true,
            ..before
        };
        assert_eq!(
            voice_changes(before, after),
            vec![VoiceChange::ServerMute(true), VoiceChange::SelfDeaf(true)]
        );
        assert!(voice_changes(before, before).is_empty());
    }

    #[test]
    fn test_move_hides_flag_changes() {
        let before = in_channel(1);
        let after = VoiceSnapshot {
            channel: Some(2),
            self_mute: true,
            ..before
        };
        assert_eq!(
            voice_changes(before, after),
            vec![VoiceChange::Moved { from: 1, to: 2 }]
        );
    }

    #[test]
    fn test_role_diff() {
        let old = [serenity::RoleId::new(1), serenity::RoleId::new(2)];
        let new = [serenity::RoleId::new(2), serenity::RoleId::new(3)];
        let (added, removed) = role_diff(&old, &new);
        assert_eq!(added, vec![serenity::RoleId::new(3)]);
        assert_eq!(removed, vec![serenity::RoleId::new(1)]);
    }

    #[test]
    fn test_clip() {
        assert_eq!(clip(""), "*empty*");
        assert_eq!(clip("short"), "short");
        let long = "ب".repeat(FIELD_LIMIT + 10);
        let clipped = clip(&long);
        assert_eq!(clipped.chars().count(), FIELD_LIMIT);
        assert!(clipped.ends_with('…'));
    }
}
