//! Support tickets.
//!
//! A ticket is a private text channel under the guild's configured category. This module owns
//! the persisted parts (per-guild configuration and the sequence counter) and the pure helpers the
//! bot layer needs to open a ticket: naming, the one-open-ticket scan, and role resolution. The
//! lifecycle itself lives in [`state`], permission plans in [`permissions`] and transcript
//! rendering in [`transcript`].

use crate::{
    core::{db_id, snowflake},
    entities::{GuildSettings, TicketSettings, guild_settings, ticket_settings},
    errors::{Error, Result},
};
use sea_orm::{
    Set, TransactionTrait,
    prelude::*,
    sea_query::{Expr, OnConflict},
};
use std::fmt;

/// Permission overwrite plans for open, claim and add-member
pub mod permissions;
/// Ticket lifecycle state machine and in-memory registry
pub mod state;
/// Plain-text channel transcripts
pub mod transcript;

pub use state::{Ticket, TicketRegistry, TicketState};

/// Custom id of the type selector on the ticket panel
pub const SELECT_TYPE_ID: &str = "ticket_type_select_main";
/// Custom id of the claim button inside a ticket
pub const CLAIM_ID: &str = "claim_ticket";
/// Custom id of the add-member button inside a ticket
pub const ADD_MEMBER_ID: &str = "add_member";
/// Custom id of the close button inside a ticket
pub const CLOSE_ID: &str = "close_ticket";

const CHANNEL_PREFIX: &str = "ticket--";

/// The kinds of ticket a member can open from the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TicketKind {
    /// General question
    Inquiry,
    /// Complaint about a member or staff
    Complaint,
    /// Account verification request
    GirlVerification,
    /// Application to join staff
    StaffApplication,
}

impl TicketKind {
    /// All kinds in panel order
    pub const ALL: [Self; 4] = [
        Self::Inquiry,
        Self::Complaint,
        Self::GirlVerification,
        Self::StaffApplication,
    ];

    /// Stable value used in the select menu
    #[must_use]
    pub const fn value(self) -> &'static str {
        match self {
            Self::Inquiry => "inquiry",
            Self::Complaint => "complaint",
            Self::GirlVerification => "girl_verification",
            Self::StaffApplication => "staff_app",
        }
    }

    /// Parses a select menu value
    #[must_use]
    pub fn from_value(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.value() == value)
    }

    /// Display label
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Inquiry => "استفسار",
            Self::Complaint => "شكوى",
            Self::GirlVerification => "طلب توثيق بنات",
            Self::StaffApplication => "تقديم ادارة",
        }
    }

    /// Finds the kind whose label appears in `text` (used when rebuilding a ticket from its
    /// control message)
    #[must_use]
    pub fn from_label_in(text: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| text.contains(kind.label()))
    }

    /// Emoji shown next to the option
    #[must_use]
    pub const fn emoji(self) -> char {
        match self {
            Self::Inquiry => '❓',
            Self::Complaint => '⚠',
            Self::GirlVerification => '👸',
            Self::StaffApplication => '👮',
        }
    }

    /// Option description in the select menu
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Inquiry => "فتح تذكرة استفسار عام",
            Self::Complaint => "فتح تذكرة لتقديم شكوى",
            Self::GirlVerification => "فتح تذكرة لتوثيق حسابات البنات",
            Self::StaffApplication => "فتح تذكرة للتقديم على الرتب الإدارية",
        }
    }
}

impl fmt::Display for TicketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Values collected by `/ticket setup`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TicketSetup {
    /// Guild being configured
    pub guild_id: u64,
    /// Category for ticket channels
    pub category_id: u64,
    /// Channel for close logs and transcripts
    pub logs_channel_id: Option<u64>,
    /// General staff role
    pub staff_role_id: u64,
    /// Staff application reviewers
    pub staff_app_role_id: Option<u64>,
    /// Inquiry handlers
    pub inquiry_role_id: Option<u64>,
    /// Complaint handlers
    pub complaint_role_id: Option<u64>,
    /// Verification handlers
    pub girl_verif_role_id: Option<u64>,
}

fn optional_id(id: Option<u64>) -> Result<Option<i64>> {
    id.map(db_id).transpose()
}

/// Stores (or replaces) the ticket configuration for a guild.
pub async fn save_settings(
    db: &DatabaseConnection,
    setup: TicketSetup,
) -> Result<ticket_settings::Model> {
    let guild_id = db_id(setup.guild_id)?;

    let settings = ticket_settings::ActiveModel {
        guild_id: Set(guild_id),
        category_id: Set(db_id(setup.category_id)?),
        logs_channel_id: Set(optional_id(setup.logs_channel_id)?),
        staff_role_id: Set(db_id(setup.staff_role_id)?),
        staff_app_role_id: Set(optional_id(setup.staff_app_role_id)?),
        inquiry_role_id: Set(optional_id(setup.inquiry_role_id)?),
        complaint_role_id: Set(optional_id(setup.complaint_role_id)?),
        girl_verif_role_id: Set(optional_id(setup.girl_verif_role_id)?),
    };

    TicketSettings::insert(settings)
        .on_conflict(
            OnConflict::column(ticket_settings::Column::GuildId)
                .update_columns([
                    ticket_settings::Column::CategoryId,
                    ticket_settings::Column::LogsChannelId,
                    ticket_settings::Column::StaffRoleId,
                    ticket_settings::Column::StaffAppRoleId,
                    ticket_settings::Column::InquiryRoleId,
                    ticket_settings::Column::ComplaintRoleId,
                    ticket_settings::Column::GirlVerifRoleId,
                ])
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;

    require_settings(db, setup.guild_id).await
}

/// Ticket configuration for a guild, if it has been set up.
pub async fn get_settings(
    db: &DatabaseConnection,
    guild_id: u64,
) -> Result<Option<ticket_settings::Model>> {
    TicketSettings::find_by_id(db_id(guild_id)?)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Ticket configuration for a guild, or [`Error::TicketsNotConfigured`].
pub async fn require_settings(
    db: &DatabaseConnection,
    guild_id: u64,
) -> Result<ticket_settings::Model> {
    get_settings(db, guild_id)
        .await?
        .ok_or(Error::TicketsNotConfigured { guild_id })
}

/// Allocates the next ticket number for a guild.
///
/// The counter row is created on first use, then bumped with a single
/// `UPDATE ... SET ticket_counter = ticket_counter + 1` and read back inside the same
/// transaction, so two concurrent opens can never be handed the same number.
pub async fn next_ticket_number(db: &DatabaseConnection, guild_id: u64) -> Result<i64> {
    let id = db_id(guild_id)?;
    let txn = db.begin().await?;

    let row = guild_settings::ActiveModel {
        guild_id: Set(id),
        leveling_channel_id: Set(None),
        ticket_counter: Set(0),
    };
    GuildSettings::insert(row)
        .on_conflict(
            OnConflict::column(guild_settings::Column::GuildId)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(&txn)
        .await?;

    GuildSettings::update_many()
        .col_expr(
            guild_settings::Column::TicketCounter,
            Expr::col(guild_settings::Column::TicketCounter).add(1),
        )
        .filter(guild_settings::Column::GuildId.eq(id))
        .exec(&txn)
        .await?;

    let settings = GuildSettings::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("guild_settings {guild_id}")))?;

    txn.commit().await?;
    Ok(settings.ticket_counter)
}

/// Channel name for a ticket number, zero-padded to three digits.
#[must_use]
pub fn channel_name(number: i64) -> String {
    format!("{CHANNEL_PREFIX}{number:03}")
}

/// Ticket number encoded in a channel name created by [`channel_name`].
#[must_use]
pub fn parse_channel_name(name: &str) -> Option<i64> {
    name.strip_prefix(CHANNEL_PREFIX)?.parse().ok()
}

/// The fields of a guild channel needed to find an existing ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelSummary {
    /// Channel id
    pub id: u64,
    /// Parent category
    pub parent_id: Option<u64>,
    /// Channel topic; tickets store the owner id here
    pub topic: Option<String>,
}

/// Owner id stored in a ticket channel's topic.
#[must_use]
pub fn owner_marker(topic: Option<&str>) -> Option<u64> {
    topic?.trim().parse().ok()
}

/// Returns the open ticket channel `owner` already has in `category`, if any.
#[must_use]
pub fn find_open_ticket(channels: &[ChannelSummary], category: u64, owner: u64) -> Option<u64> {
    channels
        .iter()
        .find(|channel| {
            channel.parent_id == Some(category)
                && owner_marker(channel.topic.as_deref()) == Some(owner)
        })
        .map(|channel| channel.id)
}

/// Extracts the user id from a `<@id>` or `<@!id>` mention.
#[must_use]
pub fn parse_mention(text: &str) -> Option<u64> {
    let inner = text.trim().strip_prefix("<@")?.strip_suffix('>')?;
    inner.strip_prefix('!').unwrap_or(inner).parse().ok()
}

/// Log channel configured for ticket transcripts, if any.
#[must_use]
pub fn logs_channel(settings: &ticket_settings::Model) -> Option<u64> {
    settings.logs_channel_id.map(snowflake)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    const GUILD: u64 = 900_000_000_000_000_001;

    fn setup(guild_id: u64) -> TicketSetup {
        TicketSetup {
            guild_id,
            category_id: 10,
            logs_channel_id: Some(11),
            staff_role_id: 20,
            staff_app_role_id: Some(21),
            inquiry_role_id: None,
            complaint_role_id: Some(23),
            girl_verif_role_id: None,
        }
    }

    #[tokio::test]
    async fn test_ticket_numbers_are_contiguous_from_one() -> Result<()> {
        let db = setup_test_db().await?;

        let mut names = Vec::new();
        for _ in 0..12 {
            names.push(channel_name(next_ticket_number(&db, GUILD).await?));
        }

        assert_eq!(names[0], "ticket--001");
        assert_eq!(names[1], "ticket--002");
        assert_eq!(names[11], "ticket--012");
        Ok(())
    }

    #[tokio::test]
    async fn test_ticket_numbers_are_per_guild() -> Result<()> {
        let db = setup_test_db().await?;

        assert_eq!(next_ticket_number(&db, GUILD).await?, 1);
        assert_eq!(next_ticket_number(&db, GUILD).await?, 2);
        assert_eq!(next_ticket_number(&db, GUILD + 1).await?, 1);
        assert_eq!(next_ticket_number(&db, GUILD).await?, 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_save_settings_replaces_previous() -> Result<()> {
        let db = setup_test_db().await?;

        save_settings(&db, setup(GUILD)).await?;
        let mut updated = setup(GUILD);
        updated.category_id = 99;
        updated.logs_channel_id = None;
        let stored = save_settings(&db, updated).await?;

        assert_eq!(stored.category_id, 99);
        assert_eq!(stored.logs_channel_id, None);
        assert_eq!(stored.complaint_role_id, Some(23));
        Ok(())
    }

    #[tokio::test]
    async fn test_stored_roles_feed_permission_plans() -> Result<()> {
        let (_db, settings) = setup_with_tickets(GUILD).await?;

        let roles = permissions::TicketRoles::from_settings(&settings);
        assert_eq!(roles.for_kind(TicketKind::Complaint), Some(GUILD + 13));
        assert_eq!(roles.all().len(), 5);
        assert_eq!(logs_channel(&settings), Some(GUILD + 2));
        Ok(())
    }

    #[tokio::test]
    async fn test_require_settings_when_missing() -> Result<()> {
        let db = setup_test_db().await?;

        let result = require_settings(&db, GUILD).await;
        assert!(matches!(
            result,
            Err(Error::TicketsNotConfigured { guild_id: GUILD })
        ));
        Ok(())
    }

    #[test]
    fn test_channel_name_round_trip() {
        assert_eq!(channel_name(7), "ticket--007");
        assert_eq!(channel_name(1234), "ticket--1234");
        assert_eq!(parse_channel_name("ticket--042"), Some(42));
        assert_eq!(parse_channel_name("general"), None);
    }

    #[test]
    fn test_find_open_ticket_matches_owner_in_category() {
        let channels = vec![
            ChannelSummary {
                id: 1,
                parent_id: Some(10),
                topic: Some("555".to_string()),
            },
            ChannelSummary {
                id: 2,
                parent_id: Some(10),
                topic: Some("777".to_string()),
            },
            ChannelSummary {
                id: 3,
                parent_id: Some(99),
                topic: Some("888".to_string()),
            },
        ];

        assert_eq!(find_open_ticket(&channels, 10, 777), Some(2));
        assert_eq!(
            find_open_ticket(&channels, 10, 888),
            None,
            "channels outside the category do not count"
        );
        assert_eq!(find_open_ticket(&channels, 10, 123), None);
    }

    #[test]
    fn test_kind_values_and_labels() {
        for kind in TicketKind::ALL {
            assert_eq!(TicketKind::from_value(kind.value()), Some(kind));
        }
        assert_eq!(TicketKind::from_value("unknown"), None);
        assert_eq!(
            TicketKind::from_label_in("تذكرة جديدة: شكوى"),
            Some(TicketKind::Complaint)
        );
    }

    #[test]
    fn test_parse_mention() {
        assert_eq!(parse_mention("<@123>"), Some(123));
        assert_eq!(parse_mention("<@!456>"), Some(456));
        assert_eq!(parse_mention("@someone"), None);
        assert_eq!(parse_mention("<@&789>"), None, "role mentions are not users");
    }
}
