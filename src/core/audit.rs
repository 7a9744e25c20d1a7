//! Audit-trail correlation.
//!
//! Discord does not say who deleted a message, kicked a member or moved someone out of a voice
//! channel. The correlator asks the guild audit trail for the most recent entry of the matching
//! action and accepts its author only if the entry targets the same subject and was created
//! within the action's tolerance window. Anything else (lookup error, timeout, no entry, stale
//! entry, different target) yields [`Actor::Unknown`], never a guess.

use crate::errors::Result;
use chrono::{DateTime, Utc};
use std::{fmt, future::Future, time::Duration};

/// Milliseconds between the Unix epoch and the Discord epoch (2015-01-01)
const DISCORD_EPOCH_MS: u64 = 1_420_070_400_000;

/// Default upper bound on a single audit-trail lookup
pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(3);

/// Audit-trail action types the correlator looks up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuditAction {
    /// Single message deleted by someone other than the author
    MessageDelete,
    /// Bulk message delete
    MessageBulkDelete,
    /// Member kicked
    MemberKick,
    /// Member banned
    MemberBanAdd,
    /// Member unbanned
    MemberBanRemove,
    /// Member edited (timeout, nickname)
    MemberUpdate,
    /// Member roles changed
    MemberRoleUpdate,
    /// Member moved between voice channels
    MemberMove,
    /// Member disconnected from voice
    MemberDisconnect,
    /// Role created
    RoleCreate,
    /// Role edited
    RoleUpdate,
    /// Role deleted
    RoleDelete,
    /// Channel created
    ChannelCreate,
    /// Channel edited
    ChannelUpdate,
    /// Channel deleted
    ChannelDelete,
}

impl AuditAction {
    /// How old a matching entry may be and still count.
    #[must_use]
    pub const fn window(self) -> Duration {
        match self {
            Self::MemberKick => Duration::from_secs(10),
            _ => Duration::from_secs(5),
        }
    }
}

/// What the event is about, for matching against the entry's target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subject {
    /// Entry must target this id (user, role or channel)
    Id(u64),
    /// Entries for this action carry no target; match on time alone
    Untargeted,
}

/// The fields of an audit-trail entry the correlator needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditRecord {
    /// Who performed the action
    pub actor_id: u64,
    /// What it was performed on
    pub target_id: Option<u64>,
    /// When the entry was created
    pub created_at: DateTime<Utc>,
    /// Reason given by the moderator
    pub reason: Option<String>,
}

/// Source of audit-trail entries. Implemented for the serenity HTTP client in the bot layer.
pub trait AuditTrail {
    /// Most recent entry of `action` in `guild_id`, if any.
    fn latest(
        &self,
        guild_id: u64,
        action: AuditAction,
    ) -> impl Future<Output = Result<Option<AuditRecord>>> + Send;
}

/// Who performed an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    /// A known user
    User(u64),
    /// Attribution failed
    Unknown,
}

impl Actor {
    /// Literal shown when attribution fails
    pub const UNKNOWN: &'static str = "unknown";

    /// Renders the actor, using `fallback` text instead of [`Self::UNKNOWN`] when unattributed.
    #[must_use]
    pub fn mention_or(&self, fallback: &str) -> String {
        match self {
            Self::User(id) => format!("<@{id}>"),
            Self::Unknown => fallback.to_string(),
        }
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User(id) => write!(f, "<@{id}>"),
            Self::Unknown => f.write_str(Self::UNKNOWN),
        }
    }
}

/// Result of a correlation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribution {
    /// Who did it
    pub actor: Actor,
    /// Reason from the matched entry
    pub reason: Option<String>,
}

impl Attribution {
    /// Unattributed result
    #[must_use]
    pub const fn unknown() -> Self {
        Self {
            actor: Actor::Unknown,
            reason: None,
        }
    }
}

/// Time encoded in a Discord snowflake.
#[must_use]
pub fn snowflake_time(id: u64) -> Option<DateTime<Utc>> {
    let millis = (id >> 22).checked_add(DISCORD_EPOCH_MS)?;
    DateTime::from_timestamp_millis(i64::try_from(millis).ok()?)
}

/// Whether `record` describes the event on `subject` that happened around `now`.
#[must_use]
pub fn matches(record: &AuditRecord, subject: Subject, now: DateTime<Utc>, window: Duration) -> bool {
    let targets_subject = match subject {
        Subject::Id(id) => record.target_id == Some(id),
        Subject::Untargeted => true,
    };

    let age_ms = (now - record.created_at).num_milliseconds().unsigned_abs();
    let within_window = u128::from(age_ms) <= window.as_millis();

    targets_subject && within_window
}

/// Attributes events to moderators through an [`AuditTrail`].
#[derive(Debug, Clone, Copy)]
pub struct AuditCorrelator {
    timeout: Duration,
}

impl Default for AuditCorrelator {
    fn default() -> Self {
        Self::with_timeout(DEFAULT_LOOKUP_TIMEOUT)
    }
}

impl AuditCorrelator {
    /// Correlator whose lookups give up after `timeout`
    #[must_use]
    pub const fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Finds who performed `action` on `subject` in `guild_id` just before `now`.
    pub async fn attribute<T: AuditTrail>(
        &self,
        trail: &T,
        guild_id: u64,
        action: AuditAction,
        subject: Subject,
        now: DateTime<Utc>,
    ) -> Attribution {
        let record = match tokio::time::timeout(self.timeout, trail.latest(guild_id, action)).await
        {
            Ok(Ok(Some(record))) => record,
            Ok(Ok(None)) => return Attribution::unknown(),
            Ok(Err(e)) => {
                tracing::warn!("Audit lookup for {action:?} in guild {guild_id} failed: {e}");
                return Attribution::unknown();
            }
            Err(_) => {
                tracing::warn!("Audit lookup for {action:?} in guild {guild_id} timed out");
                return Attribution::unknown();
            }
        };

        if matches(&record, subject, now, action.window()) {
            Attribution {
                actor: Actor::User(record.actor_id),
                reason: record.reason,
            }
        } else {
            tracing::debug!(
                "Latest {action:?} entry in guild {guild_id} does not match {subject:?}"
            );
            Attribution::unknown()
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::errors::Error;
    use chrono::TimeDelta;

    const GUILD: u64 = 1;
    const MODERATOR: u64 = 500;
    const VICTIM: u64 = 600;

    enum Fake {
        Entry(AuditRecord),
        Empty,
        Failing,
        Slow(AuditRecord),
    }

    impl AuditTrail for Fake {
        async fn latest(&self, _guild_id: u64, _action: AuditAction) -> Result<Option<AuditRecord>> {
            match self {
                Self::Entry(record) => Ok(Some(record.clone())),
                Self::Empty => Ok(None),
                Self::Failing => Err(Error::Config {
                    message: "missing VIEW_AUDIT_LOG".to_string(),
                }),
                Self::Slow(record) => {
                    tokio::time::sleep(Duration::from_millis(200)).await;
                    Ok(Some(record.clone()))
                }
            }
        }
    }

    fn record(target: Option<u64>, created_at: DateTime<Utc>) -> AuditRecord {
        AuditRecord {
            actor_id: MODERATOR,
            target_id: target,
            created_at,
            reason: Some("spam".to_string()),
        }
    }

    async fn attribute(trail: &Fake, action: AuditAction, subject: Subject, now: DateTime<Utc>) -> Actor {
        AuditCorrelator::with_timeout(Duration::from_millis(50))
            .attribute(trail, GUILD, action, subject, now)
            .await
            .actor
    }

    #[tokio::test]
    async fn test_recent_matching_entry_is_attributed() {
        let now = Utc::now();
        let trail = Fake::Entry(record(Some(VICTIM), now - TimeDelta::seconds(2)));

        let attribution = AuditCorrelator::default()
            .attribute(&trail, GUILD, AuditAction::MemberBanAdd, Subject::Id(VICTIM), now)
            .await;

        assert_eq!(attribution.actor, Actor::User(MODERATOR));
        assert_eq!(attribution.reason.as_deref(), Some("spam"));
    }

    #[tokio::test]
    async fn test_stale_entry_is_unknown() {
        let now = Utc::now();
        let trail = Fake::Entry(record(Some(VICTIM), now - TimeDelta::seconds(6)));

        let actor = attribute(&trail, AuditAction::MessageDelete, Subject::Id(VICTIM), now).await;
        assert_eq!(actor, Actor::Unknown, "an old entry must not be reused");
    }

    #[tokio::test]
    async fn test_kick_window_is_wider() {
        let now = Utc::now();
        let trail = Fake::Entry(record(Some(VICTIM), now - TimeDelta::seconds(8)));

        let kick = attribute(&trail, AuditAction::MemberKick, Subject::Id(VICTIM), now).await;
        assert_eq!(kick, Actor::User(MODERATOR));

        let ban = attribute(&trail, AuditAction::MemberBanAdd, Subject::Id(VICTIM), now).await;
        assert_eq!(ban, Actor::Unknown);
    }

    #[tokio::test]
    async fn test_different_target_is_unknown() {
        let now = Utc::now();
        let trail = Fake::Entry(record(Some(VICTIM + 1), now));

        let actor = attribute(&trail, AuditAction::MemberKick, Subject::Id(VICTIM), now).await;
        assert_eq!(actor, Actor::Unknown);
    }

    #[tokio::test]
    async fn test_untargeted_matches_on_time() {
        let now = Utc::now();
        let trail = Fake::Entry(record(None, now - TimeDelta::seconds(1)));

        let actor = attribute(&trail, AuditAction::MemberDisconnect, Subject::Untargeted, now).await;
        assert_eq!(actor, Actor::User(MODERATOR));
    }

    #[tokio::test]
    async fn test_failure_modes_are_unknown() {
        let now = Utc::now();

        let failing = attribute(&Fake::Failing, AuditAction::RoleCreate, Subject::Id(1), now).await;
        assert_eq!(failing, Actor::Unknown);

        let empty = attribute(&Fake::Empty, AuditAction::RoleCreate, Subject::Id(1), now).await;
        assert_eq!(empty, Actor::Unknown);

        let slow = Fake::Slow(record(Some(1), now));
        let timed_out = attribute(&slow, AuditAction::RoleCreate, Subject::Id(1), now).await;
        assert_eq!(timed_out, Actor::Unknown);
    }

    #[test]
    fn test_actor_display() {
        assert_eq!(Actor::User(5).to_string(), "<@5>");
        assert_eq!(Actor::Unknown.to_string(), "unknown");
        assert_eq!(Actor::Unknown.mention_or("nobody"), "nobody");
    }

    #[test]
    fn test_snowflake_time() {
        // Example id from the Discord developer docs
        let time = snowflake_time(175_928_847_299_117_063).unwrap();
        assert_eq!(time.timestamp_millis(), 1_462_015_105_796);
    }
}
