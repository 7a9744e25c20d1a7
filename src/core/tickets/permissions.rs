//! Permission overwrite plans.
//!
//! Plans are plain data: who gets which access level on the ticket channel. The bot layer turns
//! each [`PlannedOverwrite`] into a serenity `PermissionOverwrite`. Roles that no longer exist in
//! the guild are filtered out with [`TicketRoles::retain_existing`] before planning, so a deleted
//! role simply drops out of the plan.

use super::TicketKind;
use crate::{core::snowflake, entities::ticket_settings};

/// Who an overwrite applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OverwriteTarget {
    /// A role (the `@everyone` role has the guild's id)
    Role(u64),
    /// A single member
    Member(u64),
}

/// Access granted by an overwrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Cannot see the channel
    Hidden,
    /// View, send messages and attach files
    Participant,
    /// Participant plus managing the channel
    Manager,
}

/// One overwrite to apply to a ticket channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedOverwrite {
    /// Role or member
    pub target: OverwriteTarget,
    /// Access level
    pub access: Access,
}

impl PlannedOverwrite {
    const fn new(target: OverwriteTarget, access: Access) -> Self {
        Self { target, access }
    }
}

/// The staff roles a guild configured for tickets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TicketRoles {
    /// General staff
    pub staff: Option<u64>,
    /// Staff application reviewers
    pub staff_app: Option<u64>,
    /// Inquiry handlers
    pub inquiry: Option<u64>,
    /// Complaint handlers
    pub complaint: Option<u64>,
    /// Verification handlers
    pub girl_verification: Option<u64>,
}

impl TicketRoles {
    /// Roles from the stored configuration
    #[must_use]
    pub fn from_settings(settings: &ticket_settings::Model) -> Self {
        Self {
            staff: Some(snowflake(settings.staff_role_id)),
            staff_app: settings.staff_app_role_id.map(snowflake),
            inquiry: settings.inquiry_role_id.map(snowflake),
            complaint: settings.complaint_role_id.map(snowflake),
            girl_verification: settings.girl_verif_role_id.map(snowflake),
        }
    }

    /// Drops roles for which `exists` returns false.
    #[must_use]
    pub fn retain_existing(self, exists: impl Fn(u64) -> bool) -> Self {
        let keep = |role: Option<u64>| role.filter(|&id| exists(id));
        Self {
            staff: keep(self.staff),
            staff_app: keep(self.staff_app),
            inquiry: keep(self.inquiry),
            complaint: keep(self.complaint),
            girl_verification: keep(self.girl_verification),
        }
    }

    /// Role that handles `kind`, falling back to the general staff role.
    #[must_use]
    pub fn for_kind(&self, kind: TicketKind) -> Option<u64> {
        let specific = match kind {
            TicketKind::Inquiry => self.inquiry,
            TicketKind::Complaint => self.complaint,
            TicketKind::GirlVerification => self.girl_verification,
            TicketKind::StaffApplication => self.staff_app,
        };
        specific.or(self.staff)
    }

    /// Every configured role, without duplicates.
    #[must_use]
    pub fn all(&self) -> Vec<u64> {
        let mut roles = Vec::with_capacity(5);
        for role in [
            self.staff,
            self.staff_app,
            self.inquiry,
            self.complaint,
            self.girl_verification,
        ]
        .into_iter()
        .flatten()
        {
            if !roles.contains(&role) {
                roles.push(role);
            }
        }
        roles
    }

    /// Whether a member may claim tickets or add members.
    ///
    /// Holders of the general or application staff role qualify; administrators always do.
    #[must_use]
    pub fn is_staff(&self, member_roles: &[u64], is_admin: bool) -> bool {
        is_admin
            || [self.staff, self.staff_app]
                .into_iter()
                .flatten()
                .any(|role| member_roles.contains(&role))
    }
}

/// Overwrites for a newly created ticket channel.
///
/// Hidden from `@everyone` and every staff role except the one handling `kind`; visible to the
/// owner, the bot and the handling role.
#[must_use]
pub fn open_plan(
    guild_id: u64,
    owner_id: u64,
    bot_id: u64,
    roles: &TicketRoles,
    kind: TicketKind,
) -> Vec<PlannedOverwrite> {
    let target = roles.for_kind(kind);

    let mut plan = vec![
        PlannedOverwrite::new(OverwriteTarget::Role(guild_id), Access::Hidden),
        PlannedOverwrite::new(OverwriteTarget::Member(owner_id), Access::Participant),
        PlannedOverwrite::new(OverwriteTarget::Member(bot_id), Access::Manager),
    ];

    for role in roles.all() {
        let access = if Some(role) == target {
            Access::Participant
        } else {
            Access::Hidden
        };
        plan.push(PlannedOverwrite::new(OverwriteTarget::Role(role), access));
    }

    plan
}

/// Overwrites applied when `claimant_id` claims a ticket: every staff role loses
/// visibility, the claimant gets explicit access.
#[must_use]
pub fn claim_plan(roles: &TicketRoles, claimant_id: u64) -> Vec<PlannedOverwrite> {
    roles
        .all()
        .into_iter()
        .map(|role| PlannedOverwrite::new(OverwriteTarget::Role(role), Access::Hidden))
        .chain(std::iter::once(PlannedOverwrite::new(
            OverwriteTarget::Member(claimant_id),
            Access::Participant,
        )))
        .collect()
}

/// Overwrite for a member added to a ticket.
#[must_use]
pub const fn member_grant(user_id: u64) -> PlannedOverwrite {
    PlannedOverwrite::new(OverwriteTarget::Member(user_id), Access::Participant)
}

#[cfg(test)]
mod tests {
    use super::*;

    const GUILD: u64 = 1;
    const OWNER: u64 = 2;
    const BOT: u64 = 3;

    fn roles() -> TicketRoles {
        TicketRoles {
            staff: Some(10),
            staff_app: Some(11),
            inquiry: Some(12),
            complaint: None,
            girl_verification: Some(14),
        }
    }

    fn access_of(plan: &[PlannedOverwrite], target: OverwriteTarget) -> Option<Access> {
        plan.iter().find(|o| o.target == target).map(|o| o.access)
    }

    #[test]
    fn test_for_kind_falls_back_to_staff() {
        let roles = roles();
        assert_eq!(roles.for_kind(TicketKind::Inquiry), Some(12));
        assert_eq!(roles.for_kind(TicketKind::Complaint), Some(10));
        assert_eq!(roles.for_kind(TicketKind::StaffApplication), Some(11));
    }

    #[test]
    fn test_open_plan_shows_only_target_role() {
        let plan = open_plan(GUILD, OWNER, BOT, &roles(), TicketKind::Inquiry);

        assert_eq!(
            access_of(&plan, OverwriteTarget::Role(GUILD)),
            Some(Access::Hidden)
        );
        assert_eq!(
            access_of(&plan, OverwriteTarget::Member(OWNER)),
            Some(Access::Participant)
        );
        assert_eq!(
            access_of(&plan, OverwriteTarget::Member(BOT)),
            Some(Access::Manager)
        );
        assert_eq!(
            access_of(&plan, OverwriteTarget::Role(12)),
            Some(Access::Participant)
        );
        for hidden in [10, 11, 14] {
            assert_eq!(
                access_of(&plan, OverwriteTarget::Role(hidden)),
                Some(Access::Hidden),
                "role {hidden} should be hidden"
            );
        }
    }

    #[test]
    fn test_open_plan_with_fallback_role() {
        let plan = open_plan(GUILD, OWNER, BOT, &roles(), TicketKind::Complaint);
        assert_eq!(
            access_of(&plan, OverwriteTarget::Role(10)),
            Some(Access::Participant)
        );
    }

    #[test]
    fn test_missing_roles_are_skipped() {
        let roles = roles().retain_existing(|id| id != 12 && id != 10);
        assert_eq!(roles.for_kind(TicketKind::Inquiry), None);

        let plan = open_plan(GUILD, OWNER, BOT, &roles, TicketKind::Inquiry);
        assert!(access_of(&plan, OverwriteTarget::Role(12)).is_none());
        assert!(access_of(&plan, OverwriteTarget::Role(10)).is_none());
        assert_eq!(
            access_of(&plan, OverwriteTarget::Member(OWNER)),
            Some(Access::Participant),
            "owner access survives missing roles"
        );
    }

    #[test]
    fn test_claim_plan_hides_all_staff() {
        let plan = claim_plan(&roles(), 50);

        for role in [10, 11, 12, 14] {
            assert_eq!(
                access_of(&plan, OverwriteTarget::Role(role)),
                Some(Access::Hidden)
            );
        }
        assert_eq!(
            access_of(&plan, OverwriteTarget::Member(50)),
            Some(Access::Participant)
        );
    }

    #[test]
    fn test_is_staff() {
        let roles = roles();
        assert!(roles.is_staff(&[10], false));
        assert!(roles.is_staff(&[99, 11], false));
        assert!(
            !roles.is_staff(&[12], false),
            "intake roles alone cannot claim"
        );
        assert!(roles.is_staff(&[], true));
    }

    #[test]
    fn test_all_deduplicates() {
        let roles = TicketRoles {
            staff: Some(10),
            staff_app: Some(10),
            ..TicketRoles::default()
        };
        assert_eq!(roles.all(), vec![10]);
    }
}
