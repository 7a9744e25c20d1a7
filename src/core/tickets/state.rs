//! Ticket lifecycle.
//!
//! `NONE -> OPEN -> CLAIMED -> CLOSING -> DELETED`. Add-member is accepted while open or
//! claimed. A close request moves the ticket to `CLOSING`; confirming deletes it, cancelling (or
//! letting the confirmation time out) puts it back where it was. The state a cancelled close
//! returns to is derived from the claimant, so a claim that lands while a close is pending is
//! kept.
//!
//! Tickets are held in a [`TicketRegistry`] keyed by channel id. The registry is only a cache of
//! what the channel itself records (owner in the topic, claimant on the control message), so an
//! entry that is missing after a restart or an eviction is rebuilt with [`Ticket::from_channel`].

use super::{TicketKind, owner_marker, parse_channel_name};
use crate::errors::{Error, Result};
use std::{
    collections::HashMap,
    fmt,
    sync::{Mutex, PoisonError},
};

/// Where a ticket is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketState {
    /// No ticket exists for the channel
    None,
    /// Waiting for staff
    Open,
    /// A staff member has taken it
    Claimed,
    /// Close requested, waiting for confirmation
    Closing,
    /// Channel deleted
    Deleted,
}

impl fmt::Display for TicketState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::None => "not open",
            Self::Open => "open",
            Self::Claimed => "claimed",
            Self::Closing => "being closed",
            Self::Deleted => "deleted",
        };
        f.write_str(text)
    }
}

/// One support ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    /// Channel backing the ticket
    pub channel_id: u64,
    /// Member who opened it
    pub owner_id: u64,
    /// Ticket type, when known
    pub kind: Option<TicketKind>,
    /// Per-guild sequence number
    pub number: i64,
    claimant: Option<u64>,
    state: TicketState,
}

impl Ticket {
    /// A freshly opened ticket
    #[must_use]
    pub const fn open(channel_id: u64, owner_id: u64, kind: TicketKind, number: i64) -> Self {
        Self {
            channel_id,
            owner_id,
            kind: Some(kind),
            number,
            claimant: None,
            state: TicketState::Open,
        }
    }

    /// Rebuilds a ticket from what its channel records.
    ///
    /// Returns `None` when the channel is not a ticket (name or topic marker missing).
    #[must_use]
    pub fn from_channel(
        channel_id: u64,
        name: &str,
        topic: Option<&str>,
        kind: Option<TicketKind>,
        claimant: Option<u64>,
    ) -> Option<Self> {
        let number = parse_channel_name(name)?;
        let owner_id = owner_marker(topic)?;
        Some(Self {
            channel_id,
            owner_id,
            kind,
            number,
            claimant,
            state: if claimant.is_some() {
                TicketState::Claimed
            } else {
                TicketState::Open
            },
        })
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> TicketState {
        self.state
    }

    /// Staff member who claimed the ticket
    #[must_use]
    pub const fn claimant(&self) -> Option<u64> {
        self.claimant
    }

    const fn settled_state(&self) -> TicketState {
        if self.claimant.is_some() {
            TicketState::Claimed
        } else {
            TicketState::Open
        }
    }

    const fn invalid(&self, action: &'static str) -> Error {
        Error::InvalidTransition {
            from: self.state,
            action,
        }
    }

    /// Records `staff_id` as the claimant.
    ///
    /// The claimant is immutable once set: a second claim fails with
    /// [`Error::AlreadyClaimed`] and leaves the ticket untouched.
    pub fn claim(&mut self, staff_id: u64) -> Result<()> {
        if let Some(claimant) = self.claimant {
            return Err(Error::AlreadyClaimed { claimant });
        }
        match self.state {
            TicketState::Open => {
                self.claimant = Some(staff_id);
                self.state = TicketState::Claimed;
                Ok(())
            }
            TicketState::Closing => {
                // Stays in Closing; a cancelled close now returns to Claimed
                self.claimant = Some(staff_id);
                Ok(())
            }
            TicketState::None | TicketState::Claimed | TicketState::Deleted => {
                Err(self.invalid("claim"))
            }
        }
    }

    /// Checks that members can currently be added.
    pub const fn ensure_accepts_members(&self) -> Result<()> {
        match self.state {
            TicketState::Open | TicketState::Claimed => Ok(()),
            _ => Err(self.invalid("add a member to")),
        }
    }

    /// Moves the ticket to `CLOSING`.
    pub const fn request_close(&mut self) -> Result<()> {
        match self.state {
            TicketState::Open | TicketState::Claimed => {
                self.state = TicketState::Closing;
                Ok(())
            }
            _ => Err(self.invalid("close")),
        }
    }

    /// Abandons a pending close, returning to open or claimed.
    pub const fn cancel_close(&mut self) -> Result<()> {
        match self.state {
            TicketState::Closing => {
                self.state = self.settled_state();
                Ok(())
            }
            _ => Err(self.invalid("cancel closing")),
        }
    }

    /// Confirms a pending close. Terminal.
    pub const fn confirm_close(&mut self) -> Result<()> {
        match self.state {
            TicketState::Closing => {
                self.state = TicketState::Deleted;
                Ok(())
            }
            _ => Err(self.invalid("confirm closing")),
        }
    }
}

/// Default number of tickets kept in memory
pub const DEFAULT_REGISTRY_CAPACITY: usize = 4096;

/// Bounded map of live tickets keyed by channel id.
#[derive(Debug)]
pub struct TicketRegistry {
    tickets: Mutex<HashMap<u64, Ticket>>,
    capacity: usize,
}

impl Default for TicketRegistry {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_REGISTRY_CAPACITY)
    }
}

impl TicketRegistry {
    /// Registry that holds at most `capacity` tickets
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            tickets: Mutex::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<u64, Ticket>> {
        // Transitions never leave a half-applied ticket behind, so a poisoned map is still valid
        self.tickets.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Frees a slot for `channel_id` if the registry is full and doesn't track it yet.
    fn make_room(&self, tickets: &mut HashMap<u64, Ticket>, channel_id: u64) {
        if tickets.len() >= self.capacity && !tickets.contains_key(&channel_id) {
            // Evicted tickets are rebuilt from their channel on next use
            if let Some(&victim) = tickets.keys().next() {
                tickets.remove(&victim);
            }
        }
    }

    /// Tracks `ticket`, evicting an arbitrary entry if the registry is full.
    pub fn insert(&self, ticket: Ticket) {
        let mut tickets = self.lock();
        self.make_room(&mut tickets, ticket.channel_id);
        tickets.insert(ticket.channel_id, ticket);
    }

    /// Inserts `ticket` unless the channel is already tracked, with the same eviction as
    /// [`Self::insert`].
    pub fn insert_if_absent(&self, ticket: Ticket) {
        let mut tickets = self.lock();
        if tickets.contains_key(&ticket.channel_id) {
            return;
        }
        self.make_room(&mut tickets, ticket.channel_id);
        tickets.insert(ticket.channel_id, ticket);
    }

    /// Snapshot of the ticket for `channel_id`
    #[must_use]
    pub fn get(&self, channel_id: u64) -> Option<Ticket> {
        self.lock().get(&channel_id).cloned()
    }

    /// Whether `channel_id` is tracked
    #[must_use]
    pub fn contains(&self, channel_id: u64) -> bool {
        self.lock().contains_key(&channel_id)
    }

    /// Applies `f` to the ticket for `channel_id`.
    ///
    /// The change is kept only if `f` succeeds. Returns `None` if the channel is not tracked.
    /// Deleted tickets are dropped from the registry.
    pub fn transition<T>(
        &self,
        channel_id: u64,
        f: impl FnOnce(&mut Ticket) -> Result<T>,
    ) -> Option<Result<T>> {
        let mut tickets = self.lock();
        let current = tickets.get(&channel_id)?;

        let mut next = current.clone();
        let outcome = f(&mut next);
        if outcome.is_ok() {
            if next.state == TicketState::Deleted {
                tickets.remove(&channel_id);
            } else {
                tickets.insert(channel_id, next);
            }
        }
        Some(outcome)
    }

    /// Stops tracking `channel_id`
    pub fn remove(&self, channel_id: u64) -> Option<Ticket> {
        self.lock().remove(&channel_id)
    }

    /// Number of tracked tickets
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether no tickets are tracked
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    const CHANNEL: u64 = 42;
    const OWNER: u64 = 7;
    const STAFF: u64 = 100;
    const OTHER_STAFF: u64 = 101;

    fn fresh() -> Ticket {
        Ticket::open(CHANNEL, OWNER, TicketKind::Inquiry, 1)
    }

    #[test]
    fn test_claim_moves_to_claimed() -> Result<()> {
        let mut ticket = fresh();
        assert_eq!(ticket.state(), TicketState::Open);

        ticket.claim(STAFF)?;
        assert_eq!(ticket.state(), TicketState::Claimed);
        assert_eq!(ticket.claimant(), Some(STAFF));
        Ok(())
    }

    #[test]
    fn test_second_claim_is_rejected_without_change() -> Result<()> {
        let mut ticket = fresh();
        ticket.claim(STAFF)?;
        let before = ticket.clone();

        let result = ticket.claim(OTHER_STAFF);
        assert!(matches!(
            result,
            Err(Error::AlreadyClaimed { claimant: STAFF })
        ));
        assert_eq!(ticket, before, "failed claim must not alter the ticket");

        // Same staff member clicking again is also a no-op rejection
        assert!(ticket.claim(STAFF).is_err());
        assert_eq!(ticket.claimant(), Some(STAFF));
        Ok(())
    }

    #[test]
    fn test_add_member_allowed_while_open_or_claimed() -> Result<()> {
        let mut ticket = fresh();
        ticket.ensure_accepts_members()?;
        ticket.claim(STAFF)?;
        ticket.ensure_accepts_members()?;

        ticket.request_close()?;
        assert!(ticket.ensure_accepts_members().is_err());
        Ok(())
    }

    #[test]
    fn test_cancel_close_returns_to_prior_state() -> Result<()> {
        let mut open = fresh();
        open.request_close()?;
        assert_eq!(open.state(), TicketState::Closing);
        open.cancel_close()?;
        assert_eq!(open.state(), TicketState::Open);

        let mut claimed = fresh();
        claimed.claim(STAFF)?;
        claimed.request_close()?;
        claimed.cancel_close()?;
        assert_eq!(claimed.state(), TicketState::Claimed);
        Ok(())
    }

    #[test]
    fn test_claim_during_close_survives_cancel() -> Result<()> {
        let mut ticket = fresh();
        ticket.request_close()?;
        ticket.claim(STAFF)?;
        assert_eq!(ticket.state(), TicketState::Closing);

        ticket.cancel_close()?;
        assert_eq!(ticket.state(), TicketState::Claimed);
        assert_eq!(ticket.claimant(), Some(STAFF));
        Ok(())
    }

    #[test]
    fn test_second_close_request_rejected() -> Result<()> {
        let mut ticket = fresh();
        ticket.request_close()?;
        assert!(matches!(
            ticket.request_close(),
            Err(Error::InvalidTransition {
                from: TicketState::Closing,
                ..
            })
        ));
        Ok(())
    }

    #[test]
    fn test_confirm_is_terminal() -> Result<()> {
        let mut ticket = fresh();
        assert!(ticket.confirm_close().is_err(), "must request before confirming");

        ticket.request_close()?;
        ticket.confirm_close()?;
        assert_eq!(ticket.state(), TicketState::Deleted);

        assert!(ticket.claim(STAFF).is_err());
        assert!(ticket.request_close().is_err());
        assert!(ticket.cancel_close().is_err());
        Ok(())
    }

    #[test]
    fn test_from_channel() {
        let ticket = Ticket::from_channel(CHANNEL, "ticket--015", Some("7"), None, None).unwrap();
        assert_eq!(ticket.number, 15);
        assert_eq!(ticket.owner_id, OWNER);
        assert_eq!(ticket.state(), TicketState::Open);

        let claimed =
            Ticket::from_channel(CHANNEL, "ticket--015", Some("7"), None, Some(STAFF)).unwrap();
        assert_eq!(claimed.state(), TicketState::Claimed);

        assert!(Ticket::from_channel(CHANNEL, "general", Some("7"), None, None).is_none());
        assert!(Ticket::from_channel(CHANNEL, "ticket--001", None, None, None).is_none());
    }

    #[test]
    fn test_registry_keeps_only_successful_transitions() {
        let registry = TicketRegistry::default();
        registry.insert(fresh());

        let first = registry.transition(CHANNEL, |t| t.claim(STAFF)).unwrap();
        assert!(first.is_ok());

        let second = registry.transition(CHANNEL, |t| t.claim(OTHER_STAFF)).unwrap();
        assert!(second.is_err());
        assert_eq!(registry.get(CHANNEL).unwrap().claimant(), Some(STAFF));

        assert!(registry.transition(999, |t| t.claim(STAFF)).is_none());
    }

    #[test]
    fn test_registry_drops_deleted_tickets() {
        let registry = TicketRegistry::default();
        registry.insert(fresh());

        registry
            .transition(CHANNEL, Ticket::request_close)
            .unwrap()
            .unwrap();
        registry
            .transition(CHANNEL, Ticket::confirm_close)
            .unwrap()
            .unwrap();

        assert!(!registry.contains(CHANNEL));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_registry_is_bounded() {
        let registry = TicketRegistry::with_capacity(3);
        for channel in 0..10 {
            registry.insert(Ticket::open(channel, OWNER, TicketKind::Complaint, 1));
        }
        assert_eq!(registry.len(), 3);
        assert!(registry.contains(9), "newest ticket is always kept");
    }

    #[test]
    fn test_rebuilt_tickets_respect_capacity() {
        let registry = TicketRegistry::with_capacity(2);
        for channel in 0..6 {
            let rebuilt =
                Ticket::from_channel(channel, "ticket--001", Some("7"), None, None).unwrap();
            registry.insert_if_absent(rebuilt);
        }
        assert_eq!(registry.len(), 2);
        assert!(registry.contains(5));

        // A tracked channel is left alone and evicts nothing
        let mut claimed = Ticket::open(5, OWNER, TicketKind::Inquiry, 1);
        claimed.claim(STAFF).unwrap();
        registry.insert_if_absent(claimed);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get(5).unwrap().claimant(), None);
    }

    #[test]
    fn test_insert_if_absent_keeps_existing() {
        let registry = TicketRegistry::default();
        registry.insert(fresh());
        registry.transition(CHANNEL, |t| t.claim(STAFF));

        registry.insert_if_absent(fresh());
        assert_eq!(registry.get(CHANNEL).unwrap().claimant(), Some(STAFF));
    }
}
