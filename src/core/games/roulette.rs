//! Elimination roulette.
//!
//! Players take seats in a lobby. When registration closes the lobby becomes a game if enough
//! seats are taken; each round a random spinner picks someone to eliminate (or, if they take too
//! long, a random other player is eliminated) until one player remains.

use rand::Rng;
use std::{collections::BTreeMap, time::Duration};

/// Number of seats in the lobby
pub const SEATS: u8 = 20;
/// Fewest players needed to start
pub const MIN_PLAYERS: usize = 3;
/// How long the lobby stays open for seating
pub const LOBBY_DURATION: Duration = Duration::from_secs(65);

/// A seated player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    /// Discord user id
    pub id: u64,
    /// Name shown on the seat and in the elimination menu
    pub name: String,
}

/// Why a seat could not be taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SeatError {
    /// The player already holds a seat
    #[error("You already have a seat")]
    AlreadySeated,
    /// Someone else holds the seat
    #[error("That seat is taken")]
    SeatTaken,
    /// Seat number outside 1..=20
    #[error("No such seat")]
    NoSuchSeat,
}

/// Registration phase.
#[derive(Debug, Clone, Default)]
pub struct RouletteLobby {
    seats: BTreeMap<u8, Player>,
}

impl RouletteLobby {
    /// Empty lobby
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seats `player` at `seat` (1-based).
    pub fn take_seat(&mut self, seat: u8, player: Player) -> Result<(), SeatError> {
        if !(1..=SEATS).contains(&seat) {
            return Err(SeatError::NoSuchSeat);
        }
        if self.seats.values().any(|seated| seated.id == player.id) {
            return Err(SeatError::AlreadySeated);
        }
        if self.seats.contains_key(&seat) {
            return Err(SeatError::SeatTaken);
        }
        self.seats.insert(seat, player);
        Ok(())
    }

    /// Who sits at `seat`
    #[must_use]
    pub fn holder(&self, seat: u8) -> Option<&Player> {
        self.seats.get(&seat)
    }

    /// Number of seated players
    #[must_use]
    pub fn player_count(&self) -> usize {
        self.seats.len()
    }

    /// Ends registration. Returns `None` (game cancelled) below [`MIN_PLAYERS`].
    #[must_use]
    pub fn close(self) -> Option<RouletteGame> {
        if self.seats.len() < MIN_PLAYERS {
            return None;
        }
        Some(RouletteGame {
            players: self.seats.into_values().collect(),
        })
    }
}

/// Why an elimination was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum EliminationError {
    /// The spinner tried to eliminate themselves
    #[error("You cannot eliminate yourself")]
    SelfElimination,
    /// Target is not in the game
    #[error("That player is not in the game")]
    NotPlaying,
}

/// Elimination phase.
#[derive(Debug, Clone)]
pub struct RouletteGame {
    players: Vec<Player>,
}

impl RouletteGame {
    /// Players still in
    #[must_use]
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    /// Winner once a single player remains
    #[must_use]
    pub fn winner(&self) -> Option<&Player> {
        match self.players.as_slice() {
            [winner] => Some(winner),
            _ => None,
        }
    }

    /// Picks the player who chooses this round
    pub fn spin<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Player> {
        if self.players.len() < 2 {
            return None;
        }
        Some(self.players[rng.random_range(0..self.players.len())].clone())
    }

    /// Everyone except `spinner`
    #[must_use]
    pub fn targets(&self, spinner: u64) -> Vec<&Player> {
        self.players.iter().filter(|p| p.id != spinner).collect()
    }

    /// Removes `target`, chosen by `spinner`.
    pub fn eliminate(&mut self, spinner: u64, target: u64) -> Result<Player, EliminationError> {
        if spinner == target {
            return Err(EliminationError::SelfElimination);
        }
        let index = self
            .players
            .iter()
            .position(|p| p.id == target)
            .ok_or(EliminationError::NotPlaying)?;
        Ok(self.players.remove(index))
    }

    /// Removes a random player other than `spinner` (the spinner ran out of time).
    pub fn eliminate_random<R: Rng + ?Sized>(&mut self, spinner: u64, rng: &mut R) -> Option<Player> {
        let candidates: Vec<u64> = self.targets(spinner).iter().map(|p| p.id).collect();
        if candidates.is_empty() {
            return None;
        }
        let target = candidates[rng.random_range(0..candidates.len())];
        self.eliminate(spinner, target).ok()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    fn player(id: u64) -> Player {
        Player {
            id,
            name: format!("player{id}"),
        }
    }

    fn lobby_with(count: u64) -> RouletteLobby {
        let mut lobby = RouletteLobby::new();
        for id in 1..=count {
            let seat = u8::try_from(id).unwrap();
            lobby.take_seat(seat, player(id)).unwrap();
        }
        lobby
    }

    #[test]
    fn test_lobby_stays_open_longer_than_a_minute() {
        assert_eq!(LOBBY_DURATION, Duration::from_secs(65));
    }

    #[test]
    fn test_seating_rules() {
        let mut lobby = RouletteLobby::new();
        assert_eq!(lobby.take_seat(1, player(1)), Ok(()));
        assert_eq!(lobby.take_seat(2, player(1)), Err(SeatError::AlreadySeated));
        assert_eq!(lobby.take_seat(1, player(2)), Err(SeatError::SeatTaken));
        assert_eq!(lobby.take_seat(0, player(2)), Err(SeatError::NoSuchSeat));
        assert_eq!(lobby.take_seat(21, player(2)), Err(SeatError::NoSuchSeat));
        assert_eq!(lobby.holder(1).map(|p| p.id), Some(1));
    }

    #[test]
    fn test_lobby_below_minimum_is_cancelled() {
        assert!(lobby_with(2).close().is_none());
        assert!(lobby_with(3).close().is_some());
    }

    #[test]
    fn test_game_runs_to_single_winner() {
        let mut rng = rand::rng();
        let mut game = lobby_with(6).close().unwrap();

        let mut rounds = 0;
        while game.winner().is_none() {
            let spinner = game.spin(&mut rng).unwrap();
            let eliminated = game.eliminate_random(spinner.id, &mut rng).unwrap();
            assert_ne!(eliminated.id, spinner.id, "spinner never eliminates themselves");
            rounds += 1;
        }

        assert_eq!(rounds, 5);
        assert!(game.spin(&mut rng).is_none());
    }

    #[test]
    fn test_eliminate_validation() {
        let mut game = lobby_with(3).close().unwrap();
        assert_eq!(game.eliminate(1, 1), Err(EliminationError::SelfElimination));
        assert_eq!(game.eliminate(1, 99), Err(EliminationError::NotPlaying));
        assert_eq!(game.eliminate(1, 2).map(|p| p.id), Ok(2));
        assert_eq!(game.targets(1).len(), 1);
    }
}
