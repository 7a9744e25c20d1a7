//! Chat games.
//!
//! The one-shot games (rock-paper-scissors, coin, dice, slots, math, fast typing, number
//! guessing) live here as small pure functions over an `Rng`. The multi-step games keep their
//! state in explicit objects: [`tictactoe::TicTacToe`] and the [`roulette`] lobby and rounds.

use rand::{Rng, seq::IndexedRandom};
use std::{cmp::Ordering, fmt};

/// Elimination roulette
pub mod roulette;
/// Two-player tic-tac-toe
pub mod tictactoe;

/// A rock-paper-scissors hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hand {
    /// Rock
    Rock,
    /// Paper
    Paper,
    /// Scissors
    Scissors,
}

impl Hand {
    /// All hands
    pub const ALL: [Self; 3] = [Self::Rock, Self::Paper, Self::Scissors];

    /// Name players type
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Rock => "حجرة",
            Self::Paper => "ورقة",
            Self::Scissors => "مقص",
        }
    }

    /// Parses a typed choice
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim().to_lowercase();
        Self::ALL.into_iter().find(|hand| hand.name() == text)
    }

    const fn beats(self, other: Self) -> bool {
        matches!(
            (self, other),
            (Self::Rock, Self::Scissors) | (Self::Paper, Self::Rock) | (Self::Scissors, Self::Paper)
        )
    }
}

impl fmt::Display for Hand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of a round from the player's side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundResult {
    /// Player won
    Win,
    /// Player lost
    Lose,
    /// Same hand
    Draw,
}

/// Plays `player` against `bot`.
#[must_use]
pub const fn play_rps(player: Hand, bot: Hand) -> RoundResult {
    if player.beats(bot) {
        RoundResult::Win
    } else if bot.beats(player) {
        RoundResult::Lose
    } else {
        RoundResult::Draw
    }
}

/// Picks a random hand
pub fn random_hand<R: Rng + ?Sized>(rng: &mut R) -> Hand {
    Hand::ALL[rng.random_range(0..Hand::ALL.len())]
}

/// Flips a coin: heads or tails
pub fn flip_coin<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    if rng.random_bool(0.5) { "وجه" } else { "كتابة" }
}

/// Rolls 1..=100
pub fn roll<R: Rng + ?Sized>(rng: &mut R) -> u32 {
    rng.random_range(1..=100)
}

/// Symbols on the slot machine reels
pub const SLOT_SYMBOLS: [char; 5] = ['🍎', '🍊', '🍇', '🍒', '💎'];

/// Spins three reels
pub fn spin_slots<R: Rng + ?Sized>(rng: &mut R) -> [char; 3] {
    std::array::from_fn(|_| SLOT_SYMBOLS[rng.random_range(0..SLOT_SYMBOLS.len())])
}

/// A spin wins when all reels match
#[must_use]
pub fn slots_win(reels: &[char; 3]) -> bool {
    reels[0] == reels[1] && reels[1] == reels[2]
}

/// Arithmetic operators used by the math game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// Addition
    Add,
    /// Subtraction
    Sub,
    /// Multiplication
    Mul,
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
        };
        f.write_str(symbol)
    }
}

/// A generated math problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MathProblem {
    /// Left operand
    pub left: i64,
    /// Operator
    pub op: Operator,
    /// Right operand
    pub right: i64,
}

impl MathProblem {
    /// Random problem with operands in 1..=20
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let op = [Operator::Add, Operator::Sub, Operator::Mul][rng.random_range(0..3)];
        Self {
            left: rng.random_range(1..=20),
            op,
            right: rng.random_range(1..=20),
        }
    }

    /// Correct answer
    #[must_use]
    pub const fn answer(&self) -> i64 {
        match self.op {
            Operator::Add => self.left + self.right,
            Operator::Sub => self.left - self.right,
            Operator::Mul => self.left * self.right,
        }
    }

    /// Parses a typed answer; accepts a leading minus sign
    #[must_use]
    pub fn parse_answer(text: &str) -> Option<i64> {
        let text = text.trim();
        let digits = text.strip_prefix('-').unwrap_or(text);
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        text.parse().ok()
    }
}

impl fmt::Display for MathProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.left, self.op, self.right)
    }
}

/// Words for the fast-typing game
pub const FAST_WORDS: [&str; 10] = [
    "مستشفى",
    "كمبيوتر",
    "مدرسة",
    "سيارة",
    "طائرة",
    "برمجة",
    "تكنولوجيا",
    "امارات",
    "سعودية",
    "كويت",
];

/// Picks the word to type
pub fn fast_word<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    FAST_WORDS.choose(rng).copied().unwrap_or(FAST_WORDS[0])
}

/// Number-guessing game over 1..=50.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuessGame {
    secret: u32,
}

/// Response to a guess.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hint {
    /// The secret is larger
    Higher,
    /// The secret is smaller
    Lower,
    /// Correct
    Correct,
}

impl GuessGame {
    /// Largest possible secret
    pub const MAX: u32 = 50;

    /// Game with a random secret
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::with_secret(rng.random_range(1..=Self::MAX))
    }

    /// Game with a known secret
    #[must_use]
    pub const fn with_secret(secret: u32) -> Self {
        Self { secret }
    }

    /// The secret number
    #[must_use]
    pub const fn secret(&self) -> u32 {
        self.secret
    }

    /// Checks a guess
    #[must_use]
    pub fn check(&self, guess: u32) -> Hint {
        match guess.cmp(&self.secret) {
            Ordering::Less => Hint::Higher,
            Ordering::Greater => Hint::Lower,
            Ordering::Equal => Hint::Correct,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rps_outcomes() {
        assert_eq!(play_rps(Hand::Rock, Hand::Scissors), RoundResult::Win);
        assert_eq!(play_rps(Hand::Paper, Hand::Rock), RoundResult::Win);
        assert_eq!(play_rps(Hand::Scissors, Hand::Paper), RoundResult::Win);
        assert_eq!(play_rps(Hand::Rock, Hand::Paper), RoundResult::Lose);
        for hand in Hand::ALL {
            assert_eq!(play_rps(hand, hand), RoundResult::Draw);
        }
    }

    #[test]
    fn test_hand_parse() {
        assert_eq!(Hand::parse(" مقص "), Some(Hand::Scissors));
        assert_eq!(Hand::parse("rock"), None);
    }

    #[test]
    fn test_slots_win() {
        assert!(slots_win(&['💎', '💎', '💎']));
        assert!(!slots_win(&['💎', '🍎', '💎']));
    }

    #[test]
    fn test_math_problem() {
        let problem = MathProblem {
            left: 3,
            op: Operator::Sub,
            right: 9,
        };
        assert_eq!(problem.answer(), -6);
        assert_eq!(problem.to_string(), "3 - 9");
        assert_eq!(MathProblem::parse_answer("-6"), Some(-6));
        assert_eq!(MathProblem::parse_answer("12"), Some(12));
        assert_eq!(MathProblem::parse_answer("twelve"), None);
        assert_eq!(MathProblem::parse_answer("-"), None);
        assert_eq!(MathProblem::parse_answer("+5"), None);
    }

    #[test]
    fn test_random_values_in_range() {
        let mut rng = rand::rng();
        for _ in 0..200 {
            assert!((1..=100).contains(&roll(&mut rng)));
            let problem = MathProblem::random(&mut rng);
            assert!((1..=20).contains(&problem.left));
            assert!((1..=20).contains(&problem.right));
            assert!((1..=GuessGame::MAX).contains(&GuessGame::random(&mut rng).secret()));
            assert!(FAST_WORDS.contains(&fast_word(&mut rng)));
        }
    }

    #[test]
    fn test_guess_hints() {
        let game = GuessGame::with_secret(25);
        assert_eq!(game.check(10), Hint::Higher);
        assert_eq!(game.check(40), Hint::Lower);
        assert_eq!(game.check(25), Hint::Correct);
    }
}
