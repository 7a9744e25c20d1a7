//! Tic-tac-toe between two members.

use std::fmt;

/// A player's mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mark {
    /// First player
    X,
    /// Second player
    O,
}

impl Mark {
    /// The other mark
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::X => Self::O,
            Self::O => Self::X,
        }
    }

    /// Emoji shown on the board
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::X => "❌",
            Self::O => "⭕",
        }
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// End of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Completed a line
    Winner(Mark),
    /// Board full with no line
    Draw,
}

/// A 3x3 board, row-major.
pub type Board = [[Option<Mark>; 3]; 3];

const LINES: [[(usize, usize); 3]; 8] = [
    [(0, 0), (0, 1), (0, 2)],
    [(1, 0), (1, 1), (1, 2)],
    [(2, 0), (2, 1), (2, 2)],
    [(0, 0), (1, 0), (2, 0)],
    [(0, 1), (1, 1), (2, 1)],
    [(0, 2), (1, 2), (2, 2)],
    [(0, 0), (1, 1), (2, 2)],
    [(0, 2), (1, 1), (2, 0)],
];

/// Returns the mark on a completed row, column or diagonal, [`Outcome::Draw`] when the board is
/// full without one, and `None` while the game can continue.
#[must_use]
pub fn check_winner(board: &Board) -> Option<Outcome> {
    for line in LINES {
        let [a, b, c] = line.map(|(row, col)| board[row][col]);
        if let Some(mark) = a.filter(|&mark| b == Some(mark) && c == Some(mark)) {
            return Some(Outcome::Winner(mark));
        }
    }

    if board.iter().flatten().all(Option::is_some) {
        Some(Outcome::Draw)
    } else {
        None
    }
}

/// Why a move was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MoveError {
    /// Not the player's turn (or not a player)
    #[error("It is not your turn")]
    NotYourTurn,
    /// Cell already taken
    #[error("That square is taken")]
    Occupied,
    /// Cell index outside 0..9
    #[error("No such square")]
    OutOfRange,
    /// Game already ended
    #[error("The game is over")]
    Finished,
}

/// A game in progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicTacToe {
    players: [u64; 2],
    board: Board,
    turn: Mark,
    outcome: Option<Outcome>,
}

impl TicTacToe {
    /// New game; `x` moves first
    #[must_use]
    pub const fn new(x: u64, o: u64) -> Self {
        Self {
            players: [x, o],
            board: [[None; 3]; 3],
            turn: Mark::X,
            outcome: None,
        }
    }

    /// Player to move
    #[must_use]
    pub const fn current_player(&self) -> u64 {
        match self.turn {
            Mark::X => self.players[0],
            Mark::O => self.players[1],
        }
    }

    /// Mark to move
    #[must_use]
    pub const fn turn(&self) -> Mark {
        self.turn
    }

    /// Player holding `mark`
    #[must_use]
    pub const fn player(&self, mark: Mark) -> u64 {
        match mark {
            Mark::X => self.players[0],
            Mark::O => self.players[1],
        }
    }

    /// Current board
    #[must_use]
    pub const fn board(&self) -> &Board {
        &self.board
    }

    /// Result, once the game has ended
    #[must_use]
    pub const fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    /// Mark at cell `index` (0..9, row-major)
    #[must_use]
    pub fn cell(&self, index: usize) -> Option<Mark> {
        self.board.get(index / 3).and_then(|row| row.get(index % 3)).copied().flatten()
    }

    /// Places the current mark at `index` for `user_id`.
    pub fn play(&mut self, user_id: u64, index: usize) -> Result<Option<Outcome>, MoveError> {
        if self.outcome.is_some() {
            return Err(MoveError::Finished);
        }
        if user_id != self.current_player() {
            return Err(MoveError::NotYourTurn);
        }
        if index >= 9 {
            return Err(MoveError::OutOfRange);
        }

        let cell = &mut self.board[index / 3][index % 3];
        if cell.is_some() {
            return Err(MoveError::Occupied);
        }
        *cell = Some(self.turn);

        self.outcome = check_winner(&self.board);
        if self.outcome.is_none() {
            self.turn = self.turn.other();
        }
        Ok(self.outcome)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    const P1: u64 = 1;
    const P2: u64 = 2;

    fn board_from_code(mut code: u32) -> Board {
        let mut board = [[None; 3]; 3];
        for cell in board.iter_mut().flatten() {
            *cell = match code % 3 {
                1 => Some(Mark::X),
                2 => Some(Mark::O),
                _ => None,
            };
            code /= 3;
        }
        board
    }

    fn has_line(board: &Board, mark: Mark) -> bool {
        LINES
            .iter()
            .any(|line| line.iter().all(|&(r, c)| board[r][c] == Some(mark)))
    }

    #[test]
    fn test_check_winner_over_every_board() {
        for code in 0..3_u32.pow(9) {
            let board = board_from_code(code);
            let full = board.iter().flatten().all(Option::is_some);
            let x_line = has_line(&board, Mark::X);
            let o_line = has_line(&board, Mark::O);

            match check_winner(&board) {
                Some(Outcome::Winner(mark)) => {
                    assert!(has_line(&board, mark), "board {code}: winner without a line");
                }
                Some(Outcome::Draw) => {
                    assert!(full, "board {code}: draw on a non-full board");
                    assert!(!x_line && !o_line, "board {code}: draw with a line");
                }
                None => {
                    assert!(!full, "board {code}: full board reported as ongoing");
                    assert!(!x_line && !o_line, "board {code}: missed a line");
                }
            }
        }
    }

    #[test]
    fn test_specific_boards() {
        let x = Some(Mark::X);
        let o = Some(Mark::O);

        let diagonal = [[o, x, None], [None, o, x], [x, None, o]];
        assert_eq!(check_winner(&diagonal), Some(Outcome::Winner(Mark::O)));

        let draw = [[x, o, x], [x, o, o], [o, x, x]];
        assert_eq!(check_winner(&draw), Some(Outcome::Draw));

        let ongoing = [[x, None, None], [None, o, None], [None, None, None]];
        assert_eq!(check_winner(&ongoing), None);
    }

    #[test]
    fn test_game_turns_and_win() {
        let mut game = TicTacToe::new(P1, P2);
        assert_eq!(game.play(P2, 0), Err(MoveError::NotYourTurn));

        assert_eq!(game.play(P1, 0), Ok(None));
        assert_eq!(game.play(P2, 0), Err(MoveError::Occupied));
        assert_eq!(game.play(P2, 3), Ok(None));
        assert_eq!(game.play(P1, 1), Ok(None));
        assert_eq!(game.play(P2, 4), Ok(None));
        assert_eq!(game.play(P1, 2), Ok(Some(Outcome::Winner(Mark::X))));

        assert_eq!(game.current_player(), P1, "winner keeps the turn");
        assert_eq!(game.play(P2, 8), Err(MoveError::Finished));
        assert_eq!(game.cell(2), Some(Mark::X));
        assert_eq!(game.cell(5), None);
    }

    #[test]
    fn test_game_rejects_out_of_range() {
        let mut game = TicTacToe::new(P1, P2);
        assert_eq!(game.play(P1, 9), Err(MoveError::OutOfRange));
    }
}
