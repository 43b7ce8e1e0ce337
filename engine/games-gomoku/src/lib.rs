//! Gomoku (five in a row) rules engine
//!
//! Two players alternately place stones on an empty cell of a square grid.
//! Black moves first. The first player to complete an unbroken line of five
//! stones horizontally, vertically or diagonally wins; if the grid fills up
//! first the game is drawn.
//!
//! # Board Layout
//!
//! Cells are stored in row-major order, row 0 at the top:
//! ```text
//! Row 0: [ 0][ 1][ 2] ... [14]
//! Row 1: [15][16][17] ... [29]
//! ...
//! Row 14:[210]     ...   [224]
//! ```
//!
//! # Usage
//!
//! ```rust
//! use games_gomoku::{GameResult, GameState, Position};
//!
//! let mut state = GameState::new(15);
//! state.apply_move(Position::new(7, 7)).unwrap();
//!
//! assert_eq!(state.legal_moves().len(), 224);
//! assert_eq!(state.result(), GameResult::InProgress);
//! ```

use std::fmt;

use thiserror::Error;

mod observation;

pub use observation::{Observation, HISTORY_WINDOW, NUM_PLANES};

/// Standard board size (15x15).
pub const DEFAULT_BOARD_SIZE: usize = 15;

/// Number of contiguous stones needed to win.
pub const WIN_LENGTH: usize = 5;

/// Cells scanned along each line: the placed stone plus `WIN_LENGTH - 1` on either side.
const SCAN_SPAN: usize = WIN_LENGTH * 2 - 1;

/// Line directions as (row step, column step): horizontal, vertical, rising and falling diagonal.
const DIRECTIONS: [(isize, isize); 4] = [(0, 1), (1, 0), (-1, 1), (1, 1)];

/// Stone color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stone {
    Black,
    White,
}

impl Stone {
    /// Color to move at the given turn index. Even turns belong to Black.
    #[inline]
    pub fn for_turn(turn: usize) -> Self {
        if turn % 2 == 0 {
            Stone::Black
        } else {
            Stone::White
        }
    }

    /// The other color.
    #[inline]
    pub fn opponent(self) -> Self {
        match self {
            Stone::Black => Stone::White,
            Stone::White => Stone::Black,
        }
    }
}

impl fmt::Display for Stone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stone::Black => write!(f, "black"),
            Stone::White => write!(f, "white"),
        }
    }
}

/// A board cell, 0-indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Row-major cell index on a board of the given size.
    #[inline]
    pub fn index(self, board_size: usize) -> usize {
        self.row * board_size + self.col
    }

    /// Inverse of [`Position::index`].
    #[inline]
    pub fn from_index(index: usize, board_size: usize) -> Self {
        Self {
            row: index / board_size,
            col: index % board_size,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Outcome of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameResult {
    InProgress,
    BlackWin,
    WhiteWin,
    Draw,
}

impl GameResult {
    /// Winning result for the given color.
    #[inline]
    pub fn win_for(stone: Stone) -> Self {
        match stone {
            Stone::Black => GameResult::BlackWin,
            Stone::White => GameResult::WhiteWin,
        }
    }

    #[inline]
    pub fn is_terminal(self) -> bool {
        self != GameResult::InProgress
    }

    /// Winning color, if any.
    pub fn winner(self) -> Option<Stone> {
        match self {
            GameResult::BlackWin => Some(Stone::Black),
            GameResult::WhiteWin => Some(Stone::White),
            GameResult::InProgress | GameResult::Draw => None,
        }
    }
}

/// Rejected rules operations. The state is never modified when one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RulesError {
    #[error("cell {0} is already occupied")]
    Occupied(Position),

    #[error("position {position} is outside the {board_size}x{board_size} board")]
    OutOfBounds { position: Position, board_size: usize },

    #[error("game is already over")]
    GameOver,

    #[error("no moves to undo")]
    NothingToUndo,
}

/// Gomoku game state
///
/// Stones are tracked in two occupancy arrays, one per color. A cell is set
/// in at most one of them. The move history doubles as the undo stack and as
/// the recency source for evaluator input planes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameState {
    board_size: usize,
    /// Number of moves played; its parity gives the color to move.
    turn: usize,
    result: GameResult,
    black: Vec<bool>,
    white: Vec<bool>,
    history: Vec<Position>,
}

impl GameState {
    /// Create an empty board of `board_size` x `board_size` cells.
    ///
    /// # Panics
    /// Panics if `board_size` is zero.
    pub fn new(board_size: usize) -> Self {
        assert!(board_size > 0, "board size must be positive");
        let cells = board_size * board_size;
        Self {
            board_size,
            turn: 0,
            result: GameResult::InProgress,
            black: vec![false; cells],
            white: vec![false; cells],
            history: Vec::with_capacity(cells),
        }
    }

    #[inline]
    pub fn board_size(&self) -> usize {
        self.board_size
    }

    /// Total number of cells (N * N).
    #[inline]
    pub fn num_cells(&self) -> usize {
        self.board_size * self.board_size
    }

    #[inline]
    pub fn turn(&self) -> usize {
        self.turn
    }

    #[inline]
    pub fn result(&self) -> GameResult {
        self.result
    }

    #[inline]
    pub fn is_done(&self) -> bool {
        self.result.is_terminal()
    }

    /// Color whose turn it is.
    #[inline]
    pub fn current_player(&self) -> Stone {
        Stone::for_turn(self.turn)
    }

    /// Moves played so far, oldest first.
    pub fn history(&self) -> &[Position] {
        &self.history
    }

    pub fn last_move(&self) -> Option<Position> {
        self.history.last().copied()
    }

    /// Occupancy array for one color, indexed by [`Position::index`].
    pub fn stones(&self, stone: Stone) -> &[bool] {
        match stone {
            Stone::Black => &self.black,
            Stone::White => &self.white,
        }
    }

    pub fn contains(&self, pos: Position) -> bool {
        pos.row < self.board_size && pos.col < self.board_size
    }

    /// Stone occupying a cell, or `None` if the cell is empty or off the board.
    pub fn stone_at(&self, pos: Position) -> Option<Stone> {
        if !self.contains(pos) {
            return None;
        }
        let idx = pos.index(self.board_size);
        if self.black[idx] {
            Some(Stone::Black)
        } else if self.white[idx] {
            Some(Stone::White)
        } else {
            None
        }
    }

    #[inline]
    fn is_empty_index(&self, idx: usize) -> bool {
        !self.black[idx] && !self.white[idx]
    }

    /// Place a stone for the side to move.
    ///
    /// Marks the cell, records the move, advances the turn and recomputes the
    /// result from the lines through the new stone.
    pub fn apply_move(&mut self, pos: Position) -> Result<(), RulesError> {
        if !self.contains(pos) {
            return Err(RulesError::OutOfBounds {
                position: pos,
                board_size: self.board_size,
            });
        }
        if self.is_done() {
            return Err(RulesError::GameOver);
        }

        let idx = pos.index(self.board_size);
        if !self.is_empty_index(idx) {
            return Err(RulesError::Occupied(pos));
        }

        match self.current_player() {
            Stone::Black => self.black[idx] = true,
            Stone::White => self.white[idx] = true,
        }
        self.history.push(pos);
        self.turn += 1;
        self.result = self.evaluate_result(pos);

        Ok(())
    }

    /// Take back the most recent move, returning the cell it occupied.
    ///
    /// Works from a just-finished game as well; the result goes back to
    /// in progress.
    pub fn undo_last(&mut self) -> Result<Position, RulesError> {
        let pos = self.history.pop().ok_or(RulesError::NothingToUndo)?;
        let idx = pos.index(self.board_size);

        self.black[idx] = false;
        self.white[idx] = false;
        self.turn -= 1;
        self.result = GameResult::InProgress;

        Ok(pos)
    }

    /// Every empty cell in row-major order. Built fresh on each call.
    pub fn legal_moves(&self) -> Vec<Position> {
        (0..self.num_cells())
            .filter(|&idx| self.is_empty_index(idx))
            .map(|idx| Position::from_index(idx, self.board_size))
            .collect()
    }

    pub fn is_full(&self) -> bool {
        self.turn >= self.num_cells()
    }

    /// Result after a stone was placed at `last_move`.
    ///
    /// Slides along the nine cells centred on the move in each of the four
    /// directions, counting contiguous stones of the mover's color. The count
    /// resets on any empty, opposing or off-board cell, and the scan reports a
    /// win as soon as it reaches [`WIN_LENGTH`]. Longer lines therefore win
    /// too. Without a win, a full board is a draw.
    pub fn evaluate_result(&self, last_move: Position) -> GameResult {
        if let Some(stone) = self.stone_at(last_move) {
            let stones = self.stones(stone);
            let reach = (WIN_LENGTH - 1) as isize;

            for (dr, dc) in DIRECTIONS {
                let mut row = last_move.row as isize - dr * reach;
                let mut col = last_move.col as isize - dc * reach;
                let mut run = 0;

                for _ in 0..SCAN_SPAN {
                    if self.is_set(stones, row, col) {
                        run += 1;
                        if run == WIN_LENGTH {
                            return GameResult::win_for(stone);
                        }
                    } else {
                        run = 0;
                    }
                    row += dr;
                    col += dc;
                }
            }
        }

        if self.is_full() {
            GameResult::Draw
        } else {
            GameResult::InProgress
        }
    }

    #[inline]
    fn is_set(&self, stones: &[bool], row: isize, col: isize) -> bool {
        let n = self.board_size as isize;
        (0..n).contains(&row) && (0..n).contains(&col) && stones[(row * n + col) as usize]
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new(DEFAULT_BOARD_SIZE)
    }
}
