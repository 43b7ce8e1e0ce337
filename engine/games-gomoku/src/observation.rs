//! Neural network input planes.
//!
//! A position is encoded as `NUM_PLANES` planes of `N x N` floats, laid out
//! plane-major to match a `[batch, planes, rows, cols]` tensor:
//!
//! | Plane | Contents |
//! |-------|----------|
//! | 0 | stones of the side to move |
//! | 1 | stones of the opponent |
//! | 2 | side to move's stones among its last `HISTORY_WINDOW` moves |
//! | 3 | opponent's stones among its last `HISTORY_WINDOW` moves |
//! | 4 | color indicator: 0.0 when Black moves, 1.0 when White moves |

use crate::{GameState, Stone};

/// Number of input planes.
pub const NUM_PLANES: usize = 5;

/// Recent moves tracked per side in the recency planes.
pub const HISTORY_WINDOW: usize = 5;

/// Encoded evaluator input for one position.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    board_size: usize,
    planes: Vec<f32>,
}

impl Observation {
    /// Encode a position from the perspective of the side to move.
    pub fn from_state(state: &GameState) -> Self {
        let n = state.board_size();
        let cells = n * n;
        let mut planes = vec![0.0; NUM_PLANES * cells];

        let mover = state.current_player();
        for (plane, stone) in [(0, mover), (1, mover.opponent())] {
            let offset = plane * cells;
            for (idx, &occupied) in state.stones(stone).iter().enumerate() {
                if occupied {
                    planes[offset + idx] = 1.0;
                }
            }
        }

        // Walking back from the latest move: even steps were played by the
        // opponent, odd steps by the side to move.
        for (i, pos) in state
            .history()
            .iter()
            .rev()
            .take(HISTORY_WINDOW * 2)
            .enumerate()
        {
            let plane = if i % 2 == 0 { 3 } else { 2 };
            planes[plane * cells + pos.index(n)] = 1.0;
        }

        if mover == Stone::White {
            planes[4 * cells..].fill(1.0);
        }

        Self {
            board_size: n,
            planes,
        }
    }

    #[inline]
    pub fn board_size(&self) -> usize {
        self.board_size
    }

    /// Tensor shape of a single observation: `[planes, rows, cols]`.
    pub fn shape(&self) -> [usize; 3] {
        [NUM_PLANES, self.board_size, self.board_size]
    }

    /// All planes, flattened plane-major.
    pub fn planes(&self) -> &[f32] {
        &self.planes
    }

    /// One `N x N` plane.
    pub fn plane(&self, index: usize) -> &[f32] {
        let cells = self.board_size * self.board_size;
        &self.planes[index * cells..(index + 1) * cells]
    }

    pub fn into_planes(self) -> Vec<f32> {
        self.planes
    }
}
