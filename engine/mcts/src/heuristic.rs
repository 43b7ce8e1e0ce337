//! Model-free evaluator built from local line patterns.
//!
//! Each empty cell is scored by the runs it would extend for both sides in
//! the four line directions, plus a small pull towards the centre. Scores are
//! log-compressed and softmax-normalised into a policy. The value head is
//! always 0: the search itself has to find the tactics.

use async_trait::async_trait;
use games_gomoku::{GameState, Observation, Position, WIN_LENGTH};

use crate::evaluator::{EvalResult, Evaluator, EvaluatorError};

const LINES: [(isize, isize); 4] = [(0, 1), (1, 0), (-1, 1), (1, 1)];

/// Weight of the opponent's patterns relative to our own. Below 1 so that
/// completing our own five outranks blocking theirs.
const DEFENCE_WEIGHT: f32 = 0.8;

/// Line-pattern evaluator.
#[derive(Debug, Clone)]
pub struct HeuristicEvaluator {
    /// Softmax temperature over log-scores. Lower is greedier.
    temperature: f32,
}

impl Default for HeuristicEvaluator {
    fn default() -> Self {
        Self { temperature: 0.5 }
    }
}

impl HeuristicEvaluator {
    pub fn new(temperature: f32) -> Self {
        Self {
            temperature: temperature.max(1e-3),
        }
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    fn evaluate_one(&self, state: &GameState) -> EvalResult {
        let obs = Observation::from_state(state);
        let n = obs.board_size();
        let own = obs.plane(0);
        let opp = obs.plane(1);

        let mut logits = vec![f32::NEG_INFINITY; n * n];
        for (idx, logit) in logits.iter_mut().enumerate() {
            if own[idx] > 0.0 || opp[idx] > 0.0 {
                continue;
            }
            let pos = Position::from_index(idx, n);
            let score = line_score(own, opp, n, pos)
                + DEFENCE_WEIGHT * line_score(opp, own, n, pos)
                + centrality(n, pos);
            *logit = score.ln_1p() / self.temperature;
        }

        EvalResult {
            policy: softmax(&logits),
            value: 0.0,
        }
    }
}

#[async_trait]
impl Evaluator for HeuristicEvaluator {
    async fn evaluate_batch(
        &self,
        positions: &[&GameState],
    ) -> Result<Vec<EvalResult>, EvaluatorError> {
        Ok(positions.iter().map(|s| self.evaluate_one(s)).collect())
    }
}

/// Pattern score for a run of `len` stones with `open_ends` free ends.
fn pattern_score(len: usize, open_ends: u8) -> f32 {
    match (len.min(WIN_LENGTH), open_ends) {
        (5, _) => 10_000.0,
        (4, 2) => 2_000.0,
        (4, 1) => 400.0,
        (3, 2) => 200.0,
        (3, 1) => 40.0,
        (2, 2) => 20.0,
        (2, 1) => 6.0,
        (1, 2) => 2.0,
        _ => 0.0,
    }
}

/// Sum over the four directions of the pattern a stone at `pos` would form
/// with `stones`.
fn line_score(stones: &[f32], blockers: &[f32], n: usize, pos: Position) -> f32 {
    LINES
        .iter()
        .map(|&(dr, dc)| {
            let (ahead, open_ahead) = ray(stones, blockers, n, pos, dr, dc);
            let (behind, open_behind) = ray(stones, blockers, n, pos, -dr, -dc);
            pattern_score(1 + ahead + behind, open_ahead as u8 + open_behind as u8)
        })
        .sum()
}

/// Count contiguous `stones` from `pos` (exclusive) in one direction and
/// report whether the run ends on an empty cell.
fn ray(
    stones: &[f32],
    blockers: &[f32],
    n: usize,
    pos: Position,
    dr: isize,
    dc: isize,
) -> (usize, bool) {
    let size = n as isize;
    let mut row = pos.row as isize + dr;
    let mut col = pos.col as isize + dc;
    let mut count = 0;

    while (0..size).contains(&row) && (0..size).contains(&col) {
        let idx = (row * size + col) as usize;
        if stones[idx] > 0.0 {
            count += 1;
        } else {
            return (count, blockers[idx] == 0.0);
        }
        row += dr;
        col += dc;
    }

    (count, false)
}

/// 1.0 at the centre, falling to 0.0 at the edge.
fn centrality(n: usize, pos: Position) -> f32 {
    let half = (n as f32 - 1.0) / 2.0;
    if half <= 0.0 {
        return 0.0;
    }
    let dist = (pos.row as f32 - half)
        .abs()
        .max((pos.col as f32 - half).abs());
    1.0 - dist / half
}

fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    if !max.is_finite() {
        return vec![0.0; logits.len()];
    }

    let mut probs: Vec<f32> = logits.iter().map(|&l| (l - max).exp()).collect();
    let total: f32 = probs.iter().sum();
    for p in &mut probs {
        *p /= total;
    }
    probs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn play(moves: &[(usize, usize)], size: usize) -> GameState {
        let mut state = GameState::new(size);
        for &(r, c) in moves {
            state.apply_move(Position::new(r, c)).unwrap();
        }
        state
    }

    fn argmax(policy: &[f32]) -> usize {
        policy
            .iter()
            .enumerate()
            .fold((0, f32::NEG_INFINITY), |best, (i, &p)| {
                if p > best.1 {
                    (i, p)
                } else {
                    best
                }
            })
            .0
    }

    #[tokio::test]
    async fn test_empty_board_prefers_centre() {
        let eval = HeuristicEvaluator::default();
        let result = eval.evaluate(&GameState::new(9)).await.unwrap();

        let sum: f32 = result.policy.iter().sum();
        assert!((sum - 1.0).abs() < 1e-4);
        assert_eq!(argmax(&result.policy), Position::new(4, 4).index(9));
        assert_eq!(result.value, 0.0);
    }

    #[tokio::test]
    async fn test_completes_own_five() {
        let state = play(
            &[(4, 1), (0, 0), (4, 2), (0, 2), (4, 3), (0, 4), (4, 4), (8, 8)],
            9,
        );
        let eval = HeuristicEvaluator::default();
        let result = eval.evaluate(&state).await.unwrap();

        let winning = result.policy[Position::new(4, 0).index(9)]
            + result.policy[Position::new(4, 5).index(9)];
        assert!(winning > 0.9, "winning cells got {}", winning);
    }

    #[tokio::test]
    async fn test_blocks_opponent_four() {
        // White to move against black's open four
        let state = play(&[(4, 1), (0, 0), (4, 2), (0, 2), (4, 3), (0, 4), (4, 4)], 9);
        let eval = HeuristicEvaluator::default();
        let result = eval.evaluate(&state).await.unwrap();

        let blocking = result.policy[Position::new(4, 0).index(9)]
            + result.policy[Position::new(4, 5).index(9)];
        assert!(blocking > 0.9, "blocking cells got {}", blocking);
    }

    #[tokio::test]
    async fn test_occupied_cells_get_no_mass() {
        let state = play(&[(1, 1), (2, 2)], 5);
        let result = HeuristicEvaluator::default().evaluate(&state).await.unwrap();

        assert_eq!(result.policy[Position::new(1, 1).index(5)], 0.0);
        assert_eq!(result.policy[Position::new(2, 2).index(5)], 0.0);
    }

    #[test]
    fn test_pattern_ordering() {
        assert!(pattern_score(5, 0) > DEFENCE_WEIGHT * pattern_score(5, 0));
        assert!(DEFENCE_WEIGHT * pattern_score(5, 0) > pattern_score(4, 2));
        assert!(pattern_score(4, 2) > pattern_score(4, 1));
        assert!(pattern_score(3, 2) > pattern_score(3, 1));
        assert_eq!(pattern_score(6, 0), pattern_score(5, 0));
    }
}
