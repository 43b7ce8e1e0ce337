//! Move-decision surface for a game front end.

use games_gomoku::{GameResult, GameState, Position, Stone};
use tracing::debug;

use crate::config::{Difficulty, MctsConfig};
use crate::evaluator::Evaluator;
use crate::search::{run_mcts, SearchError, SearchResult};

/// Plays moves with MCTS at a chosen difficulty.
pub struct MctsAgent<E> {
    evaluator: E,
    config: MctsConfig,
    difficulty: Difficulty,
}

impl<E: Evaluator> MctsAgent<E> {
    pub fn new(evaluator: E, config: MctsConfig) -> Self {
        Self {
            evaluator,
            config,
            difficulty: Difficulty::default(),
        }
    }

    pub fn with_difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = difficulty;
        self
    }

    pub fn set_difficulty(&mut self, difficulty: Difficulty) {
        debug!(%difficulty, "Difficulty changed");
        self.difficulty = difficulty;
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn config(&self) -> &MctsConfig {
        &self.config
    }

    pub fn evaluator(&self) -> &E {
        &self.evaluator
    }

    pub fn is_ready(&self) -> bool {
        self.evaluator.is_ready()
    }

    /// Run a full search and return its result.
    pub async fn search(&self, state: &GameState) -> Result<SearchResult, SearchError> {
        run_mcts(&self.evaluator, &self.config, state, self.difficulty).await
    }

    /// Pick a move for the side to move.
    ///
    /// Fails with [`SearchError::EvaluatorNotReady`] while the evaluator is
    /// unavailable and with [`SearchError::GameOver`] on a finished game; the
    /// caller's state is never touched.
    pub async fn choose_move(&self, state: &GameState) -> Result<Position, SearchError> {
        Ok(self.search(state).await?.action)
    }

    /// Black's winning chances as a percentage.
    ///
    /// Finished games report 100, 0 or 50. The empty board reports 50
    /// without consulting the evaluator.
    pub async fn win_ratio(&self, state: &GameState) -> Result<u8, SearchError> {
        match state.result() {
            GameResult::BlackWin => return Ok(100),
            GameResult::WhiteWin => return Ok(0),
            GameResult::Draw => return Ok(50),
            GameResult::InProgress => {}
        }
        if state.turn() == 0 {
            return Ok(50);
        }
        if !self.evaluator.is_ready() {
            return Err(SearchError::EvaluatorNotReady);
        }

        let eval = self.evaluator.evaluate(state).await?;
        let black_value = match state.current_player() {
            Stone::Black => eval.value,
            Stone::White => -eval.value,
        };
        Ok(win_percentage(black_value))
    }
}

/// Map a value in [-1, 1] to a percentage in [1, 99].
pub fn win_percentage(value: f32) -> u8 {
    let pct = ((value * 0.5 + 0.5) * 100.0).floor();
    if pct.is_nan() {
        return 50;
    }
    pct.clamp(1.0, 99.0) as u8
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::evaluator::{EvalResult, EvaluatorError, UniformEvaluator};

    /// Constant value for the side to move.
    struct FixedValue(f32);

    #[async_trait]
    impl Evaluator for FixedValue {
        async fn evaluate_batch(
            &self,
            positions: &[&GameState],
        ) -> Result<Vec<EvalResult>, EvaluatorError> {
            UniformEvaluator
                .evaluate_batch(positions)
                .await
                .map(|results| {
                    results
                        .into_iter()
                        .map(|r| EvalResult {
                            value: self.0,
                            ..r
                        })
                        .collect()
                })
        }
    }

    #[test]
    fn test_win_percentage() {
        assert_eq!(win_percentage(0.0), 50);
        assert_eq!(win_percentage(0.5), 75);
        assert_eq!(win_percentage(1.0), 99);
        assert_eq!(win_percentage(-1.0), 1);
        assert_eq!(win_percentage(f32::NAN), 50);
    }

    #[tokio::test]
    async fn test_win_ratio_is_from_black_perspective() {
        let agent = MctsAgent::new(FixedValue(0.5), MctsConfig::for_testing());

        let mut state = GameState::new(15);
        assert_eq!(agent.win_ratio(&state).await.unwrap(), 50);

        // White to move and doing well means Black is behind
        state.apply_move(Position::new(7, 7)).unwrap();
        assert_eq!(agent.win_ratio(&state).await.unwrap(), 25);

        state.apply_move(Position::new(7, 8)).unwrap();
        assert_eq!(agent.win_ratio(&state).await.unwrap(), 75);
    }

    #[tokio::test]
    async fn test_win_ratio_terminal_states() {
        let agent = MctsAgent::new(UniformEvaluator::new(), MctsConfig::for_testing());

        let mut state = GameState::new(15);
        for (r, c) in [(7, 7), (0, 0), (7, 8), (0, 2), (7, 9), (0, 4), (7, 10), (0, 6), (7, 11)] {
            state.apply_move(Position::new(r, c)).unwrap();
        }
        assert_eq!(agent.win_ratio(&state).await.unwrap(), 100);

        let mut draw = GameState::new(2);
        for idx in 0..4 {
            draw.apply_move(Position::from_index(idx, 2)).unwrap();
        }
        assert_eq!(agent.win_ratio(&draw).await.unwrap(), 50);
    }

    #[tokio::test]
    async fn test_choose_move_respects_difficulty() {
        let mut agent = MctsAgent::new(UniformEvaluator::new(), MctsConfig::for_testing());
        assert_eq!(agent.difficulty(), Difficulty::Easy);

        let mut state = GameState::new(9);
        state.apply_move(Position::new(4, 4)).unwrap();

        let easy = agent.search(&state).await.unwrap();
        assert_eq!(easy.simulations, 2);

        agent.set_difficulty(Difficulty::Hard);
        let hard = agent.search(&state).await.unwrap();
        assert_eq!(hard.simulations, 65);

        let pos = agent.choose_move(&state).await.unwrap();
        assert!(state.stone_at(pos).is_none());
        // The caller's state is untouched
        assert_eq!(state.turn(), 1);
    }
}
