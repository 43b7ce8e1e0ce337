use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use games_gomoku::GameResult;

use super::*;
use crate::evaluator::UniformEvaluator;
use crate::node::WIN_VALUE;

/// Puts 90% of the policy on one cell.
struct PeakedEvaluator {
    favourite: Position,
}

#[async_trait]
impl Evaluator for PeakedEvaluator {
    async fn evaluate_batch(
        &self,
        positions: &[&GameState],
    ) -> Result<Vec<EvalResult>, EvaluatorError> {
        Ok(positions
            .iter()
            .map(|state| {
                let cells = state.num_cells();
                let mut policy = vec![0.1 / (cells - 1) as f32; cells];
                policy[self.favourite.index(state.board_size())] = 0.9;
                EvalResult { policy, value: 0.0 }
            })
            .collect())
    }
}

struct NeverReady;

#[async_trait]
impl Evaluator for NeverReady {
    fn is_ready(&self) -> bool {
        false
    }

    async fn evaluate_batch(
        &self,
        _positions: &[&GameState],
    ) -> Result<Vec<EvalResult>, EvaluatorError> {
        Err(EvaluatorError::NotReady)
    }
}

/// Requires a fixed batch shape and records every batch length it receives.
struct FixedShapeEvaluator {
    cap: usize,
    seen: Mutex<Vec<usize>>,
}

#[async_trait]
impl Evaluator for FixedShapeEvaluator {
    fn fixed_batch_size(&self) -> Option<usize> {
        Some(self.cap)
    }

    async fn evaluate_batch(
        &self,
        positions: &[&GameState],
    ) -> Result<Vec<EvalResult>, EvaluatorError> {
        self.seen.lock().unwrap().push(positions.len());
        UniformEvaluator.evaluate_batch(positions).await
    }
}

/// Drops the last result of every batch.
struct ShortEvaluator;

#[async_trait]
impl Evaluator for ShortEvaluator {
    async fn evaluate_batch(
        &self,
        positions: &[&GameState],
    ) -> Result<Vec<EvalResult>, EvaluatorError> {
        let mut results = UniformEvaluator.evaluate_batch(positions).await?;
        results.pop();
        Ok(results)
    }
}

/// Returns a policy that is too short for the board.
struct TruncatedPolicyEvaluator;

#[async_trait]
impl Evaluator for TruncatedPolicyEvaluator {
    async fn evaluate_batch(
        &self,
        positions: &[&GameState],
    ) -> Result<Vec<EvalResult>, EvaluatorError> {
        Ok(positions
            .iter()
            .map(|_| EvalResult {
                policy: vec![1.0],
                value: 0.0,
            })
            .collect())
    }
}

/// Counts requests as soon as their body starts running.
struct CountingEvaluator {
    started: Arc<AtomicUsize>,
}

#[async_trait]
impl Evaluator for CountingEvaluator {
    async fn evaluate_batch(
        &self,
        positions: &[&GameState],
    ) -> Result<Vec<EvalResult>, EvaluatorError> {
        self.started.fetch_add(1, Ordering::SeqCst);
        UniformEvaluator.evaluate_batch(positions).await
    }
}

fn play(size: usize, moves: &[(usize, usize)]) -> GameState {
    let mut state = GameState::new(size);
    for &(r, c) in moves {
        state.apply_move(Position::new(r, c)).unwrap();
    }
    state
}

/// Every simulation was backed up exactly once and no virtual loss leaked.
fn assert_consistent<E: Evaluator + ?Sized>(search: &MctsSearch<'_, E>) {
    let tree = search.tree();
    let stats = search.stats();

    assert_eq!(tree.get(tree.root()).visit_count, stats.simulations);
    assert_eq!(
        stats.terminal_backups + stats.evaluated_leaves,
        stats.simulations
    );
    for (i, node) in tree.arena().iter().enumerate() {
        assert_eq!(node.virtual_loss, 0.0, "virtual loss leaked at node {}", i);
    }
}

#[tokio::test]
async fn test_easy_runs_budget_plus_one() {
    let evaluator = PeakedEvaluator {
        favourite: Position::new(2, 6),
    };
    let config = MctsConfig::default();
    let state = GameState::new(9);

    let mut search = MctsSearch::new(&evaluator, &config, &state).unwrap();
    let result = search.run(Difficulty::Easy).await.unwrap();

    assert_eq!(result.action, Position::new(2, 6));
    assert_eq!(result.simulations, 2);
    assert_eq!(result.stats.evaluated_leaves, 2);
    assert_eq!(result.stats.batches, 2);
    assert_consistent(&search);
}

#[tokio::test]
async fn test_unbatched_levels_flush_every_leaf() {
    let evaluator = UniformEvaluator::new();
    let config = MctsConfig::for_testing();
    let state = GameState::new(7);

    let mut search = MctsSearch::new(&evaluator, &config, &state).unwrap();
    let result = search.run(Difficulty::Medium).await.unwrap();

    assert_eq!(result.simulations, 9);
    assert_eq!(result.stats.batches, 9);
    assert_eq!(result.stats.evaluator_calls, 9);
    assert_consistent(&search);
}

#[tokio::test]
async fn test_hard_batches_leaves() {
    let evaluator = UniformEvaluator::new();
    let config = MctsConfig::for_testing();
    let state = GameState::new(9);

    let mut search = MctsSearch::new(&evaluator, &config, &state).unwrap();
    let result = search.run(Difficulty::Hard).await.unwrap();

    assert_eq!(result.simulations, 65);
    assert_eq!(result.stats.evaluated_leaves, 65);
    assert!(
        result.stats.batches < result.stats.evaluated_leaves,
        "expected batching, got {:?}",
        result.stats
    );
    assert_consistent(&search);
}

#[tokio::test]
async fn test_finds_immediate_win() {
    // Black holds (3, 0)..(3, 3); (3, 4) completes five
    let state = play(
        7,
        &[
            (3, 0), (0, 0), (3, 1), (0, 2), (3, 2), (0, 4), (3, 3), (6, 6),
        ],
    );
    let evaluator = UniformEvaluator::new();
    let config = MctsConfig::default().with_budgets([1, 25, 200]);

    let mut search = MctsSearch::new(&evaluator, &config, &state).unwrap();
    let result = search.run(Difficulty::Hard).await.unwrap();

    assert_eq!(result.action, Position::new(3, 4));
    assert!(result.stats.terminal_backups > 0);
    assert!(result.value > 0.0, "root value {}", result.value);
    assert!(result.policy[Position::new(3, 4).index(7)] > 0.5);
    assert_consistent(&search);
}

#[tokio::test]
async fn test_drawn_leaf_backs_up_win_value() {
    // One empty cell left on a 2x2 board; filling it draws
    let state = play(2, &[(0, 0), (0, 1), (1, 0)]);
    let evaluator = UniformEvaluator::new();
    let config = MctsConfig::for_testing();

    let mut search = MctsSearch::new(&evaluator, &config, &state).unwrap();
    let result = search.run(Difficulty::Medium).await.unwrap();

    assert_eq!(result.action, Position::new(1, 1));
    assert_eq!(result.stats.terminal_backups, 8);
    // Root leaf evaluates to 0, then eight drawn backups of +1 each
    assert!((result.value - 8.0 / 9.0).abs() < 1e-6, "value {}", result.value);

    let tree = search.tree();
    let child = tree.get(tree.root()).child(0).unwrap();
    let node = tree.get(child);
    assert_eq!(node.result, GameResult::Draw);
    assert_eq!(node.value, WIN_VALUE);
    assert_eq!(node.visit_count, 8);
    assert!((node.mean_value() - 1.0).abs() < 1e-6);
    assert!((tree.get(tree.root()).value_sum + 8.0).abs() < 1e-6);
    assert_consistent(&search);
}

#[tokio::test]
async fn test_host_runs_while_request_in_flight() {
    let started = Arc::new(AtomicUsize::new(0));
    let evaluator = CountingEvaluator {
        started: Arc::clone(&started),
    };
    let config = MctsConfig::for_testing();
    let state = play(9, &[(4, 4)]);

    // Single-threaded runtime: the host task only runs when the search yields.
    let seen = Arc::clone(&started);
    let host = tokio::spawn(async move { seen.load(Ordering::SeqCst) });

    run_mcts(&evaluator, &config, &state, Difficulty::Easy)
        .await
        .unwrap();

    assert_eq!(host.await.unwrap(), 1);
    assert_eq!(started.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_policy_covers_board() {
    let state = play(9, &[(4, 4), (4, 5)]);
    let evaluator = UniformEvaluator::new();
    let config = MctsConfig::for_testing();

    let result = run_mcts(&evaluator, &config, &state, Difficulty::Hard)
        .await
        .unwrap();

    assert_eq!(result.policy.len(), 81);
    let sum: f32 = result.policy.iter().sum();
    assert!((sum - 1.0).abs() < 1e-4);
    assert_eq!(result.policy[Position::new(4, 4).index(9)], 0.0);
    assert_eq!(result.policy[Position::new(4, 5).index(9)], 0.0);
    assert!(state.stone_at(result.action).is_none());
}

#[tokio::test]
async fn test_fixed_batch_shape_is_padded() {
    let evaluator = FixedShapeEvaluator {
        cap: 4,
        seen: Mutex::new(Vec::new()),
    };
    let config = MctsConfig::for_testing();
    let state = GameState::new(9);

    let mut search = MctsSearch::new(&evaluator, &config, &state).unwrap();
    let result = search.run(Difficulty::Hard).await.unwrap();

    let seen = evaluator.seen.lock().unwrap().clone();
    assert!(!seen.is_empty());
    assert!(seen.iter().all(|&len| len == 4), "batch lengths {:?}", seen);
    assert!(result.stats.padded_inputs > 0);
    assert_eq!(result.stats.evaluator_calls as usize, seen.len());
    assert_consistent(&search);
}

#[tokio::test]
async fn test_not_ready_evaluator_yields_no_move() {
    let config = MctsConfig::default();
    let state = GameState::new(15);

    let err = run_mcts(&NeverReady, &config, &state, Difficulty::Easy)
        .await
        .unwrap_err();
    assert!(matches!(err, SearchError::EvaluatorNotReady));
}

#[tokio::test]
async fn test_terminal_root_is_rejected() {
    let state = play(
        15,
        &[(7, 7), (0, 0), (7, 8), (0, 2), (7, 9), (0, 4), (7, 10), (0, 6), (7, 11)],
    );
    let config = MctsConfig::default();

    let err = run_mcts(&UniformEvaluator::new(), &config, &state, Difficulty::Easy)
        .await
        .unwrap_err();
    assert!(matches!(err, SearchError::GameOver));
}

#[tokio::test]
async fn test_short_batch_is_an_error() {
    let config = MctsConfig::for_testing();
    let state = GameState::new(9);

    let err = run_mcts(&ShortEvaluator, &config, &state, Difficulty::Hard)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SearchError::Evaluator(EvaluatorError::BatchMismatch { .. })
    ));
}

#[tokio::test]
async fn test_truncated_policy_is_an_error() {
    let config = MctsConfig::for_testing();
    let state = GameState::new(9);

    let err = run_mcts(&TruncatedPolicyEvaluator, &config, &state, Difficulty::Easy)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SearchError::Evaluator(EvaluatorError::InvalidPolicy {
            expected: 81,
            actual: 1
        })
    ));
}
