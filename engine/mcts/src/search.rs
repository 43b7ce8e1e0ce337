//! MCTS search implementation.
//!
//! Implements the core MCTS algorithm:
//! 1. Selection: Traverse tree using PUCT to find a leaf, adding virtual loss
//! 2. Queueing: Park the leaf until the next batch flush
//! 3. Expansion & Evaluation: Expand each flushed leaf from one evaluator call
//! 4. Backpropagation: Update statistics along the path
//!
//! Terminal leaves skip the queue and are backed up immediately.

use std::time::Instant;

use games_gomoku::{GameState, Position};
use thiserror::Error;
use tracing::{debug, trace};

use crate::config::{Difficulty, MctsConfig};
use crate::evaluator::{EvalResult, Evaluator, EvaluatorError};
use crate::node::NodeId;
use crate::tree::MctsTree;

/// Errors that can occur during MCTS search.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Evaluator is not ready")]
    EvaluatorNotReady,

    #[error("Evaluator error: {0}")]
    Evaluator(#[from] EvaluatorError),

    #[error("Game is already over")]
    GameOver,

    #[error("No legal moves available")]
    NoLegalMoves,

    #[error("Invalid state: {0}")]
    InvalidState(String),
}

/// Counters collected over one search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Simulations started
    pub simulations: u32,
    /// Leaves that ended the game and were backed up without evaluation
    pub terminal_backups: u32,
    /// Leaves expanded and backed up after a flush
    pub evaluated_leaves: u32,
    /// Non-empty flushes
    pub batches: u32,
    /// Calls made to `Evaluator::evaluate_batch`
    pub evaluator_calls: u32,
    /// Dummy positions added to reach a fixed batch shape
    pub padded_inputs: u32,
}

/// Result of an MCTS search.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// Most visited root move
    pub action: Position,

    /// Root visit distribution over all cells, row-major
    pub policy: Vec<f32>,

    /// Value estimate for the side to move at the root
    pub value: f32,

    /// Number of simulations performed
    pub simulations: u32,

    pub stats: SearchStats,
}

/// A leaf waiting for the next batch flush, with the board it was reached on.
struct PendingLeaf {
    node: NodeId,
    state: GameState,
}

/// MCTS search state for one move decision.
pub struct MctsSearch<'a, E: Evaluator + ?Sized> {
    tree: MctsTree,
    evaluator: &'a E,
    config: &'a MctsConfig,
    root_state: GameState,
    pending: Vec<PendingLeaf>,
    stats: SearchStats,
}

impl<'a, E: Evaluator + ?Sized> MctsSearch<'a, E> {
    /// Create a new MCTS search from the given game state.
    pub fn new(
        evaluator: &'a E,
        config: &'a MctsConfig,
        root_state: &GameState,
    ) -> Result<Self, SearchError> {
        if root_state.is_done() {
            return Err(SearchError::GameOver);
        }

        Ok(Self {
            tree: MctsTree::new(),
            evaluator,
            config,
            root_state: root_state.clone(),
            pending: Vec::new(),
            stats: SearchStats::default(),
        })
    }

    /// Run `simulation_budget(difficulty) + 1` simulations and pick a move.
    pub async fn run(&mut self, difficulty: Difficulty) -> Result<SearchResult, SearchError> {
        if !self.evaluator.is_ready() {
            return Err(SearchError::EvaluatorNotReady);
        }

        let start = Instant::now();
        let total = self.config.simulation_budget(difficulty) + 1;
        let batched = self.config.is_batched(difficulty);

        for i in 0..total {
            let force = !batched || i + self.config.force_flush_tail >= total;
            self.flush(force).await?;
            self.simulate(batched)?;
        }
        self.flush(true).await?;

        let (action, visits) = self.tree.best_action().ok_or(SearchError::NoLegalMoves)?;
        let root = self.tree.get(self.tree.root());
        let value = -root.mean_value();

        debug!(
            %difficulty,
            simulations = total,
            move_played = %action,
            visits,
            value,
            nodes = self.tree.len(),
            batches = self.stats.batches,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "MCTS decision"
        );

        Ok(SearchResult {
            action,
            policy: self.tree.root_policy(self.root_state.board_size()),
            value,
            simulations: total,
            stats: self.stats.clone(),
        })
    }

    /// Run one selection. Terminal leaves are backed up at once, others are queued.
    fn simulate(&mut self, batched: bool) -> Result<(), SearchError> {
        self.stats.simulations += 1;

        let mut state = self.root_state.clone();
        let leaf_id = self.select(&mut state, batched)?;

        if self.tree.get(leaf_id).is_terminal() {
            self.tree.backpropagate(leaf_id, self.config.virtual_loss);
            self.stats.terminal_backups += 1;
            trace!(
                leaf = leaf_id.0,
                result = ?state.result(),
                "Terminal leaf backed up"
            );
        } else {
            self.pending.push(PendingLeaf {
                node: leaf_id,
                state,
            });
        }

        Ok(())
    }

    /// Descend from the root while nodes are visited and not terminal,
    /// playing each selected move on `state`.
    fn select(&mut self, state: &mut GameState, batched: bool) -> Result<NodeId, SearchError> {
        let mut current = self.tree.root();

        loop {
            let node = self.tree.get(current);
            if node.visit_count == 0 || node.is_terminal() {
                break;
            }

            let Some(index) = self.tree.select_child(current, self.config.c_puct, batched) else {
                break;
            };

            let pos = node.child_positions[index];
            state.apply_move(pos).map_err(|e| {
                SearchError::InvalidState(format!("selected move {} rejected: {}", pos, e))
            })?;

            let child = self.tree.materialize_child(current, index, state.result());
            self.tree.apply_virtual_loss(child, self.config.virtual_loss);
            current = child;
        }

        Ok(current)
    }

    /// Evaluate, expand and back up the pending leaves.
    ///
    /// Without `force` nothing happens until the queue reaches the batch size.
    async fn flush(&mut self, force: bool) -> Result<(), SearchError> {
        if self.pending.is_empty() || (!force && self.pending.len() < self.config.eval_batch_size)
        {
            return Ok(());
        }

        let pending = std::mem::take(&mut self.pending);
        debug!(batch = pending.len(), forced = force, "Flushing inference batch");

        let results = self.evaluate_pending(&pending).await?;
        let num_cells = self.root_state.num_cells();

        for (leaf, eval) in pending.iter().zip(results) {
            if eval.policy.len() < num_cells {
                return Err(EvaluatorError::InvalidPolicy {
                    expected: num_cells,
                    actual: eval.policy.len(),
                }
                .into());
            }
            self.tree
                .expand(leaf.node, &leaf.state, &eval.policy, eval.value);
            self.tree.backpropagate(leaf.node, self.config.virtual_loss);
            self.stats.evaluated_leaves += 1;
        }

        self.stats.batches += 1;
        Ok(())
    }

    /// Send the pending boards to the evaluator, in fixed-size chunks padded
    /// with empty boards when the evaluator demands a fixed batch shape.
    async fn evaluate_pending(
        &mut self,
        pending: &[PendingLeaf],
    ) -> Result<Vec<EvalResult>, SearchError> {
        let fixed = self.evaluator.fixed_batch_size().filter(|&cap| cap > 0);
        let chunk_size = fixed.unwrap_or(pending.len());
        let dummy = GameState::new(self.root_state.board_size());

        let mut results = Vec::with_capacity(pending.len());
        for chunk in pending.chunks(chunk_size) {
            let mut positions: Vec<&GameState> = chunk.iter().map(|leaf| &leaf.state).collect();
            if let Some(cap) = fixed {
                self.stats.padded_inputs += (cap - positions.len()) as u32;
                positions.resize(cap, &dummy);
            }

            // Poll the request first so it is in flight while the host gets a turn.
            let (outputs, ()) = tokio::join!(
                self.evaluator.evaluate_batch(&positions),
                tokio::task::yield_now()
            );
            let mut outputs = outputs.map_err(|e| match e {
                EvaluatorError::NotReady => SearchError::EvaluatorNotReady,
                other => SearchError::Evaluator(other),
            })?;
            self.stats.evaluator_calls += 1;

            if outputs.len() != positions.len() {
                return Err(EvaluatorError::BatchMismatch {
                    expected: positions.len(),
                    actual: outputs.len(),
                }
                .into());
            }
            outputs.truncate(chunk.len());
            results.extend(outputs);
        }

        Ok(results)
    }

    /// Get the search tree (for inspection/debugging).
    pub fn tree(&self) -> &MctsTree {
        &self.tree
    }

    pub fn stats(&self) -> &SearchStats {
        &self.stats
    }
}

/// Convenience function to run a single MCTS search.
pub async fn run_mcts<E: Evaluator + ?Sized>(
    evaluator: &E,
    config: &MctsConfig,
    state: &GameState,
    difficulty: Difficulty,
) -> Result<SearchResult, SearchError> {
    let mut search = MctsSearch::new(evaluator, config, state)?;
    search.run(difficulty).await
}

#[cfg(test)]
mod tests;
