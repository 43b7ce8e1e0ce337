//! Evaluator trait for position evaluation.
//!
//! The evaluator provides policy (move probabilities) and value estimates
//! for batches of positions. In play this is a neural network behind an
//! async inference runtime. For testing and model-free play,
//! [`UniformEvaluator`] and [`crate::HeuristicEvaluator`] are provided.

use std::sync::Arc;

use async_trait::async_trait;
use games_gomoku::GameState;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::info;

/// Errors that can occur during evaluation.
#[derive(Debug, Error)]
pub enum EvaluatorError {
    #[error("Evaluator is not ready")]
    NotReady,

    #[error("Evaluation failed: {0}")]
    EvaluationFailed(String),

    #[error("Model error: {0}")]
    ModelError(String),

    #[error("Batch mismatch: expected {expected} outputs, got {actual}")]
    BatchMismatch { expected: usize, actual: usize },

    #[error("Invalid policy: expected {expected} cells, got {actual}")]
    InvalidPolicy { expected: usize, actual: usize },
}

/// Result of evaluating a game state.
#[derive(Debug, Clone)]
pub struct EvalResult {
    /// Policy: one probability per cell in row-major order.
    /// Occupied cells may carry mass; the search discards it.
    pub policy: Vec<f32>,

    /// Value estimate for the side to move.
    /// Range: -1.0 (certain loss) to +1.0 (certain win).
    pub value: f32,
}

/// Trait for position evaluators.
///
/// Implementations could be:
/// - UniformEvaluator: Returns uniform policy (for testing)
/// - HeuristicEvaluator: Line-pattern policy without a model
/// - A neural network wrapper running on an inference backend
#[async_trait]
pub trait Evaluator: Send + Sync {
    /// Whether the evaluator can serve requests (e.g. its model is loaded).
    fn is_ready(&self) -> bool {
        true
    }

    /// Batch shape the backend requires, if any. Requests are padded to it.
    fn fixed_batch_size(&self) -> Option<usize> {
        None
    }

    /// Evaluate positions, returning one result per input in the same order.
    async fn evaluate_batch(
        &self,
        positions: &[&GameState],
    ) -> Result<Vec<EvalResult>, EvaluatorError>;

    /// Evaluate a single position (a batch of one).
    async fn evaluate(&self, position: &GameState) -> Result<EvalResult, EvaluatorError> {
        let mut results = self.evaluate_batch(&[position]).await?;
        if results.len() != 1 {
            return Err(EvaluatorError::BatchMismatch {
                expected: 1,
                actual: results.len(),
            });
        }
        results.pop().ok_or(EvaluatorError::BatchMismatch {
            expected: 1,
            actual: 0,
        })
    }
}

#[async_trait]
impl<E: Evaluator + ?Sized> Evaluator for Arc<E> {
    fn is_ready(&self) -> bool {
        (**self).is_ready()
    }

    fn fixed_batch_size(&self) -> Option<usize> {
        (**self).fixed_batch_size()
    }

    async fn evaluate_batch(
        &self,
        positions: &[&GameState],
    ) -> Result<Vec<EvalResult>, EvaluatorError> {
        (**self).evaluate_batch(positions).await
    }
}

/// Uniform evaluator that assigns equal probability to all empty cells.
/// Value is always 0.0 (neutral). Useful for testing MCTS without a model.
#[derive(Debug, Clone, Default)]
pub struct UniformEvaluator;

impl UniformEvaluator {
    pub fn new() -> Self {
        Self
    }

    fn evaluate_one(state: &GameState) -> EvalResult {
        let mut policy = vec![0.0; state.num_cells()];
        let legal = state.legal_moves();

        if !legal.is_empty() {
            let prob = 1.0 / legal.len() as f32;
            for pos in legal {
                policy[pos.index(state.board_size())] = prob;
            }
        }

        EvalResult { policy, value: 0.0 }
    }
}

#[async_trait]
impl Evaluator for UniformEvaluator {
    async fn evaluate_batch(
        &self,
        positions: &[&GameState],
    ) -> Result<Vec<EvalResult>, EvaluatorError> {
        Ok(positions.iter().map(|s| Self::evaluate_one(s)).collect())
    }
}

/// Hot-swappable evaluator slot.
///
/// Starts empty (not ready) until an evaluator is installed. Swapping waits
/// for in-flight batches to finish.
#[derive(Clone, Default)]
pub struct SharedEvaluator {
    slot: Arc<RwLock<Option<Box<dyn Evaluator>>>>,
}

impl SharedEvaluator {
    /// Create an empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a slot that already holds an evaluator.
    pub fn with_evaluator(evaluator: Box<dyn Evaluator>) -> Self {
        Self {
            slot: Arc::new(RwLock::new(Some(evaluator))),
        }
    }

    /// Install or replace the evaluator.
    pub async fn install(&self, evaluator: Box<dyn Evaluator>) {
        let mut guard = self.slot.write().await;
        let replaced = guard.is_some();
        *guard = Some(evaluator);
        info!(replaced, "Evaluator installed");
    }

    /// Remove the evaluator; the slot reports not-ready afterwards.
    pub async fn clear(&self) {
        self.slot.write().await.take();
    }
}

#[async_trait]
impl Evaluator for SharedEvaluator {
    fn is_ready(&self) -> bool {
        self.slot
            .try_read()
            .map(|guard| guard.as_ref().is_some_and(|e| e.is_ready()))
            .unwrap_or(false)
    }

    fn fixed_batch_size(&self) -> Option<usize> {
        self.slot
            .try_read()
            .ok()
            .and_then(|guard| guard.as_ref().and_then(|e| e.fixed_batch_size()))
    }

    async fn evaluate_batch(
        &self,
        positions: &[&GameState],
    ) -> Result<Vec<EvalResult>, EvaluatorError> {
        let guard = self.slot.read().await;
        match guard.as_ref() {
            Some(evaluator) => evaluator.evaluate_batch(positions).await,
            None => Err(EvaluatorError::NotReady),
        }
    }
}
