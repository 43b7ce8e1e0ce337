//! ONNX Runtime evaluator for policy/value networks.
//!
//! # Model Format
//!
//! - Input: the model's first input, shape (batch, 5, N, N) float32, filled
//!   with [`Observation`] planes.
//! - Output: "policy", shape (batch, N*N), move probabilities. Models that
//!   export "policy_logits" instead get a softmax applied here.
//! - Output: "value", shape (batch, 1), from the side to move's perspective.
//!
//! Inference runs on the blocking pool so the search task stays responsive
//! while a batch is in flight.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use async_trait::async_trait;
use games_gomoku::{GameState, Observation, NUM_PLANES};
use ort::{session::Session, value::Value};
use tracing::{debug, info};

use crate::evaluator::{EvalResult, Evaluator, EvaluatorError};

/// Batches between periodic timing logs.
const STATS_LOG_INTERVAL: u64 = 1_000;

/// Inference counters.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OnnxStats {
    pub batches: u64,
    pub positions: u64,
    pub avg_batch_ms: f64,
}

/// Evaluator backed by an ONNX Runtime session.
///
/// `Session::run` needs `&mut self`, so the session sits behind a mutex
/// shared with the blocking inference task.
pub struct OnnxEvaluator {
    session: Arc<Mutex<Session>>,
    input_name: String,
    board_size: usize,
    fixed_batch: Option<usize>,
    batches: AtomicU64,
    positions: AtomicU64,
    total_time_us: AtomicU64,
}

impl std::fmt::Debug for OnnxEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxEvaluator")
            .field("input_name", &self.input_name)
            .field("board_size", &self.board_size)
            .field("fixed_batch", &self.fixed_batch)
            .finish_non_exhaustive()
    }
}

impl OnnxEvaluator {
    /// Load a model for `board_size` boards and warm it up with one empty board.
    ///
    /// `fixed_batch` declares a model exported with a fixed batch dimension;
    /// the search then pads every request to that size.
    pub fn load<P: AsRef<Path>>(
        model_path: P,
        board_size: usize,
        fixed_batch: Option<usize>,
    ) -> Result<Self, EvaluatorError> {
        let model_path = model_path.as_ref();
        let session = Session::builder()
            .map_err(|e| {
                EvaluatorError::ModelError(format!("Failed to create session builder: {}", e))
            })?
            .with_intra_threads(4)
            .map_err(|e| EvaluatorError::ModelError(format!("Failed to set intra threads: {}", e)))?
            .commit_from_file(model_path)
            .map_err(|e| EvaluatorError::ModelError(format!("Failed to load model: {}", e)))?;

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .ok_or_else(|| EvaluatorError::ModelError("Model has no inputs".to_string()))?;

        let evaluator = Self {
            session: Arc::new(Mutex::new(session)),
            input_name,
            board_size,
            fixed_batch: fixed_batch.filter(|&n| n > 0),
            batches: AtomicU64::new(0),
            positions: AtomicU64::new(0),
            total_time_us: AtomicU64::new(0),
        };

        let warm_up = GameState::new(board_size);
        let batch = vec![&warm_up; evaluator.fixed_batch.unwrap_or(1)];
        evaluator.infer(encode_batch(&batch), batch.len())?;

        info!(
            path = %model_path.display(),
            input = %evaluator.input_name,
            board_size,
            "ONNX model loaded"
        );
        Ok(evaluator)
    }

    pub fn board_size(&self) -> usize {
        self.board_size
    }

    pub fn stats(&self) -> OnnxStats {
        let batches = self.batches.load(Ordering::Relaxed);
        let total_us = self.total_time_us.load(Ordering::Relaxed);
        OnnxStats {
            batches,
            positions: self.positions.load(Ordering::Relaxed),
            avg_batch_ms: if batches == 0 {
                0.0
            } else {
                total_us as f64 / batches as f64 / 1000.0
            },
        }
    }

    /// Run one forward pass on the calling thread.
    fn infer(&self, flat: Vec<f32>, batch: usize) -> Result<Vec<EvalResult>, EvaluatorError> {
        run_session(&self.session, &self.input_name, self.board_size, flat, batch)
    }

    fn record(&self, batch: usize, elapsed_us: u64) {
        let total_us = self.total_time_us.fetch_add(elapsed_us, Ordering::Relaxed) + elapsed_us;
        self.positions.fetch_add(batch as u64, Ordering::Relaxed);
        let batches = self.batches.fetch_add(1, Ordering::Relaxed) + 1;

        if batches % STATS_LOG_INTERVAL == 0 {
            debug!(
                batches,
                avg_ms = total_us as f64 / batches as f64 / 1000.0,
                "ONNX inference stats"
            );
        }
    }
}

#[async_trait]
impl Evaluator for OnnxEvaluator {
    fn fixed_batch_size(&self) -> Option<usize> {
        self.fixed_batch
    }

    async fn evaluate_batch(
        &self,
        positions: &[&GameState],
    ) -> Result<Vec<EvalResult>, EvaluatorError> {
        if positions.is_empty() {
            return Ok(Vec::new());
        }
        if let Some(state) = positions.iter().find(|s| s.board_size() != self.board_size) {
            return Err(EvaluatorError::EvaluationFailed(format!(
                "model expects {}x{} boards, got {}x{}",
                self.board_size,
                self.board_size,
                state.board_size(),
                state.board_size()
            )));
        }

        let batch = positions.len();
        let flat = encode_batch(positions);
        let session = Arc::clone(&self.session);
        let input_name = self.input_name.clone();
        let board_size = self.board_size;

        let start = Instant::now();
        let results = tokio::task::spawn_blocking(move || {
            run_session(&session, &input_name, board_size, flat, batch)
        })
        .await
        .map_err(|e| EvaluatorError::EvaluationFailed(format!("Inference task failed: {}", e)))??;
        self.record(batch, start.elapsed().as_micros() as u64);

        Ok(results)
    }
}

/// Flatten the observation planes of every position, batch-major.
fn encode_batch(positions: &[&GameState]) -> Vec<f32> {
    let mut flat = Vec::with_capacity(
        positions.len() * NUM_PLANES * positions.first().map_or(0, |s| s.num_cells()),
    );
    for state in positions {
        flat.extend(Observation::from_state(state).into_planes());
    }
    flat
}

fn run_session(
    session: &Mutex<Session>,
    input_name: &str,
    board_size: usize,
    flat: Vec<f32>,
    batch: usize,
) -> Result<Vec<EvalResult>, EvaluatorError> {
    let input_array =
        ndarray::Array4::from_shape_vec((batch, NUM_PLANES, board_size, board_size), flat)
            .map_err(|e| {
                EvaluatorError::EvaluationFailed(format!("Failed to create input array: {}", e))
            })?;
    let input_value = Value::from_array(input_array).map_err(|e| {
        EvaluatorError::ModelError(format!("Failed to create input tensor: {}", e))
    })?;

    // Extract everything inside the lock scope
    let (policy, values, logits) = {
        let mut session = session.lock().map_err(|e| {
            EvaluatorError::EvaluationFailed(format!("Failed to acquire session lock: {}", e))
        })?;
        let outputs = session
            .run(ort::inputs![input_name => input_value])
            .map_err(|e| EvaluatorError::EvaluationFailed(format!("Inference failed: {}", e)))?;

        let (policy_output, logits) = match outputs.get("policy") {
            Some(output) => (output, false),
            None => (
                outputs.get("policy_logits").ok_or_else(|| {
                    EvaluatorError::ModelError("Missing policy output".to_string())
                })?,
                true,
            ),
        };
        let (_shape, policy_data) = policy_output.try_extract_tensor::<f32>().map_err(|e| {
            EvaluatorError::ModelError(format!("Failed to extract policy tensor: {}", e))
        })?;

        let value_output = outputs
            .get("value")
            .ok_or_else(|| EvaluatorError::ModelError("Missing value output".to_string()))?;
        let (_shape, value_data) = value_output.try_extract_tensor::<f32>().map_err(|e| {
            EvaluatorError::ModelError(format!("Failed to extract value tensor: {}", e))
        })?;

        (policy_data.to_vec(), value_data.to_vec(), logits)
    };

    split_outputs(&policy, &values, batch, board_size * board_size, logits)
}

/// Cut flat network outputs into one result per position.
fn split_outputs(
    policy: &[f32],
    values: &[f32],
    batch: usize,
    cells: usize,
    logits: bool,
) -> Result<Vec<EvalResult>, EvaluatorError> {
    if policy.len() != batch * cells {
        return Err(EvaluatorError::InvalidPolicy {
            expected: cells,
            actual: policy.len() / batch.max(1),
        });
    }
    if values.len() != batch {
        return Err(EvaluatorError::BatchMismatch {
            expected: batch,
            actual: values.len(),
        });
    }

    Ok(policy
        .chunks_exact(cells)
        .zip(values)
        .map(|(row, &value)| EvalResult {
            policy: if logits { softmax(row) } else { row.to_vec() },
            value,
        })
        .collect())
}

fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    if !max.is_finite() {
        return vec![0.0; logits.len()];
    }
    let exps: Vec<f32> = logits.iter().map(|&l| (l - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}
