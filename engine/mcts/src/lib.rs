//! Monte Carlo Tree Search (MCTS) for Gomoku with batched evaluation.
//!
//! # Overview
//!
//! MCTS builds a search tree by running simulations. Each simulation:
//!
//! 1. **Selection**: Traverse the tree with PUCT to balance exploration and
//!    exploitation. Every child entered receives one unit of virtual loss.
//! 2. **Queueing**: Non-terminal leaves wait in a pending queue; terminal
//!    leaves are backed up at once with a fixed value.
//! 3. **Expansion & Evaluation**: A flush sends all pending boards to the
//!    [`Evaluator`] in one batch and expands each leaf with the returned
//!    policy, renormalized over legal moves.
//! 4. **Backpropagation**: Update visit counts and values along the path to
//!    the root, alternating sign each ply and releasing virtual loss.
//!
//! Simulations run sequentially. The only suspension point is the awaited
//! evaluator call, which is polled alongside a yield so the host stays
//! responsive while the batch is in flight.
//!
//! # Usage
//!
//! ```rust,ignore
//! use games_gomoku::GameState;
//! use mcts::{Difficulty, MctsAgent, MctsConfig, UniformEvaluator};
//!
//! let agent = MctsAgent::new(UniformEvaluator::new(), MctsConfig::default())
//!     .with_difficulty(Difficulty::Medium);
//!
//! let state = GameState::new(15);
//! let pos = agent.choose_move(&state).await?;
//! println!("Engine plays {}", pos);
//! ```
//!
//! # Configuration
//!
//! The [`MctsConfig`] struct controls search behavior:
//!
//! - `simulation_budgets`: Simulations per difficulty (default: 1 / 25 / 400)
//! - `c_puct`: Exploration constant for PUCT (default: 5.0)
//! - `eval_batch_size`: Pending leaves per flush (default: 4, 1 on constrained devices)
//! - `batched_from`: Lowest difficulty that batches (default: hard)
//!
//! # Evaluators
//!
//! - [`UniformEvaluator`]: Uniform policy over empty cells (for testing)
//! - [`HeuristicEvaluator`]: Line-pattern policy, playable without a model
//! - [`SharedEvaluator`]: Hot-swappable slot, not ready while empty
//! - `OnnxEvaluator`: ONNX Runtime policy/value network (`onnx` feature)

pub mod agent;
pub mod config;
pub mod evaluator;
pub mod heuristic;
pub mod node;
#[cfg(feature = "onnx")]
pub mod onnx;
pub mod search;
pub mod tree;

// Re-export main types
pub use agent::{win_percentage, MctsAgent};
pub use config::{Difficulty, MctsConfig, ParseDifficultyError};
pub use evaluator::{EvalResult, Evaluator, EvaluatorError, SharedEvaluator, UniformEvaluator};
pub use heuristic::HeuristicEvaluator;
pub use node::{MctsNode, NodeId};
#[cfg(feature = "onnx")]
pub use onnx::{OnnxEvaluator, OnnxStats};
pub use search::{run_mcts, MctsSearch, SearchError, SearchResult, SearchStats};
pub use tree::{MctsTree, TreeStats};
