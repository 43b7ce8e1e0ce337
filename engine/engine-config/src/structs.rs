//! Configuration struct definitions.
//!
//! All config structs with serde deserialization support and default values.

use crate::defaults;
use serde::Deserialize;

// ============================================================================
// Serde default functions (required for #[serde(default = "...")])
// These call the accessor functions from defaults module
// ============================================================================

fn d_log_level() -> String {
    defaults::log_level().into()
}
fn d_board_size() -> usize {
    defaults::board_size()
}
fn d_c_puct() -> f64 {
    defaults::c_puct()
}
fn d_easy_sims() -> u32 {
    defaults::easy_simulations()
}
fn d_medium_sims() -> u32 {
    defaults::medium_simulations()
}
fn d_hard_sims() -> u32 {
    defaults::hard_simulations()
}
fn d_eval_batch_size() -> usize {
    defaults::eval_batch_size()
}
fn d_constrained_batch_size() -> usize {
    defaults::constrained_batch_size()
}
fn d_constrained_device() -> bool {
    defaults::constrained_device()
}
fn d_force_flush_tail() -> u32 {
    defaults::force_flush_tail()
}
fn d_virtual_loss() -> f64 {
    defaults::virtual_loss()
}
fn d_batched_from() -> String {
    defaults::batched_from().into()
}
fn d_difficulty() -> String {
    defaults::difficulty().into()
}
fn d_human_color() -> String {
    defaults::human_color().into()
}
fn d_evaluator() -> String {
    defaults::evaluator().into()
}
fn d_model_path() -> String {
    defaults::model_path().into()
}
fn d_auto_reply() -> bool {
    defaults::auto_reply()
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Root configuration structure matching config.toml
#[derive(Debug, Deserialize, Default, Clone)]
pub struct CentralConfig {
    #[serde(default)]
    pub common: CommonConfig,
    #[serde(default)]
    pub mcts: MctsConfig,
    #[serde(default)]
    pub player: PlayerConfig,
}

/// Common configuration shared by all components
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CommonConfig {
    #[serde(default = "d_log_level")]
    pub log_level: String,
    #[serde(default = "d_board_size")]
    pub board_size: usize,
}

impl Default for CommonConfig {
    fn default() -> Self {
        Self {
            log_level: defaults::log_level().into(),
            board_size: defaults::board_size(),
        }
    }
}

/// MCTS (Monte Carlo Tree Search) configuration
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MctsConfig {
    #[serde(default = "d_c_puct")]
    pub c_puct: f64,
    #[serde(default = "d_easy_sims")]
    pub easy_simulations: u32,
    #[serde(default = "d_medium_sims")]
    pub medium_simulations: u32,
    #[serde(default = "d_hard_sims")]
    pub hard_simulations: u32,
    #[serde(default = "d_eval_batch_size")]
    pub eval_batch_size: usize,
    /// Batch size used instead of `eval_batch_size` when `constrained_device` is set.
    #[serde(default = "d_constrained_batch_size")]
    pub constrained_batch_size: usize,
    #[serde(default = "d_constrained_device")]
    pub constrained_device: bool,
    #[serde(default = "d_force_flush_tail")]
    pub force_flush_tail: u32,
    #[serde(default = "d_virtual_loss")]
    pub virtual_loss: f64,
    /// Lowest difficulty ("easy", "medium", "hard") that batches evaluations.
    #[serde(default = "d_batched_from")]
    pub batched_from: String,
}

impl MctsConfig {
    /// Batch size in effect for this device class.
    pub fn effective_batch_size(&self) -> usize {
        if self.constrained_device {
            self.constrained_batch_size
        } else {
            self.eval_batch_size
        }
    }

    /// Budgets ordered easy, medium, hard.
    pub fn simulation_budgets(&self) -> [u32; 3] {
        [
            self.easy_simulations,
            self.medium_simulations,
            self.hard_simulations,
        ]
    }
}

impl Default for MctsConfig {
    fn default() -> Self {
        Self {
            c_puct: defaults::c_puct(),
            easy_simulations: defaults::easy_simulations(),
            medium_simulations: defaults::medium_simulations(),
            hard_simulations: defaults::hard_simulations(),
            eval_batch_size: defaults::eval_batch_size(),
            constrained_batch_size: defaults::constrained_batch_size(),
            constrained_device: defaults::constrained_device(),
            force_flush_tail: defaults::force_flush_tail(),
            virtual_loss: defaults::virtual_loss(),
            batched_from: defaults::batched_from().into(),
        }
    }
}

/// Terminal player configuration
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PlayerConfig {
    #[serde(default = "d_difficulty")]
    pub difficulty: String,
    /// Color the human plays: "black" or "white".
    #[serde(default = "d_human_color")]
    pub human_color: String,
    /// Evaluator: "heuristic", "uniform" or "onnx".
    #[serde(default = "d_evaluator")]
    pub evaluator: String,
    /// ONNX model file for the "onnx" evaluator.
    #[serde(default = "d_model_path")]
    pub model_path: String,
    /// Let the engine answer every human move automatically.
    #[serde(default = "d_auto_reply")]
    pub auto_reply: bool,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            difficulty: defaults::difficulty().into(),
            human_color: defaults::human_color().into(),
            evaluator: defaults::evaluator().into(),
            model_path: defaults::model_path().into(),
            auto_reply: defaults::auto_reply(),
        }
    }
}
