//! Default configuration values loaded from config.defaults.toml.
//!
//! The defaults file is embedded at compile time so every binary agrees on
//! the same values.

use once_cell::sync::Lazy;
use serde::Deserialize;

/// The embedded defaults TOML file (loaded at compile time)
const DEFAULTS_TOML: &str = include_str!("../../../config.defaults.toml");

/// Parsed defaults structure (parsed once at first use)
static DEFAULTS: Lazy<DefaultsConfig> = Lazy::new(|| {
    toml::from_str(DEFAULTS_TOML).expect("config.defaults.toml should be valid TOML")
});

// ============================================================================
// Internal structs for parsing config.defaults.toml
// ============================================================================

#[derive(Debug, Deserialize)]
struct DefaultsConfig {
    common: CommonDefaults,
    mcts: MctsDefaults,
    player: PlayerDefaults,
}

#[derive(Debug, Deserialize)]
struct CommonDefaults {
    log_level: String,
    board_size: usize,
}

#[derive(Debug, Deserialize)]
struct MctsDefaults {
    c_puct: f64,
    easy_simulations: u32,
    medium_simulations: u32,
    hard_simulations: u32,
    eval_batch_size: usize,
    constrained_batch_size: usize,
    constrained_device: bool,
    force_flush_tail: u32,
    virtual_loss: f64,
    batched_from: String,
}

#[derive(Debug, Deserialize)]
struct PlayerDefaults {
    difficulty: String,
    human_color: String,
    evaluator: String,
    model_path: String,
    auto_reply: bool,
}

// ============================================================================
// Public accessor functions
// ============================================================================

// Common
pub fn log_level() -> &'static str {
    &DEFAULTS.common.log_level
}
pub fn board_size() -> usize {
    DEFAULTS.common.board_size
}

// MCTS
pub fn c_puct() -> f64 {
    DEFAULTS.mcts.c_puct
}
pub fn easy_simulations() -> u32 {
    DEFAULTS.mcts.easy_simulations
}
pub fn medium_simulations() -> u32 {
    DEFAULTS.mcts.medium_simulations
}
pub fn hard_simulations() -> u32 {
    DEFAULTS.mcts.hard_simulations
}
pub fn eval_batch_size() -> usize {
    DEFAULTS.mcts.eval_batch_size
}
pub fn constrained_batch_size() -> usize {
    DEFAULTS.mcts.constrained_batch_size
}
pub fn constrained_device() -> bool {
    DEFAULTS.mcts.constrained_device
}
pub fn force_flush_tail() -> u32 {
    DEFAULTS.mcts.force_flush_tail
}
pub fn virtual_loss() -> f64 {
    DEFAULTS.mcts.virtual_loss
}
pub fn batched_from() -> &'static str {
    &DEFAULTS.mcts.batched_from
}

// Player
pub fn difficulty() -> &'static str {
    &DEFAULTS.player.difficulty
}
pub fn human_color() -> &'static str {
    &DEFAULTS.player.human_color
}
pub fn evaluator() -> &'static str {
    &DEFAULTS.player.evaluator
}
pub fn model_path() -> &'static str {
    &DEFAULTS.player.model_path
}
pub fn auto_reply() -> bool {
    DEFAULTS.player.auto_reply
}
