//! Configuration for the terminal player
//!
//! Defaults come from the central config (config.toml plus GOMOKU_* env
//! overrides). CLI arguments take highest priority.

use anyhow::{anyhow, Result};
use clap::{ArgAction, Parser};
use engine_config::{load_config, CentralConfig};
use games_gomoku::Stone;
use mcts::{Difficulty, Evaluator, HeuristicEvaluator, MctsConfig, UniformEvaluator};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::level_filters::LevelFilter;

use crate::notation::MAX_LETTERED_SIZE;

// Load central config once at startup
pub static CENTRAL_CONFIG: Lazy<CentralConfig> = Lazy::new(load_config);

fn default_log_level() -> String {
    CENTRAL_CONFIG.common.log_level.clone()
}

fn default_board_size() -> usize {
    CENTRAL_CONFIG.common.board_size
}

fn default_difficulty() -> String {
    CENTRAL_CONFIG.player.difficulty.clone()
}

fn default_human_color() -> String {
    CENTRAL_CONFIG.player.human_color.clone()
}

fn default_evaluator() -> String {
    CENTRAL_CONFIG.player.evaluator.clone()
}

fn default_model_path() -> String {
    CENTRAL_CONFIG.player.model_path.clone()
}

fn default_auto_reply() -> bool {
    CENTRAL_CONFIG.player.auto_reply
}

fn default_hard_simulations() -> u32 {
    CENTRAL_CONFIG.mcts.hard_simulations
}

fn default_constrained_device() -> bool {
    CENTRAL_CONFIG.mcts.constrained_device
}

/// Smallest board a five-in-a-row can fit on.
const MIN_BOARD_SIZE: usize = 5;

#[derive(Parser, Debug, Clone, Serialize, Deserialize)]
#[command(name = "gomoku")]
#[command(about = "Play Gomoku against an MCTS engine in the terminal")]
#[command(
    long_about = "Terminal Gomoku front end. Type moves like h8 (or 7,7) and the engine
replies with a batched PUCT search at the chosen difficulty.

Configuration is loaded from config.toml with GOMOKU_* environment overrides.
CLI arguments take highest priority."
)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value_t = default_log_level())]
    pub log_level: String,

    /// Board size (N for an N x N board)
    #[arg(long, default_value_t = default_board_size())]
    pub board_size: usize,

    /// Engine strength: easy, medium, hard (or 0-2)
    #[arg(long, default_value_t = default_difficulty())]
    pub difficulty: String,

    /// Stone the human plays at the start of each game: black or white
    #[arg(long, default_value_t = default_human_color())]
    pub human_color: String,

    /// Position evaluator: heuristic, uniform or onnx
    #[arg(long, default_value_t = default_evaluator())]
    pub evaluator: String,

    /// ONNX model file for the onnx evaluator
    #[arg(long, default_value_t = default_model_path())]
    pub model_path: String,

    /// Let the engine answer each human move automatically
    #[arg(long, default_value_t = default_auto_reply(), action = ArgAction::Set)]
    pub auto_reply: bool,

    /// Simulations per move at hard difficulty
    #[arg(long, default_value_t = default_hard_simulations())]
    pub hard_simulations: u32,

    /// Evaluate leaves in small batches for low-memory devices
    #[arg(long, default_value_t = default_constrained_device(), action = ArgAction::Set)]
    pub constrained_device: bool,
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if !(MIN_BOARD_SIZE..=MAX_LETTERED_SIZE).contains(&self.board_size) {
            return Err(anyhow!(
                "board_size must be between {} and {}, got {}",
                MIN_BOARD_SIZE,
                MAX_LETTERED_SIZE,
                self.board_size
            ));
        }

        self.difficulty()?;
        self.human_stone()?;
        if parse_evaluator_kind(&self.evaluator)? == EvaluatorKind::Onnx {
            if !cfg!(feature = "onnx") {
                return Err(anyhow!(
                    "evaluator 'onnx' needs a build with the onnx feature"
                ));
            }
            if self.model_path.is_empty() {
                return Err(anyhow!("model_path cannot be empty for the onnx evaluator"));
            }
        }

        if self.hard_simulations == 0 {
            return Err(anyhow!("hard_simulations must be greater than 0"));
        }

        if self.log_level.parse::<LevelFilter>().is_err() {
            return Err(anyhow!(
                "invalid log level '{}', expected one of trace, debug, info, warn, error",
                self.log_level
            ));
        }

        Ok(())
    }

    pub fn difficulty(&self) -> Result<Difficulty> {
        Ok(self.difficulty.parse::<Difficulty>()?)
    }

    pub fn human_stone(&self) -> Result<Stone> {
        match self.human_color.trim().to_ascii_lowercase().as_str() {
            "black" | "b" => Ok(Stone::Black),
            "white" | "w" => Ok(Stone::White),
            other => Err(anyhow!(
                "invalid human_color '{}', expected black or white",
                other
            )),
        }
    }

    /// Search settings: the `[mcts]` section with the CLI overrides applied.
    pub fn mcts_config(&self, central: &engine_config::MctsConfig) -> Result<MctsConfig> {
        let batched_from = central
            .batched_from
            .parse::<Difficulty>()
            .map_err(|e| anyhow!("invalid mcts.batched_from: {}", e))?;
        let batch_size = if self.constrained_device {
            central.constrained_batch_size
        } else {
            central.eval_batch_size
        };

        let mut config = MctsConfig::default()
            .with_budgets([
                central.easy_simulations,
                central.medium_simulations,
                self.hard_simulations,
            ])
            .with_c_puct(central.c_puct as f32)
            .with_eval_batch_size(batch_size)
            .with_force_flush_tail(central.force_flush_tail)
            .with_batched_from(batched_from);
        config.virtual_loss = central.virtual_loss as f32;
        Ok(config)
    }

    /// Construct one of the selectable evaluators.
    pub fn build_evaluator(&self, kind: EvaluatorKind) -> Result<Box<dyn Evaluator>> {
        match kind {
            EvaluatorKind::Heuristic => Ok(Box::new(HeuristicEvaluator::default())),
            EvaluatorKind::Uniform => Ok(Box::new(UniformEvaluator::new())),
            EvaluatorKind::Onnx => self.load_onnx(),
        }
    }

    #[cfg(feature = "onnx")]
    fn load_onnx(&self) -> Result<Box<dyn Evaluator>> {
        let evaluator = mcts::OnnxEvaluator::load(&self.model_path, self.board_size, None)
            .map_err(|e| anyhow!("failed to load {}: {}", self.model_path, e))?;
        Ok(Box::new(evaluator))
    }

    #[cfg(not(feature = "onnx"))]
    fn load_onnx(&self) -> Result<Box<dyn Evaluator>> {
        Err(anyhow!(
            "evaluator 'onnx' needs a build with the onnx feature"
        ))
    }
}

/// Evaluators selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvaluatorKind {
    Heuristic,
    Uniform,
    Onnx,
}

pub fn parse_evaluator_kind(name: &str) -> Result<EvaluatorKind> {
    match name.trim().to_ascii_lowercase().as_str() {
        "heuristic" => Ok(EvaluatorKind::Heuristic),
        "uniform" => Ok(EvaluatorKind::Uniform),
        "onnx" => Ok(EvaluatorKind::Onnx),
        other => Err(anyhow!(
            "unknown evaluator '{}', expected heuristic, uniform or onnx",
            other
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Config {
        Config {
            log_level: "info".into(),
            board_size: 15,
            difficulty: "easy".into(),
            human_color: "black".into(),
            evaluator: "heuristic".into(),
            model_path: "models/gomoku.onnx".into(),
            auto_reply: true,
            hard_simulations: 400,
            constrained_device: false,
        }
    }

    #[test]
    fn validate_accepts_valid_configuration() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn validate_rejects_tiny_board() {
        let mut cfg = base_config();
        cfg.board_size = 4;
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("board_size"));
    }

    #[test]
    fn validate_rejects_unlettered_board() {
        let mut cfg = base_config();
        cfg.board_size = 26;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_unknown_difficulty() {
        let mut cfg = base_config();
        cfg.difficulty = "impossible".into();
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("impossible"));
    }

    #[test]
    fn validate_rejects_unknown_color() {
        let mut cfg = base_config();
        cfg.human_color = "red".into();
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("human_color"));
    }

    #[test]
    fn validate_rejects_unknown_evaluator() {
        let mut cfg = base_config();
        cfg.evaluator = "alphazero".into();
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("unknown evaluator"));
    }

    #[test]
    fn validate_rejects_invalid_log_level() {
        let mut cfg = base_config();
        cfg.log_level = "nope".into();
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("invalid log level"));
    }

    #[test]
    fn validate_rejects_zero_hard_simulations() {
        let mut cfg = base_config();
        cfg.hard_simulations = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn difficulty_accepts_levels() {
        let mut cfg = base_config();
        cfg.difficulty = "2".into();
        assert_eq!(cfg.difficulty().unwrap(), Difficulty::Hard);
    }

    #[test]
    fn human_stone_parses_colors() {
        let mut cfg = base_config();
        assert_eq!(cfg.human_stone().unwrap(), Stone::Black);
        cfg.human_color = "White".into();
        assert_eq!(cfg.human_stone().unwrap(), Stone::White);
    }

    #[test]
    fn mcts_config_applies_overrides() {
        let mut cfg = base_config();
        cfg.hard_simulations = 800;
        let central = engine_config::MctsConfig::default();

        let mcts = cfg.mcts_config(&central).unwrap();
        assert_eq!(mcts.simulation_budgets, [1, 25, 800]);
        assert_eq!(mcts.eval_batch_size, 4);
        assert_eq!(mcts.batched_from, Difficulty::Hard);
        assert!((mcts.c_puct - 5.0).abs() < f32::EPSILON);
    }

    #[test]
    fn mcts_config_uses_constrained_batch() {
        let mut cfg = base_config();
        cfg.constrained_device = true;
        let central = engine_config::MctsConfig::default();

        let mcts = cfg.mcts_config(&central).unwrap();
        assert_eq!(mcts.eval_batch_size, 1);
    }

    #[test]
    fn mcts_config_rejects_bad_batched_from() {
        let cfg = base_config();
        let central = engine_config::MctsConfig {
            batched_from: "sometimes".into(),
            ..Default::default()
        };
        let err = cfg.mcts_config(&central).unwrap_err();
        assert!(err.to_string().contains("batched_from"));
    }

    #[cfg(not(feature = "onnx"))]
    #[test]
    fn validate_rejects_onnx_without_feature() {
        let mut cfg = base_config();
        cfg.evaluator = "onnx".into();
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("onnx feature"));

        let err = cfg.build_evaluator(EvaluatorKind::Onnx).err().unwrap();
        assert!(err.to_string().contains("onnx feature"));
    }

    #[cfg(feature = "onnx")]
    #[test]
    fn validate_rejects_empty_model_path() {
        let mut cfg = base_config();
        cfg.evaluator = "onnx".into();
        cfg.model_path.clear();
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("model_path"));
    }

    #[test]
    fn build_evaluator_for_builtin_kinds() {
        let cfg = base_config();
        for kind in [EvaluatorKind::Heuristic, EvaluatorKind::Uniform] {
            let evaluator = cfg.build_evaluator(kind).unwrap();
            assert!(evaluator.is_ready());
        }
    }

    #[test]
    fn evaluator_kinds_parse() {
        assert_eq!(
            parse_evaluator_kind("Heuristic").unwrap(),
            EvaluatorKind::Heuristic
        );
        assert_eq!(
            parse_evaluator_kind("uniform").unwrap(),
            EvaluatorKind::Uniform
        );
        assert_eq!(parse_evaluator_kind("ONNX").unwrap(), EvaluatorKind::Onnx);
    }
}
