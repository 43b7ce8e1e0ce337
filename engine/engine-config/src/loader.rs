//! Configuration loading logic.
//!
//! Handles loading config from files and applying environment variable overrides.

use crate::CentralConfig;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Standard locations to search for config.toml
pub const CONFIG_SEARCH_PATHS: &[&str] = &[
    "config.toml",    // Current directory
    "../config.toml", // Parent directory (when running from subdirectory)
];

/// Load the central configuration from config.toml.
///
/// Searches for config.toml in the following order:
/// 1. Path specified by GOMOKU_CONFIG environment variable
/// 2. Current directory (config.toml)
/// 3. Parent directory (../config.toml)
///
/// After loading, environment variable overrides are applied.
pub fn load_config() -> CentralConfig {
    // Check for explicit config path
    if let Ok(path) = std::env::var("GOMOKU_CONFIG") {
        let path = PathBuf::from(&path);
        if path.exists() {
            info!("Loading config from GOMOKU_CONFIG: {}", path.display());
            return load_from_path(&path);
        }
        warn!(
            "GOMOKU_CONFIG={} not found, searching defaults",
            path.display()
        );
    }

    // Search default locations
    for path_str in CONFIG_SEARCH_PATHS {
        let path = Path::new(path_str);
        if path.exists() {
            info!("Loading config from {}", path.display());
            return load_from_path(path);
        }
    }

    // Fall back to defaults
    debug!("No config.toml found, using built-in defaults");
    apply_env_overrides(CentralConfig::default())
}

/// Load configuration from a specific path.
///
/// Unreadable or malformed files fall back to the built-in defaults.
pub fn load_from_path(path: &Path) -> CentralConfig {
    match std::fs::read_to_string(path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => apply_env_overrides(config),
            Err(e) => {
                warn!("Failed to parse {}: {}, using defaults", path.display(), e);
                apply_env_overrides(CentralConfig::default())
            }
        },
        Err(e) => {
            warn!("Failed to read {}: {}, using defaults", path.display(), e);
            apply_env_overrides(CentralConfig::default())
        }
    }
}

/// Macro to reduce env override boilerplate
macro_rules! env_override {
    // String field
    ($config:expr, $section:ident . $field:ident, $key:expr) => {
        if let Ok(v) = std::env::var($key) {
            $config.$section.$field = v;
        }
    };
    // Parseable field (usize, u32, f64, bool, etc.)
    ($config:expr, $section:ident . $field:ident, $key:expr, parse) => {
        match std::env::var($key).map(|s| s.trim().parse()) {
            Ok(Ok(v)) => $config.$section.$field = v,
            Ok(Err(_)) => warn!("Ignoring unparseable {}", $key),
            Err(_) => {}
        }
    };
}

/// Apply environment variable overrides to a configuration.
///
/// Environment variables follow the pattern: GOMOKU_<SECTION>_<KEY>
pub fn apply_env_overrides(mut config: CentralConfig) -> CentralConfig {
    // Common
    env_override!(config, common.log_level, "GOMOKU_COMMON_LOG_LEVEL");
    env_override!(
        config,
        common.board_size,
        "GOMOKU_COMMON_BOARD_SIZE",
        parse
    );

    // MCTS
    env_override!(config, mcts.c_puct, "GOMOKU_MCTS_C_PUCT", parse);
    env_override!(
        config,
        mcts.easy_simulations,
        "GOMOKU_MCTS_EASY_SIMULATIONS",
        parse
    );
    env_override!(
        config,
        mcts.medium_simulations,
        "GOMOKU_MCTS_MEDIUM_SIMULATIONS",
        parse
    );
    env_override!(
        config,
        mcts.hard_simulations,
        "GOMOKU_MCTS_HARD_SIMULATIONS",
        parse
    );
    env_override!(
        config,
        mcts.eval_batch_size,
        "GOMOKU_MCTS_EVAL_BATCH_SIZE",
        parse
    );
    env_override!(
        config,
        mcts.constrained_batch_size,
        "GOMOKU_MCTS_CONSTRAINED_BATCH_SIZE",
        parse
    );
    env_override!(
        config,
        mcts.constrained_device,
        "GOMOKU_MCTS_CONSTRAINED_DEVICE",
        parse
    );
    env_override!(
        config,
        mcts.force_flush_tail,
        "GOMOKU_MCTS_FORCE_FLUSH_TAIL",
        parse
    );
    env_override!(
        config,
        mcts.virtual_loss,
        "GOMOKU_MCTS_VIRTUAL_LOSS",
        parse
    );
    env_override!(config, mcts.batched_from, "GOMOKU_MCTS_BATCHED_FROM");

    // Player
    env_override!(config, player.difficulty, "GOMOKU_PLAYER_DIFFICULTY");
    env_override!(config, player.human_color, "GOMOKU_PLAYER_HUMAN_COLOR");
    env_override!(config, player.evaluator, "GOMOKU_PLAYER_EVALUATOR");
    env_override!(config, player.model_path, "GOMOKU_PLAYER_MODEL_PATH");
    env_override!(
        config,
        player.auto_reply,
        "GOMOKU_PLAYER_AUTO_REPLY",
        parse
    );

    config
}
