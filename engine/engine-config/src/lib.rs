//! Centralized configuration loading from config.toml.
//!
//! This crate provides configuration structs and loading logic shared
//! by the engine and the terminal player.
//!
//! # Configuration Priority
//!
//! Settings are loaded with the following priority (highest to lowest):
//! 1. Command-line flags (applied by the binary)
//! 2. Environment variables (`GOMOKU_<SECTION>_<KEY>`)
//! 3. config.toml file
//! 4. Built-in defaults
//!
//! # Environment Variable Override Pattern
//!
//! ```text
//! GOMOKU_<SECTION>_<KEY>=value
//!
//! Examples:
//!     GOMOKU_COMMON_LOG_LEVEL=debug
//!     GOMOKU_COMMON_BOARD_SIZE=9
//!     GOMOKU_MCTS_HARD_SIMULATIONS=800
//!     GOMOKU_MCTS_CONSTRAINED_DEVICE=true
//!     GOMOKU_PLAYER_DIFFICULTY=medium
//! ```

mod defaults;
mod loader;
mod structs;

pub use defaults::*;
pub use loader::{apply_env_overrides, load_config, load_from_path, CONFIG_SEARCH_PATHS};
pub use structs::*;
