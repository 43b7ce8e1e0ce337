//! MCTS configuration parameters.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Discrete playing strength. Each level maps to a simulation budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    /// Numeric level: 0, 1 or 2.
    pub fn level(self) -> usize {
        self as usize
    }

    pub fn from_level(level: usize) -> Option<Self> {
        Self::ALL.get(level).copied()
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Easy => write!(f, "easy"),
            Difficulty::Medium => write!(f, "medium"),
            Difficulty::Hard => write!(f, "hard"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown difficulty '{0}' (expected easy, medium, hard or 0-2)")]
pub struct ParseDifficultyError(pub String);

impl FromStr for Difficulty {
    type Err = ParseDifficultyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" | "0" => Ok(Difficulty::Easy),
            "medium" | "1" => Ok(Difficulty::Medium),
            "hard" | "2" => Ok(Difficulty::Hard),
            _ => Err(ParseDifficultyError(s.to_string())),
        }
    }
}

/// Configuration for Monte Carlo Tree Search.
#[derive(Debug, Clone)]
pub struct MctsConfig {
    /// Exploration constant for the PUCT formula.
    pub c_puct: f32,

    /// Simulations per decision, indexed by [`Difficulty::level`].
    /// One extra simulation is always run on top of the budget.
    pub simulation_budgets: [u32; 3],

    /// Pending leaves collected before a non-forced flush.
    /// Set to 1 to evaluate every leaf as soon as it is reached.
    pub eval_batch_size: usize,

    /// The last `force_flush_tail` simulations always flush before selecting,
    /// so no leaf is left pending at the end of the budget.
    pub force_flush_tail: u32,

    /// Pretend visits added to a child while its evaluation is pending.
    pub virtual_loss: f32,

    /// Lowest difficulty that batches leaf evaluations. Below it every
    /// simulation flushes first.
    pub batched_from: Difficulty,
}

impl Default for MctsConfig {
    fn default() -> Self {
        Self {
            c_puct: 5.0,
            simulation_budgets: [1, 25, 400],
            eval_batch_size: 4,
            force_flush_tail: 4,
            virtual_loss: 1.0,
            batched_from: Difficulty::Hard,
        }
    }
}

impl MctsConfig {
    /// Single-leaf batches for memory-constrained targets.
    pub fn for_constrained_device() -> Self {
        Self {
            eval_batch_size: 1,
            ..Self::default()
        }
    }

    /// Create a fast config for testing.
    pub fn for_testing() -> Self {
        Self {
            simulation_budgets: [1, 8, 64],
            ..Self::default()
        }
    }

    /// Builder pattern: set per-difficulty budgets.
    pub fn with_budgets(mut self, budgets: [u32; 3]) -> Self {
        self.simulation_budgets = budgets;
        self
    }

    /// Builder pattern: set c_puct exploration constant.
    pub fn with_c_puct(mut self, c: f32) -> Self {
        self.c_puct = c;
        self
    }

    /// Builder pattern: set evaluation batch size.
    pub fn with_eval_batch_size(mut self, size: usize) -> Self {
        self.eval_batch_size = size.max(1);
        self
    }

    pub fn with_force_flush_tail(mut self, tail: u32) -> Self {
        self.force_flush_tail = tail;
        self
    }

    pub fn with_batched_from(mut self, difficulty: Difficulty) -> Self {
        self.batched_from = difficulty;
        self
    }

    /// Simulation budget for a difficulty, not counting the extra final simulation.
    pub fn simulation_budget(&self, difficulty: Difficulty) -> u32 {
        self.simulation_budgets[difficulty.level()]
    }

    /// Whether searches at this difficulty queue leaves for batched evaluation.
    pub fn is_batched(&self, difficulty: Difficulty) -> bool {
        difficulty >= self.batched_from && self.eval_batch_size > 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MctsConfig::default();
        assert!((config.c_puct - 5.0).abs() < 1e-6);
        assert_eq!(config.simulation_budget(Difficulty::Easy), 1);
        assert_eq!(config.simulation_budget(Difficulty::Medium), 25);
        assert_eq!(config.simulation_budget(Difficulty::Hard), 400);
        assert_eq!(config.eval_batch_size, 4);
    }

    #[test]
    fn test_batching_gate() {
        let config = MctsConfig::default();
        assert!(!config.is_batched(Difficulty::Easy));
        assert!(!config.is_batched(Difficulty::Medium));
        assert!(config.is_batched(Difficulty::Hard));

        let constrained = MctsConfig::for_constrained_device();
        assert_eq!(constrained.eval_batch_size, 1);
        assert!(!constrained.is_batched(Difficulty::Hard));
    }

    #[test]
    fn test_builder_pattern() {
        let config = MctsConfig::default()
            .with_budgets([2, 4, 8])
            .with_eval_batch_size(0)
            .with_batched_from(Difficulty::Medium);

        assert_eq!(config.simulation_budget(Difficulty::Hard), 8);
        assert_eq!(config.eval_batch_size, 1);
        assert_eq!(config.batched_from, Difficulty::Medium);
    }

    #[test]
    fn test_difficulty_parsing() {
        assert_eq!("easy".parse::<Difficulty>(), Ok(Difficulty::Easy));
        assert_eq!(" Hard ".parse::<Difficulty>(), Ok(Difficulty::Hard));
        assert_eq!("1".parse::<Difficulty>(), Ok(Difficulty::Medium));
        assert!("expert".parse::<Difficulty>().is_err());

        assert_eq!(Difficulty::from_level(2), Some(Difficulty::Hard));
        assert_eq!(Difficulty::from_level(3), None);
        assert_eq!(Difficulty::Medium.to_string(), "medium");
    }
}
