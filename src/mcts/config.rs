//! Search configuration parameters.

use serde::{Deserialize, Serialize};

use crate::core::{DEFAULT_LEARNING_TURNS, DEFAULT_SIMULATIONS, UCB_C};
use crate::policy::Policy;

/// Which baseline models the opponent during selection and rollouts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OpponentBaseline {
    /// Uniform random over legal actions.
    #[default]
    Random,
    /// Always the highest expected-damage move.
    HighestDamage,
}

impl OpponentBaseline {
    /// The policy this baseline stands for.
    #[must_use]
    pub fn policy(self) -> Policy {
        match self {
            Self::Random => Policy::Random,
            Self::HighestDamage => Policy::HighestDamage,
        }
    }
}

/// Search configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Iterations per `take_turn` call.
    pub num_simulations: u32,

    /// Predictor updates to observe before rollouts trust it over the
    /// random baseline.
    pub learning_turns: u32,

    /// UCB1 exploration constant.
    pub exploration: f64,

    /// Opponent model used during search.
    pub opponent_baseline: OpponentBaseline,

    /// Seed for the search RNG. Same seed, same search.
    pub seed: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            num_simulations: DEFAULT_SIMULATIONS,
            learning_turns: DEFAULT_LEARNING_TURNS,
            exploration: UCB_C,
            opponent_baseline: OpponentBaseline::Random,
            seed: 42,
        }
    }
}

impl SearchConfig {
    /// Set the iteration count.
    #[must_use]
    pub fn with_simulations(mut self, n: u32) -> Self {
        self.num_simulations = n;
        self
    }

    /// Set the RNG seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the opponent baseline.
    #[must_use]
    pub fn with_opponent(mut self, baseline: OpponentBaseline) -> Self {
        self.opponent_baseline = baseline;
        self
    }

    /// Set the learning warm-up length.
    #[must_use]
    pub fn with_learning_turns(mut self, turns: u32) -> Self {
        self.learning_turns = turns;
        self
    }
}
