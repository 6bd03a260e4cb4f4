//! Search statistics for diagnostics and tuning.

use serde::{Deserialize, Serialize};

/// Counters collected over one search.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SearchStats {
    /// Completed iterations.
    pub iterations: u32,

    /// Rollouts played to termination.
    pub rollouts: u32,

    /// Nodes added to the tree.
    pub nodes_expanded: u32,

    /// Predictor fits triggered by terminals during expansion.
    pub predictor_updates: u32,

    /// Deepest node reached.
    pub max_depth: u16,

    /// Wall time spent searching (microseconds).
    pub time_us: u64,
}

impl SearchStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Iterations per second over the recorded wall time.
    #[must_use]
    pub fn iterations_per_second(&self) -> f64 {
        if self.time_us == 0 {
            0.0
        } else {
            f64::from(self.iterations) / (self.time_us as f64 / 1_000_000.0)
        }
    }
}
