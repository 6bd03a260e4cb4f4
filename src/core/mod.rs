//! Shared identifiers, limits, and the deterministic RNG.

pub mod rng;

pub use rng::BattleRng;

use serde::{Deserialize, Serialize};

/// Maximum creatures per side.
pub const PARTY_MAX: usize = 6;

/// Maximum moves per creature.
pub const MOVES_MAX: usize = 4;

/// Distinguished move index for Struggle, the fallback attack used when
/// every real move has zero PP.
pub const STRUGGLE_INDEX: usize = MOVES_MAX;

/// Width of the encoder output: one HP slot plus four PP slots for each
/// of up to six creatures on both sides.
pub const INPUT_DIM: usize = PARTY_MAX * (1 + MOVES_MAX) * 2;

/// Width of the predictor output: six switch weights, four move weights
/// per creature, and one outcome estimate.
pub const OUTPUT_DIM: usize = PARTY_MAX + PARTY_MAX * MOVES_MAX + 1;

/// Stand-in for zero in encoder slots and training targets. Exact zeros
/// destabilize the regressor's early fits.
pub const EPSILON: f64 = 1e-16;

/// UCB1 exploration constant.
pub const UCB_C: f64 = std::f64::consts::SQRT_2;

/// Default number of search iterations per turn.
pub const DEFAULT_SIMULATIONS: u32 = 50;

/// Default number of predictor updates before rollouts trust it.
pub const DEFAULT_LEARNING_TURNS: u32 = 10;

/// Identity tag for one of the two competing sides.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SideId(pub u8);

impl SideId {
    /// Create a new side ID.
    #[must_use]
    pub const fn new(id: u8) -> Self {
        Self(id)
    }

    /// The other side in a two-sided battle.
    #[must_use]
    pub const fn other(self) -> Self {
        Self(1 - self.0)
    }

    /// Get the raw tag value.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u8 {
        self.0
    }
}

impl std::fmt::Display for SideId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Side({})", self.0)
    }
}

/// Stable identity of a creature, assigned once at party construction
/// and unique within a battle. Used for encoder ordering and tree child
/// keys so the representation survives party reordering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CreatureId(pub u32);

impl CreatureId {
    /// Create a new creature ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw id value.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for CreatureId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimensions_are_consistent() {
        assert_eq!(INPUT_DIM, 60);
        assert_eq!(OUTPUT_DIM, 31);
        assert_eq!(STRUGGLE_INDEX, 4);
    }

    #[test]
    fn test_side_other() {
        assert_eq!(SideId::new(0).other(), SideId::new(1));
        assert_eq!(SideId::new(1).other(), SideId::new(0));
        assert_eq!(format!("{}", SideId::new(0)), "Side(0)");
    }

    #[test]
    fn test_creature_id_ordering() {
        let mut ids = vec![CreatureId::new(3), CreatureId::new(1), CreatureId::new(2)];
        ids.sort();
        assert_eq!(
            ids,
            vec![CreatureId::new(1), CreatureId::new(2), CreatureId::new(3)]
        );
    }
}
