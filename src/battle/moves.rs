//! Moves and their availability.

use serde::{Deserialize, Serialize};

use super::element::ElementType;
use super::status::StatusCondition;

/// A damaging move a creature can use.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Move {
    /// Display name.
    pub name: String,

    /// Base power fed into the damage formula.
    pub base_damage: u16,

    /// Remaining uses. A move with zero PP is unavailable.
    pub pp: u16,

    /// Uses the move starts with.
    pub base_pp: u16,

    /// Element used for the effectiveness lookup.
    pub element: ElementType,

    /// Special moves use special attack/defense in the damage formula,
    /// physical ones use attack/defense.
    pub is_special: bool,

    /// HP restored to the attacker on a hit.
    pub base_heal: u16,

    /// Status inflicted on the defender on a hit.
    pub status_inflict: Option<StatusCondition>,
}

impl Move {
    /// Create a move with full PP.
    pub fn new(
        name: impl Into<String>,
        base_damage: u16,
        pp: u16,
        element: ElementType,
        is_special: bool,
    ) -> Self {
        Self {
            name: name.into(),
            base_damage,
            pp,
            base_pp: pp,
            element,
            is_special,
            base_heal: 0,
            status_inflict: None,
        }
    }

    /// Attach an inflicted status.
    #[must_use]
    pub fn with_status(mut self, status: StatusCondition) -> Self {
        self.status_inflict = Some(status);
        self
    }

    /// Attach an on-hit heal.
    #[must_use]
    pub fn with_heal(mut self, heal: u16) -> Self {
        self.base_heal = heal;
        self
    }

    /// A move is available while it has PP left.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.pp > 0
    }

    /// Spend one use. Saturates at zero.
    pub fn spend_pp(&mut self) {
        self.pp = self.pp.saturating_sub(1);
    }

    /// The fallback attack used when every real move is exhausted.
    /// Synthesized fresh on each use, so it never runs out.
    #[must_use]
    pub fn struggle() -> Self {
        Self::new("Struggle", 50, 1, ElementType::Typeless, true)
    }
}

impl std::fmt::Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}/{} PP)", self.name, self.pp, self.base_pp)
    }
}
