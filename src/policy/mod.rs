//! Turn policies: how a side picks its next action.
//!
//! Policies are a closed sum type rather than a trait object so sides
//! stay cheaply cloneable and serializable. The search attaches
//! [`Policy::OneShot`] wrappers to replay an exact action inside a
//! simulated turn; the baselines double as rollout and opponent models.

use serde::{Deserialize, Serialize};

use crate::battle::damage::damage_deterministic;
use crate::battle::moves::Move;
use crate::battle::side::BattleSide;
use crate::core::{BattleRng, STRUGGLE_INDEX};

/// Whether an action attacks or switches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    Attack,
    Switch,
}

/// One turn's worth of commitment for a side.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    /// Use the move at this index on the active creature.
    /// [`STRUGGLE_INDEX`] selects Struggle.
    Attack { move_index: usize },
    /// Bring the creature at this party index (always `> 0`) into the
    /// active slot.
    Switch { party_index: usize },
}

impl Action {
    #[must_use]
    pub fn kind(self) -> ActionKind {
        match self {
            Self::Attack { .. } => ActionKind::Attack,
            Self::Switch { .. } => ActionKind::Switch,
        }
    }

    /// Short battle-log style description of this action for `side`.
    #[must_use]
    pub fn describe(self, side: &BattleSide) -> String {
        match self {
            Self::Attack { move_index } => {
                let active = side.active();
                let name = if move_index == STRUGGLE_INDEX {
                    "Struggle".to_string()
                } else {
                    active
                        .moves()
                        .get(move_index)
                        .map_or_else(|| format!("move {move_index}"), |m| m.name.to_string())
                };
                format!("{} used {}.", active.name(), name)
            }
            Self::Switch { party_index } => {
                let target = side
                    .party()
                    .get(party_index)
                    .map_or("???", |c| c.name());
                format!("{} switched out with {}.", side.active().name(), target)
            }
        }
    }
}

/// A side's decision procedure.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Policy {
    /// Uniform over available moves and legal switches, weighted by how
    /// many of each exist.
    Random,
    /// Always the available move with the highest expected damage.
    HighestDamage,
    /// Plays exactly this action; used by tree nodes and predictor
    /// draws to commit a single decision.
    OneShot(Action),
}

impl Policy {
    /// Choose this side's action for the coming turn.
    pub fn choose_action(
        &self,
        side: &BattleSide,
        opponent: &BattleSide,
        rng: &mut BattleRng,
    ) -> Action {
        match self {
            Self::OneShot(action) => *action,
            Self::Random => random_action(side, rng),
            Self::HighestDamage => highest_damage_action(side, opponent),
        }
    }

    /// Pick a replacement after the active creature faints: the first
    /// party slot past the active one holding a live creature, or the
    /// sentinel 0 when the side has nothing left to send out.
    #[must_use]
    pub fn force_switch(&self, side: &BattleSide) -> usize {
        forced_switch_index(side)
    }
}

/// Shared forced-switch rule used by every policy.
#[must_use]
pub fn forced_switch_index(side: &BattleSide) -> usize {
    side.party()
        .iter()
        .enumerate()
        .skip(1)
        .find(|(_, c)| !c.is_fainted())
        .map_or(0, |(i, _)| i)
}

fn random_action(side: &BattleSide, rng: &mut BattleRng) -> Action {
    let active = side.active();
    let available: Vec<usize> = active
        .moves()
        .iter()
        .enumerate()
        .filter(|(_, m)| m.is_available())
        .map(|(i, _)| i)
        .collect();
    let switches = side.legal_switches();

    let total = available.len() + switches.len();
    if total == 0 {
        return Action::Attack {
            move_index: STRUGGLE_INDEX,
        };
    }

    if rng.gen_range_usize(0..total) < available.len() {
        let move_index = available[rng.gen_range_usize(0..available.len())];
        Action::Attack { move_index }
    } else {
        Action::Switch {
            party_index: forced_switch_index(side),
        }
    }
}

fn highest_damage_action(side: &BattleSide, opponent: &BattleSide) -> Action {
    let active = side.active();
    let enemy = opponent.active();

    let mut best: Option<(usize, u16)> = None;
    for (i, mv) in active.moves().iter().enumerate() {
        if !mv.is_available() {
            continue;
        }
        let result = damage_deterministic(mv, active, enemy);
        if best.map_or(true, |(_, d)| result.damage > d) {
            best = Some((i, result.damage));
        }
    }

    match best {
        Some((move_index, _)) => Action::Attack { move_index },
        None => Action::Attack {
            move_index: STRUGGLE_INDEX,
        },
    }
}

/// Resolve an attack action to the move it plays.
///
/// Struggle is synthesized on demand; real moves are looked up on the
/// active creature. Out-of-range indices degrade to Struggle rather
/// than aborting the simulation.
#[must_use]
pub fn resolve_move(side: &BattleSide, move_index: usize) -> Move {
    if move_index == STRUGGLE_INDEX {
        return Move::struggle();
    }
    side.active()
        .moves()
        .get(move_index)
        .cloned()
        .unwrap_or_else(Move::struggle)
}
