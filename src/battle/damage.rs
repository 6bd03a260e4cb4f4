//! Damage calculation.

use crate::core::BattleRng;

use super::creature::Creature;
use super::element::{effectiveness, Effectiveness};
use super::moves::Move;

/// Chance of a critical hit.
const CRITICAL_CHANCE: f64 = 0.0625;

/// Critical hits double the damage.
const CRITICAL_MULTIPLIER: f64 = 2.0;

/// Outcome of one damage calculation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DamageResult {
    /// HP removed from the defender, already capped at its current HP.
    pub damage: u16,
    pub effectiveness: Effectiveness,
    pub critical: bool,
}

/// Roll damage for `attack` by `attacker` against `defender`.
///
/// Level-and-power formula with a critical chance, an 85-100% spread,
/// and the elemental effectiveness multiplier.
pub fn damage_roll(
    attack: &Move,
    attacker: &Creature,
    defender: &Creature,
    rng: &mut BattleRng,
) -> DamageResult {
    let critical = rng.gen_bool(CRITICAL_CHANCE);
    let spread = rng.gen_fraction(0.85, 1.0);
    let crit_multiplier = if critical { CRITICAL_MULTIPLIER } else { 1.0 };
    compute(attack, attacker, defender, crit_multiplier * spread, critical)
}

/// Expected-case damage: no critical, full spread. Used by the
/// highest-damage baseline to rank moves without consuming randomness.
pub fn damage_deterministic(attack: &Move, attacker: &Creature, defender: &Creature) -> DamageResult {
    compute(attack, attacker, defender, 1.0, false)
}

fn compute(
    attack: &Move,
    attacker: &Creature,
    defender: &Creature,
    roll: f64,
    critical: bool,
) -> DamageResult {
    let eff = effectiveness(attack.element, defender.element());

    let (offense, defense) = if attack.is_special {
        (
            attacker.stats().special_attack,
            defender.stats().special_defense,
        )
    } else {
        (attacker.stats().attack, defender.stats().defense)
    };

    let level_factor = (2.0 * f64::from(attacker.level())) / 5.0 + 2.0;
    let base = level_factor * f64::from(attack.base_damage) * f64::from(offense)
        / f64::from(defense.max(1))
        / 50.0
        + 2.0;
    let raw = (base * roll * eff.multiplier()).floor().max(0.0) as u16;

    DamageResult {
        damage: raw.min(defender.hp()),
        effectiveness: eff,
        critical,
    }
}
