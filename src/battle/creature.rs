//! Creatures: stats, HP, statuses, and their move lists.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::core::{CreatureId, MOVES_MAX};

use super::element::ElementType;
use super::moves::Move;
use super::status::StatusCondition;

/// Combat stat block.
///
/// Accuracy and evasion are percentages; 100 means no modifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub attack: u16,
    pub defense: u16,
    pub special_attack: u16,
    pub special_defense: u16,
    pub speed: u16,
    pub accuracy: u16,
    pub evasion: u16,
}

impl Stats {
    /// Create a stat block with neutral accuracy and evasion.
    pub fn new(
        attack: u16,
        defense: u16,
        special_attack: u16,
        special_defense: u16,
        speed: u16,
    ) -> Self {
        Self {
            attack,
            defense,
            special_attack,
            special_defense,
            speed,
            accuracy: 100,
            evasion: 100,
        }
    }
}

/// An active status instance: the condition plus its turn counter.
///
/// Gate statuses count remaining turns down; damage-over-time statuses
/// count elapsed turns up (bad poison scales with the counter).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusInstance {
    pub condition: StatusCondition,
    pub turns: u8,
}

/// A battle-ready creature.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Creature {
    id: CreatureId,
    name: String,
    element: ElementType,
    level: u8,
    stats: Stats,
    moves: SmallVec<[Move; MOVES_MAX]>,
    hp: u16,
    base_hp: u16,
    /// Gate status (sleep, paralysis, ...): blocks or disrupts attacks.
    primary_status: Option<StatusInstance>,
    /// Damage-over-time status (poison, burn, ...): ticks at end of turn.
    secondary_status: Option<StatusInstance>,
}

impl Creature {
    /// Create a creature at full health. The stable id is assigned later
    /// by the owning side's party construction.
    pub fn new(
        name: impl Into<String>,
        element: ElementType,
        level: u8,
        hp: u16,
        stats: Stats,
        moves: Vec<Move>,
    ) -> Self {
        debug_assert!(moves.len() <= MOVES_MAX, "too many moves");
        Self {
            id: CreatureId::new(0),
            name: name.into(),
            element,
            level,
            stats,
            moves: SmallVec::from_vec(moves),
            hp,
            base_hp: hp,
            primary_status: None,
            secondary_status: None,
        }
    }

    #[must_use]
    pub fn id(&self) -> CreatureId {
        self.id
    }

    pub(crate) fn set_id(&mut self, id: CreatureId) {
        self.id = id;
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn element(&self) -> ElementType {
        self.element
    }

    #[must_use]
    pub fn level(&self) -> u8 {
        self.level
    }

    #[must_use]
    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    #[must_use]
    pub fn hp(&self) -> u16 {
        self.hp
    }

    #[must_use]
    pub fn base_hp(&self) -> u16 {
        self.base_hp
    }

    #[must_use]
    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    #[must_use]
    pub fn moves_mut(&mut self) -> &mut [Move] {
        &mut self.moves
    }

    #[must_use]
    pub fn primary_status(&self) -> Option<StatusInstance> {
        self.primary_status
    }

    #[must_use]
    pub fn secondary_status(&self) -> Option<StatusInstance> {
        self.secondary_status
    }

    /// A creature faints at zero HP.
    #[must_use]
    pub fn is_fainted(&self) -> bool {
        self.hp == 0
    }

    /// True when no move has PP left, forcing Struggle.
    #[must_use]
    pub fn must_struggle(&self) -> bool {
        self.moves.iter().all(|m| !m.is_available())
    }

    /// Reduce HP, saturating at zero.
    pub fn take_damage(&mut self, damage: u16) {
        self.hp = self.hp.saturating_sub(damage);
    }

    /// Restore HP, capped at base HP.
    pub fn heal(&mut self, amount: u16) {
        self.hp = (self.hp + amount).min(self.base_hp);
    }

    /// Apply a gate status with a turn countdown.
    pub fn set_primary_status(&mut self, condition: StatusCondition, turns: u8) {
        self.primary_status = Some(StatusInstance { condition, turns });
    }

    /// Apply a damage-over-time status; the counter starts at zero and
    /// grows each tick.
    pub fn set_secondary_status(&mut self, condition: StatusCondition) {
        self.secondary_status = Some(StatusInstance { condition, turns: 0 });
    }

    /// Count down the gate status before an attack attempt; returns the
    /// condition that is still active, if any. The status clears once
    /// its counter runs out.
    pub fn tick_primary_status(&mut self) -> Option<StatusCondition> {
        let instance = self.primary_status.as_mut()?;
        instance.turns = instance.turns.saturating_sub(1);
        let condition = instance.condition;
        if instance.turns == 0 {
            self.primary_status = None;
        }
        Some(condition)
    }

    /// Advance the damage-over-time counter and return the condition
    /// with its new count, if one is active.
    pub fn tick_secondary_status(&mut self) -> Option<StatusInstance> {
        let instance = self.secondary_status.as_mut()?;
        instance.turns = instance.turns.saturating_add(1);
        Some(*instance)
    }
}

impl std::fmt::Display for Creature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}/{} HP", self.name, self.hp, self.base_hp)
    }
}
