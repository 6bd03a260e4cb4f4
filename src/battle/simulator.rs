//! Turn resolution: the forward simulator the search plays against.

use anyhow::{bail, Result};
use log::{debug, trace};

use crate::core::{BattleRng, SideId};
use crate::policy::{resolve_move, Action};

use super::creature::StatusInstance;
use super::damage::damage_roll;
use super::side::BattleSide;
use super::status::StatusCondition;

/// Hard cap on turns before a battle is declared stuck. Struggle always
/// deals damage, so a healthy simulation terminates far earlier.
const MAX_TURNS: u32 = 10_000;

/// A battle between two sides, resolved one full turn at a time.
///
/// The simulator owns its sides; the search hands it clones and reads
/// the mutated state back after stepping.
#[derive(Clone, Debug)]
pub struct Battle {
    pub player: BattleSide,
    pub opponent: BattleSide,
    turn: u32,
}

/// An attack committed for this turn, remembered together with the
/// creature that chose it so the attack is dropped if that creature
/// leaves the field first.
#[derive(Clone, Copy, Debug)]
struct QueuedAttack {
    side: SideId,
    move_index: usize,
    chooser: crate::core::CreatureId,
}

impl Battle {
    pub fn new(player: BattleSide, opponent: BattleSide) -> Self {
        Self {
            player,
            opponent,
            turn: 0,
        }
    }

    /// Winner derived from the current state, if the battle is over.
    #[must_use]
    pub fn winner(&self) -> Option<SideId> {
        if !self.opponent.has_live_creature() {
            Some(self.player.id())
        } else if !self.player.has_live_creature() {
            Some(self.opponent.id())
        } else {
            None
        }
    }

    /// Turns resolved so far.
    #[must_use]
    pub fn turns_played(&self) -> u32 {
        self.turn
    }

    /// Resolve one full turn: both sides commit via their attached
    /// policies, switches land first, attacks resolve in speed order,
    /// and end-of-turn status damage ticks.
    ///
    /// Returns the winning side when the turn ends the battle.
    ///
    /// # Errors
    /// Fails if the resolved state contradicts the returned result,
    /// which would mean the turn logic itself is broken.
    pub fn play_turn(&mut self, rng: &mut BattleRng) -> Result<Option<SideId>> {
        if let Some(winner) = self.winner() {
            return Ok(Some(winner));
        }

        self.turn += 1;
        trace!("turn {}: {} vs {}", self.turn, self.player, self.opponent);

        let player_action =
            self.player
                .policy()
                .clone()
                .choose_action(&self.player, &self.opponent, rng);
        let opponent_action =
            self.opponent
                .policy()
                .clone()
                .choose_action(&self.opponent, &self.player, rng);

        // Switches resolve before any attack lands.
        let mut queue: Vec<QueuedAttack> = Vec::with_capacity(2);
        for (action, side_id) in [
            (player_action, self.player.id()),
            (opponent_action, self.opponent.id()),
        ] {
            let side = self.side_mut(side_id);
            match action {
                Action::Switch { party_index } => {
                    let legal = side
                        .party()
                        .get(party_index)
                        .is_some_and(|c| !c.is_fainted())
                        && party_index > 0;
                    if legal {
                        trace!("{}", action.describe(side));
                        side.make_active(party_index);
                    }
                }
                Action::Attack { move_index } => queue.push(QueuedAttack {
                    side: side_id,
                    move_index,
                    chooser: side.active().id(),
                }),
            }
        }

        // Faster active creature strikes first; speed ties flip a coin.
        if queue.len() == 2 {
            let first_speed = self.side(queue[0].side).active().stats().speed;
            let second_speed = self.side(queue[1].side).active().stats().speed;
            let swap = second_speed > first_speed
                || (second_speed == first_speed && rng.gen_bool(0.5));
            if swap {
                queue.swap(0, 1);
            }
        }

        for attack in queue {
            if let Some(winner) = self.perform_attack(attack, rng) {
                self.verify(Some(winner))?;
                return Ok(Some(winner));
            }
        }

        // End of turn: damage-over-time statuses tick on both actives.
        for side_id in [self.player.id(), self.opponent.id()] {
            if let Some(winner) = self.tick_status_damage(side_id) {
                self.verify(Some(winner))?;
                return Ok(Some(winner));
            }
        }

        let winner = self.winner();
        self.verify(winner)?;
        Ok(winner)
    }

    /// Loop turns until a side wins.
    ///
    /// # Errors
    /// Fails if the battle exceeds the turn cap, which indicates a
    /// simulator defect rather than a legitimate stalemate.
    pub fn play_to_end(&mut self, rng: &mut BattleRng) -> Result<SideId> {
        loop {
            if let Some(winner) = self.play_turn(rng)? {
                debug!(
                    "battle over after {} turns, {} wins",
                    self.turn,
                    self.side(winner).name()
                );
                return Ok(winner);
            }
            if self.turn >= MAX_TURNS {
                bail!("battle failed to terminate within {MAX_TURNS} turns");
            }
        }
    }

    fn side(&self, id: SideId) -> &BattleSide {
        if self.player.id() == id {
            &self.player
        } else {
            &self.opponent
        }
    }

    fn side_mut(&mut self, id: SideId) -> &mut BattleSide {
        if self.player.id() == id {
            &mut self.player
        } else {
            &mut self.opponent
        }
    }

    /// The side opposing `id` in this battle.
    fn foe(&self, id: SideId) -> SideId {
        if self.player.id() == id {
            self.opponent.id()
        } else {
            self.player.id()
        }
    }

    /// Resolve one queued attack. Returns the winner if the defender's
    /// side runs out of creatures.
    fn perform_attack(&mut self, attack: QueuedAttack, rng: &mut BattleRng) -> Option<SideId> {
        let attacker_id = attack.side;
        let defender_id = self.foe(attacker_id);

        // The chooser may have fainted to a faster attack; its turn is
        // forfeit.
        {
            let active = self.side(attacker_id).active();
            if active.id() != attack.chooser || active.is_fainted() {
                return None;
            }
        }

        // Gate status check happens before the attack attempt.
        if let Some(condition) = self.side_mut(attacker_id).active_mut().tick_primary_status() {
            let name = self.side(attacker_id).active().name().to_string();
            match condition {
                StatusCondition::Sleep | StatusCondition::Freeze => {
                    trace!("{name} is {}.", condition.describe());
                    return None;
                }
                StatusCondition::Paralysis if rng.gen_bool(0.25) => {
                    trace!("{name} is paralyzed and cannot move.");
                    return None;
                }
                StatusCondition::Infatuation if rng.gen_bool(0.5) => {
                    trace!("{name} is infatuated and cannot move.");
                    return None;
                }
                StatusCondition::Confusion if rng.gen_bool(1.0 / 3.0) => {
                    trace!("{name} hurt itself in its confusion.");
                    return self.confusion_self_hit(attacker_id);
                }
                _ => {}
            }
        }

        let mv = resolve_move(self.side(attacker_id), attack.move_index);
        if attack.move_index < self.side(attacker_id).active().moves().len() {
            self.side_mut(attacker_id).active_mut().moves_mut()[attack.move_index].spend_pp();
        }

        // Accuracy gate.
        let hit_chance = {
            let attacker = self.side(attacker_id).active();
            let defender = self.side(defender_id).active();
            f64::from(attacker.stats().accuracy) / 100.0 * f64::from(defender.stats().evasion)
                / 100.0
        };
        if !rng.gen_bool(hit_chance) {
            trace!(
                "{}'s attack missed.",
                self.side(attacker_id).active().name()
            );
            return None;
        }

        let result = {
            let attacker = self.side(attacker_id).active();
            let defender = self.side(defender_id).active();
            damage_roll(&mv, attacker, defender, rng)
        };
        trace!(
            "{} used {} for {} damage ({:?}{})",
            self.side(attacker_id).active().name(),
            mv.name,
            result.damage,
            result.effectiveness,
            if result.critical { ", critical" } else { "" },
        );

        self.side_mut(defender_id)
            .active_mut()
            .take_damage(result.damage);
        if mv.base_heal > 0 {
            self.side_mut(attacker_id).active_mut().heal(mv.base_heal);
        }

        if let Some(status) = mv.status_inflict {
            let defender = self.side_mut(defender_id).active_mut();
            if status.is_damage_over_time() {
                defender.set_secondary_status(status);
            } else {
                let turns = rng.gen_range_u8(1..=7);
                defender.set_primary_status(status, turns);
            }
            trace!("{} was {}.", self.side(defender_id).active().name(), status.describe());
        }

        if self.side(defender_id).active().is_fainted() {
            return self.replace_fainted(defender_id);
        }
        None
    }

    /// Confusion self-hit: attack and defense scaled down by the 40
    /// base power into a small additive chip, at least 1 HP and capped
    /// at the creature's remaining HP.
    fn confusion_self_hit(&mut self, side_id: SideId) -> Option<SideId> {
        const CONFUSION_POWER: f64 = 40.0;
        let damage = {
            let active = self.side(side_id).active();
            let offense = f64::from(active.stats().attack) / CONFUSION_POWER;
            let mitigation = f64::from(active.stats().defense) / CONFUSION_POWER / 10.0;
            ((offense - mitigation).max(1.0) as u16).min(active.hp())
        };
        self.side_mut(side_id).active_mut().take_damage(damage);
        if self.side(side_id).active().is_fainted() {
            return self.replace_fainted(side_id);
        }
        None
    }

    /// End-of-turn damage from poison, bad poison, or burn.
    fn tick_status_damage(&mut self, side_id: SideId) -> Option<SideId> {
        let tick = self.side_mut(side_id).active_mut().tick_secondary_status();
        let Some(StatusInstance { condition, turns }) = tick else {
            return None;
        };

        let base_hp = self.side(side_id).active().base_hp();
        let damage = match condition {
            StatusCondition::Poison => base_hp / 16,
            StatusCondition::BadPoison => base_hp * u16::from(turns.min(15)) / 16,
            StatusCondition::Burn => base_hp / 8,
            _ => return None,
        }
        .max(1);

        trace!(
            "{} took {} damage from being {}.",
            self.side(side_id).active().name(),
            damage,
            condition.describe()
        );
        self.side_mut(side_id).active_mut().take_damage(damage);

        if self.side(side_id).active().is_fainted() {
            return self.replace_fainted(side_id);
        }
        None
    }

    /// Force the side to send out a replacement; the other side wins if
    /// nothing is left.
    fn replace_fainted(&mut self, side_id: SideId) -> Option<SideId> {
        let side = self.side_mut(side_id);
        trace!("{} fainted!", side.active().name());

        let replacement = side.policy().clone().force_switch(side);
        if replacement > 0 && side.party().get(replacement).is_some_and(|c| !c.is_fainted()) {
            side.make_active(replacement);
            trace!("{} sent out {}.", side.name(), side.active().name());
            None
        } else {
            Some(self.foe(side_id))
        }
    }

    /// The returned result must agree with the surviving-creature state.
    fn verify(&self, winner: Option<SideId>) -> Result<()> {
        match winner {
            Some(w) => {
                let loser = self.foe(w);
                if self.side(loser).has_live_creature() {
                    bail!(
                        "simulator contract breach: {w} declared winner while {loser} still stands"
                    );
                }
            }
            None => {
                if self.winner().is_some() {
                    bail!("simulator contract breach: battle over but no winner reported");
                }
            }
        }
        Ok(())
    }
}
