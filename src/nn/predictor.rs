//! The policy/value predictor: an MLP trained online from search
//! statistics, used to bias rollouts once it has seen enough turns.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::battle::side::BattleSide;
use crate::core::{BattleRng, EPSILON, INPUT_DIM, MOVES_MAX, OUTPUT_DIM, PARTY_MAX, STRUGGLE_INDEX};
use crate::policy::{Action, ActionKind, Policy};

use super::encoder::encode;
use super::mlp::{MlpConfig, MlpRegressor};

/// One drawn decision from the predictor: the one-shot policy to attach
/// to a side plus the raw distributions behind it.
#[derive(Clone, Debug)]
pub struct Prediction {
    pub policy: Policy,
    pub kind: ActionKind,
    pub index: usize,
    pub move_probs: [f64; MOVES_MAX],
    pub switch_probs: [f64; PARTY_MAX],
}

/// Policy/value network persisted across turns and battles.
///
/// Output layout: indices `0..6` weigh switching to the id-sorted party
/// slot, `6..30` hold four move weights per creature in the same order,
/// and index 30 estimates the outcome.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Predictor {
    net: MlpRegressor,
    trained: bool,
}

impl Predictor {
    /// Create an untrained predictor.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            net: MlpRegressor::new(INPUT_DIM, OUTPUT_DIM, MlpConfig::for_input(INPUT_DIM, seed)),
            trained: false,
        }
    }

    /// Whether `fit` has been called at least once. Untrained
    /// predictors fall back to the uniform random policy.
    #[must_use]
    pub fn is_trained(&self) -> bool {
        self.trained
    }

    /// Train on one `(encoding, search target)` example.
    pub fn fit(&mut self, input: &[f64], target: &[f64]) {
        self.net.fit(input, target);
        self.trained = true;
    }

    /// Draw the side's next decision.
    ///
    /// Untrained, this is the uniform fallback. Trained, the network
    /// output is sliced into the active creature's move weights and the
    /// switch weights, the concatenation is normalized, the action kind
    /// follows the attack-weight mass, and the concrete action is drawn
    /// from the matching slice, restricted to actions that are
    /// actually legal in the current state.
    pub fn predict_move(
        &self,
        player: &BattleSide,
        opponent: &BattleSide,
        rng: &mut BattleRng,
    ) -> Prediction {
        if !self.trained {
            return Prediction {
                policy: Policy::Random,
                kind: ActionKind::Attack,
                index: 0,
                move_probs: [1.0 / MOVES_MAX as f64; MOVES_MAX],
                switch_probs: [1.0 / PARTY_MAX as f64; PARTY_MAX],
            };
        }

        let output = self.net.predict(&encode(player, opponent));

        let mut switch_probs = [EPSILON; PARTY_MAX];
        for (slot, value) in switch_probs.iter_mut().zip(&output[..PARTY_MAX]) {
            *slot = value.max(EPSILON);
        }

        let active_rank = player.rank_of(player.active().id()).unwrap_or(0);
        let move_base = PARTY_MAX + active_rank * MOVES_MAX;
        let mut move_probs = [EPSILON; MOVES_MAX];
        for (slot, value) in move_probs
            .iter_mut()
            .zip(&output[move_base..move_base + MOVES_MAX])
        {
            *slot = value.max(EPSILON);
        }

        // The combined mass decides attack vs. switch.
        let move_mass: f64 = move_probs.iter().sum();
        let switch_mass: f64 = switch_probs.iter().sum();
        let attack_probability = move_mass / (move_mass + switch_mass);

        let kind = if rng.gen_bool(attack_probability) {
            ActionKind::Attack
        } else {
            ActionKind::Switch
        };

        let action = match kind {
            ActionKind::Attack => self.draw_attack(player, &move_probs, rng),
            ActionKind::Switch => self
                .draw_switch(player, &switch_probs, rng)
                .unwrap_or_else(|| self.draw_attack(player, &move_probs, rng)),
        };

        let index = match action {
            Action::Attack { move_index } => move_index,
            Action::Switch { party_index } => party_index,
        };

        Prediction {
            policy: Policy::OneShot(action),
            kind: action.kind(),
            index,
            move_probs,
            switch_probs,
        }
    }

    fn draw_attack(&self, player: &BattleSide, move_probs: &[f64], rng: &mut BattleRng) -> Action {
        let active = player.active();
        if active.must_struggle() {
            return Action::Attack {
                move_index: STRUGGLE_INDEX,
            };
        }

        let weights: Vec<f64> = active
            .moves()
            .iter()
            .enumerate()
            .map(|(i, m)| if m.is_available() { move_probs[i] } else { 0.0 })
            .collect();

        match rng.choose_weighted(&weights) {
            Some(move_index) => Action::Attack { move_index },
            None => Action::Attack {
                move_index: STRUGGLE_INDEX,
            },
        }
    }

    fn draw_switch(
        &self,
        player: &BattleSide,
        switch_probs: &[f64],
        rng: &mut BattleRng,
    ) -> Option<Action> {
        let sorted = player.sorted_by_id();
        let weights: Vec<f64> = (0..PARTY_MAX)
            .map(|rank| {
                let Some(creature) = sorted.get(rank) else {
                    return 0.0;
                };
                let position = player.position_of(creature.id()).unwrap_or(0);
                if position == 0 || creature.is_fainted() {
                    0.0
                } else {
                    switch_probs[rank]
                }
            })
            .collect();

        let rank = rng.choose_weighted(&weights)?;
        let party_index = player.position_of(sorted[rank].id())?;
        Some(Action::Switch { party_index })
    }

    /// Serialize the predictor for checkpointing between battles.
    pub fn save(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).context("failed to serialize predictor")
    }

    /// Restore a checkpointed predictor.
    pub fn load(bytes: &[u8]) -> Result<Self> {
        bincode::deserialize(bytes).context("failed to deserialize predictor")
    }
}
