//! The search loop: selection, expansion, rollout, backpropagation.
//!
//! Depth alternation follows the turn structure of the game. The root
//! (depth 1) is the state before either side commits; its children are
//! the planner's candidate actions. Their children are the opponent's
//! responses, and inserting one of those resolves a full simulator turn
//! because at that point both sides have committed. Deeper layers
//! alternate the same way.
//!
//! Backpropagation adds the raw rollout reward at the root and at every
//! planner-action node, and the inverted reward at opponent-action
//! nodes, which is what makes the opponent layers adversarial.

use std::time::Instant;

use anyhow::{bail, Result};
use log::{debug, trace};

use crate::battle::side::BattleSide;
use crate::battle::simulator::Battle;
use crate::core::{BattleRng, SideId, STRUGGLE_INDEX};
use crate::nn::encoder::encode;
use crate::nn::predictor::Predictor;
use crate::policy::{Action, Policy};

use super::config::SearchConfig;
use super::node::{ucb1, ChildKey, Node, NodeId};
use super::outcome::outcome;
use super::stats::SearchStats;
use super::tree::SearchTree;

/// A single-turn search over cloned battle state.
///
/// The predictor outlives the search; it is borrowed for the duration
/// so fits and predictions stay sequenced on one thread.
pub struct Search<'a> {
    tree: SearchTree,
    config: SearchConfig,
    rng: BattleRng,
    predictor: Option<&'a mut Predictor>,
    planner: SideId,
    rival: SideId,
    /// Number of predictor updates so far; rollouts switch from the
    /// random baseline to the predictor once this passes the warm-up.
    learning_turn: u32,
    stats: SearchStats,
}

impl<'a> Search<'a> {
    /// Set up a search rooted at clones of the given sides. The real
    /// sides are never touched.
    pub fn new(
        player: &BattleSide,
        opponent: &BattleSide,
        config: SearchConfig,
        predictor: Option<&'a mut Predictor>,
    ) -> Self {
        debug_assert_ne!(player.id(), opponent.id(), "sides must carry distinct tags");

        let mut root_player = player.clone();
        let mut root_opponent = opponent.clone();
        root_player.set_policy(Policy::Random);
        root_opponent.set_policy(config.opponent_baseline.policy());

        let rng = BattleRng::new(config.seed);
        let planner = root_player.id();
        let rival = root_opponent.id();

        Self {
            tree: SearchTree::new(root_player, root_opponent),
            config,
            rng,
            predictor,
            planner,
            rival,
            learning_turn: 0,
            stats: SearchStats::default(),
        }
    }

    /// Run the configured number of iterations.
    ///
    /// # Errors
    /// Structural invariant violations and simulator contract breaches
    /// abort the search.
    pub fn run(&mut self) -> Result<()> {
        let start = Instant::now();
        for _ in 0..self.config.num_simulations {
            let leaf = self.traverse()?;
            let reward = self.rollout(leaf)?;
            self.backprop(leaf, reward);
            self.stats.iterations += 1;
        }
        self.stats.time_us = start.elapsed().as_micros() as u64;
        debug!(
            "search finished: {} iterations, {} nodes, depth {}, {} predictor updates",
            self.stats.iterations,
            self.tree.len(),
            self.stats.max_depth,
            self.stats.predictor_updates,
        );
        Ok(())
    }

    #[must_use]
    pub fn tree(&self) -> &SearchTree {
        &self.tree
    }

    /// Consume the search, keeping the tree for inspection.
    #[must_use]
    pub fn into_tree(self) -> SearchTree {
        self.tree
    }

    #[must_use]
    pub fn stats(&self) -> &SearchStats {
        &self.stats
    }

    #[must_use]
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Walk from the root to a leaf: expand unexpanded nodes, hand back
    /// the earliest unvisited child, otherwise descend into the UCB1
    /// argmax.
    fn traverse(&mut self) -> Result<NodeId> {
        let mut current = self.tree.root();
        loop {
            self.expand(current)?;

            let node = self.tree.get(current);
            if node.children.is_empty() {
                return Ok(current);
            }

            if let Some(&unvisited) = node
                .children
                .iter()
                .find(|&&child| self.tree.get(child).visits == 0)
            {
                return Ok(unvisited);
            }

            let parent_visits = node.visits;
            let mut best = node.children[0];
            let mut best_value = f64::NEG_INFINITY;
            for &child_id in &node.children {
                let child = self.tree.get(child_id);
                let value = ucb1(
                    child.cumulative_outcome,
                    child.visits,
                    parent_visits,
                    self.config.exploration,
                );
                if value > best_value {
                    best_value = value;
                    best = child_id;
                }
            }
            current = best;
        }
    }

    /// Attach every legal action of the side to move as a child. The
    /// child set is fixed after the first expansion.
    fn expand(&mut self, node_id: NodeId) -> Result<()> {
        {
            let node = self.tree.get(node_id);
            if node.expanded {
                return Ok(());
            }
            if node.is_terminal() {
                self.tree.get_mut(node_id).expanded = true;
                return Ok(());
            }
        }

        let (acting_id, actions) = {
            let node = self.tree.get(node_id);
            let acting_id = if node.depth == 1 {
                node.side
            } else if node.side == self.planner {
                self.rival
            } else {
                self.planner
            };
            let acting = if acting_id == self.planner {
                &node.player
            } else {
                &node.opponent
            };

            let active = acting.active();
            let mut actions: Vec<Action> = active
                .moves()
                .iter()
                .enumerate()
                .filter(|(_, m)| m.is_available())
                .map(|(move_index, _)| Action::Attack { move_index })
                .collect();
            if actions.is_empty() {
                actions.push(Action::Attack {
                    move_index: STRUGGLE_INDEX,
                });
            }
            actions.extend(
                acting
                    .legal_switches()
                    .into_iter()
                    .map(|party_index| Action::Switch { party_index }),
            );

            (acting_id, actions)
        };

        for action in actions {
            self.insert_child(node_id, acting_id, action)?;
        }

        self.tree.get_mut(node_id).expanded = true;
        Ok(())
    }

    /// Create one child node. When the child carries the opponent's
    /// response, both sides have committed and the full turn is
    /// resolved into the child's state. A terminal reached here also
    /// trains the predictor on the root.
    fn insert_child(&mut self, parent_id: NodeId, acting_id: SideId, action: Action) -> Result<NodeId> {
        let (mut player, mut opponent, parent_action, parent_depth) = {
            let parent = self.tree.get(parent_id);
            (
                parent.player.clone(),
                parent.opponent.clone(),
                parent.action,
                parent.depth,
            )
        };

        let acting_is_planner = acting_id == self.planner;
        let (key, description) = {
            let acting = if acting_is_planner { &player } else { &opponent };
            (
                ChildKey::for_action(acting, action),
                action.describe(acting),
            )
        };

        let mut terminal = false;
        if !acting_is_planner {
            let Some(parent_action) = parent_action else {
                bail!("invariant violation: opponent response attached to the root");
            };
            player.set_policy(Policy::OneShot(parent_action));
            opponent.set_policy(Policy::OneShot(action));

            let mut battle = Battle::new(player, opponent);
            terminal = battle.play_turn(&mut self.rng)?.is_some();
            player = battle.player;
            opponent = battle.opponent;
        }

        let depth = parent_depth + 1;
        trace!("expand {description} at depth {depth}");

        let child = Node {
            parent: parent_id,
            side: acting_id,
            action: Some(action),
            depth,
            cumulative_outcome: 0.0,
            visits: 0,
            children: Default::default(),
            child_index: Default::default(),
            description,
            expanded: false,
            player,
            opponent,
        };
        let child_id = self.tree.alloc(child);

        let parent = self.tree.get_mut(parent_id);
        parent.children.push(child_id);
        if parent.child_index.insert(key, child_id).is_some() {
            bail!("invariant violation: duplicate child key {key:?}");
        }

        self.stats.nodes_expanded += 1;
        if depth > self.stats.max_depth {
            self.stats.max_depth = depth;
        }

        if terminal {
            self.train_on_root();
        }

        Ok(child_id)
    }

    /// Fit the predictor on the root's encoding and search target.
    fn train_on_root(&mut self) {
        let Some(predictor) = self.predictor.as_deref_mut() else {
            return;
        };
        let root = self.tree.root();
        let input = {
            let node = self.tree.get(root);
            encode(&node.player, &node.opponent)
        };
        let target = self.tree.training_target(root);
        predictor.fit(&input, &target);
        self.learning_turn += 1;
        self.stats.predictor_updates += 1;
        trace!("predictor update {}", self.learning_turn);
    }

    /// Play the leaf's battle to completion and score it for the
    /// planner.
    fn rollout(&mut self, leaf_id: NodeId) -> Result<f64> {
        let (mut player, mut opponent, side, action, depth) = {
            let leaf = self.tree.get(leaf_id);
            (
                leaf.player.clone(),
                leaf.opponent.clone(),
                leaf.side,
                leaf.action,
                leaf.depth,
            )
        };
        let baseline = self.config.opponent_baseline.policy();

        let mut battle;
        if side == self.planner && depth > 1 {
            // Planner-action leaf: the opponent's reply is still open,
            // so the baseline supplies it and one full turn resolves.
            let Some(action) = action else {
                bail!("invariant violation: non-root node without an action");
            };
            player.set_policy(Policy::OneShot(action));
            opponent.set_policy(baseline);
            battle = Battle::new(player, opponent);

            if battle.play_turn(&mut self.rng)?.is_none() {
                let policy = self.rollout_policy(&battle.player, &battle.opponent);
                battle.player.set_policy(policy);
                battle.play_to_end(&mut self.rng)?;
            }
        } else {
            // Opponent-response leaf (its turn already resolved at
            // insertion) or a terminal root: play out from here.
            let policy = self.rollout_policy(&player, &opponent);
            player.set_policy(policy);
            opponent.set_policy(baseline);
            battle = Battle::new(player, opponent);

            if battle.winner().is_none() {
                battle.play_to_end(&mut self.rng)?;
            }
        }

        self.stats.rollouts += 1;
        Ok(outcome(&battle.player, &battle.opponent))
    }

    /// The planner's in-rollout policy: random during the warm-up,
    /// the predictor's draw afterwards.
    fn rollout_policy(&mut self, player: &BattleSide, opponent: &BattleSide) -> Policy {
        match self.predictor.as_deref() {
            Some(p) if self.learning_turn >= self.config.learning_turns && p.is_trained() => {
                p.predict_move(player, opponent, &mut self.rng).policy
            }
            _ => Policy::Random,
        }
    }

    /// Walk from the leaf to the root, crediting the planner's layers
    /// with the reward and the opponent's layers with its inverse.
    fn backprop(&mut self, leaf: NodeId, reward: f64) {
        let mut current = leaf;
        loop {
            let node = self.tree.get_mut(current);
            node.visits += 1;
            node.cumulative_outcome += if node.side == self.planner {
                reward
            } else {
                1.0 - reward
            };
            if node.parent.is_none() {
                break;
            }
            current = node.parent;
        }
    }
}
