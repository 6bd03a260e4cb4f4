//! Arena-based search tree.
//!
//! Nodes are stored in a flat `Vec` and referenced by `NodeId` indices;
//! the root is always index 0.

use anyhow::{bail, Result};

use crate::battle::side::BattleSide;
use crate::core::{CreatureId, EPSILON, MOVES_MAX, OUTPUT_DIM, PARTY_MAX};
use crate::policy::{Action, ActionKind};

use super::node::{Node, NodeId};

/// One root option with its search statistics.
#[derive(Clone, Debug)]
pub struct RootChoice {
    pub action: Action,
    pub outcome: f64,
    pub probability: f64,
    pub visits: u32,
    pub description: String,
}

/// The search tree for a single turn.
#[derive(Clone, Debug)]
pub struct SearchTree {
    nodes: Vec<Node>,
}

impl SearchTree {
    /// Create a tree rooted at the given state pair.
    pub fn new(player: BattleSide, opponent: BattleSide) -> Self {
        Self {
            nodes: vec![Node::root(player, opponent)],
        }
    }

    /// The root node ID (always 0).
    #[inline]
    #[must_use]
    pub fn root(&self) -> NodeId {
        NodeId::new(0)
    }

    /// Get a node by ID.
    #[inline]
    #[must_use]
    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.raw() as usize]
    }

    /// Get a mutable node by ID.
    #[inline]
    pub fn get_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.raw() as usize]
    }

    /// Allocate a new node, returning its ID.
    pub fn alloc(&mut self, node: Node) -> NodeId {
        let id = NodeId::new(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Number of nodes in the tree.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterate over all nodes.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (NodeId::new(i as u32), n))
    }

    /// The root child with the greatest cumulative outcome; ties break
    /// toward the earliest-inserted child. `None` when the root was
    /// never expanded.
    #[must_use]
    pub fn best_root_action(&self) -> Option<(Action, NodeId)> {
        let root = self.get(self.root());
        let mut best: Option<(f64, NodeId)> = None;
        for &child_id in &root.children {
            let child = self.get(child_id);
            if best.map_or(true, |(outcome, _)| child.cumulative_outcome > outcome) {
                best = Some((child.cumulative_outcome, child_id));
            }
        }
        best.and_then(|(_, id)| self.get(id).action.map(|a| (a, id)))
    }

    /// Per-child root statistics, sorted ascending by probability.
    ///
    /// Probabilities shift every outcome up by the largest magnitude so
    /// negative sums still map onto a distribution; a degenerate
    /// denominator falls back to uniform.
    #[must_use]
    pub fn root_distribution(&self) -> Vec<RootChoice> {
        let root = self.get(self.root());
        if root.children.is_empty() {
            return Vec::new();
        }

        let mut outcome_sum = 0.0;
        let mut max_outcome: f64 = 0.0;
        for &child_id in &root.children {
            let child = self.get(child_id);
            outcome_sum += child.cumulative_outcome;
            max_outcome = max_outcome.max(child.cumulative_outcome.abs());
        }

        let count = root.children.len() as f64;
        let denominator = outcome_sum + max_outcome * count;

        let mut choices: Vec<RootChoice> = root
            .children
            .iter()
            .filter_map(|&child_id| {
                let child = self.get(child_id);
                let probability = if denominator == 0.0 {
                    1.0 / count
                } else {
                    (max_outcome + child.cumulative_outcome) / denominator
                };
                child.action.map(|action| RootChoice {
                    action,
                    outcome: child.cumulative_outcome,
                    probability,
                    visits: child.visits,
                    description: child.description.clone(),
                })
            })
            .collect();

        choices.sort_by(|a, b| {
            a.probability
                .partial_cmp(&b.probability)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        choices
    }

    /// Build the predictor training target from a node's children.
    ///
    /// Layout matches the predictor output: switch weights by sorted
    /// rank, then four move weights per creature, then the node's
    /// cumulative outcome. Each child contributes its share of the
    /// node's outcome, with 0/0 collapsing to zero; untouched entries
    /// stay at epsilon.
    #[must_use]
    pub fn training_target(&self, node_id: NodeId) -> Vec<f64> {
        let node = self.get(node_id);
        // Children of the root act for the planner; elsewhere they act
        // for the side opposite the node's own actor.
        let acting_side = if node_id == self.root() {
            &node.player
        } else if node.side == node.player.id() {
            &node.opponent
        } else {
            &node.player
        };

        let mut target = vec![EPSILON; OUTPUT_DIM];

        for &child_id in &node.children {
            let child = self.get(child_id);
            let share = if node.cumulative_outcome == 0.0 {
                0.0
            } else {
                child.cumulative_outcome / node.cumulative_outcome
            };

            let Some(action) = child.action else {
                continue;
            };
            let Some(key) = node
                .child_index
                .iter()
                .find(|(_, id)| **id == child_id)
                .map(|(k, _)| *k)
            else {
                continue;
            };

            match action.kind() {
                ActionKind::Switch => {
                    if let Some(rank) = acting_side.rank_of(CreatureId::new(key.key)) {
                        target[rank] = share;
                    }
                }
                ActionKind::Attack => {
                    let move_index = key.key as usize;
                    if move_index < MOVES_MAX {
                        if let Some(rank) = acting_side.rank_of(key.creature) {
                            target[PARTY_MAX + rank * MOVES_MAX + move_index] = share;
                        }
                    }
                }
            }
        }

        target[OUTPUT_DIM - 1] = node.cumulative_outcome;
        target
    }

    /// Validate the structural invariants: parent/child symmetry,
    /// depth increments, and child-key consistency.
    ///
    /// # Errors
    /// Returns a diagnostic for the first violated invariant.
    pub fn check_integrity(&self) -> Result<()> {
        for (id, node) in self.iter() {
            if id == self.root() {
                if !node.parent.is_none() {
                    bail!("root must not have a parent");
                }
            } else {
                if node.parent.is_none() || node.parent.raw() as usize >= self.nodes.len() {
                    bail!("node {id} has an invalid parent");
                }
                let parent = self.get(node.parent);
                if !parent.children.contains(&id) {
                    bail!("node {id} is missing from its parent's child list");
                }
                if node.depth != parent.depth + 1 {
                    bail!(
                        "node {id} depth {} does not follow parent depth {}",
                        node.depth,
                        parent.depth
                    );
                }
            }

            if node.child_index.len() != node.children.len() {
                bail!("node {id} child index and child list disagree");
            }
            for (&key, &child_id) in &node.child_index {
                if !node.children.contains(&child_id) {
                    bail!("node {id} indexes {child_id} under {key:?} but does not own it");
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::creature::{Creature, Stats};
    use crate::battle::element::ElementType;
    use crate::battle::moves::Move;
    use crate::core::SideId;
    use crate::mcts::node::ChildKey;

    fn side(id: u8) -> BattleSide {
        BattleSide::new(
            "Side",
            SideId::new(id),
            vec![
                Creature::new(
                    "A",
                    ElementType::Normal,
                    50,
                    100,
                    Stats::new(60, 60, 60, 60, 60),
                    vec![
                        Move::new("Tackle", 35, 35, ElementType::Normal, false),
                        Move::new("Slash", 70, 20, ElementType::Normal, false),
                    ],
                ),
                Creature::new(
                    "B",
                    ElementType::Normal,
                    50,
                    100,
                    Stats::new(60, 60, 60, 60, 60),
                    vec![],
                ),
            ],
        )
    }

    /// Attach a planner-action child to the root by hand.
    fn attach_child(tree: &mut SearchTree, action: Action, outcome: f64, visits: u32) -> NodeId {
        let root = tree.root();
        let (player, opponent, depth) = {
            let node = tree.get(root);
            (node.player.clone(), node.opponent.clone(), node.depth)
        };
        let key = ChildKey::for_action(&player, action);
        let mut child = Node::root(player, opponent);
        child.parent = root;
        child.action = Some(action);
        child.depth = depth + 1;
        child.cumulative_outcome = outcome;
        child.visits = visits;
        child.description = format!("{action:?}");
        let id = tree.alloc(child);
        tree.get_mut(root).children.push(id);
        tree.get_mut(root).child_index.insert(key, id);
        id
    }

    #[test]
    fn test_best_root_action_prefers_outcome() {
        let mut tree = SearchTree::new(side(0), side(1));
        attach_child(&mut tree, Action::Attack { move_index: 0 }, 2.0, 5);
        attach_child(&mut tree, Action::Attack { move_index: 1 }, 7.0, 2);
        attach_child(&mut tree, Action::Switch { party_index: 1 }, 4.0, 9);

        let (action, _) = tree.best_root_action().unwrap();
        assert_eq!(action, Action::Attack { move_index: 1 });
    }

    #[test]
    fn test_best_root_action_tie_takes_earliest() {
        let mut tree = SearchTree::new(side(0), side(1));
        attach_child(&mut tree, Action::Attack { move_index: 0 }, 3.0, 5);
        attach_child(&mut tree, Action::Attack { move_index: 1 }, 3.0, 5);

        let (action, _) = tree.best_root_action().unwrap();
        assert_eq!(action, Action::Attack { move_index: 0 });
    }

    #[test]
    fn test_best_root_action_empty_tree() {
        let tree = SearchTree::new(side(0), side(1));
        assert!(tree.best_root_action().is_none());
    }

    #[test]
    fn test_root_distribution_sums_to_one() {
        let mut tree = SearchTree::new(side(0), side(1));
        attach_child(&mut tree, Action::Attack { move_index: 0 }, 2.0, 5);
        attach_child(&mut tree, Action::Attack { move_index: 1 }, 6.0, 2);

        let distribution = tree.root_distribution();
        let total: f64 = distribution.iter().map(|c| c.probability).sum();
        assert!((total - 1.0).abs() < 1e-9);

        // Sorted ascending by probability: weaker outcome first.
        assert!(distribution[0].outcome <= distribution[1].outcome);
    }

    #[test]
    fn test_root_distribution_degenerate_is_uniform() {
        let mut tree = SearchTree::new(side(0), side(1));
        attach_child(&mut tree, Action::Attack { move_index: 0 }, 0.0, 0);
        attach_child(&mut tree, Action::Attack { move_index: 1 }, 0.0, 0);

        let distribution = tree.root_distribution();
        for choice in &distribution {
            assert!((choice.probability - 0.5).abs() < 1e-12);
        }
    }

    #[test]
    fn test_training_target_layout() {
        let mut tree = SearchTree::new(side(0), side(1));
        attach_child(&mut tree, Action::Attack { move_index: 1 }, 3.0, 5);
        attach_child(&mut tree, Action::Switch { party_index: 1 }, 1.0, 2);
        tree.get_mut(tree.root()).cumulative_outcome = 4.0;

        let target = tree.training_target(tree.root());
        assert_eq!(target.len(), OUTPUT_DIM);

        // Switch child: creature B has rank 1 in the sorted party.
        assert!((target[1] - 0.25).abs() < 1e-12);
        // Attack child: active creature A has rank 0, move index 1.
        assert!((target[PARTY_MAX + 1] - 0.75).abs() < 1e-12);
        // Outcome estimate sits in the last slot.
        assert!((target[OUTPUT_DIM - 1] - 4.0).abs() < 1e-12);
        // Everything else is epsilon.
        assert!((target[0] - EPSILON).abs() < 1e-30);
    }

    #[test]
    fn test_training_target_zero_outcome_is_zero() {
        let mut tree = SearchTree::new(side(0), side(1));
        attach_child(&mut tree, Action::Attack { move_index: 0 }, 1.5, 3);
        // Root outcome stays 0: every share collapses to zero.

        let target = tree.training_target(tree.root());
        assert_eq!(target[PARTY_MAX], 0.0);
    }

    #[test]
    fn test_check_integrity_accepts_consistent_tree() {
        let mut tree = SearchTree::new(side(0), side(1));
        attach_child(&mut tree, Action::Attack { move_index: 0 }, 1.0, 1);
        tree.check_integrity().unwrap();
    }

    #[test]
    fn test_check_integrity_rejects_bad_depth() {
        let mut tree = SearchTree::new(side(0), side(1));
        let child = attach_child(&mut tree, Action::Attack { move_index: 0 }, 1.0, 1);
        tree.get_mut(child).depth = 9;
        assert!(tree.check_integrity().is_err());
    }
}
