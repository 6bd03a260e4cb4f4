//! Search tree nodes.
//!
//! Nodes live in a flat arena and refer to each other by `NodeId`
//! index, never by owning pointer, which sidesteps parent/child cycles
//! entirely.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::battle::side::BattleSide;
use crate::core::{CreatureId, SideId};
use crate::policy::{Action, ActionKind};

/// Index into the tree's node arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Sentinel value representing no node.
    pub const NONE: NodeId = NodeId(u32::MAX);

    /// Create a new node ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Check if this is the NONE sentinel.
    #[inline]
    #[must_use]
    pub const fn is_none(self) -> bool {
        self.0 == u32::MAX
    }

    /// Get the raw index value.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_none() {
            write!(f, "NodeId(NONE)")
        } else {
            write!(f, "NodeId({})", self.0)
        }
    }
}

/// Key identifying a child action: which creature acted, what kind of
/// action, and the action payload: the move index for attacks, the
/// target creature's stable id for switches.
///
/// Keyed on the stable creature id rather than the party slot so the
/// same decision maps to the same child even after the party rotates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChildKey {
    pub creature: CreatureId,
    pub kind: ActionKind,
    pub key: u32,
}

impl ChildKey {
    /// Build the key for `action` taken by `side`'s active creature.
    #[must_use]
    pub fn for_action(side: &BattleSide, action: Action) -> Self {
        match action {
            Action::Attack { move_index } => Self {
                creature: side.active().id(),
                kind: ActionKind::Attack,
                key: move_index as u32,
            },
            Action::Switch { party_index } => Self {
                creature: side.active().id(),
                kind: ActionKind::Switch,
                key: side
                    .party()
                    .get(party_index)
                    .map_or(u32::MAX, |c| c.id().raw()),
            },
        }
    }
}

/// A node in the search tree.
///
/// Each node snapshots both sides as they stand after its action has
/// been committed (and, for opponent nodes, after the full turn has
/// been simulated). The planner's side is always in `player`.
#[derive(Clone, Debug)]
pub struct Node {
    /// Parent node (NONE for root).
    pub parent: NodeId,

    /// Side whose action this node represents. The root carries the
    /// planner's own tag.
    pub side: SideId,

    /// The action that led into this node; the root holds the sentinel.
    pub action: Option<Action>,

    /// Root = 1; grows by exactly one per edge.
    pub depth: u16,

    /// Sum of backpropagated rewards from this node's perspective.
    pub cumulative_outcome: f64,

    /// Times selection reached this node.
    pub visits: u32,

    /// Children in insertion order; ties in selection resolve to the
    /// earliest entry.
    pub children: SmallVec<[NodeId; 9]>,

    /// Lookup from action key to child, rejecting duplicate expansion.
    pub child_index: FxHashMap<ChildKey, NodeId>,

    /// Battle-log style label for diagnostics.
    pub description: String,

    /// The child set is fixed once this is set.
    pub expanded: bool,

    /// Planner-side state at this node.
    pub player: BattleSide,

    /// Opposing state at this node.
    pub opponent: BattleSide,
}

impl Node {
    /// Create the root node for a search.
    pub fn root(player: BattleSide, opponent: BattleSide) -> Self {
        let side = player.id();
        Self {
            parent: NodeId::NONE,
            side,
            action: None,
            depth: 1,
            cumulative_outcome: 0.0,
            visits: 0,
            children: SmallVec::new(),
            child_index: FxHashMap::default(),
            description: "Battle start".to_string(),
            expanded: false,
            player,
            opponent,
        }
    }

    /// Neither side can continue from this state.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !self.player.has_live_creature() || !self.opponent.has_live_creature()
    }

    /// Mean backpropagated reward; zero before any visit.
    #[must_use]
    pub fn mean_outcome(&self) -> f64 {
        if self.visits == 0 {
            0.0
        } else {
            self.cumulative_outcome / f64::from(self.visits)
        }
    }
}

/// UCB1 selection statistic: mean outcome plus the exploration bonus.
///
/// Unvisited children rank above everything else.
#[must_use]
pub fn ucb1(cumulative_outcome: f64, visits: u32, parent_visits: u32, exploration: f64) -> f64 {
    if visits == 0 {
        return f64::INFINITY;
    }
    let mean = cumulative_outcome / f64::from(visits);
    let bonus =
        exploration * (f64::from(parent_visits.max(1)).ln() / f64::from(visits)).sqrt();
    mean + bonus
}
