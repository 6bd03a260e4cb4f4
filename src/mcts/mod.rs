//! Monte Carlo Tree Search over the battle simulator.
//!
//! One tree is built per turn: the planner clones both sides into the
//! root, runs a fixed number of selection / expansion / rollout /
//! backpropagation iterations, picks the root child with the greatest
//! cumulative outcome, and discards the tree. The predictor persists
//! across turns and biases rollouts once its warm-up has passed.

pub mod config;
pub mod node;
pub mod outcome;
pub mod search;
pub mod stats;
pub mod tree;

pub use config::{OpponentBaseline, SearchConfig};
pub use node::{ucb1, ChildKey, Node, NodeId};
pub use outcome::outcome;
pub use search::Search;
pub use stats::SearchStats;
pub use tree::{RootChoice, SearchTree};
