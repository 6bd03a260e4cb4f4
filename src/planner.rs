//! The planner façade: the agent the battle harness talks to.
//!
//! Each `take_turn` call builds a fresh search tree over clones of both
//! sides, runs the configured number of iterations, and executes the
//! best root action through the harness callbacks exactly once. The
//! predictor lives here and persists across turns and battles.

use std::thread::{self, JoinHandle};

use anyhow::{Context, Result};
use log::{debug, warn};

use crate::battle::side::BattleSide;
use crate::core::BattleRng;
use crate::mcts::{RootChoice, Search, SearchConfig, SearchStats, SearchTree};
use crate::nn::predictor::Predictor;
use crate::policy::{forced_switch_index, Action, Policy};

/// Result of one background search: the decision plus everything the
/// caller may want to keep.
#[derive(Debug)]
pub struct SearchReport {
    pub best: Option<Action>,
    pub distribution: Vec<RootChoice>,
    pub stats: SearchStats,
    /// The predictor snapshot after any in-search updates; adopt it
    /// back into the planner to keep learning.
    pub predictor: Predictor,
}

/// Join handle for a search dispatched to a background worker. The
/// worker owns everything it needs; the result is read exactly once.
#[derive(Debug)]
pub struct SearchHandle {
    handle: JoinHandle<Result<SearchReport>>,
}

impl SearchHandle {
    /// Block until the search finishes and take its report.
    pub fn join(self) -> Result<SearchReport> {
        self.handle
            .join()
            .map_err(|_| anyhow::anyhow!("search worker panicked"))?
    }
}

/// The search-driven agent.
pub struct Planner {
    config: SearchConfig,
    predictor: Predictor,
}

impl Planner {
    /// Create a planner with a fresh predictor.
    #[must_use]
    pub fn new(config: SearchConfig) -> Self {
        let predictor = Predictor::new(config.seed);
        Self { config, predictor }
    }

    /// Create a planner around an existing (possibly checkpointed)
    /// predictor.
    #[must_use]
    pub fn with_predictor(config: SearchConfig, predictor: Predictor) -> Self {
        Self { config, predictor }
    }

    #[must_use]
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    #[must_use]
    pub fn predictor(&self) -> &Predictor {
        &self.predictor
    }

    /// Replace the predictor, typically with one returned from a
    /// background search report.
    pub fn adopt_predictor(&mut self, predictor: Predictor) {
        self.predictor = predictor;
    }

    /// Run a full search for the current state and return the grown
    /// tree with its statistics. The given sides are only cloned.
    pub fn plan(
        &mut self,
        player: &BattleSide,
        opponent: &BattleSide,
    ) -> Result<(SearchTree, SearchStats)> {
        let mut search = Search::new(
            player,
            opponent,
            self.config.clone(),
            Some(&mut self.predictor),
        );
        search.run().context("search aborted")?;
        let stats = search.stats().clone();
        Ok((search.into_tree(), stats))
    }

    /// Decide and execute this turn's action through the harness
    /// callbacks. Exactly one callback fires per call.
    ///
    /// A failed search falls back to the random baseline for this
    /// single action; the battle continues either way.
    pub fn take_turn<A, U, S>(
        &mut self,
        player: &BattleSide,
        opponent: &BattleSide,
        attack: A,
        _use_item: U,
        switch: S,
    ) where
        A: FnOnce(usize),
        U: FnOnce(usize),
        S: FnOnce(usize),
    {
        let action = match self.plan(player, opponent) {
            Ok((tree, stats)) => {
                debug!(
                    "planned {} nodes in {}us",
                    tree.len(),
                    stats.time_us
                );
                tree.best_root_action().map(|(action, _)| action)
            }
            Err(error) => {
                warn!("search failed, falling back to random baseline: {error:#}");
                None
            }
        };

        let action = action.unwrap_or_else(|| {
            let mut rng = BattleRng::new(self.config.seed);
            Policy::Random.choose_action(player, opponent, &mut rng)
        });

        match action {
            Action::Attack { move_index } => attack(move_index),
            Action::Switch { party_index } => switch(party_index),
        }
    }

    /// Replacement choice when the harness reports the active creature
    /// fainted: the first live party slot past the active one, or the
    /// sentinel 0 when the side is already beaten.
    #[must_use]
    pub fn force_switch(&self, side: &BattleSide) -> usize {
        forced_switch_index(side)
    }

    /// Dispatch one search to a background worker so the caller can
    /// keep rendering while the planner thinks.
    ///
    /// The worker gets clones of both sides and a snapshot of the
    /// predictor; nothing is shared with the planner while it runs.
    /// Read the result with [`SearchHandle::join`].
    #[must_use]
    pub fn spawn_search(&self, player: &BattleSide, opponent: &BattleSide) -> SearchHandle {
        let config = self.config.clone();
        let mut predictor = self.predictor.clone();
        let player = player.clone();
        let opponent = opponent.clone();

        let handle = thread::spawn(move || {
            let mut search = Search::new(&player, &opponent, config, Some(&mut predictor));
            search.run().context("background search aborted")?;
            let stats = search.stats().clone();
            let tree = search.into_tree();
            Ok(SearchReport {
                best: tree.best_root_action().map(|(action, _)| action),
                distribution: tree.root_distribution(),
                stats,
                predictor,
            })
        });

        SearchHandle { handle }
    }
}
