//! End-to-end scenarios driving the full search stack over the
//! built-in roster.

use battlemind::data::sample_creature;
use battlemind::{
    Action, ActionKind, BattleSide, Creature, ElementType, Move, OpponentBaseline, Planner,
    Search, SearchConfig, SideId, Stats, STRUGGLE_INDEX,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn side_of(name: &str, tag: u8, creatures: Vec<Creature>) -> BattleSide {
    BattleSide::new(name, SideId::new(tag), creatures)
}

fn roster(name: &str) -> Creature {
    sample_creature(name).expect("roster creature")
}

/// The move element behind an attack action chosen at the root.
fn chosen_element(side: &BattleSide, action: Action) -> Option<ElementType> {
    match action {
        Action::Attack { move_index } if move_index < side.active().moves().len() => {
            Some(side.active().moves()[move_index].element)
        }
        Action::Attack { .. } => Some(ElementType::Typeless),
        Action::Switch { .. } => None,
    }
}

#[test]
fn scenario_fire_move_dominates_grass_matchup() {
    init_logging();
    let player = side_of("Ash", 0, vec![roster("Charizard")]);
    let opponent = side_of("Rival", 1, vec![roster("Bulbasaur")]);

    let config = SearchConfig::default().with_simulations(1000).with_seed(7);
    let mut search = Search::new(&player, &opponent, config, None);
    search.run().unwrap();

    let tree = search.tree();
    let (best, _) = tree.best_root_action().unwrap();
    assert_eq!(
        chosen_element(&player, best),
        Some(ElementType::Fire),
        "expected the super-effective fire move to rank highest, got {best:?}"
    );

    // The distribution is sorted ascending, so the last entry is the
    // most probable and must agree with the argmax.
    let distribution = tree.root_distribution();
    assert_eq!(distribution.last().unwrap().action, best);
}

#[test]
fn scenario_water_move_wins_against_highest_damage_opponent() {
    init_logging();
    let player = side_of("Misty", 0, vec![roster("Squirtle")]);
    let opponent = side_of("Rival", 1, vec![roster("Charizard")]);

    let config = SearchConfig::default()
        .with_simulations(1000)
        .with_seed(11)
        .with_opponent(OpponentBaseline::HighestDamage);
    let mut search = Search::new(&player, &opponent, config, None);
    search.run().unwrap();

    let (best, _) = search.tree().best_root_action().unwrap();
    assert_eq!(
        chosen_element(&player, best),
        Some(ElementType::Water),
        "expected the water move to be the argmax root action, got {best:?}"
    );
}

#[test]
fn scenario_exhausted_moves_prefer_switch_over_struggle() {
    init_logging();
    // The active creature has nothing left but Struggle and poor odds;
    // a healthy teammate waits on the bench.
    let mut weakling = Creature::new(
        "Weakling",
        ElementType::Normal,
        50,
        40,
        Stats::new(25, 25, 25, 25, 20),
        vec![Move::new("Tackle", 35, 35, ElementType::Normal, false)],
    );
    weakling.moves_mut()[0].pp = 0;

    let player = side_of("Trainer", 0, vec![weakling, roster("Blastoise")]);
    let opponent = side_of("Rival", 1, vec![roster("Charizard")]);

    let config = SearchConfig::default().with_simulations(400).with_seed(5);
    let mut search = Search::new(&player, &opponent, config, None);
    search.run().unwrap();

    let tree = search.tree();

    // Struggle is enumerated as the only attack option.
    let root = tree.get(tree.root());
    let attack_actions: Vec<Action> = root
        .children
        .iter()
        .filter_map(|&c| tree.get(c).action)
        .filter(|a| a.kind() == ActionKind::Attack)
        .collect();
    assert_eq!(
        attack_actions,
        vec![Action::Attack {
            move_index: STRUGGLE_INDEX
        }]
    );

    // But the search should favor bringing in the healthy teammate.
    let (best, _) = tree.best_root_action().unwrap();
    assert_eq!(best, Action::Switch { party_index: 1 });
}

#[test]
fn scenario_forced_switch_finds_the_only_live_backup() {
    init_logging();
    let mut party = vec![
        roster("Pikachu"),
        roster("Squirtle"),
        roster("Bulbasaur"),
        roster("Blastoise"),
        roster("Venusaur"),
    ];
    // Everyone but the slot-3 backup is down, the active included.
    for (i, creature) in party.iter_mut().enumerate() {
        if i != 3 {
            creature.take_damage(10_000);
        }
    }
    let side = side_of("Trainer", 0, party);

    let planner = Planner::new(SearchConfig::default());
    assert_eq!(planner.force_switch(&side), 3);
}

#[test]
fn scenario_forced_switch_sentinel_when_wiped() {
    init_logging();
    let mut party = vec![roster("Pikachu"), roster("Squirtle")];
    for creature in &mut party {
        creature.take_damage(10_000);
    }
    let side = side_of("Trainer", 0, party);

    let planner = Planner::new(SearchConfig::default());
    assert_eq!(planner.force_switch(&side), 0);
}

#[test]
fn scenario_same_seed_same_plan() {
    init_logging();
    let player = side_of(
        "Ash",
        0,
        vec![roster("Charizard"), roster("Pikachu")],
    );
    let opponent = side_of(
        "Rival",
        1,
        vec![roster("Blastoise"), roster("Venusaur")],
    );

    let config = SearchConfig::default().with_simulations(60).with_seed(99);

    let mut first = Planner::new(config.clone());
    let (tree1, _) = first.plan(&player, &opponent).unwrap();
    let mut second = Planner::new(config);
    let (tree2, _) = second.plan(&player, &opponent).unwrap();

    assert_eq!(
        tree1.best_root_action().map(|(a, _)| a),
        tree2.best_root_action().map(|(a, _)| a)
    );

    let d1 = tree1.root_distribution();
    let d2 = tree2.root_distribution();
    assert_eq!(d1.len(), d2.len());
    for (a, b) in d1.iter().zip(&d2) {
        assert_eq!(a.action, b.action);
        assert_eq!(a.visits, b.visits);
        assert!((a.outcome - b.outcome).abs() < 1e-12);
        assert!((a.probability - b.probability).abs() < 1e-12);
    }
}

#[test]
fn scenario_backprop_inverts_opponent_layers() {
    init_logging();
    // The opponent's lone creature is one hit from fainting and the
    // planner's attack always lands first, so every rollout ends in the
    // same state and the backpropagated reward is one constant.
    let striker = Creature::new(
        "Striker",
        ElementType::Normal,
        50,
        100,
        Stats::new(120, 80, 120, 80, 200),
        vec![Move::new("Finisher", 120, 30, ElementType::Normal, false)],
    );
    let mut target = Creature::new(
        "Target",
        ElementType::Normal,
        50,
        80,
        Stats::new(60, 60, 60, 60, 10),
        vec![Move::new("Tackle", 35, 35, ElementType::Normal, false)],
    );
    target.take_damage(79);

    let player = side_of("Trainer", 0, vec![striker]);
    let opponent = side_of("Rival", 1, vec![target]);

    let config = SearchConfig::default().with_simulations(30).with_seed(2);
    let mut search = Search::new(&player, &opponent, config, None);
    search.run().unwrap();

    let tree = search.tree();
    // Recover the constant reward from the root, which accumulates it
    // directly.
    let root = tree.get(tree.root());
    let reward = root.cumulative_outcome / f64::from(root.visits);

    for (id, node) in tree.iter() {
        if id == tree.root() || node.visits == 0 {
            continue;
        }
        let expected = if node.side == player.id() {
            reward * f64::from(node.visits)
        } else {
            (1.0 - reward) * f64::from(node.visits)
        };
        assert!(
            (node.cumulative_outcome - expected).abs() < 1e-9,
            "node {id} at depth {} accumulated {} instead of {}",
            node.depth,
            node.cumulative_outcome,
            expected
        );
    }
}
