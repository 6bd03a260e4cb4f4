//! Fixed-width battle encoding for the predictor.
//!
//! The layout is one 5-tuple per creature (HP ratio followed by the
//! four move PP ratios) for six creature slots per side, the planner's
//! side first. Creatures are ordered by stable id so the encoding is
//! invariant to party rotation, and short parties pad with epsilon.

use crate::battle::side::BattleSide;
use crate::core::{EPSILON, INPUT_DIM, MOVES_MAX, PARTY_MAX};

/// Encode a `(player, opponent)` state pair into the predictor's input
/// vector of length [`INPUT_DIM`].
#[must_use]
pub fn encode(player: &BattleSide, opponent: &BattleSide) -> Vec<f64> {
    let mut out = Vec::with_capacity(INPUT_DIM);
    fill_side(&mut out, player);
    fill_side(&mut out, opponent);
    debug_assert_eq!(out.len(), INPUT_DIM);
    out
}

fn fill_side(out: &mut Vec<f64>, side: &BattleSide) {
    for creature in side.sorted_by_id() {
        out.push(f64::from(creature.hp()) / f64::from(creature.base_hp().max(1)));
        for mv in creature.moves() {
            out.push(f64::from(mv.pp) / f64::from(mv.base_pp.max(1)));
        }
        for _ in creature.moves().len()..MOVES_MAX {
            out.push(EPSILON);
        }
    }
    for _ in side.party_size()..PARTY_MAX {
        out.extend([EPSILON; 1 + MOVES_MAX]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::creature::{Creature, Stats};
    use crate::battle::element::ElementType;
    use crate::battle::moves::Move;
    use crate::core::SideId;

    fn creature(name: &str, hp: u16, move_count: usize) -> Creature {
        let moves = (0..move_count)
            .map(|i| Move::new(format!("Move {i}"), 40, 20, ElementType::Normal, false))
            .collect();
        Creature::new(
            name,
            ElementType::Normal,
            50,
            hp,
            Stats::new(60, 60, 60, 60, 60),
            moves,
        )
    }

    fn side(id: u8, sizes: &[usize]) -> BattleSide {
        let party = sizes
            .iter()
            .enumerate()
            .map(|(i, &m)| creature(&format!("C{i}"), 100, m))
            .collect();
        BattleSide::new("Side", SideId::new(id), party)
    }

    #[test]
    fn test_length_is_fixed() {
        for (a, b) in [(1, 1), (2, 4), (6, 6), (3, 5)] {
            let player = side(0, &vec![2; a]);
            let opponent = side(1, &vec![3; b]);
            assert_eq!(encode(&player, &opponent).len(), INPUT_DIM);
        }
    }

    #[test]
    fn test_full_health_leads_with_ones() {
        let player = side(0, &[4]);
        let opponent = side(1, &[4]);
        let v = encode(&player, &opponent);

        // First creature: HP ratio 1.0 then four full PP ratios.
        assert_eq!(&v[0..5], &[1.0, 1.0, 1.0, 1.0, 1.0]);
        // Remaining player slots are padding.
        assert!(v[5..30].iter().all(|&x| x == EPSILON));
    }

    #[test]
    fn test_missing_move_slots_are_epsilon() {
        let player = side(0, &[2]);
        let opponent = side(1, &[4]);
        let v = encode(&player, &opponent);

        assert_eq!(v[1], 1.0);
        assert_eq!(v[2], 1.0);
        assert_eq!(v[3], EPSILON);
        assert_eq!(v[4], EPSILON);
    }

    #[test]
    fn test_damage_and_pp_show_up_as_ratios() {
        let mut player = side(0, &[1]);
        let opponent = side(1, &[1]);
        player.active_mut().take_damage(25);
        player.active_mut().moves_mut()[0].pp = 5;

        let v = encode(&player, &opponent);
        assert!((v[0] - 0.75).abs() < 1e-9);
        assert!((v[1] - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_rotation_invariance() {
        let mut a = side(0, &[2, 2, 2]);
        let b = side(1, &[2]);
        let before = encode(&a, &b);
        a.make_active(2);
        let after = encode(&a, &b);
        assert_eq!(before, after);
    }

    #[test]
    fn test_opponent_half_starts_at_midpoint() {
        let player = side(0, &[1]);
        let mut opponent = side(1, &[1]);
        opponent.active_mut().take_damage(50);

        let v = encode(&player, &opponent);
        assert!((v[INPUT_DIM / 2] - 0.5).abs() < 1e-9);
    }
}
