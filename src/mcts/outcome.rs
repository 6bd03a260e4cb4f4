//! The rollout reward: scalar quality of a battle state for the
//! planner.

use crate::battle::side::BattleSide;

/// Score a `(player, opponent)` state pair from the player's
/// perspective.
///
/// Anchored at 0.8 while the player still has a live creature and 0.2
/// once it is wiped out, then shifted by the HP-lost and fainted-count
/// differentials. The player's own faint ratio is squared: losing the
/// last creature is disproportionately bad. The result is intentionally
/// left unclamped; callers treat it as an unnormalized quality.
#[must_use]
pub fn outcome(player: &BattleSide, opponent: &BattleSide) -> f64 {
    let base = if player.has_live_creature() { 0.8 } else { 0.2 };

    let player_hp_lost = f64::from(player.hp_lost()) / f64::from(player.total_base_hp().max(1));
    let opponent_hp_lost =
        f64::from(opponent.hp_lost()) / f64::from(opponent.total_base_hp().max(1));
    let hp_ratio_diff = opponent_hp_lost - player_hp_lost;

    let player_faint_ratio = player.fainted_count() as f64 / player.party_size() as f64;
    let opponent_faint_ratio = opponent.fainted_count() as f64 / opponent.party_size() as f64;
    let faint_ratio_diff = opponent_faint_ratio - player_faint_ratio * player_faint_ratio;

    base + (hp_ratio_diff + faint_ratio_diff) / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::creature::{Creature, Stats};
    use crate::battle::element::ElementType;
    use crate::core::SideId;

    fn side(id: u8, count: usize) -> BattleSide {
        let party = (0..count)
            .map(|i| {
                Creature::new(
                    format!("C{i}"),
                    ElementType::Normal,
                    50,
                    100,
                    Stats::new(60, 60, 60, 60, 60),
                    vec![],
                )
            })
            .collect();
        BattleSide::new("Side", SideId::new(id), party)
    }

    #[test]
    fn test_even_fresh_state_scores_base() {
        let a = side(0, 3);
        let b = side(1, 3);
        assert!((outcome(&a, &b) - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_dealing_damage_raises_outcome() {
        let a = side(0, 3);
        let mut b = side(1, 3);
        b.party_mut()[0].take_damage(50);
        assert!(outcome(&a, &b) > 0.8);
    }

    #[test]
    fn test_taking_damage_lowers_outcome() {
        let mut a = side(0, 3);
        let b = side(1, 3);
        a.party_mut()[0].take_damage(50);
        assert!(outcome(&a, &b) < 0.8);
    }

    #[test]
    fn test_wipeout_drops_to_low_band() {
        let mut a = side(0, 2);
        let b = side(1, 2);
        for c in a.party_mut() {
            c.take_damage(1000);
        }
        let value = outcome(&a, &b);
        // 0.2 base, minus own HP loss and the squared faint ratio.
        assert!(value <= 0.2);
        assert!(value.is_finite());
    }

    #[test]
    fn test_own_faint_ratio_is_squared() {
        // One faint out of two on each side: the opponent term counts
        // linearly, the player term quadratically, so mirrored faints
        // still favor the player.
        let mut a = side(0, 2);
        let mut b = side(1, 2);
        a.party_mut()[1].take_damage(1000);
        b.party_mut()[1].take_damage(1000);

        let value = outcome(&a, &b);
        // HP terms cancel; 0.5 - 0.25 = 0.25 faint edge, scaled by 10.
        assert!((value - (0.8 + 0.025)).abs() < 1e-9);
    }

    #[test]
    fn test_finite_for_all_party_sizes() {
        for player_count in 1..=6 {
            for opponent_count in 1..=6 {
                let a = side(0, player_count);
                let b = side(1, opponent_count);
                assert!(outcome(&a, &b).is_finite());
            }
        }
    }
}
