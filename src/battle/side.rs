//! One side of a battle: a named party with an attached policy.

use serde::{Deserialize, Serialize};

use crate::core::{CreatureId, SideId, PARTY_MAX};
use crate::policy::Policy;

use super::creature::Creature;

/// A competing side: an ordered party of up to six creatures (index 0
/// is the active one) and the policy that chooses its actions.
///
/// Cloning is a deep copy, independent of the original; the search
/// relies on this to explore hypothetical continuations.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BattleSide {
    name: String,
    id: SideId,
    party: Vec<Creature>,
    policy: Policy,
}

impl BattleSide {
    /// Create a side, assigning each creature its stable id.
    ///
    /// Ids are derived from the side tag so they are unique across both
    /// sides of a battle and deterministic across runs.
    ///
    /// # Panics
    /// Panics on an empty party or one larger than [`PARTY_MAX`].
    pub fn new(name: impl Into<String>, id: SideId, mut party: Vec<Creature>) -> Self {
        assert!(!party.is_empty(), "a side needs at least one creature");
        assert!(party.len() <= PARTY_MAX, "party exceeds the size limit");

        let id_base = u32::from(id.raw()) * PARTY_MAX as u32;
        for (idx, creature) in party.iter_mut().enumerate() {
            creature.set_id(CreatureId::new(id_base + idx as u32));
        }

        Self {
            name: name.into(),
            id,
            party,
            policy: Policy::Random,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn id(&self) -> SideId {
        self.id
    }

    #[must_use]
    pub fn party(&self) -> &[Creature] {
        &self.party
    }

    #[must_use]
    pub fn party_mut(&mut self) -> &mut [Creature] {
        &mut self.party
    }

    /// The creature currently engaged (party index 0).
    #[must_use]
    pub fn active(&self) -> &Creature {
        &self.party[0]
    }

    #[must_use]
    pub fn active_mut(&mut self) -> &mut Creature {
        &mut self.party[0]
    }

    #[must_use]
    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    pub fn set_policy(&mut self, policy: Policy) {
        self.policy = policy;
    }

    /// Bring the creature at `index` to the active slot, shifting the
    /// rest of the party down. Out-of-range or index 0 is a no-op.
    pub fn make_active(&mut self, index: usize) {
        if index > 0 && index < self.party.len() {
            let creature = self.party.remove(index);
            self.party.insert(0, creature);
        }
    }

    /// A side stays in the battle while any creature stands.
    #[must_use]
    pub fn has_live_creature(&self) -> bool {
        self.party.iter().any(|c| !c.is_fainted())
    }

    #[must_use]
    pub fn party_size(&self) -> usize {
        self.party.len()
    }

    #[must_use]
    pub fn fainted_count(&self) -> usize {
        self.party.iter().filter(|c| c.is_fainted()).count()
    }

    /// Sum of base HP across the party.
    #[must_use]
    pub fn total_base_hp(&self) -> u32 {
        self.party.iter().map(|c| u32::from(c.base_hp())).sum()
    }

    /// Total HP the party has lost so far.
    #[must_use]
    pub fn hp_lost(&self) -> u32 {
        self.party
            .iter()
            .map(|c| u32::from(c.base_hp() - c.hp()))
            .sum()
    }

    /// Party members ordered by stable id, the canonical order used by
    /// the encoder and the predictor's output layout.
    #[must_use]
    pub fn sorted_by_id(&self) -> Vec<&Creature> {
        let mut sorted: Vec<&Creature> = self.party.iter().collect();
        sorted.sort_by_key(|c| c.id());
        sorted
    }

    /// Rank of a creature within the id-sorted party.
    #[must_use]
    pub fn rank_of(&self, id: CreatureId) -> Option<usize> {
        self.sorted_by_id().iter().position(|c| c.id() == id)
    }

    /// Current party index of a creature.
    #[must_use]
    pub fn position_of(&self, id: CreatureId) -> Option<usize> {
        self.party.iter().position(|c| c.id() == id)
    }

    /// Party indices that are legal switch targets: every slot past the
    /// active one holding a non-fainted creature.
    #[must_use]
    pub fn legal_switches(&self) -> Vec<usize> {
        self.party
            .iter()
            .enumerate()
            .skip(1)
            .filter(|(_, c)| !c.is_fainted())
            .map(|(i, _)| i)
            .collect()
    }
}

impl std::fmt::Display for BattleSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} [{}]", self.name, self.active())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::creature::Stats;
    use crate::battle::element::ElementType;
    use crate::battle::moves::Move;

    fn creature(name: &str, hp: u16) -> Creature {
        Creature::new(
            name,
            ElementType::Normal,
            50,
            hp,
            Stats::new(50, 50, 50, 50, 50),
            vec![Move::new("Tackle", 35, 35, ElementType::Normal, false)],
        )
    }

    fn side() -> BattleSide {
        BattleSide::new(
            "Red",
            SideId::new(0),
            vec![creature("A", 100), creature("B", 80), creature("C", 60)],
        )
    }

    #[test]
    fn test_ids_are_stable_and_unique() {
        let a = side();
        let b = BattleSide::new("Blue", SideId::new(1), vec![creature("X", 90)]);

        let mut ids: Vec<u32> = a.party().iter().map(|c| c.id().raw()).collect();
        ids.extend(b.party().iter().map(|c| c.id().raw()));
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 4);
    }

    #[test]
    fn test_make_active_rotates_party() {
        let mut s = side();
        s.make_active(2);
        assert_eq!(s.active().name(), "C");
        assert_eq!(s.party()[1].name(), "A");
        assert_eq!(s.party()[2].name(), "B");
    }

    #[test]
    fn test_make_active_ignores_bad_index() {
        let mut s = side();
        s.make_active(0);
        s.make_active(9);
        assert_eq!(s.active().name(), "A");
    }

    #[test]
    fn test_sorted_by_id_survives_rotation() {
        let mut s = side();
        let before: Vec<_> = s.sorted_by_id().iter().map(|c| c.id()).collect();
        s.make_active(2);
        let after: Vec<_> = s.sorted_by_id().iter().map(|c| c.id()).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_legal_switches_skip_fainted() {
        let mut s = side();
        s.party_mut()[1].take_damage(1000);
        assert_eq!(s.legal_switches(), vec![2]);
    }

    #[test]
    fn test_hp_accounting() {
        let mut s = side();
        assert_eq!(s.total_base_hp(), 240);
        assert_eq!(s.hp_lost(), 0);
        s.party_mut()[0].take_damage(30);
        s.party_mut()[2].take_damage(1000);
        assert_eq!(s.hp_lost(), 90);
        assert_eq!(s.fainted_count(), 1);
        assert!(s.has_live_creature());
    }

    #[test]
    #[should_panic(expected = "at least one creature")]
    fn test_empty_party_rejected() {
        let _ = BattleSide::new("Empty", SideId::new(0), vec![]);
    }
}
