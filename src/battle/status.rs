//! Status conditions and their battle effects.

use serde::{Deserialize, Serialize};

/// A status condition a creature can suffer from.
///
/// Gate statuses occupy the primary slot and interfere with the attack
/// attempt; damage-over-time statuses occupy the secondary slot and
/// tick at the end of each turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusCondition {
    Infatuation,
    Confusion,
    Sleep,
    Poison,
    BadPoison,
    Paralysis,
    Freeze,
    Burn,
}

impl StatusCondition {
    /// Whether this status ticks damage at end of turn rather than
    /// gating the attack attempt.
    #[must_use]
    pub fn is_damage_over_time(self) -> bool {
        matches!(self, Self::Poison | Self::BadPoison | Self::Burn)
    }

    /// Parse a status name as it appears in the creature data source.
    /// `none` and the empty string mean no status.
    pub fn parse(s: &str) -> Result<Option<Self>, String> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "none" => Ok(None),
            "poison" => Ok(Some(Self::Poison)),
            "bad_poison" => Ok(Some(Self::BadPoison)),
            "infatuation" => Ok(Some(Self::Infatuation)),
            "confusion" => Ok(Some(Self::Confusion)),
            "sleep" => Ok(Some(Self::Sleep)),
            "paralysis" => Ok(Some(Self::Paralysis)),
            "freeze" => Ok(Some(Self::Freeze)),
            "burn" => Ok(Some(Self::Burn)),
            other => Err(format!("unknown status: {other}")),
        }
    }

    /// Human-readable description, used in battle logging.
    #[must_use]
    pub fn describe(self) -> &'static str {
        match self {
            Self::Infatuation => "infatuated",
            Self::Confusion => "confused",
            Self::Sleep => "fast asleep",
            Self::Poison => "poisoned",
            Self::BadPoison => "badly poisoned",
            Self::Paralysis => "paralyzed",
            Self::Freeze => "frozen solid",
            Self::Burn => "burned",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dot_classification() {
        assert!(StatusCondition::Poison.is_damage_over_time());
        assert!(StatusCondition::BadPoison.is_damage_over_time());
        assert!(StatusCondition::Burn.is_damage_over_time());
        assert!(!StatusCondition::Sleep.is_damage_over_time());
        assert!(!StatusCondition::Confusion.is_damage_over_time());
    }

    #[test]
    fn test_parse() {
        assert_eq!(StatusCondition::parse("none"), Ok(None));
        assert_eq!(StatusCondition::parse(""), Ok(None));
        assert_eq!(
            StatusCondition::parse("bad_poison"),
            Ok(Some(StatusCondition::BadPoison))
        );
        assert!(StatusCondition::parse("cursed").is_err());
    }
}
