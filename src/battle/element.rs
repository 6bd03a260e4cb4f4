//! Element types and the attack effectiveness wheel.

use serde::{Deserialize, Serialize};

/// Element of a creature or a move.
///
/// `Typeless` is reserved for Struggle and hits everything neutrally.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementType {
    Normal,
    Fighting,
    Flying,
    Poison,
    Ground,
    Rock,
    Bug,
    Ghost,
    Steel,
    Fire,
    Water,
    Grass,
    Electric,
    Psychic,
    Ice,
    Dragon,
    Dark,
    Fairy,
    Typeless,
}

impl ElementType {
    /// Parse a type name as it appears in the creature data source.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "normal" => Some(Self::Normal),
            "fighting" => Some(Self::Fighting),
            "flying" => Some(Self::Flying),
            "poison" => Some(Self::Poison),
            "ground" => Some(Self::Ground),
            "rock" => Some(Self::Rock),
            "bug" => Some(Self::Bug),
            "ghost" => Some(Self::Ghost),
            "steel" => Some(Self::Steel),
            "fire" => Some(Self::Fire),
            "water" => Some(Self::Water),
            "grass" => Some(Self::Grass),
            "electric" => Some(Self::Electric),
            "psychic" => Some(Self::Psychic),
            "ice" => Some(Self::Ice),
            "dragon" => Some(Self::Dragon),
            "dark" => Some(Self::Dark),
            "fairy" => Some(Self::Fairy),
            "typeless" => Some(Self::Typeless),
            _ => None,
        }
    }
}

/// How strongly an attack of one element lands on a defender of another.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effectiveness {
    NoEffect,
    NotEffective,
    Normal,
    SuperEffective,
}

impl Effectiveness {
    /// Damage multiplier applied to the base formula.
    #[must_use]
    pub fn multiplier(self) -> f64 {
        match self {
            Self::NoEffect => 0.0,
            Self::NotEffective => 0.5,
            Self::Normal => 1.0,
            Self::SuperEffective => 2.0,
        }
    }
}

/// Effectiveness of an `attack` element against a `defend` element.
#[must_use]
pub fn effectiveness(attack: ElementType, defend: ElementType) -> Effectiveness {
    use ElementType::*;

    let (supers, immune, resists): (&[ElementType], &[ElementType], &[ElementType]) = match attack {
        Normal => (&[], &[Ghost], &[Rock, Steel]),
        Fighting => (
            &[Normal, Rock, Steel, Ice, Dark],
            &[Ghost],
            &[Flying, Poison, Bug, Psychic, Fairy],
        ),
        Flying => (&[Fighting, Bug, Grass], &[], &[Rock, Steel, Electric]),
        Poison => (&[Grass, Fairy], &[Steel], &[Poison, Ground, Rock, Ghost]),
        Ground => (
            &[Poison, Rock, Steel, Fire, Electric],
            &[Flying],
            &[Bug, Grass],
        ),
        Rock => (&[Flying, Bug, Fire, Ice], &[], &[Fighting, Ground, Steel]),
        Bug => (
            &[Grass, Psychic, Dark],
            &[],
            &[Fighting, Flying, Poison, Ghost, Steel, Fire, Fairy],
        ),
        Ghost => (&[Ghost, Psychic], &[Normal], &[Dark]),
        Steel => (&[Rock, Ice, Fairy], &[], &[Steel, Fire, Water, Electric]),
        Fire => (&[Bug, Steel, Grass, Ice], &[], &[Rock, Fire, Water, Dragon]),
        Water => (&[Ground, Rock, Fire], &[], &[Water, Grass, Dragon]),
        Grass => (
            &[Ground, Rock, Water],
            &[],
            &[Flying, Poison, Bug, Steel, Fire, Grass, Dragon],
        ),
        Electric => (&[Flying, Water], &[Ground], &[Grass, Electric, Dragon]),
        Psychic => (&[Fighting, Poison], &[Dark], &[Steel, Psychic]),
        Ice => (
            &[Flying, Ground, Grass, Dragon],
            &[],
            &[Steel, Fire, Water, Ice],
        ),
        Dragon => (&[Dragon], &[Fairy], &[Steel]),
        Dark => (&[Ghost, Psychic], &[], &[Fighting, Dark, Fairy]),
        Fairy => (&[Fighting, Dragon, Dark], &[], &[Poison, Steel, Fire]),
        Typeless => (&[], &[], &[]),
    };

    if immune.contains(&defend) {
        Effectiveness::NoEffect
    } else if supers.contains(&defend) {
        Effectiveness::SuperEffective
    } else if resists.contains(&defend) {
        Effectiveness::NotEffective
    } else {
        Effectiveness::Normal
    }
}
