//! Creature data: the CSV ingestion format and a built-in roster.
//!
//! The CSV layout is `Name, Type, Level, HP, Attack, Sp_Attack,
//! Defense, Sp_Defense, Speed` followed by four repetitions of
//! `Move_i_{Name, Base_Damage, PP, Type, Is_Special, Status,
//! Base_Heal}`. Empty move-name columns mean the creature knows fewer
//! than four moves.

use anyhow::{anyhow, bail, Context, Result};

use crate::battle::creature::{Creature, Stats};
use crate::battle::element::ElementType;
use crate::battle::moves::Move;
use crate::battle::status::StatusCondition;
use crate::core::MOVES_MAX;

/// Columns before the move groups.
const BASE_COLUMNS: usize = 9;

/// Columns per move group.
const MOVE_COLUMNS: usize = 7;

/// Parse a full CSV document into creatures. A leading header row is
/// skipped.
pub fn parse_roster(csv: &str) -> Result<Vec<Creature>> {
    let mut roster = Vec::new();
    for (line_number, line) in csv.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if line_number == 0 && trimmed.starts_with("Name,") {
            continue;
        }
        let creature = parse_row(trimmed)
            .with_context(|| format!("bad creature row on line {}", line_number + 1))?;
        roster.push(creature);
    }
    Ok(roster)
}

/// Parse one CSV row into a creature.
pub fn parse_row(row: &str) -> Result<Creature> {
    let fields: Vec<&str> = row.split(',').map(str::trim).collect();
    if fields.len() < BASE_COLUMNS {
        bail!("expected at least {BASE_COLUMNS} columns, found {}", fields.len());
    }

    let name = fields[0];
    let element = ElementType::parse(fields[1])
        .ok_or_else(|| anyhow!("unknown creature type: {}", fields[1]))?;
    let level: u8 = fields[2].parse().context("bad level")?;
    let hp: u16 = fields[3].parse().context("bad HP")?;
    let attack: u16 = fields[4].parse().context("bad attack")?;
    let special_attack: u16 = fields[5].parse().context("bad special attack")?;
    let defense: u16 = fields[6].parse().context("bad defense")?;
    let special_defense: u16 = fields[7].parse().context("bad special defense")?;
    let speed: u16 = fields[8].parse().context("bad speed")?;

    let mut moves = Vec::new();
    for slot in 0..MOVES_MAX {
        let base = BASE_COLUMNS + slot * MOVE_COLUMNS;
        if base >= fields.len() {
            break;
        }
        let group = &fields[base..(base + MOVE_COLUMNS).min(fields.len())];
        if group.is_empty() || group[0].is_empty() {
            continue;
        }
        if group.len() < MOVE_COLUMNS {
            bail!("move group {} is truncated", slot + 1);
        }
        moves.push(parse_move(group).with_context(|| format!("bad move in slot {}", slot + 1))?);
    }

    Ok(Creature::new(
        name,
        element,
        level,
        hp,
        Stats::new(attack, defense, special_attack, special_defense, speed),
        moves,
    ))
}

fn parse_move(group: &[&str]) -> Result<Move> {
    let name = group[0];
    let base_damage: u16 = group[1].parse().context("bad base damage")?;
    let pp: u16 = group[2].parse().context("bad PP")?;
    let element =
        ElementType::parse(group[3]).ok_or_else(|| anyhow!("unknown move type: {}", group[3]))?;
    let is_special = matches!(group[4].to_ascii_lowercase().as_str(), "true" | "1" | "yes");
    let status = StatusCondition::parse(group[5]).map_err(|e| anyhow!(e))?;
    let base_heal: u16 = group[6].parse().context("bad base heal")?;

    let mut mv = Move::new(name, base_damage, pp, element, is_special);
    if let Some(status) = status {
        mv = mv.with_status(status);
    }
    if base_heal > 0 {
        mv = mv.with_heal(base_heal);
    }
    Ok(mv)
}

/// A handful of first-generation creatures used by examples and the
/// end-to-end tests.
#[must_use]
pub fn sample_roster() -> Vec<Creature> {
    vec![
        Creature::new(
            "Charizard",
            ElementType::Fire,
            50,
            138,
            Stats::new(89, 83, 114, 90, 105),
            vec![
                Move::new("Flamethrower", 95, 15, ElementType::Fire, true),
                Move::new("Slash", 70, 20, ElementType::Normal, false),
                Move::new("Ember", 40, 25, ElementType::Fire, true),
                Move::new("Scratch", 40, 35, ElementType::Normal, false),
            ],
        ),
        Creature::new(
            "Blastoise",
            ElementType::Water,
            50,
            139,
            Stats::new(88, 105, 90, 110, 83),
            vec![
                Move::new("Hydro Pump", 110, 5, ElementType::Water, true),
                Move::new("Water Gun", 40, 25, ElementType::Water, true),
                Move::new("Bite", 60, 25, ElementType::Normal, false),
                Move::new("Tackle", 35, 35, ElementType::Normal, false),
            ],
        ),
        Creature::new(
            "Venusaur",
            ElementType::Grass,
            50,
            140,
            Stats::new(87, 88, 105, 105, 85),
            vec![
                Move::new("Razor Leaf", 55, 25, ElementType::Grass, false),
                Move::new("Vine Whip", 45, 25, ElementType::Grass, false),
                Move::new("Poison Powder", 0, 35, ElementType::Poison, false)
                    .with_status(StatusCondition::Poison),
                Move::new("Tackle", 35, 35, ElementType::Normal, false),
            ],
        ),
        Creature::new(
            "Squirtle",
            ElementType::Water,
            50,
            104,
            Stats::new(53, 70, 55, 69, 48),
            vec![
                Move::new("Water Gun", 40, 25, ElementType::Water, true),
                Move::new("Bite", 60, 25, ElementType::Normal, false),
                Move::new("Tackle", 35, 35, ElementType::Normal, false),
            ],
        ),
        Creature::new(
            "Bulbasaur",
            ElementType::Grass,
            50,
            105,
            Stats::new(54, 54, 70, 70, 50),
            vec![
                Move::new("Vine Whip", 45, 25, ElementType::Grass, false),
                Move::new("Sleep Powder", 0, 15, ElementType::Grass, false)
                    .with_status(StatusCondition::Sleep),
                Move::new("Tackle", 35, 35, ElementType::Normal, false),
            ],
        ),
        Creature::new(
            "Pikachu",
            ElementType::Electric,
            50,
            95,
            Stats::new(60, 45, 55, 55, 95),
            vec![
                Move::new("Thunderbolt", 90, 15, ElementType::Electric, true),
                Move::new("Thunder Shock", 40, 30, ElementType::Electric, true),
                Move::new("Quick Attack", 40, 30, ElementType::Normal, false),
            ],
        ),
    ]
}

/// Look up a sample-roster creature by name, case-insensitively.
#[must_use]
pub fn sample_creature(name: &str) -> Option<Creature> {
    sample_roster()
        .into_iter()
        .find(|c| c.name().eq_ignore_ascii_case(name))
}
