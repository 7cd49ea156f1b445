use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::dsl::Resolvable;
use crate::schema::mv::MoveSet;
use crate::schema::stats::{Buff, BuffSeed, FighterStats, Status};
use crate::{FIGHTER_TYPES, MAX_BUFFS};

/// A fighter's authored template: descriptive fields, its ceilings, its
/// starting in-battle state, and the up-to-four moves it can use.
#[derive(Debug, Clone, Serialize)]
#[serde(try_from = "RawFighter")]
pub struct Fighter {
    pub id: String,
    pub name: String,
    pub description: String,
    pub enabled: bool,
    pub r#type: String,
    pub sprite: Option<String>,
    pub moves: Vec<String>,
    pub stats: FighterStats,
    pub starting_stats: FighterStats,
    pub starting_buffs: Vec<BuffSeed>,
    pub starting_status: Vec<Status>,
}

#[derive(Deserialize)]
struct RawFighter {
    id: String,
    #[serde(default = "default_fighter_name")]
    name: Resolvable,
    #[serde(default = "default_fighter_description")]
    description: Resolvable,
    #[serde(default = "default_true")]
    enabled: bool,
    r#type: Resolvable,
    sprite: Option<String>,
    #[serde(default)]
    moves: Vec<String>,
    stats: FighterStats,
    starting_stats: Option<RawStartingStats>,
    #[serde(default)]
    starting_buffs: Vec<BuffSeed>,
    #[serde(default)]
    starting_status: Vec<Status>,
}

#[derive(Deserialize)]
struct RawStartingStats {
    #[serde(default)]
    hp: Option<i32>,
    #[serde(default)]
    attack: Option<i32>,
    #[serde(default)]
    defense: Option<i32>,
    #[serde(default)]
    shield: Option<i32>,
    #[serde(default)]
    charge: Option<i32>,
}

fn default_fighter_name() -> Resolvable {
    Resolvable::literal("unnamed fighter".to_string())
}
fn default_fighter_description() -> Resolvable {
    Resolvable::literal("no description provided.".to_string())
}
fn default_true() -> bool {
    true
}

impl TryFrom<RawFighter> for Fighter {
    type Error = anyhow::Error;

    fn try_from(mut raw: RawFighter) -> Result<Self, Self::Error> {
        if raw.id.is_empty() || raw.id.len() > 63 {
            anyhow::bail!("invalid fighter id: '{}'", raw.id);
        }
        let fighter_type = raw.r#type.resolve_string();
        if !FIGHTER_TYPES.contains(&fighter_type.as_str()) {
            anyhow::bail!("invalid fighter type: '{fighter_type}'");
        }
        if raw.moves.len() > 4 {
            anyhow::bail!("fighter '{}' declares more than 4 moves", raw.id);
        }

        // Unlike `FighterStats` itself (whose bare `shield` defaults to
        // `hp`), a fighter's starting in-battle shield/charge default to
        // zero: a fighter doesn't walk into battle already shielded.
        let starting_stats = match raw.starting_stats {
            Some(r) => FighterStats {
                hp: r.hp.unwrap_or(raw.stats.hp),
                attack: r.attack.unwrap_or(raw.stats.attack),
                defense: r.defense.unwrap_or(raw.stats.defense),
                shield: r.shield.unwrap_or(0),
                charge: r.charge.unwrap_or(0),
                charge_bonus: raw.stats.charge_bonus,
            },
            None => FighterStats {
                hp: raw.stats.hp,
                attack: raw.stats.attack,
                defense: raw.stats.defense,
                shield: 0,
                charge: 0,
                charge_bonus: raw.stats.charge_bonus,
            },
        };

        for (name, value, ceiling) in [
            ("hp", starting_stats.hp, raw.stats.hp),
            ("attack", starting_stats.attack, raw.stats.attack),
            ("defense", starting_stats.defense, raw.stats.defense),
            ("shield", starting_stats.shield, raw.stats.shield),
            ("charge", starting_stats.charge, raw.stats.charge),
        ] {
            if value > ceiling {
                anyhow::bail!(
                    "fighter '{}' starting {name} ({value}) exceeds its stat ceiling ({ceiling})",
                    raw.id
                );
            }
        }

        if raw.starting_buffs.len() > MAX_BUFFS {
            log::warn!(
                "fighter '{}' declares more than {MAX_BUFFS} starting buffs, truncating",
                raw.id
            );
            raw.starting_buffs.truncate(MAX_BUFFS);
        }

        Ok(Fighter {
            id: raw.id,
            name: raw.name.resolve_string(),
            description: raw.description.resolve_string(),
            enabled: raw.enabled,
            r#type: fighter_type,
            sprite: raw.sprite,
            moves: raw.moves,
            stats: raw.stats,
            starting_stats,
            starting_buffs: raw.starting_buffs,
            starting_status: raw.starting_status,
        })
    }
}

impl Fighter {
    pub fn resolve_starting_buffs(&self) -> Vec<Buff> {
        self.starting_buffs.iter().map(BuffSeed::resolve).collect()
    }

    pub fn resolve_moves(&self, catalogue: &MoveSet) -> anyhow::Result<Vec<String>> {
        let mut resolved = Vec::new();
        for id in &self.moves {
            if !catalogue.contains(id) {
                anyhow::bail!("fighter '{}' references unknown move '{id}'", self.id);
            }
            resolved.push(id.clone());
        }
        Ok(resolved)
    }
}

/// Keyed container of fighters, built by the registry. Duplicate ids keep
/// the last occurrence; disabled fighters are excluded from the index.
#[derive(Debug, Clone)]
pub struct FighterSet {
    by_id: HashMap<String, Fighter>,
}

impl FighterSet {
    pub fn get(&self, id: &str) -> Option<&Fighter> {
        self.by_id.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

impl TryFrom<Vec<Fighter>> for FighterSet {
    type Error = anyhow::Error;

    fn try_from(fighters: Vec<Fighter>) -> Result<Self, Self::Error> {
        let mut by_id = HashMap::new();
        for fighter in fighters {
            if !fighter.enabled {
                continue;
            }
            if by_id.contains_key(&fighter.id) {
                log::warn!("duplicate fighter id detected: '{}', using last occurrence", fighter.id);
            }
            by_id.insert(fighter.id.clone(), fighter);
        }
        if by_id.is_empty() {
            log::warn!("FighterSet is empty");
        }
        Ok(FighterSet { by_id })
    }
}

impl<'de> Deserialize<'de> for FighterSet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let fighters = Vec::<Fighter>::deserialize(deserializer)?;
        FighterSet::try_from(fighters).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fighter_json(starting: &str) -> String {
        format!(
            r#"{{"id":"f1","type":"none","stats":{{"hp":300,"attack":100,"defense":100}}{starting}}}"#
        )
    }

    #[test]
    fn starting_stats_default_shield_and_charge_to_zero() {
        let f: Fighter = serde_json::from_str(&fighter_json("")).unwrap();
        assert_eq!(f.starting_stats.shield, 0);
        assert_eq!(f.starting_stats.charge, 0);
        assert_eq!(f.starting_stats.hp, 300);
    }

    #[test]
    fn starting_stats_cannot_exceed_ceiling() {
        let json = fighter_json(r#","starting_stats":{"hp":400}"#);
        let result: Result<Fighter, _> = serde_json::from_str(&json);
        assert!(result.is_err());
    }

    #[test]
    fn rejects_too_many_moves() {
        let json = r#"{"id":"f1","type":"none","stats":{"hp":10,"attack":1,"defense":1},"moves":["a","b","c","d","e"]}"#;
        let result: Result<Fighter, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }

    #[test]
    fn over_cap_starting_buffs_are_truncated_not_rejected() {
        let buff = r#"{"stat":"attack","amount":5,"duration":3}"#;
        let json = format!(
            r#"{{"id":"f1","type":"none","stats":{{"hp":10,"attack":1,"defense":1}},"starting_buffs":[{buff},{buff},{buff},{buff},{buff}]}}"#
        );
        let f: Fighter = serde_json::from_str(&json).unwrap();
        assert_eq!(f.starting_buffs.len(), MAX_BUFFS);
    }

    #[test]
    fn fighterset_drops_disabled_and_dedups() {
        let fighters: Vec<Fighter> = serde_json::from_str(&format!(
            "[{},{}]",
            fighter_json(""),
            r#"{"id":"f2","type":"none","stats":{"hp":1,"attack":1,"defense":1},"enabled":false}"#
        ))
        .unwrap();
        let set = FighterSet::try_from(fighters).unwrap();
        assert!(set.contains("f1"));
        assert!(!set.contains("f2"));
    }
}
