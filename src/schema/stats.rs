use serde::{Deserialize, Serialize};

use crate::dsl::Resolvable;
use crate::{MAX_CHARGE_BONUS, MAX_INT_STAT, STATUS_IDS};

/// Immutable per-field ceilings for a fighter. `shield` defaults to `hp`
/// when omitted from content JSON.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(try_from = "RawFighterStats")]
pub struct FighterStats {
    pub hp: i32,
    pub attack: i32,
    pub defense: i32,
    pub shield: i32,
    pub charge: i32,
    pub charge_bonus: f64,
}

#[derive(Deserialize)]
struct RawFighterStats {
    hp: i32,
    attack: i32,
    defense: i32,
    shield: Option<i32>,
    #[serde(default)]
    charge: i32,
    #[serde(default)]
    charge_bonus: f64,
}

impl TryFrom<RawFighterStats> for FighterStats {
    type Error = anyhow::Error;

    fn try_from(raw: RawFighterStats) -> Result<Self, Self::Error> {
        let stats = FighterStats {
            hp: raw.hp,
            attack: raw.attack,
            defense: raw.defense,
            shield: raw.shield.unwrap_or(raw.hp),
            charge: raw.charge,
            charge_bonus: raw.charge_bonus,
        };
        stats.validate()?;
        Ok(stats)
    }
}

impl FighterStats {
    pub fn validate(&self) -> anyhow::Result<()> {
        for (name, value) in [
            ("hp", self.hp),
            ("attack", self.attack),
            ("defense", self.defense),
            ("shield", self.shield),
            ("charge", self.charge),
        ] {
            if !(0..=MAX_INT_STAT).contains(&value) {
                anyhow::bail!("{name} must be in [0,{MAX_INT_STAT}], got {value}");
            }
        }
        if !(0.0..=MAX_CHARGE_BONUS).contains(&self.charge_bonus) {
            anyhow::bail!(
                "charge_bonus must be in [0,{MAX_CHARGE_BONUS}], got {}",
                self.charge_bonus
            );
        }
        if self.shield > self.hp {
            anyhow::bail!("shield ({}) must be <= hp ({})", self.shield, self.hp);
        }
        Ok(())
    }

    pub fn get(&self, field: &str) -> Option<i32> {
        match field {
            "hp" => Some(self.hp),
            "attack" => Some(self.attack),
            "defense" => Some(self.defense),
            "shield" => Some(self.shield),
            "charge" => Some(self.charge),
            _ => None,
        }
    }
}

/// Authored buff as it appears in fighter content: amount and duration
/// may be DSL expressions, resolved once when a `FighterVolatile` is
/// seeded from the base fighter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuffSeed {
    pub stat: String,
    pub amount: Resolvable,
    pub duration: Resolvable,
}

impl BuffSeed {
    pub fn resolve(&self) -> Buff {
        Buff {
            stat: self.stat.clone(),
            amount: self.amount.resolve_f64().unwrap_or(0.0),
            duration: self.duration.resolve_i64().unwrap_or(-1) as i32,
        }
    }
}

/// A live buff held on a `FighterVolatile`. `duration == -1` is infinite;
/// anything else is decremented at each full-turn boundary and removed at 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Buff {
    pub stat: String,
    pub amount: f64,
    pub duration: i32,
}

impl Buff {
    pub fn new(stat: impl Into<String>, amount: f64, duration: i32) -> Self {
        Buff {
            stat: stat.into(),
            amount,
            duration,
        }
    }
}

/// Authored status as it appears in fighter content.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(try_from = "RawStatus")]
pub struct Status {
    pub id: String,
    pub stacks: i32,
    pub duration: i32,
}

#[derive(Deserialize)]
struct RawStatus {
    id: String,
    #[serde(default)]
    stacks: i32,
    #[serde(default = "default_status_duration")]
    duration: i32,
}

fn default_status_duration() -> i32 {
    -1
}

impl TryFrom<RawStatus> for Status {
    type Error = anyhow::Error;

    fn try_from(raw: RawStatus) -> Result<Self, Self::Error> {
        if !STATUS_IDS.contains(&raw.id.as_str()) {
            anyhow::bail!("unknown status id: {}", raw.id);
        }
        if raw.stacks < 0 {
            anyhow::bail!("status stacks must be >= 0, got {}", raw.stacks);
        }
        if raw.duration < -1 {
            anyhow::bail!("status duration must be >= -1, got {}", raw.duration);
        }
        Ok(Status {
            id: raw.id,
            stacks: raw.stacks,
            duration: raw.duration,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shield_defaults_to_hp() {
        let raw: FighterStats = serde_json::from_str(r#"{"hp":300,"attack":100,"defense":100}"#)
            .unwrap();
        assert_eq!(raw.shield, 300);
    }

    #[test]
    fn shield_over_hp_rejected() {
        let result: Result<FighterStats, _> =
            serde_json::from_str(r#"{"hp":100,"attack":10,"defense":10,"shield":200}"#);
        assert!(result.is_err());
    }

    #[test]
    fn stat_ceiling_enforced() {
        let result: Result<FighterStats, _> =
            serde_json::from_str(r#"{"hp":10000,"attack":10,"defense":10}"#);
        assert!(result.is_err());
    }
}
