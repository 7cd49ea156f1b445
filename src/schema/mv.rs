use std::collections::HashMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::dsl::{check, Resolvable, Value};
use crate::schema::action::{Action, ContextOverride};
use crate::schema::volatile::FighterVolatile;
use crate::{CHARGE_BONUS_SCALE, MOVE_CATEGORIES, STAB_MULTIPLIER, STAT_FIELDS};

fn looks_fractional(amount: &Resolvable) -> bool {
    match amount {
        Resolvable::Literal(v) => v.is_fractional(),
        Resolvable::Sampler(node) => node.source.contains('.'),
    }
}

/// The evaluation context propagated during move execution: merged
/// default ▹ move overrides ▹ runtime overrides, and from parent to child
/// at every nested action.
#[derive(Debug, Clone, Serialize)]
#[serde(try_from = "RawMoveContext")]
pub struct MoveContext {
    pub amount: Resolvable,
    pub chance: Resolvable,
    pub calc_target: Resolvable,
    pub calc_field: Resolvable,
    pub mult: Resolvable,
    pub flat: Resolvable,
    pub duration: Resolvable,
    /// Explicit percentage discriminant (REDESIGN: no longer inferred from
    /// whether a sampled `amount` happens to come back as a float).
    pub is_percent: bool,
}

#[derive(Deserialize)]
struct RawMoveContext {
    #[serde(default = "default_amount")]
    amount: Resolvable,
    #[serde(default = "default_chance")]
    chance: Resolvable,
    #[serde(default = "default_self")]
    calc_target: Resolvable,
    #[serde(default = "default_hp")]
    calc_field: Resolvable,
    #[serde(default = "default_mult")]
    mult: Resolvable,
    #[serde(default = "default_flat")]
    flat: Resolvable,
    #[serde(default = "default_duration")]
    duration: Resolvable,
    is_percent: Option<bool>,
}

fn default_amount() -> Resolvable {
    Resolvable::literal(0i64)
}
fn default_chance() -> Resolvable {
    Resolvable::literal(1.0f64)
}
fn default_self() -> Resolvable {
    Resolvable::literal("self".to_string())
}
fn default_hp() -> Resolvable {
    Resolvable::literal("hp".to_string())
}
fn default_mult() -> Resolvable {
    Resolvable::literal(1.0f64)
}
fn default_flat() -> Resolvable {
    Resolvable::literal(0i64)
}
fn default_duration() -> Resolvable {
    Resolvable::literal(-1i64)
}

impl TryFrom<RawMoveContext> for MoveContext {
    type Error = anyhow::Error;

    fn try_from(raw: RawMoveContext) -> Result<Self, Self::Error> {
        MoveContext::validate_fields(
            &raw.amount,
            &raw.chance,
            &raw.calc_target,
            &raw.calc_field,
            &raw.mult,
            &raw.flat,
            &raw.duration,
        )?;
        let is_percent = raw
            .is_percent
            .unwrap_or_else(|| looks_fractional(&raw.amount));
        Ok(MoveContext {
            amount: raw.amount,
            chance: raw.chance,
            calc_target: raw.calc_target,
            calc_field: raw.calc_field,
            mult: raw.mult,
            flat: raw.flat,
            duration: raw.duration,
            is_percent,
        })
    }
}

impl MoveContext {
    #[allow(clippy::too_many_arguments)]
    fn validate_fields(
        amount: &Resolvable,
        chance: &Resolvable,
        calc_target: &Resolvable,
        calc_field: &Resolvable,
        mult: &Resolvable,
        flat: &Resolvable,
        duration: &Resolvable,
    ) -> anyhow::Result<()> {
        let amount_domain = amount.domain();
        let chance_domain = chance.domain();
        let mult_domain = mult.domain();
        let duration_domain = duration.domain();
        let flat_domain = flat.domain();

        check(&[("amount", &amount_domain)], |v| {
            v["amount"].as_f64().map(|x| x >= 0.0).unwrap_or(false)
        })
        .map_err(|e| anyhow::anyhow!("MoveContext 'amount' must be >= 0: {e}"))?;

        check(&[("chance", &chance_domain)], |v| {
            v["chance"]
                .as_f64()
                .map(|x| (0.0..=1.0).contains(&x))
                .unwrap_or(false)
        })
        .map_err(|e| anyhow::anyhow!("MoveContext 'chance' must be in [0,1]: {e}"))?;

        check(&[("mult", &mult_domain)], |v| {
            v["mult"].as_f64().map(|x| x >= 0.0).unwrap_or(false)
        })
        .map_err(|e| anyhow::anyhow!("MoveContext 'mult' must be >= 0: {e}"))?;

        check(&[("duration", &duration_domain)], |v| {
            v["duration"].as_f64().map(|x| x >= -1.0).unwrap_or(false)
        })
        .map_err(|e| anyhow::anyhow!("MoveContext 'duration' must be >= -1: {e}"))?;

        check(
            &[("amount", &amount_domain), ("flat", &flat_domain)],
            |v| {
                let a = v["amount"].as_f64().unwrap_or(0.0);
                let f = v["flat"].as_f64().unwrap_or(0.0);
                a + f >= 0.0
            },
        )
        .map_err(|e| anyhow::anyhow!("MoveContext 'amount' and 'flat' cannot sum to negative: {e}"))?;

        let target = calc_target.resolve_string();
        if target != "self" && target != "opponent" {
            anyhow::bail!("MoveContext 'calc_target' must be 'self' or 'opponent', got '{target}'");
        }
        let field = calc_field.resolve_string();
        if !STAT_FIELDS.contains(&field.as_str()) {
            anyhow::bail!("MoveContext 'calc_field' must be a valid stat, got '{field}'");
        }
        Ok(())
    }

    pub fn default_context() -> MoveContext {
        MoveContext {
            amount: default_amount(),
            chance: default_chance(),
            calc_target: default_self(),
            calc_field: default_hp(),
            mult: default_mult(),
            flat: default_flat(),
            duration: default_duration(),
            is_percent: false,
        }
    }

    /// Overlay non-`None` fields of `over` on top of `parent`.
    pub fn merge(parent: &MoveContext, over: &ContextOverride) -> MoveContext {
        let amount = over
            .amount
            .clone()
            .unwrap_or_else(|| parent.amount.clone());
        let is_percent = over.is_percent.unwrap_or_else(|| {
            if over.amount.is_some() {
                looks_fractional(&amount)
            } else {
                parent.is_percent
            }
        });
        MoveContext {
            amount,
            chance: over.chance.clone().unwrap_or_else(|| parent.chance.clone()),
            calc_target: over
                .calc_target
                .clone()
                .unwrap_or_else(|| parent.calc_target.clone()),
            calc_field: over
                .calc_field
                .clone()
                .unwrap_or_else(|| parent.calc_field.clone()),
            mult: over.mult.clone().unwrap_or_else(|| parent.mult.clone()),
            flat: over.flat.clone().unwrap_or_else(|| parent.flat.clone()),
            duration: over
                .duration
                .clone()
                .unwrap_or_else(|| parent.duration.clone()),
            is_percent,
        }
    }

    fn calc_target_fighter<'a>(
        &self,
        user: &'a FighterVolatile,
        target: &'a FighterVolatile,
        rng: &mut impl Rng,
    ) -> &'a FighterVolatile {
        match self.calc_target.resolve_string_with(rng).as_str() {
            "opponent" => target,
            _ => user,
        }
    }

    fn calc_field_value(&self, user: &FighterVolatile, target: &FighterVolatile, rng: &mut impl Rng) -> f64 {
        let fighter = self.calc_target_fighter(user, target, rng);
        let field = self.calc_field.resolve_string_with(rng);
        fighter
            .current_stats
            .get(&field)
            .map(|v| v as f64)
            .unwrap_or(0.0)
    }

    /// The move-context-resolved amount before charge bonus/mult/flat/STAB
    /// are folded in by [`Move::effective_amount`]. Draws from `rng` so the
    /// whole chain belongs to the engine's single seeded stream.
    pub fn base_amount(&self, user: &FighterVolatile, target: &FighterVolatile, rng: &mut impl Rng) -> f64 {
        let amount = self.amount.resolve_f64_with(rng).unwrap_or(0.0);
        if self.is_percent {
            amount * self.calc_field_value(user, target, rng)
        } else {
            amount
        }
    }
}

/// A move's full, immutable behavior: its own [`MoveContext`] plus
/// descriptive fields and the action tree it executes.
#[derive(Debug, Clone, Serialize)]
#[serde(try_from = "RawMove")]
pub struct Move {
    pub id: String,
    pub name: String,
    pub description: String,
    pub enabled: bool,
    pub r#type: String,
    pub category: String,
    pub charge_usage: Resolvable,
    pub sound: Option<String>,
    pub actions: Vec<Action>,
    pub context: MoveContext,
}

#[derive(Deserialize)]
struct RawMove {
    id: String,
    #[serde(default = "default_move_name")]
    name: Resolvable,
    #[serde(default = "default_move_description")]
    description: Resolvable,
    #[serde(default = "default_true")]
    enabled: bool,
    #[serde(default = "default_none_type")]
    r#type: Resolvable,
    #[serde(default = "default_none_type")]
    category: Resolvable,
    #[serde(default = "default_zero_f")]
    charge_usage: Resolvable,
    sound: Option<String>,
    #[serde(default)]
    actions: Vec<Action>,
    #[serde(flatten)]
    context: RawMoveContext,
}

fn default_move_name() -> Resolvable {
    Resolvable::literal("unknown move".to_string())
}
fn default_move_description() -> Resolvable {
    Resolvable::literal("no description provided.".to_string())
}
fn default_true() -> bool {
    true
}
fn default_none_type() -> Resolvable {
    Resolvable::literal("none".to_string())
}
fn default_zero_f() -> Resolvable {
    Resolvable::literal(0.0f64)
}

impl TryFrom<RawMove> for Move {
    type Error = anyhow::Error;

    fn try_from(raw: RawMove) -> Result<Self, Self::Error> {
        if raw.id.is_empty() || raw.id.len() > 63 {
            anyhow::bail!("invalid move id: '{}'", raw.id);
        }
        let name = raw.name.resolve_string();
        if name.len() > 127 {
            anyhow::bail!("invalid move name: '{name}'");
        }
        let description = raw.description.resolve_string();
        if description.len() > 511 {
            anyhow::bail!("invalid move description (too long)");
        }
        let move_type = raw.r#type.resolve_string();
        if !crate::FIGHTER_TYPES.contains(&move_type.as_str()) {
            anyhow::bail!("invalid move type: '{move_type}'");
        }
        let category = raw.category.resolve_string();
        if !MOVE_CATEGORIES.contains(&category.as_str()) {
            anyhow::bail!("invalid move category: '{category}'");
        }
        let charge_domain = raw.charge_usage.domain();
        check(&[("charge_usage", &charge_domain)], |v| {
            v["charge_usage"]
                .as_f64()
                .map(|x| (0.0..=999.0).contains(&x))
                .unwrap_or(false)
        })
        .map_err(|e| anyhow::anyhow!("invalid move charge usage: {e}"))?;

        let context = MoveContext::try_from(raw.context)?;

        Ok(Move {
            id: raw.id,
            name,
            description,
            enabled: raw.enabled,
            r#type: move_type,
            category,
            charge_usage: raw.charge_usage,
            sound: raw.sound,
            actions: raw.actions,
            context,
        })
    }
}

impl Move {
    /// A typeless (`"none"`) move never gets the same-type attack bonus,
    /// even against a typeless fighter.
    pub fn is_stab(&self, user: &FighterVolatile) -> bool {
        self.r#type != "none" && self.r#type == user.fighter_type
    }

    pub fn type_effectiveness(&self, _user: &FighterVolatile, _target: &FighterVolatile) -> f64 {
        1.0
    }

    /// The amount actually applied once charge bonus, mult/flat, STAB, and
    /// type effectiveness have all been folded in.
    pub fn effective_amount(
        &self,
        user: &FighterVolatile,
        target: &FighterVolatile,
        ctx: &MoveContext,
        rng: &mut impl Rng,
    ) -> f64 {
        let base = ctx.base_amount(user, target, rng);
        let charge_cap = user.base_max_stats.charge.max(1) as f64;
        let charge_ratio = user.current_stats.charge as f64 / charge_cap;
        let added_charge = base * CHARGE_BONUS_SCALE * charge_ratio;
        let stab = if self.is_stab(user) { STAB_MULTIPLIER } else { 1.0 };
        let type_effectiveness = self.type_effectiveness(user, target);
        let mult = ctx.mult.resolve_f64_with(rng).unwrap_or(1.0);
        let flat = ctx.flat.resolve_f64_with(rng).unwrap_or(0.0);
        ((base + added_charge) * mult + flat) * stab * type_effectiveness
    }
}

/// Keyed container of moves, built by the registry. Duplicate ids keep the
/// last occurrence; disabled moves are excluded from the index.
#[derive(Debug, Clone)]
pub struct MoveSet {
    by_id: HashMap<String, Move>,
}

impl MoveSet {
    pub fn get(&self, id: &str) -> Option<&Move> {
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

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.by_id.keys().map(String::as_str)
    }
}

impl TryFrom<Vec<Move>> for MoveSet {
    type Error = anyhow::Error;

    fn try_from(moves: Vec<Move>) -> Result<Self, Self::Error> {
        let mut by_id = HashMap::new();
        for mv in moves {
            if !mv.enabled {
                continue;
            }
            if by_id.contains_key(&mv.id) {
                log::warn!("duplicate move id detected: '{}', using last occurrence", mv.id);
            }
            by_id.insert(mv.id.clone(), mv);
        }
        if by_id.is_empty() {
            log::warn!("MoveSet is empty");
        }
        Ok(MoveSet { by_id })
    }
}

impl<'de> Deserialize<'de> for MoveSet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let moves = Vec::<Move>::deserialize(deserializer)?;
        MoveSet::try_from(moves).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn fighter(hp: i32, attack: i32, defense: i32, charge: i32, charge_cap: i32) -> FighterVolatile {
        FighterVolatile::test_stub(hp, attack, defense, charge, charge_cap)
    }

    #[test]
    fn basic_damage_scenario() {
        let mv: Move = serde_json::from_str(
            r#"{"id":"tackle","amount":80.0,"mult":1.0,"flat":0,"type":"none"}"#,
        )
        .unwrap();
        let user = fighter(300, 100, 100, 0, 999);
        let target = fighter(300, 100, 100, 0, 0);
        let ctx = mv.context.clone();
        let mut rng = SmallRng::seed_from_u64(1);
        let amount = mv.effective_amount(&user, &target, &ctx, &mut rng);
        assert!((amount - 80.0).abs() < 1e-6);
    }

    #[test]
    fn charge_bonus_scenario() {
        let mv: Move = serde_json::from_str(
            r#"{"id":"tackle","amount":80.0,"mult":1.0,"flat":0,"type":"none"}"#,
        )
        .unwrap();
        let user = fighter(300, 100, 100, 999, 999);
        let target = fighter(300, 100, 100, 0, 0);
        let ctx = mv.context.clone();
        let mut rng = SmallRng::seed_from_u64(1);
        let amount = mv.effective_amount(&user, &target, &ctx, &mut rng);
        assert!((amount - 120.0).abs() < 1e-6);
    }

    #[test]
    fn rejects_invalid_type() {
        let r: Result<Move, _> =
            serde_json::from_str(r#"{"id":"x","amount":1,"type":"nonsense"}"#);
        assert!(r.is_err());
    }

    #[test]
    fn moveset_drops_disabled() {
        let moves: Vec<Move> = serde_json::from_str(
            r#"[{"id":"a"},{"id":"b","enabled":false}]"#,
        )
        .unwrap();
        let set = MoveSet::try_from(moves).unwrap();
        assert!(set.contains("a"));
        assert!(!set.contains("b"));
    }
}
