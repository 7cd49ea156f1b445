use rand::Rng;

use crate::schema::action::ModifyAction;
use crate::schema::battle::BattleContext;
use crate::schema::mv::Move;

/// Directly sets a stat field on the target's current stats. `field` is a
/// dot-path rooted at `current_stats` (e.g. `current_stats.attack`),
/// mirroring the original's dynamic attribute path but restricted to the
/// one namespace it's ever actually used against.
pub fn execute(
    battle: &mut BattleContext,
    mv: &Move,
    action: &ModifyAction,
    target: (usize, usize),
    rng: &mut impl Rng,
) -> anyhow::Result<bool> {
    let mut parts = action.field.split('.');
    let root = parts.next().unwrap_or("");
    let field = parts.next().unwrap_or("");
    if root != "current_stats" || parts.next().is_some() {
        anyhow::bail!("modify action field '{}' is not an addressable path", action.field);
    }

    let target_f = &mut battle.sides[target.0][target.1];
    if field == "charge_bonus" {
        let value = action.value.resolve_f64_with(rng).unwrap_or(0.0);
        target_f.current_stats.charge_bonus = value.clamp(0.0, crate::MAX_CHARGE_BONUS);
    } else if crate::STAT_FIELDS.contains(&field) {
        let value = action.value.resolve_i64_with(rng).unwrap_or(0) as i32;
        let max = target_f.buffed_max_stats.get(field).unwrap_or(crate::MAX_INT_STAT);
        match field {
            "hp" => target_f.current_stats.hp = value.clamp(0, max),
            "attack" => target_f.current_stats.attack = value.clamp(0, max),
            "defense" => target_f.current_stats.defense = value.clamp(0, max),
            "shield" => target_f.current_stats.shield = value.clamp(0, max),
            "charge" => target_f.current_stats.charge = value.clamp(0, max),
            _ => unreachable!(),
        }
    } else {
        anyhow::bail!("modify action field '{}' is not a known stat", action.field);
    }

    battle.push_log(format!("{} modified {}", mv.name, battle.sides[target.0][target.1].base_id));
    Ok(true)
}
