use rand::Rng;

use crate::schema::action::Condition;
use crate::schema::battle::BattleContext;

/// Evaluates a single AND-ed predicate against `target`. `hp_below`/
/// `hp_above` compare current hp to `condition.value` (numeric);
/// `has_status`/`lacks_status` check `condition.value` (a status id) against
/// the target's active statuses.
pub fn evaluate(battle: &BattleContext, condition: &Condition, target: (usize, usize), rng: &mut impl Rng) -> bool {
    let target_f = &battle.sides[target.0][target.1];
    match condition.id.as_str() {
        "hp_below" => {
            let threshold = condition.value.resolve_f64_with(rng).unwrap_or(0.0);
            (target_f.current_stats.hp as f64) < threshold
        }
        "hp_above" => {
            let threshold = condition.value.resolve_f64_with(rng).unwrap_or(0.0);
            (target_f.current_stats.hp as f64) > threshold
        }
        "has_status" => {
            let id = condition.value.resolve_string_with(rng);
            target_f.current_status.iter().any(|s| s.id == id)
        }
        "lacks_status" => {
            let id = condition.value.resolve_string_with(rng);
            !target_f.current_status.iter().any(|s| s.id == id)
        }
        other => {
            log::warn!("unknown condition kind encountered at runtime: {other}");
            false
        }
    }
}

pub fn evaluate_all(
    battle: &BattleContext,
    conditions: &[Condition],
    target: (usize, usize),
    rng: &mut impl Rng,
) -> bool {
    conditions.iter().all(|c| evaluate(battle, c, target, rng))
}
