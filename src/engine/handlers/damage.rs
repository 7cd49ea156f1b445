use rand::Rng;

use crate::schema::action::DamageAction;
use crate::schema::battle::BattleContext;
use crate::schema::mv::{Move, MoveContext};
use crate::{AD_BASELINE, AD_SCALE, AD_SHARPNESS, CHARGE_INFLUENCE, STAT_SOFT_EXPONENT};

/// Attack/defense asymmetry factor: a soft-exponent difference run through
/// a `tanh` squash so neither stat can send damage to zero or infinity,
/// nudged by how much more charged the attacker is relative to the
/// defender.
fn ad_factor(attack: f64, defense: f64, attacker_charge: f64, defender_charge: f64, charge_cap: f64) -> f64 {
    let raw_diff = attack - defense;
    let diff = raw_diff.signum() * raw_diff.abs().powf(STAT_SOFT_EXPONENT);
    let delta = (attacker_charge - defender_charge) / charge_cap.max(1.0);
    let k = AD_SHARPNESS * (1.0 + CHARGE_INFLUENCE * delta);
    AD_BASELINE + AD_SCALE * (k * diff).tanh()
}

pub fn execute(
    battle: &mut BattleContext,
    mv: &Move,
    action: &DamageAction,
    ctx: &MoveContext,
    user: (usize, usize),
    target: (usize, usize),
    rng: &mut impl Rng,
) -> anyhow::Result<bool> {
    let piercing = action.piercing.resolve_f64_with(rng).unwrap_or(0.0);
    let crit_chance = action.crit_chance.resolve_f64_with(rng).unwrap_or(0.0);
    let crit_damage = action.crit_damage.resolve_f64_with(rng).unwrap_or(1.0);

    let raw_damage = {
        let user_f = &battle.sides[user.0][user.1];
        let target_f = &battle.sides[target.0][target.1];
        let base = mv.effective_amount(user_f, target_f, ctx, rng);
        let defense = target_f.current_stats.defense as f64 * (1.0 - piercing).max(0.0);
        let charge_cap = user_f
            .base_max_stats
            .charge
            .max(target_f.base_max_stats.charge) as f64;
        let factor = ad_factor(
            user_f.current_stats.attack as f64,
            defense,
            user_f.current_stats.charge as f64,
            target_f.current_stats.charge as f64,
            charge_cap,
        );
        base * factor
    };

    let is_crit = rng.random::<f64>() < crit_chance;
    let final_damage = if is_crit {
        raw_damage * crit_damage
    } else {
        raw_damage
    };
    let amount = final_damage.round().max(0.0) as i32;

    let applied = battle.sides[target.0][target.1].take_damage(amount);
    battle.push_log(format!(
        "{} dealt {applied} damage to {}{}",
        battle.sides[user.0][user.1].base_id,
        battle.sides[target.0][target.1].base_id,
        if is_crit { " (critical hit!)" } else { "" }
    ));
    Ok(applied > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_stats_yield_baseline_factor() {
        let f = ad_factor(100.0, 100.0, 0.0, 0.0, 1.0);
        assert!((f - AD_BASELINE).abs() < 1e-9);
    }

    #[test]
    fn higher_attack_increases_factor() {
        let f = ad_factor(200.0, 100.0, 0.0, 0.0, 1.0);
        assert!(f > AD_BASELINE);
    }

    #[test]
    fn factor_stays_bounded() {
        let f = ad_factor(999.0, 0.0, 999.0, 0.0, 999.0);
        assert!(f <= AD_BASELINE + AD_SCALE);
    }
}
