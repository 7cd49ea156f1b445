use rand::Rng;

use crate::schema::action::BuffAction;
use crate::schema::battle::BattleContext;
use crate::schema::mv::{Move, MoveContext};
use crate::schema::stats::Buff;

pub fn execute(
    battle: &mut BattleContext,
    mv: &Move,
    action: &BuffAction,
    ctx: &MoveContext,
    user: (usize, usize),
    target: (usize, usize),
    rng: &mut impl Rng,
) -> anyhow::Result<bool> {
    let amount = {
        let user_f = &battle.sides[user.0][user.1];
        let target_f = &battle.sides[target.0][target.1];
        let base = mv.effective_amount(user_f, target_f, ctx, rng);
        if action.reverse { -base } else { base }
    };
    // duration 1 expires at the end of the *next* turn, not the current one.
    let duration = match ctx.duration.resolve_i64_with(rng).unwrap_or(-1) {
        d if d > 0 => d + 1,
        d => d,
    } as i32;

    let mut applied_any = false;
    for stat in &action.stats {
        battle.sides[target.0][target.1].apply_buff(Buff::new(stat.clone(), amount, duration));
        applied_any = true;
    }
    if applied_any {
        battle.push_log(format!(
            "{} applied to {}",
            mv.name,
            battle.sides[target.0][target.1].base_id
        ));
    }
    Ok(applied_any)
}
