use rand::Rng;

use crate::schema::battle::BattleContext;
use crate::schema::mv::{Move, MoveContext};

pub fn execute(
    battle: &mut BattleContext,
    mv: &Move,
    ctx: &MoveContext,
    user: (usize, usize),
    target: (usize, usize),
    rng: &mut impl Rng,
) -> anyhow::Result<bool> {
    let amount = {
        let user_f = &battle.sides[user.0][user.1];
        let target_f = &battle.sides[target.0][target.1];
        mv.effective_amount(user_f, target_f, ctx, rng).round().max(0.0) as i32
    };
    let applied = battle.sides[target.0][target.1].add_stat("hp", amount)?;
    if applied > 0 {
        battle.push_log(format!(
            "{} healed {} for {applied}",
            mv.name,
            battle.sides[target.0][target.1].base_id
        ));
    }
    Ok(applied > 0)
}
