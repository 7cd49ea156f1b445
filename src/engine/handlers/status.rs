use rand::Rng;

use crate::schema::action::StatusAction;
use crate::schema::battle::BattleContext;
use crate::schema::mv::{Move, MoveContext};
use crate::schema::stats::Status;

pub fn execute(
    battle: &mut BattleContext,
    mv: &Move,
    action: &StatusAction,
    ctx: &MoveContext,
    user: (usize, usize),
    target: (usize, usize),
    rng: &mut impl Rng,
) -> anyhow::Result<bool> {
    let duration = {
        let user_f = &battle.sides[user.0][user.1];
        let target_f = &battle.sides[target.0][target.1];
        mv.effective_amount(user_f, target_f, ctx, rng).round() as i32
    };
    let target_f = &mut battle.sides[target.0][target.1];

    let mut changed = false;
    for status_ref in &action.status {
        match action.operation.as_str() {
            "add" => {
                if let Some(existing) = target_f
                    .current_status
                    .iter_mut()
                    .find(|s| s.id == status_ref.id)
                {
                    existing.stacks += 1;
                    existing.duration = duration;
                } else {
                    target_f.current_status.push(Status {
                        id: status_ref.id.clone(),
                        stacks: 1,
                        duration,
                    });
                }
                changed = true;
            }
            "remove" => {
                let before = target_f.current_status.len();
                target_f.current_status.retain(|s| s.id != status_ref.id);
                changed |= target_f.current_status.len() != before;
            }
            other => anyhow::bail!("unknown status operation: {other}"),
        }
    }

    if changed {
        battle.push_log(format!("{} affected {}'s status", mv.name, battle.sides[target.0][target.1].base_id));
    }
    Ok(changed)
}
