use rand::Rng;

use crate::engine::handlers;
use crate::schema::action::{Action, ContextOverride};
use crate::schema::battle::BattleContext;
use crate::schema::mv::{Move, MoveContext, MoveSet};

/// Executes `move_id` from `user` against `target`. Returns whether any of
/// its actions actually took effect (charge check, top-level chance roll,
/// or every action whiffing all count as a no-op).
pub fn execute(
    battle: &mut BattleContext,
    catalogue: &MoveSet,
    user: (usize, usize),
    move_id: &str,
    target: (usize, usize),
    runtime_override: Option<&ContextOverride>,
    rng: &mut impl Rng,
) -> anyhow::Result<bool> {
    let mv = catalogue
        .get(move_id)
        .ok_or_else(|| anyhow::anyhow!("unknown move: {move_id}"))?
        .clone();

    let charge_cost = mv.charge_usage.resolve_f64_with(rng).unwrap_or(0.0).round() as i32;
    let available_charge = battle.sides[user.0][user.1].current_stats.charge;
    if available_charge < charge_cost {
        battle.push_log(format!(
            "{} lacks the charge to use {}",
            battle.sides[user.0][user.1].base_id, mv.name
        ));
        return Ok(false);
    }
    battle.sides[user.0][user.1].add_stat("charge", -charge_cost)?;

    let base_ctx = match runtime_override {
        Some(over) => MoveContext::merge(&mv.context, over),
        None => mv.context.clone(),
    };

    let top_chance = base_ctx.chance.resolve_f64_with(rng).unwrap_or(1.0);
    if rng.random::<f64>() >= top_chance {
        battle.push_log(format!("{} missed", mv.name));
        return Ok(false);
    }

    execute_actions(battle, &mv.actions, &mv, &base_ctx, user, target, rng)
}

fn execute_actions(
    battle: &mut BattleContext,
    actions: &[Action],
    mv: &Move,
    ctx: &MoveContext,
    user: (usize, usize),
    target: (usize, usize),
    rng: &mut impl Rng,
) -> anyhow::Result<bool> {
    let mut any_success = false;
    for action in actions {
        let merged = MoveContext::merge(ctx, &action.overrides());
        let chance = merged.chance.resolve_f64_with(rng).unwrap_or(1.0);
        if rng.random::<f64>() >= chance {
            continue;
        }
        let succeeded = dispatch(battle, action, mv, &merged, user, target, rng)?;
        any_success |= succeeded;
    }
    Ok(any_success)
}

fn dispatch(
    battle: &mut BattleContext,
    action: &Action,
    mv: &Move,
    ctx: &MoveContext,
    user: (usize, usize),
    target: (usize, usize),
    rng: &mut impl Rng,
) -> anyhow::Result<bool> {
    match action {
        Action::Damage(a) => handlers::damage::execute(battle, mv, a, ctx, user, target, rng),
        Action::Buff(a) => handlers::buff::execute(battle, mv, a, ctx, user, target, rng),
        Action::Shield(_) => handlers::shield::execute(battle, mv, ctx, user, target, rng),
        Action::Heal(_) => handlers::heal::execute(battle, mv, ctx, user, target, rng),
        Action::Modify(a) => handlers::modify::execute(battle, mv, a, target, rng),
        Action::Text(a) => handlers::text::execute(battle, a),
        Action::Status(a) => handlers::status::execute(battle, mv, a, ctx, user, target, rng),
        Action::Condition(a) => {
            if handlers::condition::evaluate_all(battle, &a.conditions, target, rng) {
                execute_actions(battle, &a.actions, mv, ctx, user, target, rng)
            } else {
                Ok(false)
            }
        }
        Action::Random(a) => {
            let chosen = handlers::random::pick(a, rng).clone();
            execute_actions(battle, std::slice::from_ref(&chosen), mv, ctx, user, target, rng)
        }
        Action::Repeat(a) => {
            let n = handlers::repeat::count(a, rng);
            let mut any = false;
            for _ in 0..n {
                any |= execute_actions(battle, &a.actions, mv, ctx, user, target, rng)?;
            }
            Ok(any)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::volatile::FighterVolatile;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn moveset(json: &str) -> MoveSet {
        let moves: Vec<Move> = serde_json::from_str(json).unwrap();
        MoveSet::try_from(moves).unwrap()
    }

    #[test]
    fn basic_damage_move_applies_and_consumes_charge() {
        let catalogue = moveset(
            r#"[{"id":"tackle","type":"none","amount":50,"charge_usage":10,"actions":[{"id":"damage"}]}]"#,
        );
        let mut battle = BattleContext::from_sides(vec![
            vec![FighterVolatile::test_stub(300, 100, 0, 50, 50)],
            vec![FighterVolatile::test_stub(300, 100, 0, 0, 0)],
        ])
        .unwrap();
        let mut rng = SmallRng::seed_from_u64(1);
        let hit = execute(&mut battle, &catalogue, (0, 0), "tackle", (1, 0), None, &mut rng).unwrap();
        assert!(hit);
        assert!(battle.sides[1][0].current_stats.hp < 300);
        assert_eq!(battle.sides[0][0].current_stats.charge, 40);
    }

    #[test]
    fn insufficient_charge_fizzles() {
        let catalogue = moveset(
            r#"[{"id":"big","type":"none","amount":1,"charge_usage":100,"actions":[{"id":"damage"}]}]"#,
        );
        let mut battle = BattleContext::from_sides(vec![
            vec![FighterVolatile::test_stub(300, 100, 0, 0, 0)],
            vec![FighterVolatile::test_stub(300, 100, 0, 0, 0)],
        ])
        .unwrap();
        let mut rng = SmallRng::seed_from_u64(1);
        let hit = execute(&mut battle, &catalogue, (0, 0), "big", (1, 0), None, &mut rng).unwrap();
        assert!(!hit);
        assert_eq!(battle.sides[1][0].current_stats.hp, 300);
    }

    #[test]
    fn condition_gates_nested_actions() {
        let catalogue = moveset(
            r#"[{"id":"finisher","type":"none","amount":999,"actions":[
                {"id":"condition","conditions":[{"id":"hp_below","value":1}],"actions":[{"id":"heal"}]}
            ]}]"#,
        );
        let mut battle = BattleContext::from_sides(vec![
            vec![FighterVolatile::test_stub(300, 100, 0, 0, 0)],
            vec![FighterVolatile::test_stub(300, 100, 0, 0, 0)],
        ])
        .unwrap();
        let mut rng = SmallRng::seed_from_u64(1);
        let hit = execute(&mut battle, &catalogue, (0, 0), "finisher", (1, 0), None, &mut rng).unwrap();
        assert!(!hit);
    }

    #[test]
    fn repeat_runs_nested_actions_n_times() {
        let catalogue = moveset(
            r#"[{"id":"flurry","type":"none","actions":[
                {"id":"repeat","count":3,"actions":[{"id":"heal","amount":10}]}
            ]}]"#,
        );
        let mut battle = BattleContext::from_sides(vec![
            vec![FighterVolatile::test_stub(300, 100, 0, 0, 0)],
            vec![FighterVolatile::test_stub(300, 100, 0, 0, 0)],
        ])
        .unwrap();
        battle.sides[0][0].current_stats.hp = 250;
        let mut rng = SmallRng::seed_from_u64(1);
        let hit = execute(&mut battle, &catalogue, (0, 0), "flurry", (0, 0), None, &mut rng).unwrap();
        assert!(hit);
        assert_eq!(battle.sides[0][0].current_stats.hp, 280);
    }
}
