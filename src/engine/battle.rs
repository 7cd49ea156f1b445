use rand::Rng;

use crate::engine::moves;
use crate::schema::action::ContextOverride;
use crate::schema::battle::Battle;
use crate::schema::mv::MoveSet;

/// How targets are picked when a caller doesn't supply one explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BattleMode {
    /// Target chosen uniformly at random among living enemies.
    Auto,
    /// Target must be supplied externally (e.g. a human player), engine
    /// errors if `step` is called without one.
    Local1v1,
}

/// Drives a [`Battle`] turn by turn: buff ticking, turn-order advancement,
/// and dispatch into [`moves::execute`].
pub struct BattleEngine {
    pub battle: Battle,
    pub mode: BattleMode,
}

impl BattleEngine {
    pub fn new(battle: Battle, mode: BattleMode) -> Self {
        BattleEngine { battle, mode }
    }

    pub fn set_mode(&mut self, mode: BattleMode) {
        self.mode = mode;
    }

    /// Column-first order: fighter index 0 on every side acts before index
    /// 1 on any side, and so on, cycling back to side 0 after the last side
    /// has gone.
    pub fn advance_active_fighter(&mut self) {
        let ctx = &mut self.battle.context;
        let num_sides = ctx.sides.len();
        loop {
            ctx.active_side += 1;
            if ctx.active_side >= num_sides {
                ctx.active_side = 0;
                ctx.active_fighter_index += 1;
                if ctx.active_fighter_index >= ctx.sides.iter().map(|s| s.len()).max().unwrap_or(1) {
                    ctx.active_fighter_index = 0;
                    ctx.turn += 1;
                    self.tick_all_buffs();
                }
            }
            let side_len = ctx.sides[ctx.active_side].len();
            if ctx.active_fighter_index < side_len
                && ctx.sides[ctx.active_side][ctx.active_fighter_index].alive()
            {
                break;
            }
            if !ctx.is_any_fighter_alive() {
                break;
            }
        }
    }

    fn tick_all_buffs(&mut self) {
        for side in &mut self.battle.context.sides {
            for fighter in side {
                fighter.tick_buffs();
            }
        }
    }

    /// Moves whose charge is currently sufficient for `user` to use.
    pub fn available_moves<'a>(
        &self,
        catalogue: &'a MoveSet,
        move_ids: &'a [String],
        user: (usize, usize),
        rng: &mut impl Rng,
    ) -> Vec<&'a str> {
        let fighter = &self.battle.context.sides[user.0][user.1];
        move_ids
            .iter()
            .filter_map(|id| catalogue.get(id).map(|m| (id.as_str(), m)))
            .filter(|(_, mv)| {
                let cost = mv.charge_usage.resolve_f64_with(rng).unwrap_or(0.0).round() as i32;
                fighter.current_stats.charge >= cost
            })
            .map(|(id, _)| id)
            .collect()
    }

    /// First living fighter on the opposing side, falling back to one's
    /// own side if every enemy is down (e.g. a self-targeted support move
    /// issued after the battle should already be over).
    pub fn default_target(&self, user_side: usize) -> Option<(usize, usize)> {
        for side_idx in 0..self.battle.context.sides.len() {
            if side_idx == user_side {
                continue;
            }
            if let Some(idx) = self.battle.context.sides[side_idx]
                .iter()
                .position(|f| f.alive())
            {
                return Some((side_idx, idx));
            }
        }
        self.battle.context.sides[user_side]
            .iter()
            .position(|f| f.alive())
            .map(|idx| (user_side, idx))
    }

    /// Executes one move on behalf of the active fighter, draining any
    /// queued events it produced, and advances to the next fighter.
    ///
    /// `move_id` may be omitted: under [`BattleMode::Auto`] the engine then
    /// samples uniformly among `move_ids` that the active fighter can
    /// currently afford, using the same injected `rng` as the rest of the
    /// move's execution.
    pub fn step(
        &mut self,
        catalogue: &MoveSet,
        move_ids: &[String],
        move_id: Option<&str>,
        target: Option<(usize, usize)>,
        runtime_override: Option<&ContextOverride>,
        rng: &mut impl Rng,
    ) -> anyhow::Result<bool> {
        if self.battle.is_battle_over() {
            anyhow::bail!("battle is already over");
        }
        let user = (
            self.battle.context.active_side,
            self.battle.context.active_fighter_index,
        );
        let target = match target {
            Some(t) => t,
            None if self.mode == BattleMode::Auto => self
                .default_target(user.0)
                .ok_or_else(|| anyhow::anyhow!("no valid target available"))?,
            None => anyhow::bail!("battle mode requires an explicit target"),
        };
        let chosen_move;
        let move_id = match move_id {
            Some(id) => id,
            None if self.mode == BattleMode::Auto => {
                let choices = self.available_moves(catalogue, move_ids, user, rng);
                if choices.is_empty() {
                    anyhow::bail!("no available move to auto-select");
                }
                let idx = rng.random_range(0..choices.len());
                chosen_move = choices[idx].to_string();
                chosen_move.as_str()
            }
            None => anyhow::bail!("battle mode requires an explicit move"),
        };

        let result = moves::execute(
            &mut self.battle.context,
            catalogue,
            user,
            move_id,
            target,
            runtime_override,
            rng,
        )?;
        self.battle.context.drain_events();
        self.advance_active_fighter();
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::battle::Battle;
    use crate::schema::volatile::FighterVolatile;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn two_fighter_battle() -> Battle {
        Battle::from_sides(
            "b1",
            vec![
                vec![FighterVolatile::test_stub(300, 100, 10, 0, 0)],
                vec![FighterVolatile::test_stub(300, 100, 10, 0, 0)],
            ],
            Some(30),
        )
        .unwrap()
    }

    #[test]
    fn turn_order_cycles_and_counts_turns() {
        let mut engine = BattleEngine::new(two_fighter_battle(), BattleMode::Auto);
        assert_eq!(engine.battle.context.turn, 0);
        engine.advance_active_fighter();
        assert_eq!(engine.battle.context.active_side, 1);
        engine.advance_active_fighter();
        assert_eq!(engine.battle.context.active_side, 0);
        assert_eq!(engine.battle.context.turn, 1);
    }

    #[test]
    fn default_target_picks_living_enemy() {
        let engine = BattleEngine::new(two_fighter_battle(), BattleMode::Auto);
        assert_eq!(engine.default_target(0), Some((1, 0)));
    }

    #[test]
    fn max_turns_ends_battle() {
        let mut battle = two_fighter_battle();
        battle.max_turns = 1;
        let mut engine = BattleEngine::new(battle, BattleMode::Auto);
        engine.advance_active_fighter();
        engine.advance_active_fighter();
        assert!(engine.battle.is_battle_over());
    }

    #[test]
    fn step_runs_move_and_advances_turn() {
        let catalogue: MoveSet = {
            let moves: Vec<crate::schema::mv::Move> = serde_json::from_str(
                r#"[{"id":"tackle","type":"none","amount":10,"actions":[{"id":"damage"}]}]"#,
            )
            .unwrap();
            MoveSet::try_from(moves).unwrap()
        };
        let mut engine = BattleEngine::new(two_fighter_battle(), BattleMode::Auto);
        let mut rng = SmallRng::seed_from_u64(7);
        let move_ids = vec!["tackle".to_string()];
        let hit = engine
            .step(&catalogue, &move_ids, Some("tackle"), None, None, &mut rng)
            .unwrap();
        assert!(hit);
        assert_eq!(engine.battle.context.active_side, 1);
    }

    #[test]
    fn step_auto_selects_move_when_none_given() {
        let catalogue: MoveSet = {
            let moves: Vec<crate::schema::mv::Move> = serde_json::from_str(
                r#"[{"id":"tackle","type":"none","amount":10,"actions":[{"id":"damage"}]}]"#,
            )
            .unwrap();
            MoveSet::try_from(moves).unwrap()
        };
        let mut engine = BattleEngine::new(two_fighter_battle(), BattleMode::Auto);
        let mut rng = SmallRng::seed_from_u64(7);
        let move_ids = vec!["tackle".to_string()];
        let hit = engine
            .step(&catalogue, &move_ids, None, None, None, &mut rng)
            .unwrap();
        assert!(hit);
        assert_eq!(engine.battle.context.active_side, 1);
    }
}
