use std::collections::VecDeque;

use crate::schema::volatile::FighterVolatile;
use crate::{DEFAULT_MAX_TURNS, MAX_SIDES};

/// A deferred effect queued by a handler and drained by the battle engine
/// once the triggering action finishes, so a whole action tree resolves
/// before its side effects (damage, logs) actually land.
pub type BattleEvent = Box<dyn FnOnce(&mut BattleContext) + Send>;

/// Mutable state for one battle in progress: both sides' fighters, whose
/// turn it is, the pending event queue, and the running log.
pub struct BattleContext {
    pub turn: crate::Turn,
    pub active_side: usize,
    pub active_fighter_index: usize,
    pub sides: Vec<Vec<FighterVolatile>>,
    pub event_queue: VecDeque<BattleEvent>,
    pub log_stack: Vec<String>,
    pub log_history: Vec<String>,
}

impl BattleContext {
    pub fn from_sides(sides: Vec<Vec<FighterVolatile>>) -> anyhow::Result<Self> {
        if sides.len() != MAX_SIDES {
            anyhow::bail!("battle must have exactly {MAX_SIDES} sides, got {}", sides.len());
        }
        if sides.iter().any(|s| s.is_empty()) {
            anyhow::bail!("every battle side must have at least one fighter");
        }
        Ok(BattleContext {
            turn: 0,
            active_side: 0,
            active_fighter_index: 0,
            sides,
            event_queue: VecDeque::new(),
            log_stack: Vec::new(),
            log_history: Vec::new(),
        })
    }

    pub fn fighters(&self) -> impl Iterator<Item = &FighterVolatile> {
        self.sides.iter().flatten()
    }

    pub fn active_fighter(&self) -> &FighterVolatile {
        &self.sides[self.active_side][self.active_fighter_index]
    }

    pub fn active_fighter_mut(&mut self) -> &mut FighterVolatile {
        &mut self.sides[self.active_side][self.active_fighter_index]
    }

    pub fn side(&self, index: usize) -> &[FighterVolatile] {
        &self.sides[index]
    }

    pub fn side_mut(&mut self, index: usize) -> &mut Vec<FighterVolatile> {
        &mut self.sides[index]
    }

    pub fn sides_alive(&self, side: usize) -> bool {
        self.sides[side].iter().any(FighterVolatile::alive)
    }

    pub fn is_any_fighter_alive(&self) -> bool {
        self.fighters().any(FighterVolatile::alive)
    }

    /// Index of the side holding `fighter`'s base id, if any.
    pub fn get_fighter_side(&self, base_id: &str) -> Option<usize> {
        self.sides
            .iter()
            .position(|side| side.iter().any(|f| f.base_id == base_id))
    }

    pub fn push_log(&mut self, message: impl Into<String>) {
        self.log_stack.push(message.into());
    }

    /// Drain and return everything logged since the last call.
    pub fn get_next_logs(&mut self) -> Vec<String> {
        let drained: Vec<String> = self.log_stack.drain(..).collect();
        self.log_history.extend(drained.iter().cloned());
        drained
    }

    pub fn queue_event(&mut self, event: BattleEvent) {
        self.event_queue.push_back(event);
    }

    /// Run every queued event to completion, including any events that
    /// queue further events while running.
    pub fn drain_events(&mut self) {
        while let Some(event) = self.event_queue.pop_front() {
            event(self);
        }
    }
}

/// A battle's immutable setup plus its live context.
pub struct Battle {
    pub id: String,
    pub max_turns: crate::Turn,
    pub background_sprite: Option<String>,
    pub music: Option<String>,
    pub context: BattleContext,
}

impl Battle {
    pub fn from_sides(
        id: impl Into<String>,
        sides: Vec<Vec<FighterVolatile>>,
        max_turns: Option<crate::Turn>,
    ) -> anyhow::Result<Self> {
        Ok(Battle {
            id: id.into(),
            max_turns: max_turns.unwrap_or(DEFAULT_MAX_TURNS),
            background_sprite: None,
            music: None,
            context: BattleContext::from_sides(sides)?,
        })
    }

    pub fn is_battle_over(&self) -> bool {
        if self.context.turn >= self.max_turns {
            return true;
        }
        let sides_with_survivors = self
            .context
            .sides
            .iter()
            .filter(|side| side.iter().any(FighterVolatile::alive))
            .count();
        sides_with_survivors <= 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::volatile::FighterVolatile;

    fn side() -> Vec<FighterVolatile> {
        vec![FighterVolatile::test_stub(100, 10, 10, 0, 0)]
    }

    #[test]
    fn rejects_empty_side() {
        let result = BattleContext::from_sides(vec![side(), vec![]]);
        assert!(result.is_err());
    }

    #[test]
    fn rejects_single_side() {
        let result = BattleContext::from_sides(vec![side()]);
        assert!(result.is_err());
    }

    #[test]
    fn rejects_more_than_two_sides() {
        let result = BattleContext::from_sides(vec![side(), side(), side()]);
        assert!(result.is_err());
    }

    #[test]
    fn battle_over_when_one_side_wiped() {
        let mut battle = Battle::from_sides("b1", vec![side(), side()], Some(30)).unwrap();
        assert!(!battle.is_battle_over());
        battle.context.sides[1][0].current_stats.hp = 0;
        assert!(battle.is_battle_over());
    }

    #[test]
    fn battle_over_at_max_turns() {
        let mut battle = Battle::from_sides("b1", vec![side(), side()], Some(1)).unwrap();
        battle.context.turn = 1;
        assert!(battle.is_battle_over());
    }

    #[test]
    fn event_queue_drains_fifo_and_reentrant() {
        let mut ctx = BattleContext::from_sides(vec![side(), side()]).unwrap();
        ctx.queue_event(Box::new(|ctx| {
            ctx.push_log("first");
            ctx.queue_event(Box::new(|ctx| ctx.push_log("nested")));
        }));
        ctx.queue_event(Box::new(|ctx| ctx.push_log("second")));
        ctx.drain_events();
        assert_eq!(ctx.get_next_logs(), vec!["first", "second", "nested"]);
    }
}
