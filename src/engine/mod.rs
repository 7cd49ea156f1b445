pub mod battle;
pub mod handlers;
pub mod moves;

pub use battle::{BattleEngine, BattleMode};
