pub mod action;
pub mod battle;
pub mod fighter;
pub mod mv;
pub mod stats;
pub mod volatile;

pub use action::{Action, ContextOverride};
pub use battle::{Battle, BattleContext, BattleEvent};
pub use fighter::{Fighter, FighterSet};
pub use mv::{Move, MoveContext, MoveSet};
pub use stats::{Buff, BuffSeed, FighterStats, Status};
pub use volatile::FighterVolatile;
