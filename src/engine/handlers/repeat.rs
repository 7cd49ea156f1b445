use rand::Rng;

use crate::schema::action::RepeatAction;

pub fn count(action: &RepeatAction, rng: &mut impl Rng) -> i64 {
    action.count.resolve_i64_with(rng).unwrap_or(1).max(0)
}
