use rand::Rng;

use crate::schema::action::{Action, RandomAction};

/// Picks one choice, weighted by each choice's resolved `weight`.
pub fn pick<'a>(action: &'a RandomAction, rng: &mut impl Rng) -> &'a Action {
    let weights: Vec<f64> = action
        .choices
        .iter()
        .map(|c| c.weight.resolve_f64_with(rng).unwrap_or(1.0).max(0.0))
        .collect();
    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return &action.choices[0].action;
    }
    let mut roll = rng.random::<f64>() * total;
    for (choice, weight) in action.choices.iter().zip(weights.iter()) {
        if roll < *weight {
            return &choice.action;
        }
        roll -= weight;
    }
    &action.choices.last().expect("non-empty by construction").action
}
