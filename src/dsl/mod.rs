pub mod domain;
pub mod parse;
pub mod sampler;
pub mod value;

pub use domain::Domain;
pub use parse::{make_dsl, parse_dsl};
pub use sampler::Resolvable;
pub use value::Value;

use std::collections::HashMap;

/// Quantify a predicate over the Cartesian product of the domains of the
/// given variables. Fails as soon as one combination violates it, naming
/// the offending assignment.
pub fn check(
    vars: &[(&str, &Domain)],
    predicate: impl Fn(&HashMap<String, Value>) -> bool,
) -> anyhow::Result<()> {
    let names: Vec<&str> = vars.iter().map(|(name, _)| *name).collect();
    let axes: Vec<Vec<Value>> = vars.iter().map(|(_, domain)| domain.points()).collect();

    for combo in cartesian(&axes) {
        let local: HashMap<String, Value> = names
            .iter()
            .zip(combo.into_iter())
            .map(|(name, value)| (name.to_string(), value))
            .collect();
        if !predicate(&local) {
            anyhow::bail!("check failed for {local:?}");
        }
    }
    Ok(())
}

fn cartesian(axes: &[Vec<Value>]) -> Vec<Vec<Value>> {
    let mut result: Vec<Vec<Value>> = vec![Vec::new()];
    for axis in axes {
        let mut next = Vec::with_capacity(result.len() * axis.len().max(1));
        for prefix in &result {
            for value in axis {
                let mut combo = prefix.clone();
                combo.push(value.clone());
                next.push(combo);
            }
        }
        result = next;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_passes_within_bounds() {
        let r = parse_dsl("r[0,10]").unwrap();
        let domain = r.domain();
        check(&[("x", &domain)], |vars| {
            let x = vars["x"].as_f64().unwrap();
            (0.0..=10.0).contains(&x)
        })
        .unwrap();
    }

    #[test]
    fn check_fails_outside_bounds() {
        let r = parse_dsl("r[20,30]").unwrap();
        let domain = r.domain();
        let result = check(&[("x", &domain)], |vars| vars["x"].as_f64().unwrap() < 10.0);
        assert!(result.is_err());
    }
}
