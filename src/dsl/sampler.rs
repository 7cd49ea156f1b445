use std::sync::Arc;

use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::dsl::domain::Domain;
use crate::dsl::parse;
use crate::dsl::value::Value;

/// A schema field that is either a concrete value or a zero-argument
/// sampler. Reading one transparently resolves it; only `v:`-prefixed
/// sources are pinned to a concrete value at load time.
#[derive(Debug, Clone)]
pub enum Resolvable {
    Literal(Value),
    Sampler(Arc<SamplerNode>),
}

#[derive(Debug)]
pub struct SamplerNode {
    pub source: String,
    pub domain: Domain,
    pub kind: SamplerKind,
}

#[derive(Debug)]
pub enum SamplerKind {
    Range(Box<Resolvable>, Box<Resolvable>),
    Choice(Vec<Resolvable>),
    Weighted(Vec<(Resolvable, f64)>),
}

impl Resolvable {
    pub fn literal(v: impl Into<Value>) -> Self {
        Resolvable::Literal(v.into())
    }

    pub fn domain(&self) -> Domain {
        match self {
            Resolvable::Literal(v) => Domain::Single(v.clone()),
            Resolvable::Sampler(node) => node.domain.clone(),
        }
    }

    /// Sample (or pass through) the value, drawing from `rng`. Idempotent
    /// for literals. Battle execution must use this (not [`Resolvable::resolve`])
    /// so every roll comes from the engine's single seeded stream and a
    /// battle can be replayed deterministically.
    pub fn resolve_with(&self, rng: &mut impl Rng) -> Value {
        match self {
            Resolvable::Literal(v) => v.clone(),
            Resolvable::Sampler(node) => node.sample(rng),
        }
    }

    pub fn resolve_f64_with(&self, rng: &mut impl Rng) -> Option<f64> {
        self.resolve_with(rng).as_f64()
    }

    pub fn resolve_i64_with(&self, rng: &mut impl Rng) -> Option<i64> {
        self.resolve_with(rng).as_i64()
    }

    pub fn resolve_string_with(&self, rng: &mut impl Rng) -> String {
        self.resolve_with(rng).to_string()
    }

    /// Convenience for call sites outside the engine's seeded stream, e.g.
    /// resolving a descriptive field once while validating content at load
    /// time. Never use this on the battle execution path.
    pub fn resolve(&self) -> Value {
        self.resolve_with(&mut rand::rng())
    }

    pub fn resolve_f64(&self) -> Option<f64> {
        self.resolve().as_f64()
    }

    pub fn resolve_i64(&self) -> Option<i64> {
        self.resolve().as_i64()
    }

    pub fn resolve_string(&self) -> String {
        self.resolve().to_string()
    }

    pub fn is_sampler(&self) -> bool {
        matches!(self, Resolvable::Sampler(_))
    }
}

impl SamplerNode {
    pub fn sample(&self, rng: &mut impl Rng) -> Value {
        match &self.kind {
            SamplerKind::Range(min, max) => {
                let a = min.resolve_with(rng).as_f64().unwrap_or(0.0);
                let b = max.resolve_with(rng).as_f64().unwrap_or(a);
                if a >= b {
                    Value::Float(a)
                } else {
                    Value::Float(rng.random_range(a..b))
                }
            }
            SamplerKind::Choice(items) => {
                let idx = rng.random_range(0..items.len());
                items[idx].resolve_with(rng)
            }
            SamplerKind::Weighted(items) => {
                let total: f64 = items.iter().map(|(_, w)| *w).sum();
                let mut roll = rng.random_range(0.0..total);
                for (value, weight) in items {
                    if roll < *weight {
                        return value.resolve_with(rng);
                    }
                    roll -= weight;
                }
                items
                    .last()
                    .map(|(v, _)| v.resolve_with(rng))
                    .unwrap_or(Value::Int(0))
            }
        }
    }
}

pub fn from_json(v: &serde_json::Value) -> anyhow::Result<Resolvable> {
    match v {
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Resolvable::Literal(Value::Int(i)))
            } else if let Some(f) = n.as_f64() {
                Ok(Resolvable::Literal(Value::Float(f)))
            } else {
                anyhow::bail!("invalid DSL number: {n}")
            }
        }
        serde_json::Value::String(s) => parse::parse_dsl(s),
        serde_json::Value::Array(items) => {
            if items.is_empty() {
                anyhow::bail!("list cannot be empty");
            }
            let choices = items
                .iter()
                .map(from_json)
                .collect::<anyhow::Result<Vec<_>>>()?;
            let domain = Domain::Union(choices.iter().map(Resolvable::domain).collect());
            Ok(Resolvable::Sampler(Arc::new(SamplerNode {
                source: v.to_string(),
                domain,
                kind: SamplerKind::Choice(choices),
            })))
        }
        other => anyhow::bail!("invalid DSL json value: {other}"),
    }
}

impl<'de> Deserialize<'de> for Resolvable {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = serde_json::Value::deserialize(deserializer)?;
        from_json(&raw).map_err(serde::de::Error::custom)
    }
}

impl Serialize for Resolvable {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Resolvable::Literal(v) => v.serialize(serializer),
            Resolvable::Sampler(node) => serializer.serialize_str(&node.source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn literal_resolves_to_itself() {
        let r = Resolvable::literal(80i64);
        assert_eq!(r.resolve(), Value::Int(80));
    }

    #[test]
    fn range_sampler_stays_in_bounds() {
        let r = parse::parse_dsl("r[10,20]").unwrap();
        let mut rng = SmallRng::seed_from_u64(1);
        for _ in 0..200 {
            let v = r.resolve_f64_with(&mut rng).unwrap();
            assert!((10.0..=20.0).contains(&v));
        }
    }

    #[test]
    fn weighted_single_entry_always_resolves() {
        let r = parse::parse_dsl("wl[(7,1)]").unwrap();
        let mut rng = SmallRng::seed_from_u64(1);
        for _ in 0..20 {
            assert_eq!(r.resolve_with(&mut rng), Value::Int(7));
        }
    }

    #[test]
    fn same_seed_reproduces_same_draws() {
        let r = parse::parse_dsl("r[0,1000]").unwrap();
        let draw = |seed| {
            let mut rng = SmallRng::seed_from_u64(seed);
            (0..10)
                .map(|_| r.resolve_f64_with(&mut rng).unwrap())
                .collect::<Vec<_>>()
        };
        assert_eq!(draw(42), draw(42));
    }
}
