use crate::dsl::value::Value;

/// Symbolic domain attached to a sampler: the set of values `check` must
/// quantify over to prove a predicate holds under every possible roll.
#[derive(Debug, Clone)]
pub enum Domain {
    Single(Value),
    Range(f64, f64),
    Union(Vec<Domain>),
}

impl Domain {
    /// Flatten to concrete representative points. A range contributes its
    /// two endpoints, since the linear comparisons `check` is meant to
    /// support can only fail at an endpoint.
    pub fn points(&self) -> Vec<Value> {
        match self {
            Domain::Single(v) => vec![v.clone()],
            Domain::Range(a, b) => vec![Value::Float(*a), Value::Float(*b)],
            Domain::Union(domains) => domains.iter().flat_map(Domain::points).collect(),
        }
    }

    pub fn numeric_bounds(&self) -> Option<(f64, f64)> {
        let points = self.points();
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut any = false;
        for p in &points {
            if let Some(v) = p.as_f64() {
                any = true;
                min = min.min(v);
                max = max.max(v);
            }
        }
        any.then_some((min, max))
    }
}
