use std::sync::Arc;

use crate::dsl::domain::Domain;
use crate::dsl::sampler::{from_json, Resolvable, SamplerKind, SamplerNode};
use crate::dsl::value::Value;

fn bracket_close(open: char) -> anyhow::Result<char> {
    match open {
        '(' => Ok(')'),
        '[' => Ok(']'),
        '{' => Ok('}'),
        _ => anyhow::bail!("not an opening bracket: {open}"),
    }
}

/// Split list content into top-level comma-separated items, respecting
/// nested brackets so `l[r[1,2], 3]` doesn't split on the inner comma.
fn split_top_level(s: &str) -> Vec<String> {
    let mut items = Vec::new();
    let mut depth = 0i32;
    let mut current = String::new();
    for c in s.chars() {
        match c {
            '[' | '(' | '{' => depth += 1,
            ']' | ')' | '}' => depth -= 1,
            _ => {}
        }
        if c == ',' && depth == 0 {
            let trimmed = current.trim();
            if !trimmed.is_empty() {
                items.push(trimmed.to_string());
            }
            current.clear();
        } else {
            current.push(c);
        }
    }
    let trimmed = current.trim();
    if !trimmed.is_empty() {
        items.push(trimmed.to_string());
    }
    items
}

fn starts_bracketed(s: &str, prefix: &str) -> bool {
    s.len() > prefix.len()
        && s.starts_with(prefix)
        && matches!(s.as_bytes()[prefix.len()], b'(' | b'[' | b'{')
}

fn parse_number(s: &str) -> Value {
    let t = s.trim();
    if t.contains('.') {
        if let Ok(f) = t.parse::<f64>() {
            return Value::Float(f);
        }
    } else if let Ok(i) = t.parse::<i64>() {
        return Value::Int(i);
    }
    Value::Str(t.trim_matches(|c| c == '\'' || c == '"').to_string())
}

/// Parse a single DSL source string into a concrete value or sampler.
pub fn parse_dsl(s: &str) -> anyhow::Result<Resolvable> {
    let s = s.trim();

    if let Some(rest) = s.strip_prefix("v:") {
        let inner = parse_dsl(rest)?;
        return Ok(Resolvable::Literal(inner.resolve()));
    }
    if starts_bracketed(s, "r") {
        return parse_range(s);
    }
    if starts_bracketed(s, "wl") {
        return parse_weighted(s);
    }
    if starts_bracketed(s, "l") {
        return parse_list(s);
    }
    Ok(Resolvable::Literal(parse_number(s)))
}

fn bracket_span(s: &str, open_at: usize) -> anyhow::Result<(char, char)> {
    let open = s.as_bytes()[open_at] as char;
    let close = bracket_close(open)?;
    if !s.ends_with(close) {
        anyhow::bail!("unbalanced brackets, expected trailing '{close}': {s}");
    }
    Ok((open, close))
}

fn parse_range(s: &str) -> anyhow::Result<Resolvable> {
    let (_, _) = bracket_span(s, 1)?;
    let inner = &s[2..s.len() - 1];
    let parts = split_top_level(inner);
    if parts.len() != 2 {
        anyhow::bail!("range must have exactly 2 numbers or DSL expressions: {s}");
    }
    let min = parse_dsl(&parts[0])?;
    let max = parse_dsl(&parts[1])?;
    let min_bounds = min
        .domain()
        .numeric_bounds()
        .ok_or_else(|| anyhow::anyhow!("range endpoints must be numeric: {s}"))?;
    let max_bounds = max
        .domain()
        .numeric_bounds()
        .ok_or_else(|| anyhow::anyhow!("range endpoints must be numeric: {s}"))?;
    if min_bounds.0 > max_bounds.1 {
        anyhow::bail!(
            "range min {} > max {} in {s}",
            min_bounds.0,
            max_bounds.1
        );
    }
    let domain = Domain::Range(min_bounds.0, max_bounds.1);
    Ok(Resolvable::Sampler(Arc::new(SamplerNode {
        source: s.to_string(),
        domain,
        kind: SamplerKind::Range(Box::new(min), Box::new(max)),
    })))
}

fn check_homogeneous(s: &str, choices: &[Resolvable]) -> anyhow::Result<()> {
    let category = choices[0].resolve().category();
    for c in &choices[1..] {
        if c.resolve().category() != category {
            anyhow::bail!("list items must be homogeneous: {s}");
        }
    }
    Ok(())
}

fn parse_list(s: &str) -> anyhow::Result<Resolvable> {
    let (_, _) = bracket_span(s, 1)?;
    let inner = &s[2..s.len() - 1];
    let items = split_top_level(inner);
    if items.is_empty() {
        anyhow::bail!("list cannot be empty: {s}");
    }
    let choices = items
        .iter()
        .map(|item| parse_dsl(item))
        .collect::<anyhow::Result<Vec<_>>>()?;
    check_homogeneous(s, &choices)?;
    let domain = Domain::Union(choices.iter().map(Resolvable::domain).collect());
    Ok(Resolvable::Sampler(Arc::new(SamplerNode {
        source: s.to_string(),
        domain,
        kind: SamplerKind::Choice(choices),
    })))
}

fn parse_weighted(s: &str) -> anyhow::Result<Resolvable> {
    let (_, _) = bracket_span(s, 2)?;
    let inner = &s[3..s.len() - 1];
    let items = split_top_level(inner);
    if items.is_empty() {
        anyhow::bail!("weighted list cannot be empty: {s}");
    }
    let mut values = Vec::with_capacity(items.len());
    let mut weights = Vec::with_capacity(items.len());
    for item in &items {
        let item = item.trim();
        if !(item.starts_with('(') && item.ends_with(')')) {
            anyhow::bail!("weighted list item must be a 2-tuple: {item}");
        }
        let pair = split_top_level(&item[1..item.len() - 1]);
        if pair.len() != 2 {
            anyhow::bail!("weighted list item must be a 2-tuple: {item}");
        }
        let weight: f64 = pair[1]
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("weight must be numeric: {item}"))?;
        if weight <= 0.0 {
            anyhow::bail!("weight must be positive: {item}");
        }
        values.push(parse_dsl(&pair[0])?);
        weights.push(weight);
    }
    check_homogeneous(s, &values)?;
    let domain = Domain::Union(values.iter().map(Resolvable::domain).collect());
    let pairs = values.into_iter().zip(weights).collect();
    Ok(Resolvable::Sampler(Arc::new(SamplerNode {
        source: s.to_string(),
        domain,
        kind: SamplerKind::Weighted(pairs),
    })))
}

/// Mirrors [`parse_dsl`] but accepts any JSON scalar/array, for fields whose
/// JSON representation may be a bare number, a DSL string, or a literal
/// array (treated the same as `l[...]`).
pub fn make_dsl(v: &serde_json::Value) -> anyhow::Result<Resolvable> {
    from_json(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_range() {
        let r = parse_dsl("r[10,20]").unwrap();
        match r.domain() {
            Domain::Range(a, b) => assert_eq!((a, b), (10.0, 20.0)),
            other => panic!("expected range domain, got {other:?}"),
        }
    }

    #[test]
    fn rejects_inverted_range() {
        assert!(parse_dsl("r[20,10]").is_err());
    }

    #[test]
    fn rejects_empty_list() {
        assert!(parse_dsl("l[]").is_err());
    }

    #[test]
    fn rejects_heterogeneous_list() {
        assert!(parse_dsl("l[1,'a']").is_err());
    }

    #[test]
    fn eager_prefix_resolves_once() {
        let r = parse_dsl("v:r[5,5]").unwrap();
        assert!(matches!(r, Resolvable::Literal(Value::Float(v)) if v == 5.0));
    }

    #[test]
    fn nested_list_of_ranges() {
        let r = parse_dsl("l[1, 2, r[3,4]]").unwrap();
        for _ in 0..50 {
            let v = r.resolve_f64().unwrap();
            assert!(v == 1.0 || v == 2.0 || (3.0..=4.0).contains(&v));
        }
    }

    #[test]
    fn weighted_list_rejects_nonpositive_weight() {
        assert!(parse_dsl("wl[(1,0),(2,1)]").is_err());
    }
}
