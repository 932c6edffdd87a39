//! Chopping and slicing (`spec.md` §4.7): operations on events whose value
//! is a control dictionary carrying `begin`/`end` sample-position fields.

use crate::combinators::pure;
use crate::concat::fastcat;
use crate::join::squeeze_join;
use crate::pattern::Pattern;
use crate::rational::Rational;
use crate::state::State;
use crate::transforms::zoom;
use crate::value::Value;
use std::collections::BTreeMap;

fn record_begin_end(v: &Value) -> (f64, f64) {
    match v.as_map() {
        Some(m) => {
            let b = m.get("begin").and_then(Value::as_number).unwrap_or(0.0);
            let e = m.get("end").and_then(Value::as_number).unwrap_or(1.0);
            (b, e)
        }
        None => (0.0, 1.0),
    }
}

fn with_fields(v: &Value, fields: &[(&str, Value)]) -> Value {
    let mut m = v.as_map().cloned().unwrap_or_default();
    for (k, value) in fields {
        m.insert((*k).to_string(), value.clone());
    }
    Value::Map(m)
}

/// `merge(a,b) = { begin: a.begin + b.begin*(a.end-a.begin), end: a.begin + b.end*(a.end-a.begin) }`.
fn merge_range(outer_begin: f64, outer_end: f64, inner_begin: f64, inner_end: f64) -> (f64, f64) {
    let span = outer_end - outer_begin;
    (outer_begin + inner_begin * span, outer_begin + inner_end * span)
}

/// Each value is replaced by `n` sub-events in sequence, with
/// `begin`/`end` scaled into the value's existing range.
pub fn chop(p: &Pattern, n: i64) -> Pattern {
    if n <= 0 {
        return p.clone();
    }
    let expanded = p.clone().fmap(move |v| {
        let (outer_begin, outer_end) = record_begin_end(v);
        let slices: Vec<Pattern> = (0..n)
            .map(|i| {
                let ib = i as f64 / n as f64;
                let ie = (i + 1) as f64 / n as f64;
                let (b, e) = merge_range(outer_begin, outer_end, ib, ie);
                pure(with_fields(v, &[("begin", Value::from(b)), ("end", Value::from(e))]))
            })
            .collect();
        Value::from(fastcat(slices))
    });
    squeeze_join(&expanded)
}

/// For each original event, cycle through `n` progressive sub-positions —
/// a different `1/n`-th of the sample plays on each repeat.
pub fn striate(p: &Pattern, n: i64) -> Pattern {
    if n <= 0 {
        return p.clone();
    }
    let arms: Vec<Pattern> = (0..n)
        .map(|i| {
            let b = i as f64 / n as f64;
            let e = (i + 1) as f64 / n as f64;
            p.clone().fmap(move |v| with_fields(v, &[("begin", Value::from(b)), ("end", Value::from(e))]))
        })
        .collect();
    fastcat(arms)
}

fn boundaries_for(n: &Value) -> Vec<f64> {
    match n {
        Value::Number(count) => {
            let count = (*count).max(1.0) as i64;
            (0..=count).map(|i| i as f64 / count as f64).collect()
        }
        Value::List(bounds) => bounds.iter().filter_map(Value::as_number).collect(),
        _ => vec![0.0, 1.0],
    }
}

/// The number of slots `n` divides the sample into — a plain count for
/// `Value::Number`, or one fewer than the boundary list's length for an
/// explicit `Value::List` of `[0,1]` cut points.
fn slice_count(n: &Value) -> f64 {
    (boundaries_for(n).len().max(2) - 1) as f64
}

/// `n` may be a count or an explicit list of `[0,1]` boundaries.
/// `indexPat` selects which slice plays; the result carries `_slices = n`
/// for `splice` to read back.
pub fn slice(n: Value, index_pat: &Pattern, p: &Pattern) -> Pattern {
    let bounds = boundaries_for(&n);
    let slot_count = (bounds.len().max(2) - 1) as i64;
    let n_for_context = n.clone();
    let combined = crate::applicative::app_left(
        index_pat,
        p,
        std::sync::Arc::new(move |idx, v| {
            let i = (idx.parse_numeral().unwrap_or(0.0) as i64).rem_euclid(slot_count.max(1)) as usize;
            let b = bounds.get(i).copied().unwrap_or(0.0);
            let e = bounds.get(i + 1).copied().unwrap_or(1.0);
            with_fields(v, &[("begin", Value::from(b)), ("end", Value::from(e)), ("_slices", n_for_context.clone())])
        }),
    );
    combined
}

/// Like `slice`, but rewrites `speed` so the slice's duration matches the
/// event's time-duration.
pub fn splice(n: Value, index_pat: &Pattern, p: &Pattern) -> Pattern {
    let sliced = slice(n, index_pat, p);
    Pattern::new(move |state: State| {
        let cps = state.cps();
        sliced
            .query(state)
            .into_iter()
            .map(|hap| {
                let duration = hap.duration().to_float().max(1e-9);
                let slices = hap.value.as_map().and_then(|m| m.get("_slices")).map(slice_count).unwrap_or(1.0);
                let original_speed = hap.value.as_map().and_then(|m| m.get("speed")).and_then(Value::as_number).unwrap_or(1.0);
                let speed = (cps / slices / duration) * original_speed;
                hap.with_value(|v| with_fields(v, &[("speed", Value::from(speed)), ("unit", Value::from("c"))]))
            })
            .collect()
    })
}

/// `speed = cps * (end-begin) / hapDuration`, `unit = "c"` — fits the
/// sample to the event's duration.
pub fn fit(p: &Pattern) -> Pattern {
    let p = p.clone();
    Pattern::new(move |state: State| {
        let cps = state.cps();
        p.query(state)
            .into_iter()
            .map(|hap| {
                let (b, e) = record_begin_end(&hap.value);
                let duration = hap.duration().to_float().max(1e-9);
                let speed = cps * (e - b) / duration;
                hap.with_value(|v| with_fields(v, &[("speed", Value::from(speed)), ("unit", Value::from("c"))]))
            })
            .collect()
    })
}

/// `speed = cps/k`, `unit = "c"`, slows the pattern by `k`.
pub fn loop_at(p: &Pattern, k: Rational) -> Pattern {
    let slowed = crate::transforms::slow(p, k.clone());
    Pattern::new(move |state: State| {
        let cps = state.cps();
        let speed = cps / k.to_float().max(1e-9);
        slowed
            .query(state)
            .into_iter()
            .map(|hap| hap.with_value(|v| with_fields(v, &[("speed", Value::from(speed)), ("unit", Value::from("c"))])))
            .collect()
    })
}

/// Zoom on slice `indexPat % n` of the pattern itself, not the sample.
pub fn bite(p: &Pattern, n: i64, index_pat: &Pattern) -> Pattern {
    if n <= 0 {
        return p.clone();
    }
    let p = p.clone();
    let index_pat = index_pat.clone();
    squeeze_join(&index_pat.fmap(move |idx| {
        let i = (idx.parse_numeral().unwrap_or(0.0) as i64).rem_euclid(n);
        let b = Rational::new(i, n);
        let e = Rational::new(i + 1, n);
        Value::from(zoom(&p, b, e))
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timespan::TimeSpan;

    fn state01() -> State {
        State::new(TimeSpan::from_ints(0, 1))
    }

    fn sample_event() -> Pattern {
        let mut m = BTreeMap::new();
        m.insert("s".to_string(), Value::from("bd"));
        pure(Value::Map(m))
    }

    #[test]
    fn chop_splits_into_n_sub_events() {
        let p = chop(&sample_event(), 4);
        let haps = p.query(state01());
        assert_eq!(haps.len(), 4);
        let (b0, e0) = record_begin_end(&haps[0].value);
        assert_eq!(b0, 0.0);
        assert_eq!(e0, 0.25);
        let (b3, e3) = record_begin_end(&haps[3].value);
        assert_eq!(b3, 0.75);
        assert_eq!(e3, 1.0);
    }

    #[test]
    fn striate_cycles_progressive_positions() {
        let p = striate(&sample_event(), 2);
        let haps = p.query(state01());
        assert_eq!(haps.len(), 2);
        let (b0, e0) = record_begin_end(&haps[0].value);
        assert_eq!((b0, e0), (0.0, 0.5));
    }

    #[test]
    fn fit_sets_speed_from_event_duration() {
        let p = fit(&sample_event());
        let haps = p.query(state01());
        let speed = haps[0].value.as_map().unwrap().get("speed").and_then(Value::as_number).unwrap();
        assert!((speed - 1.0).abs() < 1e-9);
    }

    #[test]
    fn splice_reads_slice_count_from_explicit_boundary_list() {
        let bounds = Value::List(vec![Value::from(0.0), Value::from(0.3), Value::from(0.6), Value::from(1.0)]);
        let index = pure(Value::from(0.0));
        let p = splice(bounds, &index, &sample_event());
        let haps = p.query(State::new(TimeSpan::from_ints(0, 1)));
        let speed = haps[0].value.as_map().unwrap().get("speed").and_then(Value::as_number).unwrap();
        // 3 slots, cps defaults to 1, duration 1: speed = cps / slices / duration = 1/3.
        assert!((speed - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn loop_at_sets_speed_and_unit() {
        let p = loop_at(&sample_event(), Rational::from_int(2));
        let haps = p.query(State::new(TimeSpan::from_ints(0, 2)));
        let m = haps[0].value.as_map().unwrap();
        assert_eq!(m.get("unit"), Some(&Value::from("c")));
        assert!((m.get("speed").unwrap().as_number().unwrap() - 0.5).abs() < 1e-9);
    }
}
