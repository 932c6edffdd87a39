//! The stepwise sublanguage (`spec.md` §4.5): operations over the
//! `steps: Option<Rational>` sideband that most combinators carry alongside
//! their query function.

use crate::combinators::{gap, nothing, pure};
use crate::concat::{fastcat, stack};
use crate::pattern::Pattern;
use crate::rational::Rational;
use crate::state::State;
use crate::timespan::TimeSpan;
use crate::transforms::{fast, repeat_cycles, zoom};
use crate::value::Value;

fn step_count_or(p: &Pattern, default: i64) -> Rational {
    p.get_steps().unwrap_or_else(|| Rational::from_int(default))
}

/// Place each `pi` in a proportional time-slice; `steps = Σ ti`.
pub fn stepcat(items: Vec<(Rational, Pattern)>) -> Pattern {
    let total: Rational = items.iter().fold(Rational::from_int(0), |acc, (t, _)| acc + t.clone());
    if total.is_zero() {
        return gap(Rational::from_int(0));
    }
    let mut cursor = Rational::from_int(0);
    let mut arms = Vec::new();
    for (t, p) in &items {
        let b = cursor.clone() / total.clone();
        cursor = cursor + t.clone();
        let e = cursor.clone() / total.clone();
        arms.push(crate::transforms::compress(p, b, e));
    }
    stack(arms).set_steps(Some(total))
}

/// Bare-pattern convenience: use each arm's own `steps` as its weight.
pub fn stepcat_patterns(patterns: Vec<Pattern>) -> Pattern {
    let items = patterns.into_iter().map(|p| (step_count_or(&p, 1), p)).collect();
    stepcat(items)
}

/// Align every arm to `lcm` of their step counts via `pace`, then stack.
pub fn polymeter(arms: Vec<Pattern>) -> Pattern {
    let lcm = arms.iter().fold(Rational::from_int(1), |acc, p| acc.lcm(&step_count_or(p, 1)));
    stack(arms.into_iter().map(|p| pace(&p, lcm.clone())).collect()).set_steps(Some(lcm))
}

/// `fast(target / steps)`, `steps := target`.
pub fn pace(p: &Pattern, target: Rational) -> Pattern {
    let own = match p.get_steps() {
        Some(s) if !s.is_zero() => s,
        _ => return nothing(),
    };
    fast(p, target.clone() / own).set_steps(Some(target))
}

/// Keep (`i > 0`) or discard (`i < 0`, from the end) the first `|i|` steps.
pub fn take(p: &Pattern, i: i64) -> Pattern {
    let own = match p.get_steps() {
        Some(s) => s,
        None => return p.clone(),
    };
    if i == 0 {
        return nothing();
    }
    let total = own.to_i64().unwrap_or(1).max(1);
    let n = i.unsigned_abs() as i64;
    if n >= total {
        return p.clone();
    }
    let frac = Rational::new(n, total);
    if i > 0 {
        zoom(p, Rational::from_int(0), frac).set_steps(Some(Rational::from_int(n)))
    } else {
        zoom(p, Rational::from_int(1) - frac, Rational::from_int(1)).set_steps(Some(Rational::from_int(n)))
    }
}

pub fn drop(p: &Pattern, i: i64) -> Pattern {
    let own = match p.get_steps() {
        Some(s) => s,
        None => return p.clone(),
    };
    let total = own.to_i64().unwrap_or(1).max(1);
    if i == 0 {
        return p.clone();
    }
    let n = i.unsigned_abs() as i64;
    if n >= total {
        return nothing();
    }
    if i > 0 {
        take(p, -(total - n))
    } else {
        take(p, total - n)
    }
}

pub fn expand(p: &Pattern, k: Rational) -> Pattern {
    p.clone().set_steps(p.get_steps().map(|s| s * k))
}

pub fn contract(p: &Pattern, k: Rational) -> Pattern {
    if k.is_zero() {
        return p.clone();
    }
    p.clone().set_steps(p.get_steps().map(|s| s / k))
}

pub fn extend(p: &Pattern, k: Rational) -> Pattern {
    expand(&fast(p, k.clone()), k)
}

pub fn replicate(p: &Pattern, k: Rational) -> Pattern {
    expand(&fast(&repeat_cycles(p, k.clone()), k.clone()), k)
}

/// Progressively remove `n` steps from the start, one more each successive
/// cycle, until exhausted.
pub fn shrink(p: &Pattern, n: i64) -> Pattern {
    let total = step_count_or(p, 1).to_i64().unwrap_or(1).max(1);
    let p = p.clone();
    Pattern::new(move |state: State| {
        state
            .span
            .span_cycles()
            .into_iter()
            .flat_map(|cycle_span| {
                let c = cycle_span.begin.sam().to_i64().unwrap_or(0).rem_euclid(n.max(1));
                let remaining = (total - c).max(0);
                let sliced = take(&p, remaining);
                sliced.query(state.set_span(cycle_span))
            })
            .collect()
    })
}

/// The reverse accumulation of `shrink`: steps grow back in, one more each
/// cycle.
pub fn grow(p: &Pattern, n: i64) -> Pattern {
    let total = step_count_or(p, 1).to_i64().unwrap_or(1).max(1);
    let p = p.clone();
    Pattern::new(move |state: State| {
        state
            .span
            .span_cycles()
            .into_iter()
            .flat_map(|cycle_span| {
                let c = cycle_span.begin.sam().to_i64().unwrap_or(0).rem_euclid(n.max(1));
                let taken = (c + 1).min(total);
                let sliced = take(&p, taken);
                sliced.query(state.set_span(cycle_span))
            })
            .collect()
    })
}

/// Interleave arms step-by-step over one compressed cycle.
pub fn zip(arms: Vec<Pattern>) -> Pattern {
    let lcm = arms.iter().fold(Rational::from_int(1), |acc, p| acc.lcm(&step_count_or(p, 1)));
    let paced: Vec<Pattern> = arms.into_iter().map(|p| pace(&p, lcm.clone())).collect();
    stepcat_patterns(paced)
}

/// Insert `pivot` into the list at progressively earlier positions each
/// repetition.
pub fn tour(pivot: Pattern, others: Vec<Pattern>) -> Pattern {
    let n = others.len();
    if n == 0 {
        return pivot;
    }
    let rounds: Vec<Pattern> = (0..=n)
        .map(|i| {
            let mut arms = others.clone();
            arms.insert(n - i, pivot.clone());
            fastcat(arms)
        })
        .collect();
    crate::concat::slowcat(rounds)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state01() -> State {
        State::new(TimeSpan::from_ints(0, 1))
    }

    #[test]
    fn stepcat_sums_weights() {
        let p = stepcat(vec![(Rational::from_int(1), pure(Value::from("a"))), (Rational::from_int(3), pure(Value::from("b")))]);
        assert_eq!(p.get_steps(), Some(Rational::from_int(4)));
        let haps = p.query(state01());
        assert_eq!(haps.len(), 2);
        assert_eq!(haps[0].part, TimeSpan::new(Rational::from_int(0), Rational::new(1, 4)));
    }

    #[test]
    fn pace_rescales_to_target() {
        let p = fastcat(vec![pure(Value::from(1.0)); 2]);
        let paced = pace(&p, Rational::from_int(6));
        assert_eq!(paced.get_steps(), Some(Rational::from_int(6)));
    }

    #[test]
    fn take_keeps_first_n_steps() {
        let p = fastcat(vec![pure(Value::from(1.0)), pure(Value::from(2.0)), pure(Value::from(3.0)), pure(Value::from(4.0))]);
        let kept = take(&p, 2);
        let haps = kept.query(state01());
        assert_eq!(haps.len(), 2);
        assert_eq!(haps[0].value, Value::from(1.0));
        assert_eq!(haps[1].value, Value::from(2.0));
    }

    #[test]
    fn take_zero_is_nothing() {
        let p = fastcat(vec![pure(Value::from(1.0)); 4]);
        assert_eq!(take(&p, 0).get_steps(), Some(Rational::from_int(0)));
    }

    #[test]
    fn polymeter_aligns_on_lcm_steps() {
        let a = fastcat(vec![pure(Value::from("a")); 2]);
        let b = fastcat(vec![pure(Value::from("c")); 3]);
        let poly = polymeter(vec![a, b]);
        assert_eq!(poly.get_steps(), Some(Rational::from_int(6)));
    }
}
