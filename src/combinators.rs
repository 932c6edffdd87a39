//! The foundational pattern constructors: `pure`, `gap`/`silence`/`nothing`,
//! `signal`/`steady`, and `reify`.

use crate::hap::Hap;
use crate::pattern::Pattern;
use crate::rational::Rational;
use crate::runtime::Runtime;
use crate::state::State;
use crate::timespan::TimeSpan;
use crate::value::Value;

/// One event per whole cycle intersected by the query span, with
/// `whole = cycleContaining(begin)` and `steps = 1`.
pub fn pure(value: Value) -> Pattern {
    pure_located(value, None)
}

pub fn pure_located(value: Value, location: Option<String>) -> Pattern {
    let v = value.clone();
    Pattern::with_steps(
        move |state| {
            state
                .span
                .span_cycles()
                .into_iter()
                .map(|part| {
                    let sam = part.begin.sam();
                    let whole = TimeSpan::new(sam.clone(), sam + Rational::from_int(1));
                    Hap::new(Some(whole), part, v.clone())
                })
                .collect()
        },
        Some(Rational::from_int(1)),
    )
    .mark_pure(value, location)
}

/// An empty pattern carrying a stepwise length of `n` — `spec.md` §4.1.
/// `silence = gap(1)`; `nothing = gap(0)`. The distinction is load-bearing
/// in the stepwise sublanguage: `nothing` is the stepwise neutral element
/// (zero steps), `silence` is the continuous neutral element (one empty
/// step per cycle). They must never be unified.
pub fn gap(n: Rational) -> Pattern {
    Pattern::with_steps(|_state| Vec::new(), Some(n))
}

pub fn silence() -> Pattern {
    gap(Rational::from_int(1))
}

pub fn nothing() -> Pattern {
    gap(Rational::from_int(0))
}

/// A continuous pattern sampled at the query span's start.
pub fn signal<F>(f: F) -> Pattern
where
    F: Fn(&Rational) -> Value + Send + Sync + 'static,
{
    Pattern::new(move |state| vec![Hap::new(None, state.span.clone(), f(&state.span.begin))])
}

pub fn steady(value: Value) -> Pattern {
    signal(move |_t| value.clone())
}

/// Coerce a non-pattern value into a pattern, using the injected
/// mini-notation parser for strings when one is installed
/// (`spec.md` §6, glossary: "Reify").
pub fn reify_str(s: &str) -> Pattern {
    match &Runtime::current().parser {
        Some(parser) => parser(s),
        None => pure(Value::String(s.to_string())),
    }
}

pub fn reify_number(n: f64) -> Pattern {
    pure(Value::Number(n))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pure_one_event_per_cycle() {
        let p = pure(Value::from(1.0));
        let haps = p.query(State::new(TimeSpan::from_ints(0, 1)));
        assert_eq!(haps.len(), 1);
        assert_eq!(haps[0].whole, Some(TimeSpan::from_ints(0, 1)));
        assert_eq!(haps[0].part, TimeSpan::from_ints(0, 1));
    }

    #[test]
    fn pure_splits_across_cycles() {
        let p = pure(Value::from(1.0));
        let haps = p.query(State::new(TimeSpan::new(Rational::new(1, 2), Rational::new(3, 2))));
        assert_eq!(haps.len(), 2);
        assert_eq!(haps[0].part, TimeSpan::new(Rational::new(1, 2), Rational::from_int(1)));
        assert_eq!(haps[1].part, TimeSpan::new(Rational::from_int(1), Rational::new(3, 2)));
    }

    #[test]
    fn silence_and_nothing_have_distinct_steps() {
        assert_eq!(silence().get_steps(), Some(Rational::from_int(1)));
        assert_eq!(nothing().get_steps(), Some(Rational::from_int(0)));
        assert!(silence().query(State::new(TimeSpan::from_ints(0, 1))).is_empty());
        assert!(nothing().query(State::new(TimeSpan::from_ints(0, 1))).is_empty());
    }

    #[test]
    fn signal_is_continuous() {
        let p = signal(|t| Value::from(t.to_float()));
        let haps = p.query(State::new(TimeSpan::from_ints(0, 1)));
        assert_eq!(haps.len(), 1);
        assert!(haps[0].whole.is_none());
    }
}
