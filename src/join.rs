//! The six joins (`spec.md` §4.2) that collapse a pattern-of-patterns
//! (a pattern whose values are `Value::Pattern`) into a plain pattern.
//! Dispatched from one enum so callers (chiefly the matrix composers in
//! `matrix.rs`) pick a mode without re-deriving the mechanics each time.

use crate::hap::Hap;
use crate::pattern::Pattern;
use crate::state::State;
use crate::stepwise::extend;
use crate::transforms::{focus, late};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Outer,
    Squeeze,
    Reset,
    Restart,
    Poly,
}

pub fn join(kind: JoinKind, outer: &Pattern) -> Pattern {
    match kind {
        JoinKind::Inner => inner_join(outer),
        JoinKind::Outer => outer_join(outer),
        JoinKind::Squeeze => squeeze_join(outer),
        JoinKind::Reset => reset_join(outer),
        JoinKind::Restart => restart_join(outer),
        JoinKind::Poly => poly_join(outer),
    }
}

fn inner_pattern(hap: &Hap) -> Option<Arc<Pattern>> {
    hap.value.as_pattern().cloned()
}

/// Inner structure dominates; outer only selects which inner pattern(s) are
/// active over a given span.
pub fn inner_join(outer: &Pattern) -> Pattern {
    let outer = outer.clone();
    Pattern::new(move |state: State| {
        let outer_haps = outer.query(state.clone());
        let mut out = Vec::new();
        for ho in &outer_haps {
            let Some(inner) = inner_pattern(ho) else { continue };
            for hi in inner.query(state.clone()) {
                if let Some(part) = ho.part.intersection(&hi.part) {
                    let context = ho.combine_context(&hi);
                    out.push(Hap::with_context(hi.whole.clone(), part, hi.value.clone(), context));
                }
            }
        }
        out
    })
}

/// Outer structure dominates: `whole = outer.whole`, inner is queried
/// restricted to the outer event's span.
pub fn outer_join(outer: &Pattern) -> Pattern {
    let steps = outer.get_steps();
    let outer = outer.clone();
    Pattern::with_steps(
        move |state: State| {
            let outer_haps = outer.query(state.clone());
            let mut out = Vec::new();
            for ho in &outer_haps {
                let Some(inner) = inner_pattern(ho) else { continue };
                let restrict = ho.whole_or_part();
                for hi in inner.query(state.set_span(restrict)) {
                    if let Some(part) = ho.part.intersection(&hi.part) {
                        let context = ho.combine_context(&hi);
                        out.push(Hap::with_context(ho.whole.clone(), part, hi.value.clone(), context));
                    }
                }
            }
            out
        },
        steps,
    )
}

/// For an outer event with whole `w`, the inner pattern's cycle `[0,1)` is
/// mapped onto `w` (`focusSpan`); keep only events whose resulting `part`,
/// intersected with the outer event's `part`, is non-empty.
pub fn squeeze_join(outer: &Pattern) -> Pattern {
    let outer = outer.clone();
    Pattern::new(move |state: State| {
        let outer_haps = outer.query(state.clone());
        let mut out = Vec::new();
        for ho in &outer_haps {
            let Some(inner) = inner_pattern(ho) else { continue };
            let w = ho.whole_or_part();
            let focused = focus(inner.as_ref(), w.begin.clone(), w.end.clone());
            for hi in focused.query(state.set_span(ho.part.clone())) {
                if let Some(part) = ho.part.intersection(&hi.part) {
                    if part.is_empty() {
                        continue;
                    }
                    let context = ho.combine_context(&hi);
                    out.push(Hap::with_context(hi.whole.clone(), part, hi.value.clone(), context));
                }
            }
        }
        out
    })
}

/// The inner pattern's cycle-start is re-aligned to the outer onset: late
/// by `outer.whole.begin.cyclePos()`.
pub fn reset_join(outer: &Pattern) -> Pattern {
    let steps = outer.get_steps();
    let outer = outer.clone();
    Pattern::with_steps(
        move |state: State| {
            let outer_haps = outer.query(state.clone());
            let mut out = Vec::new();
            for ho in &outer_haps {
                let Some(inner) = inner_pattern(ho) else { continue };
                let offset = ho.whole_or_part().begin.cycle_pos();
                let shifted = late(inner.as_ref(), offset);
                let restrict = ho.whole_or_part();
                for hi in shifted.query(state.set_span(restrict)) {
                    if let Some(part) = ho.part.intersection(&hi.part) {
                        let context = ho.combine_context(&hi);
                        out.push(Hap::with_context(ho.whole.clone(), part, hi.value.clone(), context));
                    }
                }
            }
            out
        },
        steps,
    )
}

/// The inner pattern is re-started from its own time-zero at each outer
/// onset: late by `outer.whole.begin`.
pub fn restart_join(outer: &Pattern) -> Pattern {
    let steps = outer.get_steps();
    let outer = outer.clone();
    Pattern::with_steps(
        move |state: State| {
            let outer_haps = outer.query(state.clone());
            let mut out = Vec::new();
            for ho in &outer_haps {
                let Some(inner) = inner_pattern(ho) else { continue };
                let offset = ho.whole_or_part().begin;
                let shifted = late(inner.as_ref(), offset);
                let restrict = ho.whole_or_part();
                for hi in shifted.query(state.set_span(restrict)) {
                    if let Some(part) = ho.part.intersection(&hi.part) {
                        let context = ho.combine_context(&hi);
                        out.push(Hap::with_context(ho.whole.clone(), part, hi.value.clone(), context));
                    }
                }
            }
            out
        },
        steps,
    )
}

/// Each inner is `extend`ed by `outer.steps / inner.steps`, then
/// `outerJoin`.
pub fn poly_join(outer: &Pattern) -> Pattern {
    let outer_steps = outer.get_steps();
    let rescaled = outer.clone().fmap(move |v| match v.as_pattern() {
        Some(inner) => {
            let ratio = match (outer_steps.clone(), inner.get_steps()) {
                (Some(o), Some(i)) if !i.is_zero() => o / i,
                _ => crate::rational::Rational::from_int(1),
            };
            crate::value::Value::from(extend(inner.as_ref(), ratio))
        }
        None => v.clone(),
    });
    outer_join(&rescaled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combinators::pure;
    use crate::concat::fastcat;
    use crate::timespan::TimeSpan;
    use crate::value::Value;

    fn state01() -> State {
        State::new(TimeSpan::from_ints(0, 1))
    }

    fn pattern_of_patterns() -> Pattern {
        let a = Value::from(pure(Value::from("x")));
        let b = Value::from(pure(Value::from("y")));
        fastcat(vec![pure(a), pure(b)])
    }

    #[test]
    fn inner_join_selects_by_outer_structure() {
        let outer = pattern_of_patterns();
        let joined = inner_join(&outer);
        let haps = joined.query(state01());
        assert_eq!(haps.len(), 2);
        assert_eq!(haps[0].value, Value::from("x"));
        assert_eq!(haps[1].value, Value::from("y"));
    }

    #[test]
    fn outer_join_takes_whole_from_outer() {
        let outer = pattern_of_patterns();
        let joined = outer_join(&outer);
        let haps = joined.query(state01());
        assert_eq!(haps.len(), 2);
        assert_eq!(haps[0].whole, Some(TimeSpan::new(rzero(), rhalf())));
    }

    fn rzero() -> crate::rational::Rational {
        crate::rational::Rational::from_int(0)
    }
    fn rhalf() -> crate::rational::Rational {
        crate::rational::Rational::new(1, 2)
    }

    #[test]
    fn squeeze_join_compresses_inner_into_outer_whole() {
        let fast_inner = Value::from(fastcat(vec![pure(Value::from(1.0)), pure(Value::from(2.0))]));
        let outer = pure(fast_inner);
        let joined = squeeze_join(&outer);
        let haps = joined.query(state01());
        assert_eq!(haps.len(), 2);
        assert_eq!(haps[0].part, TimeSpan::new(rzero(), rhalf()));
    }
}
