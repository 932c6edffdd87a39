//! The four applicative "how" variants (`spec.md` §4.2): `appWhole` is the
//! shared primitive behind `appBoth`; `appLeft`/`appRight` use their own
//! per-event restricted re-query mechanics, as the source text specifies.
//!
//! Every binary value operator in the matrix composers (`matrix.rs`) is
//! built from one of these four.

use crate::hap::Hap;
use crate::pattern::Pattern;
use crate::rational::Rational;
use crate::state::State;
use crate::timespan::TimeSpan;
use crate::value::Value;
use std::sync::Arc;

/// A binary value combinator: `(leftValue, rightValue) -> value`. Operand
/// order is always left-then-right regardless of which side's structure
/// dominates — only the *timing* of the result depends on `how`.
pub type ValueOp = Arc<dyn Fn(&Value, &Value) -> Value + Send + Sync>;

pub type WholeCombiner = Arc<dyn Fn(Option<&TimeSpan>, Option<&TimeSpan>) -> Option<TimeSpan> + Send + Sync>;

/// The generic applicative: query both patterns over the same span, and
/// for every pair whose `part`s intersect, emit one combined event whose
/// `whole` is produced by `whole_combiner`.
pub fn app_whole(left: &Pattern, right: &Pattern, op: ValueOp, whole_combiner: WholeCombiner) -> Pattern {
    let left = left.clone();
    let right = right.clone();
    Pattern::new(move |state: State| {
        let left_haps = left.query(state.clone());
        let right_haps = right.query(state);
        let mut out = Vec::new();
        for hl in &left_haps {
            for hr in &right_haps {
                if let Some(part) = hl.part.intersection(&hr.part) {
                    let whole = whole_combiner(hl.whole.as_ref(), hr.whole.as_ref());
                    let value = op(&hl.value, &hr.value);
                    let context = hl.combine_context(hr);
                    out.push(Hap::with_context(whole, part, value, context));
                }
            }
        }
        out
    })
}

fn intersect_wholes(a: Option<&TimeSpan>, b: Option<&TimeSpan>) -> Option<TimeSpan> {
    match (a, b) {
        (Some(a), Some(b)) => a.intersection(b),
        _ => None,
    }
}

/// Both structures contribute; events exist only where both exist.
/// `steps = lcm(left.steps, right.steps)`.
pub fn app_both(left: &Pattern, right: &Pattern, op: ValueOp) -> Pattern {
    let steps = Rational::lcm_maybe(left.get_steps().as_ref(), right.get_steps().as_ref());
    app_whole(left, right, op, Arc::new(intersect_wholes)).set_steps(steps)
}

/// Structure from `left`: for each left event, query `right` restricted to
/// `left.whole` (or `left.part` if continuous), and intersect parts.
pub fn app_left(left: &Pattern, right: &Pattern, op: ValueOp) -> Pattern {
    app_structured(left, right, op, true)
}

/// Structure from `right`, symmetric to `app_left`.
pub fn app_right(left: &Pattern, right: &Pattern, op: ValueOp) -> Pattern {
    app_structured(left, right, op, false)
}

fn app_structured(left: &Pattern, right: &Pattern, op: ValueOp, dominant_is_left: bool) -> Pattern {
    let steps = if dominant_is_left { left.get_steps() } else { right.get_steps() };
    let left = left.clone();
    let right = right.clone();
    Pattern::with_steps(
        move |state: State| {
            let (dominant, passenger) = if dominant_is_left { (&left, &right) } else { (&right, &left) };
            let dominant_haps = dominant.query(state.clone());
            let mut out = Vec::new();
            for hd in &dominant_haps {
                let restrict = hd.whole_or_part();
                let passenger_haps = passenger.query(state.set_span(restrict));
                for hp in &passenger_haps {
                    if let Some(part) = hd.part.intersection(&hp.part) {
                        let (hl, hr) = if dominant_is_left { (hd, hp) } else { (hp, hd) };
                        let value = op(&hl.value, &hr.value);
                        let context = hl.combine_context(hr);
                        out.push(Hap::with_context(hd.whole.clone(), part, value, context));
                    }
                }
            }
            out
        },
        steps,
    )
}

pub fn num_op<F>(f: F) -> ValueOp
where
    F: Fn(f64, f64) -> f64 + Send + Sync + 'static,
{
    Arc::new(move |a, b| match (a.parse_numeral(), b.parse_numeral()) {
        (Some(a), Some(b)) => Value::Number(f(a, b)),
        _ => Value::Silence,
    })
}

pub fn set_op() -> ValueOp {
    Arc::new(|_a, b| b.clone())
}

pub fn keep_op() -> ValueOp {
    Arc::new(|a, _b| a.clone())
}

pub fn union_op() -> ValueOp {
    Arc::new(|a, b| a.union_with(b))
}

/// `keepIf`: drop the pair entirely (represented as `Silence`, filtered by
/// the caller) when the right-hand ("keep-if") value isn't truthy — the
/// shared mechanism behind `struct`/`mask`/`reset`/`restart`
/// (`spec.md` §4.8).
pub fn keep_if_op() -> ValueOp {
    Arc::new(|a, b| if b.is_truthy() { a.clone() } else { Value::Silence })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combinators::pure;
    use crate::concat::fastcat;

    fn state01() -> State {
        State::new(TimeSpan::from_ints(0, 1))
    }

    #[test]
    fn app_both_identity() {
        let identity_op: ValueOp = Arc::new(|_a, b| b.clone());
        let p = pure(Value::from(1.0));
        let combined = app_both(&pure(Value::Bool(true)), &p, identity_op);
        let haps = combined.query(state01());
        assert_eq!(haps.len(), 1);
        assert_eq!(haps[0].value, Value::from(1.0));
        assert_eq!(haps[0].whole, Some(TimeSpan::from_ints(0, 1)));
    }

    #[test]
    fn app_left_keeps_left_structure() {
        let left = fastcat(vec![pure(Value::from(1.0)), pure(Value::from(2.0))]);
        let right = pure(Value::from(10.0));
        let combined = app_left(&left, &right, num_op(|a, b| a + b));
        let haps = combined.query(state01());
        assert_eq!(haps.len(), 2);
        assert_eq!(haps[0].value, Value::from(11.0));
        assert_eq!(haps[1].value, Value::from(12.0));
        assert_eq!(haps[0].part, TimeSpan::new(Rational::from_int(0), Rational::new(1, 2)));
    }

    #[test]
    fn app_right_keeps_right_structure() {
        let left = pure(Value::from(10.0));
        let right = fastcat(vec![pure(Value::from(1.0)), pure(Value::from(2.0))]);
        let combined = app_right(&left, &right, num_op(|a, b| a + b));
        let haps = combined.query(state01());
        assert_eq!(haps.len(), 2);
        assert_eq!(haps[0].value, Value::from(11.0));
        assert_eq!(haps[1].value, Value::from(12.0));
    }

    #[test]
    fn app_both_steps_is_lcm() {
        let left = fastcat(vec![pure(Value::from(1.0)); 2]);
        let right = fastcat(vec![pure(Value::from(1.0)); 3]);
        let combined = app_both(&left, &right, num_op(|a, b| a + b));
        assert_eq!(combined.get_steps(), Some(Rational::from_int(6)));
    }
}
