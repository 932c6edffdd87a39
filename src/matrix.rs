//! The matrix composers (`spec.md` §4.8): every value operator (`add`,
//! `sub`, ... `keepIf`) crossed with every mix mode (`in`, `out`, `mix`,
//! `squeeze`, `squeezeOut`, `reset`, `restart`, `poly`) reduces to one
//! dispatcher over the four applicatives (`applicative.rs`) and the six
//! joins (`join.rs`), rather than 22*8 hand-written functions.

use crate::applicative::{app_both, app_left, app_right, keep_if_op, num_op, set_op, ValueOp};
use crate::join::{poly_join, reset_join, restart_join, squeeze_join};
use crate::pattern::Pattern;
use crate::value::Value;
use std::sync::Arc;

/// The 22 value operators named in `spec.md` §4.8. `Func` carries an
/// arbitrary caller-supplied combinator for the `func` slot.
pub enum Op {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Band,
    Bor,
    Bxor,
    Blshift,
    Brshift,
    Lt,
    Gt,
    Lte,
    Gte,
    Eq,
    Ne,
    And,
    Or,
    Set,
    Keep,
    KeepIf,
    Func(ValueOp),
}

fn as_int(v: &Value) -> i64 {
    v.parse_numeral().unwrap_or(0.0) as i64
}

fn cmp_op<F>(f: F) -> ValueOp
where
    F: Fn(f64, f64) -> bool + Send + Sync + 'static,
{
    Arc::new(move |a, b| match (a.parse_numeral(), b.parse_numeral()) {
        (Some(a), Some(b)) => Value::Bool(f(a, b)),
        _ => Value::Silence,
    })
}

fn to_value_op(op: &Op) -> ValueOp {
    match op {
        Op::Add => num_op(|a, b| a + b),
        Op::Sub => num_op(|a, b| a - b),
        Op::Mul => num_op(|a, b| a * b),
        Op::Div => num_op(|a, b| a / b),
        Op::Mod => num_op(|a, b| a.rem_euclid(b)),
        Op::Pow => num_op(|a, b| a.powf(b)),
        Op::Band => Arc::new(|a, b| Value::Number((as_int(a) & as_int(b)) as f64)),
        Op::Bor => Arc::new(|a, b| Value::Number((as_int(a) | as_int(b)) as f64)),
        Op::Bxor => Arc::new(|a, b| Value::Number((as_int(a) ^ as_int(b)) as f64)),
        Op::Blshift => Arc::new(|a, b| Value::Number((as_int(a) << as_int(b)) as f64)),
        Op::Brshift => Arc::new(|a, b| Value::Number((as_int(a) >> as_int(b)) as f64)),
        Op::Lt => cmp_op(|a, b| a < b),
        Op::Gt => cmp_op(|a, b| a > b),
        Op::Lte => cmp_op(|a, b| a <= b),
        Op::Gte => cmp_op(|a, b| a >= b),
        Op::Eq => Arc::new(|a, b| Value::Bool(a == b)),
        Op::Ne => Arc::new(|a, b| Value::Bool(a != b)),
        Op::And => Arc::new(|a, b| Value::Bool(a.is_truthy() && b.is_truthy())),
        Op::Or => Arc::new(|a, b| Value::Bool(a.is_truthy() || b.is_truthy())),
        Op::Set => set_op(),
        Op::Keep => crate::applicative::keep_op(),
        Op::KeepIf => keep_if_op(),
        Op::Func(f) => f.clone(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MixMode {
    In,
    Out,
    Mix,
    Squeeze,
    SqueezeOut,
    Reset,
    Restart,
    Poly,
}

/// Wrap `left`'s events so each carries, as its value, `right` fmapped by
/// `op(leftValue, _)` — the pattern-of-patterns that `squeezeJoin`/
/// `resetJoin`/`restartJoin`/`polyJoin` collapse back down. `left` drives
/// the outer structure.
fn nest_left_outer(left: &Pattern, right: &Pattern, op: ValueOp) -> Pattern {
    let right = right.clone();
    left.clone().fmap(move |a| {
        let a = a.clone();
        let op = op.clone();
        let right = right.clone();
        Value::from(right.fmap(move |b| op(&a, b)))
    })
}

/// Symmetric to `nest_left_outer`: `right` drives the outer structure.
fn nest_right_outer(left: &Pattern, right: &Pattern, op: ValueOp) -> Pattern {
    let left = left.clone();
    right.clone().fmap(move |b| {
        let b = b.clone();
        let op = op.clone();
        let left = left.clone();
        Value::from(left.fmap(move |a| op(a, &b)))
    })
}

fn drop_silence(p: &Pattern) -> Pattern {
    p.clone().filter_values(|v| !matches!(v, Value::Silence))
}

/// Apply `op` to `left` and `right` under the mix mode `how`. `keepIf`
/// (and therefore `struct`/`mask`/`reset`/`restart`) prunes events whose
/// result is `Value::Silence`; every other operator leaves `Silence`
/// results in place (e.g. a failed numeric coercion is visible, not
/// silently dropped).
pub fn compose(op: Op, how: MixMode, left: &Pattern, right: &Pattern) -> Pattern {
    let is_keep_if = matches!(op, Op::KeepIf);
    let value_op = to_value_op(&op);
    let result = match how {
        MixMode::In => app_left(left, right, value_op),
        MixMode::Out => app_right(left, right, value_op),
        MixMode::Mix => app_both(left, right, value_op),
        MixMode::Squeeze => squeeze_join(&nest_left_outer(left, right, value_op)),
        MixMode::SqueezeOut => squeeze_join(&nest_right_outer(left, right, value_op)),
        MixMode::Reset => reset_join(&nest_left_outer(left, right, value_op)),
        MixMode::Restart => restart_join(&nest_left_outer(left, right, value_op)),
        MixMode::Poly => poly_join(&nest_left_outer(left, right, value_op)),
    };
    if is_keep_if {
        drop_silence(&result)
    } else {
        result
    }
}

/// `p.struct(boolPat)`: discretize `p` onto `boolPat`'s structure, keeping
/// `p`'s value only where `boolPat` is truthy. `keepIf.out`.
pub fn struct_with(p: &Pattern, bool_pat: &Pattern) -> Pattern {
    compose(Op::KeepIf, MixMode::Out, p, bool_pat)
}

/// `p.mask(boolPat)`: keep `p`'s own structure, muting events where
/// `boolPat` is falsy. `keepIf.in`.
pub fn mask_with(p: &Pattern, bool_pat: &Pattern) -> Pattern {
    compose(Op::KeepIf, MixMode::In, p, bool_pat)
}

/// `p.reset(onsetPat)`: `p`'s cycle restarts (aligned to cycle-position)
/// at each onset of `onsetPat`. `keepIf.reset`.
pub fn reset_with(p: &Pattern, onset_pat: &Pattern) -> Pattern {
    compose(Op::KeepIf, MixMode::Reset, p, onset_pat)
}

/// `p.restart(onsetPat)`: like `reset_with`, but `p` restarts from its
/// absolute time-zero rather than its cycle-position. `keepIf.restart`.
pub fn restart_with(p: &Pattern, onset_pat: &Pattern) -> Pattern {
    compose(Op::KeepIf, MixMode::Restart, p, onset_pat)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combinators::pure;
    use crate::concat::fastcat;
    use crate::state::State;
    use crate::timespan::TimeSpan;

    fn state01() -> State {
        State::new(TimeSpan::from_ints(0, 1))
    }

    #[test]
    fn add_mix_sums_overlapping_events() {
        let left = pure(Value::from(1.0));
        let right = pure(Value::from(2.0));
        let combined = compose(Op::Add, MixMode::Mix, &left, &right);
        let haps = combined.query(state01());
        assert_eq!(haps[0].value, Value::from(3.0));
    }

    #[test]
    fn struct_with_keeps_only_truthy_slots() {
        let p = pure(Value::from("bd"));
        let bool_pat = fastcat(vec![pure(Value::Bool(true)), pure(Value::Bool(false))]);
        let structured = struct_with(&p, &bool_pat);
        let haps = structured.query(state01());
        assert_eq!(haps.len(), 1);
        assert_eq!(haps[0].value, Value::from("bd"));
    }

    #[test]
    fn mask_with_mutes_falsy_slots() {
        let p = fastcat(vec![pure(Value::from(1.0)), pure(Value::from(2.0))]);
        let bool_pat = pure(Value::Bool(false));
        let masked = mask_with(&p, &bool_pat);
        assert!(masked.query(state01()).is_empty());
    }

    #[test]
    fn lt_compares_numerically() {
        let left = pure(Value::from(1.0));
        let right = pure(Value::from(2.0));
        let combined = compose(Op::Lt, MixMode::Mix, &left, &right);
        assert_eq!(combined.query(state01())[0].value, Value::Bool(true));
    }
}
