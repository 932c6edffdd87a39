//! Concatenators (`spec.md` §4.4): combining whole patterns side by side
//! or on top of each other.

use crate::combinators::gap;
use crate::pattern::Pattern;
use crate::rational::Rational;
use crate::state::State;
use crate::timespan::TimeSpan;

/// Union of every arm's query events. `steps = lcm(arm steps)`.
pub fn stack(arms: Vec<Pattern>) -> Pattern {
    let steps = arms.iter().fold(None, |acc, p| Rational::lcm_maybe(acc.as_ref(), p.get_steps().as_ref()));
    let arms = arms;
    Pattern::with_steps(
        move |state: State| arms.iter().flat_map(|p| p.query(state.clone())).collect(),
        steps,
    )
}

/// Cycle `k` plays arm `k mod n`. The offset subtraction keeps inner
/// patterns from skipping cycles when `n > 1`.
pub fn slowcat(arms: Vec<Pattern>) -> Pattern {
    let n = arms.len() as i64;
    if n == 0 {
        return gap(Rational::from_int(0));
    }
    Pattern::new(move |state: State| {
        state
            .span
            .span_cycles()
            .into_iter()
            .flat_map(|cycle_span| {
                let c = cycle_span.begin.sam();
                let c_int = c.to_i64().unwrap_or(0);
                let i = c_int.rem_euclid(n) as usize;
                let offset = c.floor() - (c.clone() / Rational::from_int(n)).floor();
                let pat = &arms[i];
                let queried = pat.query(state.set_span(cycle_span.shift(&-offset.clone())));
                queried.into_iter().map(move |hap| hap.with_span(|ts| ts.shift(&offset))).collect::<Vec<_>>()
            })
            .collect()
    })
    .set_steps(Some(Rational::from_int(n)))
}

/// `slowcat(arms).fast(n)`, `steps = n`.
pub fn fastcat(arms: Vec<Pattern>) -> Pattern {
    let n = arms.len() as i64;
    crate::transforms::fast(&slowcat(arms), Rational::from_int(n)).set_steps(Some(Rational::from_int(n)))
}

/// Each `pi` plays for `ci` cycles, then the whole is slowed by the total.
pub fn arrange(sections: Vec<(Rational, Pattern)>) -> Pattern {
    let total: Rational = sections.iter().fold(Rational::from_int(0), |acc, (c, _)| acc + c.clone());
    if total.is_zero() {
        return gap(Rational::from_int(0));
    }
    let mut arms = Vec::new();
    for (cycles, pattern) in &sections {
        let count = cycles.to_i64().unwrap_or(1).max(1);
        for _ in 0..count {
            arms.push(pattern.clone());
        }
    }
    // `slowcat` over `total` one-cycle-each arms already takes `total`
    // cycles to complete a rotation — relative to a `fastcat` of the same
    // arms (which would compress into a single cycle), that is "the whole
    // slowed by the total".
    slowcat(arms)
}

fn pad_to(p: &Pattern, target_steps: Rational, pad_before: bool) -> Pattern {
    let own = p.get_steps().unwrap_or_else(|| Rational::from_int(1));
    if own >= target_steps {
        return p.clone();
    }
    let filler = gap(target_steps.clone() - own);
    if pad_before {
        fastcat(vec![filler, p.clone()])
    } else {
        fastcat(vec![p.clone(), filler])
    }
}

/// Pad shorter arms with a trailing `gap` so every arm's step count matches
/// the widest arm, then `stack`.
pub fn stack_left(arms: Vec<Pattern>) -> Pattern {
    let target = widest_steps(&arms);
    stack(arms.into_iter().map(|p| pad_to(&p, target.clone(), false)).collect())
}

/// Pad shorter arms with a leading `gap`.
pub fn stack_right(arms: Vec<Pattern>) -> Pattern {
    let target = widest_steps(&arms);
    stack(arms.into_iter().map(|p| pad_to(&p, target.clone(), true)).collect())
}

/// Pad shorter arms evenly on both sides, centring them.
pub fn stack_centre(arms: Vec<Pattern>) -> Pattern {
    let target = widest_steps(&arms);
    stack(
        arms.into_iter()
            .map(|p| {
                let own = p.get_steps().unwrap_or_else(|| Rational::from_int(1));
                if own >= target {
                    return p;
                }
                let total_pad = target.clone() - own;
                let half = total_pad.clone() / Rational::from_int(2);
                let other_half = total_pad - half.clone();
                fastcat(vec![gap(half), p, gap(other_half)])
            })
            .collect(),
    )
}

/// Picks the alignment per cycle from `by`: `0` = left-pad, `1` = right-pad.
pub fn stack_by(by: &Pattern, arms: Vec<Pattern>) -> Pattern {
    let target = widest_steps(&arms);
    let left_padded: Vec<Pattern> = arms.iter().map(|p| pad_to(p, target.clone(), false)).collect();
    let right_padded: Vec<Pattern> = arms.iter().map(|p| pad_to(p, target.clone(), true)).collect();
    let left_stack = stack(left_padded);
    let right_stack = stack(right_padded);
    let by = by.clone();
    Pattern::new(move |state: State| {
        let side = by.query(state.clone()).into_iter().next().map(|h| h.value.is_truthy()).unwrap_or(false);
        if side {
            right_stack.query(state)
        } else {
            left_stack.query(state)
        }
    })
}

fn widest_steps(arms: &[Pattern]) -> Rational {
    arms.iter()
        .filter_map(|p| p.get_steps())
        .fold(Rational::from_int(1), |acc, s| acc.max(&s))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combinators::pure;
    use crate::value::Value;

    fn state01() -> State {
        State::new(TimeSpan::from_ints(0, 1))
    }

    #[test]
    fn stack_preserves_arm_order() {
        let s = stack(vec![pure(Value::from("x")), pure(Value::from("y"))]);
        let haps = s.query(state01());
        assert_eq!(haps.len(), 2);
        assert_eq!(haps[0].value, Value::from("x"));
        assert_eq!(haps[1].value, Value::from("y"));
    }

    #[test]
    fn slowcat_plays_one_arm_per_cycle() {
        let c = slowcat(vec![pure(Value::from("a")), pure(Value::from("b"))]);
        let haps0 = c.query(state01());
        assert_eq!(haps0[0].value, Value::from("a"));
        let haps1 = c.query(State::new(TimeSpan::from_ints(1, 2)));
        assert_eq!(haps1[0].value, Value::from("b"));
        let haps2 = c.query(State::new(TimeSpan::from_ints(2, 3)));
        assert_eq!(haps2[0].value, Value::from("a"));
    }

    #[test]
    fn fastcat_splits_cycle_evenly() {
        let c = fastcat(vec![pure(Value::from("a")), pure(Value::from("b")), pure(Value::from("c"))]);
        let haps = c.query(state01());
        assert_eq!(haps.len(), 3);
        assert_eq!(haps[0].part, TimeSpan::new(Rational::from_int(0), Rational::new(1, 3)));
        assert_eq!(c.get_steps(), Some(Rational::from_int(3)));
    }

    #[test]
    fn slowcat_never_skips_cycles_for_inner_sequences() {
        let inner = fastcat(vec![pure(Value::from(1.0)), pure(Value::from(2.0))]);
        let c = slowcat(vec![inner.clone(), pure(Value::from(99.0))]);
        let haps = c.query(State::new(TimeSpan::from_ints(0, 1)));
        assert_eq!(haps.len(), 2);
        assert_eq!(haps[0].value, Value::from(1.0));
        assert_eq!(haps[1].value, Value::from(2.0));
    }

    #[test]
    fn stack_left_pads_shorter_arms() {
        let short = pure(Value::from("a"));
        let long = fastcat(vec![pure(Value::from("x")), pure(Value::from("y"))]);
        let combined = stack_left(vec![short, long]);
        assert_eq!(combined.get_steps(), Some(Rational::from_int(2)));
    }
}
