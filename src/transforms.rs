//! Time transforms (`spec.md` §4.3): everything that reshapes a pattern's
//! timing without changing how many arms it has.

use crate::combinators::{nothing, pure, silence};
use crate::hap::Hap;
use crate::pattern::Pattern;
use crate::rational::Rational;
use crate::state::State;
use crate::timespan::TimeSpan;
use crate::value::Value;

/// `query(s) = p.query(s.mapTime(t -> k*t)).mapHapTime(t -> t/k)`.
/// `k = 0` degrades to `silence`.
pub fn fast(p: &Pattern, k: Rational) -> Pattern {
    if k.is_zero() {
        return silence();
    }
    let steps = p.get_steps().map(|s| s * k.clone());
    let forward = k.clone();
    let backward = k;
    p.clone()
        .with_query_time(move |t| t.clone() * forward.clone())
        .with_hap_time(move |t| t.clone() / backward.clone())
        .set_steps(steps)
}

pub fn slow(p: &Pattern, k: Rational) -> Pattern {
    if k.is_zero() {
        return silence();
    }
    fast(p, k.recip())
}

/// Time-shift earlier by `o`.
pub fn early(p: &Pattern, o: Rational) -> Pattern {
    let fwd = o.clone();
    let bwd = o;
    p.clone()
        .with_query_time(move |t| t.clone() + fwd.clone())
        .with_hap_time(move |t| t.clone() - bwd.clone())
}

pub fn late(p: &Pattern, o: Rational) -> Pattern {
    early(p, -o)
}

/// Reflect time across each cycle's midpoint.
pub fn rev(p: &Pattern) -> Pattern {
    let inner = p.clone();
    Pattern::with_steps(
        move |state: State| {
            state
                .span
                .span_cycles()
                .into_iter()
                .flat_map(|cycle_span| {
                    let cycle = cycle_span.begin.sam();
                    let next = cycle.clone() + Rational::from_int(1);
                    let reflect = move |t: &Rational| cycle.clone() + next.clone() - t.clone();
                    let reflected_query = TimeSpan::new(reflect(&cycle_span.end), reflect(&cycle_span.begin));
                    let queried = inner.query(state.set_span(reflected_query));
                    queried
                        .into_iter()
                        .map(|hap| {
                            hap.with_span(|ts| {
                                let (b, e) = (reflect(&ts.end), reflect(&ts.begin));
                                TimeSpan::new(b, e)
                            })
                        })
                        .collect::<Vec<_>>()
                })
                .collect()
        },
        p.get_steps(),
    )
}

/// Play `p` inside `[b,e]` of each cycle, silent outside. Degenerate
/// interval fails to `silence`.
pub fn compress(p: &Pattern, b: Rational, e: Rational) -> Pattern {
    if b < Rational::from_int(0) || e > Rational::from_int(1) || b >= e {
        return silence();
    }
    let span = e.clone() - b.clone();
    focus_raw(p, b, span)
}

fn focus_raw(p: &Pattern, b: Rational, span: Rational) -> Pattern {
    late(&fast(p, span.recip()), b)
}

/// One cycle of `p` compressed into `[0, 1/k]`, silence in `[1/k, 1]`.
pub fn fast_gap(p: &Pattern, k: Rational) -> Pattern {
    if k.is_zero() {
        return silence();
    }
    let inner = p.clone();
    let k2 = k.clone();
    Pattern::with_steps(
        move |state: State| {
            state
                .span
                .span_cycles()
                .into_iter()
                .flat_map(|cycle_span| {
                    let sam = cycle_span.begin.sam();
                    let munge = |t: &Rational| {
                        let pos = t.clone() - sam.clone();
                        sam.clone() + (pos * k2.clone()).min(&Rational::from_int(1))
                    };
                    let unmunge = |t: &Rational| sam.clone() + (t.clone() - sam.clone()) / k2.clone();
                    let mapped = TimeSpan::new(munge(&cycle_span.begin), munge(&cycle_span.end));
                    if mapped.is_empty() && !cycle_span.is_empty() {
                        return Vec::new();
                    }
                    inner
                        .query(state.set_span(mapped))
                        .into_iter()
                        .filter_map(|hap| {
                            let part = TimeSpan::new(unmunge(&hap.part.begin), unmunge(&hap.part.end));
                            if part.end > sam.clone() + Rational::from_int(1) {
                                return None;
                            }
                            let whole = hap.whole.as_ref().map(|w| TimeSpan::new(unmunge(&w.begin), unmunge(&w.end)));
                            Some(Hap::with_context(whole, part, hap.value.clone(), hap.context.clone()))
                        })
                        .collect::<Vec<_>>()
                })
                .collect()
        },
        p.get_steps(),
    )
}

/// `early(b.sam()) . fast(1/(e-b)) . late(b)` — like compress without a
/// gap, allowed to span more than one cycle.
pub fn focus(p: &Pattern, b: Rational, e: Rational) -> Pattern {
    let span = e - b.clone();
    if span.is_zero() {
        return silence();
    }
    early(&focus_raw(p, b.clone(), span), b.sam())
}

/// The `[b,e]` slice of `p`, played over one full cycle.
pub fn zoom(p: &Pattern, b: Rational, e: Rational) -> Pattern {
    let d = e.clone() - b.clone();
    if d.is_zero() || d.is_negative() {
        return nothing();
    }
    let steps = p.get_steps().map(|s| s * d.clone());
    let inner = p.clone();
    let d2 = d.clone();
    let b2 = b.clone();
    Pattern::with_steps(
        move |state: State| {
            let d = d2.clone();
            let b = b2.clone();
            state
                .span
                .span_cycles()
                .into_iter()
                .flat_map(move |cycle_span| {
                    let cyc = cycle_span.begin.sam();
                    let to_source = |t: &Rational| (t.clone() - cyc.clone()) * d.clone() + b.clone() + cyc.clone() * d.clone();
                    let from_source = |t: &Rational| (t.clone() - cyc.clone() * d.clone() - b.clone()) / d.clone() + cyc.clone();
                    let source_span = TimeSpan::new(to_source(&cycle_span.begin), to_source(&cycle_span.end));
                    inner
                        .query(state.set_span(source_span))
                        .into_iter()
                        .map(|hap| hap.with_span(|ts| TimeSpan::new(from_source(&ts.begin), from_source(&ts.end))))
                        .collect::<Vec<_>>()
                })
                .collect()
        },
        steps,
    )
}

/// Each event repeated `n` times inside its original span.
pub fn ply(p: &Pattern, n: Rational) -> Pattern {
    let steps = p.get_steps().map(|s| s * n.clone());
    let repeated = p.clone().fmap(move |v| Value::from(pure(v.clone()).fast_n(n.clone())));
    crate::join::squeeze_join(&repeated).set_steps(steps)
}

/// The `[0,t]` slice, looped. Negative `t` loops the tail.
pub fn linger(p: &Pattern, t: Rational) -> Pattern {
    if t.is_zero() {
        return p.clone();
    }
    if t.is_negative() {
        let one = Rational::from_int(1);
        fast_gap(&zoom(p, one.clone() + t.clone(), one), t.recip().abs())
    } else {
        fast_gap(&zoom(p, Rational::from_int(0), t.clone()), t.recip())
    }
}

/// On cycle `c`, shift by `c/n` (slowing, not fasting, the rotation).
pub fn iter(p: &Pattern, n: Rational) -> Pattern {
    iter_dir(p, n, false)
}

pub fn iter_back(p: &Pattern, n: Rational) -> Pattern {
    iter_dir(p, n, true)
}

fn iter_dir(p: &Pattern, n: Rational, backward: bool) -> Pattern {
    if n.is_zero() {
        return p.clone();
    }
    let steps = p.get_steps();
    let inner = p.clone();
    let n2 = n.clone();
    Pattern::with_steps(
        move |state: State| {
            let n = n2.clone();
            state
                .span
                .span_cycles()
                .into_iter()
                .flat_map(move |cycle_span| {
                    let c = cycle_span.begin.sam();
                    let offset = c.clone() % n.clone();
                    let offset = if backward { -offset } else { offset };
                    let shifted = early(&inner, offset / n.clone());
                    shifted.query(state.set_span(cycle_span))
                })
                .collect()
        },
        steps,
    )
}

/// Cycle `k` samples source cycle `⌊k/n⌋`.
pub fn repeat_cycles(p: &Pattern, n: Rational) -> Pattern {
    if n.is_zero() {
        return silence();
    }
    let inner = p.clone();
    Pattern::with_steps(
        move |state: State| {
            let n = n.clone();
            state
                .span
                .span_cycles()
                .into_iter()
                .flat_map(move |cycle_span| {
                    let c = cycle_span.begin.sam();
                    let source_cycle = (c.clone() / n.clone()).floor();
                    let offset = c - source_cycle;
                    inner
                        .query(state.set_span(cycle_span.shift(&-offset.clone())))
                        .into_iter()
                        .map(move |hap| hap.with_span(|ts| ts.shift(&offset)))
                        .collect::<Vec<_>>()
                })
                .collect()
        },
        p.get_steps(),
    )
}

/// Split `p` into `n` equal time-slices; on cycle `c` apply `f` to slice
/// `c mod n` only.
pub fn chunk<F>(p: &Pattern, n: i64, f: F) -> Pattern
where
    F: Fn(&Pattern) -> Pattern + Send + Sync + Clone + 'static,
{
    chunk_dir(p, n, f, false)
}

pub fn chunk_back<F>(p: &Pattern, n: i64, f: F) -> Pattern
where
    F: Fn(&Pattern) -> Pattern + Send + Sync + Clone + 'static,
{
    chunk_dir(p, n, f, true)
}

fn chunk_dir<F>(p: &Pattern, n: i64, f: F, backward: bool) -> Pattern
where
    F: Fn(&Pattern) -> Pattern + Send + Sync + Clone + 'static,
{
    if n <= 0 {
        return p.clone();
    }
    let inner = p.clone();
    let n_r = Rational::from_int(n);
    Pattern::with_steps(
        move |state: State| {
            let f = f.clone();
            let inner = inner.clone();
            let n_r = n_r.clone();
            state
                .span
                .span_cycles()
                .into_iter()
                .flat_map(move |cycle_span| {
                    let c = cycle_span.begin.sam().to_i64().unwrap_or(0);
                    let active = if backward { n - 1 - c.rem_euclid(n) } else { c.rem_euclid(n) };
                    let b = Rational::from_int(active) / n_r.clone();
                    let e = Rational::from_int(active + 1) / n_r.clone();
                    let applied = within(&inner, b, e, &f);
                    applied.query(state.set_span(cycle_span))
                })
                .collect()
        },
        p.get_steps(),
    )
}

/// Apply `f` on cycles whose index is `0 mod n`.
pub fn every<F>(p: &Pattern, n: i64, f: F) -> Pattern
where
    F: Fn(&Pattern) -> Pattern + Send + Sync + 'static,
{
    first_of(p, n, f)
}

pub fn first_of<F>(p: &Pattern, n: i64, f: F) -> Pattern
where
    F: Fn(&Pattern) -> Pattern + Send + Sync + 'static,
{
    when_cycle(p, n, 0, f)
}

pub fn last_of<F>(p: &Pattern, n: i64, f: F) -> Pattern
where
    F: Fn(&Pattern) -> Pattern + Send + Sync + 'static,
{
    when_cycle(p, n, n - 1, f)
}

fn when_cycle<F>(p: &Pattern, n: i64, target: i64, f: F) -> Pattern
where
    F: Fn(&Pattern) -> Pattern + Send + Sync + 'static,
{
    if n <= 0 {
        return p.clone();
    }
    let plain = p.clone();
    let applied = f(p);
    Pattern::with_steps(
        move |state: State| {
            state
                .span
                .span_cycles()
                .into_iter()
                .flat_map(|cycle_span| {
                    let c = cycle_span.begin.sam().to_i64().unwrap_or(0);
                    if c.rem_euclid(n) == target.rem_euclid(n) {
                        applied.query(state.set_span(cycle_span))
                    } else {
                        plain.query(state.set_span(cycle_span))
                    }
                })
                .collect()
        },
        p.get_steps(),
    )
}

/// `stack(p, f(p.late(t)))`.
pub fn off<F>(p: &Pattern, t: Rational, f: F) -> Pattern
where
    F: Fn(&Pattern) -> Pattern,
{
    crate::concat::stack(vec![p.clone(), f(&late(p, t))])
}

/// `cond ? f(p) : p`, `cond` evaluated at query time.
pub fn when<F>(p: &Pattern, cond: &Pattern, f: F) -> Pattern
where
    F: Fn(&Pattern) -> Pattern + Send + Sync + 'static,
{
    let plain = p.clone();
    let applied = f(p);
    let cond = cond.clone();
    Pattern::with_steps(
        move |state: State| {
            let active = cond.query(state.clone()).into_iter().next().map(|h| h.value.is_truthy()).unwrap_or(false);
            if active {
                applied.query(state)
            } else {
                plain.query(state)
            }
        },
        p.get_steps(),
    )
}

/// Partition haps by whether their onset cycle-position is in `[a,b]`;
/// apply `f` to the in-partition, stack with the out-partition.
pub fn within<F>(p: &Pattern, a: Rational, b: Rational, f: F) -> Pattern
where
    F: Fn(&Pattern) -> Pattern,
{
    let in_part = f(p).filter_onsets_in(a.clone(), b.clone());
    let out_part = p.clone().filter_onsets_out(a, b);
    crate::concat::stack(vec![in_part, out_part])
}

pub fn inside<F>(p: &Pattern, n: Rational, f: F) -> Pattern
where
    F: Fn(&Pattern) -> Pattern,
{
    fast(&f(&slow(p, n.clone())), n)
}

pub fn outside<F>(p: &Pattern, n: Rational, f: F) -> Pattern
where
    F: Fn(&Pattern) -> Pattern,
{
    slow(&f(&fast(p, n.clone())), n)
}

/// Cut `cycles` cycles starting at `offset` and loop them.
pub fn ribbon(p: &Pattern, offset: Rational, cycles: Rational) -> Pattern {
    let onset_pat = fast(&pure(Value::from(1.0)), cycles.recip());
    crate::join::restart_join(&crate::applicative::app_left(
        &early(p, offset),
        &onset_pat,
        crate::applicative::keep_op(),
    ))
}

/// Discretize a continuous pattern: structure it with `pure(true).fast(n)`.
pub fn segment(p: &Pattern, n: Rational) -> Pattern {
    let structure = fast(&pure(Value::Bool(true)), n);
    crate::applicative::app_left(&structure, p, crate::applicative::set_op()).set_steps(Some(n))
}

impl Pattern {
    pub fn fast_n(&self, k: Rational) -> Pattern {
        fast(self, k)
    }

    fn filter_onsets_in(self, a: Rational, b: Rational) -> Pattern {
        self.with_haps(move |haps| {
            haps.into_iter()
                .filter(|h| h.has_onset() && h.part.begin.cycle_pos() >= a && h.part.begin.cycle_pos() < b)
                .collect()
        })
    }

    fn filter_onsets_out(self, a: Rational, b: Rational) -> Pattern {
        self.with_haps(move |haps| {
            haps.into_iter()
                .filter(|h| !(h.has_onset() && h.part.begin.cycle_pos() >= a && h.part.begin.cycle_pos() < b))
                .collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state01() -> State {
        State::new(TimeSpan::from_ints(0, 1))
    }

    #[test]
    fn fast_scales_both_directions() {
        let p = pure(Value::from(1.0));
        let fast2 = fast(&p, Rational::from_int(2));
        let haps = fast2.query(state01());
        assert_eq!(haps.len(), 2);
        assert_eq!(haps[0].whole, Some(TimeSpan::new(Rational::from_int(0), Rational::new(1, 2))));
    }

    #[test]
    fn fast_zero_is_silence() {
        let p = pure(Value::from(1.0));
        assert!(fast(&p, Rational::from_int(0)).query(state01()).is_empty());
    }

    #[test]
    fn slow_is_fast_reciprocal() {
        let p = pure(Value::from(1.0));
        let slow2 = slow(&p, Rational::from_int(2));
        let haps = slow2.query(State::new(TimeSpan::from_ints(0, 2)));
        assert_eq!(haps.len(), 1);
        assert_eq!(haps[0].whole, Some(TimeSpan::from_ints(0, 2)));
    }

    #[test]
    fn rev_reflects_fastcat() {
        let p = crate::concat::fastcat(vec![pure(Value::from(1.0)), pure(Value::from(2.0))]);
        let reversed = rev(&p);
        let haps = reversed.query(state01());
        assert_eq!(haps.len(), 2);
        assert_eq!(haps[0].value, Value::from(2.0));
        assert_eq!(haps[1].value, Value::from(1.0));
    }

    #[test]
    fn compress_is_silent_outside_window() {
        let p = pure(Value::from(1.0));
        let compressed = compress(&p, Rational::new(1, 4), Rational::new(3, 4));
        let haps = compressed.query(state01());
        assert_eq!(haps.len(), 1);
        assert_eq!(haps[0].part, TimeSpan::new(Rational::new(1, 4), Rational::new(3, 4)));
    }

    #[test]
    fn zoom_scales_steps() {
        let p = crate::concat::fastcat(vec![pure(Value::from(1.0)); 4]);
        let zoomed = zoom(&p, Rational::new(1, 4), Rational::new(3, 4));
        assert_eq!(zoomed.get_steps(), Some(Rational::new(1, 2)));
    }

    #[test]
    fn every_applies_on_matching_cycles() {
        let p = pure(Value::from(1.0));
        let every_other = every(&p, 2, |p| p.clone().fmap(|_| Value::from(99.0)));
        let haps0 = every_other.query(state01());
        assert_eq!(haps0[0].value, Value::from(99.0));
        let haps1 = every_other.query(State::new(TimeSpan::from_ints(1, 2)));
        assert_eq!(haps1[0].value, Value::from(1.0));
    }
}
