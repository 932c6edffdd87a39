//! Half-open time intervals `[begin, end)`.

use crate::rational::Rational;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A half-open interval of time. `begin <= end` is an invariant every
/// combinator in this crate preserves.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeSpan {
    pub begin: Rational,
    pub end: Rational,
}

impl TimeSpan {
    pub fn new(begin: Rational, end: Rational) -> Self {
        TimeSpan { begin, end }
    }

    pub fn from_ints(begin: i64, end: i64) -> Self {
        TimeSpan::new(Rational::from_int(begin), Rational::from_int(end))
    }

    pub fn duration(&self) -> Rational {
        self.end.clone() - self.begin.clone()
    }

    pub fn is_empty(&self) -> bool {
        self.begin == self.end
    }

    pub fn contains(&self, t: &Rational) -> bool {
        t >= &self.begin && t < &self.end
    }

    /// Map a function over both endpoints.
    pub fn with_time<F>(&self, f: F) -> TimeSpan
    where
        F: Fn(&Rational) -> Rational,
    {
        TimeSpan::new(f(&self.begin), f(&self.end))
    }

    pub fn shift(&self, offset: &Rational) -> TimeSpan {
        self.with_time(|t| t.clone() + offset.clone())
    }

    /// Intersection of two spans. Adjacent spans (sharing only an endpoint)
    /// do not intersect — an empty overlap is `None`, not a zero-width span,
    /// per `spec.md` §3.
    pub fn intersection(&self, other: &TimeSpan) -> Option<TimeSpan> {
        let begin = self.begin.max(&other.begin);
        let end = self.end.min(&other.end);
        if begin < end {
            Some(TimeSpan::new(begin, end))
        } else {
            None
        }
    }

    /// Split at every integer boundary strictly inside `(begin, end)`,
    /// yielding the ordered list of sub-spans whose concatenation equals
    /// `self`.
    pub fn span_cycles(&self) -> Vec<TimeSpan> {
        if self.begin >= self.end {
            return vec![self.clone()];
        }

        let mut spans = Vec::new();
        let mut begin = self.begin.clone();
        while begin < self.end {
            let next_sam = begin.next_sam();
            let end = next_sam.min(&self.end);
            spans.push(TimeSpan::new(begin.clone(), end.clone()));
            begin = end;
        }
        spans
    }

    /// Shift the span by the sam (cycle start) of `begin`, so its begin
    /// becomes cycle-relative. Does not clamp `end` — a span already
    /// spanning multiple cycles stays multi-cycle, just renumbered.
    pub fn cycle_arc(&self) -> TimeSpan {
        let sam = self.begin.sam();
        TimeSpan::new(self.begin.clone() - sam.clone(), self.end.clone() - sam)
    }

    pub fn with_cycle(&self, cycle: &Rational) -> TimeSpan {
        TimeSpan::new(self.begin.clone() + cycle.clone(), self.end.clone() + cycle.clone())
    }
}

impl fmt::Display for TimeSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.begin, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intersection_basic() {
        let a = TimeSpan::from_ints(0, 2);
        let b = TimeSpan::from_ints(1, 3);
        let i = a.intersection(&b).unwrap();
        assert_eq!(i, TimeSpan::from_ints(1, 2));
    }

    #[test]
    fn adjacent_spans_do_not_intersect() {
        let a = TimeSpan::from_ints(0, 1);
        let b = TimeSpan::from_ints(1, 2);
        assert_eq!(a.intersection(&b), None);
    }

    #[test]
    fn span_cycles_splits_at_integers() {
        let span = TimeSpan::new(Rational::new(1, 2), Rational::new(5, 2));
        let cycles = span.span_cycles();
        assert_eq!(
            cycles,
            vec![
                TimeSpan::new(Rational::new(1, 2), Rational::from_int(1)),
                TimeSpan::new(Rational::from_int(1), Rational::from_int(2)),
                TimeSpan::new(Rational::from_int(2), Rational::new(5, 2)),
            ]
        );
    }

    #[test]
    fn span_cycles_concatenate_to_original() {
        let span = TimeSpan::new(Rational::new(-1, 2), Rational::new(7, 3));
        let cycles = span.span_cycles();
        assert_eq!(cycles.first().unwrap().begin, span.begin);
        assert_eq!(cycles.last().unwrap().end, span.end);
        for w in cycles.windows(2) {
            assert_eq!(w[0].end, w[1].begin);
        }
    }

    #[test]
    fn cycle_arc_shifts_by_the_begin_sam() {
        let span = TimeSpan::new(Rational::new(5, 2), Rational::from_int(4));
        let arc = span.cycle_arc();
        assert_eq!(arc, TimeSpan::new(Rational::new(1, 2), Rational::from_int(2)));
    }
}
