//! The core `Pattern` type: a pure query function `State -> Vec<Hap>`,
//! plus the `steps` sideband and the two `__pure`/`__pure_loc` fields used
//! to shortcut re-querying constant patterns and to preserve source
//! locations through registration (`spec.md` §3).

use crate::error::{PatternError, Result};
use crate::hap::Hap;
use crate::rational::Rational;
use crate::runtime::Runtime;
use crate::state::State;
use crate::timespan::TimeSpan;
use crate::value::Value;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// A time-varying sequence of values: a query function together with an
/// optional stepwise length.
pub struct Pattern {
    query_func: Arc<dyn Fn(State) -> Vec<Hap> + Send + Sync>,
    steps: Option<Rational>,
    /// The constant value, if this pattern was built by `pure` — lets
    /// `appLeft`/`appRight`/registration special-case constant arguments
    /// without re-querying them.
    pure_value: Option<Value>,
    /// Source location of the `pure` call that produced this pattern, if
    /// known, preserved through registration so diagnostics/highlighting
    /// can point back at user code.
    pure_location: Option<String>,
}

impl Pattern {
    pub fn new<F>(query_func: F) -> Self
    where
        F: Fn(State) -> Vec<Hap> + Send + Sync + 'static,
    {
        Pattern {
            query_func: Arc::new(query_func),
            steps: None,
            pure_value: None,
            pure_location: None,
        }
    }

    pub fn with_steps<F>(query_func: F, steps: Option<Rational>) -> Self
    where
        F: Fn(State) -> Vec<Hap> + Send + Sync + 'static,
    {
        Pattern {
            query_func: Arc::new(query_func),
            steps: crate::runtime::gate_steps(steps),
            pure_value: None,
            pure_location: None,
        }
    }

    /// Mark this pattern as the result of `pure(value)`.
    pub(crate) fn mark_pure(mut self, value: Value, location: Option<String>) -> Self {
        self.pure_value = Some(value);
        self.pure_location = location;
        self
    }

    pub fn pure_value(&self) -> Option<&Value> {
        self.pure_value.as_ref()
    }

    pub fn pure_location(&self) -> Option<&str> {
        self.pure_location.as_deref()
    }

    pub fn is_pure(&self) -> bool {
        self.pure_value.is_some()
    }

    /// Query this pattern directly. Any panic raised inside a user-supplied
    /// callback reachable from `query_func` is caught here, logged, and
    /// degrades to an empty result — `spec.md` §7 ("Query-callback
    /// exception... caught at queryArc, logged, empty list returned for
    /// that query only"). No other in-flight query is affected.
    pub fn query(&self, state: State) -> Vec<Hap> {
        let query_func = self.query_func.clone();
        let result = panic::catch_unwind(AssertUnwindSafe(|| query_func(state)));
        match result {
            Ok(haps) => haps,
            Err(payload) => {
                let message = panic_message(&payload);
                Runtime::current().error(format!("pattern query panicked: {message}"));
                Vec::new()
            }
        }
    }

    /// The public, validated entry point (`spec.md` §6): `begin < end` is
    /// required and enforced here as a programmer error, not silently
    /// corrected.
    pub fn query_arc(&self, begin: Rational, end: Rational, controls: std::collections::HashMap<String, Value>) -> Result<Vec<Hap>> {
        if begin >= end {
            return Err(PatternError::InvalidRange {
                begin: begin.to_string(),
                end: end.to_string(),
            });
        }
        let state = State::with_controls(TimeSpan::new(begin, end), controls);
        Ok(self.query(state))
    }

    pub fn get_steps(&self) -> Option<Rational> {
        self.steps.clone()
    }

    pub fn set_steps(mut self, steps: Option<Rational>) -> Self {
        self.steps = crate::runtime::gate_steps(steps);
        self
    }

    /// Functor map (`fmap`): transform every event's value, preserving
    /// structure and `steps`.
    pub fn fmap<F>(self, f: F) -> Pattern
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        let query_func = self.query_func.clone();
        let steps = self.steps.clone();
        Pattern {
            query_func: Arc::new(move |state| query_func(state).into_iter().map(|hap| hap.with_value(&f)).collect()),
            steps,
            pure_value: self.pure_value.as_ref().map(&f),
            pure_location: self.pure_location.clone(),
        }
    }

    pub fn with_query_time<F>(self, f: F) -> Pattern
    where
        F: Fn(&Rational) -> Rational + Send + Sync + 'static,
    {
        let query_func = self.query_func.clone();
        let steps = self.steps.clone();
        Pattern {
            query_func: Arc::new(move |state| {
                let new_span = state.span.with_time(&f);
                query_func(state.set_span(new_span))
            }),
            steps,
            pure_value: None,
            pure_location: None,
        }
    }

    pub fn with_hap_time<F>(self, f: F) -> Pattern
    where
        F: Fn(&Rational) -> Rational + Send + Sync + 'static,
    {
        let query_func = self.query_func.clone();
        let steps = self.steps.clone();
        Pattern {
            query_func: Arc::new(move |state| {
                query_func(state).into_iter().map(|hap| hap.with_span(|ts| ts.with_time(&f))).collect()
            }),
            steps,
            pure_value: None,
            pure_location: None,
        }
    }

    pub fn with_hap<F>(self, f: F) -> Pattern
    where
        F: Fn(&Hap) -> Hap + Send + Sync + 'static,
    {
        let query_func = self.query_func.clone();
        let steps = self.steps.clone();
        Pattern {
            query_func: Arc::new(move |state| query_func(state).into_iter().map(|hap| f(&hap)).collect()),
            steps,
            pure_value: None,
            pure_location: None,
        }
    }

    pub fn with_haps<F>(self, f: F) -> Pattern
    where
        F: Fn(Vec<Hap>) -> Vec<Hap> + Send + Sync + 'static,
    {
        let query_func = self.query_func.clone();
        let steps = self.steps.clone();
        Pattern {
            query_func: Arc::new(move |state| f(query_func(state))),
            steps,
            pure_value: None,
            pure_location: None,
        }
    }

    /// Filter events by value, keeping structure otherwise intact.
    pub fn filter_values<F>(self, pred: F) -> Pattern
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.with_haps(move |haps| haps.into_iter().filter(|h| pred(&h.value)).collect())
    }

    pub fn filter_onsets(self) -> Pattern {
        self.with_haps(|haps| haps.into_iter().filter(|h| h.has_onset()).collect())
    }

    /// Issue the query once per integer-split sub-span of the requested
    /// span, so patterns that need to know about cycle boundaries (most of
    /// them) never have to re-derive the split themselves.
    pub fn split_queries(self) -> Pattern {
        let query_func = self.query_func.clone();
        let steps = self.steps.clone();
        Pattern {
            query_func: Arc::new(move |state| {
                state
                    .span
                    .span_cycles()
                    .into_iter()
                    .flat_map(|cycle_span| query_func(state.set_span(cycle_span)))
                    .collect()
            }),
            steps,
            pure_value: None,
            pure_location: None,
        }
    }
}

impl Clone for Pattern {
    fn clone(&self) -> Self {
        Pattern {
            query_func: self.query_func.clone(),
            steps: self.steps.clone(),
            pure_value: self.pure_value.clone(),
            pure_location: self.pure_location.clone(),
        }
    }
}

fn panic_message(payload: &Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combinators::pure;

    fn state01() -> State {
        State::new(TimeSpan::from_ints(0, 1))
    }

    #[test]
    fn fmap_preserves_steps() {
        let p = pure(Value::from(1.0)).fmap(|v| Value::from(v.as_number().unwrap() + 1.0));
        assert_eq!(p.get_steps(), Some(Rational::from_int(1)));
        let haps = p.query(state01());
        assert_eq!(haps[0].value, Value::from(2.0));
    }

    #[test]
    fn query_arc_rejects_empty_range() {
        let p = pure(Value::from(1.0));
        let err = p.query_arc(Rational::from_int(1), Rational::from_int(1), Default::default());
        assert!(err.is_err());
    }

    #[test]
    fn query_catches_panics() {
        let p = Pattern::new(|_state| panic!("boom"));
        let haps = p.query(state01());
        assert!(haps.is_empty());
    }

    #[test]
    fn split_queries_splits_at_cycle_boundaries() {
        let p = Pattern::new(|state| vec![Hap::new(Some(state.span.clone()), state.span, Value::from(1.0))]).split_queries();
        let span = TimeSpan::new(Rational::new(1, 2), Rational::new(3, 2));
        let haps = p.query(State::new(span));
        assert_eq!(haps.len(), 2);
    }
}
