//! The query context threaded into a pattern: the span being asked about,
//! plus any host-supplied control values.

use crate::timespan::TimeSpan;
use crate::value::Value;
use std::collections::HashMap;

#[derive(Clone)]
pub struct State {
    pub span: TimeSpan,
    pub controls: HashMap<String, Value>,
}

impl State {
    pub fn new(span: TimeSpan) -> Self {
        State {
            span,
            controls: HashMap::new(),
        }
    }

    pub fn with_controls(span: TimeSpan, controls: HashMap<String, Value>) -> Self {
        State { span, controls }
    }

    pub fn set_span(&self, span: TimeSpan) -> State {
        State {
            span,
            controls: self.controls.clone(),
        }
    }

    pub fn with_span<F>(&self, f: F) -> State
    where
        F: FnOnce(&TimeSpan) -> TimeSpan,
    {
        self.set_span(f(&self.span))
    }

    pub fn set_control(&self, key: impl Into<String>, value: Value) -> State {
        let mut controls = self.controls.clone();
        controls.insert(key.into(), value);
        State {
            span: self.span.clone(),
            controls,
        }
    }

    pub fn get_control(&self, key: &str) -> Option<&Value> {
        self.controls.get(key)
    }

    /// `cps` ("cycles per second") as read by `splice`/`fit`/`loopAt`, per
    /// `spec.md` §6. Defaults to `1.0` when the host hasn't supplied one.
    pub fn cps(&self) -> f64 {
        self.get_control("cps").and_then(Value::as_number).unwrap_or(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rational::Rational;

    #[test]
    fn controls_round_trip() {
        let span = TimeSpan::new(Rational::from_int(0), Rational::from_int(1));
        let state = State::new(span).set_control("tempo", Value::from(120.0));
        assert_eq!(state.get_control("tempo"), Some(&Value::from(120.0)));
    }

    #[test]
    fn default_cps_is_one() {
        let span = TimeSpan::new(Rational::from_int(0), Rational::from_int(1));
        let state = State::new(span);
        assert_eq!(state.cps(), 1.0);
    }
}
