//! Continuous waveform sources (`spec.md` §4.6), built on the generic
//! `signal` constructor in `combinators.rs`.

use crate::combinators::signal;
use crate::pattern::Pattern;
use crate::rational::Rational;
use crate::value::Value;

const TAU: f64 = std::f64::consts::PI * 2.0;

pub fn to_bipolar(x: f64) -> f64 {
    x * 2.0 - 1.0
}

pub fn from_bipolar(x: f64) -> f64 {
    (x + 1.0) / 2.0
}

fn cycle_pos(t: &Rational) -> f64 {
    t.cycle_pos().to_float()
}

pub fn sine() -> Pattern {
    signal(|t| Value::from(from_bipolar((TAU * cycle_pos(t)).sin())))
}

pub fn cosine() -> Pattern {
    signal(|t| Value::from(from_bipolar((TAU * cycle_pos(t)).cos())))
}

pub fn saw() -> Pattern {
    signal(|t| Value::from(cycle_pos(t)))
}

pub fn isaw() -> Pattern {
    signal(|t| Value::from(1.0 - cycle_pos(t)))
}

pub fn square() -> Pattern {
    signal(|t| Value::from(if cycle_pos(t) < 0.5 { 0.0 } else { 1.0 }))
}

pub fn tri() -> Pattern {
    signal(|t| {
        let x = cycle_pos(t);
        Value::from(if x < 0.5 { x * 2.0 } else { 2.0 - x * 2.0 })
    })
}

pub fn itri() -> Pattern {
    signal(|t| {
        let x = cycle_pos(t);
        Value::from(if x < 0.5 { 1.0 - x * 2.0 } else { x * 2.0 - 1.0 })
    })
}

pub fn sine2() -> Pattern {
    sine().fmap(|v| Value::from(to_bipolar(v.as_number().unwrap_or(0.5))))
}

pub fn cosine2() -> Pattern {
    cosine().fmap(|v| Value::from(to_bipolar(v.as_number().unwrap_or(0.5))))
}

pub fn saw2() -> Pattern {
    saw().fmap(|v| Value::from(to_bipolar(v.as_number().unwrap_or(0.5))))
}

pub fn isaw2() -> Pattern {
    isaw().fmap(|v| Value::from(to_bipolar(v.as_number().unwrap_or(0.5))))
}

pub fn tri2() -> Pattern {
    tri().fmap(|v| Value::from(to_bipolar(v.as_number().unwrap_or(0.5))))
}

pub fn square2() -> Pattern {
    square().fmap(|v| Value::from(to_bipolar(v.as_number().unwrap_or(0.5))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::State;
    use crate::timespan::TimeSpan;

    fn sample(p: &Pattern, t: Rational) -> f64 {
        let span = TimeSpan::new(t.clone(), t + Rational::new(1, 1000));
        p.query(State::new(span))[0].value.as_number().unwrap()
    }

    #[test]
    fn saw_ramps_zero_to_one_across_cycle() {
        let p = saw();
        assert!((sample(&p, Rational::from_int(0)) - 0.0).abs() < 1e-9);
        assert!((sample(&p, Rational::new(1, 2)) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn sine_is_half_at_quarter_cycle() {
        let p = sine();
        let v = sample(&p, Rational::new(1, 4));
        assert!((v - 1.0).abs() < 1e-6);
    }

    #[test]
    fn bipolar_roundtrips_unipolar() {
        assert!((to_bipolar(from_bipolar(0.3)) - 0.3).abs() < 1e-12);
    }

    #[test]
    fn square_switches_at_midpoint() {
        let p = square();
        assert_eq!(sample(&p, Rational::new(1, 4)), 0.0);
        assert_eq!(sample(&p, Rational::new(3, 4)), 1.0);
    }
}
