//! Operator registration (`spec.md` §4.9): the mechanism that lifts a plain
//! Rust function over `Value`s into a pattern-level combinator that
//! "patternifies" its non-final arguments, auto-sequences multi-argument
//! calls, and takes a fast path when every lifted argument turns out to be
//! `pure`.
//!
//! Also carries the control registry from §9: a process-wide alias ->
//! canonical-name table (installed once on `Runtime`, per its
//! install-once discipline) plus the record constructor every control
//! method (`note`, `s`, `gain`, ...) boils down to.

use crate::applicative::app_left;
use crate::join::{join, JoinKind};
use crate::pattern::Pattern;
use crate::runtime::Runtime;
use crate::value::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// `(nonFinalArgValues, targetPattern) -> Pattern`. The target is always
/// the pattern the method is called on (`self` in the method-call reading
/// of `spec.md` §4.9) and is never itself patternified — only the other
/// arguments are.
pub type PatternifiedFn = Arc<dyn Fn(&[Value], &Pattern) -> Pattern + Send + Sync>;

pub struct Registration {
    pub name: String,
    pub f: PatternifiedFn,
    pub patternify: bool,
    pub preserve_steps: bool,
    pub join: JoinKind,
}

impl Registration {
    pub fn new(name: impl Into<String>, f: PatternifiedFn) -> Self {
        Registration { name: name.into(), f, patternify: true, preserve_steps: false, join: JoinKind::Inner }
    }

    pub fn patternify(mut self, patternify: bool) -> Self {
        self.patternify = patternify;
        self
    }

    pub fn preserve_steps(mut self, preserve_steps: bool) -> Self {
        self.preserve_steps = preserve_steps;
        self
    }

    pub fn join(mut self, join: JoinKind) -> Self {
        self.join = join;
        self
    }

    /// Apply this registration to already-reified argument patterns and a
    /// target pattern.
    pub fn apply(&self, args: &[Pattern], target: &Pattern) -> Pattern {
        apply_registered(args, target, &self.f, self.patternify, self.preserve_steps, self.join)
    }
}

fn list_of(v: &Value) -> Vec<Value> {
    v.as_list().map(<[Value]>::to_vec).unwrap_or_default()
}

/// The general mechanism: when `patternify` is off, arguments are assumed
/// to already be plain (non-pattern) values and `f` is called directly.
/// When it's on, a fast path extracts the underlying values if every
/// argument happens to be `pure`; otherwise each argument pattern is
/// folded into the previous one via `appLeft` (left-most argument's
/// structure dominates, matching the source text's left fold), producing
/// one pattern whose value at each point is the full argument list, which
/// is then `fmap`ped into `f(..)` and collapsed with the registration's
/// join.
pub fn apply_registered(
    args: &[Pattern],
    target: &Pattern,
    f: &PatternifiedFn,
    patternify: bool,
    preserve_steps: bool,
    join_kind: JoinKind,
) -> Pattern {
    let finish = |mut result: Pattern| {
        if preserve_steps {
            result = result.set_steps(target.get_steps());
        }
        result
    };

    if !patternify {
        let values: Vec<Value> = args.iter().map(|p| p.pure_value().cloned().unwrap_or(Value::Silence)).collect();
        return finish(f(&values, target));
    }

    if let Some(values) = args.iter().map(|p| p.pure_value().cloned()).collect::<Option<Vec<_>>>() {
        return finish(f(&values, target));
    }

    if args.is_empty() {
        return finish(f(&[], target));
    }

    let first = args[0].clone().fmap(|v| Value::List(vec![v.clone()]));
    let combined = args[1..].iter().fold(first, |acc, p| {
        app_left(
            &acc,
            p,
            Arc::new(|a, b| {
                let mut values = list_of(a);
                values.push(b.clone());
                Value::List(values)
            }),
        )
    });

    let target_for_closure = target.clone();
    let f = f.clone();
    let nested = combined.fmap(move |v| Value::from(f(&list_of(v), &target_for_closure)));
    finish(join(join_kind, &nested))
}

/// Builds the process-wide alias -> canonical-name map from a list of
/// `(canonical, [aliases...])` pairs, ready to install via
/// `Runtime::with_control_aliases`.
pub fn build_control_aliases(entries: &[(&str, &[&str])]) -> std::collections::HashMap<String, String> {
    let mut map = std::collections::HashMap::new();
    for (canonical, aliases) in entries {
        map.insert((*canonical).to_string(), (*canonical).to_string());
        for alias in *aliases {
            map.insert((*alias).to_string(), (*canonical).to_string());
        }
    }
    map
}

/// The constructor every control method reduces to (`spec.md` §9): wrap
/// `value` as `{ canonicalName: value }`, resolving `name` through the
/// installed alias table. If `value` is itself a `Map` (a record carrying
/// extra properties alongside the primary field), its fields are merged
/// in rather than nested.
pub fn control_value(name: &str, value: Value) -> Value {
    let canonical = Runtime::current().canonical_control(name).to_string();
    match value {
        Value::Map(extra) => {
            let mut m = extra;
            if !m.contains_key(&canonical) {
                m.insert(canonical, Value::Silence);
            }
            Value::Map(m)
        }
        other => {
            let mut m = BTreeMap::new();
            m.insert(canonical, other);
            Value::Map(m)
        }
    }
}

/// `p.withControl(name, valuePattern)`: patternify `valuePattern` and
/// fmap each of its values into a control record via `control_value`,
/// then mix with `p` via `appLeft` (left/`in`-dominant — `p`'s own
/// structure is preserved, the control rides along).
pub fn with_control(name: &str, value_pattern: &Pattern, p: &Pattern) -> Pattern {
    let name = name.to_string();
    let records = value_pattern.clone().fmap(move |v| control_value(&name, v.clone()));
    app_left(p, &records, crate::applicative::union_op())
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

    fn add_fn() -> PatternifiedFn {
        Arc::new(|args, target| {
            let n = args.first().and_then(Value::as_number).unwrap_or(0.0);
            target.clone().fmap(move |v| Value::from(v.as_number().unwrap_or(0.0) + n))
        })
    }

    #[test]
    fn pure_argument_takes_fast_path() {
        let reg = Registration::new("addN", add_fn());
        let target = pure(Value::from(1.0));
        let arg = pure(Value::from(4.0));
        let result = reg.apply(&[arg], &target);
        let haps = result.query(state01());
        assert_eq!(haps[0].value, Value::from(5.0));
    }

    #[test]
    fn patterned_argument_auto_sequences() {
        let reg = Registration::new("addN", add_fn());
        let target = pure(Value::from(1.0));
        let arg = fastcat(vec![pure(Value::from(10.0)), pure(Value::from(20.0))]);
        let result = reg.apply(&[arg], &target);
        let haps = result.query(state01());
        assert_eq!(haps.len(), 2);
        assert_eq!(haps[0].value, Value::from(11.0));
        assert_eq!(haps[1].value, Value::from(21.0));
    }

    #[test]
    fn control_value_wraps_under_canonical_name() {
        let v = control_value("s", Value::from("bd"));
        let m = v.as_map().unwrap();
        assert_eq!(m.get("s"), Some(&Value::from("bd")));
    }

    #[test]
    fn with_control_preserves_left_structure() {
        let p = fastcat(vec![pure(Value::from("bd")), pure(Value::from("sn"))]);
        let note = pure(Value::from(60.0));
        let with_note = with_control("note", &note, &p.clone().fmap(|v| {
            let mut m = BTreeMap::new();
            m.insert("s".to_string(), v.clone());
            Value::Map(m)
        }));
        let haps = with_note.query(state01());
        assert_eq!(haps.len(), 2);
        assert!(haps[0].value.as_map().unwrap().contains_key("note"));
    }
}
