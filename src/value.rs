//! Values that flow through patterns.

use crate::pattern::Pattern;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A value carried by a Hap.
///
/// `Map` is the lightweight control-record type `spec.md` §9 calls for:
/// the `{name: value, ...}` dictionaries produced by control combinators
/// (`chop`, `splice`, `target`, ...), using a `BTreeMap` so field merges
/// are deterministic. `Pattern` lets a pattern-of-patterns exist as an
/// ordinary value, which is what the six joins (`join.rs`) operate on.
#[derive(Clone)]
pub enum Value {
    Number(f64),
    String(String),
    Bool(bool),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
    Pattern(Arc<Pattern>),
    Silence,
}

impl Value {
    pub fn is_silence(&self) -> bool {
        matches!(self, Value::Silence)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(list) => Some(list),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_pattern(&self) -> Option<&Arc<Pattern>> {
        match self {
            Value::Pattern(p) => Some(p),
            _ => None,
        }
    }

    /// "Truthy" per `spec.md` §4.3 (`struct`/`mask`): 0 and empty string are
    /// false, `"~"` (mini-notation's rest marker) is false, empty lists and
    /// `Silence` are false, everything else is true.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Number(n) => *n != 0.0,
            Value::String(s) => !s.is_empty() && s != "~",
            Value::Bool(b) => *b,
            Value::List(l) => !l.is_empty(),
            Value::Map(m) => !m.is_empty(),
            Value::Pattern(_) => true,
            Value::Silence => false,
        }
    }

    /// Coerce to a number the way numeric matrix operators do: parse
    /// strings, pass numbers through, booleans to 0/1.
    pub fn parse_numeral(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    /// Right-biased field merge of two control records (`spec.md` §4.8):
    /// fields present on `other` override `self`; fields unique to either
    /// side are preserved.
    pub fn union_with(&self, other: &Value) -> Value {
        match (self, other) {
            (Value::Map(a), Value::Map(b)) => {
                let mut merged = a.clone();
                for (k, v) in b {
                    merged.insert(k.clone(), v.clone());
                }
                Value::Map(merged)
            }
            _ => other.clone(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Pattern(a), Value::Pattern(b)) => Arc::ptr_eq(a, b),
            (Value::Silence, Value::Silence) => true,
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "Number({n})"),
            Value::String(s) => write!(f, "String({s:?})"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::List(l) => write!(f, "List({l:?})"),
            Value::Map(m) => write!(f, "Map({m:?})"),
            Value::Pattern(_) => write!(f, "Pattern(..)"),
            Value::Silence => write!(f, "Silence"),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{n}"),
            Value::String(s) => write!(f, "{s}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Map(m) => {
                write!(f, "{{")?;
                for (i, (k, v)) in m.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
            Value::Pattern(_) => write!(f, "<pattern>"),
            Value::Silence => write!(f, "~"),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(list: Vec<Value>) -> Self {
        Value::List(list)
    }
}

impl From<Pattern> for Value {
    fn from(p: Pattern) -> Self {
        Value::Pattern(Arc::new(p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthiness() {
        assert!(Value::from(1.0).is_truthy());
        assert!(!Value::from(0.0).is_truthy());
        assert!(!Value::from("~").is_truthy());
        assert!(!Value::from("").is_truthy());
        assert!(Value::from("bd").is_truthy());
        assert!(!Value::Silence.is_truthy());
    }

    #[test]
    fn union_is_right_biased() {
        let mut a = BTreeMap::new();
        a.insert("note".to_string(), Value::from(60.0));
        a.insert("gain".to_string(), Value::from(1.0));

        let mut b = BTreeMap::new();
        b.insert("note".to_string(), Value::from(64.0));

        let merged = Value::Map(a).union_with(&Value::Map(b));
        let m = merged.as_map().unwrap();
        assert_eq!(m.get("note"), Some(&Value::from(64.0)));
        assert_eq!(m.get("gain"), Some(&Value::from(1.0)));
    }

    #[test]
    fn parse_numeral_from_string() {
        assert_eq!(Value::from("3.5").parse_numeral(), Some(3.5));
        assert_eq!(Value::from("nope").parse_numeral(), None);
    }
}
