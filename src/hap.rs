//! Events ("Haps"): a value active during a timespan, plus the context bag
//! that rides along with it.

use crate::rational::Rational;
use crate::timespan::TimeSpan;
use crate::value::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// The clock a host supplies when firing `onTrigger` callbacks: the
/// wall-clock time the trigger actually fires at, the current cycles-per-
/// second, and the time the event was scheduled for (`spec.md` §6).
#[derive(Clone, Debug, PartialEq)]
pub struct TriggerClock {
    pub current_time: Rational,
    pub cps: Rational,
    pub target_time: Rational,
}

pub type TriggerCallback = Arc<dyn Fn(&TriggerClock, &Hap) + Send + Sync>;

/// Context metadata that accumulates, append-only, as a Hap is passed
/// through combinators: source locations, free-form tags, chained
/// `onTrigger` callbacks, an optional display color, and a generic
/// extension map for anything else a host wants to stash.
#[derive(Clone)]
pub struct Context {
    pub locations: Vec<String>,
    pub tags: Vec<String>,
    pub on_trigger: Vec<TriggerCallback>,
    pub color: Option<String>,
    pub metadata: HashMap<String, Value>,
}

impl Context {
    pub fn new() -> Self {
        Context {
            locations: Vec::new(),
            tags: Vec::new(),
            on_trigger: Vec::new(),
            color: None,
            metadata: HashMap::new(),
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.locations.push(location.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn with_trigger(mut self, cb: TriggerCallback) -> Self {
        self.on_trigger.push(cb);
        self
    }

    /// Combine two contexts. Locations and tags concatenate; `onTrigger`
    /// callbacks chain so that `self`'s callbacks fire before `other`'s;
    /// metadata is merged right-biased (`other` wins on key collision);
    /// `color` prefers `self`, falling back to `other`.
    pub fn combine(&self, other: &Context) -> Context {
        let mut locations = self.locations.clone();
        locations.extend(other.locations.clone());

        let mut tags = self.tags.clone();
        tags.extend(other.tags.clone());

        let mut on_trigger = self.on_trigger.clone();
        on_trigger.extend(other.on_trigger.clone());

        let mut metadata = self.metadata.clone();
        for (k, v) in &other.metadata {
            metadata.insert(k.clone(), v.clone());
        }

        Context {
            locations,
            tags,
            on_trigger,
            color: self.color.clone().or_else(|| other.color.clone()),
            metadata,
        }
    }

    /// Fire every chained `onTrigger` callback, in order, against `hap`.
    pub fn fire_triggers(&self, clock: &TriggerClock, hap: &Hap) {
        for cb in &self.on_trigger {
            cb(clock, hap);
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("locations", &self.locations)
            .field("tags", &self.tags)
            .field("on_trigger_count", &self.on_trigger.len())
            .field("color", &self.color)
            .field("metadata", &self.metadata)
            .finish()
    }
}

impl PartialEq for Context {
    /// Callbacks are not comparable; equality only considers the data
    /// fields, which is all test code ever needs to assert on.
    fn eq(&self, other: &Self) -> bool {
        self.locations == other.locations && self.tags == other.tags && self.metadata == other.metadata
    }
}

/// A Hap ("Happening"): a value active during `part`, whose full lifetime
/// is `whole` (when known). `whole` may extend past the queried span;
/// `part` never does.
#[derive(Clone, Debug, PartialEq)]
pub struct Hap {
    /// Full lifetime of the event. `None` marks a continuous, sampled
    /// event with no discrete onset/offset.
    pub whole: Option<TimeSpan>,
    /// The fragment of `whole` visible to the current query.
    pub part: TimeSpan,
    pub value: Value,
    pub context: Context,
}

impl Hap {
    pub fn new(whole: Option<TimeSpan>, part: TimeSpan, value: Value) -> Self {
        Hap {
            whole,
            part,
            value,
            context: Context::new(),
        }
    }

    pub fn with_context(whole: Option<TimeSpan>, part: TimeSpan, value: Value, context: Context) -> Self {
        Hap {
            whole,
            part,
            value,
            context,
        }
    }

    pub fn whole_or_part(&self) -> TimeSpan {
        self.whole.clone().unwrap_or_else(|| self.part.clone())
    }

    /// An event is an onset iff its visible fragment starts where its
    /// whole lifetime does.
    pub fn has_onset(&self) -> bool {
        match &self.whole {
            Some(w) => w.begin == self.part.begin,
            None => false,
        }
    }

    pub fn is_continuous(&self) -> bool {
        self.whole.is_none()
    }

    pub fn with_value<F>(&self, f: F) -> Hap
    where
        F: FnOnce(&Value) -> Value,
    {
        Hap {
            whole: self.whole.clone(),
            part: self.part.clone(),
            value: f(&self.value),
            context: self.context.clone(),
        }
    }

    pub fn with_span<F>(&self, f: F) -> Hap
    where
        F: Fn(&TimeSpan) -> TimeSpan,
    {
        Hap {
            whole: self.whole.as_ref().map(&f),
            part: f(&self.part),
            value: self.value.clone(),
            context: self.context.clone(),
        }
    }

    pub fn with_context_fn<F>(&self, f: F) -> Hap
    where
        F: FnOnce(&Context) -> Context,
    {
        Hap {
            whole: self.whole.clone(),
            part: self.part.clone(),
            value: self.value.clone(),
            context: f(&self.context),
        }
    }

    pub fn combine_context(&self, other: &Hap) -> Context {
        self.context.combine(&other.context)
    }

    pub fn duration(&self) -> Rational {
        let w = self.whole_or_part();
        w.duration()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(b: i64, e: i64) -> TimeSpan {
        TimeSpan::from_ints(b, e)
    }

    #[test]
    fn onset_detection() {
        let whole = ts(0, 1);
        let onset = Hap::new(Some(whole.clone()), ts(0, 1), Value::Number(1.0));
        assert!(onset.has_onset());

        let fragment = Hap::new(Some(whole), TimeSpan::new(Rational::new(1, 4), Rational::new(1, 2)), Value::Number(1.0));
        assert!(!fragment.has_onset());
    }

    #[test]
    fn continuous_has_no_whole() {
        let hap = Hap::new(None, ts(0, 1), Value::Number(1.0));
        assert!(hap.is_continuous());
        assert!(!hap.has_onset());
    }

    #[test]
    fn context_combine_chains_triggers_in_order() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        let order = Arc::new(AtomicUsize::new(0));
        let first_slot = Arc::new(AtomicUsize::new(99));
        let second_slot = Arc::new(AtomicUsize::new(99));

        let o1 = order.clone();
        let f1 = first_slot.clone();
        let cb1: TriggerCallback = Arc::new(move |_, _| {
            f1.store(o1.fetch_add(1, Ordering::SeqCst), Ordering::SeqCst);
        });

        let o2 = order.clone();
        let f2 = second_slot.clone();
        let cb2: TriggerCallback = Arc::new(move |_, _| {
            f2.store(o2.fetch_add(1, Ordering::SeqCst), Ordering::SeqCst);
        });

        let ctx1 = Context::new().with_trigger(cb1);
        let ctx2 = Context::new().with_trigger(cb2);
        let combined = ctx1.combine(&ctx2);

        let clock = TriggerClock {
            current_time: Rational::from_int(0),
            cps: Rational::from_int(1),
            target_time: Rational::from_int(0),
        };
        let hap = Hap::new(Some(ts(0, 1)), ts(0, 1), Value::Number(1.0));
        combined.fire_triggers(&clock, &hap);

        assert_eq!(first_slot.load(Ordering::SeqCst), 0);
        assert_eq!(second_slot.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn metadata_merge_is_right_biased() {
        let mut ctx1 = Context::new();
        ctx1.metadata.insert("a".to_string(), Value::Number(1.0));
        ctx1.metadata.insert("shared".to_string(), Value::Number(1.0));

        let mut ctx2 = Context::new();
        ctx2.metadata.insert("b".to_string(), Value::Number(2.0));
        ctx2.metadata.insert("shared".to_string(), Value::Number(2.0));

        let combined = ctx1.combine(&ctx2);
        assert_eq!(combined.metadata.get("a"), Some(&Value::Number(1.0)));
        assert_eq!(combined.metadata.get("b"), Some(&Value::Number(2.0)));
        assert_eq!(combined.metadata.get("shared"), Some(&Value::Number(2.0)));
    }
}
