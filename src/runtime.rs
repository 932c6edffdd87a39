//! The three process-wide injection points named in `spec.md` §5/§6:
//! the `computeSteps` flag, the mini-notation parser hook, and the
//! control-alias table — plus the logging sink from §6, which is the same
//! kind of injected collaborator. Per the design note in `spec.md` §9
//! ("Avoid true globals... expose as a Runtime handle"), these live on one
//! `Runtime` value, installed once at startup (`Runtime::install`) and read
//! through a single typed accessor (`Runtime::current`) rather than as
//! scattered `static mut`s. Mutating after install is undefined behaviour,
//! matching `spec.md` §5 ("All three are set at startup... mutating them
//! mid-run is undefined behaviour").

use crate::pattern::Pattern;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Warn,
    Error,
}

/// The logging sink named in `spec.md` §6: "a sink called `logger(msg,
/// level, data?)`". The engine only ever warns or errors through it, and
/// never aborts.
pub trait Logger: Send + Sync {
    fn log(&self, level: LogLevel, message: &str);
}

/// Forwards to the `tracing` facade crate, the way the sibling pattern/DSP
/// repo in the retrieval pack (`ekg-phonon`) depends on `tracing` for
/// library-level diagnostics rather than rolling its own sink.
pub struct FacadeLogger;

impl Logger for FacadeLogger {
    fn log(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Warn => tracing::warn!("{message}"),
            LogLevel::Error => tracing::error!("{message}"),
        }
    }
}

/// `String -> Pattern`, the mini-notation parser injection point
/// (`spec.md` §6). When unset, `reify` treats strings as `pure(Value::String(..))`.
pub type ParserHook = Arc<dyn Fn(&str) -> Pattern + Send + Sync>;

pub struct Runtime {
    pub compute_steps: bool,
    pub parser: Option<ParserHook>,
    /// alias -> canonical control name, populated by `registration::register_control`.
    pub control_aliases: HashMap<String, String>,
    pub logger: Arc<dyn Logger>,
}

impl Runtime {
    pub fn new() -> Self {
        Runtime {
            compute_steps: true,
            parser: None,
            control_aliases: HashMap::new(),
            logger: Arc::new(FacadeLogger),
        }
    }

    pub fn with_parser(mut self, parser: ParserHook) -> Self {
        self.parser = Some(parser);
        self
    }

    pub fn with_compute_steps(mut self, compute_steps: bool) -> Self {
        self.compute_steps = compute_steps;
        self
    }

    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn with_control_aliases(mut self, aliases: HashMap<String, String>) -> Self {
        self.control_aliases = aliases;
        self
    }

    /// Resolve a control alias to its canonical field name, falling back to
    /// the alias itself when nothing was registered for it.
    pub fn canonical_control<'a>(&'a self, alias: &'a str) -> &'a str {
        self.control_aliases.get(alias).map(String::as_str).unwrap_or(alias)
    }

    pub fn warn(&self, message: impl AsRef<str>) {
        self.logger.log(LogLevel::Warn, message.as_ref());
    }

    pub fn error(&self, message: impl AsRef<str>) {
        self.logger.log(LogLevel::Error, message.as_ref());
    }

    /// Install the process-wide runtime. Returns the rejected value if one
    /// was already installed — callers that only want "install if absent"
    /// can ignore the `Err`.
    pub fn install(runtime: Runtime) -> std::result::Result<(), Runtime> {
        RUNTIME.set(runtime)
    }

    pub fn current() -> &'static Runtime {
        RUNTIME.get_or_init(Runtime::new)
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Runtime::new()
    }
}

static RUNTIME: OnceLock<Runtime> = OnceLock::new();

/// Gate step-count propagation on the `computeSteps` flag, per `spec.md`
/// §3: "A global flag `computeSteps` may be turned off to skip all step
/// tracking." Combinators that derive `steps` call this instead of
/// assigning the computed value directly.
pub fn gate_steps<T>(computed: Option<T>) -> Option<T> {
    if Runtime::current().compute_steps {
        computed
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CountingLogger {
        warns: std::sync::atomic::AtomicUsize,
    }

    impl Logger for CountingLogger {
        fn log(&self, level: LogLevel, _message: &str) {
            if level == LogLevel::Warn {
                self.warns.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            }
        }
    }

    #[test]
    fn gate_steps_respects_flag() {
        assert_eq!(gate_steps(Some(3)), Some(3));
    }

    #[test]
    fn custom_logger_receives_warnings() {
        let logger = Arc::new(CountingLogger {
            warns: std::sync::atomic::AtomicUsize::new(0),
        });
        let rt = Runtime::new().with_logger(logger.clone());
        rt.warn("test warning");
        assert_eq!(logger.warns.load(std::sync::atomic::Ordering::SeqCst), 1);
    }
}
