//! Error kinds per `spec.md` §7.
//!
//! Only two of the four error kinds there ever become an `Err`:
//! "invalid argument" (surfaced by combinators that choose to report
//! instead of silently degrading) and "programmer error" (wrong arity to a
//! registered operator). "Query-callback exception" and "stepless op" are
//! handled inline — a caught panic or an absent `steps` degrades to
//! `silence`/`nothing`/an empty result, never an `Err`. Grounded on
//! `strudel-audio::AudioError` (`thiserror::Error` + a crate `Result<T>`
//! alias), the only `thiserror` user in the teacher's workspace.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PatternError {
    #[error("invalid argument to `{op}`: {message}")]
    InvalidArgument { op: &'static str, message: String },

    #[error("queryArc requires begin < end (got {begin} >= {end})")]
    InvalidRange { begin: String, end: String },

    #[error("wrong arity calling registered operator `{op}`: expected {expected} argument(s), got {got}")]
    WrongArity {
        op: &'static str,
        expected: usize,
        got: usize,
    },
}

pub type Result<T> = std::result::Result<T, PatternError>;
