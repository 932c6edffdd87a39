//! A temporal pattern algebra: pure functions from time spans to timed
//! events (`Pattern = State -> Vec<Hap>`), with the functor/applicative/
//! monad structure, time transforms, stepwise sublanguage, signals,
//! deterministic randomness, chopping, Euclidean rhythms, and the matrix
//! of value operators crossed with mix modes that make up the rest of
//! the engine.

pub mod applicative;
pub mod chop;
pub mod combinators;
pub mod concat;
pub mod error;
pub mod euclid;
pub mod hap;
pub mod join;
pub mod matrix;
pub mod pattern;
pub mod random;
pub mod rational;
pub mod registration;
pub mod runtime;
pub mod signal;
pub mod state;
pub mod stepwise;
pub mod timespan;
pub mod transforms;
pub mod value;

pub use applicative::{app_both, app_left, app_right, app_whole, keep_if_op, keep_op, num_op, set_op, union_op, ValueOp, WholeCombiner};
pub use chop::{bite, chop, fit, loop_at, slice, splice, striate};
pub use combinators::{gap, nothing, pure, pure_located, reify_number, reify_str, signal as steady_signal, silence, steady};
pub use concat::{arrange, fastcat, stack, stack_by, stack_centre, stack_left, stack_right, slowcat};
pub use error::{PatternError, Result};
pub use euclid::{bjorklund, euclid_full, euclid_inv, euclid_legato, euclid_pattern};
pub use hap::{Context, Hap};
pub use join::{inner_join, join, outer_join, poly_join, reset_join, restart_join, squeeze_join, JoinKind};
pub use matrix::{compose, mask_with, reset_with, restart_with, struct_with, MixMode, Op};
pub use pattern::Pattern;
pub use random::{
    always, almost_always, almost_never, berlin, brand, brand_by, choose, choose_cycles, choose_patterns, choose_weighted, degrade_by,
    irand, never, often, perlin, rand, rarely, scramble, shuffle, sometimes, sometimes_by, undegrade_by,
};
pub use rational::Rational;
pub use registration::{apply_registered, build_control_aliases, control_value, with_control, PatternifiedFn, Registration};
pub use runtime::{FacadeLogger, LogLevel, Logger, Runtime};
pub use signal::{cosine, cosine2, from_bipolar, isaw, isaw2, itri, saw, saw2, sine, sine2, square, square2, to_bipolar, tri, tri2};
pub use state::State;
pub use stepwise::{contract, drop, expand, extend, grow, pace, polymeter, replicate, shrink, stepcat, stepcat_patterns, take, tour, zip};
pub use timespan::TimeSpan;
pub use transforms::{
    chunk, chunk_back, compress, early, every, fast, fast_gap, first_of, focus, inside, iter, iter_back, last_of, late, linger, off,
    outside, ply, repeat_cycles, rev, ribbon, segment, slow, when, within, zoom,
};
pub use value::Value;
