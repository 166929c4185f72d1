//! # Features: flattening variable-length events into model inputs
//!
//! The [`flatten`] module turns a same-multiplicity group of events into the fixed-width
//! `f32` feature matrix the regressors expect, handling the two per-telescope indexing
//! conventions, NaN padding, derived features, and the whole-event scalar tail.

pub mod flatten;
