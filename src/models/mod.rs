//! # Models: per-multiplicity offset regressors
//!
//! The model layer is deliberately thin: a trained regressor is anything implementing
//! [`OffsetRegressor`], and the [`registry`](crate::models::registry::ModelRegistry) maps
//! each supported multiplicity to at most one of them. Production runs load ONNX
//! artifacts through [`onnx_regressor`]; tests inject constant stubs through the same
//! trait instead of reaching into internals.

use nalgebra::DMatrix;

use crate::dispdir_errors::DispdirError;

pub mod onnx_regressor;
pub mod registry;

/// A trained multi-output regressor predicting one offset pair per event.
///
/// Implementations are immutable after construction and shareable across batches
/// (`Send + Sync`), so a loaded registry can serve any number of chunks, or future
/// parallel workers, without synchronization.
pub trait OffsetRegressor: Send + Sync {
    /// Predict `(Dir_Xoff, Dir_Yoff)` for every row of a feature matrix.
    ///
    /// Arguments
    /// -----------------
    /// * `features`: one event per row, laid out per
    ///   [`feature_names`](crate::features::flatten::feature_names) for this model's
    ///   multiplicity.
    ///
    /// Return
    /// ----------
    /// * One `[x, y]` pair per input row, in row order.
    fn predict(&self, features: &DMatrix<f32>) -> Result<Vec<[f32; 2]>, DispdirError>;
}
