//! ONNX regressor inference using tract
//!
//! Loads the serialized per-multiplicity direction models and runs them row by row
//! through a typed, optimized tract plan. The plan is built once at load time with a
//! fixed `[1, n_features]` input fact; inference then needs no further graph work.

use camino::Utf8Path;
use nalgebra::DMatrix;
use tract_onnx::prelude::*;

use crate::dispdir_errors::DispdirError;
use crate::models::OffsetRegressor;

type TractPlan = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

fn tract_err(err: TractError) -> DispdirError {
    DispdirError::ModelError(err.to_string())
}

/// Offset regressor backed by an ONNX artifact.
pub struct OnnxRegressor {
    plan: TractPlan,
    n_features: usize,
}

impl OnnxRegressor {
    /// Load and optimize an ONNX model expecting `n_features` input columns.
    ///
    /// Arguments
    /// -----------------
    /// * `path`: the serialized model file.
    /// * `n_features`: feature-matrix width the model was trained on; fixed into the
    ///   plan's input fact so shape mismatches fail at load time, not mid-stream.
    pub fn load(path: &Utf8Path, n_features: usize) -> Result<Self, DispdirError> {
        let plan = tract_onnx::onnx()
            .model_for_path(path.as_std_path())
            .map_err(tract_err)?
            .with_input_fact(0, f32::fact([1, n_features]).into())
            .map_err(tract_err)?
            .into_optimized()
            .map_err(tract_err)?
            .into_runnable()
            .map_err(tract_err)?;
        Ok(Self { plan, n_features })
    }
}

impl OffsetRegressor for OnnxRegressor {
    fn predict(&self, features: &DMatrix<f32>) -> Result<Vec<[f32; 2]>, DispdirError> {
        if features.ncols() != self.n_features {
            return Err(DispdirError::ModelError(format!(
                "feature matrix has {} columns, model expects {}",
                features.ncols(),
                self.n_features
            )));
        }

        let mut predictions = Vec::with_capacity(features.nrows());
        for r in 0..features.nrows() {
            let row: Vec<f32> = features.row(r).iter().copied().collect();
            let input: Tensor =
                tract_ndarray::Array2::from_shape_vec((1, self.n_features), row)
                    .map_err(|e| DispdirError::ModelError(e.to_string()))?
                    .into();

            let result = self.plan.run(tvec!(input.into())).map_err(tract_err)?;
            let output = result.first().ok_or_else(|| {
                DispdirError::ModelError("model produced no output".to_string())
            })?;
            let view = output.to_array_view::<f32>().map_err(tract_err)?;
            let values: Vec<f32> = view.iter().copied().collect();
            if values.len() < 2 {
                return Err(DispdirError::ModelError(format!(
                    "model output has {} values, expected 2",
                    values.len()
                )));
            }
            predictions.push([values[0], values[1]]);
        }
        Ok(predictions)
    }
}
