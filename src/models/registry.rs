//! # Model registry
//!
//! Loads one serialized regressor per supported multiplicity from a model directory and
//! exposes them as a read-only map. A missing artifact is downgraded to a warning and the
//! corresponding multiplicity simply stays absent; events of that multiplicity later
//! receive NaN predictions instead of aborting the run. A file that exists but fails to
//! deserialize is still a hard error.

use std::collections::BTreeMap;

use camino::Utf8Path;
use tracing::{info, warn};

use crate::constants::{MAX_MULTIPLICITY, MIN_MULTIPLICITY, MODEL_FILE_STEM};
use crate::dispdir_errors::DispdirError;
use crate::features::flatten::feature_width;
use crate::models::onnx_regressor::OnnxRegressor;
use crate::models::OffsetRegressor;

/// Read-only map from multiplicity to its trained regressor.
pub struct ModelRegistry {
    models: BTreeMap<usize, Box<dyn OffsetRegressor>>,
}

impl ModelRegistry {
    /// Load the ONNX artifacts `dispdir_bdt_ntel{m}.onnx` for every supported
    /// multiplicity found in `model_dir`.
    ///
    /// Arguments
    /// -----------------
    /// * `model_dir`: directory holding the serialized models.
    ///
    /// Return
    /// ----------
    /// * A registry containing every artifact that was present; absent files are logged
    ///   and skipped, unreadable files propagate an error.
    pub fn load(model_dir: &Utf8Path) -> Result<Self, DispdirError> {
        let mut models: BTreeMap<usize, Box<dyn OffsetRegressor>> = BTreeMap::new();
        for multiplicity in MIN_MULTIPLICITY..=MAX_MULTIPLICITY {
            let path = model_dir.join(format!("{MODEL_FILE_STEM}{multiplicity}.onnx"));
            if path.exists() {
                info!(model = %path, "loading model");
                let model = OnnxRegressor::load(&path, feature_width(multiplicity))?;
                models.insert(multiplicity, Box::new(model));
            } else {
                warn!(model = %path, "model not found");
            }
        }
        Ok(Self { models })
    }

    /// Build a registry from already constructed regressors.
    ///
    /// This is the injection seam used by tests (constant stubs) and by callers that
    /// manage model construction themselves.
    pub fn from_models(
        models: impl IntoIterator<Item = (usize, Box<dyn OffsetRegressor>)>,
    ) -> Self {
        Self {
            models: models.into_iter().collect(),
        }
    }

    /// Regressor registered for `multiplicity`, if any.
    pub fn get(&self, multiplicity: usize) -> Option<&dyn OffsetRegressor> {
        self.models.get(&multiplicity).map(Box::as_ref)
    }

    /// Multiplicities with a registered regressor, ascending.
    pub fn multiplicities(&self) -> impl Iterator<Item = usize> + '_ {
        self.models.keys().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

#[cfg(test)]
mod registry_test {
    use super::*;
    use nalgebra::DMatrix;

    struct NullRegressor;

    impl OffsetRegressor for NullRegressor {
        fn predict(&self, features: &DMatrix<f32>) -> Result<Vec<[f32; 2]>, DispdirError> {
            Ok(vec![[0.0, 0.0]; features.nrows()])
        }
    }

    #[test]
    fn test_missing_artifacts_are_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let dir_path = Utf8Path::from_path(dir.path()).unwrap();
        let registry = ModelRegistry::load(dir_path).unwrap();
        assert!(registry.is_empty());
        assert!(registry.get(3).is_none());
    }

    #[test]
    fn test_injected_models_are_looked_up_by_multiplicity() {
        let registry = ModelRegistry::from_models([(
            3usize,
            Box::new(NullRegressor) as Box<dyn OffsetRegressor>,
        )]);
        assert!(registry.get(3).is_some());
        assert!(registry.get(2).is_none());
        assert_eq!(registry.multiplicities().collect::<Vec<_>>(), [3]);
    }
}
