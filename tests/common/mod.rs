#![allow(dead_code)]

use nalgebra::DMatrix;
use smallvec::SmallVec;

use dispdir::constants::SENSOR_VARIABLES;
use dispdir::{DispdirError, EventBatch, ModelRegistry, OffsetRegressor};

/// Regressor stub returning the same offset pair for every event.
pub struct ConstRegressor {
    pair: [f32; 2],
}

impl ConstRegressor {
    pub fn new(x: f32, y: f32) -> Self {
        Self { pair: [x, y] }
    }
}

impl OffsetRegressor for ConstRegressor {
    fn predict(&self, features: &DMatrix<f32>) -> Result<Vec<[f32; 2]>, DispdirError> {
        Ok(vec![self.pair; features.nrows()])
    }
}

/// Registry with one constant stub per supported multiplicity: multiplicity m predicts
/// (m, -m), so any misrouted event is immediately visible in the output.
pub fn stub_registry() -> ModelRegistry {
    ModelRegistry::from_models([
        (
            2usize,
            Box::new(ConstRegressor::new(2.0, -2.0)) as Box<dyn OffsetRegressor>,
        ),
        (
            3usize,
            Box::new(ConstRegressor::new(3.0, -3.0)) as Box<dyn OffsetRegressor>,
        ),
        (
            4usize,
            Box::new(ConstRegressor::new(4.0, -4.0)) as Box<dyn OffsetRegressor>,
        ),
    ])
}

/// Minimal well-formed batch: telescope lists as given, scalars derived from the row
/// index, and every per-telescope variable stored over the full 4-telescope width.
pub fn batch_from_tel_lists(tel_lists: &[&[i32]]) -> EventBatch {
    let n = tel_lists.len();
    let mut batch = EventBatch::with_capacity(n);
    batch.sensor_lists = tel_lists
        .iter()
        .map(|l| SmallVec::from_slice(l))
        .collect();
    batch.xoff = (0..n).map(|i| i as f32).collect();
    batch.yoff = (0..n).map(|i| -(i as f32)).collect();
    batch.xoff_intersect = vec![0.0; n];
    batch.yoff_intersect = vec![0.0; n];
    batch.pointing_dx = vec![0.0; n];
    batch.pointing_dy = vec![0.0; n];
    for col in batch.sensor_vars.iter_mut() {
        *col = (0..n)
            .map(|_| SmallVec::from_slice(&[1.0f32, 2.0, 3.0, 4.0]))
            .collect();
    }
    assert_eq!(batch.sensor_vars.len(), SENSOR_VARIABLES.len());
    batch
}
