//! # Multiplicity dispatch
//!
//! Per-batch core of the reconstruction: partition events by multiplicity, run each group
//! through flattening and its registered regressor, and scatter the per-event predictions
//! back into batch order.
//!
//! ## Overview
//! -----------------
//! [`apply_models`] never drops a row. Every event lands in exactly one multiplicity
//! group; groups without a registered model keep NaN predictions and are reported with a
//! skipped-event count, so one missing artifact never affects the other groups. After all
//! groups are processed, events failing the telescope selection (when one was supplied)
//! have both outputs overwritten with the selection sentinel, whether or not a model
//! prediction had been computed for them.
//!
//! ## Contract
//! -----------------
//! Output length always equals batch length, and row `i` of the output corresponds to row
//! `i` of the input. Within a batch the groups touch disjoint output positions, so their
//! processing order is irrelevant to the result; they are still visited in ascending
//! multiplicity order to keep log output stable.

use itertools::Itertools;
use tracing::{debug, warn};

use crate::constants::{FastHashMap, SELECTION_SENTINEL};
use crate::dispdir_errors::DispdirError;
use crate::events::event_batch::EventBatch;
use crate::features::flatten::flatten_group;
use crate::models::registry::ModelRegistry;
use crate::selection::ImageSelection;

/// Predictions for one batch, aligned with the batch's row order.
#[derive(Debug, Clone)]
pub struct BatchPredictions {
    pub xoff: Vec<f32>,
    pub yoff: Vec<f32>,
}

impl BatchPredictions {
    pub fn len(&self) -> usize {
        self.xoff.len()
    }

    pub fn is_empty(&self) -> bool {
        self.xoff.is_empty()
    }
}

/// Predict the offset pair for every event of a batch.
///
/// Arguments
/// -----------------
/// * `batch`: the decoded events.
/// * `registry`: regressors per multiplicity, loaded once and shared across batches.
/// * `selection`: parsed telescope selection; pass [`ImageSelection::All`] for none.
///
/// Return
/// ----------
/// * One prediction per batch row, in batch order: model output, NaN (no model for the
///   row's multiplicity), or the selection sentinel.
pub fn apply_models(
    batch: &EventBatch,
    registry: &ModelRegistry,
    selection: &ImageSelection,
) -> Result<BatchPredictions, DispdirError> {
    batch.debug_validate();
    let n = batch.len();
    let mut pred_xoff = vec![f32::NAN; n];
    let mut pred_yoff = vec![f32::NAN; n];

    // Partition row indices by multiplicity; each row lands in exactly one group.
    let mut groups: FastHashMap<usize, Vec<usize>> = FastHashMap::default();
    for row in 0..n {
        groups.entry(batch.multiplicity(row)).or_default().push(row);
    }

    for multiplicity in groups.keys().copied().sorted() {
        let rows = &groups[&multiplicity];

        let Some(model) = registry.get(multiplicity) else {
            warn!(
                multiplicity,
                skipped = rows.len(),
                "no model available, leaving NaN predictions"
            );
            continue;
        };

        debug!(multiplicity, events = rows.len(), "flattening group");
        let features = flatten_group(batch, rows, multiplicity);
        let predictions = model.predict(&features)?;
        if predictions.len() != rows.len() {
            return Err(DispdirError::PredictionShape {
                expected: rows.len(),
                returned: predictions.len(),
            });
        }

        // Scatter group predictions back to the original batch positions.
        for (&row, [x, y]) in rows.iter().zip(predictions) {
            pred_xoff[row] = x;
            pred_yoff[row] = y;
        }
    }

    // Selection gating overwrites excluded rows last, regardless of any model output.
    if selection.is_filtering() {
        for row in 0..n {
            if !selection.includes(&batch.sensor_lists[row]) {
                pred_xoff[row] = SELECTION_SENTINEL;
                pred_yoff[row] = SELECTION_SENTINEL;
            }
        }
    }

    Ok(BatchPredictions {
        xoff: pred_xoff,
        yoff: pred_yoff,
    })
}
