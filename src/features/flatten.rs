//! # Event flattening
//!
//! Conversion of a same-multiplicity group of events into the fixed-width feature matrix
//! the per-multiplicity regressors were trained on.
//!
//! ## Overview
//! -----------------
//! For a group of multiplicity `m`, every per-telescope variable contributes `m` slot
//! columns. Two indexing conventions coexist in the input data:
//! - **Position-indexed** variables (name starting with
//!   [`POSITION_INDEXED_PREFIX`](crate::constants::POSITION_INDEXED_PREFIX)) are stored in
//!   slot order already: slot `i` reads stored position `i`.
//! - **Identity-indexed** variables are stored by physical telescope id: slot `i` reads the
//!   stored position given by the event's telescope list at `i`.
//!
//! Both paths run over a NaN-padded dense matrix per variable, so short sequences and
//! out-of-range telescope ids degrade to NaN cell by cell and never abort a batch.
//!
//! ## Feature layout
//! -----------------
//! Column order is fixed and a pure function of `m`:
//! 1. Base block, variable-major: `m` slots for each entry of
//!    [`SENSOR_VARIABLES`](crate::constants::SENSOR_VARIABLES) in table order.
//! 2. Derived block, slot-major: `disp_x`, `disp_y`, `loss_loss`, `loss_dist`,
//!    `width_length` for each slot.
//! 3. Six whole-event scalars: the weighted offset pair, the intersection pair, and their
//!    componentwise differences.
//!
//! Three base columns are additionally transformed in place: `size` becomes
//! `log10(size + 1e-6)`, and the camera centroids `cen_x`/`cen_y` receive the event's
//! pointing-correction deltas. The raw deltas themselves never appear as feature columns.
//!
//! All output is `f32`, matching model training precision.

use nalgebra::DMatrix;

use crate::constants::{
    GUARD_EPS, SENSOR_VARIABLES, POSITION_INDEXED_PREFIX, SensorSeq, VAR_CEN_X, VAR_CEN_Y,
    VAR_COSPHI, VAR_DISP_T, VAR_DIST, VAR_LENGTH, VAR_LOSS, VAR_SINPHI, VAR_SIZE, VAR_WIDTH,
};
use crate::events::event_batch::EventBatch;

/// Derived features appended per slot (`disp_x`, `disp_y`, `loss_loss`, `loss_dist`,
/// `width_length`).
pub const DERIVED_PER_SLOT: usize = 5;

/// Whole-event scalar columns appended after the per-slot blocks.
pub const EVENT_SCALAR_COLUMNS: usize = 6;

/// Feature-matrix width for multiplicity `m`.
pub fn feature_width(m: usize) -> usize {
    SENSOR_VARIABLES.len() * m + DERIVED_PER_SLOT * m + EVENT_SCALAR_COLUMNS
}

/// Column names of the feature matrix for multiplicity `m`, in layout order.
///
/// Mirrors [`flatten_group`] exactly; mainly useful for diagnostics and tests.
pub fn feature_names(m: usize) -> Vec<String> {
    let mut names = Vec::with_capacity(feature_width(m));
    for var in SENSOR_VARIABLES {
        for slot in 0..m {
            names.push(format!("{var}_{slot}"));
        }
    }
    for slot in 0..m {
        names.push(format!("disp_x_{slot}"));
        names.push(format!("disp_y_{slot}"));
        names.push(format!("loss_loss_{slot}"));
        names.push(format!("loss_dist_{slot}"));
        names.push(format!("width_length_{slot}"));
    }
    names.extend(
        [
            "Xoff_weighted_bdt",
            "Yoff_weighted_bdt",
            "Xoff_intersect",
            "Yoff_intersect",
            "Diff_Xoff",
            "Diff_Yoff",
        ]
        .map(str::to_string),
    );
    names
}

/// Flatten a same-multiplicity group of events into one feature matrix.
///
/// Arguments
/// -----------------
/// * `batch`: the source batch.
/// * `rows`: batch row indices of the group, in the order predictions will be returned.
/// * `m`: the group's multiplicity (every listed row must have `m` telescope ids).
///
/// Return
/// ----------
/// * A `rows.len() x feature_width(m)` matrix; cells without a stored measurement are NaN.
pub fn flatten_group(batch: &EventBatch, rows: &[usize], m: usize) -> DMatrix<f32> {
    let n = rows.len();
    let mut features = DMatrix::from_element(n, feature_width(m), f32::NAN);

    // Base block: one dense NaN-padded matrix per variable, then one gather per slot.
    for (var_idx, var_name) in SENSOR_VARIABLES.iter().enumerate() {
        let dense = padded_matrix(rows, &batch.sensor_vars[var_idx]);
        let position_indexed = var_name.starts_with(POSITION_INDEXED_PREFIX);

        for slot in 0..m {
            let col = var_idx * m + slot;
            if position_indexed {
                // Slot order equals storage order; columns past the stored width stay NaN.
                if slot < dense.ncols() {
                    for r in 0..n {
                        features[(r, col)] = dense[(r, slot)];
                    }
                }
            } else {
                // Storage order is physical telescope id; look it up per event. Ids outside
                // the stored width (including the -1 null marker) stay NaN.
                for r in 0..n {
                    if let Some(&id) = batch.sensor_lists[rows[r]].get(slot) {
                        if id >= 0 && (id as usize) < dense.ncols() {
                            features[(r, col)] = dense[(r, id as usize)];
                        }
                    }
                }
            }
        }
    }

    // Derived block plus the in-place transforms, all closed-form per slot.
    let base_col = |var: usize, slot: usize| var * m + slot;
    let derived_start = SENSOR_VARIABLES.len() * m;
    for slot in 0..m {
        let out = derived_start + slot * DERIVED_PER_SLOT;
        for r in 0..n {
            let disp_t = features[(r, base_col(VAR_DISP_T, slot))];
            let cosphi = features[(r, base_col(VAR_COSPHI, slot))];
            let sinphi = features[(r, base_col(VAR_SINPHI, slot))];
            let loss = features[(r, base_col(VAR_LOSS, slot))];
            let dist = features[(r, base_col(VAR_DIST, slot))];
            let width = features[(r, base_col(VAR_WIDTH, slot))];
            let length = features[(r, base_col(VAR_LENGTH, slot))];

            features[(r, out)] = disp_t * cosphi;
            features[(r, out + 1)] = disp_t * sinphi;
            features[(r, out + 2)] = loss * loss;
            features[(r, out + 3)] = loss * dist;
            features[(r, out + 4)] = width / (length + GUARD_EPS);
        }

        for r in 0..n {
            let size_col = base_col(VAR_SIZE, slot);
            features[(r, size_col)] = (features[(r, size_col)] + GUARD_EPS).log10();

            let cen_x_col = base_col(VAR_CEN_X, slot);
            let cen_y_col = base_col(VAR_CEN_Y, slot);
            features[(r, cen_x_col)] += batch.pointing_dx[rows[r]];
            features[(r, cen_y_col)] += batch.pointing_dy[rows[r]];
        }
    }

    // Whole-event scalar tail.
    let scalar_start = derived_start + DERIVED_PER_SLOT * m;
    for (r, &row) in rows.iter().enumerate() {
        features[(r, scalar_start)] = batch.xoff[row];
        features[(r, scalar_start + 1)] = batch.yoff[row];
        features[(r, scalar_start + 2)] = batch.xoff_intersect[row];
        features[(r, scalar_start + 3)] = batch.yoff_intersect[row];
        features[(r, scalar_start + 4)] = batch.xoff[row] - batch.xoff_intersect[row];
        features[(r, scalar_start + 5)] = batch.yoff[row] - batch.yoff_intersect[row];
    }

    features
}

/// Stack a group's variable-length sequences into a NaN-padded dense matrix
/// (row = event, column = stored position).
fn padded_matrix(rows: &[usize], column: &[SensorSeq]) -> DMatrix<f32> {
    let max_len = rows.iter().map(|&r| column[r].len()).max().unwrap_or(0);
    let mut dense = DMatrix::from_element(rows.len(), max_len, f32::NAN);
    for (out_r, &r) in rows.iter().enumerate() {
        for (c, &value) in column[r].iter().enumerate() {
            dense[(out_r, c)] = value;
        }
    }
    dense
}
