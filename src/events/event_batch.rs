//! # Columnar event batch
//!
//! This module provides the [`EventBatch`] type, which groups one chunk of stereo events
//! into a compact columnar container ready for flattening and dispatch.
//!
//! ## Overview
//! -----------------
//! A reconstruction run streams events chunk by chunk; each chunk is decoded into one
//! [`EventBatch`]. The batch keeps:
//! - the per-event telescope-id list (`sensor_lists`), whose length is the event's
//!   **multiplicity**,
//! - six whole-event scalars (the two weighted offset estimates, the two intersection
//!   estimates, and the two pointing-correction deltas),
//! - one column per entry of
//!   [`SENSOR_VARIABLES`](crate::constants::SENSOR_VARIABLES), holding the variable-length
//!   per-telescope sequences in table order.
//!
//! ## Invariants
//! -----------------
//! - All scalar columns and `sensor_lists` have the same length (= number of events).
//! - `sensor_vars` has exactly one column per training variable, each of batch length.
//! - Row order is the order events were read; it is preserved through the whole pipeline.
//!
//! Length agreement is enforced at decode time; [`EventBatch::debug_validate`] re-checks it
//! in debug builds at the dispatch boundary.

use crate::constants::{SensorList, SensorSeq, SENSOR_VARIABLES};

/// One chunk of events in columnar layout.
#[derive(Debug, Clone)]
pub struct EventBatch {
    /// Telescope ids contributing to each event; the list length is the multiplicity.
    pub sensor_lists: Vec<SensorList>,

    /// Weighted-average offset estimate, x component.
    pub xoff: Vec<f32>,
    /// Weighted-average offset estimate, y component.
    pub yoff: Vec<f32>,
    /// Intersection-method offset estimate, x component.
    pub xoff_intersect: Vec<f32>,
    /// Intersection-method offset estimate, y component.
    pub yoff_intersect: Vec<f32>,

    /// Pointing-correction delta applied to the camera x coordinates.
    pub pointing_dx: Vec<f32>,
    /// Pointing-correction delta applied to the camera y coordinates.
    pub pointing_dy: Vec<f32>,

    /// Per-telescope variable columns, indexed like
    /// [`SENSOR_VARIABLES`](crate::constants::SENSOR_VARIABLES); each entry holds one
    /// variable-length sequence per event.
    pub sensor_vars: Vec<Vec<SensorSeq>>,
}

impl EventBatch {
    /// Empty batch with per-column capacity for `n` events.
    pub fn with_capacity(n: usize) -> Self {
        Self {
            sensor_lists: Vec::with_capacity(n),
            xoff: Vec::with_capacity(n),
            yoff: Vec::with_capacity(n),
            xoff_intersect: Vec::with_capacity(n),
            yoff_intersect: Vec::with_capacity(n),
            pointing_dx: Vec::with_capacity(n),
            pointing_dy: Vec::with_capacity(n),
            sensor_vars: (0..SENSOR_VARIABLES.len())
                .map(|_| Vec::with_capacity(n))
                .collect(),
        }
    }

    /// Number of events in the batch.
    pub fn len(&self) -> usize {
        self.sensor_lists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sensor_lists.is_empty()
    }

    /// Multiplicity of the event at `row`.
    #[inline]
    pub fn multiplicity(&self, row: usize) -> usize {
        self.sensor_lists[row].len()
    }

    /// Debug-build check that every column agrees on the batch length.
    pub(crate) fn debug_validate(&self) {
        let n = self.len();
        debug_assert_eq!(self.xoff.len(), n, "Xoff length mismatch");
        debug_assert_eq!(self.yoff.len(), n, "Yoff length mismatch");
        debug_assert_eq!(self.xoff_intersect.len(), n, "Xoff_intersect length mismatch");
        debug_assert_eq!(self.yoff_intersect.len(), n, "Yoff_intersect length mismatch");
        debug_assert_eq!(self.pointing_dx.len(), n, "fpointing_dx length mismatch");
        debug_assert_eq!(self.pointing_dy.len(), n, "fpointing_dy length mismatch");
        debug_assert_eq!(
            self.sensor_vars.len(),
            SENSOR_VARIABLES.len(),
            "variable column count mismatch"
        );
        for (var, col) in SENSOR_VARIABLES.iter().zip(&self.sensor_vars) {
            debug_assert_eq!(col.len(), n, "{var} column length mismatch");
        }
    }
}
