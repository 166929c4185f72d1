//! # Constants and type definitions for dispdir
//!
//! This module centralizes the **sentinel values**, **array-geometry bounds**, and **common type
//! definitions** used throughout the `dispdir` library. It also defines the per-telescope
//! training-variable table that fixes the feature layout for every multiplicity.
//!
//! ## Overview
//!
//! - Sentinel and guard constants shared by the flattening and dispatch stages
//! - Telescope-array geometry bounds (supported multiplicity range)
//! - The ordered per-telescope variable table and its indexing-convention prefix
//! - Core type aliases used across the crate
//!
//! These definitions are used by all main modules, including feature flattening, model
//! dispatch, and the streaming driver.

use smallvec::SmallVec;
use std::collections::HashMap;

// -------------------------------------------------------------------------------------------------
// Sentinels and guards
// -------------------------------------------------------------------------------------------------

/// Output value marking a prediction withheld by telescope selection.
///
/// Distinct from NaN, which marks an event whose multiplicity has no trained model.
pub const SELECTION_SENTINEL: f32 = -999.0;

/// Additive guard against division by zero and log10(0) in derived features
pub const GUARD_EPS: f32 = 1e-6;

// -------------------------------------------------------------------------------------------------
// Array geometry
// -------------------------------------------------------------------------------------------------

/// Smallest telescope multiplicity with a trained model
pub const MIN_MULTIPLICITY: usize = 2;

/// Number of telescopes in the array, and the largest supported multiplicity
pub const MAX_MULTIPLICITY: usize = 4;

/// Default number of events pulled per chunk from the input store
pub const DEFAULT_BATCH_SIZE: usize = 500_000;

/// File-name stem of the serialized per-multiplicity regressors
/// (`{stem}{multiplicity}.onnx` inside the model directory)
pub const MODEL_FILE_STEM: &str = "dispdir_bdt_ntel";

// -------------------------------------------------------------------------------------------------
// Variable tables
// -------------------------------------------------------------------------------------------------

/// Name of the input column holding the per-event telescope-id list
pub const SENSOR_LIST_COLUMN: &str = "DispTelList_T";

/// Per-telescope training variables, in feature-layout order.
///
/// Variables whose name starts with [`POSITION_INDEXED_PREFIX`] are stored in slot order
/// already; all others are stored by physical telescope identity and require a lookup
/// through the event's telescope-id list.
pub const SENSOR_VARIABLES: [&str; 18] = [
    "Disp_T",
    "DispXoff_T",
    "DispYoff_T",
    "DispWoff_T",
    "E",
    "ES",
    "cen_x",
    "cen_y",
    "cosphi",
    "sinphi",
    "loss",
    "size",
    "dist",
    "width",
    "length",
    "asym",
    "tgrad_x",
    "R_core",
];

/// Name prefix identifying the position-indexed variable family
pub const POSITION_INDEXED_PREFIX: &str = "Disp";

// Positions inside SENSOR_VARIABLES consumed by the derived-feature pass.
pub(crate) const VAR_DISP_T: usize = 0;
pub(crate) const VAR_CEN_X: usize = 6;
pub(crate) const VAR_CEN_Y: usize = 7;
pub(crate) const VAR_COSPHI: usize = 8;
pub(crate) const VAR_SINPHI: usize = 9;
pub(crate) const VAR_LOSS: usize = 10;
pub(crate) const VAR_SIZE: usize = 11;
pub(crate) const VAR_DIST: usize = 12;
pub(crate) const VAR_WIDTH: usize = 13;
pub(crate) const VAR_LENGTH: usize = 14;

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Ordered list of telescope ids contributing to one event.
///
/// Ids are kept as signed integers so that malformed input values survive decoding and can
/// degrade to NaN during slot lookup instead of wrapping.
pub type SensorList = SmallVec<[i32; 4]>;

/// Variable-length per-telescope measurement sequence for one event
pub type SensorSeq = SmallVec<[f32; 4]>;

/// Hash map with the fast non-cryptographic hasher used throughout the crate
pub type FastHashMap<K, V> = HashMap<K, V, ahash::RandomState>;
