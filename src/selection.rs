//! # Telescope image selection
//!
//! Parsing and evaluation of the **image selection** parameter, which restricts valid
//! predictions to events seen by a requested telescope subset.
//!
//! ## Overview
//! -----------------
//! A selection string is accepted in two formats:
//! - **Comma-separated indices** (e.g. `"1,2,3"`): parsed as an ordered list of telescope
//!   indices.
//! - **Bit-coded value** (e.g. `"14"` = `0b1110`): set bit positions become the selected
//!   indices, ascending.
//!
//! An empty or absent string disables filtering entirely. A selection covering the whole
//! array (all [`MAX_MULTIPLICITY`] indices, e.g. `"15"` or `"0,1,2,3"`) also disables
//! filtering, so the default full-array request behaves as a no-op.
//!
//! ## Gating semantics
//! -----------------
//! Filtering never removes events. An event fails the selection only when it has fewer than
//! [`MAX_MULTIPLICITY`] telescopes **and** at least one requested index is missing from its
//! telescope list; full-array events always pass. Failing events keep their row in the
//! output but receive the [`SELECTION_SENTINEL`](crate::constants::SELECTION_SENTINEL)
//! value in both prediction columns (see [`apply_models`](crate::dispatch::apply_models)).
//!
//! ## Errors
//! -----------------
//! A string that parses under neither format is rejected with
//! [`DispdirError::InvalidImageSelection`] before any event data is read.

use crate::constants::MAX_MULTIPLICITY;
use crate::dispdir_errors::DispdirError;

/// Parsed telescope-subset selection.
///
/// `All` means no filtering; `Subset` carries the requested telescope indices in the order
/// they were given (bit-coded input yields ascending order).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSelection {
    /// Every event is eligible for a model prediction.
    All,
    /// Only events containing all listed telescope indices (or full-array events) are
    /// eligible; the rest are masked with the selection sentinel.
    Subset(Vec<u8>),
}

impl ImageSelection {
    /// Parse an optional selection string.
    ///
    /// Arguments
    /// -----------------
    /// * `selection`: the raw selection parameter; `None` or an empty string disables
    ///   filtering.
    ///
    /// Return
    /// ----------
    /// * The parsed [`ImageSelection`], or [`DispdirError::InvalidImageSelection`] when the
    ///   string matches neither accepted format.
    pub fn parse(selection: Option<&str>) -> Result<Self, DispdirError> {
        let Some(raw) = selection else {
            return Ok(ImageSelection::All);
        };
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(ImageSelection::All);
        }

        if raw.contains(',') {
            let indices = raw
                .split(',')
                .map(|token| token.trim().parse::<u8>())
                .collect::<Result<Vec<u8>, _>>()
                .map_err(|_| DispdirError::InvalidImageSelection(raw.to_string()))?;
            return Ok(Self::from_indices(indices));
        }

        let bits = raw
            .parse::<u32>()
            .map_err(|_| DispdirError::InvalidImageSelection(raw.to_string()))?;
        let indices = (0..MAX_MULTIPLICITY as u8)
            .filter(|i| (bits >> i) & 1 == 1)
            .collect();
        Ok(Self::from_indices(indices))
    }

    /// Canonicalize an index list: a selection covering the full array is no filtering.
    fn from_indices(indices: Vec<u8>) -> Self {
        let full_array =
            (0..MAX_MULTIPLICITY as u8).all(|i| indices.contains(&i));
        if full_array {
            ImageSelection::All
        } else {
            ImageSelection::Subset(indices)
        }
    }

    /// Whether this selection can mask any event at all.
    pub fn is_filtering(&self) -> bool {
        matches!(self, ImageSelection::Subset(_))
    }

    /// Decide whether an event's prediction is valid under this selection.
    ///
    /// Full-array events (telescope list of length [`MAX_MULTIPLICITY`] or more) are always
    /// included; otherwise every selected index must appear in the list.
    pub fn includes(&self, sensor_list: &[i32]) -> bool {
        match self {
            ImageSelection::All => true,
            ImageSelection::Subset(indices) => {
                sensor_list.len() >= MAX_MULTIPLICITY
                    || indices
                        .iter()
                        .all(|&idx| sensor_list.contains(&i32::from(idx)))
            }
        }
    }
}
