//! # Parquet reader for stereo events
//!
//! High-throughput ingestion of stereo Cherenkov events from **Apache Parquet** into
//! [`EventBatch`] chunks. This module focuses on a minimal, column-projected read path and
//! decodes one Arrow record batch into one in-memory batch.
//!
//! ## Overview
//! -----------------
//! The entry point is [`EventStoreReader::open`], which opens the file, resolves the
//! required columns by **name**, installs a projection mask so only those columns are
//! materialized, and fixes the record-batch size. The reader then iterates decoded
//! [`EventBatch`]es in file order.
//!
//! Key design points:
//! - **Projection-first**: only the telescope-id list, the six whole-event scalars, and the
//!   training-variable columns are read; any extra columns in the file are ignored.
//! - **Typed downcast once per batch**: each column is resolved and downcast a single time,
//!   then consumed row by row.
//! - **Fail fast on schema problems**: a missing required column surfaces as
//!   [`DispdirError::MissingColumn`] at open time, before any event is decoded.
//!
//! ## Expected Parquet schema
//! -----------------
//! - `DispTelList_T: List<Int32>` (or `List<UInt32>`): telescope ids per event; the list
//!   length is the event multiplicity.
//! - `Xoff`, `Yoff`, `Xoff_intersect`, `Yoff_intersect`, `fpointing_dx`, `fpointing_dy`:
//!   `Float32` or `Float64` scalars.
//! - One `List<Float32>` (or `List<Float64>`) column per entry of
//!   [`SENSOR_VARIABLES`](crate::constants::SENSOR_VARIABLES).
//!
//! ## Null handling policy
//! -----------------
//! Decoding never fails on nulls: a null scalar becomes NaN, a null sequence becomes an
//! empty sequence (multiplicity 0 for the telescope list), and a null element inside a
//! sequence becomes NaN (or an invalid id for the telescope list). Downstream stages treat
//! all of these as absent measurements.

use std::fs::File;

use arrow_array::{Array, Float32Array, Float64Array, Int32Array, ListArray, RecordBatch, UInt32Array};
use camino::Utf8Path;
use parquet::arrow::arrow_reader::{ParquetRecordBatchReader, ParquetRecordBatchReaderBuilder};
use parquet::arrow::ProjectionMask;

use crate::constants::{SensorList, SensorSeq, SENSOR_LIST_COLUMN, SENSOR_VARIABLES};
use crate::dispdir_errors::DispdirError;
use crate::events::event_batch::EventBatch;

/// Whole-event scalar columns required from the input store.
const SCALAR_COLUMNS: [&str; 6] = [
    "Xoff",
    "Yoff",
    "Xoff_intersect",
    "Yoff_intersect",
    "fpointing_dx",
    "fpointing_dy",
];

/// Every column the reconstruction needs from the input store.
fn required_columns() -> Vec<&'static str> {
    let mut columns = vec![SENSOR_LIST_COLUMN];
    columns.extend(SCALAR_COLUMNS);
    columns.extend(SENSOR_VARIABLES);
    columns
}

/// Streaming, projection-first reader over a Parquet event store.
///
/// Yields one [`EventBatch`] per underlying record batch, in file order. Construction
/// validates the schema; iteration surfaces decode and I/O errors per batch.
pub struct EventStoreReader {
    reader: ParquetRecordBatchReader,
}

impl EventStoreReader {
    /// Open a Parquet event store and prepare a projected, chunked reader.
    ///
    /// Arguments
    /// -----------------
    /// * `path`: input Parquet file.
    /// * `batch_size`: number of rows per record batch (bounds peak memory).
    ///
    /// Return
    /// ----------
    /// * A reader iterating [`EventBatch`]es, or an error if the file cannot be opened or a
    ///   required column is absent.
    pub fn open(path: &Utf8Path, batch_size: usize) -> Result<Self, DispdirError> {
        let file = File::open(path)?;
        let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;

        // Resolve required columns by name once; a missing column aborts here,
        // before any event data is touched.
        let file_schema = builder.schema().clone();
        let root_indices = required_columns()
            .into_iter()
            .map(|name| {
                file_schema
                    .fields()
                    .iter()
                    .position(|field| field.name() == name)
                    .ok_or_else(|| DispdirError::MissingColumn(name.to_string()))
            })
            .collect::<Result<Vec<usize>, _>>()?;
        let mask = ProjectionMask::roots(builder.parquet_schema(), root_indices);

        let reader = builder
            .with_projection(mask)
            .with_batch_size(batch_size)
            .build()?;

        Ok(Self { reader })
    }
}

impl Iterator for EventStoreReader {
    type Item = Result<EventBatch, DispdirError>;

    fn next(&mut self) -> Option<Self::Item> {
        let batch = self.reader.next()?;
        Some(
            batch
                .map_err(DispdirError::from)
                .and_then(|record_batch| decode_batch(&record_batch)),
        )
    }
}

/// Decode one projected record batch into an [`EventBatch`].
pub(crate) fn decode_batch(batch: &RecordBatch) -> Result<EventBatch, DispdirError> {
    let sensor_lists = sensor_list_column(batch, SENSOR_LIST_COLUMN)?;

    let xoff = scalar_f32_column(batch, "Xoff")?;
    let yoff = scalar_f32_column(batch, "Yoff")?;
    let xoff_intersect = scalar_f32_column(batch, "Xoff_intersect")?;
    let yoff_intersect = scalar_f32_column(batch, "Yoff_intersect")?;
    let pointing_dx = scalar_f32_column(batch, "fpointing_dx")?;
    let pointing_dy = scalar_f32_column(batch, "fpointing_dy")?;

    let mut sensor_vars = Vec::with_capacity(SENSOR_VARIABLES.len());
    for name in SENSOR_VARIABLES {
        sensor_vars.push(float_seq_column(batch, name)?);
    }

    Ok(EventBatch {
        sensor_lists,
        xoff,
        yoff,
        xoff_intersect,
        yoff_intersect,
        pointing_dx,
        pointing_dy,
        sensor_vars,
    })
}

fn column<'a>(
    batch: &'a RecordBatch,
    name: &str,
) -> Result<&'a arrow_array::ArrayRef, DispdirError> {
    batch
        .column_by_name(name)
        .ok_or_else(|| DispdirError::MissingColumn(name.to_string()))
}

/// Read a scalar column as f32, accepting Float32 or Float64 storage.
///
/// Null entries become NaN so that row count is preserved no matter how sparse the input.
fn scalar_f32_column(batch: &RecordBatch, name: &str) -> Result<Vec<f32>, DispdirError> {
    let col = column(batch, name)?;

    if let Some(arr) = col.as_any().downcast_ref::<Float32Array>() {
        // Fast path for fully populated columns: plain slice copy.
        if arr.nulls().is_none() {
            return Ok(arr.values().to_vec());
        }
        return Ok((0..arr.len())
            .map(|i| if arr.is_null(i) { f32::NAN } else { arr.value(i) })
            .collect());
    }
    if let Some(arr) = col.as_any().downcast_ref::<Float64Array>() {
        return Ok((0..arr.len())
            .map(|i| {
                if arr.is_null(i) {
                    f32::NAN
                } else {
                    arr.value(i) as f32
                }
            })
            .collect());
    }

    Err(DispdirError::UnsupportedColumnType {
        column: name.to_string(),
        data_type: col.data_type().to_string(),
    })
}

/// Read a variable-length float-sequence column, accepting List<Float32> or List<Float64>.
fn float_seq_column(batch: &RecordBatch, name: &str) -> Result<Vec<SensorSeq>, DispdirError> {
    let col = column(batch, name)?;
    let list = col
        .as_any()
        .downcast_ref::<ListArray>()
        .ok_or_else(|| DispdirError::UnsupportedColumnType {
            column: name.to_string(),
            data_type: col.data_type().to_string(),
        })?;

    let offsets = list.value_offsets();
    let values = list.values();

    if let Some(vals) = values.as_any().downcast_ref::<Float32Array>() {
        Ok(decode_sequences(list, offsets, |j| {
            if vals.is_null(j) {
                f32::NAN
            } else {
                vals.value(j)
            }
        }))
    } else if let Some(vals) = values.as_any().downcast_ref::<Float64Array>() {
        Ok(decode_sequences(list, offsets, |j| {
            if vals.is_null(j) {
                f32::NAN
            } else {
                vals.value(j) as f32
            }
        }))
    } else {
        Err(DispdirError::UnsupportedColumnType {
            column: name.to_string(),
            data_type: col.data_type().to_string(),
        })
    }
}

/// Read the telescope-id list column, accepting List<Int32> or List<UInt32>.
///
/// Null ids are replaced by -1, which every later slot lookup treats as out of range.
fn sensor_list_column(batch: &RecordBatch, name: &str) -> Result<Vec<SensorList>, DispdirError> {
    let col = column(batch, name)?;
    let list = col
        .as_any()
        .downcast_ref::<ListArray>()
        .ok_or_else(|| DispdirError::UnsupportedColumnType {
            column: name.to_string(),
            data_type: col.data_type().to_string(),
        })?;

    let offsets = list.value_offsets();
    let values = list.values();

    if let Some(vals) = values.as_any().downcast_ref::<Int32Array>() {
        Ok(decode_sequences(list, offsets, |j| {
            if vals.is_null(j) {
                -1
            } else {
                vals.value(j)
            }
        }))
    } else if let Some(vals) = values.as_any().downcast_ref::<UInt32Array>() {
        Ok(decode_sequences(list, offsets, |j| {
            if vals.is_null(j) {
                -1
            } else {
                vals.value(j) as i32
            }
        }))
    } else {
        Err(DispdirError::UnsupportedColumnType {
            column: name.to_string(),
            data_type: col.data_type().to_string(),
        })
    }
}

/// Expand list offsets into per-row small vectors; null rows become empty sequences.
fn decode_sequences<T, F>(
    list: &ListArray,
    offsets: &[i32],
    value_at: F,
) -> Vec<smallvec::SmallVec<[T; 4]>>
where
    T: Copy,
    F: Fn(usize) -> T,
    [T; 4]: smallvec::Array<Item = T>,
{
    let mut out = Vec::with_capacity(list.len());
    for i in 0..list.len() {
        if list.is_null(i) {
            out.push(smallvec::SmallVec::new());
            continue;
        }
        let start = offsets[i] as usize;
        let end = offsets[i + 1] as usize;
        let mut seq = smallvec::SmallVec::with_capacity(end - start);
        for j in start..end {
            seq.push(value_at(j));
        }
        out.push(seq);
    }
    out
}
