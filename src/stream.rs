//! # Chunked streaming driver
//!
//! Drives the full reconstruction across an arbitrarily large input file without holding
//! more than one chunk of events in memory.
//!
//! ## Overview
//! -----------------
//! [`run`] is the high-level entry point: it parses the telescope selection (failing fast
//! on a malformed string), loads the model registry once, then hands over to
//! [`process_file_chunked`], which owns the read/dispatch/write loop:
//!
//! 1. Stop pulling when the optional event budget is already met.
//! 2. Pull the next record batch from the input store (projected columns only), skipping
//!    empty ones.
//! 3. Dispatch the batch through the models.
//! 4. Write the two-column prediction table for the batch immediately, before pulling the
//!    next one, so an interrupted run loses at most the batch in flight.
//!
//! The budget is checked **before** a batch is started, never in the middle of one: a
//! batch that begins processing always runs to completion and is written whole.
//!
//! ## Ordering guarantee
//! -----------------
//! Batches are read, processed, and written strictly one at a time in file order, and the
//! dispatcher preserves row order within each batch, so row `i` of the output file always
//! corresponds to row `i` of the input file.

use std::time::Instant;

use camino::Utf8PathBuf;
use serde::Deserialize;
use tracing::info;

use crate::constants::DEFAULT_BATCH_SIZE;
use crate::dispatch::apply_models;
use crate::dispdir_errors::DispdirError;
use crate::events::parquet_reader::EventStoreReader;
use crate::events::parquet_writer::PredictionWriter;
use crate::models::registry::ModelRegistry;
use crate::selection::ImageSelection;

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

/// Run configuration, owned by the caller (CLI layer, notebook, test harness).
#[derive(Debug, Clone, Deserialize)]
pub struct PredictionConfig {
    /// Input Parquet event store.
    pub input: Utf8PathBuf,
    /// Directory holding the serialized per-multiplicity models.
    pub model_dir: Utf8PathBuf,
    /// Output Parquet file for the two prediction columns.
    pub output: Utf8PathBuf,
    /// Optional telescope selection string (bit-coded or comma-separated indices);
    /// absent means no filtering.
    #[serde(default)]
    pub image_selection: Option<String>,
    /// Optional cap on the number of events to process.
    #[serde(default)]
    pub max_events: Option<u64>,
    /// Events per chunk pulled from the input store.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

/// Totals reported once streaming completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamSummary {
    /// Events processed and written to the output store.
    pub events_processed: u64,
}

/// Load the models and stream the whole input file through them.
///
/// Arguments
/// -----------------
/// * `config`: paths, selection string, event budget, and chunk size.
///
/// Return
/// ----------
/// * The streaming totals, or the first fatal error (malformed selection, unreadable
///   store, model deserialization failure, write failure).
pub fn run(config: &PredictionConfig) -> Result<StreamSummary, DispdirError> {
    let start = Instant::now();
    info!(input = %config.input, "input file");
    info!(model_dir = %config.model_dir, "model directory");
    info!(output = %config.output, "output file");
    info!(batch_size = config.batch_size, "chunk size");
    if let Some(max_events) = config.max_events {
        info!(max_events, "maximum events to process");
    }

    // Parse the selection before anything touches the data: a malformed string must
    // abort with nothing read and nothing written.
    let selection = ImageSelection::parse(config.image_selection.as_deref())?;
    if selection.is_filtering() {
        info!(selection = ?selection, "image selection active");
    }

    let registry = ModelRegistry::load(&config.model_dir)?;

    let summary = process_file_chunked(config, &registry, &selection)?;

    info!(
        events = summary.events_processed,
        elapsed = ?start.elapsed(),
        "processing complete"
    );
    Ok(summary)
}

/// Stream events chunk by chunk through an already loaded registry.
///
/// Separated from [`run`] so callers can inject their own regressors (tests use constant
/// stubs through [`ModelRegistry::from_models`]).
pub fn process_file_chunked(
    config: &PredictionConfig,
    registry: &ModelRegistry,
    selection: &ImageSelection,
) -> Result<StreamSummary, DispdirError> {
    let mut reader = EventStoreReader::open(&config.input, config.batch_size)?;
    let mut writer = PredictionWriter::create(&config.output)?;

    let mut total_processed: u64 = 0;
    loop {
        // Budget check happens before the next batch is pulled; a started batch always
        // runs to completion.
        if let Some(max_events) = config.max_events {
            if total_processed >= max_events {
                break;
            }
        }
        let Some(batch) = reader.next() else {
            break;
        };
        let batch = batch?;
        if batch.is_empty() {
            continue;
        }

        let predictions = apply_models(&batch, registry, selection)?;
        writer.write(&predictions)?;

        total_processed += batch.len() as u64;
        info!(total_processed, "processed events so far");
    }
    writer.close()?;

    info!(total_processed, "streaming complete");
    Ok(StreamSummary {
        events_processed: total_processed,
    })
}
