//! # Parquet writer for direction predictions
//!
//! Writer counterpart of the event reader: appends one two-column record batch
//! (`Dir_Xoff`, `Dir_Yoff`, both `Float32`) per processed chunk and finalizes the file
//! footer on [`PredictionWriter::close`].
//!
//! Each [`PredictionWriter::write`] call flushes the chunk's row group to disk before the
//! next chunk is pulled, so an interrupted run loses at most the batch in flight.

use std::fs::File;
use std::sync::Arc;

use arrow_array::{Float32Array, RecordBatch};
use arrow_schema::{DataType, Field, Schema, SchemaRef};
use camino::Utf8Path;
use parquet::arrow::ArrowWriter;

use crate::dispatch::BatchPredictions;
use crate::dispdir_errors::DispdirError;

/// Append-only writer producing the two-column prediction table.
pub struct PredictionWriter {
    writer: ArrowWriter<File>,
    schema: SchemaRef,
}

impl PredictionWriter {
    /// Create the output file and write the schema header.
    ///
    /// Fails immediately if the file cannot be created, so no partially configured output
    /// ever receives event data.
    pub fn create(path: &Utf8Path) -> Result<Self, DispdirError> {
        let schema: SchemaRef = Arc::new(Schema::new(vec![
            Field::new("Dir_Xoff", DataType::Float32, false),
            Field::new("Dir_Yoff", DataType::Float32, false),
        ]));
        let file = File::create(path)?;
        let writer = ArrowWriter::try_new(file, schema.clone(), None)?;
        Ok(Self { writer, schema })
    }

    /// Append one batch of predictions and flush its row group to disk.
    pub fn write(&mut self, predictions: &BatchPredictions) -> Result<(), DispdirError> {
        let batch = RecordBatch::try_new(
            self.schema.clone(),
            vec![
                Arc::new(Float32Array::from(predictions.xoff.clone())),
                Arc::new(Float32Array::from(predictions.yoff.clone())),
            ],
        )?;
        self.writer.write(&batch)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Finalize the Parquet footer. Must be called once streaming is done; dropping the
    /// writer without closing leaves an unreadable file.
    pub fn close(self) -> Result<(), DispdirError> {
        self.writer.close()?;
        Ok(())
    }
}
