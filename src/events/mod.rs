//! # Events: columnar batches and Parquet I/O
//!
//! Ingestion and output layer of the reconstruction pipeline. The central type is
//! [`EventBatch`](event_batch::EventBatch), one decoded chunk of events in columnar form.
//!
//! Modules
//! -----------------
//! * [`event_batch`] - In-memory columnar batch (telescope lists, whole-event scalars,
//!   per-telescope variable columns).
//! * [`parquet_reader`] - Projection-first Arrow/Parquet reader yielding one batch per
//!   record batch, with fail-fast schema validation.
//! * [`parquet_writer`] - Two-column `Float32` prediction writer, flushed once per batch.
//!
//! Readers and writers preserve event count and order exactly; no stage of the pipeline
//! drops or reorders rows.

pub mod event_batch;
pub mod parquet_reader;
pub mod parquet_writer;
