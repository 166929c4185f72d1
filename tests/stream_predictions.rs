mod common;

use std::fs::File;
use std::sync::Arc;

use arrow_array::builder::{Float32Builder, Int32Builder, ListBuilder};
use arrow_array::{Array, ArrayRef, Float32Array, RecordBatch};
use camino::{Utf8Path, Utf8PathBuf};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;

use common::stub_registry;
use dispdir::constants::SENSOR_VARIABLES;
use dispdir::{
    process_file_chunked, DispdirError, ImageSelection, PredictionConfig, SELECTION_SENTINEL,
};

/// Write a fully populated event store: the given telescope lists, row-index scalars, and
/// every per-telescope variable stored over the full 4-telescope width.
fn write_events_parquet(path: &Utf8Path, tel_lists: &[Vec<i32>]) {
    let n = tel_lists.len();
    let mut columns: Vec<(&str, ArrayRef)> = Vec::new();

    let mut tel_builder = ListBuilder::new(Int32Builder::new());
    for list in tel_lists {
        tel_builder.values().append_slice(list);
        tel_builder.append(true);
    }
    columns.push(("DispTelList_T", Arc::new(tel_builder.finish()) as ArrayRef));

    for name in [
        "Xoff",
        "Yoff",
        "Xoff_intersect",
        "Yoff_intersect",
        "fpointing_dx",
        "fpointing_dy",
    ] {
        let values: Vec<f32> = (0..n).map(|i| i as f32 * 0.1).collect();
        columns.push((name, Arc::new(Float32Array::from(values)) as ArrayRef));
    }

    for var in SENSOR_VARIABLES {
        let mut builder = ListBuilder::new(Float32Builder::new());
        for _ in 0..n {
            builder.values().append_slice(&[1.0, 2.0, 3.0, 4.0]);
            builder.append(true);
        }
        columns.push((var, Arc::new(builder.finish()) as ArrayRef));
    }

    let batch = RecordBatch::try_from_iter(columns).unwrap();
    let file = File::create(path).unwrap();
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None).unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();
}

fn read_predictions(path: &Utf8Path) -> (Vec<f32>, Vec<f32>) {
    let file = File::open(path).unwrap();
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)
        .unwrap()
        .build()
        .unwrap();

    let (mut xs, mut ys) = (Vec::new(), Vec::new());
    for batch in reader {
        let batch = batch.unwrap();
        let x = batch
            .column_by_name("Dir_Xoff")
            .unwrap()
            .as_any()
            .downcast_ref::<Float32Array>()
            .unwrap();
        let y = batch
            .column_by_name("Dir_Yoff")
            .unwrap()
            .as_any()
            .downcast_ref::<Float32Array>()
            .unwrap();
        xs.extend((0..x.len()).map(|i| x.value(i)));
        ys.extend((0..y.len()).map(|i| y.value(i)));
    }
    (xs, ys)
}

fn test_config(dir: &Utf8Path, batch_size: usize) -> PredictionConfig {
    PredictionConfig {
        input: dir.join("events.parquet"),
        model_dir: dir.join("models"),
        output: dir.join("predictions.parquet"),
        image_selection: None,
        max_events: None,
        batch_size,
    }
}

fn temp_dir() -> (tempfile::TempDir, Utf8PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
    (dir, path)
}

#[test]
fn test_stream_end_to_end_with_selection() {
    let _ = tracing_subscriber::fmt::try_init();
    let (_guard, dir) = temp_dir();

    write_events_parquet(
        &dir.join("events.parquet"),
        &[
            vec![1, 2, 3],
            vec![1, 3],
            vec![0, 1, 2, 3],
            vec![0, 1],
            vec![1, 2, 3],
        ],
    );

    let config = test_config(&dir, 500_000);
    let selection = ImageSelection::parse(Some("1,2,3")).unwrap();
    let summary = process_file_chunked(&config, &stub_registry(), &selection).unwrap();
    assert_eq!(summary.events_processed, 5);

    let (xs, ys) = read_predictions(&config.output);
    assert_eq!(
        xs,
        [3.0, SELECTION_SENTINEL, 4.0, SELECTION_SENTINEL, 3.0]
    );
    assert_eq!(
        ys,
        [-3.0, SELECTION_SENTINEL, -4.0, SELECTION_SENTINEL, -3.0]
    );
}

#[test]
fn test_stream_preserves_order_across_batches() {
    let (_guard, dir) = temp_dir();

    let tel_lists: Vec<Vec<i32>> = (0..9)
        .map(|i| match i % 3 {
            0 => vec![0, 1],
            1 => vec![0, 1, 2],
            _ => vec![0, 1, 2, 3],
        })
        .collect();
    write_events_parquet(&dir.join("events.parquet"), &tel_lists);

    // Two-row batches force the order guarantee across chunk boundaries.
    let config = test_config(&dir, 2);
    let summary =
        process_file_chunked(&config, &stub_registry(), &ImageSelection::All).unwrap();
    assert_eq!(summary.events_processed, 9);

    let (xs, ys) = read_predictions(&config.output);
    assert_eq!(xs.len(), 9);
    for (i, (&x, &y)) in xs.iter().zip(&ys).enumerate() {
        let expected = match i % 3 {
            0 => 2.0,
            1 => 3.0,
            _ => 4.0,
        };
        assert_eq!(x, expected, "row {i}");
        assert_eq!(y, -expected, "row {i}");
    }
}

#[test]
fn test_event_budget_is_checked_between_batches() {
    let (_guard, dir) = temp_dir();

    let tel_lists: Vec<Vec<i32>> = (0..5).map(|_| vec![0, 1]).collect();
    write_events_parquet(&dir.join("events.parquet"), &tel_lists);

    // Budget of 3 with two-row batches: the second batch starts while the total is still
    // below the cap and runs to completion, the third is never pulled.
    let mut config = test_config(&dir, 2);
    config.max_events = Some(3);
    let summary =
        process_file_chunked(&config, &stub_registry(), &ImageSelection::All).unwrap();
    assert_eq!(summary.events_processed, 4);

    let (xs, _) = read_predictions(&config.output);
    assert_eq!(xs.len(), 4);
}

#[test]
fn test_empty_input_produces_valid_empty_output() {
    let (_guard, dir) = temp_dir();

    write_events_parquet(&dir.join("events.parquet"), &[]);

    let config = test_config(&dir, 1000);
    let summary =
        process_file_chunked(&config, &stub_registry(), &ImageSelection::All).unwrap();
    assert_eq!(summary.events_processed, 0);

    let (xs, ys) = read_predictions(&config.output);
    assert!(xs.is_empty() && ys.is_empty());
}

#[test]
fn test_missing_required_column_fails_at_open() {
    let (_guard, dir) = temp_dir();

    // A file with only the telescope list lacks every scalar and variable column.
    let mut tel_builder = ListBuilder::new(Int32Builder::new());
    tel_builder.values().append_slice(&[0, 1]);
    tel_builder.append(true);
    let batch = RecordBatch::try_from_iter([(
        "DispTelList_T",
        Arc::new(tel_builder.finish()) as ArrayRef,
    )])
    .unwrap();
    let input = dir.join("events.parquet");
    let file = File::create(&input).unwrap();
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None).unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();

    let config = test_config(&dir, 1000);
    let err = process_file_chunked(&config, &stub_registry(), &ImageSelection::All)
        .unwrap_err();
    assert!(matches!(err, DispdirError::MissingColumn(_)));
}

#[test]
fn test_unmodeled_multiplicity_written_as_nan() {
    let (_guard, dir) = temp_dir();

    write_events_parquet(
        &dir.join("events.parquet"),
        &[vec![0], vec![0, 1, 2], vec![3]],
    );

    let config = test_config(&dir, 1000);
    let summary =
        process_file_chunked(&config, &stub_registry(), &ImageSelection::All).unwrap();
    assert_eq!(summary.events_processed, 3);

    let (xs, ys) = read_predictions(&config.output);
    assert!(xs[0].is_nan() && ys[0].is_nan());
    assert_eq!(xs[1], 3.0);
    assert!(xs[2].is_nan() && ys[2].is_nan());
}
