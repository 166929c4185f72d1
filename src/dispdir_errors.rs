use thiserror::Error;

#[derive(Error, Debug)]
pub enum DispdirError {
    #[error(
        "Invalid image selection format: {0}. \
         Use a bit-coded value (e.g. 14) or comma-separated indices (e.g. '1,2,3')"
    )]
    InvalidImageSelection(String),

    #[error("Column '{0}' not found in input schema")]
    MissingColumn(String),

    #[error("Column '{column}' has unsupported type: {data_type}")]
    UnsupportedColumnType { column: String, data_type: String },

    #[error("Unable to perform file operation: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Parquet error: {0}")]
    ParquetError(#[from] parquet::errors::ParquetError),

    #[error("Arrow error: {0}")]
    ArrowError(#[from] arrow_schema::ArrowError),

    #[error("Model error: {0}")]
    ModelError(String),

    #[error("Regressor returned {returned} predictions for {expected} events")]
    PredictionShape { expected: usize, returned: usize },
}
