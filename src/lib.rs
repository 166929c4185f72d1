pub mod constants;
pub mod dispatch;
pub mod dispdir_errors;
pub mod events;
pub mod features;
pub mod models;
pub mod selection;
pub mod stream;

pub use constants::{SELECTION_SENTINEL, SensorList, SensorSeq};
pub use dispatch::{apply_models, BatchPredictions};
pub use dispdir_errors::DispdirError;
pub use events::event_batch::EventBatch;
pub use models::registry::ModelRegistry;
pub use models::OffsetRegressor;
pub use selection::ImageSelection;
pub use stream::{process_file_chunked, run, PredictionConfig, StreamSummary};
