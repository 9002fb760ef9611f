pub mod file_error;
pub mod measurement;
pub mod quality_level;
pub mod station_result;

pub use file_error::FileError;
pub use measurement::{LoadOutcome, Measurement, StationDataset};
pub use quality_level::QualityLevel;
pub use station_result::StationResult;
