pub mod availability_processor;

pub use availability_processor::{AnalysisRun, AvailabilityProcessor, EmptyFile, LevelFiles};
