use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::models::QualityLevel;

/// A non-fatal failure attached to the file (or chart) that caused it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileError {
    pub level: QualityLevel,
    pub station: String,
    pub path: PathBuf,
    pub message: String,
}

impl FileError {
    pub fn new(
        level: QualityLevel,
        station: impl Into<String>,
        path: impl Into<PathBuf>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            level,
            station: station.into(),
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} ({}): {}",
            self.level,
            self.station,
            self.path.display(),
            self.message
        )
    }
}
