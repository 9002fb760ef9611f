use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::models::QualityLevel;

/// One AOD observation. `aod` is `None` when the cell held the missing-value
/// sentinel or could not be parsed as a number.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub date: NaiveDate,
    pub aod: Option<f64>,
}

impl Measurement {
    pub fn new(date: NaiveDate, aod: Option<f64>) -> Self {
        Self { date, aod }
    }

    pub fn is_valid(&self) -> bool {
        self.aod.is_some()
    }
}

/// All observations of one station at one quality level, in file order.
#[derive(Debug, Clone)]
pub struct StationDataset {
    pub station: String,
    pub level: QualityLevel,
    pub path: PathBuf,
    pub measurements: Vec<Measurement>,
}

impl StationDataset {
    pub fn new(
        station: String,
        level: QualityLevel,
        path: PathBuf,
        measurements: Vec<Measurement>,
    ) -> Self {
        Self {
            station,
            level,
            path,
            measurements,
        }
    }

    pub fn len(&self) -> usize {
        self.measurements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.measurements.is_empty()
    }

    pub fn valid_measurements(&self) -> usize {
        self.measurements.iter().filter(|m| m.is_valid()).count()
    }

    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.measurements.iter().map(|m| m.date).min()?;
        let last = self.measurements.iter().map(|m| m.date).max()?;
        Some((first, last))
    }
}

/// Result of loading a station file. Empty files are not errors: they are
/// listed separately and never produce a station result.
#[derive(Debug, Clone)]
pub enum LoadOutcome {
    Loaded(StationDataset),
    Empty,
}

impl LoadOutcome {
    pub fn is_empty(&self) -> bool {
        matches!(self, LoadOutcome::Empty)
    }
}
