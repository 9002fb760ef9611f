use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{ProcessingError, Result};
use crate::models::QualityLevel;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct StationResult {
    #[validate(length(min = 1))]
    pub station: String,

    pub level: QualityLevel,

    pub valid_days: usize,

    /// Denominator of `valid_days_percentage`: observed days or the length
    /// of the analysis period, depending on the configured basis.
    pub total_days: usize,

    /// Distinct dates present in the file (after period filtering).
    pub observed_days: usize,

    #[validate(range(min = 0.0, max = 100.0))]
    pub valid_days_percentage: f64,

    pub qualifies: bool,

    pub total_measurements: usize,
    pub mean_measurements_per_day: f64,
    pub min_measurements_per_day: usize,
    pub max_measurements_per_day: usize,

    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,

    pub representative_days: usize,

    #[validate(range(min = 0.0, max = 100.0))]
    pub representative_days_percentage: f64,
}

impl StationResult {
    /// Range checks plus day counts that must not exceed their denominator.
    pub fn check(&self) -> Result<()> {
        if self.valid_days > self.total_days || self.representative_days > self.total_days {
            return Err(ProcessingError::InvalidFormat(format!(
                "{}: {} valid and {} representative days exceed {} total days",
                self.station, self.valid_days, self.representative_days, self.total_days
            )));
        }

        self.validate()?;

        Ok(())
    }

    pub fn summary_line(&self) -> String {
        format!(
            "{}: {} valid days of {} ({:.2}%)",
            self.station, self.valid_days, self.total_days, self.valid_days_percentage
        )
    }

    pub fn period(&self) -> String {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) => format!("{} to {}", start, end),
            _ => "no data".to_string(),
        }
    }
}
