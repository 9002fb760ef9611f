use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::analysis::distribution::{quantile, FrequencyDistribution};
use crate::models::{StationDataset, StationResult};
use crate::settings::Settings;
use crate::utils::constants::{MIN_MEASUREMENTS_PER_DAY, MIN_VALID_DAYS_PERCENTAGE};

/// What the valid-day count is divided by.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum PercentageBasis {
    /// Distinct dates present in the station file.
    #[default]
    ObservedDays,
    /// Every calendar day of the configured analysis period.
    AnalysisPeriod,
}

/// Inclusive date filter. Either bound may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateWindow {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.map_or(true, |start| date >= start) && self.end.map_or(true, |end| date <= end)
    }

    /// Calendar days in the window, `None` when a bound is open.
    pub fn span_days(&self) -> Option<usize> {
        let (start, end) = (self.start?, self.end?);
        if end < start {
            return Some(0);
        }
        Some((end - start).num_days() as usize + 1)
    }
}

/// Valid measurements per calendar day. Days whose rows are all missing
/// values are kept with a zero count.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DailyCounts {
    days: BTreeMap<NaiveDate, usize>,
}

impl DailyCounts {
    pub fn from_dataset(dataset: &StationDataset, window: &DateWindow) -> Self {
        let mut days = BTreeMap::new();
        for measurement in dataset
            .measurements
            .iter()
            .filter(|m| window.contains(m.date))
        {
            let count = days.entry(measurement.date).or_insert(0);
            if measurement.is_valid() {
                *count += 1;
            }
        }
        Self { days }
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, usize)> + '_ {
        self.days.iter().map(|(&date, &count)| (date, count))
    }

    pub fn get(&self, date: NaiveDate) -> Option<usize> {
        self.days.get(&date).copied()
    }

    /// Number of observed days.
    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn total_measurements(&self) -> usize {
        self.days.values().sum()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.days.keys().next().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.days.keys().next_back().copied()
    }

    pub fn mean(&self) -> f64 {
        if self.days.is_empty() {
            return 0.0;
        }
        self.total_measurements() as f64 / self.days.len() as f64
    }

    pub fn median(&self) -> Option<f64> {
        let values: Vec<f64> = self.days.values().map(|&c| c as f64).collect();
        quantile(&values, 0.5)
    }

    pub fn frequency_distribution(&self) -> FrequencyDistribution {
        FrequencyDistribution::from_counts(self.days.values().copied())
    }
}

/// Percentage of `valid` over `total`, 0 when `total` is 0.
///
/// Multiplies before dividing so that exact ratios stay exact (3 of 10 is
/// 30.0, not 29.999...).
pub fn valid_day_percentage(valid: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (valid as f64 * 100.0 / total as f64).clamp(0.0, 100.0)
}

pub struct AvailabilityCalculator {
    min_measurements_per_day: usize,
    min_valid_days_percentage: f64,
    window: DateWindow,
    basis: PercentageBasis,
}

impl AvailabilityCalculator {
    pub fn new() -> Self {
        Self {
            min_measurements_per_day: MIN_MEASUREMENTS_PER_DAY,
            min_valid_days_percentage: MIN_VALID_DAYS_PERCENTAGE,
            window: DateWindow::unbounded(),
            basis: PercentageBasis::ObservedDays,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new()
            .with_min_measurements_per_day(settings.min_measurements_per_day)
            .with_min_valid_days_percentage(settings.min_valid_days_percentage)
            .with_window(settings.window())
            .with_basis(settings.basis)
    }

    pub fn with_min_measurements_per_day(mut self, min: usize) -> Self {
        self.min_measurements_per_day = min;
        self
    }

    pub fn with_min_valid_days_percentage(mut self, percentage: f64) -> Self {
        self.min_valid_days_percentage = percentage;
        self
    }

    pub fn with_window(mut self, window: DateWindow) -> Self {
        self.window = window;
        self
    }

    pub fn with_basis(mut self, basis: PercentageBasis) -> Self {
        self.basis = basis;
        self
    }

    pub fn min_measurements_per_day(&self) -> usize {
        self.min_measurements_per_day
    }

    pub fn min_valid_days_percentage(&self) -> f64 {
        self.min_valid_days_percentage
    }

    pub fn daily_counts(&self, dataset: &StationDataset) -> DailyCounts {
        DailyCounts::from_dataset(dataset, &self.window)
    }

    pub fn is_valid_day(&self, count: usize) -> bool {
        count >= self.min_measurements_per_day
    }

    pub fn valid_days(&self, counts: &DailyCounts) -> usize {
        counts.iter().filter(|(_, c)| self.is_valid_day(*c)).count()
    }

    pub fn qualifies(&self, percentage: f64) -> bool {
        percentage >= self.min_valid_days_percentage
    }

    /// Days the percentages are computed against.
    pub fn denominator(&self, counts: &DailyCounts) -> usize {
        match self.basis {
            PercentageBasis::ObservedDays => counts.len(),
            PercentageBasis::AnalysisPeriod => {
                self.window.span_days().unwrap_or_else(|| counts.len())
            }
        }
    }

    pub fn calculate(&self, dataset: &StationDataset) -> StationResult {
        let counts = self.daily_counts(dataset);
        self.calculate_from_counts(dataset, &counts)
    }

    pub fn calculate_from_counts(
        &self,
        dataset: &StationDataset,
        counts: &DailyCounts,
    ) -> StationResult {
        let valid_days = self.valid_days(counts);
        let total_days = self.denominator(counts);
        let valid_days_percentage = valid_day_percentage(valid_days, total_days);

        let representative_days = match counts.median() {
            Some(median) => counts.iter().filter(|(_, c)| *c as f64 >= median).count(),
            None => 0,
        };

        StationResult {
            station: dataset.station.clone(),
            level: dataset.level,
            valid_days,
            total_days,
            observed_days: counts.len(),
            valid_days_percentage,
            qualifies: self.qualifies(valid_days_percentage),
            total_measurements: counts.total_measurements(),
            mean_measurements_per_day: counts.mean(),
            min_measurements_per_day: counts.iter().map(|(_, c)| c).min().unwrap_or(0),
            max_measurements_per_day: counts.iter().map(|(_, c)| c).max().unwrap_or(0),
            start_date: counts.first_date(),
            end_date: counts.last_date(),
            representative_days,
            representative_days_percentage: valid_day_percentage(representative_days, total_days),
        }
    }
}

impl Default for AvailabilityCalculator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Measurement, QualityLevel};
    use std::path::PathBuf;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 1, d).unwrap()
    }

    /// Builds a dataset where day `i + 1` carries `per_day[i]` valid rows.
    fn dataset(per_day: &[usize]) -> StationDataset {
        let mut measurements = Vec::new();
        for (i, &count) in per_day.iter().enumerate() {
            let date = day(i as u32 + 1);
            if count == 0 {
                measurements.push(Measurement::new(date, None));
            }
            for n in 0..count {
                measurements.push(Measurement::new(date, Some(0.1 + n as f64 * 0.01)));
            }
        }
        StationDataset::new(
            "Cuiaba-Miranda".to_string(),
            QualityLevel::Level20,
            PathBuf::from("Cuiaba-Miranda.txt"),
            measurements,
        )
    }

    #[test]
    fn test_day_threshold_is_inclusive() {
        let calc = AvailabilityCalculator::new();
        assert!(calc.is_valid_day(8));
        assert!(!calc.is_valid_day(7));

        let result = calc.calculate(&dataset(&[8, 7]));
        assert_eq!(result.valid_days, 1);
        assert_eq!(result.total_days, 2);
        assert_eq!(result.valid_days_percentage, 50.0);
    }

    #[test]
    fn test_station_threshold_is_inclusive() {
        let calc = AvailabilityCalculator::new();

        // 3 of 10 days valid: exactly 30%
        let result = calc.calculate(&dataset(&[8, 8, 8, 1, 1, 1, 1, 1, 1, 1]));
        assert_eq!(result.valid_days_percentage, 30.0);
        assert!(result.qualifies);

        // 29 of 100 days valid: one point below
        let mut per_day = vec![9; 29];
        per_day.extend(vec![2; 71]);
        let result = calc.calculate(&dataset_long(&per_day));
        assert_eq!(result.valid_days_percentage, 29.0);
        assert!(!result.qualifies);
    }

    fn dataset_long(per_day: &[usize]) -> StationDataset {
        let start = day(1);
        let mut measurements = Vec::new();
        for (i, &count) in per_day.iter().enumerate() {
            let date = start + chrono::Duration::days(i as i64);
            for _ in 0..count {
                measurements.push(Measurement::new(date, Some(0.3)));
            }
        }
        StationDataset::new(
            "Rio_Branco".to_string(),
            QualityLevel::Level15,
            PathBuf::from("Rio_Branco.txt"),
            measurements,
        )
    }

    #[test]
    fn test_missing_values_do_not_count() {
        let date = day(5);
        let mut measurements = vec![Measurement::new(date, None); 10];
        measurements.extend(vec![Measurement::new(date, Some(0.2)); 7]);
        let dataset = StationDataset::new(
            "Alta_Floresta".to_string(),
            QualityLevel::Level10,
            PathBuf::from("Alta_Floresta.txt"),
            measurements,
        );

        let calc = AvailabilityCalculator::new();
        let counts = calc.daily_counts(&dataset);
        assert_eq!(counts.get(date), Some(7));
        assert_eq!(counts.len(), 1);
        assert_eq!(calc.valid_days(&counts), 0);
    }

    #[test]
    fn test_all_missing_day_is_still_observed() {
        let calc = AvailabilityCalculator::new();
        let result = calc.calculate(&dataset(&[0, 8]));
        assert_eq!(result.observed_days, 2);
        assert_eq!(result.valid_days, 1);
        assert_eq!(result.min_measurements_per_day, 0);
        assert_eq!(result.max_measurements_per_day, 8);
    }

    #[test]
    fn test_window_filters_rows() {
        let calc = AvailabilityCalculator::new()
            .with_window(DateWindow::new(Some(day(2)), Some(day(3))));
        let result = calc.calculate(&dataset(&[8, 8, 1, 8]));

        assert_eq!(result.observed_days, 2);
        assert_eq!(result.valid_days, 1);
        assert_eq!(result.start_date, Some(day(2)));
        assert_eq!(result.end_date, Some(day(3)));
    }

    #[test]
    fn test_analysis_period_basis() {
        let calc = AvailabilityCalculator::new()
            .with_window(DateWindow::new(Some(day(1)), Some(day(20))))
            .with_basis(PercentageBasis::AnalysisPeriod);
        let result = calc.calculate(&dataset(&[8, 8, 8, 8, 8, 8]));

        assert_eq!(result.total_days, 20);
        assert_eq!(result.valid_days, 6);
        assert_eq!(result.valid_days_percentage, 30.0);
        assert!(result.qualifies);
    }

    #[test]
    fn test_percentage_bounds() {
        assert_eq!(valid_day_percentage(0, 0), 0.0);
        assert_eq!(valid_day_percentage(5, 5), 100.0);
        assert_eq!(valid_day_percentage(0, 7), 0.0);

        let calc = AvailabilityCalculator::new();
        for per_day in [vec![], vec![0], vec![8; 3], vec![1, 20, 3, 9]] {
            let pct = calc.calculate(&dataset(&per_day)).valid_days_percentage;
            assert!((0.0..=100.0).contains(&pct));
        }
    }

    #[test]
    fn test_representative_days_use_median() {
        let calc = AvailabilityCalculator::new();
        // median of [2, 4, 6, 10] is 5
        let result = calc.calculate(&dataset(&[2, 4, 6, 10]));
        assert_eq!(result.representative_days, 2);
        assert_eq!(result.representative_days_percentage, 50.0);
    }

    #[test]
    fn test_deterministic_results() {
        let calc = AvailabilityCalculator::new();
        let data = dataset(&[3, 9, 12, 0, 8]);
        assert_eq!(calc.calculate(&data), calc.calculate(&data));
    }

    #[test]
    fn test_span_days() {
        let window = DateWindow::new(
            NaiveDate::from_ymd_opt(1995, 1, 1),
            NaiveDate::from_ymd_opt(2024, 12, 31),
        );
        assert_eq!(window.span_days(), Some(10958));
        assert_eq!(DateWindow::unbounded().span_days(), None);
    }

    #[test]
    fn test_calculated_results_pass_checks() {
        let period = AvailabilityCalculator::new()
            .with_window(DateWindow::new(Some(day(1)), Some(day(5))))
            .with_basis(PercentageBasis::AnalysisPeriod);

        for per_day in [&[8, 8, 2][..], &[0, 0], &[20], &[9, 9, 9, 9, 9, 9, 9]] {
            let data = dataset(per_day);
            assert!(AvailabilityCalculator::new().calculate(&data).check().is_ok());
            assert!(period.calculate(&data).check().is_ok());
        }
    }
}
