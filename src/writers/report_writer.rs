use crate::error::Result;
use crate::models::{FileError, QualityLevel, StationResult};
use crate::processors::{AnalysisRun, EmptyFile};
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// One line of the CSV report.
#[derive(Debug, Serialize)]
struct ReportRow<'a> {
    level: &'a str,
    station: &'a str,
    valid_days: usize,
    total_days: usize,
    observed_days: usize,
    valid_days_percentage: String,
    qualifies: bool,
    total_measurements: usize,
    mean_measurements_per_day: String,
    min_measurements_per_day: usize,
    max_measurements_per_day: usize,
    representative_days: usize,
    representative_days_percentage: String,
    start_date: String,
    end_date: String,
}

impl<'a> From<&'a StationResult> for ReportRow<'a> {
    fn from(r: &'a StationResult) -> Self {
        Self {
            level: r.level.label(),
            station: &r.station,
            valid_days: r.valid_days,
            total_days: r.total_days,
            observed_days: r.observed_days,
            valid_days_percentage: format!("{:.2}", r.valid_days_percentage),
            qualifies: r.qualifies,
            total_measurements: r.total_measurements,
            mean_measurements_per_day: format!("{:.2}", r.mean_measurements_per_day),
            min_measurements_per_day: r.min_measurements_per_day,
            max_measurements_per_day: r.max_measurements_per_day,
            representative_days: r.representative_days,
            representative_days_percentage: format!("{:.2}", r.representative_days_percentage),
            start_date: r.start_date.map(|d| d.to_string()).unwrap_or_default(),
            end_date: r.end_date.map(|d| d.to_string()).unwrap_or_default(),
        }
    }
}

/// Machine-readable run summary written next to the CSV report.
#[derive(Debug, Serialize)]
struct RunSummary<'a> {
    stations: usize,
    qualifying: Vec<LevelCount>,
    empty_files: &'a [EmptyFile],
    errors: &'a [FileError],
}

#[derive(Debug, Serialize)]
struct LevelCount {
    level: QualityLevel,
    tier: f32,
    stations: usize,
    qualifying: usize,
}

pub struct ReportWriter;

impl ReportWriter {
    pub fn new() -> Self {
        Self
    }

    /// Write one row per station and level, ordered by level then station.
    pub fn write_report(&self, run: &AnalysisRun, path: &Path) -> Result<usize> {
        let mut results: Vec<&StationResult> = run.all_results().collect();
        results.sort_by(|a, b| a.level.cmp(&b.level).then_with(|| a.station.cmp(&b.station)));

        let mut writer = csv::Writer::from_path(path)?;

        for result in &results {
            writer.serialize(ReportRow::from(*result))?;
        }
        writer.flush()?;

        Ok(results.len())
    }

    pub fn write_summary_json(&self, run: &AnalysisRun, path: &Path) -> Result<()> {
        let qualifying = run
            .levels()
            .map(|level| LevelCount {
                level,
                tier: level.tier(),
                stations: run.results_for(level).len(),
                qualifying: run.qualifying(level).len(),
            })
            .collect();

        let summary = RunSummary {
            stations: run.station_count(),
            qualifying,
            empty_files: &run.empty_files,
            errors: &run.errors,
        };

        let file = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(file, &summary)?;
        Ok(())
    }
}

impl Default for ReportWriter {
    fn default() -> Self {
        Self::new()
    }
}
