use crate::analysis::BoxStats;
use crate::models::StationResult;
use crate::processors::AnalysisRun;

/// Builds the console report of an analysis run.
pub struct SummaryReport {
    min_valid_days_percentage: f64,
    min_measurements_per_day: usize,
    show_distributions: bool,
}

impl SummaryReport {
    pub fn new(min_measurements_per_day: usize, min_valid_days_percentage: f64) -> Self {
        Self {
            min_valid_days_percentage,
            min_measurements_per_day,
            show_distributions: false,
        }
    }

    pub fn with_distributions(mut self, show: bool) -> Self {
        self.show_distributions = show;
        self
    }

    pub fn generate(&self, run: &AnalysisRun) -> String {
        let mut out = String::new();
        self.write_qualifying(&mut out, run);
        self.write_all_stations(&mut out, run);
        self.write_level_overview(&mut out, run);
        if self.show_distributions {
            self.write_distributions(&mut out, run);
        }
        self.write_empty_files(&mut out, run);
        self.write_errors(&mut out, run);
        out
    }

    fn write_qualifying(&self, out: &mut String, run: &AnalysisRun) {
        out.push_str(&format!(
            "=== Stations with >= {:.1}% valid days (>= {} measurements/day) ===\n",
            self.min_valid_days_percentage, self.min_measurements_per_day
        ));

        if run.results.is_empty() {
            out.push_str("No quality level directories were processed.\n");
        }

        for level in run.levels() {
            out.push_str(&format!("\nResults for {}:\n", level));
            let qualifying = run.qualifying(level);
            if qualifying.is_empty() {
                out.push_str("  No station met the availability criterion.\n");
            }
            for result in qualifying {
                write_station(out, result);
            }
        }
    }

    fn write_all_stations(&self, out: &mut String, run: &AnalysisRun) {
        out.push_str("\n=== All stations (regardless of criterion) ===\n");
        for level in run.levels() {
            out.push_str(&format!("\nData for {}:\n", level));
            let results = run.results_for(level);
            if results.is_empty() {
                out.push_str("  No station data.\n");
            }
            for result in results {
                write_station(out, result);
            }
        }
    }

    fn write_level_overview(&self, out: &mut String, run: &AnalysisRun) {
        out.push_str("\n=== Level overview ===\n");
        out.push_str(&format!("Total stations analysed: {}\n", run.station_count()));

        for level in run.levels() {
            let results = run.results_for(level);
            if results.is_empty() {
                continue;
            }
            let percentages: Vec<f64> = results.iter().map(|r| r.valid_days_percentage).collect();
            let mean = percentages.iter().sum::<f64>() / percentages.len() as f64;
            out.push_str(&format!(
                "{}: {} stations, {} qualifying, mean valid days {:.2}%\n",
                level,
                results.len(),
                run.qualifying(level).len(),
                mean
            ));
            if let Some(stats) = BoxStats::from_values(&percentages) {
                out.push_str(&format!(
                    "  valid-day % quartiles: min {:.2}, q1 {:.2}, median {:.2}, q3 {:.2}, max {:.2} (IQR {:.2})\n",
                    stats.min,
                    stats.q1,
                    stats.median,
                    stats.q3,
                    stats.max,
                    stats.iqr()
                ));
            }
        }
    }

    fn write_distributions(&self, out: &mut String, run: &AnalysisRun) {
        out.push_str("\n=== Frequency of valid measurements per day ===\n");
        for (level, stations) in &run.distributions {
            out.push_str(&format!("\nDistributions for {}:\n", level));
            for (station, distribution) in stations {
                out.push_str(&format!("Station: {}\n", station));
                for (value, days) in distribution.iter() {
                    out.push_str(&format!("  {:>4} measurements: {} days\n", value, days));
                }
            }
        }
    }

    fn write_empty_files(&self, out: &mut String, run: &AnalysisRun) {
        out.push_str(&format!("\n=== Empty files ({}) ===\n", run.empty_files.len()));
        for empty in &run.empty_files {
            out.push_str(&format!("  [{}] {}\n", empty.level, empty.path.display()));
        }
    }

    fn write_errors(&self, out: &mut String, run: &AnalysisRun) {
        out.push_str(&format!("\n=== Error log ({}) ===\n", run.errors.len()));
        for error in &run.errors {
            out.push_str(&format!("  {}\n", error));
        }
    }
}

fn write_station(out: &mut String, result: &StationResult) {
    out.push_str(&format!("Station: {}\n", result.station));
    out.push_str(&format!("  Valid days: {}\n", result.valid_days));
    out.push_str(&format!(
        "  Valid days percentage: {:.2}%\n",
        result.valid_days_percentage
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::FrequencyDistribution;
    use crate::models::{FileError, QualityLevel};
    use std::path::Path;

    fn result(station: &str, valid: usize, total: usize, qualifies: bool) -> StationResult {
        StationResult {
            station: station.to_string(),
            level: QualityLevel::Level20,
            valid_days: valid,
            total_days: total,
            observed_days: total,
            valid_days_percentage: crate::analysis::valid_day_percentage(valid, total),
            qualifies,
            total_measurements: 0,
            mean_measurements_per_day: 0.0,
            min_measurements_per_day: 0,
            max_measurements_per_day: 0,
            start_date: None,
            end_date: None,
            representative_days: 0,
            representative_days_percentage: 0.0,
        }
    }

    #[test]
    fn test_report_sections() {
        let mut run = AnalysisRun::new();
        run.register_level(QualityLevel::Level10);
        run.record_result(
            result("Manaus", 40, 100, true),
            FrequencyDistribution::from_counts(vec![8, 9, 2]),
        );
        run.record_result(
            result("Natal", 10, 100, false),
            FrequencyDistribution::default(),
        );
        run.record_empty(
            QualityLevel::Level20,
            "Fortaleza".to_string(),
            Path::new("AOD_data_lvl20/Fortaleza.txt"),
        );
        run.record_error(FileError::new(
            QualityLevel::Level20,
            "Recife",
            "AOD_data_lvl20/Recife.txt",
            "Missing required column 'AOD_500nm'",
        ));

        let report = SummaryReport::new(8, 30.0).with_distributions(true).generate(&run);

        let qualifying = report
            .split("=== All stations")
            .next()
            .unwrap_or_default();
        assert!(qualifying.contains("Station: Manaus"));
        assert!(!qualifying.contains("Station: Natal"));
        assert!(qualifying.contains("Results for lvl10:\n  No station met the availability criterion."));

        assert!(report.contains("Station: Natal\n  Valid days: 10\n  Valid days percentage: 10.00%"));
        assert!(report.contains("lvl20: 2 stations, 1 qualifying, mean valid days 25.00%"));
        assert!(report.contains("     8 measurements: 1 days"));
        assert!(report.contains("=== Empty files (1) ==="));
        assert!(report.contains("Fortaleza.txt"));
        assert!(report.contains("=== Error log (1) ==="));
        assert!(report.contains("[lvl20] Recife"));
    }

    #[test]
    fn test_report_without_levels() {
        let report = SummaryReport::new(8, 30.0).generate(&AnalysisRun::new());
        assert!(report.contains("No quality level directories were processed."));
        assert!(!report.contains("Frequency of valid measurements"));
    }
}
