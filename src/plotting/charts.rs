use plotters::prelude::*;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::analysis::{BoxStats, FrequencyDistribution};
use crate::error::{ProcessingError, Result};
use crate::models::{FileError, QualityLevel, StationResult};
use crate::processors::AnalysisRun;
use crate::settings::Settings;
use crate::utils::filename::{
    cumulative_boxplot_filename, frequency_distribution_filename, percentage_boxplot_filename,
    representative_days_boxplot_filename, representative_percentage_boxplot_filename,
    sanitize_station_name, station_boxplot_filename,
};

use super::parse_hex_color;

type DrawResult = std::result::Result<(), Box<dyn std::error::Error>>;

const CAPTION_FONT: (&str, f64) = ("sans-serif", 24.0);
const COUNT_AXIS: &str = "Valid measurements per day";
const PERCENT_RANGE: (f64, f64) = (-2.0, 102.0);

/// Box statistics plus the points drawn individually beyond the whiskers.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxSeries {
    pub stats: BoxStats,
    pub outliers: Vec<f64>,
}

impl BoxSeries {
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let stats = BoxStats::from_values(values)?;
        let mut outliers: Vec<f64> = values
            .iter()
            .copied()
            .filter(|v| v.is_finite() && (*v < stats.lower_whisker || *v > stats.upper_whisker))
            .collect();
        outliers.sort_by(|a, b| a.total_cmp(b));
        Some(Self { stats, outliers })
    }

    pub fn from_distribution(distribution: &FrequencyDistribution) -> Option<Self> {
        let values: Vec<f64> = distribution.expand().into_iter().map(|v| v as f64).collect();
        Self::from_values(&values)
    }

    /// Value axis covering every point with a small margin.
    pub fn axis_range(&self) -> (f64, f64) {
        let span = self.stats.max - self.stats.min;
        let pad = if span > 0.0 { span * 0.05 } else { 1.0 };
        (self.stats.min - pad, self.stats.max + pad)
    }
}

/// Renders the PNG charts of an analysis run.
pub struct ChartRenderer {
    plots_dir: PathBuf,
    width: u32,
    height: u32,
    bar_color: RGBColor,
    box_color: RGBColor,
    cumulative_box_color: RGBColor,
}

impl ChartRenderer {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let color = |value: &str| {
            parse_hex_color(value)
                .ok_or_else(|| ProcessingError::Config(format!("Invalid plot color '{}'", value)))
        };

        Ok(Self {
            plots_dir: settings.plots_dir(),
            width: settings.plots.width,
            height: settings.plots.height,
            bar_color: color(&settings.plots.bar_color)?,
            box_color: color(&settings.plots.box_color)?,
            cumulative_box_color: color(&settings.plots.cumulative_box_color)?,
        })
    }

    pub fn plots_dir(&self) -> &Path {
        &self.plots_dir
    }

    pub fn render_frequency_distribution(
        &self,
        station: &str,
        level: QualityLevel,
        distribution: &FrequencyDistribution,
    ) -> Result<PathBuf> {
        let title = format!("Frequency distribution - {} ({})", station, level);
        self.render(frequency_distribution_filename(station, level), |path| {
            self.draw_bars(path, &title, distribution)
        })
    }

    pub fn render_station_boxplot(
        &self,
        station: &str,
        level: QualityLevel,
        distribution: &FrequencyDistribution,
    ) -> Result<PathBuf> {
        let series = BoxSeries::from_distribution(distribution)
            .ok_or_else(|| ProcessingError::Plot(format!("No daily counts for {}", station)))?;
        let title = format!("Boxplot - {} ({})", station, level);
        let range = series.axis_range();
        self.render(station_boxplot_filename(station, level), |path| {
            self.draw_box(path, &title, COUNT_AXIS, &series, range, self.box_color)
        })
    }

    /// Daily counts of every station of a level pooled into one box.
    pub fn render_cumulative_boxplot(
        &self,
        level: QualityLevel,
        distribution: &FrequencyDistribution,
    ) -> Result<PathBuf> {
        let series = BoxSeries::from_distribution(distribution)
            .ok_or_else(|| ProcessingError::Plot(format!("No daily counts for {}", level)))?;
        let title = format!("Cumulative boxplot - {}", level);
        let range = series.axis_range();
        self.render(cumulative_boxplot_filename(level), |path| {
            self.draw_box(path, &title, COUNT_AXIS, &series, range, self.cumulative_box_color)
        })
    }

    pub fn render_percentage_boxplot(
        &self,
        level: QualityLevel,
        results: &[StationResult],
    ) -> Result<PathBuf> {
        let percentages: Vec<f64> = results.iter().map(|r| r.valid_days_percentage).collect();
        let title = format!("Valid days percentage - {}", level);
        self.render_level_boxplot(
            level,
            percentage_boxplot_filename(level),
            &title,
            "Valid days (%)",
            &percentages,
            Some(PERCENT_RANGE),
            self.box_color,
        )
    }

    /// Representative days per station of a level, as a day count.
    pub fn render_representative_days_boxplot(
        &self,
        level: QualityLevel,
        results: &[StationResult],
    ) -> Result<PathBuf> {
        let days: Vec<f64> = results.iter().map(|r| r.representative_days as f64).collect();
        let title = format!("Representative days - {}", level);
        self.render_level_boxplot(
            level,
            representative_days_boxplot_filename(level),
            &title,
            "Representative days",
            &days,
            None,
            self.cumulative_box_color,
        )
    }

    /// Representative days per station of a level, as a share of its days.
    pub fn render_representative_percentage_boxplot(
        &self,
        level: QualityLevel,
        results: &[StationResult],
    ) -> Result<PathBuf> {
        let percentages: Vec<f64> = results
            .iter()
            .map(|r| r.representative_days_percentage)
            .collect();
        let title = format!("Representative days percentage - {}", level);
        self.render_level_boxplot(
            level,
            representative_percentage_boxplot_filename(level),
            &title,
            "Representative days (%)",
            &percentages,
            Some(PERCENT_RANGE),
            self.box_color,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn render_level_boxplot(
        &self,
        level: QualityLevel,
        filename: String,
        title: &str,
        x_desc: &str,
        values: &[f64],
        range: Option<(f64, f64)>,
        color: RGBColor,
    ) -> Result<PathBuf> {
        let series = BoxSeries::from_values(values)
            .ok_or_else(|| ProcessingError::Plot(format!("No stations for {}", level)))?;
        let range = range.unwrap_or_else(|| series.axis_range());
        self.render(filename, |path| {
            self.draw_box(path, title, x_desc, &series, range, color)
        })
    }

    /// Draw every chart of the run. A chart that fails is logged and added
    /// to the run's error log; only failing to create the plot directory is
    /// returned as an error.
    pub fn render_all(&self, run: &mut AnalysisRun) -> Result<usize> {
        fs::create_dir_all(&self.plots_dir)?;

        let mut written = 0;
        let mut failures = Vec::new();

        for (&level, stations) in &run.distributions {
            // sanitized name -> station that claimed it
            let mut claimed: BTreeMap<String, &str> = BTreeMap::new();

            for (station, distribution) in stations {
                if distribution.is_empty() {
                    debug!("No daily counts to plot for {} ({})", station, level);
                    continue;
                }

                let key = sanitize_station_name(station);
                if let Some(&first) = claimed.get(&key) {
                    let filename = station_boxplot_filename(station, level);
                    warn!("Charts of {} and {} share the name {}", first, station, filename);
                    failures.push(FileError::new(
                        level,
                        station.as_str(),
                        self.plots_dir.join(&filename),
                        format!("chart file name already used by station {}", first),
                    ));
                    continue;
                }
                claimed.insert(key, station.as_str());

                let attempts = [
                    (
                        frequency_distribution_filename(station, level),
                        self.render_frequency_distribution(station, level, distribution),
                    ),
                    (
                        station_boxplot_filename(station, level),
                        self.render_station_boxplot(station, level, distribution),
                    ),
                ];
                for (filename, outcome) in attempts {
                    self.tally(outcome, level, station, &filename, &mut written, &mut failures);
                }
            }

            let pooled = run.level_distribution(level);
            if !pooled.is_empty() {
                let outcome = self.render_cumulative_boxplot(level, &pooled);
                let filename = cumulative_boxplot_filename(level);
                self.tally(outcome, level, level.label(), &filename, &mut written, &mut failures);
            }

            let results = run.results_for(level);
            if results.is_empty() {
                continue;
            }
            let attempts = [
                (
                    percentage_boxplot_filename(level),
                    self.render_percentage_boxplot(level, results),
                ),
                (
                    representative_days_boxplot_filename(level),
                    self.render_representative_days_boxplot(level, results),
                ),
                (
                    representative_percentage_boxplot_filename(level),
                    self.render_representative_percentage_boxplot(level, results),
                ),
            ];
            for (filename, outcome) in attempts {
                self.tally(outcome, level, level.label(), &filename, &mut written, &mut failures);
            }
        }

        info!(
            "Wrote {} charts to {} ({} failed)",
            written,
            self.plots_dir.display(),
            failures.len()
        );
        run.errors.extend(failures);
        Ok(written)
    }

    fn tally(
        &self,
        outcome: Result<PathBuf>,
        level: QualityLevel,
        station: &str,
        filename: &str,
        written: &mut usize,
        failures: &mut Vec<FileError>,
    ) {
        match outcome {
            Ok(path) => {
                debug!("Chart saved: {}", path.display());
                *written += 1;
            }
            Err(e) => {
                warn!("Chart {} failed: {}", filename, e);
                failures.push(FileError::new(
                    level,
                    station,
                    self.plots_dir.join(filename),
                    e.to_string(),
                ));
            }
        }
    }

    fn render<F>(&self, filename: String, draw: F) -> Result<PathBuf>
    where
        F: FnOnce(&Path) -> DrawResult,
    {
        let path = self.plots_dir.join(filename);
        draw(&path).map_err(|e| ProcessingError::Plot(format!("{}: {}", path.display(), e)))?;
        Ok(path)
    }

    fn draw_bars(
        &self,
        path: &Path,
        title: &str,
        distribution: &FrequencyDistribution,
    ) -> DrawResult {
        let root = BitMapBackend::new(path, (self.width, self.height)).into_drawing_area();
        root.fill(&WHITE)?;

        let max_value = distribution.max_value().unwrap_or(0) as f64;
        let max_frequency = distribution.max_frequency().max(1) as f64;

        let mut chart = ChartBuilder::on(&root)
            .caption(title, CAPTION_FONT)
            .margin(15)
            .x_label_area_size(45)
            .y_label_area_size(60)
            .build_cartesian_2d(-0.5f64..max_value + 0.5, 0f64..max_frequency * 1.1)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_desc(COUNT_AXIS)
            .y_desc("Days")
            .x_label_formatter(&|v: &f64| format!("{:.0}", v))
            .y_label_formatter(&|v: &f64| format!("{:.0}", v))
            .draw()?;

        let fill = self.bar_color.filled();
        chart.draw_series(distribution.iter().map(|(value, days)| {
            let x = value as f64;
            Rectangle::new([(x - 0.4, 0.0), (x + 0.4, days as f64)], fill)
        }))?;
        chart.draw_series(distribution.iter().map(|(value, days)| {
            let x = value as f64;
            Rectangle::new([(x - 0.4, 0.0), (x + 0.4, days as f64)], BLACK.stroke_width(1))
        }))?;

        root.present()?;
        Ok(())
    }

    /// Horizontal box with Tukey whiskers and hollow outlier markers.
    fn draw_box(
        &self,
        path: &Path,
        title: &str,
        x_desc: &str,
        series: &BoxSeries,
        (x_min, x_max): (f64, f64),
        color: RGBColor,
    ) -> DrawResult {
        let root = BitMapBackend::new(path, (self.width, self.height)).into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(title, CAPTION_FONT)
            .margin(15)
            .x_label_area_size(45)
            .y_label_area_size(20)
            .build_cartesian_2d(x_min..x_max, 0f64..1f64)?;

        chart
            .configure_mesh()
            .disable_y_mesh()
            .x_desc(x_desc)
            .y_label_formatter(&|_: &f64| String::new())
            .draw()?;

        let s = &series.stats;
        let (bottom, top, middle) = (0.3, 0.7, 0.5);

        chart.draw_series(std::iter::once(Rectangle::new(
            [(s.q1, bottom), (s.q3, top)],
            color.filled(),
        )))?;
        chart.draw_series(std::iter::once(Rectangle::new(
            [(s.q1, bottom), (s.q3, top)],
            BLACK.stroke_width(1),
        )))?;

        let lines = vec![
            vec![(s.lower_whisker, middle), (s.q1, middle)],
            vec![(s.q3, middle), (s.upper_whisker, middle)],
            vec![(s.lower_whisker, 0.4), (s.lower_whisker, 0.6)],
            vec![(s.upper_whisker, 0.4), (s.upper_whisker, 0.6)],
        ];
        chart.draw_series(
            lines
                .into_iter()
                .map(|points| PathElement::new(points, BLACK.stroke_width(1))),
        )?;
        chart.draw_series(std::iter::once(PathElement::new(
            vec![(s.median, bottom), (s.median, top)],
            RED.stroke_width(2),
        )))?;
        chart.draw_series(
            series
                .outliers
                .iter()
                .map(|&v| Circle::new((v, middle), 3, BLACK.stroke_width(1))),
        )?;

        root.present()?;
        Ok(())
    }
}
