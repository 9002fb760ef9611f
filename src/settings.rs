//! Layered run settings: compiled defaults, an optional TOML file,
//! `AERONET_*` environment variables, then command-line overrides.

use chrono::NaiveDate;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;
use validator::{Validate, ValidationError};

use crate::analysis::{DateWindow, PercentageBasis};
use crate::error::Result;
use crate::models::QualityLevel;
use crate::utils::constants::*;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelDirs {
    pub lvl10: String,
    pub lvl15: String,
    pub lvl20: String,
}

impl LevelDirs {
    pub fn get(&self, level: QualityLevel) -> &str {
        match level {
            QualityLevel::Level10 => &self.lvl10,
            QualityLevel::Level15 => &self.lvl15,
            QualityLevel::Level20 => &self.lvl20,
        }
    }
}

impl Default for LevelDirs {
    fn default() -> Self {
        Self {
            lvl10: LEVEL10_DIR.to_string(),
            lvl15: LEVEL15_DIR.to_string(),
            lvl20: LEVEL20_DIR.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct PlotSettings {
    pub enabled: bool,

    #[validate(range(min = 100))]
    pub width: u32,

    #[validate(range(min = 100))]
    pub height: u32,

    pub bar_color: String,
    pub box_color: String,
    pub cumulative_box_color: String,
}

impl Default for PlotSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            width: PLOT_WIDTH,
            height: PLOT_HEIGHT,
            bar_color: BAR_COLOR.to_string(),
            box_color: BOX_COLOR.to_string(),
            cumulative_box_color: CUMULATIVE_BOX_COLOR.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
#[validate(schema(function = "validate_settings"))]
pub struct Settings {
    pub data_root: PathBuf,
    pub output_dir: PathBuf,
    pub level_dirs: LevelDirs,

    /// 1-based line of the column header.
    #[validate(range(min = 1))]
    pub header_line: usize,

    #[validate(length(min = 1))]
    pub date_column: String,

    #[validate(length(min = 1))]
    pub aod_column: String,

    #[validate(length(min = 1))]
    pub date_format: String,

    pub missing_value: f64,
    pub file_extension: String,

    #[validate(range(min = 1))]
    pub min_measurements_per_day: usize,

    #[validate(range(min = 0.0, max = 100.0))]
    pub min_valid_days_percentage: f64,

    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub basis: PercentageBasis,

    #[validate(nested)]
    pub plots: PlotSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_root: PathBuf::from(DEFAULT_DATA_ROOT),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            level_dirs: LevelDirs::default(),
            header_line: HEADER_LINE,
            date_column: DATE_COLUMN.to_string(),
            aod_column: AOD_COLUMN.to_string(),
            date_format: DATE_FORMAT.to_string(),
            missing_value: MISSING_VALUE,
            file_extension: DATA_FILE_EXTENSION.to_string(),
            min_measurements_per_day: MIN_MEASUREMENTS_PER_DAY,
            min_valid_days_percentage: MIN_VALID_DAYS_PERCENTAGE,
            start_date: None,
            end_date: None,
            basis: PercentageBasis::ObservedDays,
            plots: PlotSettings::default(),
        }
    }
}

fn validate_settings(settings: &Settings) -> std::result::Result<(), ValidationError> {
    if let (Some(start), Some(end)) = (settings.start_date, settings.end_date) {
        if start > end {
            let mut err = ValidationError::new("period_order");
            err.message = Some(format!("start date {} is after end date {}", start, end).into());
            return Err(err);
        }
    }

    if settings.basis == PercentageBasis::AnalysisPeriod
        && (settings.start_date.is_none() || settings.end_date.is_none())
    {
        let mut err = ValidationError::new("period_required");
        err.message = Some("analysis_period basis needs both start_date and end_date".into());
        return Err(err);
    }

    let colors = [
        &settings.plots.bar_color,
        &settings.plots.box_color,
        &settings.plots.cumulative_box_color,
    ];
    for color in colors {
        if crate::plotting::parse_hex_color(color).is_none() {
            let mut err = ValidationError::new("plot_color");
            err.message = Some(format!("'{}' is not a #rrggbb color", color).into());
            return Err(err);
        }
    }

    Ok(())
}

/// Values supplied on the command line; `None` keeps the layered value.
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub data_root: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub min_measurements_per_day: Option<usize>,
    pub min_valid_days_percentage: Option<f64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub basis: Option<PercentageBasis>,
    pub disable_plots: bool,
}

impl Settings {
    /// Load settings from `path` (required when given) or from the default
    /// settings file in the working directory (optional), then environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(p) => File::from(p).required(true),
            None => File::from(Path::new(DEFAULT_SETTINGS_FILE)).required(false),
        };

        let settings: Settings = Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        debug!("Loaded settings: {:?}", settings);
        Ok(settings)
    }

    pub fn with_overrides(mut self, overrides: SettingsOverrides) -> Result<Self> {
        if let Some(root) = overrides.data_root {
            self.data_root = root;
        }
        if let Some(dir) = overrides.output_dir {
            self.output_dir = dir;
        }
        if let Some(min) = overrides.min_measurements_per_day {
            self.min_measurements_per_day = min;
        }
        if let Some(pct) = overrides.min_valid_days_percentage {
            self.min_valid_days_percentage = pct;
        }
        if overrides.start_date.is_some() {
            self.start_date = overrides.start_date;
        }
        if overrides.end_date.is_some() {
            self.end_date = overrides.end_date;
        }
        if let Some(basis) = overrides.basis {
            self.basis = basis;
        }
        if overrides.disable_plots {
            self.plots.enabled = false;
        }

        self.validate()?;
        Ok(self)
    }

    pub fn window(&self) -> DateWindow {
        DateWindow::new(self.start_date, self.end_date)
    }

    pub fn level_dir(&self, level: QualityLevel) -> PathBuf {
        self.data_root.join(self.level_dirs.get(level))
    }

    pub fn plots_dir(&self) -> PathBuf {
        self.output_dir.join(PLOTS_DIR)
    }

    pub fn report_path(&self) -> PathBuf {
        self.output_dir.join(REPORT_FILE)
    }

    pub fn summary_path(&self) -> PathBuf {
        self.output_dir.join(SUMMARY_FILE)
    }
}
