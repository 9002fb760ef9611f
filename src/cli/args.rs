use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::analysis::PercentageBasis;
use crate::models::QualityLevel;
use crate::settings::SettingsOverrides;

#[derive(Parser)]
#[command(name = "aeronet-availability")]
#[command(about = "Data-availability statistics for AERONET AOD station files")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Log file path")]
    pub log_file: Option<PathBuf>,
}

/// Options shared by every subcommand that reads the data tree.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct RunOptions {
    #[arg(long, help = "Settings file (TOML) [default: aeronet-availability.toml if present]")]
    pub config: Option<PathBuf>,

    #[arg(short, long, help = "Directory holding the AOD_data_lvlNN folders")]
    pub data_root: Option<PathBuf>,

    #[arg(short, long, help = "Directory for the report and plots")]
    pub output_dir: Option<PathBuf>,

    #[arg(long, help = "Minimum valid measurements for a day to count")]
    pub min_measurements: Option<usize>,

    #[arg(long, help = "Minimum percentage of valid days for a station to qualify")]
    pub min_percentage: Option<f64>,

    #[arg(long, value_parser = parse_date, help = "First day of the analysis period (YYYY-MM-DD)")]
    pub start_date: Option<NaiveDate>,

    #[arg(long, value_parser = parse_date, help = "Last day of the analysis period (YYYY-MM-DD)")]
    pub end_date: Option<NaiveDate>,

    #[arg(long, value_enum, help = "Denominator of the valid-day percentage")]
    pub basis: Option<PercentageBasis>,
}

impl RunOptions {
    pub fn overrides(&self, disable_plots: bool) -> SettingsOverrides {
        SettingsOverrides {
            data_root: self.data_root.clone(),
            output_dir: self.output_dir.clone(),
            min_measurements_per_day: self.min_measurements,
            min_valid_days_percentage: self.min_percentage,
            start_date: self.start_date,
            end_date: self.end_date,
            basis: self.basis,
            disable_plots,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze every quality level, print the report and write outputs
    Analyze {
        #[command(flatten)]
        options: RunOptions,

        #[arg(long, help = "Skip chart rendering")]
        no_plots: bool,

        #[arg(
            short,
            long = "level",
            value_parser = parse_level,
            help = "Only analyze this quality level (1.0, 1.5, 2.0); repeatable"
        )]
        levels: Vec<QualityLevel>,
    },

    /// Analyze a single station file
    Station {
        #[arg(short, long, help = "Station data file")]
        file: PathBuf,

        #[arg(short, long, value_parser = parse_level, default_value = "2.0")]
        level: QualityLevel,

        #[command(flatten)]
        options: RunOptions,
    },

    /// Load every file without computing availability
    Validate {
        #[command(flatten)]
        options: RunOptions,
    },
}

fn parse_date(value: &str) -> std::result::Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| format!("'{}' is not a YYYY-MM-DD date: {}", value, e))
}

fn parse_level(value: &str) -> std::result::Result<QualityLevel, String> {
    value.parse::<QualityLevel>().map_err(|e| e.to_string())
}
