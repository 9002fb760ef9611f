/// Required column names
pub const DATE_COLUMN: &str = "Date(dd:mm:yyyy)";
pub const AOD_COLUMN: &str = "AOD_500nm";

/// Date format used in the date column
pub const DATE_FORMAT: &str = "%d:%m:%Y";

/// 1-based line holding the column header (six preamble lines precede it)
pub const HEADER_LINE: usize = 7;

/// Sentinel written by AERONET for missing observations
pub const MISSING_VALUE: f64 = -999.0;

/// Station files extension
pub const DATA_FILE_EXTENSION: &str = "txt";

/// Directory names
pub const DEFAULT_DATA_ROOT: &str = ".";
pub const DEFAULT_OUTPUT_DIR: &str = "output";
pub const PLOTS_DIR: &str = "plots";
pub const LEVEL10_DIR: &str = "AOD_data_lvl10";
pub const LEVEL15_DIR: &str = "AOD_data_lvl15";
pub const LEVEL20_DIR: &str = "AOD_data_lvl20";

/// Report file names
pub const REPORT_FILE: &str = "availability_report.csv";
pub const SUMMARY_FILE: &str = "availability_summary.json";

/// Default settings file looked up in the working directory
pub const DEFAULT_SETTINGS_FILE: &str = "aeronet-availability.toml";

/// Environment variable prefix for settings overrides
pub const ENV_PREFIX: &str = "AERONET";

/// Availability thresholds
pub const MIN_MEASUREMENTS_PER_DAY: usize = 8;
pub const MIN_VALID_DAYS_PERCENTAGE: f64 = 30.0;

/// Plot defaults
pub const PLOT_WIDTH: u32 = 1000;
pub const PLOT_HEIGHT: u32 = 600;
pub const BAR_COLOR: &str = "#87ceeb";
pub const BOX_COLOR: &str = "#add8e6";
pub const CUMULATIVE_BOX_COLOR: &str = "#90ee90";
