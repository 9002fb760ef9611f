pub mod constants;
pub mod filename;
pub mod progress;

pub use constants::*;
pub use filename::{
    cumulative_boxplot_filename, frequency_distribution_filename, percentage_boxplot_filename,
    sanitize_station_name, station_boxplot_filename,
};
pub use progress::ProgressReporter;
