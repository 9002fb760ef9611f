pub mod aod_reader;

pub use aod_reader::{discover_station_files, AodReader};
