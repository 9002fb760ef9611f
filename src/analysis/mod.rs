pub mod availability;
pub mod distribution;

pub use availability::{
    valid_day_percentage, AvailabilityCalculator, DailyCounts, DateWindow, PercentageBasis,
};
pub use distribution::{quantile, BoxStats, FrequencyDistribution};
