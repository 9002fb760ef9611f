use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Number of days observed at each measurements-per-day value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrequencyDistribution {
    bins: BTreeMap<usize, usize>,
}

impl FrequencyDistribution {
    pub fn from_counts<I>(counts: I) -> Self
    where
        I: IntoIterator<Item = usize>,
    {
        let mut bins = BTreeMap::new();
        for count in counts {
            *bins.entry(count).or_insert(0) += 1;
        }
        Self { bins }
    }

    /// (measurements per day, number of days), ascending by measurements.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.bins.iter().map(|(&value, &days)| (value, days))
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    pub fn total_days(&self) -> usize {
        self.bins.values().sum()
    }

    pub fn max_value(&self) -> Option<usize> {
        self.bins.keys().next_back().copied()
    }

    pub fn max_frequency(&self) -> usize {
        self.bins.values().copied().max().unwrap_or(0)
    }

    /// Every per-day count repeated by its frequency, ascending.
    pub fn expand(&self) -> Vec<usize> {
        self.bins
            .iter()
            .flat_map(|(&value, &days)| std::iter::repeat(value).take(days))
            .collect()
    }

    pub fn merge(&mut self, other: &FrequencyDistribution) {
        for (value, days) in other.iter() {
            *self.bins.entry(value).or_insert(0) += days;
        }
    }
}

/// Five-number summary with Tukey whiskers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoxStats {
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    pub lower_whisker: f64,
    pub upper_whisker: f64,
    pub count: usize,
}

impl BoxStats {
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }

        let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        if sorted.is_empty() {
            return None;
        }
        sorted.sort_by(|a, b| a.total_cmp(b));

        let q1 = quantile_sorted(&sorted, 0.25);
        let median = quantile_sorted(&sorted, 0.5);
        let q3 = quantile_sorted(&sorted, 0.75);
        let iqr = q3 - q1;
        let low_fence = q1 - 1.5 * iqr;
        let high_fence = q3 + 1.5 * iqr;

        // Whiskers reach the most extreme observations inside the fences
        let lower_whisker = sorted
            .iter()
            .copied()
            .find(|v| *v >= low_fence)
            .unwrap_or(sorted[0]);
        let upper_whisker = sorted
            .iter()
            .rev()
            .copied()
            .find(|v| *v <= high_fence)
            .unwrap_or(sorted[sorted.len() - 1]);

        Some(Self {
            min: sorted[0],
            q1,
            median,
            q3,
            max: sorted[sorted.len() - 1],
            lower_whisker,
            upper_whisker,
            count: sorted.len(),
        })
    }

    pub fn from_counts(values: &[usize]) -> Option<Self> {
        let values: Vec<f64> = values.iter().map(|&v| v as f64).collect();
        Self::from_values(&values)
    }

    pub fn iqr(&self) -> f64 {
        self.q3 - self.q1
    }
}

/// Quantile with linear interpolation between closest ranks.
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    Some(quantile_sorted(&sorted, q))
}

fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    let q = q.clamp(0.0, 1.0);
    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_frequency_distribution() {
        let dist = FrequencyDistribution::from_counts(vec![8, 3, 8, 12, 0, 3, 8]);

        let bins: Vec<(usize, usize)> = dist.iter().collect();
        assert_eq!(bins, vec![(0, 1), (3, 2), (8, 3), (12, 1)]);
        assert_eq!(dist.total_days(), 7);
        assert_eq!(dist.max_value(), Some(12));
        assert_eq!(dist.max_frequency(), 3);
        assert_eq!(dist.expand(), vec![0, 3, 3, 8, 8, 8, 12]);
    }

    #[test]
    fn test_merge_distributions() {
        let mut a = FrequencyDistribution::from_counts(vec![1, 2, 2]);
        let b = FrequencyDistribution::from_counts(vec![2, 5]);
        a.merge(&b);

        assert_eq!(a.iter().collect::<Vec<_>>(), vec![(1, 1), (2, 3), (5, 1)]);
    }

    #[test]
    fn test_quantile_interpolation() {
        let values = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile(&values, 0.5), Some(2.5));
        assert_eq!(quantile(&values, 0.25), Some(1.75));
        assert_eq!(quantile(&values, 0.0), Some(1.0));
        assert_eq!(quantile(&values, 1.0), Some(4.0));
        assert_eq!(quantile(&[], 0.5), None);
    }

    #[test]
    fn test_box_stats_whiskers_exclude_outliers() {
        let stats = BoxStats::from_counts(&[1, 2, 3, 4, 5, 6, 7, 8, 100]).unwrap();

        assert_eq!(stats.median, 5.0);
        assert_eq!(stats.q1, 3.0);
        assert_eq!(stats.q3, 7.0);
        assert_eq!(stats.max, 100.0);
        assert_eq!(stats.upper_whisker, 8.0);
        assert_eq!(stats.lower_whisker, 1.0);
        assert_eq!(stats.count, 9);
    }

    #[test]
    fn test_box_stats_empty() {
        assert!(BoxStats::from_values(&[]).is_none());
    }
}
