//! Rolling window of statistics samples for charting.

use city_core::CityStatistics;
use serde::Serialize;
use std::collections::VecDeque;

/// Samples kept by default.
pub const DEFAULT_HISTORY_LEN: usize = 100;

/// Lower bound of the population axis.
const MIN_POPULATION_AXIS: f64 = 100.0;

/// Population and mayor rating (in percent), one sample per statistics
/// update. Starts filled with zeros so a chart has a full x-axis from the
/// first frame.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StatsHistory {
    capacity: usize,
    population: VecDeque<u32>,
    mayor_rating_pct: VecDeque<f64>,
}

impl Default for StatsHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LEN)
    }
}

impl StatsHistory {
    /// A window of `capacity` zero samples.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            population: std::iter::repeat(0).take(capacity).collect(),
            mayor_rating_pct: std::iter::repeat(0.0).take(capacity).collect(),
        }
    }

    /// Samples kept.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append one sample, dropping the oldest.
    pub fn record(&mut self, stats: &CityStatistics) {
        if self.capacity == 0 {
            return;
        }
        if self.population.len() == self.capacity {
            self.population.pop_front();
            self.mayor_rating_pct.pop_front();
        }
        self.population.push_back(stats.population);
        self.mayor_rating_pct.push_back(stats.mayor_rating * 100.0);
    }

    /// Population samples, oldest first.
    pub fn population(&self) -> impl ExactSizeIterator<Item = u32> + '_ {
        self.population.iter().copied()
    }

    /// Mayor rating samples in percent, oldest first.
    pub fn mayor_rating_pct(&self) -> impl ExactSizeIterator<Item = f64> + '_ {
        self.mayor_rating_pct.iter().copied()
    }

    /// Newest population sample.
    pub fn latest_population(&self) -> Option<u32> {
        self.population.back().copied()
    }

    /// Newest mayor rating sample in percent.
    pub fn latest_mayor_rating_pct(&self) -> Option<f64> {
        self.mayor_rating_pct.back().copied()
    }

    /// Upper bound for the population axis: 110% of the peak, at least 100.
    pub fn population_axis_max(&self) -> f64 {
        let peak = self.population.iter().copied().max().unwrap_or(0);
        MIN_POPULATION_AXIS.max(f64::from(peak) * 1.1)
    }

    /// Forget every sample, refilling with zeros.
    pub fn clear(&mut self) {
        *self = Self::new(self.capacity);
    }
}
