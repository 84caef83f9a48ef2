use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PriceSample {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
    pub volume: f64,
}

impl PriceSample {
    pub fn new(timestamp: DateTime<Utc>, price: f64, volume: f64) -> Self {
        Self {
            timestamp,
            price,
            volume,
        }
    }
}

/// One `{time, value}` point for the chart renderer.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    /// Unix seconds
    pub time: i64,
    pub value: f64,
}

/// Fixed-capacity FIFO of price samples, oldest first.
#[derive(Clone, Debug)]
pub struct PriceWindow {
    samples: VecDeque<PriceSample>,
    capacity: usize,
}

impl PriceWindow {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends `sample`, returning the evicted oldest sample when full.
    pub fn push(&mut self, sample: PriceSample) -> Option<PriceSample> {
        let evicted = if self.samples.len() >= self.capacity {
            self.samples.pop_front()
        } else {
            None
        };
        self.samples.push_back(sample);
        evicted
    }

    pub fn latest(&self) -> Option<&PriceSample> {
        self.samples.back()
    }

    pub fn oldest(&self) -> Option<&PriceSample> {
        self.samples.front()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Prices of the newest `min(n, len)` samples, oldest first.
    pub fn last_prices(&self, n: usize) -> Vec<f64> {
        let skip = self.samples.len().saturating_sub(n);
        self.samples.iter().skip(skip).map(|s| s.price).collect()
    }

    pub fn total_volume(&self) -> f64 {
        self.samples.iter().map(|s| s.volume).sum()
    }

    pub fn chart_series(&self) -> Vec<ChartPoint> {
        self.samples
            .iter()
            .map(|s| ChartPoint {
                time: s.timestamp.timestamp(),
                value: s.price,
            })
            .collect()
    }

    pub fn to_vec(&self) -> Vec<PriceSample> {
        self.samples.iter().copied().collect()
    }
}
