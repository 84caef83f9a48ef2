//! Derives the display snapshot from the rolling price window.
//!
//! `high_24h`/`low_24h` are running extrema of the current price since the
//! projector was created, not a true 24 hour window. `change_24h` is the
//! percentage move since that same point.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::indicators::{SIGNAL_BAND, SMA_LONG, SMA_SHORT, STRENGTH_SCALE};
use crate::data::window::PriceWindow;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Signal {
    Buy,
    Sell,
    Neutral,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub timestamp: DateTime<Utc>,
    pub current_price: f64,
    /// Percent
    pub change_24h: f64,
    pub high_24h: f64,
    pub low_24h: f64,
    pub volume_24h: f64,
    pub sma_20: f64,
    pub sma_50: f64,
    pub signal: Signal,
    /// In [0, 1]
    pub strength: f64,
}

#[derive(Clone, Debug, Default)]
pub struct SnapshotProjector {
    baseline: Option<f64>,
    high: Option<f64>,
    low: Option<f64>,
}

impl SnapshotProjector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Price the session started from, once the first projection ran.
    pub fn baseline(&self) -> Option<f64> {
        self.baseline
    }

    /// Returns `None` only for an empty window.
    pub fn project(&mut self, window: &PriceWindow) -> Option<MarketSnapshot> {
        let latest = window.latest()?;
        let current = latest.price;

        let baseline = *self.baseline.get_or_insert(current);
        let high = self.high.map_or(current, |h| h.max(current));
        let low = self.low.map_or(current, |l| l.min(current));
        self.high = Some(high);
        self.low = Some(low);

        let sma_20 = sma(&window.last_prices(SMA_SHORT));
        let sma_50 = sma(&window.last_prices(SMA_LONG));
        let (signal, strength) = crossover_signal(sma_20, sma_50);

        Some(MarketSnapshot {
            timestamp: latest.timestamp,
            current_price: current,
            change_24h: percent_change(baseline, current),
            high_24h: high,
            low_24h: low,
            volume_24h: window.total_volume(),
            sma_20,
            sma_50,
            signal,
            strength,
        })
    }
}

/// Arithmetic mean; 0.0 for an empty slice.
pub fn sma(prices: &[f64]) -> f64 {
    if prices.is_empty() {
        return 0.0;
    }
    prices.iter().sum::<f64>() / prices.len() as f64
}

/// Moving-average crossover with a small dead band around the long average.
pub fn crossover_signal(short: f64, long: f64) -> (Signal, f64) {
    if !(long > 0.0) {
        return (Signal::Neutral, 0.0);
    }

    let deviation = short / long - 1.0;
    if short > long * (1.0 + SIGNAL_BAND) {
        (Signal::Buy, (deviation * STRENGTH_SCALE).min(1.0))
    } else if short < long * (1.0 - SIGNAL_BAND) {
        (Signal::Sell, (-deviation * STRENGTH_SCALE).min(1.0))
    } else {
        (Signal::Neutral, 0.0)
    }
}

fn percent_change(from: f64, to: f64) -> f64 {
    if from > 0.0 {
        (to - from) / from * 100.0
    } else {
        0.0
    }
}
