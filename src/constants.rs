//! Application-wide constants and reference values
//!
//! These are the defaults the configuration layer falls back to.

use std::time::Duration;

/// Price path and rolling window
pub mod simulation {
    use super::*;

    /// Samples kept in the rolling price window
    pub const WINDOW_CAPACITY: usize = 100;

    /// Max absolute price move per tick
    pub const STEP_BOUND: f64 = 0.0002;

    /// Upper bound of the per-sample volume draw
    pub const MAX_VOLUME: f64 = 1_000_000.0;

    /// EUR/USD mid the trading view starts from
    pub const BASE_PRICE: f64 = 1.09265;

    /// Samples generated before the first tick
    pub const SEED_HISTORY: usize = 100;

    /// Spacing between seeded samples
    pub const SEED_SPACING_SECS: i64 = 60;

    pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

    /// Redraws attempted before a non-positive step is clamped
    pub const MAX_REDRAWS: usize = 16;

    /// Floor used when clamping
    pub const MIN_PRICE: f64 = 1e-9;
}

/// Snapshot indicators
pub mod indicators {
    pub const SMA_SHORT: usize = 20;
    pub const SMA_LONG: usize = 50;

    /// Dead band around sma_long inside which the signal stays neutral
    pub const SIGNAL_BAND: f64 = 0.0001;

    /// Scales the SMA ratio deviation into [0, 1] strength
    pub const STRENGTH_SCALE: f64 = 1000.0;

    /// Signal strength above which the auto trader opens a position
    pub const AUTO_TRADE_STRENGTH: f64 = 0.7;
}

/// Position ledger
pub mod ledger {
    pub const MAX_POSITIONS: usize = 10;

    /// Units per standard forex lot
    pub const CONTRACT_MULTIPLIER: f64 = 100_000.0;

    pub const STOP_LOSS_PCT: f64 = 1.0;
    pub const TAKE_PROFIT_PCT: f64 = 2.0;

    pub const PERCENT: f64 = 100.0;

    /// Mock account the risk-based order size is derived from
    pub const ACCOUNT_BALANCE: f64 = 100_000.0;
    pub const RISK_PER_TRADE: f64 = 0.02;
    pub const STOP_LOSS_PIPS: f64 = 50.0;
    pub const PIP_SIZE: f64 = 0.0001;
}

/// Session reporter
pub mod reporting {
    /// Closed trades kept in the summary history
    pub const HISTORY_LIMIT: usize = 500;
}

/// Market roster and price provider
pub mod roster {
    use super::*;

    pub const REFRESH_INTERVAL: Duration = Duration::from_secs(5);

    /// Provider call budget per refresh
    pub const PROVIDER_TIMEOUT: Duration = Duration::from_secs(3);

    /// Quotes older than this are stale
    pub const MAX_PRICE_AGE_SECS: i64 = 60;

    pub const HERMES_BASE_URL: &str = "https://hermes.pyth.network";
}

/// Event bus capacity
pub const EVENT_BUS_CAPACITY: usize = 1000;

/// Logging event names for structured logging
pub mod events {
    pub const TICK: &str = "tick";
    pub const POSITION_OPENED: &str = "position_opened";
    pub const POSITION_CLOSED: &str = "position_closed";
    pub const POSITION_REJECTED: &str = "position_rejected";
    pub const AUTO_TRADE: &str = "auto_trade";
    pub const STOP_LOSS_CROSSED: &str = "stop_loss_crossed";
    pub const TAKE_PROFIT_CROSSED: &str = "take_profit_crossed";
    pub const ROSTER_REFRESHED: &str = "roster_refreshed";
    pub const PROVIDER_FAILED: &str = "provider_failed";
    pub const STALE_QUOTE: &str = "stale_quote";
    pub const BAD_FEED: &str = "bad_feed";
}
