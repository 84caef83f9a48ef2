use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::constants::{indicators, ledger, roster, simulation};
use crate::error::{SimError, SimResult};

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub symbol: String,
    pub base_price: f64,
    pub tick_ms: u64,
    pub window_capacity: usize,
    pub step_bound: f64,
    pub max_volume: f64,
    pub seed_history: usize,
    /// Fixed RNG seed; entropy when absent
    pub rng_seed: Option<u64>,
    /// Open positions from strong crossover signals on each tick
    pub auto_trade: bool,
    pub auto_trade_strength: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            symbol: "EUR/USD".to_string(),
            base_price: simulation::BASE_PRICE,
            tick_ms: simulation::TICK_INTERVAL.as_millis() as u64,
            window_capacity: simulation::WINDOW_CAPACITY,
            step_bound: simulation::STEP_BOUND,
            max_volume: simulation::MAX_VOLUME,
            seed_history: simulation::SEED_HISTORY,
            rng_seed: None,
            auto_trade: false,
            auto_trade_strength: indicators::AUTO_TRADE_STRENGTH,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub max_positions: usize,
    pub contract_multiplier: f64,
    pub stop_loss_pct: f64,
    pub take_profit_pct: f64,
    /// Risk-based default order size inputs
    pub account_balance: f64,
    pub risk_per_trade: f64,
    pub stop_loss_pips: f64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            max_positions: ledger::MAX_POSITIONS,
            contract_multiplier: ledger::CONTRACT_MULTIPLIER,
            stop_loss_pct: ledger::STOP_LOSS_PCT,
            take_profit_pct: ledger::TAKE_PROFIT_PCT,
            account_balance: ledger::ACCOUNT_BALANCE,
            risk_per_trade: ledger::RISK_PER_TRADE,
            stop_loss_pips: ledger::STOP_LOSS_PIPS,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct InstrumentConfig {
    pub symbol: String,
    pub name: String,
    pub reference_id: String,
}

impl InstrumentConfig {
    fn new(symbol: &str, name: &str, reference_id: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            name: name.to_string(),
            reference_id: reference_id.to_string(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct RosterConfig {
    pub refresh_ms: u64,
    pub instruments: Vec<InstrumentConfig>,
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self {
            refresh_ms: roster::REFRESH_INTERVAL.as_millis() as u64,
            instruments: vec![
                InstrumentConfig::new(
                    "EUR/USD",
                    "Euro / US Dollar",
                    "ff61491a931112ddf1bd8147cd1b080f1f8e3c8e579db7a8e3174b0fb8673d50",
                ),
                InstrumentConfig::new(
                    "GBP/USD",
                    "British Pound / US Dollar",
                    "ec7a7a0100790c93c17fde7326ac483877f5f50b270bf1be85f79ccc2a5de674",
                ),
                InstrumentConfig::new(
                    "USD/JPY",
                    "US Dollar / Japanese Yen",
                    "5a33f2066c25c1f6b8c174430440f51d806f1ae297591f1ae4a5cc3868a08c4c",
                ),
                InstrumentConfig::new(
                    "AUD/USD",
                    "Australian Dollar / US Dollar",
                    "67a6f4dbd07eee4c2d43c53be5df3c8afea62b6ae439f770c5f61ae0c905c299",
                ),
                InstrumentConfig::new(
                    "USD/CAD",
                    "US Dollar / Canadian Dollar",
                    "a0143d7dcab7a8a6f1d7aa0cd9aa9f937ef19ce331c71c4f137ef832421ca06c",
                ),
            ],
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Simulated,
    Hermes,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    pub base_url: String,
    pub timeout_ms: u64,
    pub max_age_secs: i64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::Simulated,
            base_url: roster::HERMES_BASE_URL.to_string(),
            timeout_ms: roster::PROVIDER_TIMEOUT.as_millis() as u64,
            max_age_secs: roster::MAX_PRICE_AGE_SECS,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8000".to_string(),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub simulation: SimulationConfig,
    pub ledger: LedgerConfig,
    pub roster: RosterConfig,
    pub provider: ProviderConfig,
    pub server: ServerConfig,
}

impl AppConfig {
    pub fn load(path: impl AsRef<Path>) -> SimResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| SimError::Config(format!("failed to read {}: {}", path.display(), e)))?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> SimResult<Self> {
        // Strip BOM if present
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);

        let config: AppConfig = serde_yaml::from_str(content)
            .map_err(|e| SimError::Config(format!("failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> SimResult<()> {
        let sim = &self.simulation;
        if !(sim.base_price.is_finite() && sim.base_price > 0.0) {
            return Err(SimError::Config(format!(
                "simulation.base_price must be positive, got {}",
                sim.base_price
            )));
        }
        if sim.window_capacity == 0 {
            return Err(SimError::Config("simulation.window_capacity must be at least 1".into()));
        }
        if !(sim.step_bound.is_finite() && sim.step_bound >= 0.0 && sim.step_bound < sim.base_price) {
            return Err(SimError::Config(format!(
                "simulation.step_bound must be finite, non-negative and below base_price, got {}",
                sim.step_bound
            )));
        }
        if !(sim.max_volume.is_finite() && sim.max_volume >= 0.0) {
            return Err(SimError::Config(format!(
                "simulation.max_volume must be finite and non-negative, got {}",
                sim.max_volume
            )));
        }
        if !(0.0..=1.0).contains(&sim.auto_trade_strength) {
            return Err(SimError::Config(format!(
                "simulation.auto_trade_strength must be within [0, 1], got {}",
                sim.auto_trade_strength
            )));
        }
        if sim.tick_ms == 0 || self.roster.refresh_ms == 0 {
            return Err(SimError::Config("tick and refresh intervals must be non-zero".into()));
        }
        if sim.window_capacity < indicators::SMA_LONG {
            tracing::warn!(
                "[CONFIG] window_capacity {} is below the {}-sample SMA; sma_50 will average fewer samples",
                sim.window_capacity,
                indicators::SMA_LONG
            );
        }

        let ledger = &self.ledger;
        if ledger.max_positions == 0 {
            return Err(SimError::Config("ledger.max_positions must be at least 1".into()));
        }
        if !(ledger.contract_multiplier > 0.0) {
            return Err(SimError::Config("ledger.contract_multiplier must be positive".into()));
        }
        if !(ledger.stop_loss_pct > 0.0 && ledger.take_profit_pct > 0.0) {
            return Err(SimError::Config(
                "ledger.stop_loss_pct and ledger.take_profit_pct must be positive".into(),
            ));
        }
        if !(ledger.account_balance.is_finite() && ledger.account_balance > 0.0) {
            return Err(SimError::Config("ledger.account_balance must be positive".into()));
        }
        if !(ledger.risk_per_trade > 0.0 && ledger.risk_per_trade <= 1.0) {
            return Err(SimError::Config("ledger.risk_per_trade must be within (0, 1]".into()));
        }
        if !(ledger.stop_loss_pips.is_finite() && ledger.stop_loss_pips > 0.0) {
            return Err(SimError::Config("ledger.stop_loss_pips must be positive".into()));
        }
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.simulation.tick_ms)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.roster.refresh_ms)
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_millis(self.provider.timeout_ms)
    }
}
