use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::bus::EventBus;
use crate::config::{AppConfig, LedgerConfig, SimulationConfig};
use crate::constants::{events, simulation::SEED_SPACING_SECS};
use crate::data::window::{ChartPoint, PriceSample, PriceWindow};
use crate::error::{SimError, SimResult};
use crate::events::Event;
use crate::market::generator::PricePathGenerator;
use crate::market::projector::{MarketSnapshot, Signal, SnapshotProjector};
use crate::services::lock;
use crate::services::position_ledger::{risk_position_size, Position, PositionLedger, Side};
use crate::services::ticker::PeriodicTask;

/// Price window, projector and ledger for one traded symbol, advanced
/// together by `tick`.
pub struct TradingSession {
    symbol: String,
    base_price: f64,
    window: PriceWindow,
    generator: PricePathGenerator,
    projector: SnapshotProjector,
    ledger: PositionLedger,
    snapshot: Option<MarketSnapshot>,
    stop_loss_pct: f64,
    take_profit_pct: f64,
    default_size: f64,
    /// Strength threshold when auto trading is on
    auto_trade: Option<f64>,
    last_auto_trade_tick: Option<u64>,
    ticks: u64,
}

impl TradingSession {
    pub fn new(sim: &SimulationConfig, ledger: &LedgerConfig) -> Self {
        Self {
            symbol: sim.symbol.clone(),
            base_price: sim.base_price,
            window: PriceWindow::new(sim.window_capacity),
            generator: PricePathGenerator::from_config(sim),
            projector: SnapshotProjector::new(),
            ledger: PositionLedger::from_config(ledger),
            snapshot: None,
            stop_loss_pct: ledger.stop_loss_pct,
            take_profit_pct: ledger.take_profit_pct,
            default_size: risk_position_size(ledger),
            auto_trade: sim.auto_trade.then_some(sim.auto_trade_strength),
            last_auto_trade_tick: None,
            ticks: 0,
        }
    }

    /// Session with `seed_history` samples ending at `now` and a first
    /// snapshot already projected.
    pub fn from_config(config: &AppConfig, now: DateTime<Utc>) -> Self {
        let mut session = Self::new(&config.simulation, &config.ledger);
        session.seed(config.simulation.seed_history, now);
        session
    }

    pub fn seed(&mut self, count: usize, end: DateTime<Utc>) {
        self.generator.seed_window(
            &mut self.window,
            self.base_price,
            count,
            end,
            chrono::Duration::seconds(SEED_SPACING_SECS),
        );
        self.snapshot = self.projector.project(&self.window);
        info!(
            "[SIM] Seeded {} with {} samples (last: {:.5})",
            self.symbol,
            self.window.len(),
            self.snapshot.as_ref().map_or(self.base_price, |s| s.current_price)
        );
    }

    /// One synchronous pass: advance the walk, then `ingest` the new sample.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Option<MarketSnapshot> {
        let next = match self.window.latest() {
            Some(previous) => self.generator.advance(previous, now),
            None => PriceSample::new(now, self.base_price, 0.0),
        };
        self.ingest(next)
    }

    /// Appends an externally produced sample, reprojects and remarks the
    /// ledger. Counts as one tick.
    pub fn ingest(&mut self, sample: PriceSample) -> Option<MarketSnapshot> {
        self.window.push(sample);

        self.snapshot = self.projector.project(&self.window);
        if let Some(snapshot) = &self.snapshot {
            self.ledger.recompute(snapshot.current_price);
        }
        self.ticks += 1;

        debug!(
            event = events::TICK,
            "[SIM] tick {} {} @ {:.5} | open positions: {}",
            self.ticks,
            self.symbol,
            sample.price,
            self.ledger.open_count()
        );
        self.snapshot.clone()
    }

    /// Opens at most one position per tick when auto trading is on and the
    /// current signal is stronger than the threshold.
    pub fn auto_trade(&mut self, now: DateTime<Utc>) -> Option<Position> {
        let threshold = self.auto_trade?;
        if self.last_auto_trade_tick == Some(self.ticks) || self.ledger.is_full() {
            return None;
        }
        let snapshot = self.snapshot.as_ref()?;
        let side = match snapshot.signal {
            Signal::Buy => Side::Buy,
            Signal::Sell => Side::Sell,
            Signal::Neutral => return None,
        };
        if snapshot.strength <= threshold {
            return None;
        }
        let strength = snapshot.strength;

        self.last_auto_trade_tick = Some(self.ticks);
        match self.submit_order(side, self.default_size, now) {
            Ok(position) => {
                info!(
                    event = events::AUTO_TRADE,
                    "🤖 [SIM] Auto {:?} #{} on strength {:.2}",
                    side,
                    position.id,
                    strength
                );
                Some(position)
            }
            Err(e) => {
                warn!(event = events::AUTO_TRADE, "[SIM] Auto trade skipped: {}", e);
                None
            }
        }
    }

    /// Opens at the current price with the configured SL/TP offsets.
    pub fn submit_order(&mut self, side: Side, size: f64, now: DateTime<Utc>) -> SimResult<Position> {
        let price = self
            .current_price()
            .ok_or_else(|| SimError::Validation("no market price yet".to_string()))?;
        self.ledger
            .open(side, size, price, self.stop_loss_pct, self.take_profit_pct, now)
    }

    /// Risk-based lot size used when an order gives none.
    pub fn default_order_size(&self) -> f64 {
        self.default_size
    }

    pub fn close_position(&mut self, id: u64) -> SimResult<Position> {
        self.ledger.close(id)
    }

    pub fn current_price(&self) -> Option<f64> {
        self.snapshot
            .as_ref()
            .map(|s| s.current_price)
            .or_else(|| self.window.latest().map(|s| s.price))
    }

    pub fn snapshot(&self) -> Option<&MarketSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn positions(&self) -> &[Position] {
        self.ledger.positions()
    }

    pub fn ledger(&self) -> &PositionLedger {
        &self.ledger
    }

    pub fn window(&self) -> &PriceWindow {
        &self.window
    }

    pub fn chart_series(&self) -> Vec<ChartPoint> {
        self.window.chart_series()
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}

pub type SessionHandle = Arc<Mutex<TradingSession>>;

/// Drives a shared session on a fixed interval and publishes each snapshot.
pub struct SimulationService {
    session: SessionHandle,
    event_bus: EventBus,
    period: Duration,
}

impl SimulationService {
    pub fn new(session: SessionHandle, event_bus: EventBus, period: Duration) -> Self {
        Self {
            session,
            event_bus,
            period,
        }
    }

    pub fn start(&self) -> PeriodicTask {
        let session = self.session.clone();
        let bus = self.event_bus.clone();

        PeriodicTask::spawn("SIM", self.period, move || {
            // Lock held only for the synchronous pass
            let (snapshot, opened) = {
                let mut session = lock(&session);
                let now = Utc::now();
                let snapshot = session.tick(now);
                (snapshot, session.auto_trade(now))
            };
            if let Some(snapshot) = snapshot {
                bus.emit(Event::Tick(snapshot));
            }
            if let Some(position) = opened {
                bus.emit(Event::PositionOpened(position));
            }
            std::future::ready(())
        })
    }
}
