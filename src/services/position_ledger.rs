use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::LedgerConfig;
use crate::constants::events;
use crate::constants::ledger::{PERCENT, PIP_SIZE};
use crate::error::{SimError, SimResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// +1 for buy, -1 for sell
    pub fn sign(self) -> f64 {
        match self {
            Side::Buy => 1.0,
            Side::Sell => -1.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionStatus {
    Open,
    StoppedOut,
    TakeProfit,
    Closed,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub id: u64,
    pub side: Side,
    pub size: f64,
    pub entry_price: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub opened_at: DateTime<Utc>,
    pub status: PositionStatus,
    pub risk_reward_ratio: f64,
    /// Price of the last recompute
    pub current_price: f64,
    pub unrealized_pnl: f64,
    pub pnl_percentage: f64,
}

impl Position {
    fn mark(&mut self, price: f64, multiplier: f64) {
        let notional = self.entry_price * self.size * multiplier;
        self.current_price = price;
        self.unrealized_pnl = (price - self.entry_price) * self.size * multiplier * self.side.sign();
        self.pnl_percentage = self.unrealized_pnl / notional * PERCENT;
    }

    /// Levels are flagged, never acted on. Returns the new status when it
    /// changed.
    fn flag_levels(&mut self, price: f64) -> Option<PositionStatus> {
        let (stopped, target) = match self.side {
            Side::Buy => (price <= self.stop_loss, price >= self.take_profit),
            Side::Sell => (price >= self.stop_loss, price <= self.take_profit),
        };
        let status = if stopped {
            PositionStatus::StoppedOut
        } else if target {
            PositionStatus::TakeProfit
        } else {
            PositionStatus::Open
        };
        if status == self.status {
            return None;
        }
        self.status = status;
        Some(status)
    }
}

/// Lots that put `risk_per_trade` of the account at risk over a
/// `stop_loss_pips` move, rounded to 0.01 lot.
pub fn risk_position_size(config: &LedgerConfig) -> f64 {
    let risk_amount = config.account_balance * config.risk_per_trade;
    let units = risk_amount / (config.stop_loss_pips * PIP_SIZE);
    (units / config.contract_multiplier * 100.0).round() / 100.0
}

/// Open positions in opening order. Single writer: the owner serializes
/// `open`, `close` and `recompute`.
#[derive(Clone, Debug)]
pub struct PositionLedger {
    positions: Vec<Position>,
    next_id: u64,
    max_positions: usize,
    contract_multiplier: f64,
    last_price: Option<f64>,
}

impl PositionLedger {
    pub fn new(max_positions: usize, contract_multiplier: f64) -> Self {
        Self {
            positions: Vec::new(),
            next_id: 1,
            max_positions,
            contract_multiplier,
            last_price: None,
        }
    }

    pub fn from_config(config: &LedgerConfig) -> Self {
        Self::new(config.max_positions, config.contract_multiplier)
    }

    /// Opens a position at `entry_price`. `stop_loss_pct`/`take_profit_pct`
    /// are percentages (1.0 = 1%) oriented by side.
    pub fn open(
        &mut self,
        side: Side,
        size: f64,
        entry_price: f64,
        stop_loss_pct: f64,
        take_profit_pct: f64,
        opened_at: DateTime<Utc>,
    ) -> SimResult<Position> {
        if !(size.is_finite() && size > 0.0) {
            return Err(SimError::Validation(format!("size must be positive, got {}", size)));
        }
        if !(entry_price.is_finite() && entry_price > 0.0) {
            return Err(SimError::Validation(format!(
                "entry price must be positive, got {}",
                entry_price
            )));
        }
        if !(stop_loss_pct >= 0.0 && take_profit_pct >= 0.0) {
            return Err(SimError::Validation(format!(
                "stop loss/take profit percentages must be non-negative, got {}/{}",
                stop_loss_pct, take_profit_pct
            )));
        }
        if self.positions.len() >= self.max_positions {
            warn!(
                event = events::POSITION_REJECTED,
                "[LEDGER] Rejected {:?} {}: {} of {} positions open",
                side,
                size,
                self.positions.len(),
                self.max_positions
            );
            return Err(SimError::Capacity {
                open: self.positions.len(),
                max: self.max_positions,
            });
        }

        let sl = stop_loss_pct / PERCENT;
        let tp = take_profit_pct / PERCENT;
        let (stop_loss, take_profit) = match side {
            Side::Buy => (entry_price * (1.0 - sl), entry_price * (1.0 + tp)),
            Side::Sell => (entry_price * (1.0 + sl), entry_price * (1.0 - tp)),
        };
        let risk_reward_ratio = if sl > 0.0 { tp / sl } else { 0.0 };

        let mut position = Position {
            id: self.next_id,
            side,
            size,
            entry_price,
            stop_loss,
            take_profit,
            opened_at,
            status: PositionStatus::Open,
            risk_reward_ratio,
            current_price: entry_price,
            unrealized_pnl: 0.0,
            pnl_percentage: 0.0,
        };
        position.mark(entry_price, self.contract_multiplier);
        self.next_id += 1;

        info!(
            event = events::POSITION_OPENED,
            "📊 [LEDGER] Opened #{} {:?} {} @ {:.5} (SL: {:.5}, TP: {:.5})",
            position.id, side, size, entry_price, stop_loss, take_profit
        );
        self.positions.push(position.clone());
        Ok(position)
    }

    /// Marks every position to `current_price`. Idempotent for a fixed price.
    pub fn recompute(&mut self, current_price: f64) {
        if !(current_price.is_finite() && current_price > 0.0) {
            return;
        }
        self.last_price = Some(current_price);

        let multiplier = self.contract_multiplier;
        for position in &mut self.positions {
            position.mark(current_price, multiplier);
            match position.flag_levels(current_price) {
                Some(PositionStatus::StoppedOut) => warn!(
                    event = events::STOP_LOSS_CROSSED,
                    "[LEDGER] #{} crossed stop loss {:.5} at {:.5}",
                    position.id, position.stop_loss, current_price
                ),
                Some(PositionStatus::TakeProfit) => info!(
                    event = events::TAKE_PROFIT_CROSSED,
                    "[LEDGER] #{} crossed take profit {:.5} at {:.5}",
                    position.id, position.take_profit, current_price
                ),
                _ => {}
            }
        }
    }

    /// Removes the position and returns it marked at the last recompute
    /// price (entry price if none happened yet).
    pub fn close(&mut self, id: u64) -> SimResult<Position> {
        let idx = self
            .positions
            .iter()
            .position(|p| p.id == id)
            .ok_or(SimError::NotFound { id })?;

        let mut position = self.positions.remove(idx);
        let price = self.last_price.unwrap_or(position.entry_price);
        position.mark(price, self.contract_multiplier);
        position.status = PositionStatus::Closed;

        info!(
            event = events::POSITION_CLOSED,
            "📊 [LEDGER] Closed #{} @ {:.5} (P/L: {:.2}, {:.4}%)",
            position.id, price, position.unrealized_pnl, position.pnl_percentage
        );
        Ok(position)
    }

    pub fn get(&self, id: u64) -> Option<&Position> {
        self.positions.iter().find(|p| p.id == id)
    }

    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    pub fn open_count(&self) -> usize {
        self.positions.len()
    }

    pub fn capacity(&self) -> usize {
        self.max_positions
    }

    pub fn is_full(&self) -> bool {
        self.positions.len() >= self.max_positions
    }

    pub fn last_price(&self) -> Option<f64> {
        self.last_price
    }

    pub fn total_unrealized_pnl(&self) -> f64 {
        self.positions.iter().map(|p| p.unrealized_pnl).sum()
    }
}
