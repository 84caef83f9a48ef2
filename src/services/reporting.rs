use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::{
    bus::EventBus,
    constants::reporting::HISTORY_LIMIT,
    events::{Event, RosterEvent},
    services::lock,
    services::position_ledger::{Position, Side},
};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClosedTrade {
    pub id: u64,
    pub side: Side,
    pub size: f64,
    pub entry_price: f64,
    pub exit_price: f64,
    pub opened_at: DateTime<Utc>,
    pub closed_at: DateTime<Utc>,
    pub pnl: f64,
    pub pnl_percentage: f64,
}

impl ClosedTrade {
    fn from_position(position: &Position, closed_at: DateTime<Utc>) -> Self {
        Self {
            id: position.id,
            side: position.side,
            size: position.size,
            entry_price: position.entry_price,
            exit_price: position.current_price,
            opened_at: position.opened_at,
            closed_at,
            pnl: position.unrealized_pnl,
            pnl_percentage: position.pnl_percentage,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SessionSummary {
    pub ticks: u64,
    pub last_price: Option<f64>,

    pub positions_opened: u64,
    pub positions_closed: u64,

    pub realized_pnl: f64,
    pub winning_trades: u64,
    pub losing_trades: u64,
    pub breakeven_trades: u64,

    pub roster_refreshes: u64,
    pub provider_failures: u64,
    pub last_provider_error: Option<String>,

    /// Most recent closed trades, oldest first
    pub history: VecDeque<ClosedTrade>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SessionStats {
    pub total_closed_trades: u64,
    pub win_rate_pct: f64,
    pub avg_pnl_per_trade: f64,
}

impl SessionSummary {
    /// Win rate counts decided trades only; breakeven closes are left out.
    pub fn compute_stats(&self) -> SessionStats {
        let total = self.winning_trades + self.losing_trades + self.breakeven_trades;
        if total == 0 {
            return SessionStats::default();
        }
        let decided = self.winning_trades + self.losing_trades;
        let win_rate_pct = if decided > 0 {
            self.winning_trades as f64 / decided as f64 * 100.0
        } else {
            0.0
        };
        SessionStats {
            total_closed_trades: total,
            win_rate_pct,
            avg_pnl_per_trade: self.realized_pnl / total as f64,
        }
    }
}

/// In-memory session journal fed from the event bus.
#[derive(Clone, Default)]
pub struct SessionReporter {
    summary: Arc<Mutex<SessionSummary>>,
}

impl SessionReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn summary(&self) -> SessionSummary {
        lock(&self.summary).clone()
    }

    pub fn start(&self, event_bus: &EventBus) -> JoinHandle<()> {
        let mut rx = event_bus.subscribe();
        let reporter = self.clone();

        tokio::spawn(async move {
            info!("📈 [REPORT] Session reporter started");

            loop {
                match rx.recv().await {
                    Ok(event) => reporter.on_event(&event),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("[REPORT] Lagged behind the bus, skipped {} events", skipped);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }

    pub fn on_event(&self, event: &Event) {
        let mut s = lock(&self.summary);
        match event {
            Event::Tick(snapshot) => {
                s.ticks += 1;
                s.last_price = Some(snapshot.current_price);
            }
            Event::PositionOpened(_) => {
                s.positions_opened += 1;
            }
            Event::PositionClosed(position) => {
                let trade = ClosedTrade::from_position(position, Utc::now());
                s.positions_closed += 1;
                s.realized_pnl += trade.pnl;
                if trade.pnl > 0.0 {
                    s.winning_trades += 1;
                } else if trade.pnl < 0.0 {
                    s.losing_trades += 1;
                } else {
                    s.breakeven_trades += 1;
                }
                if s.history.len() == HISTORY_LIMIT {
                    s.history.pop_front();
                }
                s.history.push_back(trade);
            }
            Event::Roster(RosterEvent::Refreshed { .. }) => {
                s.roster_refreshes += 1;
            }
            Event::Roster(RosterEvent::ProviderFailed { reason, .. }) => {
                s.provider_failures += 1;
                s.last_provider_error = Some(reason.clone());
            }
        }
    }
}
