use chrono::{DateTime, Utc};

use crate::market::projector::MarketSnapshot;
use crate::services::position_ledger::Position;

#[derive(Clone, Debug)]
pub enum RosterEvent {
    Refreshed {
        updated: usize,
        at: DateTime<Utc>,
    },
    ProviderFailed {
        provider: String,
        reason: String,
    },
}

// Global Event Enum
#[derive(Clone, Debug)]
pub enum Event {
    Tick(MarketSnapshot),
    PositionOpened(Position),
    PositionClosed(Position),
    Roster(RosterEvent),
}
