//! FxSim - synthetic forex market data and P&L simulation engine
//!
//! A bounded random-walk price path, market snapshots projected from it,
//! a position ledger marked against the current price, and a roster of
//! reference pairs refreshed from a price provider.

pub mod api;
pub mod bus;
pub mod config;
pub mod constants;
pub mod data;
pub mod error;
pub mod events;
pub mod format;
pub mod market;
pub mod provider;
pub mod services;

// Re-export commonly used types
pub use bus::EventBus;
pub use config::AppConfig;
pub use error::{ProviderError, SimError, SimResult};
pub use events::{Event, RosterEvent};
