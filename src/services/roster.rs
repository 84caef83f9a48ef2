//! Periodic market roster refresh over the injected price provider.
//!
//! Provider failures never escape the refresh: the roster keeps its last
//! known rows and carries the error as a banner until the next success.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};

use crate::bus::EventBus;
use crate::config::AppConfig;
use crate::constants::events;
use crate::error::ProviderError;
use crate::events::{Event, RosterEvent};
use crate::market::roster::MarketRoster;
use crate::provider::traits::PriceProvider;
use crate::services::lock;
use crate::services::ticker::PeriodicTask;

pub type RosterHandle = Arc<Mutex<MarketRoster>>;

#[derive(Clone)]
pub struct RosterService {
    roster: RosterHandle,
    provider: Arc<dyn PriceProvider>,
    event_bus: EventBus,
    period: Duration,
    timeout: Duration,
    max_age_secs: i64,
}

impl RosterService {
    pub fn new(
        roster: RosterHandle,
        provider: Arc<dyn PriceProvider>,
        event_bus: EventBus,
        period: Duration,
        timeout: Duration,
        max_age_secs: i64,
    ) -> Self {
        Self {
            roster,
            provider,
            event_bus,
            period,
            timeout,
            max_age_secs,
        }
    }

    pub fn from_config(
        roster: RosterHandle,
        provider: Arc<dyn PriceProvider>,
        event_bus: EventBus,
        config: &AppConfig,
    ) -> Self {
        Self::new(
            roster,
            provider,
            event_bus,
            config.refresh_interval(),
            config.provider_timeout(),
            config.provider.max_age_secs,
        )
    }

    pub fn start(&self) -> PeriodicTask {
        let service = self.clone();
        PeriodicTask::spawn("ROSTER", self.period, move || {
            let service = service.clone();
            async move {
                service.refresh_once().await;
            }
        })
    }

    /// One refresh pass; errors are absorbed into the roster banner.
    pub async fn refresh_once(&self) {
        match self.refresh().await {
            Ok(updated) => {
                info!(
                    event = events::ROSTER_REFRESHED,
                    "🔄 [ROSTER] Refreshed {} instruments via {}",
                    updated,
                    self.provider.name()
                );
                self.event_bus.emit(Event::Roster(RosterEvent::Refreshed {
                    updated,
                    at: Utc::now(),
                }));
            }
            Err(e) => {
                warn!(
                    event = events::PROVIDER_FAILED,
                    "⚠️ [ROSTER] Refresh via {} failed, keeping last known prices: {}",
                    self.provider.name(),
                    e
                );
                lock(&self.roster).mark_failed(e.to_string());
                self.event_bus.emit(Event::Roster(RosterEvent::ProviderFailed {
                    provider: self.provider.name().to_string(),
                    reason: e.to_string(),
                }));
            }
        }
    }

    async fn refresh(&self) -> Result<usize, ProviderError> {
        let ids = lock(&self.roster).reference_ids();
        if ids.is_empty() {
            return Ok(0);
        }

        let quotes = tokio::time::timeout(self.timeout, self.provider.latest_prices(&ids))
            .await
            .map_err(|_| ProviderError::Timeout {
                provider: self.provider.name().to_string(),
                timeout_ms: self.timeout.as_millis() as u64,
            })??;

        let now = Utc::now();
        let mut fresh = Vec::with_capacity(quotes.len());
        let mut stale = Vec::new();
        for quote in quotes {
            match quote.ensure_fresh(now, self.max_age_secs) {
                Ok(q) => fresh.push(q),
                Err(e) => {
                    warn!(event = events::STALE_QUOTE, "[ROSTER] {}", e);
                    stale.push(e);
                }
            }
        }

        let mut roster = lock(&self.roster);
        let updated = fresh.iter().filter(|q| roster.apply_quote(q)).count();
        if updated == 0 {
            return Err(stale.into_iter().next().unwrap_or_else(|| {
                ProviderError::unavailable(self.provider.name(), "no usable price feeds")
            }));
        }

        roster.mark_refreshed(now);
        if !stale.is_empty() {
            let reasons: Vec<String> = stale.iter().map(|e| e.to_string()).collect();
            roster.mark_failed(reasons.join("; "));
        }
        Ok(updated)
    }
}
