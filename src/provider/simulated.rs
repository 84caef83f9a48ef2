//! Local stand-in for the price oracle: an independent random walk per
//! reference id, seeded near parity on first request.

use async_trait::async_trait;
use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::sync::Mutex;

use super::{
    traits::{PriceProvider, ProviderResult},
    types::PriceQuote,
};
use crate::constants::simulation::{MIN_PRICE, STEP_BOUND};

/// Upper bound of the mock daily volume per pair
const MAX_DAILY_VOLUME: f64 = 1_000_000_000.0;

struct WalkState {
    rng: StdRng,
    prices: HashMap<String, f64>,
}

pub struct SimulatedProvider {
    state: Mutex<WalkState>,
    step_bound: f64,
}

impl SimulatedProvider {
    pub fn new(rng_seed: Option<u64>) -> Self {
        let rng = match rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            state: Mutex::new(WalkState {
                rng,
                prices: HashMap::new(),
            }),
            step_bound: STEP_BOUND,
        }
    }
}

impl Default for SimulatedProvider {
    fn default() -> Self {
        Self::new(None)
    }
}

#[async_trait]
impl PriceProvider for SimulatedProvider {
    fn name(&self) -> &'static str {
        "simulated"
    }

    async fn latest_prices(&self, ids: &[String]) -> ProviderResult<Vec<PriceQuote>> {
        let now = Utc::now();
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let WalkState { rng, prices } = &mut *state;

        let quotes = ids
            .iter()
            .map(|id| {
                let price = match prices.get(id) {
                    Some(last) => {
                        (last + rng.gen_range(-self.step_bound..=self.step_bound)).max(MIN_PRICE)
                    }
                    None => 1.0 + rng.gen_range(0.0..0.1),
                };
                prices.insert(id.clone(), price);

                PriceQuote {
                    id: id.clone(),
                    price,
                    as_of: now,
                    volume_24h: Some(rng.gen_range(0.0..MAX_DAILY_VOLUME)),
                }
            })
            .collect();

        Ok(quotes)
    }
}
