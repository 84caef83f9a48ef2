use std::sync::Arc;

use crate::config::{AppConfig, ProviderKind};
use crate::error::SimResult;

use super::{hermes::HermesProvider, simulated::SimulatedProvider, traits::PriceProvider};

pub fn build_provider(config: &AppConfig) -> SimResult<Arc<dyn PriceProvider>> {
    match config.provider.kind {
        ProviderKind::Simulated => Ok(Arc::new(SimulatedProvider::new(config.simulation.rng_seed))),
        ProviderKind::Hermes => {
            let hermes = HermesProvider::new(config.provider.base_url.clone(), config.provider_timeout())?;
            Ok(Arc::new(hermes))
        }
    }
}
