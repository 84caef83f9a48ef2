use async_trait::async_trait;

use crate::error::ProviderError;

use super::types::PriceQuote;

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Source of latest prices keyed by reference id.
#[async_trait]
pub trait PriceProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Latest quote per id. Ids the provider does not know are omitted.
    async fn latest_prices(&self, ids: &[String]) -> ProviderResult<Vec<PriceQuote>>;

    async fn latest_price(&self, id: &str) -> ProviderResult<PriceQuote> {
        self.latest_prices(&[id.to_string()])
            .await?
            .into_iter()
            .find(|q| q.id == id)
            .ok_or_else(|| ProviderError::unavailable(self.name(), format!("no price feed for {}", id)))
    }
}
