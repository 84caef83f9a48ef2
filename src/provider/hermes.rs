//! Pyth Hermes price service adapter (REST, latest prices only).

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

use super::{
    traits::{PriceProvider, ProviderResult},
    types::{normalize_feed_id, HermesPriceFeed, PriceQuote},
};
use crate::constants::events;
use crate::error::ProviderError;

#[derive(Clone)]
pub struct HermesProvider {
    client: Client,
    base_url: String,
}

impl HermesProvider {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> ProviderResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/api/latest_price_feeds", self.base_url)
    }
}

#[async_trait]
impl PriceProvider for HermesProvider {
    fn name(&self) -> &'static str {
        "hermes"
    }

    async fn latest_prices(&self, ids: &[String]) -> ProviderResult<Vec<PriceQuote>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        let query: Vec<(&str, &str)> = ids.iter().map(|id| ("ids[]", id.as_str())).collect();
        let resp = self.client.get(self.endpoint()).query(&query).send().await?;
        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(ProviderError::Http {
                status: status.as_u16(),
                body: text,
            });
        }

        let feeds: Vec<HermesPriceFeed> = serde_json::from_str(&text)?;
        debug!("[PROVIDER] hermes returned {} feeds for {} ids", feeds.len(), ids.len());

        if feeds.is_empty() {
            return Err(ProviderError::unavailable(self.name(), "no price feeds available"));
        }

        // A malformed feed only costs its own row
        let mut quotes = Vec::with_capacity(feeds.len());
        let mut first_error = None;
        for feed in feeds {
            match feed.into_quote() {
                Ok(quote) => quotes.push(quote),
                Err(e) => {
                    warn!(event = events::BAD_FEED, "[PROVIDER] Skipping feed: {}", e);
                    first_error.get_or_insert(e);
                }
            }
        }
        if quotes.is_empty() {
            return Err(first_error
                .unwrap_or_else(|| ProviderError::unavailable(self.name(), "no price feeds available")));
        }

        // Callers match on the ids they asked with
        for quote in &mut quotes {
            if let Some(requested) = ids.iter().find(|id| normalize_feed_id(id) == quote.id) {
                quote.id = requested.clone();
            }
        }
        Ok(quotes)
    }
}
