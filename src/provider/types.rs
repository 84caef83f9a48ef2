use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    /// Reference id of the feed
    pub id: String,
    pub price: f64,
    pub as_of: DateTime<Utc>,
    pub volume_24h: Option<f64>,
}

impl PriceQuote {
    pub fn age_secs(&self, now: DateTime<Utc>) -> i64 {
        (now - self.as_of).num_seconds()
    }

    /// Rejects quotes published more than `max_age_secs` before `now`.
    pub fn ensure_fresh(self, now: DateTime<Utc>, max_age_secs: i64) -> Result<Self, ProviderError> {
        let age_secs = self.age_secs(now);
        if age_secs > max_age_secs {
            return Err(ProviderError::Stale {
                id: self.id,
                age_secs,
                max_age_secs,
            });
        }
        Ok(self)
    }
}

/// Entry of Hermes' `/api/latest_price_feeds` response.
#[derive(Clone, Debug, Deserialize)]
pub struct HermesPriceFeed {
    pub id: String,
    pub price: HermesPrice,
}

#[derive(Clone, Debug, Deserialize)]
pub struct HermesPrice {
    /// Integer mantissa, sent as a string
    pub price: String,
    #[serde(default)]
    pub conf: Option<String>,
    pub expo: i32,
    pub publish_time: i64,
}

impl HermesPriceFeed {
    pub fn into_quote(self) -> Result<PriceQuote, ProviderError> {
        let mantissa: i64 = self.price.price.parse().map_err(|_| {
            ProviderError::unavailable("hermes", format!("bad price mantissa '{}' for {}", self.price.price, self.id))
        })?;
        let as_of = DateTime::<Utc>::from_timestamp(self.price.publish_time, 0).ok_or_else(|| {
            ProviderError::unavailable("hermes", format!("bad publish_time {} for {}", self.price.publish_time, self.id))
        })?;

        Ok(PriceQuote {
            id: normalize_feed_id(&self.id),
            price: mantissa as f64 * 10f64.powi(self.price.expo),
            as_of,
            volume_24h: None,
        })
    }
}

/// Feed ids are compared without the optional `0x` prefix, lowercase.
pub fn normalize_feed_id(id: &str) -> String {
    id.trim_start_matches("0x").to_ascii_lowercase()
}
