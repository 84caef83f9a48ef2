use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::InstrumentConfig;
use crate::provider::types::PriceQuote;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Instrument {
    pub symbol: String,
    pub display_name: String,
    pub reference_id: String,
    pub price: f64,
    pub change_24h: f64,
    pub high_24h: f64,
    pub low_24h: f64,
    pub volume_24h: f64,
}

impl Instrument {
    pub fn new(symbol: &str, display_name: &str, reference_id: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            display_name: display_name.to_string(),
            reference_id: reference_id.to_string(),
            price: 0.0,
            change_24h: 0.0,
            high_24h: 0.0,
            low_24h: 0.0,
            volume_24h: 0.0,
        }
    }
}

impl From<&InstrumentConfig> for Instrument {
    fn from(config: &InstrumentConfig) -> Self {
        Instrument::new(&config.symbol, &config.name, &config.reference_id)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    Symbol,
    #[serde(alias = "name")]
    DisplayName,
    ReferenceId,
    Price,
    #[serde(rename = "change_24h", alias = "change24h")]
    Change24h,
    #[serde(rename = "high_24h", alias = "high24h")]
    High24h,
    #[serde(rename = "low_24h", alias = "low24h")]
    Low24h,
    #[serde(rename = "volume_24h", alias = "volume24h")]
    Volume24h,
}

impl SortField {
    fn compare(self, a: &Instrument, b: &Instrument) -> Ordering {
        match self {
            SortField::Symbol => a.symbol.cmp(&b.symbol),
            SortField::DisplayName => a.display_name.cmp(&b.display_name),
            SortField::ReferenceId => a.reference_id.cmp(&b.reference_id),
            SortField::Price => a.price.total_cmp(&b.price),
            SortField::Change24h => a.change_24h.total_cmp(&b.change_24h),
            SortField::High24h => a.high_24h.total_cmp(&b.high_24h),
            SortField::Low24h => a.low_24h.total_cmp(&b.low_24h),
            SortField::Volume24h => a.volume_24h.total_cmp(&b.volume_24h),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// Stable sort of a copy of `rows`; tied rows keep their input order in
/// either direction.
pub fn sorted_view(rows: &[Instrument], field: SortField, direction: SortDirection) -> Vec<Instrument> {
    let mut view = rows.to_vec();
    view.sort_by(|a, b| {
        let ord = field.compare(a, b);
        match direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    });
    view
}

/// Current instrument rows plus the state needed to derive session
/// aggregates from successive quotes.
#[derive(Clone, Debug, Default)]
pub struct MarketRoster {
    rows: Vec<Instrument>,
    /// First observed price per row, same order as `rows`
    baselines: Vec<Option<f64>>,
    last_error: Option<String>,
    refreshed_at: Option<DateTime<Utc>>,
}

impl MarketRoster {
    pub fn new(rows: Vec<Instrument>) -> Self {
        let baselines = vec![None; rows.len()];
        Self {
            rows,
            baselines,
            last_error: None,
            refreshed_at: None,
        }
    }

    pub fn from_config(instruments: &[InstrumentConfig]) -> Self {
        Self::new(instruments.iter().map(Instrument::from).collect())
    }

    pub fn rows(&self) -> &[Instrument] {
        &self.rows
    }

    pub fn reference_ids(&self) -> Vec<String> {
        self.rows.iter().map(|r| r.reference_id.clone()).collect()
    }

    pub fn get(&self, symbol: &str) -> Option<&Instrument> {
        self.rows.iter().find(|r| r.symbol == symbol)
    }

    pub fn sorted_view(&self, field: SortField, direction: SortDirection) -> Vec<Instrument> {
        sorted_view(&self.rows, field, direction)
    }

    /// Applies a fresh quote to the row with the matching reference id.
    /// Returns false when no row matches or the price is not positive.
    pub fn apply_quote(&mut self, quote: &PriceQuote) -> bool {
        if !(quote.price > 0.0) {
            return false;
        }
        let Some(idx) = self.rows.iter().position(|r| r.reference_id == quote.id) else {
            return false;
        };

        let row = &mut self.rows[idx];
        let baseline = *self.baselines[idx].get_or_insert(quote.price);
        let first = row.high_24h == 0.0 && row.low_24h == 0.0;

        row.price = quote.price;
        row.change_24h = (quote.price - baseline) / baseline * 100.0;
        row.high_24h = if first { quote.price } else { row.high_24h.max(quote.price) };
        row.low_24h = if first { quote.price } else { row.low_24h.min(quote.price) };
        if let Some(volume) = quote.volume_24h {
            row.volume_24h = volume;
        }
        true
    }

    pub fn mark_refreshed(&mut self, at: DateTime<Utc>) {
        self.refreshed_at = Some(at);
        self.last_error = None;
    }

    /// Keeps the rows as they are and records the error for the view.
    pub fn mark_failed(&mut self, error: impl Into<String>) {
        self.last_error = Some(error.into());
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.refreshed_at
    }
}
