//! Unit tests for the market roster and its sorted projection.

#[cfg(test)]
mod roster_tests {
    use crate::config::RosterConfig;
    use crate::market::roster::{sorted_view, Instrument, MarketRoster, SortDirection, SortField};
    use crate::provider::types::PriceQuote;
    use chrono::Utc;
    use proptest::prelude::*;

    fn row(symbol: &str, price: f64) -> Instrument {
        let mut i = Instrument::new(symbol, symbol, &format!("id-{}", symbol));
        i.price = price;
        i
    }

    fn quote(id: &str, price: f64) -> PriceQuote {
        PriceQuote {
            id: id.to_string(),
            price,
            as_of: Utc::now(),
            volume_24h: None,
        }
    }

    #[test]
    fn test_sort_by_symbol_and_price() {
        let rows = vec![row("B", 2.0), row("A", 1.0)];

        let by_symbol = sorted_view(&rows, SortField::Symbol, SortDirection::Asc);
        let symbols: Vec<&str> = by_symbol.iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["A", "B"]);

        let by_price = sorted_view(&rows, SortField::Price, SortDirection::Desc);
        let prices: Vec<f64> = by_price.iter().map(|r| r.price).collect();
        assert_eq!(prices, vec![2.0, 1.0]);

        // Input untouched
        assert_eq!(rows[0].symbol, "B");
    }

    #[test]
    fn test_sort_is_stable_both_directions() {
        let rows = vec![row("X", 1.0), row("Y", 2.0), row("Z", 1.0), row("W", 2.0)];

        let asc = sorted_view(&rows, SortField::Price, SortDirection::Asc);
        let asc: Vec<&str> = asc.iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(asc, vec!["X", "Z", "Y", "W"]);

        let desc = sorted_view(&rows, SortField::Price, SortDirection::Desc);
        let desc: Vec<&str> = desc.iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(desc, vec!["Y", "W", "X", "Z"]);
    }

    #[test]
    fn test_string_sort_is_lexicographic() {
        let rows = vec![row("usd/jpy", 0.0), row("EUR/USD", 0.0), row("AUD/USD", 0.0)];
        let view = sorted_view(&rows, SortField::Symbol, SortDirection::Asc);
        let symbols: Vec<&str> = view.iter().map(|r| r.symbol.as_str()).collect();
        // Byte order: uppercase before lowercase
        assert_eq!(symbols, vec!["AUD/USD", "EUR/USD", "usd/jpy"]);
    }

    #[test]
    fn test_sort_field_from_query_names() {
        let field: SortField = serde_json::from_str("\"change24h\"").unwrap();
        assert_eq!(field, SortField::Change24h);
        let field: SortField = serde_json::from_str("\"volume_24h\"").unwrap();
        assert_eq!(field, SortField::Volume24h);
        let field: SortField = serde_json::from_str("\"name\"").unwrap();
        assert_eq!(field, SortField::DisplayName);
        let dir: SortDirection = serde_json::from_str("\"desc\"").unwrap();
        assert_eq!(dir, SortDirection::Desc);
    }

    #[test]
    fn test_roster_from_config() {
        let roster = MarketRoster::from_config(&RosterConfig::default().instruments);
        assert_eq!(roster.rows().len(), 5);
        assert_eq!(roster.rows()[0].symbol, "EUR/USD");
        assert_eq!(roster.reference_ids().len(), 5);
        assert!(roster.last_error().is_none());
        assert!(roster.refreshed_at().is_none());
    }

    #[test]
    fn test_apply_quote_tracks_session_aggregates() {
        let mut roster = MarketRoster::new(vec![row("EUR/USD", 0.0)]);

        assert!(roster.apply_quote(&quote("id-EUR/USD", 1.10)));
        let r = roster.get("EUR/USD").unwrap();
        assert_eq!(r.price, 1.10);
        assert_eq!(r.high_24h, 1.10);
        assert_eq!(r.low_24h, 1.10);
        assert_eq!(r.change_24h, 0.0);

        roster.apply_quote(&quote("id-EUR/USD", 1.21));
        roster.apply_quote(&quote("id-EUR/USD", 1.00));
        let r = roster.get("EUR/USD").unwrap();
        assert_eq!(r.price, 1.00);
        assert_eq!(r.high_24h, 1.21);
        assert_eq!(r.low_24h, 1.00);
        assert!((r.change_24h - (-9.0909)).abs() < 1e-3);
    }

    #[test]
    fn test_apply_quote_volume_only_when_supplied() {
        let mut roster = MarketRoster::new(vec![row("GBP/USD", 0.0)]);
        let mut q = quote("id-GBP/USD", 1.27);
        q.volume_24h = Some(5_000.0);
        roster.apply_quote(&q);
        roster.apply_quote(&quote("id-GBP/USD", 1.28));
        assert_eq!(roster.get("GBP/USD").unwrap().volume_24h, 5_000.0);
    }

    #[test]
    fn test_apply_quote_rejects_unknown_and_bad_price() {
        let mut roster = MarketRoster::new(vec![row("EUR/USD", 0.0)]);
        assert!(!roster.apply_quote(&quote("unknown", 1.0)));
        assert!(!roster.apply_quote(&quote("id-EUR/USD", 0.0)));
        assert!(!roster.apply_quote(&quote("id-EUR/USD", f64::NAN)));
        assert_eq!(roster.get("EUR/USD").unwrap().price, 0.0);
    }

    #[test]
    fn test_failure_keeps_rows_and_sets_banner() {
        let mut roster = MarketRoster::new(vec![row("EUR/USD", 0.0)]);
        roster.apply_quote(&quote("id-EUR/USD", 1.1));
        roster.mark_refreshed(Utc::now());

        roster.mark_failed("provider down");
        assert_eq!(roster.last_error(), Some("provider down"));
        assert_eq!(roster.get("EUR/USD").unwrap().price, 1.1);

        roster.mark_refreshed(Utc::now());
        assert!(roster.last_error().is_none());
    }

    proptest! {
        #[test]
        fn sorted_view_is_stable(prices in proptest::collection::vec(0u8..4, 0..30), desc in any::<bool>()) {
            let rows: Vec<Instrument> = prices
                .iter()
                .enumerate()
                .map(|(i, p)| row(&format!("{:03}", i), *p as f64))
                .collect();
            let direction = if desc { SortDirection::Desc } else { SortDirection::Asc };

            let view = sorted_view(&rows, SortField::Price, direction);
            prop_assert_eq!(view.len(), rows.len());

            for pair in view.windows(2) {
                if pair[0].price == pair[1].price {
                    // Symbols encode original position
                    prop_assert!(pair[0].symbol < pair[1].symbol);
                } else if desc {
                    prop_assert!(pair[0].price > pair[1].price);
                } else {
                    prop_assert!(pair[0].price < pair[1].price);
                }
            }
        }
    }
}
