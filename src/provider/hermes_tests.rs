//! HTTP-level tests for HermesProvider against a local stub server.

#[cfg(test)]
mod hermes_tests {
    use crate::error::ProviderError;
    use crate::provider::hermes::HermesProvider;
    use crate::provider::traits::PriceProvider;
    use axum::{http::StatusCode, routing::get, Router};
    use std::time::Duration;

    const MIXED_FEEDS: &str = r#"[
        {"id": "aaaa", "price": {"price": "109265", "conf": "12", "expo": -5, "publish_time": 1735689600}},
        {"id": "bbbb", "price": {"price": "n/a", "conf": "3", "expo": -5, "publish_time": 1735689600}}
    ]"#;

    const BAD_FEEDS: &str = r#"[
        {"id": "bbbb", "price": {"price": "n/a", "expo": -5, "publish_time": 1735689600}}
    ]"#;

    /// Serves `body` with `status` on the Hermes latest-feeds path.
    async fn stub(status: StatusCode, body: &'static str) -> HermesProvider {
        let app = Router::new().route(
            "/api/latest_price_feeds",
            get(move || async move { (status, body) }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        HermesProvider::new(format!("http://{}/", addr), Duration::from_secs(3)).unwrap()
    }

    fn ids(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_mixed_batch_keeps_good_feeds() {
        let provider = stub(StatusCode::OK, MIXED_FEEDS).await;

        let quotes = provider.latest_prices(&ids(&["aaaa", "bbbb"])).await.unwrap();
        assert_eq!(quotes.len(), 1);
        assert_eq!(quotes[0].id, "aaaa");
        assert!((quotes[0].price - 1.09265).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_requested_id_spelling_is_kept() {
        let provider = stub(StatusCode::OK, MIXED_FEEDS).await;

        let quote = provider.latest_price("0xAAAA").await.unwrap();
        assert_eq!(quote.id, "0xAAAA");
    }

    #[tokio::test]
    async fn test_all_feeds_bad_is_an_error() {
        let provider = stub(StatusCode::OK, BAD_FEEDS).await;

        let err = provider.latest_prices(&ids(&["bbbb"])).await.unwrap_err();
        assert!(err.to_string().contains("bbbb"), "{}", err);
    }

    #[tokio::test]
    async fn test_empty_array_is_unavailable() {
        let provider = stub(StatusCode::OK, "[]").await;

        let err = provider.latest_prices(&ids(&["aaaa"])).await.unwrap_err();
        assert!(matches!(err, ProviderError::Unavailable { .. }));
    }

    #[tokio::test]
    async fn test_non_success_status() {
        let provider = stub(StatusCode::BAD_GATEWAY, "upstream down").await;

        match provider.latest_prices(&ids(&["aaaa"])).await {
            Err(ProviderError::Http { status, body }) => {
                assert_eq!(status, 502);
                assert_eq!(body, "upstream down");
            }
            other => panic!("expected HTTP error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_malformed_body_is_decode_error() {
        let provider = stub(StatusCode::OK, "{not json").await;

        let err = provider.latest_prices(&ids(&["aaaa"])).await.unwrap_err();
        assert!(matches!(err, ProviderError::Decode(_)));
    }

    #[tokio::test]
    async fn test_no_ids_skips_request() {
        let provider = HermesProvider::new("http://127.0.0.1:9", Duration::from_millis(100)).unwrap();
        assert!(provider.latest_prices(&[]).await.unwrap().is_empty());
    }
}
