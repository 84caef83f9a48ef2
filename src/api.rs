use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::future::Future;
use std::sync::Arc;
use tracing::{info, warn};

use crate::bus::EventBus;
use crate::config::AppConfig;
use crate::error::{ProviderError, SimError, SimResult};
use crate::events::Event;
use crate::format::{compact_number, signed_percent};
use crate::market::roster::{Instrument, SortDirection, SortField};
use crate::services::lock;
use crate::services::position_ledger::Side;
use crate::services::reporting::SessionReporter;
use crate::services::roster::RosterHandle;
use crate::services::simulation::SessionHandle;

pub struct AppState {
    pub session: SessionHandle,
    pub roster: RosterHandle,
    pub event_bus: EventBus,
    pub reporter: SessionReporter,
    pub config: AppConfig,
}

impl IntoResponse for SimError {
    fn into_response(self) -> Response {
        let status = match &self {
            SimError::Validation(_) => StatusCode::BAD_REQUEST,
            SimError::Capacity { .. } => StatusCode::CONFLICT,
            SimError::NotFound { .. } => StatusCode::NOT_FOUND,
            SimError::Provider(_) => StatusCode::SERVICE_UNAVAILABLE,
            SimError::Config(_) | SimError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            warn!("[API] {}", self);
        }
        (status, Json(json!({"error": self.to_string()}))).into_response()
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/market/analysis", get(market_analysis))
        .route("/market/chart", get(market_chart))
        .route("/positions", get(list_positions))
        .route("/position/open", post(open_position))
        .route("/position/{id}", delete(close_position))
        .route("/markets", get(list_markets))
        .route("/report", get(get_report))
        .with_state(state)
}

/// Serves until `shutdown` resolves, then drains in-flight requests.
pub async fn run_server<F>(state: Arc<AppState>, shutdown: F) -> SimResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let bind = state.config.server.bind.clone();
    let listener = tokio::net::TcpListener::bind(&bind).await?;
    info!("🌐 [API] Server listening on {}", bind);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;
    info!("[API] Server stopped");
    Ok(())
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let session = lock(&state.session);
    Json(json!({
        "status": "ok",
        "symbol": session.symbol(),
        "ticks": session.ticks(),
    }))
}

async fn market_analysis(State(state): State<Arc<AppState>>) -> Result<Response, SimError> {
    let session = lock(&state.session);
    let snapshot = session
        .snapshot()
        .ok_or_else(|| ProviderError::unavailable("simulation", "no market data yet"))?;
    Ok(Json(snapshot).into_response())
}

async fn market_chart(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let series = lock(&state.session).chart_series();
    Json(series)
}

async fn list_positions(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let session = lock(&state.session);
    let ledger = session.ledger();
    Json(json!({
        "positions": ledger.positions(),
        "open_count": ledger.open_count(),
        "capacity": ledger.capacity(),
        "total_unrealized_pnl": ledger.total_unrealized_pnl(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct OpenRequest {
    #[serde(alias = "type")]
    pub side: Side,
    /// Lots; the risk-based default when absent
    #[serde(default)]
    pub size: Option<f64>,
}

async fn open_position(
    State(state): State<Arc<AppState>>,
    Json(req): Json<OpenRequest>,
) -> Result<Response, SimError> {
    let position = {
        let mut session = lock(&state.session);
        let size = req.size.unwrap_or_else(|| session.default_order_size());
        session.submit_order(req.side, size, Utc::now())?
    };
    info!(
        "📥 [API] Opened #{} {:?} {} @ {:.5}",
        position.id, position.side, position.size, position.entry_price
    );
    state.event_bus.emit(Event::PositionOpened(position.clone()));
    Ok(Json(position).into_response())
}

async fn close_position(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Response, SimError> {
    let position = lock(&state.session).close_position(id)?;
    info!(
        "📤 [API] Closed #{} at {:.5} (P&L: {:.2})",
        position.id, position.current_price, position.unrealized_pnl
    );
    state.event_bus.emit(Event::PositionClosed(position.clone()));
    Ok(Json(position).into_response())
}

#[derive(Debug, Default, Deserialize)]
pub struct MarketsQuery {
    pub sort: Option<SortField>,
    #[serde(default)]
    pub dir: SortDirection,
}

#[derive(Debug, Serialize)]
pub struct MarketRow {
    #[serde(flatten)]
    pub instrument: Instrument,
    pub price_display: String,
    pub change_display: String,
    pub volume_display: String,
}

impl From<Instrument> for MarketRow {
    fn from(instrument: Instrument) -> Self {
        Self {
            price_display: compact_number(instrument.price, 5),
            change_display: signed_percent(instrument.change_24h),
            volume_display: compact_number(instrument.volume_24h, 2),
            instrument,
        }
    }
}

async fn list_markets(
    State(state): State<Arc<AppState>>,
    Query(query): Query<MarketsQuery>,
) -> impl IntoResponse {
    let roster = lock(&state.roster);
    let rows = match query.sort {
        Some(field) => roster.sorted_view(field, query.dir),
        None => roster.rows().to_vec(),
    };
    let markets: Vec<MarketRow> = rows.into_iter().map(MarketRow::from).collect();

    Json(json!({
        "markets": markets,
        "last_error": roster.last_error(),
        "refreshed_at": roster.refreshed_at(),
    }))
}

async fn get_report(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let summary = state.reporter.summary();
    let stats = summary.compute_stats();
    Json(json!({
        "summary": summary,
        "stats": stats,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::roster::MarketRoster;
    use crate::provider::types::PriceQuote;
    use crate::services::simulation::TradingSession;
    use std::sync::Mutex;

    fn state() -> Arc<AppState> {
        let mut config = AppConfig::default();
        config.simulation.rng_seed = Some(11);
        config.ledger.max_positions = 2;

        let session = TradingSession::from_config(&config, Utc::now());
        let roster = MarketRoster::from_config(&config.roster.instruments);
        Arc::new(AppState {
            session: Arc::new(Mutex::new(session)),
            roster: Arc::new(Mutex::new(roster)),
            event_bus: EventBus::new(16),
            reporter: SessionReporter::new(),
            config,
        })
    }

    fn open(side: Side, size: f64) -> Json<OpenRequest> {
        Json(OpenRequest { side, size: Some(size) })
    }

    #[test]
    fn test_error_status_mapping() {
        let cases = [
            (SimError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (SimError::Capacity { open: 10, max: 10 }, StatusCode::CONFLICT),
            (SimError::NotFound { id: 3 }, StatusCode::NOT_FOUND),
            (
                SimError::Provider(ProviderError::unavailable("hermes", "down")),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (SimError::Config("bad".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[tokio::test]
    async fn test_open_then_close_emits_events() {
        let state = state();
        let mut rx = state.event_bus.subscribe();

        let resp = open_position(State(state.clone()), open(Side::Buy, 0.5)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(matches!(rx.recv().await.unwrap(), Event::PositionOpened(_)));

        let id = lock(&state.session).positions()[0].id;
        let resp = close_position(State(state.clone()), Path(id)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(matches!(rx.recv().await.unwrap(), Event::PositionClosed(_)));

        let err = close_position(State(state.clone()), Path(id)).await.unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_open_rejections() {
        let state = state();

        let err = open_position(State(state.clone()), open(Side::Buy, 0.0)).await.unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);

        open_position(State(state.clone()), open(Side::Buy, 1.0)).await.unwrap();
        open_position(State(state.clone()), open(Side::Sell, 1.0)).await.unwrap();
        let err = open_position(State(state.clone()), open(Side::Buy, 1.0)).await.unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_analysis_unavailable_before_first_price() {
        let state = state();
        *lock(&state.session) =
            TradingSession::new(&state.config.simulation, &state.config.ledger);

        let err = market_analysis(State(state.clone())).await.unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_market_row_display_fields() {
        let mut roster = MarketRoster::new(vec![Instrument::new("EUR/USD", "Euro", "eur")]);
        roster.apply_quote(&PriceQuote {
            id: "eur".to_string(),
            price: 1.09265,
            as_of: Utc::now(),
            volume_24h: Some(3_400_000.0),
        });

        let row = MarketRow::from(roster.rows()[0].clone());
        assert_eq!(row.price_display, "1.09265");
        assert_eq!(row.change_display, "+0.00%");
        assert_eq!(row.volume_display, "3.4M");

        let value = serde_json::to_value(&row).unwrap();
        assert_eq!(value["symbol"], "EUR/USD");
        assert_eq!(value["volume_display"], "3.4M");
    }

    #[test]
    fn test_open_request_accepts_type_field() {
        let req: OpenRequest = serde_json::from_value(json!({"type": "sell", "size": 0.3})).unwrap();
        assert_eq!(req.side, Side::Sell);
        assert_eq!(req.size, Some(0.3));

        let req: OpenRequest = serde_json::from_value(json!({"side": "buy"})).unwrap();
        assert_eq!(req.side, Side::Buy);
        assert!(req.size.is_none());
    }

    #[tokio::test]
    async fn test_open_without_size_uses_risk_size() {
        let state = state();
        let req = Json(OpenRequest { side: Side::Buy, size: None });

        open_position(State(state.clone()), req).await.unwrap();
        let session = lock(&state.session);
        assert_eq!(session.positions()[0].size, 4.0);
        assert_eq!(session.positions()[0].size, session.default_order_size());
    }

    #[test]
    fn test_markets_query_parsing() {
        let q: MarketsQuery = serde_json::from_value(json!({"sort": "change_24h", "dir": "desc"})).unwrap();
        assert_eq!(q.sort, Some(SortField::Change24h));
        assert_eq!(q.dir, SortDirection::Desc);

        let q: MarketsQuery = serde_json::from_value(json!({})).unwrap();
        assert!(q.sort.is_none());
        assert_eq!(q.dir, SortDirection::Asc);
    }
}
