use std::sync::{Arc, Mutex};

use chrono::Utc;
use rust_fxsim::api::{run_server, AppState};
use rust_fxsim::constants::EVENT_BUS_CAPACITY;
use rust_fxsim::market::roster::MarketRoster;
use rust_fxsim::provider::factory::build_provider;
use rust_fxsim::services::reporting::SessionReporter;
use rust_fxsim::services::roster::RosterService;
use rust_fxsim::services::simulation::{SimulationService, TradingSession};
use rust_fxsim::{AppConfig, EventBus};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG_PATH: &str = "config.yaml";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    dotenvy::dotenv().ok();

    // Setup Logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting FxSim...");

    let config_path = std::env::var("FXSIM_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let config = if std::path::Path::new(&config_path).exists() {
        AppConfig::load(&config_path)?
    } else {
        warn!("⚠️ Config file {} not found, using defaults", config_path);
        AppConfig::default()
    };
    info!("Loaded Configuration: {:?}", config);

    let event_bus = EventBus::new(EVENT_BUS_CAPACITY);

    let reporter = SessionReporter::new();
    let reporter_handle = reporter.start(&event_bus);

    // Trading session, seeded so the chart and SMAs are populated at startup
    let session = Arc::new(Mutex::new(TradingSession::from_config(&config, Utc::now())));
    let simulation = SimulationService::new(session.clone(), event_bus.clone(), config.tick_interval());
    let sim_task = simulation.start();

    let provider = build_provider(&config)?;
    info!("📡 Price provider: {}", provider.name());
    let roster = Arc::new(Mutex::new(MarketRoster::from_config(&config.roster.instruments)));
    let roster_service = RosterService::from_config(roster.clone(), provider, event_bus.clone(), &config);
    let roster_task = roster_service.start();

    let state = Arc::new(AppState {
        session,
        roster,
        event_bus,
        reporter,
        config,
    });

    info!("🚀 All services started. Ctrl-C to stop.");
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
        }
        info!("🛑 Shutdown requested");
    };

    let served = run_server(state.clone(), shutdown).await;

    sim_task.stop().await;
    roster_task.stop().await;
    reporter_handle.abort();

    let summary = state.reporter.summary();
    let stats = summary.compute_stats();
    info!(
        "📊 Session: {} ticks | {} opened | {} closed | realized P&L {:.2} | win rate {:.1}%",
        summary.ticks, summary.positions_opened, summary.positions_closed, summary.realized_pnl, stats.win_rate_pct
    );

    served?;
    Ok(())
}
