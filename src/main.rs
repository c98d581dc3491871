// =============================================================================
// Coin Signal: Main Entry Point
// =============================================================================
//
// Polls Coincheck JPY tickers, keeps a rolling price history and turns it into
// buy / sell / hold advice. One binary runs one of three variants (advisor,
// day trading, overview) selected by `mode` in the runtime config or by
// `COIN_SIGNAL_MODE`. If the exchange is unreachable the feed switches to
// simulated prices for the rest of the run.
// =============================================================================

// ── Module declarations ──────────────────────────────────────────────────────
mod alerts;
mod api;
mod app_state;
mod coincheck;
mod engine;
mod error;
mod feed;
mod indicators;
mod market_data;
mod portfolio;
mod ports;
mod runtime_config;
mod scheduler;
mod session;
mod signals;
mod types;

use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::app_state::AppState;
use crate::coincheck::CoincheckClient;
use crate::feed::{DemoSource, FailoverSource, TickerSource};
use crate::ports::{JsonFileSettingsStore, MemorySettingsStore, NotificationSink, Ports, SettingsStore};
use crate::runtime_config::RuntimeConfig;

const CONFIG_PATH: &str = "runtime_config.json";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Coin Signal starting up");

    let mut config = RuntimeConfig::load(CONFIG_PATH).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        RuntimeConfig::default()
    });
    config.apply_env();

    info!(
        mode = %config.mode,
        pairs = config.pairs.len(),
        active_pair = %config.active_pair,
        proxied = config.use_cors_proxy,
        "Configuration resolved"
    );

    // ── 2. User settings ─────────────────────────────────────────────────
    let settings_store: Arc<dyn SettingsStore> = if config.settings_path.trim().is_empty() {
        info!("No settings path configured, keeping settings in memory");
        Arc::new(MemorySettingsStore::default())
    } else {
        let store = JsonFileSettingsStore::new(config.settings_path.trim());
        info!(path = %store.path().display(), "User settings file");
        Arc::new(store)
    };
    let settings = settings_store.load().unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load user settings, using defaults");
        Default::default()
    });

    let ports = Ports::tracing(settings_store);

    // ── 3. Market data source ────────────────────────────────────────────
    let live = CoincheckClient::new(
        config.api_base.clone(),
        config.proxy(),
        config.request_timeout(),
    )?;
    let notifier: Arc<dyn NotificationSink> = ports.notifier.clone();
    let source: Arc<dyn TickerSource> = Arc::new(FailoverSource::new(
        Arc::new(live),
        DemoSource::new(),
        notifier,
        config.demo_after_failures,
    ));

    // ── 4. Shared state & refresh task ───────────────────────────────────
    let bind_addr = config.bind_addr.clone();
    let state = Arc::new(AppState::new(config, source, ports, settings));
    engine::start(&state);

    // ── 5. API server ────────────────────────────────────────────────────
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(addr = %bind_addr, "API server listening");
    let app = api::rest::router(state.clone());
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!(error = %e, "API server failed");
        }
    });

    info!("All subsystems running. Press Ctrl+C to stop.");

    // ── 6. Graceful shutdown ─────────────────────────────────────────────
    tokio::signal::ctrl_c().await?;
    warn!("Shutdown signal received, stopping gracefully");

    state.scheduler.stop();
    state.persist_settings();

    if let Err(e) = state.runtime_config.read().save(CONFIG_PATH) {
        error!(error = %e, "Failed to save runtime config on shutdown");
    }

    info!("Coin Signal shut down complete.");
    Ok(())
}
