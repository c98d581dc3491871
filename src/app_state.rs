// =============================================================================
// Central Application State
// =============================================================================
//
// The single source of truth for one running instance. The refresh cycles
// mutate it, the REST API reads it and applies user input to it, and
// `build_snapshot` turns it into the JSON the dashboard renders.
//
// Thread safety:
//   - Atomic counter for lock-free version tracking.
//   - parking_lot::RwLock for every mutable piece.
//   - Arc'd ports and source so cycles can run on spawned tasks.
// =============================================================================

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;
use serde::Serialize;
use tracing::{error, info};

use crate::alerts::{AlertBook, PriceAlert, UserSettings};
use crate::error::InputError;
use crate::feed::TickerSource;
use crate::market_data::{OrderBookSummary, PriceHistoryStore, PriceSample};
use crate::portfolio::{parse_price, parse_quantity, PnlReport, Position};
use crate::ports::Ports;
use crate::runtime_config::RuntimeConfig;
use crate::scheduler::{BusyFlag, Scheduler};
use crate::session::{PairEvaluation, Session};
use crate::signals::OverviewReport;
use crate::types::{AppMode, ConnectionStatus, Signal};

// =============================================================================
// Error Record
// =============================================================================

/// A recorded error event for the dashboard error log.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorRecord {
    pub message: String,
    /// Pair the error relates to, if any.
    pub pair: Option<String>,
    /// ISO 8601 timestamp.
    pub at: String,
}

/// Connection indicator plus its explanatory text.
#[derive(Debug, Clone, Serialize)]
pub struct StatusInfo {
    pub status: ConnectionStatus,
    pub detail: String,
    pub source: &'static str,
}

// =============================================================================
// AppState
// =============================================================================

/// Maximum number of recent errors to retain.
const MAX_RECENT_ERRORS: usize = 50;

pub struct AppState {
    // ── Version tracking ────────────────────────────────────────────────
    /// Bumped on every meaningful mutation so clients can poll cheaply.
    pub state_version: AtomicU64,

    // ── Configuration ───────────────────────────────────────────────────
    pub runtime_config: Arc<RwLock<RuntimeConfig>>,

    // ── Single-pair screen (advisor / day trading) ──────────────────────
    pub session: RwLock<Session>,
    pub last_evaluation: RwLock<Option<PairEvaluation>>,
    pub order_book: RwLock<Option<OrderBookSummary>>,

    // ── Overview ────────────────────────────────────────────────────────
    pub overview_history: PriceHistoryStore,
    pub overview_report: RwLock<Option<OverviewReport>>,

    // ── User settings ───────────────────────────────────────────────────
    pub alerts: RwLock<AlertBook>,
    pub notifications_enabled: RwLock<bool>,

    // ── Status & errors ─────────────────────────────────────────────────
    pub status: RwLock<StatusInfo>,
    pub recent_errors: RwLock<Vec<ErrorRecord>>,

    // ── Collaborators ───────────────────────────────────────────────────
    pub source: Arc<dyn TickerSource>,
    pub ports: Ports,
    pub scheduler: Scheduler,
    pub busy: BusyFlag,

    /// Instant when the engine was started. Used for uptime calculations.
    pub start_time: std::time::Instant,
}

impl AppState {
    pub fn new(
        config: RuntimeConfig,
        source: Arc<dyn TickerSource>,
        ports: Ports,
        settings: UserSettings,
    ) -> Self {
        let mut session = Session::new(config.mode, &config.active_pair, config.history_limit);
        if let Err(e) = session.select_timeframe(&config.timeframe) {
            error!(error = %e, "configured timeframe rejected, keeping default");
        }
        let history = PriceHistoryStore::new(config.history_limit);
        let status = StatusInfo {
            status: ConnectionStatus::Connecting,
            detail: "Connecting".to_string(),
            source: source.name(),
        };

        Self {
            state_version: AtomicU64::new(1),
            runtime_config: Arc::new(RwLock::new(config)),

            session: RwLock::new(session),
            last_evaluation: RwLock::new(None),
            order_book: RwLock::new(None),

            overview_history: history,
            overview_report: RwLock::new(None),

            alerts: RwLock::new(AlertBook::new(settings.alerts)),
            notifications_enabled: RwLock::new(settings.notifications_enabled),

            status: RwLock::new(status),
            recent_errors: RwLock::new(Vec::new()),

            source,
            ports,
            scheduler: Scheduler::new(),
            busy: BusyFlag::default(),
            start_time: std::time::Instant::now(),
        }
    }

    // ── Version Management ──────────────────────────────────────────────

    pub fn increment_version(&self) -> u64 {
        self.state_version.fetch_add(1, Ordering::SeqCst)
    }

    pub fn current_state_version(&self) -> u64 {
        self.state_version.load(Ordering::SeqCst)
    }

    pub fn mode(&self) -> AppMode {
        self.runtime_config.read().mode
    }

    // ── Error Logging ───────────────────────────────────────────────────

    /// Record an error. The ring is capped at [`MAX_RECENT_ERRORS`]; oldest
    /// entries are evicted first.
    pub fn push_error(&self, msg: String, pair: Option<&str>) {
        let record = ErrorRecord {
            message: msg,
            pair: pair.map(str::to_string),
            at: Utc::now().to_rfc3339(),
        };

        let mut errors = self.recent_errors.write();
        errors.push(record);
        while errors.len() > MAX_RECENT_ERRORS {
            errors.remove(0);
        }
        drop(errors);

        self.increment_version();
    }

    // ── Status ──────────────────────────────────────────────────────────

    pub fn set_status(&self, status: ConnectionStatus, detail: impl Into<String>) {
        let detail = detail.into();
        {
            let mut current = self.status.write();
            if current.status == status && current.detail == detail {
                return;
            }
            *current = StatusInfo {
                status,
                detail: detail.clone(),
                source: self.source.name(),
            };
        }
        self.ports.display.show_status(status, &detail);
        self.increment_version();
    }

    /// Connected or Demo, depending on where the last quote came from.
    pub fn mark_connected(&self) {
        if self.source.is_demo() {
            self.set_status(ConnectionStatus::Demo, "Demo mode (live updates)");
        } else {
            self.set_status(ConnectionStatus::Connected, "Live updates");
        }
    }

    // ── User input ──────────────────────────────────────────────────────

    /// Make `pair` the active single-pair pair. Resets its history.
    pub fn select_pair(&self, pair: &str) -> Result<(), InputError> {
        let pair = pair.trim().to_lowercase();
        {
            let mut config = self.runtime_config.write();
            if !config.is_selectable(&pair) {
                return Err(InputError::UnknownPair(pair));
            }
            config.active_pair = pair.clone();
        }
        self.session.write().select_pair(&pair);
        self.clear_pair_view();
        info!(pair = %pair, "active pair changed");
        Ok(())
    }

    pub fn select_timeframe(&self, timeframe: &str) -> Result<(), InputError> {
        self.session.write().select_timeframe(timeframe)?;
        self.runtime_config.write().timeframe = timeframe.trim().to_string();
        self.clear_pair_view();
        info!(timeframe = %timeframe.trim(), "timeframe changed");
        Ok(())
    }

    fn clear_pair_view(&self) {
        *self.last_evaluation.write() = None;
        *self.order_book.write() = None;
        self.increment_version();
    }

    /// Set entry price and quantity from user text. Blank clears a field.
    /// Nothing changes unless both fields are valid.
    pub fn set_position(&self, entry: &str, quantity: &str) -> Result<Option<PnlReport>, InputError> {
        let entry_price = optional(entry, parse_price)?;
        let quantity = optional(quantity, parse_quantity)?;

        let mut session = self.session.write();
        session.position = Position {
            entry_price,
            quantity,
        };
        let pnl = session.pnl();
        drop(session);

        self.increment_version();
        Ok(pnl)
    }

    pub fn add_alert(&self, price_text: &str) -> Result<PriceAlert, InputError> {
        let pair = self.session.read().pair().to_string();
        let alert = self
            .alerts
            .write()
            .add_text(price_text, &pair, Utc::now().timestamp_millis())?;
        let total = self.alerts.read().len();
        info!(pair = %alert.pair, price = alert.price, id = alert.id, total, "price alert added");
        self.persist_settings();
        Ok(alert)
    }

    pub fn remove_alert(&self, id: i64) -> bool {
        let removed = self.alerts.write().remove(id);
        if removed {
            info!(id, "price alert removed");
            self.persist_settings();
        }
        removed
    }

    pub fn set_notifications(&self, enabled: bool) {
        *self.notifications_enabled.write() = enabled;
        info!(enabled, "notifications toggled");
        if enabled && self.runtime_config.read().notify_every_signal {
            self.ports
                .notifier
                .notify("Notifications enabled", "Buy and sell signals will be announced");
        }
        self.persist_settings();
    }

    pub fn notifications_enabled(&self) -> bool {
        *self.notifications_enabled.read()
    }

    // ── Persistence ─────────────────────────────────────────────────────

    pub fn user_settings(&self) -> UserSettings {
        UserSettings {
            notifications_enabled: self.notifications_enabled(),
            alerts: self.alerts.read().alerts().to_vec(),
        }
    }

    /// Write settings through the store. Failures are logged and recorded,
    /// never propagated to the caller.
    pub fn persist_settings(&self) {
        let settings = self.user_settings();
        if let Err(e) = self.ports.settings.save(&settings) {
            error!(error = %e, "failed to persist user settings");
            self.push_error(format!("settings not saved: {e:#}"), None);
        }
        self.increment_version();
    }

    // ── Overview ────────────────────────────────────────────────────────

    pub fn record_overview_price(&self, pair: &str, price: f64) {
        self.overview_history
            .append(pair, PriceSample::new(price, Utc::now()));
    }

    // ── Snapshot Builder ────────────────────────────────────────────────

    /// Serialisable snapshot for `GET /api/v1/state`.
    pub fn build_snapshot(&self) -> StateSnapshot {
        let config = self.runtime_config.read();
        let session = self.session.read();
        let min_history = config.profile(config.mode).min_history;

        let evaluation = self.last_evaluation.read().clone();
        let pair = evaluation
            .as_ref()
            .map(|e| session.view(e, min_history));

        StateSnapshot {
            state_version: self.current_state_version(),
            server_time: Utc::now().timestamp_millis(),
            uptime_secs: self.start_time.elapsed().as_secs(),
            session_id: session.id.to_string(),
            mode: config.mode,
            active_pair: session.pair().to_string(),
            timeframe: session.timeframe().to_string(),
            history_len: session.series().len(),
            last_signal: session.last_signal(),
            status: self.status.read().clone(),
            demo: self.source.is_demo(),
            pair,
            evaluation,
            order_book: self.order_book.read().clone(),
            overview: self.overview_report.read().clone(),
            alerts: self.alerts.read().alerts().to_vec(),
            notifications_enabled: self.notifications_enabled(),
            position: session.position,
            refresh_task: self.scheduler.current(),
            recent_errors: self.recent_errors.read().clone(),
        }
    }
}

fn optional<F>(text: &str, parse: F) -> Result<Option<f64>, InputError>
where
    F: Fn(&str) -> Result<f64, InputError>,
{
    if text.trim().is_empty() {
        Ok(None)
    } else {
        parse(text).map(Some)
    }
}

// =============================================================================
// Snapshot types
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct StateSnapshot {
    pub state_version: u64,
    pub server_time: i64,
    pub uptime_secs: u64,
    pub session_id: String,
    pub mode: AppMode,
    pub active_pair: String,
    pub timeframe: String,
    pub history_len: usize,
    pub last_signal: Option<Signal>,
    pub status: StatusInfo,
    pub demo: bool,
    pub pair: Option<crate::session::PairView>,
    pub evaluation: Option<PairEvaluation>,
    pub order_book: Option<OrderBookSummary>,
    pub overview: Option<OverviewReport>,
    pub alerts: Vec<PriceAlert>,
    pub notifications_enabled: bool,
    pub position: Position,
    pub refresh_task: Option<String>,
    pub recent_errors: Vec<ErrorRecord>,
}

#[cfg(test)]
pub mod test_support {
    use super::*;
    use crate::feed::testing::ScriptedSource;
    use crate::ports::{MemorySettingsStore, RecordingNotifier, TracingDisplay};

    /// AppState over a scripted source with in-memory settings.
    pub fn state_with(
        config: RuntimeConfig,
        source: Arc<dyn TickerSource>,
    ) -> (Arc<AppState>, Arc<RecordingNotifier>, Arc<MemorySettingsStore>) {
        let notifier = Arc::new(RecordingNotifier::default());
        let store = Arc::new(MemorySettingsStore::default());
        let ports = Ports {
            display: Arc::new(TracingDisplay),
            notifier: notifier.clone(),
            settings: store.clone(),
        };
        let state = Arc::new(AppState::new(config, source, ports, UserSettings::default()));
        (state, notifier, store)
    }

    pub fn scripted(prices: &[f64]) -> Arc<ScriptedSource> {
        Arc::new(ScriptedSource::with_prices(prices))
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::ports::SettingsStore;

    fn state() -> (Arc<AppState>, Arc<crate::ports::MemorySettingsStore>) {
        let (s, _, store) = state_with(RuntimeConfig::default(), scripted(&[100.0]));
        (s, store)
    }

    #[test]
    fn error_ring_is_capped() {
        let (s, _) = state();
        for i in 0..60 {
            s.push_error(format!("e{i}"), None);
        }
        let errors = s.recent_errors.read();
        assert_eq!(errors.len(), MAX_RECENT_ERRORS);
        assert_eq!(errors[0].message, "e10");
    }

    #[test]
    fn select_pair_validates_and_resets() {
        let (s, _) = state();
        assert_eq!(
            s.select_pair("nope_jpy"),
            Err(InputError::UnknownPair("nope_jpy".into()))
        );
        assert_eq!(s.session.read().pair(), "btc_jpy");

        s.select_pair(" ETH_JPY ").unwrap();
        assert_eq!(s.session.read().pair(), "eth_jpy");
        assert_eq!(s.runtime_config.read().active_pair, "eth_jpy");
    }

    #[test]
    fn position_input_is_all_or_nothing() {
        let (s, _) = state();
        assert!(s.set_position("100", "abc").is_err());
        assert_eq!(s.session.read().position, Position::default());

        let pnl = s.set_position("100", "2").unwrap();
        assert!(pnl.is_none());
        assert_eq!(s.session.read().position.quantity, Some(2.0));

        s.set_position("", "").unwrap();
        assert_eq!(s.session.read().position, Position::default());
    }

    #[test]
    fn alerts_and_notifications_persist() {
        let (s, store) = state();
        let alert = s.add_alert("8400000").unwrap();
        assert_eq!(alert.pair, "btc_jpy");
        assert!(s.add_alert("-1").is_err());
        s.set_notifications(true);

        let saved = store.load().unwrap();
        assert!(saved.notifications_enabled);
        assert_eq!(saved.alerts.len(), 1);

        assert!(s.remove_alert(alert.id));
        assert!(store.load().unwrap().alerts.is_empty());
    }

    #[test]
    fn status_change_bumps_version_once() {
        let (s, _) = state();
        let v = s.current_state_version();
        s.set_status(ConnectionStatus::Disconnected, "Error");
        s.set_status(ConnectionStatus::Disconnected, "Error");
        assert_eq!(s.current_state_version(), v + 1);
    }

    #[test]
    fn snapshot_serialises() {
        let (s, _) = state();
        let snap = s.build_snapshot();
        assert_eq!(snap.active_pair, "btc_jpy");
        assert_eq!(snap.mode, AppMode::Overview);
        let json = serde_json::to_value(&snap).unwrap();
        assert_eq!(json["status"]["status"], "connecting");
        assert_eq!(json["timeframe"], "5m");
    }
}
