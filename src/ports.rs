// =============================================================================
// Ports: display, notification and settings seams
// =============================================================================
//
// The engine never renders or persists anything itself. It pushes view data
// through `DisplaySink`, user-facing pings through `NotificationSink`, and
// reads/writes `UserSettings` through `SettingsStore`. Defaults log through
// tracing and write a JSON file.
// =============================================================================

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::alerts::UserSettings;
use crate::indicators::rsi::rsi_zone;
use crate::market_data::pairs::{display_name, format_price};
use crate::market_data::OrderBookSummary;
use crate::session::PairView;
use crate::signals::OverviewReport;
use crate::types::ConnectionStatus;

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

pub trait DisplaySink: Send + Sync {
    fn show_status(&self, status: ConnectionStatus, detail: &str);
    fn show_pair(&self, view: &PairView);
    fn show_overview(&self, report: &OverviewReport);
    fn show_order_book(&self, book: &OrderBookSummary);
}

pub trait NotificationSink: Send + Sync {
    fn notify(&self, title: &str, body: &str);
    /// Transient, non-blocking message (e.g. the demo-mode warning).
    fn banner(&self, text: &str);
}

pub trait SettingsStore: Send + Sync {
    /// Missing storage yields defaults; only unreadable storage is an error.
    fn load(&self) -> Result<UserSettings>;
    fn save(&self, settings: &UserSettings) -> Result<()>;
}

/// The three seams bundled for `AppState`.
#[derive(Clone)]
pub struct Ports {
    pub display: Arc<dyn DisplaySink>,
    pub notifier: Arc<dyn NotificationSink>,
    pub settings: Arc<dyn SettingsStore>,
}

impl Ports {
    /// Tracing display and notifier over the given settings store.
    pub fn tracing(settings: Arc<dyn SettingsStore>) -> Self {
        Self {
            display: Arc::new(TracingDisplay),
            notifier: Arc::new(TracingNotifier),
            settings,
        }
    }
}

// ---------------------------------------------------------------------------
// Tracing adapters
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDisplay;

impl DisplaySink for TracingDisplay {
    fn show_status(&self, status: ConnectionStatus, detail: &str) {
        info!(status = %status, detail, "connection status");
    }

    fn show_pair(&self, view: &PairView) {
        let price = view.price.map(format_price).unwrap_or_else(|| "---".into());
        match &view.signal {
            Some(result) => info!(
                pair = %view.pair,
                name = %display_name(&view.pair),
                price = %price,
                change_pct = view.change_pct,
                signal = %result.signal,
                score = result.score,
                rsi_zone = rsi_zone(result.indicators.rsi),
                band_pct = result.indicators.bollinger.position_pct(result.indicators.price),
                reasons = ?result.reasons,
                "signal updated"
            ),
            None => info!(
                pair = %view.pair,
                price = %price,
                have = view.history_len,
                need = view.min_history,
                "collecting price history"
            ),
        }
        if let Some(pnl) = &view.pnl {
            info!(
                pair = %view.pair,
                pnl = pnl.pnl,
                pnl_percent = pnl.pnl_percent,
                in_profit = pnl.is_profit(),
                "position"
            );
        }
    }

    fn show_overview(&self, report: &OverviewReport) {
        info!(
            analysed = report.analysed,
            buys = report.buy_count,
            sells = report.sell_count,
            holds = report.hold_count,
            "overview ranked"
        );
        for rec in report.top_buys.iter().chain(report.top_sells.iter()) {
            debug!(
                pair = %rec.pair,
                signal = %rec.signal,
                score = rec.score,
                strength = ?rec.strength,
                rsi = rec.rsi,
                "overview entry"
            );
        }
    }

    fn show_order_book(&self, book: &OrderBookSummary) {
        debug!(
            pair = %book.pair,
            best_bid = book.best_bid,
            best_ask = book.best_ask,
            spread_bps = book.spread_bps,
            imbalance = book.imbalance,
            "order book"
        );
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl NotificationSink for TracingNotifier {
    fn notify(&self, title: &str, body: &str) {
        info!(title, body, "notification");
    }

    fn banner(&self, text: &str) {
        warn!(text, "banner");
    }
}

// ---------------------------------------------------------------------------
// Settings stores
// ---------------------------------------------------------------------------

/// JSON file with atomic tmp + rename writes.
#[derive(Debug, Clone)]
pub struct JsonFileSettingsStore {
    path: PathBuf,
}

impl JsonFileSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for JsonFileSettingsStore {
    fn load(&self) -> Result<UserSettings> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no settings file, using defaults");
            return Ok(UserSettings::default());
        }
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read settings from {}", self.path.display()))?;
        let settings: UserSettings = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse settings from {}", self.path.display()))?;
        info!(
            path = %self.path.display(),
            alerts = settings.alerts.len(),
            notifications = settings.notifications_enabled,
            "settings loaded"
        );
        Ok(settings)
    }

    fn save(&self, settings: &UserSettings) -> Result<()> {
        let content =
            serde_json::to_string_pretty(settings).context("failed to serialise settings")?;

        let tmp_path = self.path.with_extension("json.tmp");
        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write tmp settings to {}", tmp_path.display()))?;
        std::fs::rename(&tmp_path, &self.path)
            .with_context(|| format!("failed to rename tmp settings to {}", self.path.display()))?;

        debug!(path = %self.path.display(), "settings saved");
        Ok(())
    }
}

/// In-process store for tests and ephemeral runs.
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    inner: RwLock<UserSettings>,
}

impl SettingsStore for MemorySettingsStore {
    fn load(&self) -> Result<UserSettings> {
        Ok(self.inner.read().clone())
    }

    fn save(&self, settings: &UserSettings) -> Result<()> {
        *self.inner.write() = settings.clone();
        Ok(())
    }
}

/// Notifier that remembers what it was asked to show.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    pub notifications: parking_lot::Mutex<Vec<(String, String)>>,
    pub banners: parking_lot::Mutex<Vec<String>>,
}

#[cfg(test)]
impl NotificationSink for RecordingNotifier {
    fn notify(&self, title: &str, body: &str) {
        self.notifications
            .lock()
            .push((title.to_string(), body.to_string()));
    }

    fn banner(&self, text: &str) {
        self.banners.lock().push(text.to_string());
    }
}
