// =============================================================================
// Runtime Configuration: engine settings with atomic save
// =============================================================================
//
// Every tunable of the signal service lives here: which variant runs, where
// quotes come from, how often each variant refreshes and the signal profiles.
//
// Persistence uses an atomic tmp + rename pattern to prevent corruption on
// crash. All fields carry a serde default so that adding new fields never
// breaks loading an older config file.
//
// =============================================================================

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::coincheck::client::DEFAULT_API_BASE;
use crate::market_data::pairs;
use crate::signals::{ProfileSet, SignalProfile};
use crate::types::AppMode;

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_cors_proxy() -> String {
    "https://api.allorigins.win/raw".to_string()
}

fn default_pairs() -> Vec<String> {
    pairs::all_pairs()
}

fn default_active_pair() -> String {
    "btc_jpy".to_string()
}

fn default_timeframe() -> String {
    crate::session::DEFAULT_TIMEFRAME.to_string()
}

fn default_history_limit() -> usize {
    crate::market_data::price_series::DEFAULT_CAPACITY
}

fn default_advisor_refresh_secs() -> u64 {
    60
}

fn default_day_trading_refresh_secs() -> u64 {
    5
}

fn default_overview_refresh_secs() -> u64 {
    60
}

fn default_overview_batch_size() -> usize {
    5
}

fn default_overview_batch_delay_ms() -> u64 {
    200
}

fn default_overview_top_n() -> usize {
    10
}

fn default_orderbook_depth() -> usize {
    crate::market_data::orderbook::DEFAULT_DEPTH
}

fn default_demo_after_failures() -> u32 {
    1
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_alert_tolerance_pct() -> f64 {
    crate::alerts::DEFAULT_TOLERANCE_PCT
}

fn default_settings_path() -> String {
    "user_settings.json".to_string()
}

fn default_bind_addr() -> String {
    "0.0.0.0:3001".to_string()
}

// =============================================================================
// RuntimeConfig
// =============================================================================

/// Top-level runtime configuration.
///
/// Every field has a serde default so that older JSON files missing new fields
/// will still deserialise correctly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    // --- Variant -------------------------------------------------------------

    /// Which app runs: advisor, day_trading or overview.
    #[serde(default)]
    pub mode: AppMode,

    // --- Upstream ------------------------------------------------------------

    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Route requests through `cors_proxy`.
    #[serde(default)]
    pub use_cors_proxy: bool,

    /// Proxy endpoint that takes the target URL in its `url` parameter.
    #[serde(default = "default_cors_proxy")]
    pub cors_proxy: String,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Consecutive live failures before switching to demo data for good.
    /// 0 never switches.
    #[serde(default = "default_demo_after_failures")]
    pub demo_after_failures: u32,

    // --- Pairs & history -----------------------------------------------------

    /// Pairs the overview tracks, in ranking tie-break order.
    #[serde(default = "default_pairs")]
    pub pairs: Vec<String>,

    /// Pair shown by the advisor and day-trading screens.
    #[serde(default = "default_active_pair")]
    pub active_pair: String,

    #[serde(default = "default_timeframe")]
    pub timeframe: String,

    /// Samples kept per pair.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    // --- Refresh cadence -----------------------------------------------------

    #[serde(default = "default_advisor_refresh_secs")]
    pub advisor_refresh_secs: u64,

    #[serde(default = "default_day_trading_refresh_secs")]
    pub day_trading_refresh_secs: u64,

    #[serde(default = "default_overview_refresh_secs")]
    pub overview_refresh_secs: u64,

    // --- Overview ------------------------------------------------------------

    #[serde(default = "default_overview_batch_size")]
    pub overview_batch_size: usize,

    #[serde(default = "default_overview_batch_delay_ms")]
    pub overview_batch_delay_ms: u64,

    #[serde(default = "default_overview_top_n")]
    pub overview_top_n: usize,

    // --- Day trading ---------------------------------------------------------

    #[serde(default = "default_orderbook_depth")]
    pub orderbook_depth: usize,

    /// Alert match window, in percent of the alert price.
    #[serde(default = "default_alert_tolerance_pct")]
    pub alert_tolerance_pct: f64,

    // --- Notifications -------------------------------------------------------

    /// Advisor notifies on every buy/sell evaluation instead of only when the
    /// signal changes, and confirms when notifications are switched on.
    #[serde(default)]
    pub notify_every_signal: bool,

    // --- Persistence & server ------------------------------------------------

    /// Where notification flag and alerts are stored. Empty keeps them in
    /// memory only.
    #[serde(default = "default_settings_path")]
    pub settings_path: String,

    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    // --- Signal profiles -----------------------------------------------------

    #[serde(default)]
    pub profiles: ProfileSet,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            mode: AppMode::default(),
            api_base: default_api_base(),
            use_cors_proxy: false,
            cors_proxy: default_cors_proxy(),
            request_timeout_secs: default_request_timeout_secs(),
            demo_after_failures: default_demo_after_failures(),
            pairs: default_pairs(),
            active_pair: default_active_pair(),
            timeframe: default_timeframe(),
            history_limit: default_history_limit(),
            advisor_refresh_secs: default_advisor_refresh_secs(),
            day_trading_refresh_secs: default_day_trading_refresh_secs(),
            overview_refresh_secs: default_overview_refresh_secs(),
            overview_batch_size: default_overview_batch_size(),
            overview_batch_delay_ms: default_overview_batch_delay_ms(),
            overview_top_n: default_overview_top_n(),
            orderbook_depth: default_orderbook_depth(),
            alert_tolerance_pct: default_alert_tolerance_pct(),
            notify_every_signal: false,
            settings_path: default_settings_path(),
            bind_addr: default_bind_addr(),
            profiles: ProfileSet::default(),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read runtime config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse runtime config from {}", path.display()))?;

        info!(
            path = %path.display(),
            mode = %config.mode,
            pairs = config.pairs.len(),
            "runtime config loaded"
        );

        Ok(config)
    }

    /// Persist the current configuration to `path` using an atomic write
    /// (write to `.tmp`, then rename).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content = serde_json::to_string_pretty(self)
            .context("failed to serialise runtime config to JSON")?;

        let tmp_path = path.with_extension("json.tmp");

        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write tmp config to {}", tmp_path.display()))?;

        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to rename tmp config to {}", path.display()))?;

        info!(path = %path.display(), "runtime config saved (atomic)");
        Ok(())
    }

    /// Apply `COIN_SIGNAL_*` overrides from the environment.
    pub fn apply_env(&mut self) {
        self.apply_overrides(
            std::env::var("COIN_SIGNAL_MODE").ok(),
            std::env::var("COIN_SIGNAL_PAIRS").ok(),
            std::env::var("COIN_SIGNAL_BIND_ADDR").ok(),
        );
    }

    /// Override logic behind [`apply_env`](Self::apply_env). An unparseable
    /// mode is ignored with a warning; an empty pair list keeps the default.
    pub fn apply_overrides(
        &mut self,
        mode: Option<String>,
        pair_list: Option<String>,
        bind_addr: Option<String>,
    ) {
        if let Some(raw) = mode {
            match raw.parse::<AppMode>() {
                Ok(m) => self.mode = m,
                Err(e) => warn!(value = %raw, error = %e, "ignoring COIN_SIGNAL_MODE"),
            }
        }

        if let Some(raw) = pair_list {
            let parsed: Vec<String> = raw
                .split(',')
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect();
            if !parsed.is_empty() {
                self.pairs = parsed;
            }
        }
        if self.pairs.is_empty() {
            self.pairs = default_pairs();
        }

        if let Some(addr) = bind_addr.filter(|a| !a.trim().is_empty()) {
            self.bind_addr = addr.trim().to_string();
        }
    }

    pub fn profile(&self, mode: AppMode) -> &SignalProfile {
        self.profiles.get(mode)
    }

    /// Refresh period of `mode`, never shorter than one second.
    pub fn refresh_interval(&self, mode: AppMode) -> Duration {
        let secs = match mode {
            AppMode::Advisor => self.advisor_refresh_secs,
            AppMode::DayTrading => self.day_trading_refresh_secs,
            AppMode::Overview => self.overview_refresh_secs,
        };
        Duration::from_secs(secs.max(1))
    }

    pub fn overview_batch_delay(&self) -> Duration {
        Duration::from_millis(self.overview_batch_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    /// Proxy to use, if enabled.
    pub fn proxy(&self) -> Option<String> {
        self.use_cors_proxy.then(|| self.cors_proxy.clone())
    }

    /// Whether `pair` may be selected: catalog pairs plus configured ones.
    pub fn is_selectable(&self, pair: &str) -> bool {
        pairs::is_known(pair) || self.pairs.iter().any(|p| p == pair)
    }
}
